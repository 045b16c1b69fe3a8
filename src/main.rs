use std::process;

use canary_console::{
    Console,
    application::{
        error::AppError,
        form::SubmitDisposition,
        toast::ToastEvent,
    },
    config::{self, Command, LockArgs, RuleArgs, UpdateArgs},
    domain::{fields::CanaryField, validation::validate},
    infra::{http::ConsoleClient, telemetry},
    presentation::form::CanaryForm,
};
use tokio::sync::{
    broadcast::{Receiver, error::TryRecvError},
    watch,
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "console error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "console error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    let client = ConsoleClient::new(
        settings.console.base_url.as_str(),
        settings.console.request_timeout,
    )?;
    let console = Console::new(client.clone());
    let mut toasts = console.toasts.subscribe();
    let reloads = console.page.subscribe();

    let succeeded = match cli_args.command {
        Command::Lock(LockArgs { namespace, ingress }) => {
            console.locks.acquire_lock(&namespace, &ingress).await
        }
        Command::Unlock(LockArgs { namespace, ingress }) => {
            console.locks.release_lock(&namespace, &ingress).await
        }
        Command::Update(args) => run_update(&console, args).await,
        Command::Validate(rules) => return run_validate(&rules),
    };
    print_toasts(&mut toasts);

    if !succeeded {
        return Err(AppError::rejected("operation did not succeed"));
    }

    wait_for_reload(reloads, &client).await;
    print_toasts(&mut toasts);
    Ok(())
}

fn run_validate(rules: &RuleArgs) -> Result<(), AppError> {
    let form = rule_form(CanaryForm::new(config::DEFAULT_ACTION), rules);
    let errors = validate(&form.canary_fields());
    if errors.is_empty() {
        println!("rules are valid");
        return Ok(());
    }

    let mut form = form;
    form.show_errors(&errors);
    for field in CanaryField::ALL {
        if let Some(marker) = form.annotation(field) {
            println!("{field}: {}", marker.message);
        }
    }
    Err(AppError::rejected(format!("{} validation error(s)", errors.len())))
}

async fn run_update(console: &Console, args: UpdateArgs) -> bool {
    let form = CanaryForm::new(args.action)
        .with_field("namespace", args.target.namespace)
        .with_field("ingress", args.target.ingress);
    let mut form = rule_form(form, &args.rules);

    match console.forms.handle_submit(&mut form).await {
        SubmitDisposition::Rejected(errors) => {
            for error in &errors {
                warn!(field = %error.field(), message = %error, "field rejected");
            }
            false
        }
        SubmitDisposition::Sent(outcome) => outcome.is_success(),
    }
}

fn rule_form(form: CanaryForm, rules: &RuleArgs) -> CanaryForm {
    form.with_field("weight", rules.weight.as_str())
        .with_field("header", rules.header.as_str())
        .with_field("header_value", rules.header_value.as_str())
        .with_field("header_pattern", rules.header_pattern.as_str())
        .with_field("cookie", rules.cookie.as_str())
}

/// Wait for the scheduled reload, then fetch the page again so the server's
/// current state is confirmed.
async fn wait_for_reload(mut reloads: watch::Receiver<u64>, client: &ConsoleClient) {
    if reloads.changed().await.is_err() {
        return;
    }

    match client.http().get(client.base().clone()).send().await {
        Ok(response) => info!(url = %client.base(), status = response.status().as_u16(), "page reloaded"),
        Err(err) => warn!(url = %client.base(), error = %err, "page reload failed"),
    }
}

fn print_toasts(events: &mut Receiver<ToastEvent>) {
    loop {
        match events.try_recv() {
            Ok(ToastEvent::Shown(toast)) => {
                println!("[{}] {}", toast.severity.as_str(), toast.text);
            }
            Ok(_) | Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}
