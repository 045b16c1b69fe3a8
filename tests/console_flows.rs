use std::{net::TcpListener, time::Duration};

use canary_console::{
    Console,
    application::{
        form::SubmitDisposition,
        submit::{
            IDLE_LABEL, LOCK_REQUIRED_MESSAGE, NETWORK_FAILURE_MESSAGE, SubmitControl,
            SubmitOutcome, UPDATE_SUCCESS_MESSAGE,
        },
        toast::{Severity, Toast},
    },
    domain::{fields::CanaryField, validation::ValidationError},
    infra::http::ConsoleClient,
    presentation::form::CanaryForm,
};
use httpmock::MockServer;

fn console(base_url: &str) -> Console {
    let client = ConsoleClient::new(base_url, Duration::from_secs(5)).expect("client");
    Console::new(client)
}

fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

fn last_toast(console: &Console) -> Toast {
    console.toasts.toasts().pop().expect("a toast was shown")
}

fn rule_form() -> CanaryForm {
    CanaryForm::new("/set_annotations")
        .with_field("namespace", "prod")
        .with_field("ingress", "web-canary")
        .with_field("weight", "25")
        .with_field("header", "X-Canary")
        .with_field("header_value", "")
        .with_field("header_pattern", "^beta-.*$")
        .with_field("cookie", "")
}

#[tokio::test]
async fn redirect_counts_as_success_and_schedules_reload() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/set_annotations")
            .query_param("namespace", "prod")
            .query_param("weight", "25")
            .query_param("header_pattern", "^beta-.*$");
        then.status(302).header("location", "/");
    });

    let console = console(&server.base_url());
    let mut reloads = console.page.subscribe();
    let mut form = rule_form();

    let disposition = console.forms.handle_submit(&mut form).await;
    mock.assert();
    assert_eq!(disposition, SubmitDisposition::Sent(SubmitOutcome::Success));

    let toast = last_toast(&console);
    assert_eq!(toast.severity, Severity::Success);
    assert_eq!(toast.text, UPDATE_SUCCESS_MESSAGE);
    assert!(!form.control().is_disabled());

    assert_eq!(console.page.generation(), 0);
    tokio::time::timeout(Duration::from_secs(5), reloads.changed())
        .await
        .expect("reload within timeout")
        .expect("page alive");
    assert_eq!(console.page.generation(), 1);
}

#[tokio::test]
async fn ok_status_counts_as_success() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/set_annotations");
        then.status(200).body("saved");
    });

    let console = console(&server.base_url());
    let outcome = console
        .submit
        .submit_form_as_query("/set_annotations", &[("weight", "10")], None)
        .await;
    assert_eq!(outcome, SubmitOutcome::Success);
}

#[tokio::test]
async fn forbidden_surfaces_lock_holder() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/set_annotations");
        then.status(403)
            .header("content-type", "application/json")
            .body(r#"{"error":"locked by X"}"#);
    });

    let console = console(&server.base_url());
    let outcome = console
        .submit
        .submit_form_as_query("/set_annotations", &[("weight", "10")], None)
        .await;

    assert_eq!(
        outcome,
        SubmitOutcome::Forbidden {
            message: "locked by X".to_string()
        }
    );
    let toast = last_toast(&console);
    assert_eq!(toast.severity, Severity::Error);
    assert_eq!(toast.text, "locked by X");
}

#[tokio::test]
async fn forbidden_with_plain_body_asks_for_lock() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/set_annotations");
        then.status(403).body("Forbidden");
    });

    let console = console(&server.base_url());
    let outcome = console
        .submit
        .submit_form_as_query("/set_annotations", &[("weight", "10")], None)
        .await;
    assert_eq!(outcome.message(), LOCK_REQUIRED_MESSAGE);
}

#[tokio::test]
async fn server_error_surfaces_body_and_does_not_reload() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/set_annotations");
        then.status(500).body("server exploded");
    });

    let console = console(&server.base_url());
    let control = SubmitControl::new();
    let outcome = console
        .submit
        .submit_form_as_query("/set_annotations", &[("weight", "10")], Some(&control))
        .await;

    match &outcome {
        SubmitOutcome::Failure { status, message } => {
            assert_eq!(*status, Some(500));
            assert!(message.contains("server exploded"));
            assert!(message.contains("500"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(!control.is_disabled());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(console.page.generation(), 0);
}

#[tokio::test]
async fn network_failure_restores_control() {
    let console = console(&unreachable_base_url());
    let control = SubmitControl::new();

    let outcome = console
        .submit
        .submit_form_as_query("/set_annotations", &[("weight", "10")], Some(&control))
        .await;

    assert_eq!(
        outcome,
        SubmitOutcome::Failure {
            status: None,
            message: NETWORK_FAILURE_MESSAGE.to_string()
        }
    );
    assert!(!control.is_disabled());
    assert_eq!(control.label(), IDLE_LABEL);
    assert_eq!(last_toast(&console).text, NETWORK_FAILURE_MESSAGE);
}

#[tokio::test]
async fn invalid_form_is_never_sent() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET").path("/set_annotations");
        then.status(302);
    });

    let console = console(&server.base_url());
    let mut form = rule_form();
    form.set("header_value", "always");
    form.set("weight", "101");

    let disposition = console.forms.handle_submit(&mut form).await;
    mock.assert_hits(0);

    assert_eq!(
        disposition,
        SubmitDisposition::Rejected(vec![
            ValidationError::HeaderConflict,
            ValidationError::WeightOutOfRange
        ])
    );
    assert!(form.annotation(CanaryField::HeaderValue).is_some());
    assert!(form.annotation(CanaryField::Weight).is_some());

    let toasts = console.toasts.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].text, ValidationError::HeaderConflict.message());
}

#[tokio::test]
async fn acquire_lock_succeeds_and_reloads() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/lock")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("namespace=prod&ingress=web-canary");
        then.status(200)
            .header("content-type", "application/json")
            .body("{}");
    });

    let console = console(&server.base_url());
    let mut reloads = console.page.subscribe();

    assert!(console.locks.acquire_lock("prod", "web-canary").await);
    mock.assert();
    assert!(!console.locks.is_busy());

    let toast = last_toast(&console);
    assert_eq!(toast.severity, Severity::Success);
    assert_eq!(toast.text, "Lock successful!");

    tokio::time::timeout(Duration::from_secs(5), reloads.changed())
        .await
        .expect("reload within timeout")
        .expect("page alive");
}

#[tokio::test]
async fn conflicting_lock_reports_server_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/lock");
        then.status(409)
            .header("content-type", "application/json")
            .body(r#"{"error":"already locked"}"#);
    });

    let console = console(&server.base_url());
    assert!(!console.locks.acquire_lock("prod", "web-canary").await);

    let toast = last_toast(&console);
    assert_eq!(toast.severity, Severity::Error);
    assert_eq!(toast.text, "already locked");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(console.page.generation(), 0);
}

#[tokio::test]
async fn unlock_without_error_field_uses_generic_message() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/unlock");
        then.status(400)
            .header("content-type", "application/json")
            .body("{}");
    });

    let console = console(&server.base_url());
    assert!(!console.locks.release_lock("prod", "web-canary").await);
    assert_eq!(last_toast(&console).text, "Unlock failed");
}

#[tokio::test]
async fn malformed_lock_reply_is_reported_not_raised() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/lock");
        then.status(502).body("<html>Bad Gateway</html>");
    });

    let console = console(&server.base_url());
    assert!(!console.locks.acquire_lock("prod", "web-canary").await);

    let text = last_toast(&console).text;
    assert!(text.starts_with("Lock failed (502)"), "{text}");
}

#[tokio::test]
async fn lock_network_failure_returns_false() {
    let console = console(&unreachable_base_url());
    assert!(!console.locks.release_lock("prod", "web-canary").await);
    assert_eq!(
        last_toast(&console).text,
        "Unlock failed due to network error"
    );
}

#[tokio::test]
async fn concurrent_lock_request_is_refused_while_one_is_in_flight() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST").path("/lock");
        then.status(200)
            .header("content-type", "application/json")
            .body("{}")
            .delay(Duration::from_millis(300));
    });

    let console = console(&server.base_url());
    let (first, second) = tokio::join!(
        console.locks.acquire_lock("prod", "web-canary"),
        console.locks.acquire_lock("prod", "web-canary"),
    );

    assert!(first ^ second, "exactly one call succeeds: {first} {second}");
    mock.assert_hits(1);
    assert!(!console.locks.is_busy());

    let toasts = console.toasts.toasts();
    assert!(
        toasts
            .iter()
            .any(|toast| toast.severity == Severity::Warning
                && toast.text == "A lock request is already in progress"),
        "{toasts:?}"
    );
    assert!(toasts.iter().any(|toast| toast.severity == Severity::Success));
}
