use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

pub const DEFAULT_ACTION: &str = "/set_annotations";

/// Command-line arguments for the canary console.
#[derive(Debug, Parser)]
#[command(
    name = "canary-console",
    version,
    about = "Edit canary routing rules on ingress resources"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "CANARY_CONSOLE_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ConsoleOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ConsoleOverrides {
    /// Override the console server base URL.
    #[arg(long = "base-url", value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Override the per-request timeout.
    #[arg(long = "request-timeout-seconds", value_name = "SECONDS", global = true)]
    pub request_timeout_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Acquire the edit lock for an ingress.
    Lock(LockArgs),
    /// Release the edit lock for an ingress.
    Unlock(LockArgs),
    /// Validate and submit new canary rules.
    Update(UpdateArgs),
    /// Validate canary rules without contacting the server.
    Validate(RuleArgs),
}

#[derive(Debug, Args, Clone)]
pub struct LockArgs {
    /// Namespace of the ingress.
    #[arg(long, value_name = "NAMESPACE")]
    pub namespace: String,

    /// Name of the ingress.
    #[arg(long, value_name = "NAME")]
    pub ingress: String,
}

#[derive(Debug, Args, Clone)]
pub struct RuleArgs {
    /// Percentage of traffic routed to the canary (0-100).
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub weight: String,

    /// Header that selects canary traffic.
    #[arg(long, default_value = "")]
    pub header: String,

    /// Exact header value routed to the canary.
    #[arg(long = "header-value", default_value = "")]
    pub header_value: String,

    /// Regular expression matched against the header value.
    #[arg(long = "header-pattern", default_value = "", allow_hyphen_values = true)]
    pub header_pattern: String,

    /// Cookie that selects canary traffic.
    #[arg(long, default_value = "")]
    pub cookie: String,
}

#[derive(Debug, Args, Clone)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub target: LockArgs,

    #[command(flatten)]
    pub rules: RuleArgs,

    /// Settings endpoint the form is submitted to.
    #[arg(long, default_value = DEFAULT_ACTION, value_name = "PATH")]
    pub action: String,
}
