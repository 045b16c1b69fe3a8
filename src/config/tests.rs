use std::io::Write;

use clap::Parser;

use super::*;

#[test]
fn defaults_point_at_local_console() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.console.base_url.as_str(), "http://127.0.0.1:5000/");
    assert_eq!(
        settings.console.request_timeout,
        Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
    );
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.console.base_url = Some("http://from-file:5000".to_string());
    raw.logging.level = Some("info".to_string());

    let overrides = ConsoleOverrides {
        base_url: Some("https://canary.example.com".to_string()),
        log_level: Some("debug".to_string()),
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.console.base_url.host_str(), Some("canary.example.com"));
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn zero_timeout_is_rejected() {
    let mut raw = RawSettings::default();
    raw.console.request_timeout_seconds = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero timeout");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "console.request_timeout_seconds",
            ..
        }
    ));
}

#[test]
fn non_http_base_url_is_rejected() {
    let mut raw = RawSettings::default();
    raw.console.base_url = Some("file:///tmp/console".to_string());

    let err = Settings::from_raw(raw).expect_err("file scheme");
    assert!(matches!(err, LoadError::Invalid { key: "console.base_url", .. }));
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());

    let err = Settings::from_raw(raw).expect_err("bad level");
    assert!(matches!(err, LoadError::Invalid { key: "logging.level", .. }));
}

#[test]
fn config_file_is_loaded() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("tmp file");
    writeln!(
        file,
        "[console]\nbase_url = \"http://ingress-admin:8080\"\nrequest_timeout_seconds = 5"
    )
    .expect("write config");

    let path = file.path().to_string_lossy().into_owned();
    let args = CliArgs::parse_from([
        "canary-console",
        "--config-file",
        path.as_str(),
        "lock",
        "--namespace",
        "prod",
        "--ingress",
        "web",
    ]);
    let settings = load(&args).expect("settings");

    assert_eq!(settings.console.base_url.as_str(), "http://ingress-admin:8080/");
    assert_eq!(settings.console.request_timeout, Duration::from_secs(5));
}

#[test]
fn parse_update_arguments() {
    let args = CliArgs::parse_from([
        "canary-console",
        "update",
        "--namespace",
        "prod",
        "--ingress",
        "web-canary",
        "--weight",
        "25",
        "--header",
        "X-Canary",
        "--header-value",
        "always",
        "--base-url",
        "http://console:5000",
    ]);

    assert_eq!(args.overrides.base_url.as_deref(), Some("http://console:5000"));
    match args.command {
        Command::Update(update) => {
            assert_eq!(update.target.namespace, "prod");
            assert_eq!(update.target.ingress, "web-canary");
            assert_eq!(update.rules.weight, "25");
            assert_eq!(update.rules.header, "X-Canary");
            assert_eq!(update.rules.header_value, "always");
            assert_eq!(update.rules.header_pattern, "");
            assert_eq!(update.action, DEFAULT_ACTION);
        }
        other => panic!("wrong command parsed: {other:?}"),
    }
}

#[test]
fn parse_validate_accepts_negative_weight() {
    let args = CliArgs::parse_from(["canary-console", "validate", "--weight", "-1"]);

    match args.command {
        Command::Validate(rules) => assert_eq!(rules.weight, "-1"),
        other => panic!("wrong command parsed: {other:?}"),
    }
}
