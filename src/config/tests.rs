use serial_test::serial;

use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_point_at_public_notehub() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(
        settings.upstream.base_url.as_str(),
        "https://notehub-public.goit.study/api"
    );
    assert!(settings.upstream.token.is_none());
    assert!(settings.upstream.timeout.is_none());
    assert_eq!(settings.site.name, "NoteHub");
    assert_eq!(settings.site.url.as_str(), "https://notehub.com/");
    assert_eq!(settings.server.addr.port(), 3000);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn blank_token_is_treated_as_absent() {
    let mut raw = RawSettings::default();
    raw.upstream.token = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.upstream.token.is_none());
}

#[test]
fn token_is_redacted_in_debug_output() {
    let mut raw = RawSettings::default();
    raw.upstream.token = Some("secret-token".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    let rendered = format!("{:?}", settings.upstream);
    assert!(!rendered.contains("secret-token"));
    assert!(rendered.contains("<redacted>"));
}

#[test]
fn rejects_non_http_base_url() {
    let mut raw = RawSettings::default();
    raw.upstream.base_url = Some("ftp://example.com/api".to_string());

    let err = Settings::from_raw(raw).expect_err("ftp must be rejected");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "upstream.base_url",
            ..
        }
    ));
}

#[test]
fn rejects_zero_timeout() {
    let mut raw = RawSettings::default();
    raw.upstream.timeout_seconds = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero timeout must be rejected");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "upstream.timeout_seconds",
            ..
        }
    ));
}

#[test]
#[serial]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["notehub"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
#[serial]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "notehub",
        "serve",
        "--server-port",
        "8080",
        "--api-base-url",
        "http://localhost:9000/api",
        "--token",
        "abc",
        "--log-json",
        "true",
    ]);

    let Some(Command::Serve(serve)) = args.command.as_ref() else {
        panic!("expected serve command");
    };
    assert_eq!(serve.overrides.server_port, Some(8080));
    assert_eq!(
        serve.overrides.api_base_url.as_deref(),
        Some("http://localhost:9000/api")
    );
    assert_eq!(args.token.as_deref(), Some("abc"));
    assert_eq!(serve.overrides.log_json, Some(true));
}

#[test]
#[serial]
fn token_env_applies_without_subcommand() {
    // SAFETY: env-mutating tests are serialized.
    unsafe { std::env::set_var("NOTEHUB_TOKEN", "from-env") };
    let bare = load(&CliArgs::parse_from(["notehub"]));
    let serve = load(&CliArgs::parse_from(["notehub", "serve"]));
    unsafe { std::env::remove_var("NOTEHUB_TOKEN") };

    let bare = bare.expect("bare settings");
    let serve = serve.expect("serve settings");
    assert_eq!(bare.upstream.token.as_deref(), Some("from-env"));
    assert_eq!(serve.upstream.token.as_deref(), Some("from-env"));
}

#[test]
#[serial]
fn token_flag_overrides_env() {
    // SAFETY: env-mutating tests are serialized.
    unsafe { std::env::set_var("NOTEHUB_TOKEN", "from-env") };
    let settings = load(&CliArgs::parse_from(["notehub", "serve", "--token", "from-flag"]));
    unsafe { std::env::remove_var("NOTEHUB_TOKEN") };

    let settings = settings.expect("settings");
    assert_eq!(settings.upstream.token.as_deref(), Some("from-flag"));
}
