use clap::Parser;
use prodreport::cli::Cli;
use prodreport::config::{
    load, FormDefaults, DEFAULT_LOGIN_TIMEOUT_SECS, DEFAULT_QUERY_TIMEOUT_SECS,
    DEFAULT_SESSION_IDLE_SECS,
};
use prodreport::model::OdbcDriver;
use std::path::PathBuf;
use std::sync::Mutex;

// --- Env var test infrastructure ---

/// Static mutex to serialize tests that touch process env vars.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// RAII guard that sets env vars on creation and removes them on Drop.
/// Holds the ENV_MUTEX lock for its lifetime.
struct EnvGuard {
    keys: Vec<String>,
    _lock: std::sync::MutexGuard<'static, ()>,
}

impl EnvGuard {
    fn new(vars: &[(&str, &str)]) -> Self {
        let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        for (key, val) in vars {
            // SAFETY: env var access is serialized by ENV_MUTEX
            unsafe { std::env::set_var(key, val); }
        }
        EnvGuard {
            keys: vars.iter().map(|(k, _)| k.to_string()).collect(),
            _lock: lock,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for key in &self.keys {
            // SAFETY: env var access is serialized by ENV_MUTEX
            unsafe { std::env::remove_var(key); }
        }
    }
}

/// A config file in the temp dir, removed on Drop.
struct TempConfig {
    path: PathBuf,
}

impl TempConfig {
    fn new(content: &str) -> Self {
        let path = std::env::temp_dir().join(format!("prodreport-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, content).unwrap();
        TempConfig { path }
    }
}

impl Drop for TempConfig {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn cli_with(overrides: impl FnOnce(&mut Cli)) -> Cli {
    let mut cli = Cli::default();
    overrides(&mut cli);
    cli
}

const SAMPLE_CONFIG: &str = r#"
[server]
bind = "0.0.0.0:9000"
session_idle_secs = 600

[defaults]
login_timeout = 5
query_timeout = 15
verbose = true

[profiles.orders]
host = "db.internal"
port = "1444"
database = "OrdersDB"
username = "report"
driver = "ODBC Driver 17 for SQL Server"
"#;

#[test]
fn test_builtin_defaults() {
    let file = TempConfig::new("");
    let config = load(&cli_with(|c| c.config = Some(file.path.clone()))).unwrap();

    assert_eq!(config.bind.to_string(), "127.0.0.1:8501");
    assert_eq!(config.session_idle_secs, DEFAULT_SESSION_IDLE_SECS);
    assert_eq!(config.login_timeout_secs, DEFAULT_LOGIN_TIMEOUT_SECS);
    assert_eq!(config.query_timeout_secs, DEFAULT_QUERY_TIMEOUT_SECS);
    assert!(!config.verbose);
    assert!(!config.show_secrets);
    assert_eq!(config.form, FormDefaults::default());
}

#[test]
fn test_form_defaults_match_original_form() {
    let form = FormDefaults::default();
    assert_eq!(form.host, "localhost");
    assert_eq!(form.port, "1433");
    assert_eq!(form.driver, OdbcDriver::V18);
    assert!(!form.trust_server_certificate, "certificate checks are strict by default");
}

#[test]
fn test_toml_values_applied() {
    let file = TempConfig::new(SAMPLE_CONFIG);
    let config = load(&cli_with(|c| c.config = Some(file.path.clone()))).unwrap();

    assert_eq!(config.bind.to_string(), "0.0.0.0:9000");
    assert_eq!(config.session_idle_secs, 600);
    assert_eq!(config.login_timeout_secs, 5);
    assert_eq!(config.query_timeout_secs, 15);
    assert!(config.verbose);
    // Profile only applies when selected
    assert_eq!(config.form.host, "localhost");
}

#[test]
fn test_cli_overrides_toml() {
    let file = TempConfig::new(SAMPLE_CONFIG);
    let config = load(&cli_with(|c| {
        c.config = Some(file.path.clone());
        c.bind = Some("127.0.0.1:7000".to_string());
        c.query_timeout = Some(120);
    }))
    .unwrap();

    assert_eq!(config.bind.to_string(), "127.0.0.1:7000");
    assert_eq!(config.query_timeout_secs, 120);
    assert_eq!(config.login_timeout_secs, 5);
}

#[test]
fn test_profile_prefills_form() {
    let file = TempConfig::new(SAMPLE_CONFIG);
    let config = load(&cli_with(|c| {
        c.config = Some(file.path.clone());
        c.profile = Some("orders".to_string());
    }))
    .unwrap();

    assert_eq!(config.form.host, "db.internal");
    assert_eq!(config.form.port, "1444");
    assert_eq!(config.form.database, "OrdersDB");
    assert_eq!(config.form.username, "report");
    assert_eq!(config.form.driver, OdbcDriver::V17);
}

#[test]
fn test_unknown_profile_errors() {
    let file = TempConfig::new(SAMPLE_CONFIG);
    let err = load(&cli_with(|c| {
        c.config = Some(file.path.clone());
        c.profile = Some("missing".to_string());
    }))
    .unwrap_err()
    .to_string();
    assert!(err.contains("profile 'missing' not found"), "Got: {}", err);
}

#[test]
fn test_profile_with_unknown_driver_errors() {
    let file = TempConfig::new("[profiles.bad]\ndriver = \"FreeTDS\"\n");
    let err = load(&cli_with(|c| {
        c.config = Some(file.path.clone());
        c.profile = Some("bad".to_string());
    }))
    .unwrap_err()
    .to_string();
    assert!(err.starts_with("config:"), "Got: {}", err);
    assert!(err.contains("unknown ODBC driver"), "Got: {}", err);
}

#[test]
fn test_trust_flag_pre_checks_form() {
    let file = TempConfig::new("");
    let config = load(&cli_with(|c| {
        c.config = Some(file.path.clone());
        c.trust_server_certificate = true;
    }))
    .unwrap();
    assert!(config.form.trust_server_certificate);
}

#[test]
fn test_invalid_bind_errors() {
    let file = TempConfig::new("");
    let err = load(&cli_with(|c| {
        c.config = Some(file.path.clone());
        c.bind = Some("localhost".to_string());
    }))
    .unwrap_err()
    .to_string();
    assert!(err.contains("invalid bind address"), "Got: {}", err);
}

#[test]
fn test_config_file_not_found_errors() {
    let bad_path = PathBuf::from("/nonexistent/prodreport.toml");
    let err = load(&cli_with(|c| c.config = Some(bad_path)))
        .unwrap_err()
        .to_string();
    assert!(err.contains("config file not found"), "Got: {}", err);
}

#[test]
fn test_invalid_toml_errors() {
    let file = TempConfig::new("[server\nbind = ");
    let err = load(&cli_with(|c| c.config = Some(file.path.clone())))
        .unwrap_err()
        .to_string();
    assert!(err.contains("invalid config file"), "Got: {}", err);
}

#[test]
fn test_env_vars_feed_cli() {
    let _guard = EnvGuard::new(&[
        ("PRODREPORT_BIND", "127.0.0.1:9100"),
        ("PRODREPORT_QUERY_TIMEOUT", "90"),
        ("PRODREPORT_TRUST_SERVER_CERT", "true"),
    ]);
    let cli = Cli::try_parse_from(["prodreport"]).unwrap();

    assert_eq!(cli.bind.as_deref(), Some("127.0.0.1:9100"));
    assert_eq!(cli.query_timeout, Some(90));
    assert!(cli.trust_server_certificate);
}

#[test]
fn test_cli_flag_beats_env() {
    let _guard = EnvGuard::new(&[("PRODREPORT_BIND", "127.0.0.1:9100")]);
    let cli = Cli::try_parse_from(["prodreport", "--bind", "127.0.0.1:9200"]).unwrap();
    assert_eq!(cli.bind.as_deref(), Some("127.0.0.1:9200"));
}
