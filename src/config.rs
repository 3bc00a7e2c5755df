use crate::cli::Cli;
use crate::error::ReportError;
use crate::model::OdbcDriver;
use directories::ProjectDirs;
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "127.0.0.1:8501";
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 1800;
pub const DEFAULT_LOGIN_TIMEOUT_SECS: u32 = 30;
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 60;

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub session_idle_secs: u64,
    pub login_timeout_secs: u32,
    pub query_timeout_secs: u64,
    pub verbose: bool,
    pub show_secrets: bool,
    pub form: FormDefaults,
}

/// Initial values of the connection form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDefaults {
    pub host: String,
    pub port: String,
    pub database: String,
    pub username: String,
    pub driver: OdbcDriver,
    pub trust_server_certificate: bool,
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: "1433".to_string(),
            database: String::new(),
            username: String::new(),
            driver: OdbcDriver::V18,
            trust_server_certificate: false,
        }
    }
}

// --- TOML config file structs ---

#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    #[serde(default)]
    server: TomlServer,
    #[serde(default)]
    defaults: TomlDefaults,
    #[serde(default)]
    profiles: HashMap<String, TomlProfile>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlServer {
    bind: Option<String>,
    session_idle_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlDefaults {
    login_timeout: Option<u32>,
    query_timeout: Option<u64>,
    trust_server_certificate: Option<bool>,
    verbose: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone)]
struct TomlProfile {
    host: Option<String>,
    port: Option<String>,
    database: Option<String>,
    username: Option<String>,
    driver: Option<String>,
    trust_server_certificate: Option<bool>,
}

/// Config path resolution result. Distinguishes explicit from auto-resolved paths.
struct ResolvedConfigPath {
    path: PathBuf,
    /// true if user explicitly specified via --config or PRODREPORT_CONFIG
    explicit: bool,
}

/// Resolve the config file path: --config flag (or its env var) > platform default.
fn resolve_config_path(cli_config: Option<&PathBuf>) -> Option<ResolvedConfigPath> {
    if let Some(path) = cli_config {
        return Some(ResolvedConfigPath {
            path: path.clone(),
            explicit: true,
        });
    }
    ProjectDirs::from("", "", "prodreport").map(|dirs| ResolvedConfigPath {
        path: dirs.config_dir().join("config.toml"),
        explicit: false,
    })
}

/// Load and parse the TOML config file (if it exists).
fn load_toml_config(resolved: Option<&ResolvedConfigPath>) -> Result<TomlConfig, ReportError> {
    let resolved = match resolved {
        Some(r) => r,
        None => return Ok(TomlConfig::default()),
    };

    if !resolved.path.exists() {
        if resolved.explicit {
            return Err(ReportError::Config {
                message: format!("config file not found: {}", resolved.path.display()),
            });
        }
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&resolved.path).map_err(|e| ReportError::Config {
        message: format!("cannot read config file {}: {}", resolved.path.display(), e),
    })?;

    toml::from_str(&content).map_err(|e| ReportError::Config {
        message: format!("invalid config file {}: {}", resolved.path.display(), e),
    })
}

/// Build AppConfig from CLI args (env fallbacks are applied by clap).
pub fn load(cli: &Cli) -> Result<AppConfig, ReportError> {
    let resolved_path = resolve_config_path(cli.config.as_ref());
    let toml_config = load_toml_config(resolved_path.as_ref())?;

    let profile = cli
        .profile
        .as_ref()
        .map(|name| {
            toml_config
                .profiles
                .get(name)
                .cloned()
                .ok_or_else(|| ReportError::Config {
                    message: format!("profile '{}' not found in config file", name),
                })
        })
        .transpose()?
        .unwrap_or_default();

    // bind: CLI/ENV > TOML > default
    let bind_str = cli
        .bind
        .as_deref()
        .or(toml_config.server.bind.as_deref())
        .unwrap_or(DEFAULT_BIND);
    let bind = bind_str.parse::<SocketAddr>().map_err(|e| ReportError::Config {
        message: format!("invalid bind address '{}': {}", bind_str, e),
    })?;

    let session_idle_secs = cli
        .session_idle
        .or(toml_config.server.session_idle_secs)
        .unwrap_or(DEFAULT_SESSION_IDLE_SECS);

    let login_timeout_secs = cli
        .login_timeout
        .or(toml_config.defaults.login_timeout)
        .unwrap_or(DEFAULT_LOGIN_TIMEOUT_SECS);

    let query_timeout_secs = cli
        .query_timeout
        .or(toml_config.defaults.query_timeout)
        .unwrap_or(DEFAULT_QUERY_TIMEOUT_SECS);

    let verbose = cli.verbose || toml_config.defaults.verbose.unwrap_or(false);

    let form = form_defaults(cli, &toml_config.defaults, profile)?;

    Ok(AppConfig {
        bind,
        session_idle_secs,
        login_timeout_secs,
        query_timeout_secs,
        verbose,
        show_secrets: cli.show_secrets,
        form,
    })
}

fn form_defaults(
    cli: &Cli,
    defaults: &TomlDefaults,
    profile: TomlProfile,
) -> Result<FormDefaults, ReportError> {
    let builtin = FormDefaults::default();

    let driver = match profile.driver.as_deref() {
        Some(name) => name.parse::<OdbcDriver>().map_err(|e| ReportError::Config {
            message: e.user_message(),
        })?,
        None => builtin.driver,
    };

    // trust: CLI/ENV OR profile OR TOML default; strict unless asked
    let trust_server_certificate = cli.trust_server_certificate
        || profile
            .trust_server_certificate
            .or(defaults.trust_server_certificate)
            .unwrap_or(false);

    Ok(FormDefaults {
        host: profile.host.unwrap_or(builtin.host),
        port: profile.port.unwrap_or(builtin.port),
        database: profile.database.unwrap_or(builtin.database),
        username: profile.username.unwrap_or(builtin.username),
        driver,
        trust_server_certificate,
    })
}
