use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(
    name = "prodreport",
    version,
    about = "Product order lookup dashboard for SQL Server"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short = 'c', long, env = "PRODREPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to serve the dashboard on (default: 127.0.0.1:8501)
    #[arg(short = 'b', long, env = "PRODREPORT_BIND")]
    pub bind: Option<String>,

    /// Config file profile used to prefill the connection form
    #[arg(short = 'P', long, env = "PRODREPORT_PROFILE")]
    pub profile: Option<String>,

    /// Pre-check "trust server certificate" on the connection form (insecure)
    #[arg(long, env = "PRODREPORT_TRUST_SERVER_CERT")]
    pub trust_server_certificate: bool,

    /// Login timeout in seconds (default: 30)
    #[arg(long, env = "PRODREPORT_LOGIN_TIMEOUT")]
    pub login_timeout: Option<u32>,

    /// Query timeout in seconds (default: 60)
    #[arg(short = 't', long, env = "PRODREPORT_QUERY_TIMEOUT")]
    pub query_timeout: Option<u64>,

    /// Seconds of inactivity before a session is dropped (default: 1800)
    #[arg(long, env = "PRODREPORT_SESSION_IDLE")]
    pub session_idle: Option<u64>,

    /// Emit debug diagnostics to stderr
    #[arg(short = 'v', long, env = "PRODREPORT_VERBOSE")]
    pub verbose: bool,

    /// Disable credential masking in logs
    #[arg(long, env = "PRODREPORT_SHOW_SECRETS")]
    pub show_secrets: bool,
}
