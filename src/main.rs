use clap::Parser;
use prodreport::backend::sqlserver::SqlServerConnector;
use prodreport::cli::Cli;
use prodreport::error::ReportError;
use prodreport::server::{self, App};
use prodreport::{config, logging};
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Load .env file (optional, ignore if missing)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(err) = run(&cli).await {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<(), ReportError> {
    let app_config = config::load(cli)?;
    logging::init(app_config.verbose);

    if app_config.form.trust_server_certificate {
        tracing::warn!("connection form defaults to trusting server certificates");
    }

    let connector = SqlServerConnector::new(
        app_config.login_timeout_secs,
        app_config.query_timeout_secs,
        app_config.show_secrets,
    );
    let app = Arc::new(App::new(connector, &app_config));

    server::serve(app, app_config.bind).await
}
