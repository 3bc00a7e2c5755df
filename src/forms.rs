use crate::backend::{Backend, Connector, QueryResult};
use crate::error::ReportError;
use crate::logging::Timer;
use crate::lookup;
use crate::model::{ConnectionConfig, QueryParams};
use crate::session::{ConnectionInputs, Session};
use crate::validation;

/// What a successful lookup produced.
#[derive(Debug, PartialEq, Eq)]
pub enum QueryOutcome {
    NoRecords,
    Found(QueryResult),
}

/// Handle a connection form submission.
///
/// Any handle the session already holds is released before the new attempt.
/// On failure the session is left disconnected.
pub async fn submit_connection<C: Connector>(
    connector: &C,
    session: &mut Session<C::Handle>,
    config: ConnectionConfig,
) -> Result<(), ReportError> {
    if session.release() {
        tracing::debug!(session = %session.id(), "released previous connection");
    }

    session.connection_inputs = Some(ConnectionInputs {
        host: config.host.clone(),
        port: config.port.clone(),
        database: config.database.clone(),
        username: config.username.clone(),
        driver: config.driver,
        trust_server_certificate: config.trust_server_certificate,
    });

    if config.trust_server_certificate {
        tracing::warn!(
            session = %session.id(),
            "server certificate verification disabled for this connection"
        );
    }

    validation::validate_connection(&config)?;

    match connector.connect(&config).await {
        Ok(handle) => {
            session.attach(handle);
            tracing::info!(session = %session.id(), "session connected");
            Ok(())
        }
        Err(e) => {
            tracing::warn!(session = %session.id(), error = %e, "connection attempt failed");
            Err(e)
        }
    }
}

/// Handle a query form submission.
///
/// Nothing is sent to the database unless the session is connected and all
/// three fields are filled in. A failure that means the connection is gone
/// disconnects the session; other query failures leave it connected.
pub async fn submit_query<H: Backend>(
    session: &mut Session<H>,
    params: QueryParams,
) -> Result<QueryOutcome, ReportError> {
    session.query_inputs = params.clone();

    let Some(handle) = session.handle() else {
        return Err(ReportError::NotConnected);
    };

    validation::validate_query(&params)?;

    tracing::debug!(
        session = %session.id(),
        location = %params.location,
        gf_number = %params.gf_number,
        order_id = %params.order_id,
        "running lookup"
    );
    let timer = Timer::start();
    let result = lookup::run(handle, &params).await;

    match result {
        Ok(result) => {
            tracing::info!(
                session = %session.id(),
                rows = result.row_count(),
                elapsed_ms = timer.elapsed_ms() as u64,
                "lookup complete"
            );
            if result.is_empty() {
                Ok(QueryOutcome::NoRecords)
            } else {
                Ok(QueryOutcome::Found(result))
            }
        }
        Err(e) => {
            tracing::warn!(session = %session.id(), error = %e, "lookup failed");
            if e.drops_connection() {
                session.release();
                tracing::info!(session = %session.id(), "session disconnected after lost connection");
            }
            Err(e)
        }
    }
}
