use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Form, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use secrecy::SecretString;
use serde::Deserialize;

use crate::backend::{Connector, QueryResult};
use crate::config::{AppConfig, FormDefaults};
use crate::error::ReportError;
use crate::forms::{self, QueryOutcome};
use crate::model::{ConnectionConfig, OdbcDriver, QueryParams};
use crate::render::{self, Notice, PageView};
use crate::session::{ConnectionInputs, Session, SessionId, SessionStore};

pub const SESSION_COOKIE: &str = "prodreport_sid";

/// Shared server state: the connector and every live session.
pub struct App<C: Connector> {
    connector: C,
    sessions: SessionStore<C::Handle>,
    form_defaults: FormDefaults,
}

impl<C: Connector> App<C> {
    pub fn new(connector: C, config: &AppConfig) -> Self {
        Self::with_defaults(
            connector,
            config.form.clone(),
            Duration::from_secs(config.session_idle_secs),
        )
    }

    pub fn with_defaults(connector: C, form_defaults: FormDefaults, idle_timeout: Duration) -> Self {
        Self {
            connector,
            sessions: SessionStore::new(idle_timeout),
            form_defaults,
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn sessions(&self) -> &SessionStore<C::Handle> {
        &self.sessions
    }

    fn default_inputs(&self) -> ConnectionInputs {
        let d = &self.form_defaults;
        ConnectionInputs {
            host: d.host.clone(),
            port: d.port.clone(),
            database: d.database.clone(),
            username: d.username.clone(),
            driver: d.driver,
            trust_server_certificate: d.trust_server_certificate,
        }
    }
}

/// Connection form fields as posted by the browser.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ConnectForm {
    pub host: String,
    pub port: String,
    pub database: String,
    pub username: String,
    pub password: String,
    pub driver: String,
    pub trust_server_certificate: Option<String>,
}

impl ConnectForm {
    /// Turn the posted fields into a connection config. The password moves
    /// into a secret and is not kept anywhere else.
    pub fn into_config(self) -> Result<ConnectionConfig, ReportError> {
        let driver = if self.driver.trim().is_empty() {
            OdbcDriver::default()
        } else {
            self.driver.parse::<OdbcDriver>()?
        };
        Ok(ConnectionConfig {
            host: self.host,
            port: self.port,
            database: self.database,
            username: self.username,
            password: SecretString::from(self.password),
            driver,
            trust_server_certificate: self.trust_server_certificate.is_some(),
        })
    }
}

/// Query form fields as posted by the browser.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct QueryForm {
    pub location: String,
    pub gf_number: String,
    pub order_id: String,
}

impl From<QueryForm> for QueryParams {
    fn from(form: QueryForm) -> Self {
        QueryParams::new(form.location, form.gf_number, form.order_id)
    }
}

pub fn router<C: Connector>(app: Arc<App<C>>) -> Router {
    Router::new()
        .route("/", get(index::<C>))
        .route("/connect", post(connect::<C>))
        .route("/query", post(query::<C>))
        .route("/disconnect", post(disconnect::<C>))
        .with_state(app)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve<C: Connector>(app: Arc<App<C>>, addr: SocketAddr) -> Result<(), ReportError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "serving dashboard");
    axum::serve(listener, router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

async fn index<C: Connector>(State(app): State<Arc<App<C>>>, headers: HeaderMap) -> Response {
    let (session, created) = app.sessions.get_or_create(session_cookie(&headers)).await;
    let session = session.lock().await;
    let body = page(&app, &session, Vec::new(), Vec::new(), None);
    respond(body, created.then(|| session.id()))
}

async fn connect<C: Connector>(
    State(app): State<Arc<App<C>>>,
    headers: HeaderMap,
    Form(form): Form<ConnectForm>,
) -> Response {
    let (session, created) = app.sessions.get_or_create(session_cookie(&headers)).await;
    let mut session = session.lock().await;

    let outcome = match form.into_config() {
        Ok(config) => forms::submit_connection(&app.connector, &mut *session, config).await,
        Err(e) => {
            session.release();
            Err(e)
        }
    };

    let notice = match outcome {
        Ok(()) => Notice::success("Connected to SQL Server database successfully."),
        Err(e) => Notice::error(format!("Database connection failed: {}", e.user_message())),
    };

    let body = page(&app, &session, vec![notice], Vec::new(), None);
    respond(body, created.then(|| session.id()))
}

async fn query<C: Connector>(
    State(app): State<Arc<App<C>>>,
    headers: HeaderMap,
    Form(form): Form<QueryForm>,
) -> Response {
    let (session, created) = app.sessions.get_or_create(session_cookie(&headers)).await;
    let mut session = session.lock().await;

    let outcome = forms::submit_query(&mut *session, form.into()).await;
    let (notice, report) = query_notice(outcome);

    let body = page(&app, &session, Vec::new(), vec![notice], report.as_ref());
    respond(body, created.then(|| session.id()))
}

async fn disconnect<C: Connector>(
    State(app): State<Arc<App<C>>>,
    headers: HeaderMap,
) -> Response {
    if let Some(id) = session_cookie(&headers) {
        app.sessions.remove(id).await;
    }

    let (session, _) = app.sessions.get_or_create(None).await;
    let session = session.lock().await;
    let body = page(
        &app,
        &session,
        vec![Notice::info("Disconnected.")],
        Vec::new(),
        None,
    );
    respond(body, Some(session.id()))
}

/// Map a query submission outcome to the notice shown under the query form.
pub fn query_notice(outcome: Result<QueryOutcome, ReportError>) -> (Notice, Option<QueryResult>) {
    match outcome {
        Ok(QueryOutcome::NoRecords) => (Notice::info("No records found."), None),
        Ok(QueryOutcome::Found(result)) => (
            Notice::success(format!("Found {} records.", result.row_count())),
            Some(result),
        ),
        Err(ReportError::Validation { reason }) => (Notice::warning(reason), None),
        Err(ReportError::NotConnected) => (
            Notice::warning("Connect to a database before running a query."),
            None,
        ),
        Err(e @ ReportError::ConnectionLost { .. }) => (
            Notice::error(format!(
                "Error running query: {} Please reconnect.",
                e.user_message()
            )),
            None,
        ),
        Err(e) => (
            Notice::error(format!("Error running query: {}", e.user_message())),
            None,
        ),
    }
}

fn page<C: Connector>(
    app: &App<C>,
    session: &Session<C::Handle>,
    connection_notices: Vec<Notice>,
    query_notices: Vec<Notice>,
    report: Option<&QueryResult>,
) -> Result<String, ReportError> {
    let defaults;
    let connection = match &session.connection_inputs {
        Some(inputs) => inputs,
        None => {
            defaults = app.default_inputs();
            &defaults
        }
    };
    render::render_page(&PageView {
        connection,
        connected: session.is_connected(),
        query: &session.query_inputs,
        connection_notices,
        query_notices,
        report,
    })
}

fn respond(body: Result<String, ReportError>, new_session: Option<SessionId>) -> Response {
    let mut response = match body {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to render page");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("error: {}", e)).into_response()
        }
    };
    if let Some(id) = new_session
        && let Ok(value) = HeaderValue::from_str(&session_cookie_value(id))
    {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    response
}

pub fn session_cookie_value(id: SessionId) -> String {
    format!("{}={}; HttpOnly; SameSite=Strict; Path=/", SESSION_COOKIE, id)
}

/// Extract the session id from the request's `Cookie` headers, if present and well formed.
pub fn session_cookie(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| value.trim().parse().ok())
}
