use crate::backend::{Backend, CellValue, ColumnMeta, Connector, QueryResult};
use crate::error::ReportError;
use crate::logging::Timer;
use crate::masking;
use crate::model::ConnectionConfig;
use odbc_api::parameter::VarCharSlice;
use odbc_api::{
    ColumnDescription, Connection, ConnectionOptions, Cursor, Environment, IntoParameter,
    ResultSetMetadata,
};
use secrecy::{ExposeSecret, SecretString};
use std::borrow::Cow;

const PROBE_SQL: &str = "SELECT 1";

/// Build the ODBC connection string for `config`.
///
/// User-supplied values go through [`escape_value`], so no value can end its
/// attribute early or inject another one. The username and password are
/// always passed through as given, even when empty.
pub fn connection_string(config: &ConnectionConfig) -> String {
    let server = format!("{},{}", config.host.trim(), config.port.trim());
    let mut parts = vec![
        format!("Driver={{{}}}", config.driver.name()),
        format!("Server={}", escape_value(&server)),
    ];

    let database = config.database.trim();
    if !database.is_empty() {
        parts.push(format!("Database={}", escape_value(database)));
    }

    parts.push(format!("UID={}", escape_value(&config.username)));
    parts.push(format!("PWD={}", escape_value(config.password.expose_secret())));

    let trust = if config.trust_server_certificate { "yes" } else { "no" };
    parts.push(format!("TrustServerCertificate={}", trust));

    parts.join(";") + ";"
}

/// Brace an attribute value when it holds a character with meaning in a
/// connection string, doubling every `}` inside.
///
/// `odbc_api::escape_attribute_value` only braces on `;` and `+`, which leaves
/// a value such as `{p}rest` to be read as `p` followed by garbage.
pub fn escape_value(value: &str) -> Cow<'_, str> {
    let needs_braces = value.contains(['{', '}', ';', '+', '='])
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace);
    if needs_braces {
        Cow::Owned(format!("{{{}}}", value.replace('}', "}}")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Opens SQL Server handles through the system ODBC driver manager.
#[derive(Debug, Clone)]
pub struct SqlServerConnector {
    login_timeout_secs: u32,
    query_timeout_secs: u64,
    show_secrets: bool,
}

impl SqlServerConnector {
    pub fn new(login_timeout_secs: u32, query_timeout_secs: u64, show_secrets: bool) -> Self {
        Self {
            login_timeout_secs,
            query_timeout_secs,
            show_secrets,
        }
    }
}

impl Connector for SqlServerConnector {
    type Handle = SqlServerHandle;

    async fn connect(&self, config: &ConnectionConfig) -> Result<SqlServerHandle, ReportError> {
        let conn_str = connection_string(config);
        tracing::info!(
            connection = %masking::masked_connection_string(&conn_str, self.show_secrets),
            "connecting to sqlserver"
        );

        let timer = Timer::start();
        let login_timeout = self.login_timeout_secs;
        let probe_str = SecretString::from(conn_str.clone());
        tokio::task::spawn_blocking(move || -> Result<(), ReportError> {
            let env = new_environment()?;
            let conn = open(&env, probe_str.expose_secret(), login_timeout)?;
            conn.execute(PROBE_SQL, (), None)
                .map_err(|e| ReportError::Connection {
                    message: format!("connection check failed: {}", e),
                })?;
            Ok(())
        })
        .await
        .map_err(|e| ReportError::Connection {
            message: format!("task join error: {}", e),
        })??;

        tracing::info!(elapsed_ms = timer.elapsed_ms() as u64, "connection verified");

        Ok(SqlServerHandle {
            conn_str: SecretString::from(conn_str),
            login_timeout_secs: self.login_timeout_secs,
            query_timeout_secs: self.query_timeout_secs,
        })
    }
}

/// A verified SQL Server target. Each query opens its own connection and
/// closes it before returning, on success and on error alike.
pub struct SqlServerHandle {
    conn_str: SecretString,
    login_timeout_secs: u32,
    query_timeout_secs: u64,
}

impl std::fmt::Debug for SqlServerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlServerHandle")
            .field("conn_str", &masking::REDACTED)
            .field("login_timeout_secs", &self.login_timeout_secs)
            .field("query_timeout_secs", &self.query_timeout_secs)
            .finish()
    }
}

impl Backend for SqlServerHandle {
    async fn query(&self, sql: &str, params: &[&str]) -> Result<QueryResult, ReportError> {
        let conn_str = SecretString::from(self.conn_str.expose_secret().to_string());
        let login_timeout = self.login_timeout_secs;
        let query_timeout = self.query_timeout_secs;
        let sql = sql.to_string();
        let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();

        tokio::task::spawn_blocking(move || {
            let env = new_environment()?;
            // The server accepted this target at connect time, so a failure to
            // reopen means the session's connection is gone.
            let conn = open(&env, conn_str.expose_secret(), login_timeout).map_err(|e| {
                ReportError::ConnectionLost {
                    message: e.user_message(),
                }
            })?;
            fetch_all(&conn, &sql, &params, query_timeout)
        })
        .await
        .map_err(|e| ReportError::Query {
            message: format!("task join error: {}", e),
        })?
    }
}

fn new_environment() -> Result<Environment, ReportError> {
    Environment::new().map_err(|e| ReportError::Connection {
        message: format!("ODBC environment error: {}", e),
    })
}

fn open<'env>(
    env: &'env Environment,
    conn_str: &str,
    login_timeout_secs: u32,
) -> Result<Connection<'env>, ReportError> {
    env.connect_with_connection_string(
        conn_str,
        ConnectionOptions {
            login_timeout_sec: Some(login_timeout_secs),
            ..Default::default()
        },
    )
    .map_err(|e| ReportError::Connection {
        message: format!("connection failed: {}", e),
    })
}

/// Map a statement-level ODBC error onto the session-facing error kinds.
fn classify(err: odbc_api::Error, timeout_secs: u64) -> ReportError {
    if let odbc_api::Error::Diagnostics { record, .. } = &err {
        let state = record.state.as_str();
        if state.starts_with("08") {
            return ReportError::ConnectionLost {
                message: err.to_string(),
            };
        }
        if state == "HYT00" {
            return ReportError::Timeout {
                seconds: timeout_secs,
            };
        }
    }
    ReportError::Query {
        message: err.to_string(),
    }
}

fn fetch_all(
    conn: &Connection<'_>,
    sql: &str,
    params: &[String],
    timeout_secs: u64,
) -> Result<QueryResult, ReportError> {
    let bound: Vec<VarCharSlice<'_>> = params.iter().map(|p| p.as_str().into_parameter()).collect();

    let cursor = conn
        .execute(sql, bound.as_slice(), Some(timeout_secs as usize))
        .map_err(|e| classify(e, timeout_secs))?;

    let Some(mut cursor) = cursor else {
        return Ok(QueryResult::default());
    };

    let num_cols = cursor
        .num_result_cols()
        .map_err(|e| classify(e, timeout_secs))? as u16;

    let mut columns = Vec::with_capacity(num_cols as usize);
    for i in 1..=num_cols {
        let mut col_desc = ColumnDescription::default();
        cursor
            .describe_col(i, &mut col_desc)
            .map_err(|e| classify(e, timeout_secs))?;
        let name = col_desc.name_to_string().map_err(|e| ReportError::Query {
            message: format!("failed to decode column name {}: {}", i, e),
        })?;
        columns.push(ColumnMeta {
            name,
            type_name: format!("{:?}", col_desc.data_type),
        });
    }

    // Row-wise reads grow `buf` to each value's full length, so `(MAX)`
    // columns come back whole instead of cut at a fixed buffer size.
    let mut rows = Vec::new();
    let mut buf = Vec::new();
    while let Some(mut row) = cursor.next_row().map_err(|e| classify(e, timeout_secs))? {
        let mut cells = Vec::with_capacity(num_cols as usize);
        for col in 1..=num_cols {
            let present = row
                .get_text(col, &mut buf)
                .map_err(|e| classify(e, timeout_secs))?;
            cells.push(if present {
                CellValue::Text(String::from_utf8_lossy(&buf).into_owned())
            } else {
                CellValue::Null
            });
        }
        rows.push(cells);
    }

    Ok(QueryResult { columns, rows })
}
