use crate::error::ReportError;
use secrecy::SecretString;
use std::fmt;
use std::str::FromStr;

/// ODBC driver used to reach SQL Server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OdbcDriver {
    #[default]
    V18,
    V17,
}

impl OdbcDriver {
    pub const ALL: [OdbcDriver; 2] = [OdbcDriver::V18, OdbcDriver::V17];

    /// Driver name as registered with the ODBC driver manager.
    pub fn name(self) -> &'static str {
        match self {
            OdbcDriver::V18 => "ODBC Driver 18 for SQL Server",
            OdbcDriver::V17 => "ODBC Driver 17 for SQL Server",
        }
    }
}

impl fmt::Display for OdbcDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OdbcDriver {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        OdbcDriver::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ReportError::Connection {
                message: format!(
                    "unknown ODBC driver '{}' (expected '{}' or '{}')",
                    s,
                    OdbcDriver::V18.name(),
                    OdbcDriver::V17.name()
                ),
            })
    }
}

/// Credentials and target submitted through the connection form.
#[derive(Debug)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: String,
    pub database: String,
    pub username: String,
    pub password: SecretString,
    pub driver: OdbcDriver,
    pub trust_server_certificate: bool,
}

/// The three lookup values submitted through the query form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub location: String,
    pub gf_number: String,
    pub order_id: String,
}

impl QueryParams {
    pub fn new(
        location: impl Into<String>,
        gf_number: impl Into<String>,
        order_id: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            gf_number: gf_number.into(),
            order_id: order_id.into(),
        }
    }

    /// Values in the order the lookup statement binds them.
    pub fn as_bind_values(&self) -> [&str; 3] {
        [
            self.location.as_str(),
            self.gf_number.as_str(),
            self.order_id.as_str(),
        ]
    }
}
