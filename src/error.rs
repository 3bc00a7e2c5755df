use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("connection: {message}")]
    Connection { message: String },

    #[error("validation: {reason}")]
    Validation { reason: String },

    #[error("query: {message}")]
    Query { message: String },

    #[error("connection lost: {message}")]
    ConnectionLost { message: String },

    #[error("timeout: query timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("not connected: connect to a database first")]
    NotConnected,

    #[error("config: {message}")]
    Config { message: String },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("format: {message}")]
    Format { message: String },
}

impl ReportError {
    /// Message shown to the user on the page, without the category prefix.
    pub fn user_message(&self) -> String {
        match self {
            ReportError::Connection { message }
            | ReportError::Query { message }
            | ReportError::ConnectionLost { message }
            | ReportError::Config { message }
            | ReportError::Format { message } => message.clone(),
            ReportError::Validation { reason } => reason.clone(),
            other => other.to_string(),
        }
    }

    /// True when the failure means the session's handle can no longer be used.
    pub fn drops_connection(&self) -> bool {
        matches!(self, ReportError::ConnectionLost { .. })
    }
}
