use std::fmt;

use thiserror::Error;

/// A failure reported by the underlying driver.
///
/// `Display` renders `code - message`; [`DriverError::diagnostic`] adds the SQL text on a
/// second line, which is the form written to the shared error slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    pub code: i32,
    pub message: String,
    pub sql: Option<String>,
}

impl DriverError {
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            sql: None,
        }
    }

    /// Attach the statement text, keeping one the driver already supplied.
    #[must_use]
    pub fn with_sql(mut self, sql: &str) -> Self {
        if self.sql.is_none() {
            self.sql = Some(sql.to_string());
        }
        self
    }

    /// `code - message\nsqltext`
    #[must_use]
    pub fn diagnostic(&self) -> String {
        format!("{self}\n{}", self.sql.as_deref().unwrap_or_default())
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code, self.message)
    }
}

impl std::error::Error for DriverError {}

#[derive(Debug, Error)]
pub enum SqlSessionError {
    #[error("Not connected to the database")]
    NotConnected,

    #[error("Connect failed: {0}")]
    ConnectFailed(DriverError),

    #[error("Parse failed: {0}")]
    ParseFailed(DriverError),

    #[error("Execute failed: {0}")]
    ExecuteFailed(DriverError),

    #[error("Could not write large object for bind variable :{name}: {source}")]
    LobWriteFailed { name: String, source: DriverError },

    #[error("Result mode requires an index field name")]
    MissingIndexField,

    #[error("Index field {0} is not a column of the result")]
    UnknownIndexField(String),

    #[error("Unknown result mode: {0}")]
    UnknownResultMode(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SqlSessionError {
    /// The driver failure behind this error, if there is one.
    #[must_use]
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            Self::ConnectFailed(err)
            | Self::ParseFailed(err)
            | Self::ExecuteFailed(err)
            | Self::LobWriteFailed { source: err, .. } => Some(err),
            _ => None,
        }
    }

    /// Text written to the error slot when this error is reported.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        match self.driver_error() {
            Some(err) => err.diagnostic(),
            None => format!("0 - {self}\n"),
        }
    }

    /// Whether a non-empty exception message may turn this error into a sentinel return.
    ///
    /// Only failures reported by the database are suppressible; misuse of the API
    /// (not connected, bad result mode, missing index field) always raises.
    #[must_use]
    pub fn is_suppressible(&self) -> bool {
        self.driver_error().is_some()
    }
}
