use drivegate_core::GateError;
use serde_json::Value;
use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to the storage API
#[derive(Error, Debug)]
pub enum StoreError {
    /// The API answered with a non-success status.
    #[error("Storage API returned {status}")]
    Status { status: u16, body: Option<Value> },

    #[error("Invalid request: {message}")]
    Invalid { message: String },

    /// The call never produced an answer (connect, TLS, body read...).
    #[error("Storage backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Create a backend error from any error type
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    /// Create an invalid request error
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Build a status error from a raw body, keeping it as JSON when it parses.
    pub fn status(status: u16, body: &[u8]) -> Self {
        let body = if body.is_empty() {
            None
        } else {
            Some(serde_json::from_slice(body).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(body).into_owned())
            }))
        };
        Self::Status { status, body }
    }

    /// HTTP status of the upstream answer, if there was one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            StoreError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<StoreError> for GateError {
    /// Upstream passthrough: status and body when the API answered, generic 500 otherwise.
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Status { status, body } => GateError::upstream(Some(status), body),
            other => GateError::upstream(None, None).with_source(other.into()),
        }
    }
}
