use std::error::Error as StdError;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

pub type RelayResult<T> = Result<T, RelayError>;

/// Failure of a single relay call.
///
/// Every variant aborts the call that produced it. Nothing in this workspace
/// retries or compensates; the orchestrator decides what happens next, so the
/// rendered message always starts with the failure kind it can match on.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("ValidationError: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
    #[error("ProviderError: {operation} failed: {message}")]
    Provider {
        operation: &'static str,
        message: String,
    },
    #[error("AuthorizationError: {operation} rejected: {reason}")]
    Authorization {
        operation: &'static str,
        reason: String,
    },
    #[error("HandlerError: wrapped handler failed: {source}")]
    Handler {
        #[source]
        source: BoxError,
    },
    #[error("ConfigError: {0}")]
    Config(String),
    #[error("Cancelled: {operation} did not complete before the deadline")]
    Cancelled { operation: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Provider,
    Authorization,
    Handler,
    Config,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "ValidationError",
            Self::Provider => "ProviderError",
            Self::Authorization => "AuthorizationError",
            Self::Handler => "HandlerError",
            Self::Config => "ConfigError",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl RelayError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            source: None,
        }
    }

    pub fn validation_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Validation {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn provider(operation: &'static str, message: impl std::fmt::Display) -> Self {
        Self::Provider {
            operation,
            message: message.to_string(),
        }
    }

    pub fn authorization(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Authorization {
            operation,
            reason: reason.into(),
        }
    }

    pub fn handler(source: impl Into<BoxError>) -> Self {
        Self::Handler {
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Provider { .. } => ErrorKind::Provider,
            Self::Authorization { .. } => ErrorKind::Authorization,
            Self::Handler { .. } => ErrorKind::Handler,
            Self::Config(_) => ErrorKind::Config,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }
}
