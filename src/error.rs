use crate::transport::TransportError;
use std::time::Duration;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Logical endpoint the failing call targeted (e.g., "login", "insert")
    pub endpoint: Option<String>,
    /// Client-side correlation id of the call
    pub request_id: Option<String>,
    /// Additional context about the error (e.g., expected shape, offending value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_validation", "login")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            endpoint: None,
            request_id: None,
            details: None,
            source: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Machine-checkable category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NetworkUnavailable,
    Timeout,
    InvalidResponseFormat,
    Http,
    AuthExpired,
    Unsupported,
    MissingRefreshToken,
    InvalidRefreshResponse,
    RecordNotInserted,
    Configuration,
    Serialization,
    Transport,
}

/// Unified error type for the request layer.
///
/// Every transport failure and every classification outcome is folded into
/// one of these variants at the engine boundary.
#[derive(Debug, Error)]
pub enum Error {
    #[error("No network connection: {message}")]
    NetworkUnavailable { message: String },

    #[error("Request timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    #[error("Invalid response format: {message}{}", format_context(.context))]
    InvalidResponseFormat {
        message: String,
        context: ErrorContext,
    },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Token expired and could not be refreshed: {source}")]
    AuthExpired {
        #[source]
        source: Box<Error>,
    },

    #[error("Unsupported HTTP method: {method}")]
    Unsupported { method: String },

    #[error("No refresh token available")]
    MissingRefreshToken,

    #[error("Invalid refresh response: {message}")]
    InvalidRefreshResponse { message: String },

    #[error("Could not insert record into table '{table}'")]
    RecordNotInserted { table: String },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network transport error: {0}")]
    Transport(#[source] TransportError),
}

fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref endpoint) = ctx.endpoint {
        parts.push(format!("endpoint: {}", endpoint));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if let Some(ref id) = ctx.request_id {
        parts.push(format!("request_id: {}", id));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn invalid_format_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::InvalidResponseFormat {
            message: msg.into(),
            context,
        }
    }

    /// Fold a transport failure into the public taxonomy.
    ///
    /// `timeout` is the window the attempt ran under; it is reported when the
    /// transport itself gave up on time.
    pub(crate) fn from_transport(err: TransportError, timeout: Duration) -> Self {
        match err {
            TransportError::Connect(message) => Error::NetworkUnavailable { message },
            TransportError::Timeout => Error::Timeout { after: timeout },
            TransportError::Body(message) => Error::invalid_format_with_context(
                message,
                ErrorContext::new().with_source("transport_body"),
            ),
            other @ TransportError::Other(_) => Error::Transport(other),
        }
    }

    /// Stamp the client request id onto errors that carry a context.
    pub(crate) fn with_request_id(mut self, id: &str) -> Self {
        if let Error::Configuration { context, .. } | Error::InvalidResponseFormat { context, .. } =
            &mut self
        {
            context.request_id = Some(id.to_string());
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NetworkUnavailable { .. } => ErrorKind::NetworkUnavailable,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::InvalidResponseFormat { .. } => ErrorKind::InvalidResponseFormat,
            Error::Http { .. } => ErrorKind::Http,
            Error::AuthExpired { .. } => ErrorKind::AuthExpired,
            Error::Unsupported { .. } => ErrorKind::Unsupported,
            Error::MissingRefreshToken => ErrorKind::MissingRefreshToken,
            Error::InvalidRefreshResponse { .. } => ErrorKind::InvalidRefreshResponse,
            Error::RecordNotInserted { .. } => ErrorKind::RecordNotInserted,
            Error::Configuration { .. } => ErrorKind::Configuration,
            Error::Serialization(_) => ErrorKind::Serialization,
            Error::Transport(_) => ErrorKind::Transport,
        }
    }

    /// HTTP status carried by the error, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::AuthExpired { source } => source.status(),
            _ => None,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::InvalidResponseFormat { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }
}
