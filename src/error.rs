use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Element or attribute path that caused the error (e.g., "plays/play[3]@date")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected tag, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "plays_builder", "cache_key")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
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

/// Unified error type for the fetch engine and everything built on it.
///
/// The variants double as the outcome classification of a single fetch
/// attempt; [`Error::is_retryable`] is the one place deciding which of them
/// are worth another attempt.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP 502 from the API front end.
    #[error("Transient server error: HTTP 502 Bad Gateway")]
    TransientServer,

    /// HTTP 429 with the server supplied message.
    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    /// The body is not a well-formed document, or not the document the request expects.
    #[error("Malformed response: {message}{}", format_context(.context))]
    Malformed {
        message: String,
        context: ErrorContext,
    },

    /// Any status the engine has no specific handling for.
    #[error("Unexpected HTTP status {status}")]
    FatalProtocol { status: u16 },

    /// A 429 body whose root is not `<error>`.
    #[error("Unexpected error document: expected root tag 'error', got '{root}'")]
    UnexpectedErrorDocument { root: String },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bailing out after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a malformed-response error with structured context
    pub fn malformed_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Malformed {
            message: msg.into(),
            context,
        }
    }

    /// Create a malformed-response error without context
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::malformed_with_context(msg, ErrorContext::new())
    }

    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Create a new validation error without context
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::validation_with_context(msg, ErrorContext::new())
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Whether the fetch engine spends another attempt on this error.
    ///
    /// All retryable kinds share one attempt counter and one backoff schedule.
    /// Unexpected statuses are retried too, so a permanent 404 costs the whole
    /// budget before it surfaces.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::TransientServer
            | Error::RateLimited { .. }
            | Error::Malformed { .. }
            | Error::FatalProtocol { .. }
            | Error::Transport(_) => true,
            Error::UnexpectedErrorDocument { .. }
            | Error::Validation { .. }
            | Error::Configuration { .. }
            | Error::Io(_)
            | Error::RetriesExhausted { .. } => false,
        }
    }

    /// Short, stable label used in log fields.
    pub fn class(&self) -> &'static str {
        match self {
            Error::TransientServer => "transient_server",
            Error::RateLimited { .. } => "rate_limited",
            Error::Malformed { .. } => "malformed",
            Error::FatalProtocol { .. } => "fatal_protocol",
            Error::UnexpectedErrorDocument { .. } => "unexpected_error_document",
            Error::Transport(_) => "transport",
            Error::Validation { .. } => "validation",
            Error::Configuration { .. } => "configuration",
            Error::Io(_) => "io",
            Error::RetriesExhausted { .. } => "retries_exhausted",
        }
    }

    /// The error that ended the last attempt, looking through `RetriesExhausted`.
    pub fn last_attempt_error(&self) -> &Error {
        match self {
            Error::RetriesExhausted { source, .. } => source.last_attempt_error(),
            other => other,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Malformed { context, .. }
            | Error::Validation { context, .. }
            | Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::malformed_with_context(
            "document is not well-formed XML",
            ErrorContext::new()
                .with_details(e.to_string())
                .with_source("xml_parser"),
        )
    }
}
