//! Error types for analysis service calls.
//!
//! Every failure talking to the merge service is a [`ClientError`] carrying an
//! [`ErrorContext`] that records which operation and endpoint failed.

use std::fmt;

/// Result type for analysis service operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Structured context for client errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "merge_csvs", "data_by_date")
    pub operation: Option<String>,
    /// Endpoint path, relative to the API prefix
    pub endpoint: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
    /// Whether this error is retryable
    pub retryable: bool,
}

impl ErrorContext {
    /// Create a new error context with an operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    /// Set the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set additional details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Mark this error as retryable.
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref endpoint) = self.endpoint {
            parts.push(format!("endpoint={}", endpoint));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for analysis service operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response (DNS, refused connection, reset).
    #[error("Network error: {message} {context}")]
    Network {
        message: String,
        context: ErrorContext,
    },

    /// The service answered with a non-success status.
    #[error("Request failed with status {status}: {message} {context}")]
    Status {
        status: u16,
        message: String,
        context: ErrorContext,
    },

    /// The response body did not match the expected contract.
    #[error("Decode error: {message} {context}")]
    Decode {
        message: String,
        context: ErrorContext,
    },

    /// A local file could not be read.
    #[error("I/O error: {message} {context}")]
    Io {
        message: String,
        context: ErrorContext,
    },

    /// Configuration or initialization error.
    #[error("Configuration error: {message} {context}")]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    /// The request exceeded the configured timeout.
    #[error("Timeout error: {message} {context}")]
    Timeout {
        message: String,
        context: ErrorContext,
    },
}

impl ClientError {
    /// Create a network error. Network errors are retryable.
    pub fn network(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Network {
            message: message.into(),
            context: context.retryable(),
        }
    }

    /// Create a status error.
    pub fn status(status: u16, message: impl Into<String>, context: ErrorContext) -> Self {
        // 5xx responses may succeed on a later attempt
        let context = if status >= 500 {
            context.retryable()
        } else {
            context
        };
        Self::Status {
            status,
            message: message.into(),
            context,
        }
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Decode {
            message: message.into(),
            context,
        }
    }

    /// Create an I/O error.
    pub fn io(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Io {
            message: message.into(),
            context,
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a timeout error. Timeouts are retryable.
    pub fn timeout(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Timeout {
            message: message.into(),
            context: context.retryable(),
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.context().retryable
    }

    /// Get the error context.
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Network { context, .. }
            | Self::Status { context, .. }
            | Self::Decode { context, .. }
            | Self::Io { context, .. }
            | Self::Configuration { context, .. }
            | Self::Timeout { context, .. } => context,
        }
    }

    /// Short message suitable for showing next to a failed item, without the
    /// debugging context.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network { message, .. } => format!("Network error: {}", message),
            Self::Status {
                status, message, ..
            } => format!("Server responded with {} {}", status, message)
                .trim_end()
                .to_string(),
            Self::Decode { message, .. } => format!("Unexpected response: {}", message),
            Self::Io { message, .. } => format!("Could not read file: {}", message),
            Self::Configuration { message, .. } => message.clone(),
            Self::Timeout { message, .. } => format!("Request timed out: {}", message),
        }
    }
}

#[cfg(feature = "http-client")]
impl ClientError {
    /// Map a reqwest transport error, keeping timeouts distinct.
    pub fn from_reqwest(err: reqwest::Error, context: ErrorContext) -> Self {
        if err.is_timeout() {
            Self::timeout(err.to_string(), context)
        } else if err.is_decode() {
            Self::decode(err.to_string(), context)
        } else {
            Self::network(err.to_string(), context)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display() {
        let ctx = ErrorContext::new("merge_csvs")
            .with_endpoint("/merge-csvs")
            .with_details("3 files")
            .retryable();
        assert_eq!(
            ctx.to_string(),
            "[operation=merge_csvs, endpoint=/merge-csvs, details=3 files, retryable=true]"
        );
    }

    #[test]
    fn test_network_and_timeout_are_retryable() {
        assert!(ClientError::network("refused", ErrorContext::new("x")).is_retryable());
        assert!(ClientError::timeout("30s", ErrorContext::new("x")).is_retryable());
        assert!(!ClientError::decode("bad json", ErrorContext::new("x")).is_retryable());
    }

    #[test]
    fn test_status_retryable_only_for_server_errors() {
        assert!(ClientError::status(503, "Service Unavailable", ErrorContext::default())
            .is_retryable());
        assert!(!ClientError::status(400, "Bad Request", ErrorContext::default())
            .is_retryable());
    }

    #[test]
    fn test_user_message_omits_context() {
        let err = ClientError::status(
            500,
            "Internal Server Error",
            ErrorContext::new("merge_csvs").with_endpoint("/merge-csvs"),
        );
        assert_eq!(
            err.user_message(),
            "Server responded with 500 Internal Server Error"
        );
        assert!(err.to_string().contains("operation=merge_csvs"));
    }
}
