use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for porygo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for porygo operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Transport-level failures while fetching a resource
    #[error("network error for '{endpoint}': {message}")]
    Network { endpoint: String, message: String },

    /// The resource answered with a non-success status
    #[error("request to '{endpoint}' failed with status code: {status}")]
    HttpStatus { endpoint: String, status: u16 },

    /// Operation timeout errors
    #[error("operation '{operation}' timed out after {duration:?}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Every attempt of a retry loop failed
    #[error("all {attempts} attempts failed: {source}")]
    RetriesExhausted {
        attempts: usize,
        #[source]
        source: Box<Error>,
    },

    /// The surrounding operation was aborted before it could finish
    #[error("operation '{operation}' was cancelled")]
    Cancelled { operation: String },

    /// Work was submitted to a pool that is draining or closed
    #[error("worker pool is closed: {message}")]
    PoolClosed { message: String },

    /// A work item panicked while running
    #[error("work item '{label}' panicked: {message}")]
    WorkerPanic { label: String, message: String },

    /// Cache store failures
    #[error("cache error: {message}")]
    Cache { message: String },

    /// File system operations
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Another error with a description of what was being attempted
    #[error("{message}: {source}")]
    Context {
        message: String,
        #[source]
        source: Box<Error>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

// Conversion implementations
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::FileSystem {
            path: PathBuf::new(),
            operation: "unknown".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json {
            message: error.to_string(),
            source: error,
        }
    }
}

// Helper methods for creating errors with context
impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a network error
    #[must_use]
    pub fn network(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Network {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    #[must_use]
    pub fn http_status(endpoint: impl Into<String>, status: u16) -> Self {
        Error::HttpStatus {
            endpoint: endpoint.into(),
            status,
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Error::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Wrap the last error of a retry loop
    #[must_use]
    pub fn retries_exhausted(attempts: usize, last_error: Error) -> Self {
        Error::RetriesExhausted {
            attempts,
            source: Box::new(last_error),
        }
    }

    /// Create a cancellation error
    #[must_use]
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Error::Cancelled {
            operation: operation.into(),
        }
    }

    /// Create a pool closed error
    #[must_use]
    pub fn pool_closed(message: impl Into<String>) -> Self {
        Error::PoolClosed {
            message: message.into(),
        }
    }

    /// Create a worker panic error
    #[must_use]
    pub fn worker_panic(label: impl Into<String>, message: impl Into<String>) -> Self {
        Error::WorkerPanic {
            label: label.into(),
            message: message.into(),
        }
    }

    /// Create a cache error
    #[must_use]
    pub fn cache(message: impl Into<String>) -> Self {
        Error::Cache {
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Describe what was being attempted when `source` occurred
    #[must_use]
    pub fn context(message: impl Into<String>, source: Error) -> Self {
        Error::Context {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// True when the error reports an aborted operation rather than a failed one
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Cancelled { .. } => true,
            Error::Context { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// The error of the final attempt when retries were exhausted, otherwise `self`
    pub fn last_attempt_error(&self) -> &Error {
        match self {
            Error::RetriesExhausted { source, .. } => source.last_attempt_error(),
            other => other,
        }
    }
}

// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a lazy message
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::context(message, e.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| Error::context(f(), e.into()))
    }
}
