//! Error types for the migration driver layer
//!
//! Every operation either fails before any SQL is issued (argument validation)
//! or forwards the execution primitive's outcome unchanged. Nothing here retries.

/// Result type alias for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Error types for driver operations
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// An optional hook was invoked on a driver that does not provide it
    #[error("{operation} is not implemented by this driver")]
    NotImplemented { operation: &'static str },

    /// Arguments were rejected before any statement was executed
    #[error("Argument mismatch: {0}")]
    ArgumentMismatch(String),

    /// The execution primitive of a driver failed
    #[error("Execution error: {0}")]
    Execution(String),

    /// sqlx failure raised by a bundled driver
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// A row could not be decoded into the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid driver configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl DriverError {
    pub fn not_implemented(operation: &'static str) -> Self {
        Self::NotImplemented { operation }
    }

    pub fn argument_mismatch(message: impl Into<String>) -> Self {
        Self::ArgumentMismatch(message.into())
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Check whether this error comes from an unsupported hook
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, DriverError::NotImplemented { .. })
    }
}

impl From<serde_json::Error> for DriverError {
    fn from(err: serde_json::Error) -> Self {
        DriverError::Decode(err.to_string())
    }
}
