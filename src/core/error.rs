use thiserror::Error;

#[derive(Error, Debug)]
pub enum LumenError {
    #[error("Aggregation mismatch: cannot combine {found} into {expected}")]
    AggregationMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("State was already read, cannot set state")]
    StateAlreadyRead,

    #[error("View conflict: {0}")]
    ViewConflict(String),

    #[error("Queue full: recording dropped")]
    QueueFull,

    #[error("Channel send error")]
    ChannelSend,

    #[error("Timeout error: operation took longer than {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Buffer limit exceeded: {required} bytes required, limit is {limit} bytes")]
    BufferLimitExceeded { required: usize, limit: usize },

    #[error("Message too large: {0} bytes does not fit a length prefix")]
    MessageTooLarge(usize),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for lumen operations
pub type Result<T> = std::result::Result<T, LumenError>;

impl LumenError {
    /// Creates a new invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates a new deserialization error
    pub fn deserialization<S: Into<String>>(msg: S) -> Self {
        Self::Deserialization(msg.into())
    }

    /// Creates a new serialization error
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::Serialization(msg.into())
    }

    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new view conflict error
    pub fn view_conflict<S: Into<String>>(msg: S) -> Self {
        Self::ViewConflict(msg.into())
    }

    /// Returns true if retrying the operation later may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::QueueFull | Self::Timeout { .. } | Self::BufferLimitExceeded { .. })
    }

    /// Returns the error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::AggregationMismatch { .. } => "aggregation",
            Self::InvalidArgument(_) => "validation",
            Self::Deserialization(_) | Self::Serialization(_) => "serialization",
            Self::StateAlreadyRead => "state",
            Self::ViewConflict(_) => "view",
            Self::QueueFull | Self::ChannelSend => "channel",
            Self::Timeout { .. } => "timeout",
            Self::BufferLimitExceeded { .. } | Self::MessageTooLarge(_) => "buffer",
            Self::Config(_) | Self::Yaml(_) => "config",
            Self::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LumenError::invalid_argument("bucket boundaries must be ascending");
        assert_eq!(err.to_string(), "Invalid argument: bucket boundaries must be ascending");
        assert_eq!(err.category(), "validation");
    }

    #[test]
    fn test_error_recoverability() {
        assert!(LumenError::QueueFull.is_recoverable());
        assert!(LumenError::Timeout { timeout_ms: 5000 }.is_recoverable());
        assert!(!LumenError::StateAlreadyRead.is_recoverable());
        assert!(!LumenError::config("invalid config").is_recoverable());
    }

    #[test]
    fn test_mismatch_message() {
        let err = LumenError::AggregationMismatch {
            expected: "Sum",
            found: "Count",
        };
        assert_eq!(err.to_string(), "Aggregation mismatch: cannot combine Count into Sum");
        assert_eq!(err.category(), "aggregation");
    }

    #[test]
    fn test_buffer_limit_error() {
        let err = LumenError::BufferLimitExceeded {
            required: 2048,
            limit: 1024,
        };
        assert_eq!(
            err.to_string(),
            "Buffer limit exceeded: 2048 bytes required, limit is 1024 bytes"
        );
        assert_eq!(err.category(), "buffer");
    }
}
