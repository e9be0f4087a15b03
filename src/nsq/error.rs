//! NSQ Error Types

#[derive(Debug, thiserror::Error)]
pub enum NsqError {
    #[error("Invalid NSQ configuration: {message}")]
    Configuration { message: String },

    #[error("Invalid {kind} name '{name}': expected 1-64 characters of [.a-zA-Z0-9_-], optionally ending in #ephemeral")]
    InvalidName { kind: &'static str, name: String },

    #[error("Failed to publish to topic '{topic}': {message}")]
    Publish { topic: String, message: String },

    #[error("Failed to connect consumer {topic}/{channel} via {endpoint}: {message}")]
    Connect {
        topic: String,
        channel: String,
        endpoint: String,
        message: String,
    },

    #[error("NSQ service is shut down")]
    ShutDown,

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Result type for NSQ operations
pub type NsqResult<T> = Result<T, NsqError>;
