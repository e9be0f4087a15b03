//! Kafka Error Types

#[derive(Debug, thiserror::Error)]
pub enum KafkaError {
    #[error("Invalid Kafka configuration: {message}")]
    Configuration { message: String },

    #[error("Failed to open {role} for topic '{topic}': {message}")]
    Connect {
        topic: String,
        role: &'static str,
        message: String,
    },

    #[error("Failed to write to topic '{topic}': {message}")]
    Write { topic: String, message: String },

    #[error("Failed to read from topic '{topic}': {message}")]
    Read { topic: String, message: String },

    #[error("Failed to close {role} for topic '{topic}': {message}")]
    Close {
        topic: String,
        role: &'static str,
        message: String,
    },

    #[error("Consumer for topic '{topic}' gave up after {attempts} consecutive read failures")]
    ReadExhausted {
        topic: String,
        attempts: usize,
        #[source]
        source: Box<KafkaError>,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Result type for Kafka operations
pub type KafkaResult<T> = Result<T, KafkaError>;
