use std::time::Duration;

/// Failures raised by broker channels during a publish attempt.
///
/// These never leave [`EventPublisher`](crate::EventPublisher): they are
/// logged and counted there, then dropped.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("broker connection failed: {0}")]
    Connection(String),

    #[error("failed to declare topic {topic}: {reason}")]
    DeclareTopic { topic: String, reason: String },

    #[error("failed to serialize envelope: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to publish message: {0}")]
    Publish(String),

    #[error("publish attempt exceeded {0:?}")]
    Timeout(Duration),

    #[error("broker channel panicked during publish")]
    Panicked,
}

impl BrokerError {
    /// Short label for the step that failed, used as a metric label.
    pub fn stage(&self) -> &'static str {
        match self {
            BrokerError::Connection(_) => "connect",
            BrokerError::DeclareTopic { .. } => "declare_topic",
            BrokerError::Serialization(_) => "serialize",
            BrokerError::Publish(_) => "publish",
            BrokerError::Timeout(_) => "timeout",
            BrokerError::Panicked => "panic",
        }
    }
}
