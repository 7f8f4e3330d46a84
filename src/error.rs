use std::time::Duration;

/// Error types for the teleop node
#[derive(Debug, thiserror::Error)]
pub enum TeleopError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Send timed out after {0:?}")]
    SendTimeout(Duration),

    #[error("Key listener panicked")]
    ListenerPanicked,
}

impl From<zenoh::Error> for TeleopError {
    fn from(e: zenoh::Error) -> Self {
        TeleopError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TeleopError>;
