use thiserror::Error;
use vayal_editor_core::CommandError;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("malformed bridge message: {0}")]
    MalformedMessage(#[from] serde_json::Error),

    #[error("`{kind}` is not accepted by the {receiver}")]
    UnexpectedMessage {
        kind: &'static str,
        receiver: &'static str,
    },

    #[error("transport failed: {0}")]
    Transport(String),

    #[error("a change handler is already registered")]
    HandlerAlreadyRegistered,

    #[error("edit failed: {0}")]
    Edit(#[from] CommandError),

    #[error("surface page failed to render: {0}")]
    Page(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    /// The upload service answered with an error of its own.
    #[error("upload rejected: {0}")]
    Rejected(String),

    #[error("upload response carries no image url")]
    MissingUrl,

    #[error("upload response is not valid JSON: {0}")]
    InvalidResponse(String),

    #[error("upload request failed: {0}")]
    Network(String),
}

impl UploadError {
    /// Message reported by the remote service, if it sent one.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            UploadError::Rejected(message) if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PickerError {
    #[error("image picker unavailable: {0}")]
    Unavailable(String),

    #[error("image picker failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bridge config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid bridge config: {0}")]
    Invalid(String),
}
