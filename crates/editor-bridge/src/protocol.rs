//! Wire messages exchanged between the host and the editing surface.
//!
//! Every message is one JSON object tagged by `type`:
//!
//! | direction | `type` | payload |
//! |---|---|---|
//! | surface → host | `change` | `html` |
//! | surface → host | `pick-image` | |
//! | surface → host | `ready` | |
//! | host → surface | `insert-image` | `url` |

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Message {
    /// Full serialized document after an edit. Never a diff.
    Change { html: String },
    /// The user activated the image toolbar control.
    PickImage,
    /// The surface is mounted and accepts host messages.
    Ready,
    InsertImage { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    SurfaceToHost,
    HostToSurface,
}

impl Message {
    pub fn change(html: impl Into<String>) -> Self {
        Message::Change { html: html.into() }
    }

    pub fn insert_image(url: impl Into<String>) -> Self {
        Message::InsertImage { url: url.into() }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Message::Change { .. } => "change",
            Message::PickImage => "pick-image",
            Message::Ready => "ready",
            Message::InsertImage { .. } => "insert-image",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Message::Change { .. } | Message::PickImage | Message::Ready => {
                Direction::SurfaceToHost
            }
            Message::InsertImage { .. } => Direction::HostToSurface,
        }
    }

    pub fn decode(raw: &str) -> Result<Self, BridgeError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn encode(&self) -> Result<String, BridgeError> {
        Ok(serde_json::to_string(self)?)
    }
}
