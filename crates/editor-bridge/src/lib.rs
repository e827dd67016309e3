pub mod acquire;
pub mod config;
pub mod error;
pub mod host;
pub mod page;
pub mod protocol;
pub mod surface;
pub mod transport;
pub mod upload;
#[cfg(feature = "wry")]
pub mod webview;

pub use vayal_editor_core as editor_core;

pub use crate::acquire::{
    AcquireOutcome, ImageAcquisition, ImagePicker, Notice, Notifier, Permission,
    PermissionProvider, PickOutcome, PickedImage,
};
pub use crate::config::{BridgeConfig, NoticeTexts, PageOptions};
pub use crate::error::{BridgeError, ConfigError, PickerError, UploadError};
pub use crate::host::{EditorHost, HostEvent};
pub use crate::protocol::{Direction, Message};
pub use crate::surface::{EditorSurface, ListKind, Mark};
pub use crate::transport::{Mailbox, MessageSink, ScriptSink};
pub use crate::upload::{UploadResponse, UploadService, UploadedImage, interpret_response};

pub mod async_runtime {
    use std::future::Future;

    pub fn block_on<F: Future>(future: F) -> F::Output {
        pollster::block_on(future)
    }
}
