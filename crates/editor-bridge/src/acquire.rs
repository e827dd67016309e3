//! Host-side image acquisition: permission, picker, upload, then
//! `insert-image` to the surface.
//!
//! Each capability is injected so screens share one implementation and tests
//! can substitute fakes. Every failure ends in an idle state: the surface is
//! never told about it and its content is untouched.

use std::future::Future;

use crate::error::{BridgeError, PickerError};
use crate::host::EditorHost;
use crate::transport::MessageSink;
use crate::upload::UploadService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

pub trait PermissionProvider {
    fn request_media_library(&self) -> impl Future<Output = Permission>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedImage {
    /// Local file uri handed to the upload service.
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    Picked(PickedImage),
    Cancelled,
}

pub trait ImagePicker {
    fn pick_image(&self) -> impl Future<Output = Result<PickOutcome, PickerError>>;
}

/// A user-visible, transient message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    PermissionDenied { message: String },
    UploadFailed { message: String },
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::PermissionDenied { message } | Notice::UploadFailed { message } => message,
        }
    }
}

pub trait Notifier {
    fn notify(&self, notice: Notice);
    /// Toggled around the upload step only.
    fn set_busy(&self, busy: bool);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// `insert-image` went out to the surface.
    Inserted { url: String },
    /// Uploaded, waiting for the surface to report `ready`.
    Queued { url: String },
    PermissionDenied,
    Cancelled,
    PickerFailed,
    UploadFailed,
}

/// The capabilities one acquisition flow needs.
pub struct ImageAcquisition<P, K, U, N> {
    pub permissions: P,
    pub picker: K,
    pub uploader: U,
    pub notifier: N,
}

impl<P, K, U, N> ImageAcquisition<P, K, U, N>
where
    P: PermissionProvider,
    K: ImagePicker,
    U: UploadService,
    N: Notifier,
{
    pub fn new(permissions: P, picker: K, uploader: U, notifier: N) -> Self {
        Self {
            permissions,
            picker,
            uploader,
            notifier,
        }
    }

    /// Runs one flow in answer to a `pick-image` request.
    ///
    /// The host stays mutably borrowed for the whole flow, so at most one
    /// flow per host is in flight. Only transport failures are returned as
    /// errors; everything else is reported through the notifier and the
    /// returned outcome.
    pub async fn run<S: MessageSink>(
        &self,
        host: &mut EditorHost<S>,
    ) -> Result<AcquireOutcome, BridgeError> {
        if self.permissions.request_media_library().await == Permission::Denied {
            tracing::debug!(target: "vayal::upload", "media library permission denied");
            self.notifier.notify(Notice::PermissionDenied {
                message: host.config().notices.permission_denied.clone(),
            });
            return Ok(AcquireOutcome::PermissionDenied);
        }

        let picked = match self.picker.pick_image().await {
            Ok(PickOutcome::Picked(picked)) => picked,
            Ok(PickOutcome::Cancelled) => {
                tracing::debug!(target: "vayal::upload", "image pick cancelled");
                return Ok(AcquireOutcome::Cancelled);
            }
            Err(err) => {
                tracing::warn!(target: "vayal::upload", %err, "image picker failed");
                return Ok(AcquireOutcome::PickerFailed);
            }
        };

        let folder = host.config().upload_folder.clone();
        self.notifier.set_busy(true);
        let uploaded = self.uploader.upload(&picked.uri, &folder).await;
        self.notifier.set_busy(false);

        let uploaded = match uploaded {
            Ok(uploaded) => uploaded,
            Err(err) => {
                tracing::warn!(target: "vayal::upload", %err, uri = %picked.uri, "image upload failed");
                let message = err
                    .remote_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| host.config().notices.upload_failed.clone());
                self.notifier.notify(Notice::UploadFailed { message });
                return Ok(AcquireOutcome::UploadFailed);
            }
        };

        tracing::debug!(
            target: "vayal::upload",
            url = %uploaded.url,
            public_id = uploaded.public_id.as_deref().unwrap_or(""),
            "image uploaded"
        );
        let url = uploaded.url;
        if host.send_insert_image(&url)? {
            Ok(AcquireOutcome::Inserted { url })
        } else {
            Ok(AcquireOutcome::Queued { url })
        }
    }
}
