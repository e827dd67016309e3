use std::collections::VecDeque;

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::protocol::{Direction, Message};
use crate::transport::MessageSink;

/// What a surface message asked of the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The draft was replaced and the change handler ran.
    Changed,
    /// The surface mounted; `flushed` queued images were delivered.
    Ready { flushed: usize },
    /// The user wants an image; start an acquisition flow.
    PickImage,
    /// Sent by a surface that has not reported `ready` for the current
    /// document, e.g. one unmounted by `reset_document`. Dropped.
    Stale,
}

type ChangeHandler = Box<dyn FnMut(&str)>;

/// The application side of the bridge.
///
/// Holds the draft (the last document the surface reported), queues
/// `insert-image` messages until the surface is ready, and keys surface
/// remounts on an explicit document version.
pub struct EditorHost<S> {
    sink: S,
    config: BridgeConfig,
    draft: String,
    document_version: u64,
    ready: bool,
    outbox: VecDeque<Message>,
    on_change: Option<ChangeHandler>,
}

impl<S: MessageSink> EditorHost<S> {
    pub fn new(sink: S, config: BridgeConfig, document: impl Into<String>) -> Self {
        Self {
            sink,
            config,
            draft: document.into(),
            document_version: 0,
            ready: false,
            outbox: VecDeque::new(),
            on_change: None,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Registers the change handler. Only one handler may be registered for
    /// the lifetime of the host.
    pub fn on_change(&mut self, handler: impl FnMut(&str) + 'static) -> Result<(), BridgeError> {
        if self.on_change.is_some() {
            return Err(BridgeError::HandlerAlreadyRegistered);
        }
        self.on_change = Some(Box::new(handler));
        Ok(())
    }

    /// Latest document content: the last `change` payload, or the document
    /// the current version was mounted with.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Identity of the mounted surface. A surface is remounted only when
    /// this value changes.
    pub fn document_version(&self) -> u64 {
        self.document_version
    }

    pub fn needs_remount(&self, mounted_version: u64) -> bool {
        mounted_version != self.document_version
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn queued(&self) -> usize {
        self.outbox.len()
    }

    /// Replaces the document wholesale, e.g. after loading another record.
    /// The surface must be remounted and report `ready` again; images queued
    /// for the previous document are discarded.
    pub fn reset_document(&mut self, document: impl Into<String>) {
        self.draft = document.into();
        self.document_version += 1;
        self.ready = false;
        if !self.outbox.is_empty() {
            tracing::warn!(
                target: "vayal::bridge",
                dropped = self.outbox.len(),
                "discarding queued images for replaced document"
            );
            self.outbox.clear();
        }
        tracing::debug!(target: "vayal::bridge", version = self.document_version, "document reset");
    }

    /// Handles one raw message from the surface.
    pub fn receive(&mut self, raw: &str) -> Result<HostEvent, BridgeError> {
        let message = Message::decode(raw).inspect_err(|err| {
            tracing::warn!(target: "vayal::bridge", %err, "dropping malformed surface message");
        })?;
        if message.direction() != Direction::SurfaceToHost {
            return Err(BridgeError::UnexpectedMessage {
                kind: message.kind(),
                receiver: "host",
            });
        }

        if !self.ready && message != Message::Ready {
            tracing::debug!(
                target: "vayal::bridge",
                kind = message.kind(),
                version = self.document_version,
                "dropping message from a surface that is not ready"
            );
            return Ok(HostEvent::Stale);
        }

        match message {
            Message::Change { html } => {
                self.draft = html;
                if let Some(handler) = self.on_change.as_mut() {
                    handler(&self.draft);
                }
                Ok(HostEvent::Changed)
            }
            Message::Ready => {
                self.ready = true;
                let flushed = self.flush()?;
                tracing::debug!(target: "vayal::bridge", flushed, "surface ready");
                Ok(HostEvent::Ready { flushed })
            }
            Message::PickImage => Ok(HostEvent::PickImage),
            Message::InsertImage { .. } => Err(BridgeError::UnexpectedMessage {
                kind: "insert-image",
                receiver: "host",
            }),
        }
    }

    /// Sends an uploaded image to the surface, or queues it until the
    /// surface is ready. Returns whether it was delivered right away.
    ///
    /// Images left queued by a failed flush go out first.
    pub fn send_insert_image(&mut self, url: &str) -> Result<bool, BridgeError> {
        let message = Message::insert_image(url);
        let deliverable = self.ready || !self.config.queue_until_ready;
        if deliverable && self.outbox.is_empty() {
            self.sink.post(&message)?;
            return Ok(true);
        }

        if self.outbox.len() >= self.config.queue_capacity.max(1) {
            tracing::warn!(
                target: "vayal::bridge",
                capacity = self.config.queue_capacity,
                "insert queue full, dropping oldest image"
            );
            self.outbox.pop_front();
        }
        self.outbox.push_back(message);
        if deliverable {
            let flushed = self.flush()?;
            tracing::debug!(target: "vayal::bridge", flushed, "delivered queued images");
            return Ok(true);
        }
        Ok(false)
    }

    fn flush(&mut self) -> Result<usize, BridgeError> {
        let mut flushed = 0;
        while let Some(message) = self.outbox.pop_front() {
            if let Err(err) = self.sink.post(&message) {
                self.outbox.push_front(message);
                return Err(err);
            }
            flushed += 1;
        }
        Ok(flushed)
    }
}
