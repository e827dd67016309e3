use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::BridgeError;
use crate::protocol::Message;

/// Global the surface page installs to receive host messages.
pub const SURFACE_RECEIVER: &str = "window.__VAYAL_BRIDGE__";

/// One side's outgoing half of the bridge.
pub trait MessageSink {
    fn post(&self, message: &Message) -> Result<(), BridgeError>;
}

impl<T: MessageSink + ?Sized> MessageSink for &T {
    fn post(&self, message: &Message) -> Result<(), BridgeError> {
        (**self).post(message)
    }
}

impl<T: MessageSink + ?Sized> MessageSink for Rc<T> {
    fn post(&self, message: &Message) -> Result<(), BridgeError> {
        (**self).post(message)
    }
}

impl<T: MessageSink + ?Sized> MessageSink for Box<T> {
    fn post(&self, message: &Message) -> Result<(), BridgeError> {
        (**self).post(message)
    }
}

/// In-process FIFO of encoded messages. Clones share the same queue, so one
/// clone can be handed to a sender while the other is drained by the
/// receiving side.
#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    queue: Rc<RefCell<VecDeque<String>>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_raw(&self, raw: impl Into<String>) {
        self.queue.borrow_mut().push_back(raw.into());
    }

    pub fn drain_raw(&self) -> Vec<String> {
        self.queue.borrow_mut().drain(..).collect()
    }

    /// Drains and decodes everything queued so far.
    pub fn take(&self) -> Result<Vec<Message>, BridgeError> {
        self.drain_raw()
            .iter()
            .map(|raw| Message::decode(raw))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

impl MessageSink for Mailbox {
    fn post(&self, message: &Message) -> Result<(), BridgeError> {
        let raw = message.encode()?;
        tracing::trace!(target: "vayal::bridge", kind = message.kind(), "queued message");
        self.push_raw(raw);
        Ok(())
    }
}

/// Delivers messages into a surface living in a webview by evaluating a
/// call to [`SURFACE_RECEIVER`].
pub struct ScriptSink<F> {
    evaluate: F,
}

impl<F> ScriptSink<F>
where
    F: Fn(&str) -> Result<(), BridgeError>,
{
    pub fn new(evaluate: F) -> Self {
        Self { evaluate }
    }

    pub fn script_for(message: &Message) -> Result<String, BridgeError> {
        let data = message.encode()?;
        Ok(format!("{SURFACE_RECEIVER}.receive({data});"))
    }
}

impl<F> MessageSink for ScriptSink<F>
where
    F: Fn(&str) -> Result<(), BridgeError>,
{
    fn post(&self, message: &Message) -> Result<(), BridgeError> {
        let js = Self::script_for(message)?;
        (self.evaluate)(&js)
    }
}
