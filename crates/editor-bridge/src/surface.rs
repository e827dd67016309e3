use std::ops::Range;

use vayal_editor_core::{Document, Editor, EditorConfig, PluginRegistry, Point, Selection, html, inline};

use crate::error::BridgeError;
use crate::protocol::Message;
use crate::transport::MessageSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

impl Mark {
    fn command_id(self) -> &'static str {
        match self {
            Mark::Bold => "marks.toggle_bold",
            Mark::Italic => "marks.toggle_italic",
            Mark::Underline => "marks.toggle_underline",
            Mark::Strikethrough => "marks.toggle_strikethrough",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bulleted,
    Numbered,
}

impl ListKind {
    fn command_id(self) -> &'static str {
        match self {
            ListKind::Bulleted => "list.toggle_bulleted",
            ListKind::Numbered => "list.toggle_numbered",
        }
    }
}

/// The editing side of the bridge: owns the editor session for one mounted
/// surface and reports every document change to the host.
///
/// The surface has no caret until the user places one; without a caret,
/// images go to the end of the document and typing starts there.
pub struct EditorSurface<S> {
    sink: S,
    config: EditorConfig,
    editor: Editor,
    focused: bool,
    /// Caret at the last `request_image_insertion`, moved along by edits
    /// made while the image is on its way.
    request_caret: Option<usize>,
}

impl<S: MessageSink> EditorSurface<S> {
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, EditorConfig::default())
    }

    pub fn with_config(sink: S, config: EditorConfig) -> Self {
        let editor = Self::open(html::parse(""), &config);
        Self {
            sink,
            config,
            editor,
            focused: false,
            request_caret: None,
        }
    }

    fn open(doc: Document, config: &EditorConfig) -> Editor {
        Editor::with_config(
            doc,
            Selection::collapsed(Point::new(vec![0, 0], 0)),
            PluginRegistry::richtext(),
            config.clone(),
        )
    }

    /// Seeds the surface with stored markup and announces `ready`.
    ///
    /// Replaces the whole session: history, caret and any pending image
    /// request are dropped. Malformed markup degrades to text.
    pub fn initialize(&mut self, markup: &str) -> Result<(), BridgeError> {
        self.editor = Self::open(html::parse(markup), &self.config);
        self.focused = false;
        self.request_caret = None;
        tracing::debug!(target: "vayal::bridge", len = self.editor.len(), "surface initialized");
        self.sink.post(&Message::Ready)
    }

    /// Handles one raw message from the host.
    pub fn receive(&mut self, raw: &str) -> Result<(), BridgeError> {
        let message = Message::decode(raw).inspect_err(|err| {
            tracing::warn!(target: "vayal::bridge", %err, "dropping malformed host message");
        })?;
        match message {
            Message::InsertImage { url } => self.insert_image_at_cursor(&url),
            other => Err(BridgeError::UnexpectedMessage {
                kind: other.kind(),
                receiver: "surface",
            }),
        }
    }

    /// The user activated the image control. Remembers where the caret was
    /// so the image lands there even if the caret moves meanwhile.
    pub fn request_image_insertion(&mut self) -> Result<(), BridgeError> {
        self.request_caret = self.caret();
        tracing::debug!(target: "vayal::bridge", caret = ?self.request_caret, "image requested");
        self.sink.post(&Message::PickImage)
    }

    /// Inserts an image embed at the caret remembered by the last request,
    /// else at the live caret, else at the end of the document, and moves
    /// the caret past it. A rejected insert keeps the remembered caret.
    pub fn insert_image_at_cursor(&mut self, url: &str) -> Result<(), BridgeError> {
        let index = self
            .request_caret
            .or_else(|| self.caret())
            .unwrap_or_else(|| self.editor.len())
            .min(self.editor.len());

        let changed = self.run(
            "image.insert",
            Some(serde_json::json!({ "src": url, "index": index })),
        )?;
        self.request_caret = None;
        self.focused = true;
        if changed {
            tracing::debug!(target: "vayal::bridge", index, "image inserted");
        }
        Ok(())
    }

    pub fn set_caret(&mut self, index: usize) {
        self.editor.set_caret(index.min(self.editor.len()));
        self.focused = true;
    }

    /// The surface lost focus; it no longer has a caret.
    pub fn clear_caret(&mut self) {
        self.focused = false;
    }

    pub fn select(&mut self, range: Range<usize>) {
        let len = self.editor.len();
        self.editor
            .select_range(range.start.min(len), range.end.min(len));
        self.focused = true;
    }

    pub fn caret(&self) -> Option<usize> {
        self.focused.then(|| self.editor.caret_index())
    }

    pub fn len(&self) -> usize {
        self.editor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.editor.is_empty()
    }

    /// Current document serialized as markup.
    pub fn content(&self) -> String {
        html::serialize(self.editor.doc())
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn type_text(&mut self, text: &str) -> Result<bool, BridgeError> {
        self.run("text.insert", Some(serde_json::json!({ "text": text })))
    }

    pub fn delete_backward(&mut self) -> Result<bool, BridgeError> {
        self.run("text.delete_backward", None)
    }

    pub fn delete_forward(&mut self) -> Result<bool, BridgeError> {
        self.run("text.delete_forward", None)
    }

    pub fn split_block(&mut self) -> Result<bool, BridgeError> {
        self.run("block.split", None)
    }

    pub fn toggle_mark(&mut self, mark: Mark) -> Result<bool, BridgeError> {
        self.run(mark.command_id(), None)
    }

    pub fn set_link(&mut self, url: &str) -> Result<bool, BridgeError> {
        self.run("marks.set_link", Some(serde_json::json!({ "url": url })))
    }

    pub fn unset_link(&mut self) -> Result<bool, BridgeError> {
        self.run("marks.unset_link", None)
    }

    pub fn set_heading(&mut self, level: u64) -> Result<bool, BridgeError> {
        self.run("block.set_heading", Some(serde_json::json!({ "level": level })))
    }

    pub fn unset_heading(&mut self) -> Result<bool, BridgeError> {
        self.run("block.unset_heading", None)
    }

    pub fn toggle_list(&mut self, kind: ListKind) -> Result<bool, BridgeError> {
        self.run(kind.command_id(), None)
    }

    pub fn undo(&mut self) -> Result<bool, BridgeError> {
        self.edit(|editor| Ok(editor.undo()))
    }

    pub fn redo(&mut self) -> Result<bool, BridgeError> {
        self.edit(|editor| Ok(editor.redo()))
    }

    /// Runs an editor command and reports the document if it changed.
    /// Edits without a caret start at the end of the document.
    fn run(&mut self, id: &str, args: Option<serde_json::Value>) -> Result<bool, BridgeError> {
        if !self.focused {
            self.set_caret(self.editor.len());
        }
        self.edit(|editor| {
            let revision = editor.revision();
            editor.run_command(id, args).inspect_err(|err| {
                tracing::warn!(target: "vayal::bridge", command = id, %err, "edit rejected");
            })?;
            Ok(editor.revision() != revision)
        })
    }

    fn edit(
        &mut self,
        apply: impl FnOnce(&mut Editor) -> Result<bool, BridgeError>,
    ) -> Result<bool, BridgeError> {
        let before = self.request_caret.is_some().then(|| self.editor.doc().clone());
        let changed = apply(&mut self.editor)?;
        if !changed {
            return Ok(false);
        }
        if let (Some(before), Some(caret)) = (before, self.request_caret) {
            let (span, inserted) = inline::changed_span(&before, self.editor.doc());
            let moved = inline::follow_edit(caret, &span, inserted);
            if moved != caret {
                tracing::trace!(target: "vayal::bridge", from = caret, to = moved, "pending image moved");
            }
            self.request_caret = Some(moved);
        }
        self.sink.post(&Message::change(self.content()))?;
        Ok(true)
    }
}
