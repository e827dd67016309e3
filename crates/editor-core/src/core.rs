use std::collections::{BTreeMap, HashMap};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::inline;
use crate::ops::{ApplyError, Op, Path, Transaction};
use crate::plugin::{CommandError, CommandSpec, PluginRegistry, QueryError};

pub type Attrs = BTreeMap<String, serde_json::Value>;
pub type ElementKind = String;

/// The editable tree behind one serialized markup field.
///
/// Top-level children are text blocks (`paragraph`, `heading`, `list_item`);
/// their children are text leaves and inline void embeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Document {
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Document {
    pub fn blank() -> Self {
        Self {
            children: vec![Node::paragraph("")],
        }
    }

    /// True when the document holds nothing but empty text blocks.
    pub fn is_blank(&self) -> bool {
        self.children.iter().all(|node| match node {
            Node::Element(el) => el.children.iter().all(|child| match child {
                Node::Text(t) => t.text.is_empty(),
                _ => false,
            }),
            _ => false,
        })
    }

    pub fn node(&self, path: &[usize]) -> Option<&Node> {
        let (&first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.children.get(first)?, |node, &ix| match node {
                Node::Element(el) => el.children.get(ix),
                Node::Text(_) | Node::Void(_) => None,
            })
    }

    pub(crate) fn node_mut(&mut self, path: &[usize]) -> Result<&mut Node, ApplyError> {
        let (&first, rest) = path.split_first().ok_or(ApplyError::EmptyPath)?;
        let missing = || ApplyError::NoNode {
            path: path.to_vec(),
        };
        let mut node = self.children.get_mut(first).ok_or_else(missing)?;
        for &ix in rest {
            node = match node {
                Node::Element(el) => el.children.get_mut(ix).ok_or_else(missing)?,
                Node::Text(_) | Node::Void(_) => return Err(missing()),
            };
        }
        Ok(node)
    }

    pub(crate) fn text_mut(&mut self, path: &[usize]) -> Result<&mut TextNode, ApplyError> {
        match self.node_mut(path)? {
            Node::Text(leaf) => Ok(leaf),
            _ => Err(ApplyError::WrongNode {
                path: path.to_vec(),
                expected: "text leaf",
            }),
        }
    }

    /// Children of the element at `parent`; the root's blocks for `[]`.
    pub(crate) fn children_mut(&mut self, parent: &[usize]) -> Result<&mut Vec<Node>, ApplyError> {
        if parent.is_empty() {
            return Ok(&mut self.children);
        }
        match self.node_mut(parent)? {
            Node::Element(el) => Ok(&mut el.children),
            _ => Err(ApplyError::WrongNode {
                path: parent.to_vec(),
                expected: "container",
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
    Void(VoidNode),
}

impl Node {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::block("paragraph", Attrs::default(), text)
    }

    pub fn heading(level: u64, text: impl Into<String>) -> Self {
        let mut attrs = Attrs::default();
        attrs.insert(
            "level".to_string(),
            Value::Number(serde_json::Number::from(level)),
        );
        Self::block("heading", attrs, text)
    }

    pub fn list_item(list_type: &str, text: impl Into<String>) -> Self {
        let mut attrs = Attrs::default();
        attrs.insert(
            "list_type".to_string(),
            Value::String(list_type.to_string()),
        );
        Self::block("list_item", attrs, text)
    }

    pub fn text(text: impl Into<String>, marks: Marks) -> Self {
        Node::Text(TextNode {
            text: text.into(),
            marks,
        })
    }

    pub fn image(src: impl Into<String>, alt: Option<String>) -> Self {
        let mut attrs = Attrs::default();
        attrs.insert("src".to_string(), Value::String(src.into()));
        if let Some(alt) = alt {
            attrs.insert("alt".to_string(), Value::String(alt));
        }
        Node::Void(VoidNode {
            kind: "image".to_string(),
            attrs,
        })
    }

    fn block(kind: &str, attrs: Attrs, text: impl Into<String>) -> Self {
        Node::Element(ElementNode {
            kind: kind.to_string(),
            attrs,
            children: vec![Node::Text(TextNode {
                text: text.into(),
                marks: Marks::default(),
            })],
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub kind: ElementKind,
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl ElementNode {
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(|v| v.as_str())
    }
}

/// An inline embed. Every embed occupies exactly one caret position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidNode {
    pub kind: ElementKind,
    #[serde(default)]
    pub attrs: Attrs,
}

impl VoidNode {
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(default)]
    pub marks: Marks,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Marks {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub path: Path,
    /// Byte offset into the text leaf at `path`.
    pub offset: usize,
}

impl Point {
    pub fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub(crate) fn points_mut(&mut self) -> [&mut Point; 2] {
        [&mut self.anchor, &mut self.focus]
    }
}

/// One step of history: the ops that revert it and the selections on either
/// side of it.
#[derive(Debug, Clone)]
struct HistoryEntry {
    ops: Vec<Op>,
    before: Selection,
    after: Selection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Undo steps kept; older steps are dropped first.
    #[serde(default)]
    pub max_undo: usize,
    #[serde(default)]
    pub max_normalize_iterations: usize,
}

impl EditorConfig {
    /// Fills zero-valued fields with the built-in limits.
    pub fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = 200;
        }
        if self.max_normalize_iterations == 0 {
            self.max_normalize_iterations = 100;
        }
        self
    }
}

/// An editing session over one document: tree, selection and history.
pub struct Editor {
    doc: Document,
    selection: Selection,
    registry: PluginRegistry,
    config: EditorConfig,
    history: Vec<HistoryEntry>,
    future: Vec<HistoryEntry>,
    revision: u64,
}

impl Editor {
    pub fn new(doc: Document, selection: Selection, registry: PluginRegistry) -> Self {
        Self::with_config(doc, selection, registry, EditorConfig::default())
    }

    pub fn with_config(
        doc: Document,
        selection: Selection,
        registry: PluginRegistry,
        config: EditorConfig,
    ) -> Self {
        let mut editor = Self {
            doc,
            selection,
            registry,
            config: config.with_defaults(),
            history: Vec::new(),
            future: Vec::new(),
            revision: 0,
        };
        editor.normalize_in_place();
        editor
    }

    /// Opens `doc` with the caret at the start of the first text leaf.
    pub fn from_document(doc: Document, registry: PluginRegistry) -> Self {
        let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
        Self::new(doc, selection, registry)
    }

    pub fn with_richtext_plugins() -> Self {
        Self::from_document(Document::blank(), PluginRegistry::richtext())
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
        self.normalize_selection_in_place();
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Bumped by every transaction, undo or redo that changed the document.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of caret positions: one per character, one per embed and one
    /// per boundary between blocks. The caret ranges over `0..=len()`.
    pub fn len(&self) -> usize {
        inline::doc_len(&self.doc)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index_of(&self, point: &Point) -> usize {
        inline::index_of_in(&self.doc, point)
    }

    pub fn point_at(&self, index: usize) -> Point {
        inline::point_at_in(&self.doc, index)
    }

    /// The selection as an ordered `(start, end)` pair of caret indices.
    pub fn selection_range(&self) -> (usize, usize) {
        let anchor = self.index_of(&self.selection.anchor);
        let focus = self.index_of(&self.selection.focus);
        (anchor.min(focus), anchor.max(focus))
    }

    pub fn caret_index(&self) -> usize {
        self.index_of(&self.selection.focus)
    }

    pub fn set_caret(&mut self, index: usize) {
        let point = self.point_at(index);
        self.set_selection(Selection::collapsed(point));
    }

    pub fn select_range(&mut self, anchor: usize, focus: usize) {
        let selection = Selection {
            anchor: self.point_at(anchor),
            focus: self.point_at(focus),
        };
        self.set_selection(selection);
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Reverts the last step. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.history.pop() else {
            return false;
        };
        let selection = entry.before.clone();
        let redo = self.replay(entry, selection, "undo");
        self.future.push(redo);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.future.pop() else {
            return false;
        };
        let selection = entry.after.clone();
        let undo = self.replay(entry, selection, "redo");
        self.history.push(undo);
        true
    }

    /// Applies the ops of a history entry, restores `selection` and returns
    /// the entry that reverts the replay.
    fn replay(&mut self, entry: HistoryEntry, selection: Selection, step: &str) -> HistoryEntry {
        let mut reverse = Vec::with_capacity(entry.ops.len());
        for op in entry.ops {
            match op.apply(&mut self.doc, &mut self.selection) {
                Ok(inverse) => reverse.push(inverse),
                Err(err) => {
                    tracing::warn!(target: "vayal::editor", %err, step, "history replay stopped early");
                    break;
                }
            }
        }
        reverse.reverse();

        self.selection = selection;
        self.normalize_in_place();
        self.revision += 1;

        HistoryEntry {
            ops: reverse,
            before: entry.before,
            after: entry.after,
        }
    }

    /// Applies `tx` as one undoable step. A transaction without ops only moves
    /// the selection and leaves history and revision untouched.
    pub fn apply(&mut self, tx: Transaction) -> Result<(), ApplyError> {
        let tx = self.transform_transaction(tx);
        if tx.is_empty() {
            if let Some(selection) = tx.selection_after {
                self.set_selection(selection);
            }
            return Ok(());
        }

        let before = self.selection.clone();
        let op_count = tx.ops.len();
        let mut reverse = Vec::with_capacity(op_count);
        for op in tx.ops {
            reverse.push(op.apply(&mut self.doc, &mut self.selection)?);
        }
        if let Some(selection) = tx.selection_after {
            self.selection = selection;
        }
        reverse.extend(self.normalize_with_inverse_ops()?);
        reverse.reverse();
        self.normalize_selection_in_place();

        self.history.push(HistoryEntry {
            ops: reverse,
            before,
            after: self.selection.clone(),
        });
        if self.history.len() > self.config.max_undo {
            self.history.remove(0);
        }
        self.future.clear();
        self.revision += 1;

        tracing::trace!(
            target: "vayal::editor",
            source = tx.meta.source.as_deref().unwrap_or("unknown"),
            ops = op_count,
            revision = self.revision,
            "applied transaction"
        );
        Ok(())
    }

    fn transform_transaction(&self, tx: Transaction) -> Transaction {
        self.registry
            .transaction_transforms()
            .iter()
            .fold(tx, |tx, transform| transform.transform(self, &tx).unwrap_or(tx))
    }

    pub fn run_command(&mut self, id: &str, args: Option<Value>) -> Result<(), CommandError> {
        let command = self
            .registry
            .command(id)
            .ok_or_else(|| CommandError::new(format!("Unknown command: {id}")))?;
        (command.handler)(self, args)
    }

    pub fn run_query_json(&self, id: &str, args: Option<Value>) -> Result<Value, QueryError> {
        let query = self
            .registry
            .query(id)
            .ok_or_else(|| QueryError::new(format!("Unknown query: {id}")))?;
        (query.handler)(self, args)
    }

    pub fn run_query<T: DeserializeOwned>(&self, id: &str, args: Option<Value>) -> Result<T, QueryError> {
        let value = self.run_query_json(id, args)?;
        serde_json::from_value(value)
            .map_err(|err| QueryError::new(format!("Failed to decode query result: {err}")))
    }

    pub fn core_commands(&self) -> &HashMap<String, CommandSpec> {
        self.registry.commands()
    }

    fn normalize_in_place(&mut self) {
        if let Err(err) = self.normalize_with_inverse_ops() {
            tracing::warn!(target: "vayal::editor", %err, "document left partially normalized");
        }
        self.normalize_selection_in_place();
    }

    fn normalize_selection_in_place(&mut self) {
        self.selection = self.registry.normalize_selection(&self.doc, &self.selection);
    }

    /// Runs normalization passes until none has work, returning the inverse
    /// of every op they applied.
    fn normalize_with_inverse_ops(&mut self) -> Result<Vec<Op>, ApplyError> {
        let mut reverse = Vec::new();
        for _ in 0..self.config.max_normalize_iterations {
            let ops = self.registry.normalize(&self.doc);
            if ops.is_empty() {
                return Ok(reverse);
            }
            for op in ops {
                reverse.push(op.apply(&mut self.doc, &mut self.selection)?);
            }
        }
        Err(ApplyError::NormalizeDidNotConverge)
    }
}
