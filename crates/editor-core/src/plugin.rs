use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::core::{Document, Editor, ElementNode, Marks, Node, Point, Selection};
use crate::edit;
use crate::ops::{AttrPatch, Op, Transaction};

pub const MAX_HEADING_LEVEL: u64 = 3;
pub const LIST_TYPES: [&str; 2] = ["bulleted", "numbered"];

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct QueryError {
    message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type CommandHandler =
    Arc<dyn Fn(&mut Editor, Option<Value>) -> Result<(), CommandError> + Send + Sync>;

pub type QueryHandler = Arc<dyn Fn(&Editor, Option<Value>) -> Result<Value, QueryError> + Send + Sync>;

#[derive(Clone)]
pub struct CommandSpec {
    pub id: String,
    pub handler: CommandHandler,
}

impl CommandSpec {
    pub fn new(
        id: impl Into<String>,
        handler: impl Fn(&mut Editor, Option<Value>) -> Result<(), CommandError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            handler: Arc::new(handler),
        }
    }

    /// Command that builds a transaction and applies it as one undo step.
    pub fn transaction(
        id: impl Into<String>,
        build: impl Fn(&Editor, Option<Value>) -> Result<Transaction, String> + Send + Sync + 'static,
    ) -> Self {
        let id = id.into();
        let failure = format!("Failed to run {id}");
        Self::new(id, move |editor, args| {
            let tx = build(editor, args).map_err(CommandError::new)?;
            editor
                .apply(tx)
                .map_err(|err| CommandError::new(format!("{failure}: {err}")))
        })
    }
}

#[derive(Clone)]
pub struct QuerySpec {
    pub id: String,
    pub handler: QueryHandler,
}

impl QuerySpec {
    pub fn new(
        id: impl Into<String>,
        handler: impl Fn(&Editor, Option<Value>) -> Result<Value, QueryError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            handler: Arc::new(handler),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    Block,
    Inline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChildConstraint {
    None,
    BlockOnly,
    InlineOnly,
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub kind: String,
    pub role: NodeRole,
    pub is_void: bool,
    pub children: ChildConstraint,
}

impl NodeSpec {
    fn text_block(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            role: NodeRole::Block,
            is_void: false,
            children: ChildConstraint::InlineOnly,
        }
    }
}

pub trait NormalizePass: Send + Sync {
    fn id(&self) -> &'static str;
    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op>;
}

pub trait TransactionTransform: Send + Sync {
    fn id(&self) -> &'static str;
    fn transform(&self, editor: &Editor, tx: &Transaction) -> Option<Transaction>;
}

pub trait EditorPlugin: Send + Sync {
    fn id(&self) -> &'static str;
    fn node_specs(&self) -> Vec<NodeSpec> {
        Vec::new()
    }
    fn transaction_transforms(&self) -> Vec<Box<dyn TransactionTransform>> {
        Vec::new()
    }
    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        Vec::new()
    }
    fn commands(&self) -> Vec<CommandSpec> {
        Vec::new()
    }
    fn queries(&self) -> Vec<QuerySpec> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate node spec kind: {0}")]
    DuplicateKind(String),
    #[error("duplicate command id: {0}")]
    DuplicateCommand(String),
    #[error("duplicate query id: {0}")]
    DuplicateQuery(String),
}

#[derive(Default)]
pub struct PluginRegistry {
    node_specs: HashMap<String, NodeSpec>,
    transaction_transforms: Vec<Box<dyn TransactionTransform>>,
    normalize_passes: Vec<Box<dyn NormalizePass>>,
    commands: HashMap<String, CommandSpec>,
    queries: HashMap<String, QuerySpec>,
}

impl PluginRegistry {
    pub fn new(
        plugins: impl IntoIterator<Item = Box<dyn EditorPlugin>>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for plugin in plugins {
            registry.register_plugin(plugin)?;
        }
        Ok(registry)
    }

    fn builtin(plugins: Vec<Box<dyn EditorPlugin>>) -> Self {
        let mut registry = Self::default();
        for plugin in plugins {
            let id = plugin.id();
            if let Err(err) = registry.register_plugin(plugin) {
                tracing::error!(target: "vayal::editor", plugin = id, %err, "builtin plugin rejected");
            }
        }
        registry
    }

    /// Paragraphs, normalization and plain-text editing.
    pub fn core() -> Self {
        Self::builtin(vec![
            Box::new(CoreParagraphPlugin),
            Box::new(CoreNormalizePlugin),
            Box::new(CoreEditingPlugin),
        ])
    }

    /// Everything the authoring toolbar offers: marks, links, headings,
    /// lists and inline images on top of [`PluginRegistry::core`].
    pub fn richtext() -> Self {
        Self::builtin(vec![
            Box::new(CoreParagraphPlugin),
            Box::new(CoreNormalizePlugin),
            Box::new(CoreEditingPlugin),
            Box::new(MarksPlugin),
            Box::new(HeadingPlugin),
            Box::new(ListPlugin),
            Box::new(ImagePlugin),
        ])
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn EditorPlugin>) -> Result<(), RegistryError> {
        for spec in plugin.node_specs() {
            insert_unique(&mut self.node_specs, spec.kind.clone(), spec, RegistryError::DuplicateKind)?;
        }
        for command in plugin.commands() {
            insert_unique(&mut self.commands, command.id.clone(), command, RegistryError::DuplicateCommand)?;
        }
        for query in plugin.queries() {
            insert_unique(&mut self.queries, query.id.clone(), query, RegistryError::DuplicateQuery)?;
        }
        self.transaction_transforms.extend(plugin.transaction_transforms());
        self.normalize_passes.extend(plugin.normalize_passes());
        tracing::trace!(target: "vayal::editor", plugin = plugin.id(), "plugin registered");
        Ok(())
    }

    pub fn node_specs(&self) -> &HashMap<String, NodeSpec> {
        &self.node_specs
    }

    pub fn transaction_transforms(&self) -> &[Box<dyn TransactionTransform>] {
        &self.transaction_transforms
    }

    pub fn normalize_passes(&self) -> &[Box<dyn NormalizePass>] {
        &self.normalize_passes
    }

    pub fn commands(&self) -> &HashMap<String, CommandSpec> {
        &self.commands
    }

    pub fn command(&self, id: &str) -> Option<CommandSpec> {
        self.commands.get(id).cloned()
    }

    pub fn queries(&self) -> &HashMap<String, QuerySpec> {
        &self.queries
    }

    pub fn query(&self, id: &str) -> Option<QuerySpec> {
        self.queries.get(id).cloned()
    }

    pub fn normalize(&self, doc: &Document) -> Vec<Op> {
        // Passes see the same snapshot, so stop at the first pass with work
        // to keep their paths valid; the editor loops to a fixed point.
        for pass in &self.normalize_passes {
            let ops = pass.run(doc, self);
            if !ops.is_empty() {
                tracing::trace!(target: "vayal::editor", pass = pass.id(), ops = ops.len(), "normalize");
                return ops;
            }
        }
        Vec::new()
    }

    /// Moves both selection points onto existing text leaves, falling back
    /// to the first text leaf of the document.
    pub fn normalize_selection(&self, doc: &Document, selection: &Selection) -> Selection {
        let anchor = resolve_point(doc, &selection.anchor)
            .or_else(|| resolve_point(doc, &selection.focus))
            .or_else(|| first_text_point(doc))
            .unwrap_or_else(|| Point::new(vec![0], 0));
        let focus = resolve_point(doc, &selection.focus).unwrap_or_else(|| anchor.clone());
        Selection { anchor, focus }
    }

}

fn insert_unique<V>(
    map: &mut HashMap<String, V>,
    key: String,
    value: V,
    duplicate: fn(String) -> RegistryError,
) -> Result<(), RegistryError> {
    match map.entry(key) {
        Entry::Occupied(entry) => Err(duplicate(entry.key().clone())),
        Entry::Vacant(entry) => {
            entry.insert(value);
            Ok(())
        }
    }
}

fn first_text_point(doc: &Document) -> Option<Point> {
    doc.children
        .iter()
        .enumerate()
        .find_map(|(block_ix, block)| match block {
            Node::Text(_) => Some(Point::new(vec![block_ix], 0)),
            Node::Element(el) => el
                .children
                .iter()
                .position(|child| matches!(child, Node::Text(_)))
                .map(|leaf_ix| Point::new(vec![block_ix, leaf_ix], 0)),
            Node::Void(_) => None,
        })
}

/// Clamps `point` onto the document: out-of-range indices snap to the last
/// block or leaf, a block path resolves to its first text leaf and a caret on
/// an embed moves to the text leaf right after it.
fn resolve_point(doc: &Document, point: &Point) -> Option<Point> {
    let (&wanted_block, rest) = point.path.split_first()?;
    let block_ix = wanted_block.min(doc.children.len().checked_sub(1)?);
    let on_text = |path: Vec<usize>, text: &str| {
        Point::new(path, crate::inline::clamp_to_char_boundary(text, point.offset))
    };

    match &doc.children[block_ix] {
        Node::Text(leaf) => Some(on_text(vec![block_ix], &leaf.text)),
        Node::Void(_) => None,
        Node::Element(el) => {
            let Some(&wanted_leaf) = rest.first() else {
                let leaf_ix = el
                    .children
                    .iter()
                    .position(|child| matches!(child, Node::Text(_)))?;
                return Some(Point::new(vec![block_ix, leaf_ix], 0));
            };
            let leaf_ix = wanted_leaf.min(el.children.len().checked_sub(1)?);
            match &el.children[leaf_ix] {
                Node::Text(leaf) => Some(on_text(vec![block_ix, leaf_ix], &leaf.text)),
                _ => match el.children.get(leaf_ix + 1) {
                    Some(Node::Text(_)) => Some(Point::new(vec![block_ix, leaf_ix + 1], 0)),
                    _ => None,
                },
            }
        }
    }
}

fn is_text_block(el: &ElementNode, registry: &PluginRegistry) -> bool {
    match registry.node_specs.get(&el.kind).map(|s| &s.children) {
        Some(ChildConstraint::InlineOnly) => true,
        Some(_) => false,
        None => true,
    }
}

struct CoreParagraphPlugin;

impl EditorPlugin for CoreParagraphPlugin {
    fn id(&self) -> &'static str {
        "core.paragraph"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::text_block("paragraph")]
    }
}

struct CoreNormalizePlugin;

impl EditorPlugin for CoreNormalizePlugin {
    fn id(&self) -> &'static str {
        "core.normalize"
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![
            Box::new(EnsureNonEmptyDocument),
            Box::new(WrapTopLevelInlines),
            Box::new(FlattenNestedElements),
            Box::new(EnsureTextBlockHasTextLeaf),
            Box::new(EnsureTextAroundInlineVoids),
            Box::new(MergeAdjacentTextLeaves),
        ]
    }
}

struct EnsureNonEmptyDocument;

impl NormalizePass for EnsureNonEmptyDocument {
    fn id(&self) -> &'static str {
        "core.ensure_non_empty_document"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        if doc.children.is_empty() {
            return vec![Op::InsertNode {
                path: vec![0],
                node: Node::paragraph(""),
            }];
        }
        Vec::new()
    }
}

/// Text or embeds at the top level get a paragraph of their own.
struct WrapTopLevelInlines;

impl NormalizePass for WrapTopLevelInlines {
    fn id(&self) -> &'static str {
        "core.wrap_top_level_inlines"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for (ix, node) in doc.children.iter().enumerate().rev() {
            if matches!(node, Node::Element(_)) {
                continue;
            }
            ops.push(Op::RemoveNode { path: vec![ix] });
            ops.push(Op::InsertNode {
                path: vec![ix],
                node: Node::Element(ElementNode {
                    kind: "paragraph".to_string(),
                    attrs: Default::default(),
                    children: vec![node.clone()],
                }),
            });
        }
        ops
    }
}

/// Text blocks hold inline content only; nested elements are unwrapped in
/// place.
struct FlattenNestedElements;

impl NormalizePass for FlattenNestedElements {
    fn id(&self) -> &'static str {
        "core.flatten_nested_elements"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        for (block_ix, node) in doc.children.iter().enumerate() {
            let Node::Element(el) = node else {
                continue;
            };
            if !is_text_block(el, registry) {
                continue;
            }
            let Some(nested_ix) = el
                .children
                .iter()
                .position(|n| matches!(n, Node::Element(_)))
            else {
                continue;
            };
            let Node::Element(nested) = &el.children[nested_ix] else {
                continue;
            };

            let mut ops = vec![Op::RemoveNode {
                path: vec![block_ix, nested_ix],
            }];
            for (k, child) in nested.children.iter().enumerate() {
                ops.push(Op::InsertNode {
                    path: vec![block_ix, nested_ix + k],
                    node: child.clone(),
                });
            }
            return ops;
        }
        Vec::new()
    }
}

struct EnsureTextBlockHasTextLeaf;

impl NormalizePass for EnsureTextBlockHasTextLeaf {
    fn id(&self) -> &'static str {
        "core.ensure_text_block_has_text_leaf"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for (ix, node) in doc.children.iter().enumerate() {
            let Node::Element(el) = node else {
                continue;
            };
            if !is_text_block(el, registry) {
                continue;
            }
            if !el.children.iter().any(|n| matches!(n, Node::Text(_))) {
                ops.push(Op::InsertNode {
                    path: vec![ix, 0],
                    node: edit::empty_text(),
                });
            }
        }
        ops
    }
}

/// Every inline embed sits between two text leaves so the caret always has a
/// text position on either side of it.
struct EnsureTextAroundInlineVoids;

impl NormalizePass for EnsureTextAroundInlineVoids {
    fn id(&self) -> &'static str {
        "core.ensure_text_around_inline_voids"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for (block_ix, node) in doc.children.iter().enumerate() {
            let Node::Element(el) = node else {
                continue;
            };
            for (ix, child) in el.children.iter().enumerate().rev() {
                if !matches!(child, Node::Void(_)) {
                    continue;
                }
                if !matches!(el.children.get(ix + 1), Some(Node::Text(_))) {
                    ops.push(Op::InsertNode {
                        path: vec![block_ix, ix + 1],
                        node: edit::empty_text(),
                    });
                }
                let has_text_before = ix > 0 && matches!(el.children[ix - 1], Node::Text(_));
                if !has_text_before {
                    ops.push(Op::InsertNode {
                        path: vec![block_ix, ix],
                        node: edit::empty_text(),
                    });
                }
            }
        }
        ops
    }
}

struct MergeAdjacentTextLeaves;

impl NormalizePass for MergeAdjacentTextLeaves {
    fn id(&self) -> &'static str {
        "core.merge_adjacent_text_leaves"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        // One pair per block and round: merging a single pair keeps the
        // selection mapping of the removed leaf exact.
        let mut ops = Vec::new();
        for (block_ix, node) in doc.children.iter().enumerate() {
            let Node::Element(el) = node else {
                continue;
            };
            let pair = el.children.windows(2).rposition(|pair| match pair {
                [Node::Text(left), Node::Text(right)] => left.marks == right.marks,
                _ => false,
            });
            let Some(left_ix) = pair else {
                continue;
            };
            let (Node::Text(left), Node::Text(right)) =
                (&el.children[left_ix], &el.children[left_ix + 1])
            else {
                continue;
            };
            if !right.text.is_empty() {
                ops.push(Op::InsertText {
                    path: vec![block_ix, left_ix],
                    offset: left.text.len(),
                    text: right.text.clone(),
                });
            }
            ops.push(Op::RemoveNode {
                path: vec![block_ix, left_ix + 1],
            });
        }
        ops
    }
}

struct CoreEditingPlugin;

impl EditorPlugin for CoreEditingPlugin {
    fn id(&self) -> &'static str {
        "core.editing"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::transaction("text.insert", |editor, args| {
                let text = args
                    .as_ref()
                    .and_then(|v| v.get("text"))
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| "Missing args.text".to_string())?;
                edit::insert_text(editor, text)
            }),
            CommandSpec::transaction("text.delete_backward", |editor, _args| {
                edit::delete_backward(editor)
            }),
            CommandSpec::transaction("text.delete_forward", |editor, _args| {
                edit::delete_forward(editor)
            }),
            CommandSpec::transaction("block.split", |editor, _args| edit::split_block(editor)),
        ]
    }
}

struct MarksPlugin;

impl MarksPlugin {
    fn toggle(id: &'static str, get: fn(&Marks) -> bool, set: fn(&mut Marks, bool)) -> CommandSpec {
        let source = format!("command:{id}");
        CommandSpec::transaction(id, move |editor, _args| {
            edit::toggle_bool_mark(editor, get, set, &source)
        })
    }
}

impl EditorPlugin for MarksPlugin {
    fn id(&self) -> &'static str {
        "marks"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            Self::toggle("marks.toggle_bold", |m| m.bold, |m, v| m.bold = v),
            Self::toggle("marks.toggle_italic", |m| m.italic, |m, v| m.italic = v),
            Self::toggle("marks.toggle_underline", |m| m.underline, |m, v| {
                m.underline = v
            }),
            Self::toggle(
                "marks.toggle_strikethrough",
                |m| m.strikethrough,
                |m, v| m.strikethrough = v,
            ),
            CommandSpec::transaction("marks.set_link", |editor, args| {
                let url = args
                    .as_ref()
                    .and_then(|v| v.get("url"))
                    .and_then(|v| v.as_str())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| "Missing args.url".to_string())?
                    .to_string();
                edit::restyle(
                    editor,
                    &|mut marks: Marks| {
                        marks.link = Some(url.clone());
                        marks
                    },
                    "command:marks.set_link",
                )
            }),
            CommandSpec::transaction("marks.unset_link", |editor, _args| {
                edit::restyle(
                    editor,
                    &|mut marks: Marks| {
                        marks.link = None;
                        marks
                    },
                    "command:marks.unset_link",
                )
            }),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("marks.get_active", |editor, _args| {
            serde_json::to_value(edit::active_marks(editor))
                .map_err(|err| QueryError::new(format!("Failed to encode marks: {err}")))
        })]
    }
}

struct HeadingPlugin;

impl EditorPlugin for HeadingPlugin {
    fn id(&self) -> &'static str {
        "heading"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::text_block("heading")]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeHeadingLevels)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::transaction("block.set_heading", |editor, args| {
                let level = args
                    .as_ref()
                    .and_then(|v| v.get("level"))
                    .and_then(|v| v.as_u64())
                    .ok_or_else(|| "Missing args.level".to_string())?;
                edit::set_heading(editor, level)
            }),
            CommandSpec::transaction("block.unset_heading", |editor, _args| {
                edit::unset_heading(editor)
            }),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("block.active_kind", |editor, _args| {
            let (start, _) = editor.selection_range();
            let (block_ix, _) = crate::inline::locate(editor.doc(), start);
            let Some(Node::Element(el)) = editor.doc().children.get(block_ix) else {
                return Ok(Value::Null);
            };
            Ok(serde_json::json!({ "kind": el.kind, "attrs": el.attrs }))
        })]
    }
}

struct NormalizeHeadingLevels;

impl NormalizePass for NormalizeHeadingLevels {
    fn id(&self) -> &'static str {
        "heading.normalize_levels"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for (ix, node) in doc.children.iter().enumerate() {
            let Node::Element(el) = node else {
                continue;
            };
            if el.kind != "heading" {
                continue;
            }
            let current = el.attrs.get("level").and_then(|v| v.as_u64());
            let wanted = current.unwrap_or(1).clamp(1, MAX_HEADING_LEVEL);
            if current == Some(wanted) {
                continue;
            }
            let mut patch = AttrPatch::default();
            patch.set.insert(
                "level".to_string(),
                Value::Number(serde_json::Number::from(wanted)),
            );
            ops.push(Op::SetNodeAttrs {
                path: vec![ix],
                patch,
            });
        }
        ops
    }
}

struct ListPlugin;

impl EditorPlugin for ListPlugin {
    fn id(&self) -> &'static str {
        "list"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::text_block("list_item")]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeListType)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        LIST_TYPES
            .iter()
            .map(|&list_type| {
                CommandSpec::transaction(
                    format!("list.toggle_{list_type}"),
                    move |editor, _args| edit::toggle_list(editor, list_type),
                )
            })
            .collect()
    }
}

struct NormalizeListType;

impl NormalizePass for NormalizeListType {
    fn id(&self) -> &'static str {
        "list.normalize_type"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for (ix, node) in doc.children.iter().enumerate() {
            let Node::Element(el) = node else {
                continue;
            };
            if el.kind != "list_item" {
                continue;
            }
            if el
                .attr_str("list_type")
                .is_some_and(|t| LIST_TYPES.contains(&t))
            {
                continue;
            }
            let mut patch = AttrPatch::default();
            patch.set.insert(
                "list_type".to_string(),
                Value::String(LIST_TYPES[0].to_string()),
            );
            ops.push(Op::SetNodeAttrs {
                path: vec![ix],
                patch,
            });
        }
        ops
    }
}

struct ImagePlugin;

impl EditorPlugin for ImagePlugin {
    fn id(&self) -> &'static str {
        "image"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec {
            kind: "image".to_string(),
            role: NodeRole::Inline,
            is_void: true,
            children: ChildConstraint::None,
        }]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::transaction("image.insert", |editor, args| {
                let src = args
                    .as_ref()
                    .and_then(|v| v.get("src"))
                    .and_then(|v| v.as_str())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| "Missing args.src".to_string())?
                    .to_string();
                let alt = args
                    .as_ref()
                    .and_then(|v| v.get("alt"))
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string());
                let at = args
                    .as_ref()
                    .and_then(|v| v.get("index"))
                    .and_then(|v| v.as_u64())
                    .map(|ix| usize::try_from(ix).unwrap_or(usize::MAX));

                edit::insert_image(editor, src, alt, at)
            }),
        ]
    }
}
