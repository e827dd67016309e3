//! Primitive document edits. Applying an op yields the op that undoes it.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{Attrs, Document, Marks, Node, Selection};
use crate::inline;

/// Child indices from the document root: `[block]` or `[block, leaf]`.
pub type Path = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    /// `offset` is a byte offset into the text leaf at `path`.
    InsertText {
        #[serde(default)]
        path: Path,
        offset: usize,
        text: String,
    },
    RemoveText {
        #[serde(default)]
        path: Path,
        range: Range<usize>,
    },
    InsertNode {
        #[serde(default)]
        path: Path,
        node: Node,
    },
    RemoveNode {
        #[serde(default)]
        path: Path,
    },
    SetNodeAttrs {
        #[serde(default)]
        path: Path,
        patch: AttrPatch,
    },
    SetTextMarks {
        #[serde(default)]
        path: Path,
        marks: Marks,
    },
}

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("empty path")]
    EmptyPath,
    #[error("no node at {path:?}")]
    NoNode { path: Path },
    #[error("node at {path:?} is not a {expected}")]
    WrongNode { path: Path, expected: &'static str },
    #[error("normalization did not converge")]
    NormalizeDidNotConverge,
}

/// Attribute changes on one element or embed: keys to set, then keys to drop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrPatch {
    #[serde(default)]
    pub set: Attrs,
    #[serde(default)]
    pub remove: Vec<String>,
}

impl AttrPatch {
    /// Applies the patch and returns the patch restoring the previous attrs.
    fn apply_to(&self, attrs: &mut Attrs) -> AttrPatch {
        let mut restore = AttrPatch::default();
        for (key, value) in &self.set {
            match attrs.insert(key.clone(), value.clone()) {
                Some(previous) => {
                    restore.set.insert(key.clone(), previous);
                }
                None => restore.remove.push(key.clone()),
            }
        }
        for key in &self.remove {
            if let Some(previous) = attrs.remove(key) {
                restore.set.insert(key.clone(), previous);
            }
        }
        restore
    }
}

impl Op {
    /// Applies the op to `doc`, carrying `selection` along, and returns its
    /// inverse.
    pub(crate) fn apply(self, doc: &mut Document, selection: &mut Selection) -> Result<Op, ApplyError> {
        match self {
            Op::InsertText { path, offset, text } => {
                let leaf = doc.text_mut(&path)?;
                let offset = inline::clamp_to_char_boundary(&leaf.text, offset);
                leaf.text.insert_str(offset, &text);
                // A point exactly at the insertion offset stays put; typing
                // moves the caret through `selection_after`.
                for point in selection.points_mut() {
                    if point.path == path && point.offset > offset {
                        point.offset += text.len();
                    }
                }
                let range = offset..offset + text.len();
                Ok(Op::RemoveText { path, range })
            }
            Op::RemoveText { path, range } => {
                let leaf = doc.text_mut(&path)?;
                let start = inline::clamp_to_char_boundary(&leaf.text, range.start);
                let end = inline::clamp_to_char_boundary(&leaf.text, range.end).max(start);
                let removed: String = leaf.text.drain(start..end).collect();
                for point in selection.points_mut() {
                    if point.path == path && point.offset > start {
                        point.offset = point.offset.saturating_sub(removed.len()).max(start);
                    }
                }
                Ok(Op::InsertText {
                    path,
                    offset: start,
                    text: removed,
                })
            }
            Op::InsertNode { path, node } => {
                let (index, parent) = split_path(&path)?;
                let siblings = doc.children_mut(parent)?;
                if index > siblings.len() {
                    return Err(ApplyError::NoNode { path });
                }
                siblings.insert(index, node);
                let depth = parent.len();
                for point in selection.points_mut() {
                    if point.path.len() > depth
                        && point.path.starts_with(parent)
                        && point.path[depth] >= index
                    {
                        point.path[depth] += 1;
                    }
                }
                Ok(Op::RemoveNode { path })
            }
            Op::RemoveNode { path } => {
                let (index, parent) = split_path(&path)?;
                let siblings = doc.children_mut(parent)?;
                if index >= siblings.len() {
                    return Err(ApplyError::NoNode { path });
                }
                let removed = siblings.remove(index);
                follow_removed_node(selection, doc, parent, index, &removed);
                Ok(Op::InsertNode {
                    path,
                    node: removed,
                })
            }
            Op::SetNodeAttrs { path, patch } => {
                let attrs = match doc.node_mut(&path)? {
                    Node::Element(el) => &mut el.attrs,
                    Node::Void(embed) => &mut embed.attrs,
                    Node::Text(_) => {
                        return Err(ApplyError::WrongNode {
                            path,
                            expected: "element or embed",
                        });
                    }
                };
                let patch = patch.apply_to(attrs);
                Ok(Op::SetNodeAttrs { path, patch })
            }
            Op::SetTextMarks { path, marks } => {
                let leaf = doc.text_mut(&path)?;
                let marks = std::mem::replace(&mut leaf.marks, marks);
                Ok(Op::SetTextMarks { path, marks })
            }
        }
    }
}

fn split_path(path: &[usize]) -> Result<(usize, &[usize]), ApplyError> {
    path.split_last()
        .map(|(&index, parent)| (index, parent))
        .ok_or(ApplyError::EmptyPath)
}

/// Moves selection points off a removed node. Points inside a text leaf whose
/// content now ends its left sibling (a leaf merge) follow the text; other
/// points land at the start of the left sibling.
fn follow_removed_node(
    selection: &mut Selection,
    doc: &Document,
    parent: &[usize],
    index: usize,
    removed: &Node,
) {
    let depth = parent.len();
    let merged_at = match (removed, index.checked_sub(1)) {
        (Node::Text(gone), Some(left)) => {
            let mut left_path = parent.to_vec();
            left_path.push(left);
            match doc.node(&left_path) {
                Some(Node::Text(kept)) if kept.marks == gone.marks && kept.text.ends_with(&gone.text) => {
                    Some((kept.text.len() - gone.text.len(), gone.text.len()))
                }
                _ => None,
            }
        }
        _ => None,
    };

    for point in selection.points_mut() {
        if point.path.len() <= depth || !point.path.starts_with(parent) {
            continue;
        }
        let ix = point.path[depth];
        if ix > index {
            point.path[depth] = ix - 1;
        } else if ix == index {
            point.path.truncate(depth + 1);
            point.path[depth] = index.saturating_sub(1);
            point.offset = match merged_at {
                Some((prefix, len)) => prefix + point.offset.min(len),
                None => 0,
            };
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionMeta {
    /// Which command produced the transaction, for logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Ops applied as one undo step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub ops: Vec<Op>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_after: Option<Selection>,
    #[serde(default)]
    pub meta: TransactionMeta,
}

impl Transaction {
    pub fn new(ops: Vec<Op>) -> Self {
        Self {
            ops,
            ..Self::default()
        }
    }

    pub fn selection_after(mut self, selection: Selection) -> Self {
        self.selection_after = Some(selection);
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.meta.source = Some(source.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
