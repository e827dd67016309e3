//! Transaction builders behind the editing commands.
//!
//! Structural edits rebuild whole top-level blocks (remove + insert), which
//! keeps the inverse ops trivial and lets the caret be placed on the rebuilt
//! content directly.

use serde_json::Value;

use crate::core::{Attrs, Document, Editor, ElementNode, Marks, Node, Point, Selection, TextNode};
use crate::inline;
use crate::ops::{Op, Transaction};

/// Content spliced into a range: `lines[0]` continues the block the range
/// starts in, every further line opens a new block.
#[derive(Debug, Clone)]
pub(crate) struct Fragment {
    lines: Vec<Vec<Node>>,
}

impl Fragment {
    pub fn empty() -> Self {
        Self {
            lines: vec![Vec::new()],
        }
    }

    pub fn inline(nodes: Vec<Node>) -> Self {
        Self { lines: vec![nodes] }
    }

    pub fn line_break() -> Self {
        Self {
            lines: vec![Vec::new(), Vec::new()],
        }
    }

    pub fn text(text: &str, marks: &Marks) -> Self {
        let lines = text
            .split('\n')
            .map(|line| {
                let line = line.strip_suffix('\r').unwrap_or(line);
                if line.is_empty() {
                    Vec::new()
                } else {
                    vec![Node::text(line, marks.clone())]
                }
            })
            .collect();
        Self { lines }
    }
}

fn element_at(doc: &Document, block_ix: usize) -> Result<&ElementNode, String> {
    match doc.children.get(block_ix) {
        Some(Node::Element(el)) => Ok(el),
        _ => Err(format!("Block {block_ix} is not a text block")),
    }
}

/// Kind and attrs of the block opened by a line break inside `el`.
fn continuation_format(el: &ElementNode, tail_is_empty: bool) -> (String, Attrs) {
    if el.kind == "heading" && tail_is_empty {
        return ("paragraph".to_string(), Attrs::default());
    }
    (el.kind.clone(), el.attrs.clone())
}

fn block_ops(first: usize, removed: usize, blocks: &[Node]) -> Vec<Op> {
    let mut ops: Vec<Op> = Vec::with_capacity(removed + blocks.len());
    for _ in 0..removed {
        ops.push(Op::RemoveNode { path: vec![first] });
    }
    for (k, block) in blocks.iter().enumerate() {
        ops.push(Op::InsertNode {
            path: vec![first + k],
            node: block.clone(),
        });
    }
    ops
}

/// Replaces the content between two caret indices with `fragment` and puts
/// the caret right after the inserted content.
pub(crate) fn replace_range(
    editor: &Editor,
    start: usize,
    end: usize,
    fragment: Fragment,
    source: &str,
) -> Result<Transaction, String> {
    let doc = editor.doc();
    if doc.children.is_empty() {
        return Err("Document has no blocks".into());
    }
    let (start, end) = (start.min(end), start.max(end));
    let (start_block, start_local) = inline::locate(doc, start);
    let (end_block, end_local) = inline::locate(doc, end);
    let start_el = element_at(doc, start_block)?;
    let end_el = element_at(doc, end_block)?;

    let head = inline::slice(&start_el.children, 0, start_local);
    let tail = inline::slice(&end_el.children, end_local, usize::MAX);
    let fallback = inline::marks_at(&start_el.children, start_local);
    let tail_is_empty = inline::inline_len(&tail) == 0;

    let last_line = fragment.lines.len().saturating_sub(1);
    let mut blocks: Vec<Node> = Vec::with_capacity(fragment.lines.len());
    let mut caret_local = 0usize;
    for (ix, line) in fragment.lines.into_iter().enumerate() {
        let mut content = if ix == 0 { head.clone() } else { Vec::new() };
        content.extend(line);
        if ix == last_line {
            caret_local = inline::inline_len(&content);
            content.extend(tail.iter().cloned());
        }
        let (kind, attrs) = if ix == 0 {
            (start_el.kind.clone(), start_el.attrs.clone())
        } else {
            continuation_format(start_el, tail_is_empty)
        };
        blocks.push(Node::Element(ElementNode {
            kind,
            attrs,
            children: inline::normalize_inline(content, &fallback),
        }));
    }

    let caret_block = start_block + last_line;
    let caret = match &blocks[last_line] {
        Node::Element(el) => inline::point_in_block(&[caret_block], &el.children, caret_local),
        _ => Point::new(vec![caret_block, 0], 0),
    };

    let ops = block_ops(start_block, end_block - start_block + 1, &blocks);
    Ok(Transaction::new(ops)
        .selection_after(Selection::collapsed(caret))
        .source(source))
}

pub(crate) fn insert_text(editor: &Editor, text: &str) -> Result<Transaction, String> {
    if text.is_empty() {
        return Ok(Transaction::new(Vec::new()));
    }
    let selection = editor.selection().clone();
    let focus = selection.focus.clone();

    if selection.is_collapsed() && !text.contains('\n') {
        if let Some(Node::Text(_)) = editor.doc().node(&focus.path) {
            let after = Point::new(focus.path.clone(), focus.offset + text.len());
            return Ok(Transaction::new(vec![Op::InsertText {
                path: focus.path,
                offset: focus.offset,
                text: text.to_string(),
            }])
            .selection_after(Selection::collapsed(after))
            .source("command:text.insert"));
        }
    }

    let marks = active_marks(editor);
    let (start, end) = editor.selection_range();
    replace_range(
        editor,
        start,
        end,
        Fragment::text(text, &marks),
        "command:text.insert",
    )
}

pub(crate) fn delete_backward(editor: &Editor) -> Result<Transaction, String> {
    let (start, end) = editor.selection_range();
    if start != end {
        return replace_range(
            editor,
            start,
            end,
            Fragment::empty(),
            "command:text.delete_backward",
        );
    }
    if start == 0 {
        return Ok(Transaction::new(Vec::new()));
    }

    let doc = editor.doc();
    let (block_ix, local) = inline::locate(doc, start);
    if local == 0 {
        let el = element_at(doc, block_ix)?;
        if el.kind != "paragraph" {
            return set_block_format(
                editor,
                "paragraph",
                &|_| Attrs::default(),
                "command:text.delete_backward:unformat",
            );
        }
        return replace_range(
            editor,
            start - 1,
            start,
            Fragment::empty(),
            "command:text.delete_backward",
        );
    }

    let focus = editor.selection().focus.clone();
    if let Some(Node::Text(t)) = doc.node(&focus.path) {
        let offset = inline::clamp_to_char_boundary(&t.text, focus.offset);
        if let Some((prev, _)) = t.text[..offset].char_indices().next_back() {
            return Ok(Transaction::new(vec![Op::RemoveText {
                path: focus.path.clone(),
                range: prev..offset,
            }])
            .selection_after(Selection::collapsed(Point::new(focus.path, prev)))
            .source("command:text.delete_backward"));
        }
    }

    replace_range(
        editor,
        start - 1,
        start,
        Fragment::empty(),
        "command:text.delete_backward",
    )
}

pub(crate) fn delete_forward(editor: &Editor) -> Result<Transaction, String> {
    let (start, end) = editor.selection_range();
    if start != end {
        return replace_range(
            editor,
            start,
            end,
            Fragment::empty(),
            "command:text.delete_forward",
        );
    }
    if start >= editor.len() {
        return Ok(Transaction::new(Vec::new()));
    }
    replace_range(
        editor,
        start,
        start + 1,
        Fragment::empty(),
        "command:text.delete_forward",
    )
}

pub(crate) fn split_block(editor: &Editor) -> Result<Transaction, String> {
    let (start, end) = editor.selection_range();
    replace_range(
        editor,
        start,
        end,
        Fragment::line_break(),
        "command:block.split",
    )
}

pub(crate) fn insert_image(
    editor: &Editor,
    src: String,
    alt: Option<String>,
    at: Option<usize>,
) -> Result<Transaction, String> {
    let index = at
        .unwrap_or_else(|| editor.selection_range().0)
        .min(editor.len());
    replace_range(
        editor,
        index,
        index,
        Fragment::inline(vec![Node::image(src, alt)]),
        "command:image.insert",
    )
}

pub(crate) fn active_marks(editor: &Editor) -> Marks {
    let focus = &editor.selection().focus;
    match editor.doc().node(&focus.path) {
        Some(Node::Text(text)) => text.marks.clone(),
        _ => Marks::default(),
    }
}

/// Whether every character between two caret indices carries a mark.
fn range_has_mark(editor: &Editor, start: usize, end: usize, get: fn(&Marks) -> bool) -> bool {
    let doc = editor.doc();
    let (start_block, start_local) = inline::locate(doc, start);
    let (end_block, end_local) = inline::locate(doc, end);

    let mut saw_text = false;
    for block_ix in start_block..=end_block {
        let Some(Node::Element(el)) = doc.children.get(block_ix) else {
            continue;
        };
        let from = if block_ix == start_block { start_local } else { 0 };
        let to = if block_ix == end_block {
            end_local
        } else {
            usize::MAX
        };
        for node in inline::slice(&el.children, from, to) {
            if let Node::Text(t) = node {
                saw_text = true;
                if !get(&t.marks) {
                    return false;
                }
            }
        }
    }
    saw_text
}

/// Restyles the text between two caret indices; a collapsed range instead
/// opens an empty leaf at the caret carrying the new marks.
pub(crate) fn restyle(
    editor: &Editor,
    apply: &dyn Fn(Marks) -> Marks,
    source: &str,
) -> Result<Transaction, String> {
    let selection = editor.selection().clone();
    if selection.is_collapsed() {
        return restyle_at_caret(editor, apply, source);
    }

    let doc = editor.doc();
    let anchor = editor.index_of(&selection.anchor);
    let focus = editor.index_of(&selection.focus);
    let (start, end) = (anchor.min(focus), anchor.max(focus));
    let (start_block, start_local) = inline::locate(doc, start);
    let (end_block, end_local) = inline::locate(doc, end);

    let mut blocks: Vec<Node> = Vec::new();
    for block_ix in start_block..=end_block {
        let el = element_at(doc, block_ix)?;
        let from = if block_ix == start_block { start_local } else { 0 };
        let to = if block_ix == end_block {
            end_local
        } else {
            usize::MAX
        };

        let mut content = inline::slice(&el.children, 0, from);
        content.extend(inline::map_marks(
            inline::slice(&el.children, from, to),
            apply,
        ));
        content.extend(inline::slice(&el.children, to, usize::MAX));

        blocks.push(Node::Element(ElementNode {
            kind: el.kind.clone(),
            attrs: el.attrs.clone(),
            children: inline::normalize_inline(content, &Marks::default()),
        }));
    }

    let mut next = doc.clone();
    for (k, block) in blocks.iter().enumerate() {
        next.children[start_block + k] = block.clone();
    }
    let selection_after = Selection {
        anchor: inline::point_at_in(&next, anchor),
        focus: inline::point_at_in(&next, focus),
    };

    let ops = block_ops(start_block, end_block - start_block + 1, &blocks);
    Ok(Transaction::new(ops)
        .selection_after(selection_after)
        .source(source))
}

fn restyle_at_caret(
    editor: &Editor,
    apply: &dyn Fn(Marks) -> Marks,
    source: &str,
) -> Result<Transaction, String> {
    let focus = editor.selection().focus.clone();
    let Some((&child_ix, block_path)) = focus.path.split_last() else {
        return Err("Selection is not in a text node".into());
    };
    let Some(Node::Text(text)) = editor.doc().node(&focus.path) else {
        return Err("Selection is not in a text node".into());
    };

    let cursor = inline::clamp_to_char_boundary(&text.text, focus.offset);
    let marks_before = text.marks.clone();
    let marks_after = apply(marks_before.clone());

    if text.text.is_empty() {
        return Ok(Transaction::new(vec![Op::SetTextMarks {
            path: focus.path.clone(),
            marks: marks_after,
        }])
        .selection_after(Selection::collapsed(Point::new(focus.path, 0)))
        .source(source));
    }

    let left = &text.text[..cursor];
    let right = &text.text[cursor..];

    let mut replacement: Vec<Node> = Vec::new();
    let mut caret_child_ix = child_ix;
    if !left.is_empty() {
        replacement.push(Node::text(left, marks_before.clone()));
        caret_child_ix += 1;
    }
    replacement.push(Node::text("", marks_after));
    if !right.is_empty() {
        replacement.push(Node::text(right, marks_before));
    }

    let mut ops: Vec<Op> = vec![Op::RemoveNode {
        path: focus.path.clone(),
    }];
    for (i, node) in replacement.into_iter().enumerate() {
        let mut path = block_path.to_vec();
        path.push(child_ix + i);
        ops.push(Op::InsertNode { path, node });
    }

    let mut caret_path = block_path.to_vec();
    caret_path.push(caret_child_ix);
    Ok(Transaction::new(ops)
        .selection_after(Selection::collapsed(Point::new(caret_path, 0)))
        .source(source))
}

pub(crate) fn toggle_bool_mark(
    editor: &Editor,
    get: fn(&Marks) -> bool,
    set: fn(&mut Marks, bool),
    source: &str,
) -> Result<Transaction, String> {
    let (start, end) = editor.selection_range();
    let target = if start == end {
        !get(&active_marks(editor))
    } else {
        !range_has_mark(editor, start, end, get)
    };
    restyle(
        editor,
        &|mut marks: Marks| {
            set(&mut marks, target);
            marks
        },
        source,
    )
}

/// Rewrites kind and attrs of every block the selection touches.
pub(crate) fn set_block_format(
    editor: &Editor,
    kind: &str,
    attrs: &dyn Fn(&ElementNode) -> Attrs,
    source: &str,
) -> Result<Transaction, String> {
    let doc = editor.doc();
    let (start, end) = editor.selection_range();
    let (start_block, _) = inline::locate(doc, start);
    let (end_block, _) = inline::locate(doc, end);

    let mut ops: Vec<Op> = Vec::new();
    for block_ix in start_block..=end_block {
        let el = element_at(doc, block_ix)?;
        let next_attrs = attrs(el);
        if el.kind == kind && el.attrs == next_attrs {
            continue;
        }
        ops.push(Op::RemoveNode {
            path: vec![block_ix],
        });
        ops.push(Op::InsertNode {
            path: vec![block_ix],
            node: Node::Element(ElementNode {
                kind: kind.to_string(),
                attrs: next_attrs,
                children: el.children.clone(),
            }),
        });
    }

    Ok(Transaction::new(ops)
        .selection_after(editor.selection().clone())
        .source(source))
}

pub(crate) fn set_heading(editor: &Editor, level: u64) -> Result<Transaction, String> {
    let level = level.clamp(1, crate::plugin::MAX_HEADING_LEVEL);
    set_block_format(
        editor,
        "heading",
        &|_| {
            let mut attrs = Attrs::default();
            attrs.insert(
                "level".to_string(),
                Value::Number(serde_json::Number::from(level)),
            );
            attrs
        },
        "command:block.set_heading",
    )
}

pub(crate) fn unset_heading(editor: &Editor) -> Result<Transaction, String> {
    let doc = editor.doc();
    let (start, end) = editor.selection_range();
    let (start_block, _) = inline::locate(doc, start);
    let (end_block, _) = inline::locate(doc, end);
    let any_heading = (start_block..=end_block)
        .any(|ix| matches!(doc.children.get(ix), Some(Node::Element(el)) if el.kind == "heading"));
    if !any_heading {
        return Ok(Transaction::new(Vec::new()));
    }
    set_block_format(
        editor,
        "paragraph",
        &|_| Attrs::default(),
        "command:block.unset_heading",
    )
}

pub(crate) fn toggle_list(editor: &Editor, list_type: &str) -> Result<Transaction, String> {
    let doc = editor.doc();
    let (start, end) = editor.selection_range();
    let (start_block, _) = inline::locate(doc, start);
    let (end_block, _) = inline::locate(doc, end);

    let all_in_list = (start_block..=end_block).all(|ix| {
        matches!(
            doc.children.get(ix),
            Some(Node::Element(el))
                if el.kind == "list_item" && el.attr_str("list_type") == Some(list_type)
        )
    });

    let source = format!("command:list.toggle_{list_type}");
    if all_in_list {
        return set_block_format(editor, "paragraph", &|_| Attrs::default(), &source);
    }
    set_block_format(
        editor,
        "list_item",
        &|_| {
            let mut attrs = Attrs::default();
            attrs.insert(
                "list_type".to_string(),
                Value::String(list_type.to_string()),
            );
            attrs
        },
        &source,
    )
}

pub(crate) fn empty_text() -> Node {
    Node::Text(TextNode {
        text: String::new(),
        marks: Marks::default(),
    })
}
