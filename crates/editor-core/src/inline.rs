//! Caret indexing and inline content helpers.
//!
//! The caret index space is linear over the whole document: every character
//! of text counts one (Unicode scalar values, so Tamil and English text are
//! measured alike), every inline embed counts one, and every boundary between
//! two blocks counts one. `Point` offsets stay byte offsets into text leaves.

use std::ops::Range;

use crate::core::{Document, Marks, Node, Point, TextNode};

pub fn clamp_to_char_boundary(s: &str, ix: usize) -> usize {
    let mut ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}

/// Byte offset of the `chars`-th character of `s`, or `s.len()` past the end.
pub fn char_to_byte(s: &str, chars: usize) -> usize {
    s.char_indices()
        .nth(chars)
        .map(|(ix, _)| ix)
        .unwrap_or(s.len())
}

pub fn byte_to_char(s: &str, byte: usize) -> usize {
    s[..clamp_to_char_boundary(s, byte)].chars().count()
}

fn node_len(node: &Node) -> usize {
    match node {
        Node::Text(t) => t.text.chars().count(),
        Node::Void(_) => 1,
        Node::Element(_) => 0,
    }
}

pub fn inline_len(children: &[Node]) -> usize {
    children.iter().map(node_len).sum()
}

fn block_len(block: &Node) -> usize {
    match block {
        Node::Element(el) => inline_len(&el.children),
        other => node_len(other),
    }
}

pub fn doc_len(doc: &Document) -> usize {
    let blocks = doc.children.len();
    if blocks == 0 {
        return 0;
    }
    doc.children.iter().map(block_len).sum::<usize>() + blocks - 1
}

/// Resolves a caret index to `(block index, offset inside the block)`.
/// Indices past the end clamp to the end of the last block.
pub fn locate(doc: &Document, index: usize) -> (usize, usize) {
    let last = doc.children.len().saturating_sub(1);
    let mut start = 0usize;
    for (ix, block) in doc.children.iter().enumerate() {
        let len = block_len(block);
        if index <= start + len || ix == last {
            return (ix, index.saturating_sub(start).min(len));
        }
        start += len + 1;
    }
    (0, 0)
}

/// Caret index where block `block_ix` starts.
pub fn block_start(doc: &Document, block_ix: usize) -> usize {
    doc.children
        .iter()
        .take(block_ix)
        .map(|block| block_len(block) + 1)
        .sum()
}

#[derive(PartialEq)]
enum Unit<'a> {
    Char(char),
    Embed(&'a Node),
    Break,
}

fn push_units<'a>(node: &'a Node, out: &mut Vec<Unit<'a>>) {
    match node {
        Node::Text(t) => out.extend(t.text.chars().map(Unit::Char)),
        Node::Void(_) => out.push(Unit::Embed(node)),
        Node::Element(el) => {
            for child in &el.children {
                push_units(child, out);
            }
        }
    }
}

fn units(doc: &Document) -> Vec<Unit<'_>> {
    let mut out = Vec::with_capacity(doc_len(doc));
    for (ix, block) in doc.children.iter().enumerate() {
        if ix > 0 {
            out.push(Unit::Break);
        }
        push_units(block, &mut out);
    }
    out
}

/// The caret span of `old` that was replaced to turn it into `new`, and the
/// length of the replacement. Only content counts; marks and block formats
/// do not. Identical content gives an empty span at the end.
pub fn changed_span(old: &Document, new: &Document) -> (Range<usize>, usize) {
    let (old, new) = (units(old), units(new));
    let prefix = old.iter().zip(&new).take_while(|(a, b)| a == b).count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();
    (prefix..old.len() - suffix, new.len() - suffix - prefix)
}

/// Where caret index `index` of `old` ends up after `span` was replaced by
/// `inserted` positions. Indices inside the span collapse to its start; an
/// index at the start stays in front of the replacement.
pub fn follow_edit(index: usize, span: &Range<usize>, inserted: usize) -> usize {
    if index <= span.start {
        index
    } else if index >= span.end {
        index - span.end + span.start + inserted
    } else {
        span.start
    }
}

pub fn index_of_in(doc: &Document, point: &Point) -> usize {
    let Some((&block_ix, rest)) = point.path.split_first() else {
        return 0;
    };
    if block_ix >= doc.children.len() {
        return doc_len(doc);
    }
    let start = block_start(doc, block_ix);
    match &doc.children[block_ix] {
        Node::Element(el) => {
            let child_ix = rest.first().copied().unwrap_or(0);
            start + local_offset(&el.children, child_ix, point.offset)
        }
        _ => start,
    }
}

fn local_offset(children: &[Node], child_ix: usize, byte_offset: usize) -> usize {
    let mut local = 0usize;
    for (ix, node) in children.iter().enumerate() {
        if ix == child_ix {
            if let Node::Text(t) = node {
                local += byte_to_char(&t.text, byte_offset);
            }
            break;
        }
        local += node_len(node);
    }
    local
}

pub fn point_at_in(doc: &Document, index: usize) -> Point {
    if doc.children.is_empty() {
        return Point::new(vec![0], 0);
    }
    let (block_ix, local) = locate(doc, index);
    match &doc.children[block_ix] {
        Node::Element(el) => point_in_block(&[block_ix], &el.children, local),
        _ => Point::new(vec![block_ix], 0),
    }
}

/// Maps an offset inside a block to a point on a text leaf. At a boundary
/// between two text leaves the later leaf wins; next to an embed the caret
/// lands on the neighbouring text leaf.
pub fn point_in_block(block_path: &[usize], children: &[Node], local: usize) -> Point {
    let at = |child_ix: usize, offset: usize| {
        let mut path = block_path.to_vec();
        path.push(child_ix);
        Point::new(path, offset)
    };

    let mut remaining = local;
    for (child_ix, node) in children.iter().enumerate() {
        match node {
            Node::Text(t) => {
                let chars = t.text.chars().count();
                let next_is_text = matches!(children.get(child_ix + 1), Some(Node::Text(_)));
                if remaining < chars || (remaining == chars && !next_is_text) {
                    return at(child_ix, char_to_byte(&t.text, remaining));
                }
                remaining -= chars;
            }
            Node::Void(_) => {
                if remaining == 0 {
                    if let Some(ix) = children[..child_ix]
                        .iter()
                        .rposition(|n| matches!(n, Node::Text(_)))
                    {
                        if let Node::Text(t) = &children[ix] {
                            return at(ix, t.text.len());
                        }
                    }
                    if let Some(offset) = children[child_ix + 1..]
                        .iter()
                        .position(|n| matches!(n, Node::Text(_)))
                    {
                        return at(child_ix + 1 + offset, 0);
                    }
                }
                remaining = remaining.saturating_sub(1);
            }
            Node::Element(_) => {}
        }
    }

    for (child_ix, node) in children.iter().enumerate().rev() {
        if let Node::Text(t) = node {
            return at(child_ix, t.text.len());
        }
    }
    at(0, 0)
}

/// Copies the inline content between two block offsets, splitting text
/// leaves as needed. Embeds are kept when their position falls in range.
pub fn slice(children: &[Node], from: usize, to: usize) -> Vec<Node> {
    let mut out = Vec::new();
    if from >= to {
        return out;
    }

    let mut cursor = 0usize;
    for node in children {
        let len = node_len(node);
        let (node_start, node_end) = (cursor, cursor + len);
        cursor = node_end;

        match node {
            Node::Text(t) => {
                if node_end <= from || node_start >= to {
                    continue;
                }
                let lo = from.saturating_sub(node_start);
                let hi = (to - node_start).min(len);
                let text = &t.text[char_to_byte(&t.text, lo)..char_to_byte(&t.text, hi)];
                out.push(Node::Text(TextNode {
                    text: text.to_string(),
                    marks: t.marks.clone(),
                }));
            }
            Node::Void(_) => {
                if node_start >= from && node_start < to {
                    out.push(node.clone());
                }
            }
            Node::Element(_) => {}
        }
    }
    out
}

/// Canonical inline run: empty leaves dropped, equal-mark neighbours merged,
/// a text leaf on both sides of every embed, never empty.
pub fn normalize_inline(nodes: Vec<Node>, fallback: &Marks) -> Vec<Node> {
    let mut merged: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Text(t) if t.text.is_empty() => {}
            Node::Text(t) => match merged.last_mut() {
                Some(Node::Text(prev)) if prev.marks == t.marks => prev.text.push_str(&t.text),
                _ => merged.push(Node::Text(t)),
            },
            Node::Void(v) => merged.push(Node::Void(v)),
            Node::Element(_) => {}
        }
    }

    let mut out: Vec<Node> = Vec::with_capacity(merged.len() + 2);
    for node in merged {
        if matches!(node, Node::Void(_)) && !matches!(out.last(), Some(Node::Text(_))) {
            out.push(Node::text("", Marks::default()));
        }
        out.push(node);
    }
    match out.last() {
        Some(Node::Text(_)) => {}
        Some(_) => out.push(Node::text("", Marks::default())),
        None => out.push(Node::text("", fallback.clone())),
    }
    out
}

pub fn map_marks(nodes: Vec<Node>, apply: &dyn Fn(Marks) -> Marks) -> Vec<Node> {
    nodes
        .into_iter()
        .map(|node| match node {
            Node::Text(t) => Node::Text(TextNode {
                text: t.text,
                marks: apply(t.marks),
            }),
            other => other,
        })
        .collect()
}

/// Marks new text typed at `local` picks up: those of the character before
/// it, or of the first text leaf at the start of a block.
pub fn marks_at(children: &[Node], local: usize) -> Marks {
    let mut cursor = 0usize;
    let mut last: Option<&Marks> = None;
    for node in children {
        let len = node_len(node);
        if let Node::Text(t) = node {
            if last.is_none() || (len > 0 && cursor < local) {
                last = Some(&t.marks);
            }
        }
        cursor += len;
        if cursor >= local && last.is_some() && local > 0 {
            break;
        }
    }
    last.cloned().unwrap_or_default()
}
