//! Markup codec for the HTML subset the authoring surface stores.
//!
//! Parsing is tolerant: unknown tags are dropped while their text is kept,
//! unclosed tags close at the end of input and stray text outside a block
//! becomes a paragraph. Serialization is canonical, so `serialize(parse(s))`
//! is a fixed point after one round.

use serde_json::Value;

use crate::core::{Attrs, Document, ElementNode, Marks, Node};
use crate::inline;
use crate::plugin::{LIST_TYPES, MAX_HEADING_LEVEL};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Text(String),
    Open {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Close {
        name: String,
    },
}

/// Elements whose content never reaches the document.
const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "head", "title"];

fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut rest = input;

    while let Some(lt) = rest.find('<') {
        text.push_str(&rest[..lt]);
        let after = &rest[lt + 1..];

        if let Some(comment) = after.strip_prefix("!--") {
            rest = match comment.find("-->") {
                Some(end) => &comment[end + 3..],
                None => "",
            };
            continue;
        }

        let starts_tag = after
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!' || c == '?');
        let Some(gt) = after.find('>').filter(|_| starts_tag) else {
            text.push('<');
            rest = after;
            continue;
        };

        if !text.is_empty() {
            tokens.push(Token::Text(decode_entities(&std::mem::take(&mut text))));
        }
        let body = &after[..gt];
        rest = &after[gt + 1..];

        if body.starts_with('!') || body.starts_with('?') {
            continue;
        }
        if let Some(name) = body.strip_prefix('/') {
            tokens.push(Token::Close {
                name: tag_name(name),
            });
            continue;
        }

        let name = tag_name(body);
        if SKIPPED_ELEMENTS.contains(&name.as_str()) {
            let close = format!("</{name}");
            rest = match find_ascii_case_insensitive(rest, &close) {
                Some(at) => match rest[at..].find('>') {
                    Some(end) => &rest[at + end + 1..],
                    None => "",
                },
                None => "",
            };
            continue;
        }
        tokens.push(Token::Open {
            attrs: parse_attrs(&body[name.len().min(body.len())..]),
            name,
        });
    }

    text.push_str(rest);
    if !text.is_empty() {
        tokens.push(Token::Text(decode_entities(&text)));
    }
    tokens
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
}

fn tag_name(body: &str) -> String {
    body.trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

fn parse_attrs(mut s: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    loop {
        s = s.trim_start_matches(|c: char| c.is_whitespace() || c == '/');
        if s.is_empty() {
            return attrs;
        }

        let name_end = s
            .find(|c: char| c.is_whitespace() || c == '=' || c == '/')
            .unwrap_or(s.len());
        let name = s[..name_end].to_ascii_lowercase();
        s = s[name_end..].trim_start();

        let value = if let Some(after_eq) = s.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            match after_eq.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let inner = &after_eq[1..];
                    let end = inner.find(quote).unwrap_or(inner.len());
                    s = inner.get(end + 1..).unwrap_or("");
                    &inner[..end]
                }
                _ => {
                    let end = after_eq
                        .find(char::is_whitespace)
                        .unwrap_or(after_eq.len());
                    s = &after_eq[end..];
                    &after_eq[..end]
                }
            }
        } else {
            ""
        };

        if !name.is_empty() {
            attrs.push((name, decode_entities(value)));
        }
    }
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&after[..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkTag {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Link,
}

impl MarkTag {
    fn from_tag(name: &str) -> Option<Self> {
        match name {
            "strong" | "b" => Some(Self::Bold),
            "em" | "i" => Some(Self::Italic),
            "u" | "ins" => Some(Self::Underline),
            "s" | "strike" | "del" => Some(Self::Strikethrough),
            "a" => Some(Self::Link),
            _ => None,
        }
    }
}

struct OpenBlock {
    kind: &'static str,
    attrs: Attrs,
    children: Vec<Node>,
    pending_break: bool,
}

#[derive(Default)]
struct TreeBuilder {
    blocks: Vec<Node>,
    current: Option<OpenBlock>,
    marks: Vec<(MarkTag, Option<String>)>,
    lists: Vec<&'static str>,
}

impl TreeBuilder {
    fn marks(&self) -> Marks {
        let mut marks = Marks::default();
        for (tag, href) in &self.marks {
            match tag {
                MarkTag::Bold => marks.bold = true,
                MarkTag::Italic => marks.italic = true,
                MarkTag::Underline => marks.underline = true,
                MarkTag::Strikethrough => marks.strikethrough = true,
                MarkTag::Link => marks.link = href.clone(),
            }
        }
        marks
    }

    fn open_block(&mut self, kind: &'static str, attrs: Attrs) {
        self.close_block();
        self.current = Some(OpenBlock {
            kind,
            attrs,
            children: Vec::new(),
            pending_break: false,
        });
    }

    fn close_block(&mut self) {
        let Some(block) = self.current.take() else {
            return;
        };
        self.blocks.push(Node::Element(ElementNode {
            kind: block.kind.to_string(),
            attrs: block.attrs,
            children: inline::normalize_inline(block.children, &Marks::default()),
        }));
    }

    fn implicit_block(&self) -> (&'static str, Attrs) {
        match self.lists.last() {
            Some(list_type) => ("list_item", list_attrs(list_type)),
            None => ("paragraph", Attrs::default()),
        }
    }

    /// The block inline content goes into, opening one when text shows up
    /// outside any block and splitting after a `<br>`.
    fn content_block(&mut self) -> &mut OpenBlock {
        let split = match &self.current {
            Some(block) if block.pending_break => Some((block.kind, block.attrs.clone())),
            Some(_) => None,
            None => {
                let (kind, attrs) = self.implicit_block();
                Some((kind, attrs))
            }
        };
        if let Some((kind, attrs)) = split {
            self.open_block(kind, attrs);
        }
        self.current.get_or_insert_with(|| OpenBlock {
            kind: "paragraph",
            attrs: Attrs::default(),
            children: Vec::new(),
            pending_break: false,
        })
    }

    fn text(&mut self, raw: &str) {
        let text: String = raw
            .chars()
            .map(|c| if matches!(c, '\n' | '\r' | '\t') { ' ' } else { c })
            .collect();

        let at_block_start = match &self.current {
            None => true,
            Some(block) => block.pending_break || inline::inline_len(&block.children) == 0,
        };
        let text = if at_block_start {
            text.trim_start_matches(' ')
        } else {
            text.as_str()
        };
        if text.is_empty() {
            return;
        }

        let marks = self.marks();
        let text = text.to_string();
        self.content_block().children.push(Node::text(text, marks));
    }

    fn image(&mut self, attrs: &[(String, String)]) {
        let src = attr(attrs, "src").map(str::trim).unwrap_or_default();
        if src.is_empty() {
            return;
        }
        let alt = attr(attrs, "alt")
            .filter(|alt| !alt.is_empty())
            .map(|alt| alt.to_string());
        let node = Node::image(src, alt);
        self.content_block().children.push(node);
    }

    fn line_break(&mut self) {
        if let Some(block) = self.current.as_mut() {
            if inline::inline_len(&block.children) > 0 {
                block.pending_break = true;
            }
        }
    }

    fn open(&mut self, name: &str, attrs: &[(String, String)]) {
        match name {
            "p" | "div" | "blockquote" | "pre" => self.open_block_or_item("paragraph"),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..]
                    .parse::<u64>()
                    .unwrap_or(1)
                    .clamp(1, MAX_HEADING_LEVEL);
                self.open_block("heading", heading_attrs(level));
            }
            "ul" | "ol" => {
                self.close_block();
                self.lists
                    .push(if name == "ol" { LIST_TYPES[1] } else { LIST_TYPES[0] });
            }
            "li" => {
                let list_type = self.lists.last().copied().unwrap_or(LIST_TYPES[0]);
                self.open_block("list_item", list_attrs(list_type));
            }
            "br" => self.line_break(),
            "img" => self.image(attrs),
            _ => {
                if let Some(tag) = MarkTag::from_tag(name) {
                    let href = match tag {
                        MarkTag::Link => attr(attrs, "href")
                            .map(str::trim)
                            .filter(|href| !href.is_empty())
                            .map(str::to_string),
                        _ => None,
                    };
                    self.marks.push((tag, href));
                }
            }
        }
    }

    /// A `<p>` inside a list item continues the item instead of leaving it.
    fn open_block_or_item(&mut self, kind: &'static str) {
        match &self.current {
            Some(block) if block.kind == "list_item" && block.children.is_empty() => {}
            _ => self.open_block(kind, Attrs::default()),
        }
    }

    fn close(&mut self, name: &str) {
        match name {
            "p" | "div" | "blockquote" | "pre" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "li" => {
                if name == "p" && self.current.as_ref().is_some_and(|b| b.kind == "list_item") {
                    return;
                }
                self.close_block();
            }
            "ul" | "ol" => {
                self.close_block();
                self.lists.pop();
            }
            _ => {
                if let Some(tag) = MarkTag::from_tag(name) {
                    if let Some(ix) = self.marks.iter().rposition(|(open, _)| *open == tag) {
                        self.marks.remove(ix);
                    }
                }
            }
        }
    }

    fn finish(mut self) -> Document {
        self.close_block();
        if self.blocks.is_empty() {
            return Document::blank();
        }
        Document {
            children: self.blocks,
        }
    }
}

fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn heading_attrs(level: u64) -> Attrs {
    let mut attrs = Attrs::default();
    attrs.insert(
        "level".to_string(),
        Value::Number(serde_json::Number::from(level)),
    );
    attrs
}

fn list_attrs(list_type: &str) -> Attrs {
    let mut attrs = Attrs::default();
    attrs.insert(
        "list_type".to_string(),
        Value::String(list_type.to_string()),
    );
    attrs
}

/// Parses stored markup. Never fails; an empty or content-free input yields
/// a blank document.
pub fn parse(input: &str) -> Document {
    let mut builder = TreeBuilder::default();
    for token in tokenize(input) {
        match token {
            Token::Text(text) => builder.text(&text),
            Token::Open { name, attrs } => builder.open(&name, &attrs),
            Token::Close { name } => builder.close(&name),
        }
    }
    builder.finish()
}

pub fn serialize(doc: &Document) -> String {
    let mut out = String::new();
    let mut open_list: Option<&str> = None;

    for node in &doc.children {
        let Node::Element(el) = node else {
            continue;
        };

        let list_type = (el.kind == "list_item")
            .then(|| el.attr_str("list_type").unwrap_or(LIST_TYPES[0]));
        if open_list != list_type {
            if let Some(previous) = open_list {
                out.push_str(list_close(previous));
            }
            if let Some(next) = list_type {
                out.push_str(list_open(next));
            }
            open_list = list_type;
        }

        let tag = match el.kind.as_str() {
            "heading" => match el.attrs.get("level").and_then(|v| v.as_u64()) {
                Some(2) => "h2",
                Some(3) => "h3",
                _ => "h1",
            },
            "list_item" => "li",
            _ => "p",
        };

        out.push('<');
        out.push_str(tag);
        out.push('>');
        if inline::inline_len(&el.children) == 0 {
            out.push_str("<br>");
        } else {
            for child in &el.children {
                serialize_inline(child, &mut out);
            }
        }
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }

    if let Some(previous) = open_list {
        out.push_str(list_close(previous));
    }
    out
}

fn list_open(list_type: &str) -> &'static str {
    if list_type == LIST_TYPES[1] {
        "<ol>"
    } else {
        "<ul>"
    }
}

fn list_close(list_type: &str) -> &'static str {
    if list_type == LIST_TYPES[1] {
        "</ol>"
    } else {
        "</ul>"
    }
}

fn serialize_inline(node: &Node, out: &mut String) {
    match node {
        Node::Text(t) if t.text.is_empty() => {}
        Node::Text(t) => {
            let marks = &t.marks;
            if let Some(href) = &marks.link {
                out.push_str("<a href=\"");
                out.push_str(&escape_attr(href));
                out.push_str("\">");
            }
            let wrappers = [
                (marks.bold, "strong"),
                (marks.italic, "em"),
                (marks.underline, "u"),
                (marks.strikethrough, "s"),
            ];
            for (on, tag) in wrappers {
                if on {
                    out.push('<');
                    out.push_str(tag);
                    out.push('>');
                }
            }
            out.push_str(&escape_text(&t.text));
            for (on, tag) in wrappers.iter().rev() {
                if *on {
                    out.push_str("</");
                    out.push_str(tag);
                    out.push('>');
                }
            }
            if marks.link.is_some() {
                out.push_str("</a>");
            }
        }
        Node::Void(v) if v.kind == "image" => {
            let Some(src) = v.attr_str("src") else {
                return;
            };
            out.push_str("<img src=\"");
            out.push_str(&escape_attr(src));
            out.push('"');
            if let Some(alt) = v.attr_str("alt") {
                out.push_str(" alt=\"");
                out.push_str(&escape_attr(alt));
                out.push('"');
            }
            out.push('>');
        }
        Node::Void(_) | Node::Element(_) => {}
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\u{a0}', "&nbsp;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}
