//! Portable text: the rich-text block array stored in `body` fields.
//!
//! Rendering groups consecutive list items into `<ul>`/`<ol>`, applies
//! decorator marks (`strong`, `em`, `code`, `underline`, `strike-through`)
//! and resolves annotation marks through the block's `markDefs`.

pub mod editor;

use serde::{Deserialize, Serialize};

pub use editor::{EditOp, Editor, EditorError};

const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type", default = "block_type")]
    pub block_type: String,
    #[serde(default = "normal_style")]
    pub style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_item: Option<ListKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(default)]
    pub children: Vec<Span>,
    #[serde(default)]
    pub mark_defs: Vec<MarkDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type", default = "span_type")]
    pub span_type: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub marks: Vec<String>,
}

/// Annotation referenced from a span's marks by `_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkDef {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type")]
    pub def_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Bullet,
    Number,
}

fn block_type() -> String {
    "block".into()
}

fn normal_style() -> String {
    "normal".into()
}

fn span_type() -> String {
    "span".into()
}

pub const STYLES: [&str; 6] = ["normal", "h2", "h3", "h4", "blockquote", "lead"];

impl Block {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            children: vec![Span::new(format!("{key}-0"), text)],
            key,
            block_type: block_type(),
            style: normal_style(),
            list_item: None,
            level: None,
            mark_defs: Vec::new(),
        }
    }

    pub fn text(&self) -> String {
        self.children.iter().map(|s| s.text.as_str()).collect()
    }
}

impl Span {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            span_type: span_type(),
            text: text.into(),
            marks: Vec::new(),
        }
    }
}

/// Escape text for HTML element content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub fn to_html(blocks: &[Block]) -> String {
    let mut html = String::new();
    let mut open_list: Option<ListKind> = None;

    for block in blocks.iter().filter(|b| b.block_type == "block") {
        if block.list_item != open_list {
            if let Some(kind) = open_list.take() {
                html.push_str(list_close(kind));
            }
            if let Some(kind) = block.list_item {
                html.push_str(list_open(kind));
                open_list = Some(kind);
            }
        }

        let inner = render_spans(block);
        if block.list_item.is_some() {
            html.push_str(&format!("<li>{inner}</li>"));
            continue;
        }
        let tag = match block.style.as_str() {
            "h2" => "h2",
            "h3" => "h3",
            "h4" => "h4",
            "blockquote" => "blockquote",
            _ => "p",
        };
        if block.style == "lead" {
            html.push_str(&format!("<p class=\"lead\">{inner}</p>"));
        } else {
            html.push_str(&format!("<{tag}>{inner}</{tag}>"));
        }
    }
    if let Some(kind) = open_list {
        html.push_str(list_close(kind));
    }
    html
}

fn list_open(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Bullet => "<ul>",
        ListKind::Number => "<ol>",
    }
}

fn list_close(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Bullet => "</ul>",
        ListKind::Number => "</ol>",
    }
}

fn render_spans(block: &Block) -> String {
    let mut out = String::new();
    for span in &block.children {
        let mut text = escape_html(&span.text).replace('\n', "<br>");
        for mark in &span.marks {
            text = match mark.as_str() {
                "strong" => format!("<strong>{text}</strong>"),
                "em" => format!("<em>{text}</em>"),
                "code" => format!("<code>{text}</code>"),
                "underline" => format!("<u>{text}</u>"),
                "strike-through" => format!("<s>{text}</s>"),
                key => match block.mark_defs.iter().find(|d| d.key == key) {
                    Some(MarkDef {
                        def_type,
                        href: Some(href),
                        ..
                    }) if def_type == "link" && is_safe_href(href) => {
                        let rel = if href.starts_with("http") {
                            " rel=\"noopener\""
                        } else {
                            ""
                        };
                        format!("<a href=\"{}\"{rel}>{text}</a>", escape_html(href))
                    }
                    _ => text,
                },
            };
        }
        out.push_str(&text);
    }
    out
}

fn is_safe_href(href: &str) -> bool {
    href.starts_with("https://")
        || href.starts_with("http://")
        || href.starts_with("mailto:")
        || href.starts_with('/')
}

/// Text of every block, one paragraph per line.
pub fn to_plain_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .filter(|b| b.block_type == "block")
        .map(Block::text)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn word_count(blocks: &[Block]) -> usize {
    blocks
        .iter()
        .flat_map(|b| b.children.iter())
        .map(|s| s.text.split_whitespace().count())
        .sum()
}

/// Rounded up, never below one minute.
pub fn reading_time_minutes(blocks: &[Block]) -> u32 {
    let words = word_count(blocks);
    (words.div_ceil(WORDS_PER_MINUTE)).max(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blocks(value: serde_json::Value) -> Vec<Block> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn renders_styles_lists_and_marks() {
        let body = blocks(json!([
            {"_key": "a", "_type": "block", "style": "h2", "children": [{"_key": "a0", "text": "Qué pedir"}]},
            {"_key": "b", "_type": "block", "listItem": "bullet", "children": [{"_key": "b0", "text": "Huevos", "marks": ["strong"]}]},
            {"_key": "c", "_type": "block", "listItem": "bullet", "children": [{"_key": "c0", "text": "Callos"}]},
            {"_key": "d", "_type": "block", "markDefs": [{"_key": "l1", "_type": "link", "href": "https://casalucio.es"}],
             "children": [{"_key": "d0", "text": "Reserva aquí", "marks": ["l1", "em"]}]}
        ]));
        assert_eq!(
            to_html(&body),
            "<h2>Qué pedir</h2><ul><li><strong>Huevos</strong></li><li>Callos</li></ul>\
             <p><em><a href=\"https://casalucio.es\" rel=\"noopener\">Reserva aquí</a></em></p>"
        );
    }

    #[test]
    fn escapes_text_and_drops_unsafe_links() {
        let body = blocks(json!([
            {"_key": "a", "markDefs": [{"_key": "x", "_type": "link", "href": "javascript:alert(1)"}],
             "children": [{"_key": "a0", "text": "<script>", "marks": ["x"]}]}
        ]));
        assert_eq!(to_html(&body), "<p>&lt;script&gt;</p>");
    }

    #[test]
    fn plain_text_and_reading_time() {
        let body = vec![Block::new("a", "Hola mundo"), Block::new("b", "Adiós")];
        assert_eq!(to_plain_text(&body), "Hola mundo\n\nAdiós");
        assert_eq!(word_count(&body), 3);
        assert_eq!(reading_time_minutes(&body), 1);

        let long = vec![Block::new("a", "palabra ".repeat(401))];
        assert_eq!(reading_time_minutes(&long), 3);
        assert_eq!(reading_time_minutes(&[]), 1);
    }
}
