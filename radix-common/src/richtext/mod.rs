//! Rich-text documents
//!
//! Content fields hold the editor's JSON tree: a `root` node whose children
//! are paragraphs, headings, lists, quotes, links, uploads and text runs.
//! [`RichTextRenderer`] turns the tree into HTML; [`extract_plain_text`]
//! produces card excerpts.

mod render;

pub use render::{RichTextRenderer, PLACEHOLDER};

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Text format bitmask
pub mod format {
    pub const BOLD: u64 = 1;
    pub const ITALIC: u64 = 2;
    pub const UNDERLINE: u64 = 4;
    pub const CODE: u64 = 8;
    pub const STRIKETHROUGH: u64 = 16;
}

/// Excerpt shown when a document has no text
pub const EXCERPT_FALLBACK: &str = "Description à venir.";

/// One node of the tree. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Node {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub children: Option<Vec<Node>>,
    #[serde(default)]
    pub text: Option<String>,
    /// Bitmask on text nodes, alignment string on element nodes
    #[serde(default)]
    pub format: Value,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub fields: Option<Value>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default, rename = "relationTo")]
    pub relation_to: Option<String>,
}

impl Node {
    pub fn children(&self) -> &[Node] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Format flags of a text node; element alignment strings count as 0
    pub fn format_flags(&self) -> u64 {
        self.format.as_u64().unwrap_or(0)
    }

    pub fn has_format(&self, flag: u64) -> bool {
        self.format_flags() & flag != 0
    }

    /// String field of `fields`
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields
            .as_ref()
            .and_then(|f| f.get(key))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct Document {
    root: Node,
}

/// Top-level nodes of a document, or `None` when the document is missing,
/// malformed or has no children.
pub fn root_children(doc: Option<&Value>) -> Option<Vec<Node>> {
    let doc = doc?;
    if !doc.get("root").map(Value::is_object).unwrap_or(false) {
        return None;
    }
    let parsed: Document = match serde_json::from_value(doc.clone()) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Unreadable rich-text document: {}", e);
            return None;
        }
    };
    parsed.root.children.filter(|children| !children.is_empty())
}

/// Plain-text excerpt of a document
///
/// Text runs are concatenated, block nodes separated by a space, whitespace
/// collapsed. Longer excerpts are cut to `max_len - 3` characters followed
/// by "...".
///
/// # Examples
/// ```
/// use radix_common::richtext::extract_plain_text;
/// use serde_json::json;
///
/// let doc = json!({"root": {"children": [
///     {"type": "paragraph", "children": [{"type": "text", "text": "Fondée en 1764."}]}
/// ]}});
/// assert_eq!(extract_plain_text(Some(&doc), 120), "Fondée en 1764.");
/// assert_eq!(extract_plain_text(None, 120), "Description à venir.");
/// ```
pub fn extract_plain_text(doc: Option<&Value>, max_len: usize) -> String {
    let children = match root_children(doc) {
        Some(children) => children,
        None => return EXCERPT_FALLBACK.to_string(),
    };

    let mut text = String::new();
    collect_text(&children, &mut text);

    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        return EXCERPT_FALLBACK.to_string();
    }
    if cleaned.chars().count() > max_len {
        let cut: String = cleaned.chars().take(max_len.saturating_sub(3)).collect();
        return format!("{}...", cut);
    }
    cleaned
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        if node.kind == "text" {
            if let Some(text) = &node.text {
                out.push_str(text);
            }
        }
        collect_text(node.children(), out);
        if matches!(node.kind.as_str(), "paragraph" | "listitem" | "linebreak")
            && !out.is_empty()
            && !out.ends_with(' ')
        {
            out.push(' ');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_root_children_rejects_empty_and_malformed() {
        assert!(root_children(None).is_none());
        assert!(root_children(Some(&json!("texte"))).is_none());
        assert!(root_children(Some(&json!({"root": null}))).is_none());
        assert!(root_children(Some(&json!({"root": {"children": []}}))).is_none());
        assert!(root_children(Some(&json!({"root": {"children": "oops"}}))).is_none());
    }

    #[test]
    fn test_node_format_accepts_alignment_strings() {
        let doc = json!({"root": {"children": [
            {"type": "paragraph", "format": "center", "children": [
                {"type": "text", "text": "x", "format": 3}
            ]}
        ]}});
        let children = root_children(Some(&doc)).unwrap();
        assert_eq!(children[0].format_flags(), 0);
        let text = &children[0].children()[0];
        assert!(text.has_format(format::BOLD));
        assert!(text.has_format(format::ITALIC));
        assert!(!text.has_format(format::CODE));
    }

    #[test]
    fn test_extract_plain_text_separates_blocks() {
        let doc = json!({"root": {"children": [
            {"type": "paragraph", "children": [{"type": "text", "text": "Première"}]},
            {"type": "list", "children": [
                {"type": "listitem", "children": [{"type": "text", "text": "un"}]},
                {"type": "listitem", "children": [{"type": "text", "text": "deux  "}]}
            ]},
            {"type": "paragraph", "children": [{"type": "text", "text": "fin"}]}
        ]}});
        assert_eq!(extract_plain_text(Some(&doc), 120), "Première un deux fin");
    }

    #[test]
    fn test_extract_plain_text_truncates() {
        let doc = json!({"root": {"children": [
            {"type": "paragraph", "children": [{"type": "text", "text": "Verrerie à vitres et à bouteilles"}]}
        ]}});
        assert_eq!(extract_plain_text(Some(&doc), 12), "Verrerie ...");
        assert_eq!(extract_plain_text(Some(&doc), 12).chars().count(), 12);
    }

    #[test]
    fn test_extract_plain_text_fallback_when_blank() {
        let doc = json!({"root": {"children": [
            {"type": "paragraph", "children": [{"type": "text", "text": "   "}]}
        ]}});
        assert_eq!(extract_plain_text(Some(&doc), 120), EXCERPT_FALLBACK);
    }
}
