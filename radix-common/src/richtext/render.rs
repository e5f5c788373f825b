use html_escape::{encode_double_quoted_attribute, encode_text};
use serde_json::Value;
use tracing::debug;

use super::{format, root_children, Node};

/// Markup emitted when a document has nothing to show
pub const PLACEHOLDER: &str = r#"<p class="content-unavailable">Contenu non disponible.</p>"#;

const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Renders rich-text documents to HTML
///
/// Rendering is total: any input yields markup, malformed or empty trees
/// yield [`PLACEHOLDER`].
#[derive(Debug, Clone)]
pub struct RichTextRenderer {
    media_base_url: String,
}

impl RichTextRenderer {
    /// `media_base_url` prefixes upload urls that are not absolute
    pub fn new(media_base_url: impl Into<String>) -> Self {
        Self {
            media_base_url: media_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Absolute url of a stored media file
    pub fn media_url(&self, url: &str) -> String {
        if url.starts_with("http") {
            url.to_string()
        } else {
            format!("{}{}", self.media_base_url, url)
        }
    }

    pub fn render(&self, doc: Option<&Value>) -> String {
        let children = match root_children(doc) {
            Some(children) => children,
            None => return PLACEHOLDER.to_string(),
        };
        let html = self.render_nodes(&children);
        if html.trim().is_empty() {
            PLACEHOLDER.to_string()
        } else {
            html
        }
    }

    fn render_nodes(&self, nodes: &[Node]) -> String {
        nodes.iter().map(|node| self.render_node(node)).collect()
    }

    fn render_node(&self, node: &Node) -> String {
        match node.kind.as_str() {
            "paragraph" => {
                let inner = self.render_nodes(node.children());
                if inner.trim().is_empty() {
                    String::new()
                } else {
                    format!("<p>{}</p>", inner)
                }
            }
            "heading" => {
                let tag = node
                    .tag
                    .as_deref()
                    .filter(|t| HEADING_TAGS.contains(t))
                    .unwrap_or("h2");
                format!("<{tag}>{}</{tag}>", self.render_nodes(node.children()))
            }
            "list" => {
                let tag = if node.tag.as_deref() == Some("ol") { "ol" } else { "ul" };
                format!("<{tag}>{}</{tag}>", self.render_nodes(node.children()))
            }
            "listitem" => format!("<li>{}</li>", self.render_nodes(node.children())),
            "quote" => format!(
                "<blockquote>{}</blockquote>",
                self.render_nodes(node.children())
            ),
            "text" => render_text(node),
            "linebreak" => "<br>".to_string(),
            "link" => self.render_link(node),
            "relationship" => match render_relationship(node) {
                Some(html) => html,
                None => self.render_fallback(node),
            },
            "upload" if node.relation_to.as_deref() == Some("media") => {
                self.render_upload(node).unwrap_or_default()
            }
            _ => self.render_fallback(node),
        }
    }

    /// Unhandled node: its children, else its text, else nothing
    fn render_fallback(&self, node: &Node) -> String {
        if !node.children().is_empty() {
            debug!("Rendering children of unhandled node type '{}'", node.kind);
            return self.render_nodes(node.children());
        }
        match node.text.as_deref() {
            Some(text) => encode_text(text).into_owned(),
            None => String::new(),
        }
    }

    fn render_link(&self, node: &Node) -> String {
        let inner = self.render_nodes(node.children());
        let fields = node.fields.as_ref();
        let new_tab = fields
            .and_then(|f| f.get("newTab"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let target = if new_tab {
            r#" target="_blank" rel="noopener noreferrer""#
        } else {
            ""
        };

        let href = match node.field_str("linkType") {
            Some("internal") => internal_link_href(fields),
            Some("custom") => node
                .field_str("url")
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .filter(|u| {
                    let allowed = is_safe_link_url(u);
                    if !allowed {
                        debug!("Dropping link with unsupported url scheme: {}", u);
                    }
                    allowed
                })
                .map(str::to_string),
            _ => None,
        };

        match href {
            Some(href) => format!(
                r#"<a href="{}"{}>{}</a>"#,
                encode_double_quoted_attribute(&href),
                target,
                inner
            ),
            None => format!("<span>{}</span>", inner),
        }
    }

    fn render_upload(&self, node: &Node) -> Option<String> {
        let value = node.value.as_ref()?;
        let url = value.get("url").and_then(Value::as_str).filter(|u| !u.is_empty())?;
        let src = self.media_url(url);

        let instance = node.fields.as_ref();
        let alt = [
            instance.and_then(|f| f.get("alt")),
            value.get("alt"),
            value.get("filename"),
        ]
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find(|s| !s.is_empty())
        .unwrap_or("Image illustrative");

        let mut img = format!(
            r#"<img src="{}" alt="{}""#,
            encode_double_quoted_attribute(&src),
            encode_double_quoted_attribute(alt)
        );
        for dimension in ["width", "height"] {
            if let Some(size) = value.get(dimension).and_then(Value::as_u64).filter(|s| *s > 0) {
                img.push_str(&format!(r#" {}="{}""#, dimension, size));
            }
        }
        img.push_str(" loading=\"lazy\">");

        let caption = instance
            .and_then(|f| f.get("caption"))
            .filter(|c| !c.is_null())
            .or_else(|| value.get("caption").filter(|c| !c.is_null()))
            .map(|c| self.render_caption(c))
            .filter(|c| !c.trim().is_empty());

        Some(match caption {
            Some(caption) => format!("<figure>{}<figcaption>{}</figcaption></figure>", img, caption),
            None => format!("<figure>{}</figure>", img),
        })
    }

    /// Caption is either a plain string or a nested document
    fn render_caption(&self, caption: &Value) -> String {
        if let Some(text) = caption.as_str() {
            return encode_text(text).into_owned();
        }
        match root_children(Some(caption)) {
            Some(children) => self.render_nodes(&children),
            None => String::new(),
        }
    }
}

fn render_text(node: &Node) -> String {
    let mut html = encode_text(node.text.as_deref().unwrap_or("")).into_owned();
    let wrappers = [
        (format::STRIKETHROUGH, "s"),
        (format::CODE, "code"),
        (format::UNDERLINE, "u"),
        (format::ITALIC, "em"),
        (format::BOLD, "strong"),
    ];
    for (flag, tag) in wrappers {
        if node.has_format(flag) {
            html = format!("<{tag}>{html}</{tag}>");
        }
    }
    html
}

/// Site-relative, anchor, `http`, `https` or `mailto` urls
fn is_safe_link_url(url: &str) -> bool {
    if url.starts_with('/') || url.starts_with('#') {
        return true;
    }
    let lower = url.to_ascii_lowercase();
    ["http://", "https://", "mailto:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

fn internal_link_href(fields: Option<&Value>) -> Option<String> {
    let doc = fields?.get("doc")?;
    let collection = doc.get("relationTo").and_then(Value::as_str)?;
    let slug = doc
        .get("value")
        .filter(|v| v.is_object())
        .and_then(|v| v.get("slug"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())?;
    Some(format!("/{}/{}", collection, slug))
}

/// Cross reference to another record; `None` when the node is unresolved
fn render_relationship(node: &Node) -> Option<String> {
    let value = node.value.as_ref().filter(|v| v.is_object())?;
    let collection = node.relation_to.as_deref()?;
    let id = match value.get("id")? {
        Value::String(s) => s.clone(),
        Value::Null => return None,
        other => other.to_string(),
    };

    let label = ["nomComplet", "nomPrincipal", "nom"]
        .into_iter()
        .filter_map(|key| value.get(key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("[{} ID: {}]", collection, id));
    let label = encode_text(&label).into_owned();

    match value.get("slug").and_then(Value::as_str).filter(|s| !s.is_empty()) {
        Some(slug) => Some(format!(
            r#"<a href="{}">{}</a>"#,
            encode_double_quoted_attribute(&format!("/{}/{}", collection, slug)),
            label
        )),
        None => Some(format!(
            r#"<span title="{}">{} (Lien non disponible)</span>"#,
            encode_double_quoted_attribute(&format!("Relation vers {} ID: {}", collection, id)),
            label
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(children: Value) -> Value {
        json!({"root": {"type": "root", "children": children}})
    }

    fn renderer() -> RichTextRenderer {
        RichTextRenderer::new("https://cms.example.org/")
    }

    #[test]
    fn test_missing_or_empty_documents_render_placeholder() {
        let r = renderer();
        assert_eq!(r.render(None), PLACEHOLDER);
        assert_eq!(r.render(Some(&json!(null))), PLACEHOLDER);
        assert_eq!(r.render(Some(&json!({"root": {}}))), PLACEHOLDER);
        assert_eq!(r.render(Some(&doc(json!([])))), PLACEHOLDER);
    }

    #[test]
    fn test_only_empty_paragraphs_render_placeholder() {
        let r = renderer();
        let tree = doc(json!([
            {"type": "paragraph", "children": []},
            {"type": "paragraph", "children": [{"type": "text", "text": "   ", "format": 0}]},
            {"type": "paragraph"}
        ]));
        assert_eq!(r.render(Some(&tree)), PLACEHOLDER);
    }

    #[test]
    fn test_text_format_nesting_order() {
        let r = renderer();
        let tree = doc(json!([
            {"type": "paragraph", "children": [
                {"type": "text", "text": "tout", "format": 31}
            ]}
        ]));
        assert_eq!(
            r.render(Some(&tree)),
            "<p><strong><em><u><code><s>tout</s></code></u></em></strong></p>"
        );
    }

    #[test]
    fn test_text_is_escaped() {
        let r = renderer();
        let tree = doc(json!([
            {"type": "paragraph", "children": [{"type": "text", "text": "<script>a & b</script>"}]}
        ]));
        assert_eq!(
            r.render(Some(&tree)),
            "<p>&lt;script&gt;a &amp; b&lt;/script&gt;</p>"
        );
    }

    #[test]
    fn test_block_nodes() {
        let r = renderer();
        let tree = doc(json!([
            {"type": "heading", "tag": "h3", "children": [{"type": "text", "text": "Titre"}]},
            {"type": "heading", "tag": "h9", "children": [{"type": "text", "text": "Mauvais"}]},
            {"type": "list", "tag": "ol", "children": [
                {"type": "listitem", "children": [{"type": "text", "text": "un"}]}
            ]},
            {"type": "list", "tag": "ul", "children": [
                {"type": "listitem", "children": [{"type": "text", "text": "deux"}]}
            ]},
            {"type": "quote", "children": [{"type": "text", "text": "cité"}]},
            {"type": "paragraph", "children": [
                {"type": "text", "text": "a"}, {"type": "linebreak"}, {"type": "text", "text": "b"}
            ]}
        ]));
        assert_eq!(
            r.render(Some(&tree)),
            "<h3>Titre</h3><h2>Mauvais</h2><ol><li>un</li></ol><ul><li>deux</li></ul>\
             <blockquote>cité</blockquote><p>a<br>b</p>"
        );
    }

    #[test]
    fn test_links() {
        let r = renderer();
        let tree = doc(json!([
            {"type": "paragraph", "children": [
                {"type": "link", "fields": {
                    "linkType": "internal",
                    "doc": {"relationTo": "verreries", "value": {"id": 4, "slug": "portieux"}}
                }, "children": [{"type": "text", "text": "Portieux"}]},
                {"type": "link", "fields": {"linkType": "custom", "url": "https://example.org", "newTab": true},
                 "children": [{"type": "text", "text": "ext"}]},
                {"type": "link", "fields": {"linkType": "internal", "doc": {"relationTo": "verreries", "value": 4}},
                 "children": [{"type": "text", "text": "nu"}]}
            ]}
        ]));
        assert_eq!(
            r.render(Some(&tree)),
            "<p><a href=\"/verreries/portieux\">Portieux</a>\
             <a href=\"https://example.org\" target=\"_blank\" rel=\"noopener noreferrer\">ext</a>\
             <span>nu</span></p>"
        );
    }

    #[test]
    fn test_custom_links_only_allow_web_and_mail_urls() {
        let r = renderer();
        let link = |url: &str| {
            doc(json!([
                {"type": "paragraph", "children": [
                    {"type": "link", "fields": {"linkType": "custom", "url": url},
                     "children": [{"type": "text", "text": "lien"}]}
                ]}
            ]))
        };

        for url in ["javascript:alert(1)", " JavaScript:alert(1)", "data:text/html,x", "vbscript:x"] {
            assert_eq!(r.render(Some(&link(url))), "<p><span>lien</span></p>", "{}", url);
        }
        for url in ["/histoires/verre", "#notes", "mailto:contact@example.org", "HTTPS://example.org"] {
            assert!(r.render(Some(&link(url))).starts_with("<p><a href="), "{}", url);
        }
    }

    #[test]
    fn test_relationship_nodes() {
        let r = renderer();
        let tree = doc(json!([
            {"type": "relationship", "relationTo": "personnalites",
             "value": {"id": 7, "slug": "jean-guillaume", "nomComplet": "Jean Guillaume"}},
            {"type": "relationship", "relationTo": "verreries", "value": {"id": "12"}}
        ]));
        assert_eq!(
            r.render(Some(&tree)),
            "<a href=\"/personnalites/jean-guillaume\">Jean Guillaume</a>\
             <span title=\"Relation vers verreries ID: 12\">[verreries ID: 12] (Lien non disponible)</span>"
        );
    }

    #[test]
    fn test_upload_nodes() {
        let r = renderer();
        let tree = doc(json!([
            {"type": "upload", "relationTo": "media", "fields": null,
             "value": {"id": "1", "url": "/media/four.jpg", "filename": "four.jpg", "width": 800, "height": 600,
                       "caption": "Le four"}},
            {"type": "upload", "relationTo": "media", "fields": {"alt": "Vue"},
             "value": {"id": "2", "url": "https://img.example.org/a.png"}},
            {"type": "upload", "relationTo": "media", "value": {"id": "3"}}
        ]));
        assert_eq!(
            r.render(Some(&tree)),
            "<figure><img src=\"https://cms.example.org/media/four.jpg\" alt=\"four.jpg\" width=\"800\" height=\"600\" loading=\"lazy\">\
             <figcaption>Le four</figcaption></figure>\
             <figure><img src=\"https://img.example.org/a.png\" alt=\"Vue\" loading=\"lazy\"></figure>"
        );
    }

    #[test]
    fn test_upload_caption_as_rich_text() {
        let r = renderer();
        let tree = doc(json!([
            {"type": "upload", "relationTo": "media",
             "value": {"url": "/m.jpg", "caption": {"root": {"children": [
                {"type": "text", "text": "gravé", "format": 2}
             ]}}}}
        ]));
        let html = r.render(Some(&tree));
        assert!(html.contains("alt=\"Image illustrative\""));
        assert!(html.contains("<figcaption><em>gravé</em></figcaption>"));
    }

    #[test]
    fn test_unknown_nodes_fall_back() {
        let r = renderer();
        let tree = doc(json!([
            {"type": "callout", "children": [
                {"type": "paragraph", "children": [{"type": "text", "text": "dedans"}]}
            ]},
            {"type": "mystery", "text": "brut"},
            {"type": "horizontalrule"}
        ]));
        assert_eq!(r.render(Some(&tree)), "<p>dedans</p>brut");
    }
}
