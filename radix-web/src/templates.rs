//! Page templates
//!
//! Templates are compiled into the binary and registered together so
//! `{% extends %}` resolves. Autoescaping applies to every `.html` template;
//! rendered rich text is inserted with `| safe`.

use tera::{Context, Tera};

const TEMPLATES: [(&str, &str); 11] = [
    ("base.html", include_str!("../templates/base.html")),
    ("macros.html", include_str!("../templates/macros.html")),
    ("home.html", include_str!("../templates/home.html")),
    ("glassworks.html", include_str!("../templates/glassworks.html")),
    ("glasswork.html", include_str!("../templates/glasswork.html")),
    ("person.html", include_str!("../templates/person.html")),
    ("stories.html", include_str!("../templates/stories.html")),
    ("story.html", include_str!("../templates/story.html")),
    ("search.html", include_str!("../templates/search.html")),
    ("page.html", include_str!("../templates/page.html")),
    ("not_found.html", include_str!("../templates/not_found.html")),
];

pub fn load_templates() -> tera::Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES)?;
    Ok(tera)
}

/// Render a template with its context
pub fn render(tera: &Tera, name: &str, context: &Context) -> tera::Result<String> {
    tera.render(name, context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_templates_compile() {
        let tera = load_templates().unwrap();
        assert_eq!(tera.get_template_names().count(), TEMPLATES.len());
    }

    #[test]
    fn test_not_found_renders_with_empty_footer() {
        let tera = load_templates().unwrap();
        let mut context = Context::new();
        context.insert("footer_pages", &Vec::<String>::new());
        let html = render(&tera, "not_found.html", &context).unwrap();
        assert!(html.contains("Page introuvable"));
    }

    #[test]
    fn test_text_is_autoescaped() {
        let tera = load_templates().unwrap();
        let mut context = Context::new();
        context.insert("footer_pages", &Vec::<String>::new());
        context.insert(
            "page",
            &serde_json::json!({ "title": "<script>", "content_html": "<p>ok</p>" }),
        );
        let html = render(&tera, "page.html", &context).unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("<p>ok</p>"));
    }
}
