//! Full-document assembly: tree walk, head metadata, stylesheet placement.

use crate::css::{css_class, StylesheetBuilder};
use crate::html::{escape, safe_url};
use crate::registry::{RenderContext, RendererRegistry};
use fhub_domain::blocks::PageTree;
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Write;

/// Page-level inputs that are not part of the tree itself.
#[derive(Debug, Clone, Copy)]
pub struct PageMeta<'a> {
    pub title: &'a str,
    /// Loose SEO object as stored on the page. Unknown keys are ignored.
    pub seo: &'a Value,
}

/// Site-level rendering knobs supplied by the storefront.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub lang: String,
    pub site_name: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { lang: "en".to_owned(), site_name: None }
    }
}

/// A rendered document. `html` is complete and self-contained; `css` is the
/// same stylesheet the document inlines, for callers that serve it apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub html: String,
    pub css: String,
}

/// The SEO keys the head emitter understands.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SeoView {
    description: Option<String>,
    canonical: Option<String>,
    robots: Option<String>,
    og_title: Option<String>,
    og_description: Option<String>,
    og_image: Option<String>,
    json_ld: Option<Value>,
}

impl RendererRegistry {
    /// Renders a page tree into a complete HTML document.
    ///
    /// Sections become `<section>` elements (with the anchor as their DOM
    /// id), containers become `<div>` wrappers, and blocks dispatch through
    /// the registry. The output is byte-stable for a given input, so the
    /// storefront can cache it.
    #[must_use]
    pub fn render_page(
        &self,
        tree: &PageTree,
        meta: &PageMeta<'_>,
        opts: &RenderOptions,
    ) -> RenderedPage {
        let mut body = String::new();
        let mut css = StylesheetBuilder::new();

        for section in &tree.sections {
            css.push(&section.id, &section.styles);
            let class = css_class(&section.id);
            match &section.anchor {
                Some(anchor) => {
                    let _ = write!(body, "<section class=\"{class}\" id=\"{}\">", escape(anchor));
                }
                None => {
                    let _ = write!(body, "<section class=\"{class}\">");
                }
            }
            for container in &section.containers {
                css.push(&container.id, &container.styles);
                let _ = write!(body, "<div class=\"{}\">", css_class(&container.id));
                for block in &container.blocks {
                    let mut ctx = RenderContext { html: &mut body, css: &mut css };
                    self.render_block(block, &mut ctx);
                }
                body.push_str("</div>");
            }
            body.push_str("</section>");
        }

        let css = css.finish();
        let html = assemble(&body, &css, meta, opts);
        RenderedPage { html, css }
    }
}

fn assemble(body: &str, css: &str, meta: &PageMeta<'_>, opts: &RenderOptions) -> String {
    let seo = SeoView::deserialize(meta.seo).unwrap_or_default();

    let mut html = String::with_capacity(body.len() + css.len() + 512);
    html.push_str("<!DOCTYPE html>");
    let _ = write!(html, "<html lang=\"{}\">", escape(&opts.lang));
    html.push_str("<head><meta charset=\"utf-8\"/>");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"/>");
    let _ = write!(html, "<title>{}</title>", escape(meta.title));

    if let Some(description) = &seo.description {
        let _ = write!(html, "<meta name=\"description\" content=\"{}\"/>", escape(description));
    }
    if let Some(robots) = &seo.robots {
        let _ = write!(html, "<meta name=\"robots\" content=\"{}\"/>", escape(robots));
    }
    if let Some(canonical) = &seo.canonical {
        let href = escape(safe_url(canonical));
        let _ = write!(html, "<link rel=\"canonical\" href=\"{href}\"/>");
    }

    let og_title = seo.og_title.as_deref().unwrap_or(meta.title);
    let _ = write!(html, "<meta property=\"og:title\" content=\"{}\"/>", escape(og_title));
    if let Some(og_description) = seo.og_description.as_deref().or(seo.description.as_deref()) {
        let content = escape(og_description);
        let _ = write!(html, "<meta property=\"og:description\" content=\"{content}\"/>");
    }
    if let Some(og_image) = &seo.og_image {
        let content = escape(safe_url(og_image));
        let _ = write!(html, "<meta property=\"og:image\" content=\"{content}\"/>");
    }
    html.push_str("<meta property=\"og:type\" content=\"website\"/>");
    if let Some(site_name) = &opts.site_name {
        let content = escape(site_name);
        let _ = write!(html, "<meta property=\"og:site_name\" content=\"{content}\"/>");
    }

    if let Some(json_ld) = &seo.json_ld {
        if !json_ld.is_null() {
            if let Ok(payload) = serde_json::to_string(json_ld) {
                // `<` escaped so the payload cannot close the script element.
                let payload = payload.replace('<', "\\u003c");
                let _ =
                    write!(html, "<script type=\"application/ld+json\">{payload}</script>");
            }
        }
    }

    if !css.is_empty() {
        let _ = write!(html, "<style>{css}</style>");
    }
    html.push_str("</head><body><main>");
    html.push_str(body);
    html.push_str("</main></body></html>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn head_falls_back_to_the_page_title() {
        let registry = RendererRegistry::with_defaults();
        let tree = PageTree::default();
        let meta = PageMeta { title: "Home & Away", seo: &Value::Null };
        let page = registry.render_page(&tree, &meta, &RenderOptions::default());

        assert!(page.html.starts_with("<!DOCTYPE html><html lang=\"en\">"));
        assert!(page.html.contains("<title>Home &amp; Away</title>"));
        assert!(page.html.contains("<meta property=\"og:title\" content=\"Home &amp; Away\"/>"));
        assert!(page.html.contains("<meta property=\"og:type\" content=\"website\"/>"));
        assert!(!page.html.contains("<style>"));
        assert!(page.css.is_empty());
    }

    #[test]
    fn seo_keys_land_in_the_head_in_order() {
        let registry = RendererRegistry::with_defaults();
        let seo = json!({
            "description": "A \"fine\" page",
            "canonical": "https://example.com/home",
            "robots": "noindex",
            "ogImage": "https://example.com/og.png",
            "surprise": true,
        });
        let meta = PageMeta { title: "Home", seo: &seo };
        let opts = RenderOptions { lang: "de".to_owned(), site_name: Some("Acme".to_owned()) };
        let page = registry.render_page(&PageTree::default(), &meta, &opts);

        let description = page.html.find("name=\"description\"").unwrap();
        let robots = page.html.find("name=\"robots\"").unwrap();
        let canonical = page.html.find("rel=\"canonical\"").unwrap();
        let og_title = page.html.find("property=\"og:title\"").unwrap();
        assert!(description < robots && robots < canonical && canonical < og_title);

        assert!(page.html.contains("lang=\"de\""));
        assert!(page.html.contains("content=\"A &quot;fine&quot; page\""));
        assert!(page.html.contains("href=\"https://example.com/home\""));
        assert!(page.html.contains("og:description\" content=\"A &quot;fine&quot; page\""));
        assert!(page.html.contains("og:image\" content=\"https://example.com/og.png\""));
        assert!(page.html.contains("og:site_name\" content=\"Acme\""));
    }

    #[test]
    fn json_ld_cannot_close_its_script_tag() {
        let registry = RendererRegistry::with_defaults();
        let seo = json!({
            "jsonLd": { "@type": "WebSite", "name": "</script><script>alert(1)" },
        });
        let meta = PageMeta { title: "Home", seo: &seo };
        let page = registry.render_page(&PageTree::default(), &meta, &RenderOptions::default());

        assert!(page.html.contains("<script type=\"application/ld+json\">"));
        assert!(!page.html.contains("</script><script>alert(1)"));
        assert!(page.html.contains("\\u003c/script>"));
    }
}
