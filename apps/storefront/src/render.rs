//! Document composition: site chrome around the page tree.

use fhub_content::models::Layout;
use fhub_domain::blocks::PageTree;
use fhub_pages::models::RenderablePage;
use fhub_rendering::{PageMeta, RenderOptions, RenderedPage, RendererRegistry};
use fhub_tenancy::models::Site;

/// Renders a page with the site's header and footer layouts wrapped around
/// it. Layout sections share the page's stylesheet and breakpoints, so the
/// result is one coherent document.
pub(crate) fn compose(
    registry: &RendererRegistry,
    site: &Site,
    page: &RenderablePage,
    header: Option<&Layout>,
    footer: Option<&Layout>,
) -> RenderedPage {
    let section_count = page.tree.sections.len()
        + header.map_or(0, |layout| layout.sections.len())
        + footer.map_or(0, |layout| layout.sections.len());
    let mut sections = Vec::with_capacity(section_count);
    if let Some(header) = header {
        sections.extend(header.sections.iter().cloned());
    }
    sections.extend(page.tree.sections.iter().cloned());
    if let Some(footer) = footer {
        sections.extend(footer.sections.iter().cloned());
    }

    let tree = PageTree { sections };
    let meta = PageMeta { title: &page.title, seo: &page.seo };
    let opts = RenderOptions { lang: "en".to_owned(), site_name: Some(site.name.clone()) };
    registry.render_page(&tree, &meta, &opts)
}

/// The storefront's catch-all page for unknown hosts, paths, and rejected
/// previews.
#[must_use]
pub(crate) fn not_found_page() -> String {
    concat!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"/>",
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"/>",
        "<meta name=\"robots\" content=\"noindex\"/>",
        "<title>Page not found</title>",
        "<style>body{font-family:system-ui,sans-serif;display:flex;align-items:center;",
        "justify-content:center;min-height:100vh;margin:0;color:#101828}",
        "main{text-align:center}h1{font-size:4rem;margin:0}</style>",
        "</head><body><main><h1>404</h1><p>This page does not exist.</p></main>",
        "</body></html>"
    )
    .to_owned()
}

/// Served when the platform API cannot be reached.
#[must_use]
pub(crate) fn unavailable_page() -> String {
    concat!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"/>",
        "<meta name=\"robots\" content=\"noindex\"/>",
        "<title>Temporarily unavailable</title></head>",
        "<body><main><h1>503</h1><p>Please try again in a moment.</p></main>",
        "</body></html>"
    )
    .to_owned()
}
