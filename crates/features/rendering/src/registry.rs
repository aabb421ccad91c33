//! Block kind → renderer dispatch.
//!
//! The registry is the server-side analog of the builder client's block
//! component map: one renderer per kind name, replaceable at startup so a
//! deployment can swap or extend the built-in set without forking the walk
//! logic. Unknown kinds degrade to an HTML comment instead of failing the
//! page.

use crate::css::StylesheetBuilder;
use crate::html::escape;
use crate::renderers;
use fhub_domain::blocks::Block;
use std::collections::HashMap;
use std::fmt;
use std::fmt::Write;
use std::sync::Arc;

/// Mutable output of a render pass, threaded through every renderer.
#[derive(Debug)]
pub struct RenderContext<'a> {
    pub html: &'a mut String,
    pub css: &'a mut StylesheetBuilder,
}

/// Renders one block kind into the context.
///
/// Renderers receive the registry so recursive kinds (grids) can dispatch
/// their children through whatever set is actually registered.
pub trait BlockRenderer: Send + Sync {
    fn render(&self, registry: &RendererRegistry, block: &Block, ctx: &mut RenderContext<'_>);
}

/// Kind-name keyed renderer set.
#[derive(Default, Clone)]
pub struct RendererRegistry {
    renderers: HashMap<&'static str, Arc<dyn BlockRenderer>>,
}

impl RendererRegistry {
    /// An empty registry. Every block renders as a comment until renderers
    /// are registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry covering every built-in block kind.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        renderers::register_defaults(&mut registry);
        registry
    }

    /// Installs a renderer for a kind name, replacing any previous one.
    pub fn register(&mut self, kind: &'static str, renderer: Arc<dyn BlockRenderer>) {
        self.renderers.insert(kind, renderer);
    }

    #[must_use]
    pub fn has(&self, kind: &str) -> bool {
        self.renderers.contains_key(kind)
    }

    /// Renders one block, registering its styles either way.
    pub fn render_block(&self, block: &Block, ctx: &mut RenderContext<'_>) {
        ctx.css.push(&block.id, &block.styles);
        match self.renderers.get(block.kind.name()) {
            Some(renderer) => renderer.render(self, block, ctx),
            None => {
                tracing::warn!(
                    kind = block.kind.name(),
                    block = %block.id,
                    "No renderer registered for block kind"
                );
                let name = escape(block.kind.name());
                let _ = write!(ctx.html, "<!-- unrenderable block: {name} -->");
            }
        }
    }
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&str> = self.renderers.keys().copied().collect();
        kinds.sort_unstable();
        f.debug_struct("RendererRegistry").field("kinds", &kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhub_domain::blocks::{BlockKind, Styles};

    fn block(kind: BlockKind) -> Block {
        Block { id: "b1".to_owned(), styles: Styles::default(), kind }
    }

    #[test]
    fn defaults_cover_every_kind() {
        let registry = RendererRegistry::with_defaults();
        for kind in [
            "heading", "richText", "image", "button", "divider", "spacer", "video", "embed",
            "grid",
        ] {
            assert!(registry.has(kind), "missing renderer for {kind}");
        }
    }

    #[test]
    fn unregistered_kinds_render_a_comment() {
        let registry = RendererRegistry::new();
        let mut html = String::new();
        let mut css = StylesheetBuilder::new();
        let mut ctx = RenderContext { html: &mut html, css: &mut css };
        registry.render_block(&block(BlockKind::Divider {}), &mut ctx);
        assert_eq!(html, "<!-- unrenderable block: divider -->");
    }

    #[test]
    fn register_replaces_the_default() {
        struct Stub;
        impl BlockRenderer for Stub {
            fn render(&self, _: &RendererRegistry, _: &Block, ctx: &mut RenderContext<'_>) {
                ctx.html.push_str("<hr data-stub/>");
            }
        }

        let mut registry = RendererRegistry::with_defaults();
        registry.register("divider", Arc::new(Stub));

        let mut html = String::new();
        let mut css = StylesheetBuilder::new();
        let mut ctx = RenderContext { html: &mut html, css: &mut css };
        registry.render_block(&block(BlockKind::Divider {}), &mut ctx);
        assert_eq!(html, "<hr data-stub/>");
    }
}
