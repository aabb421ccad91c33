//! Built-in renderers, one per block kind.
//!
//! Each renderer owns the markup for its kind and nothing else: the root
//! element carries the node's class, user text goes through [`escape`], and
//! urls through [`safe_url`]. Only `embed` can emit raw HTML, and only when
//! an editor flagged the block as trusted.

use crate::css::css_class;
use crate::html::{escape, safe_url};
use crate::registry::{BlockRenderer, RenderContext, RendererRegistry};
use fhub_domain::blocks::{Block, BlockKind};
use pulldown_cmark::{html::push_html, Event, Options, Parser};
use std::fmt::Write;
use std::sync::Arc;

pub(crate) fn register_defaults(registry: &mut RendererRegistry) {
    registry.register("heading", Arc::new(Heading));
    registry.register("richText", Arc::new(RichText));
    registry.register("image", Arc::new(Image));
    registry.register("button", Arc::new(Button));
    registry.register("divider", Arc::new(Divider));
    registry.register("spacer", Arc::new(Spacer));
    registry.register("video", Arc::new(Video));
    registry.register("embed", Arc::new(Embed));
    registry.register("grid", Arc::new(Grid));
}

#[derive(Debug)]
struct Heading;

impl BlockRenderer for Heading {
    fn render(&self, _registry: &RendererRegistry, block: &Block, ctx: &mut RenderContext<'_>) {
        if let BlockKind::Heading { text, level } = &block.kind {
            let level = (*level).clamp(1, 6);
            let class = css_class(&block.id);
            let _ = write!(ctx.html, "<h{level} class=\"{class}\">{}</h{level}>", escape(text));
        }
    }
}

#[derive(Debug)]
struct RichText;

impl BlockRenderer for RichText {
    fn render(&self, _registry: &RendererRegistry, block: &Block, ctx: &mut RenderContext<'_>) {
        if let BlockKind::RichText { markdown } = &block.kind {
            let _ = write!(ctx.html, "<div class=\"{}\">", css_class(&block.id));
            push_markdown(ctx.html, markdown);
            ctx.html.push_str("</div>");
        }
    }
}

/// Markdown to HTML with raw HTML demoted to text, so markdown can never
/// smuggle markup past the escaper.
fn push_markdown(out: &mut String, markdown: &str) {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(html) => Event::Text(html),
        Event::InlineHtml(html) => Event::Text(html),
        other => other,
    });
    push_html(out, parser);
}

#[derive(Debug)]
struct Image;

impl BlockRenderer for Image {
    fn render(&self, _registry: &RendererRegistry, block: &Block, ctx: &mut RenderContext<'_>) {
        if let BlockKind::Image { src, alt, caption } = &block.kind {
            let class = css_class(&block.id);
            let src = escape(safe_url(src));
            let alt = escape(alt);
            match caption {
                Some(caption) => {
                    let _ = write!(
                        ctx.html,
                        "<figure class=\"{class}\"><img src=\"{src}\" alt=\"{alt}\"/>\
                         <figcaption>{}</figcaption></figure>",
                        escape(caption)
                    );
                }
                None => {
                    let _ =
                        write!(ctx.html, "<img class=\"{class}\" src=\"{src}\" alt=\"{alt}\"/>");
                }
            }
        }
    }
}

#[derive(Debug)]
struct Button;

impl BlockRenderer for Button {
    fn render(&self, _registry: &RendererRegistry, block: &Block, ctx: &mut RenderContext<'_>) {
        if let BlockKind::Button { label, href, new_tab } = &block.kind {
            let class = css_class(&block.id);
            let href = escape(safe_url(href));
            let target = if *new_tab { " target=\"_blank\" rel=\"noopener\"" } else { "" };
            let _ = write!(
                ctx.html,
                "<a class=\"{class}\" href=\"{href}\"{target}>{}</a>",
                escape(label)
            );
        }
    }
}

#[derive(Debug)]
struct Divider;

impl BlockRenderer for Divider {
    fn render(&self, _registry: &RendererRegistry, block: &Block, ctx: &mut RenderContext<'_>) {
        let _ = write!(ctx.html, "<hr class=\"{}\"/>", css_class(&block.id));
    }
}

#[derive(Debug)]
struct Spacer;

impl BlockRenderer for Spacer {
    fn render(&self, _registry: &RendererRegistry, block: &Block, ctx: &mut RenderContext<'_>) {
        if let BlockKind::Spacer { height } = &block.kind {
            let _ = write!(
                ctx.html,
                "<div class=\"{}\" style=\"height:{height}px\"></div>",
                css_class(&block.id)
            );
        }
    }
}

#[derive(Debug)]
struct Video;

impl BlockRenderer for Video {
    fn render(&self, _registry: &RendererRegistry, block: &Block, ctx: &mut RenderContext<'_>) {
        if let BlockKind::Video { src, autoplay, controls } = &block.kind {
            let class = css_class(&block.id);
            let src = escape(safe_url(src));
            let controls = if *controls { " controls" } else { "" };
            let autoplay = if *autoplay { " autoplay muted playsinline" } else { "" };
            let _ = write!(
                ctx.html,
                "<video class=\"{class}\" src=\"{src}\"{controls}{autoplay}></video>"
            );
        }
    }
}

#[derive(Debug)]
struct Embed;

impl BlockRenderer for Embed {
    fn render(&self, _registry: &RendererRegistry, block: &Block, ctx: &mut RenderContext<'_>) {
        if let BlockKind::Embed { html, trusted } = &block.kind {
            let class = css_class(&block.id);
            if *trusted {
                let _ = write!(ctx.html, "<div class=\"{class}\">{html}</div>");
            } else {
                let _ = write!(ctx.html, "<div class=\"{class}\">{}</div>", escape(html));
            }
        }
    }
}

#[derive(Debug)]
struct Grid;

impl BlockRenderer for Grid {
    fn render(&self, registry: &RendererRegistry, block: &Block, ctx: &mut RenderContext<'_>) {
        if let BlockKind::Grid { columns, blocks } = &block.kind {
            let columns = (*columns).clamp(1, 12);
            let _ = write!(
                ctx.html,
                "<div class=\"{}\" style=\"display:grid;\
                 grid-template-columns:repeat({columns},minmax(0,1fr))\">",
                css_class(&block.id)
            );
            for child in blocks {
                registry.render_block(child, ctx);
            }
            ctx.html.push_str("</div>");
        }
    }
}
