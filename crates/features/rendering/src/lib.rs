//! # Rendering
//!
//! Server-side HTML renderer for page trees. A [`RendererRegistry`] maps
//! block kind names to [`BlockRenderer`] trait objects, mirroring the builder
//! client's block component map, and walks sections → containers → blocks to
//! produce a complete document plus a per-breakpoint stylesheet.
//!
//! The pipeline never fails: unknown kinds degrade to HTML comments, bad
//! style values are stripped, and all user text is escaped on the way out.
//! Output is byte-stable for a given tree, which is what lets the storefront
//! cache rendered pages by content.

mod css;
mod document;
mod html;
mod registry;
mod renderers;

pub use crate::css::{css_class, StylesheetBuilder};
pub use crate::document::{PageMeta, RenderOptions, RenderedPage};
pub use crate::html::{escape, safe_url};
pub use crate::registry::{BlockRenderer, RenderContext, RendererRegistry};
