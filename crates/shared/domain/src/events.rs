//! Cross-slice event payloads carried by the event bus.

use serde::{Deserialize, Serialize};

/// Emitted after any operation that changes what the storefront renders:
/// page publish/unpublish, post/menu/layout mutations, site updates.
///
/// An empty `paths` list means "everything under this site changed".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContentChanged {
    pub site_id: String,
    #[serde(default)]
    pub paths: Vec<String>,
}

impl ContentChanged {
    /// Change scoped to specific storefront paths.
    pub fn paths(site_id: impl Into<String>, paths: Vec<String>) -> Self {
        Self { site_id: site_id.into(), paths }
    }

    /// Change invalidating the whole site.
    pub fn site_wide(site_id: impl Into<String>) -> Self {
        Self { site_id: site_id.into(), paths: Vec::new() }
    }

    pub fn is_site_wide(&self) -> bool {
        self.paths.is_empty()
    }
}
