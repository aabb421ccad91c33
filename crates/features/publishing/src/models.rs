//! API models for manual revalidation.

use fhub_derive::api_model;

/// Payload for a manual revalidation request. An empty (or omitted) path list
/// invalidates the whole site.
#[api_model]
#[derive(Default)]
pub struct RevalidateRequest {
    #[serde(default)]
    pub paths: Vec<String>,
}
