//! Thin client for the platform API.
//!
//! Only public endpoints are used: host resolution, published pages, drafts
//! (token-gated), and layouts. Lookups that can legitimately miss return
//! `Ok(None)` so handlers can fall through to the 404 page without matching
//! on status codes.

use crate::error::{StorefrontError, StorefrontErrorExt};
use fhub_content::models::{Layout, LayoutKind};
use fhub_domain::config::ApiClientConfig;
use fhub_pages::models::RenderablePage;
use fhub_tenancy::models::Site;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Outbound HTTP client with the API base url baked in.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// # Errors
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(config: &ApiClientConfig) -> Result<Self, StorefrontError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Building the API client")?;
        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_owned() })
    }

    /// Looks up the site serving a request host.
    ///
    /// # Errors
    /// Fails on transport errors or non-404 API errors.
    pub async fn resolve_site(&self, host: &str) -> Result<Option<Site>, StorefrontError> {
        let url = format!("{}/sites/resolve", self.base_url);
        let response = self
            .http
            .get(url)
            .query(&[("host", host)])
            .send()
            .await
            .context("Resolving the request host")?;
        optional(response).await
    }

    /// The live snapshot at a path, if one is published.
    ///
    /// # Errors
    /// Fails on transport errors or non-404 API errors.
    pub async fn published_page(
        &self,
        site_id: &str,
        path: &str,
    ) -> Result<Option<RenderablePage>, StorefrontError> {
        let url = format!("{}/sites/{site_id}/pages/published", self.base_url);
        let response = self
            .http
            .get(url)
            .query(&[("path", path)])
            .send()
            .await
            .context("Fetching the published page")?;
        optional(response).await
    }

    /// The draft at a path, gated by a preview token.
    ///
    /// # Errors
    /// Fails on transport errors and on any rejection, including an invalid
    /// or mismatched token; the caller decides whether to fall back.
    pub async fn draft_page(
        &self,
        site_id: &str,
        path: &str,
        token: &str,
    ) -> Result<RenderablePage, StorefrontError> {
        let url = format!("{}/sites/{site_id}/pages/draft", self.base_url);
        let response = self
            .http
            .get(url)
            .query(&[("path", path), ("token", token)])
            .send()
            .await
            .context("Fetching the draft page")?;
        let response = success(response, "Draft lookup")?;
        response.json().await.context("Decoding the draft page")
    }

    /// The header or footer layout for a site, if any is stored.
    ///
    /// # Errors
    /// Fails on transport errors or non-404 API errors.
    pub async fn layout(
        &self,
        site_id: &str,
        kind: LayoutKind,
    ) -> Result<Option<Layout>, StorefrontError> {
        let url = format!("{}/sites/{site_id}/layouts/{}", self.base_url, kind.as_str());
        let response = self.http.get(url).send().await.context("Fetching a layout")?;
        optional(response).await
    }
}

fn success(response: Response, what: &'static str) -> Result<Response, StorefrontError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(StorefrontError::Api { status: status.as_u16(), context: Some(what.into()) })
    }
}

async fn optional<T: DeserializeOwned>(response: Response) -> Result<Option<T>, StorefrontError> {
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    let response = success(response, "API lookup")?;
    let body = response.json().await.context("Decoding an API response")?;
    Ok(Some(body))
}
