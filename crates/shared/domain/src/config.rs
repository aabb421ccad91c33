use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level API configuration shared across slices.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfigInner {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub database: DatabaseConfig,
    pub revalidation: RevalidationConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(flatten, default)]
    inner: Arc<ApiConfigInner>,
}

impl Deref for ApiConfig {
    type Target = ApiConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ApiConfig {
    fn deref_mut(&mut self) -> &mut ApiConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Storefront (public renderer) configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorefrontConfigInner {
    pub server: ServerConfig,
    pub api: ApiClientConfig,
    pub cache: CacheConfig,
    /// Inbound shared secret expected in the revalidation header.
    pub revalidate_key: String,
}

/// Arc-wrapped storefront config, mirroring [`ApiConfig`].
#[derive(Default, Debug, Clone, Deserialize)]
pub struct StorefrontConfig {
    #[serde(flatten, default)]
    inner: Arc<StorefrontConfigInner>,
}

impl Deref for StorefrontConfig {
    type Target = StorefrontConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for StorefrontConfig {
    fn deref_mut(&mut self) -> &mut StorefrontConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub ssl: Option<SslConfig>,
}

/// TLS certificate/key paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// `SurrealDB` connection configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub credentials: Option<DatabaseCredentials>,
}

/// `SurrealDB` root credentials (optional when using unauthenticated engines like mem://).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: String,
}

/// API security knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub jwt: JwtConfig,
    pub webhook: WebhookConfig,
    pub preview: PreviewConfig,
    /// Master key material for sealing billing secrets at rest. Any length;
    /// the actual cipher key is derived via HKDF.
    pub sealing_key: String,
}

/// Bearer JWT validation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: Option<String>,
    pub ttl_seconds: u64,
    pub clock_skew_seconds: u64,
}

/// Inbound webhook (Clerk/Svix) verification settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// `whsec_`-prefixed base64 signing secret.
    pub signing_secret: String,
    /// Accepted clock drift for the signed timestamp, in seconds.
    pub tolerance_seconds: i64,
}

/// Draft preview token settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub ttl_seconds: u64,
}

/// Storefront cache revalidation fan-out.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RevalidationConfig {
    pub enabled: bool,
    pub targets: Vec<RevalidateTarget>,
    pub timeout_seconds: u64,
    pub queue_capacity: usize,
}

/// One storefront endpoint to ping after content changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RevalidateTarget {
    pub base_url: String,
    pub key: String,
}

/// Storefront-side client for the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

/// Rendered-page cache sizing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: u64,
    pub ttl_seconds: u64,
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self { address: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 4460, ssl: None }
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        Self { cert: PathBuf::from("cert.pem"), key: PathBuf::from("key.pem") }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "mem://".to_owned(),
            namespace: "fhub".to_owned(),
            database: "core".to_owned(),
            credentials: Some(DatabaseCredentials::default()),
        }
    }
}

impl Default for DatabaseCredentials {
    fn default() -> Self {
        Self { username: "root".to_owned(), password: "root".to_owned() }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt: JwtConfig::default(),
            webhook: WebhookConfig::default(),
            preview: PreviewConfig::default(),
            sealing_key: "dev-only-change-me".to_owned(),
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "dev-only-change-me".to_owned(),
            issuer: "fhub".to_owned(),
            audience: None,
            ttl_seconds: 3600,
            clock_skew_seconds: 60,
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        // base64 payload decodes to "dev-only-webhook-secret"
        Self {
            signing_secret: "whsec_ZGV2LW9ubHktd2ViaG9vay1zZWNyZXQ=".to_owned(),
            tolerance_seconds: 300,
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self { ttl_seconds: 1800 }
    }
}

impl Default for RevalidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            targets: vec![RevalidateTarget::default()],
            timeout_seconds: 5,
            queue_capacity: 256,
        }
    }
}

impl Default for RevalidateTarget {
    fn default() -> Self {
        Self { base_url: "http://localhost:4461".to_owned(), key: "dev-revalidate-key".to_owned() }
    }
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self { base_url: "http://localhost:4460".to_owned(), timeout_seconds: 10 }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 1024, ttl_seconds: 300 }
    }
}

impl Default for StorefrontConfigInner {
    fn default() -> Self {
        Self {
            server: ServerConfig { port: 4461, ..ServerConfig::default() },
            api: ApiClientConfig::default(),
            cache: CacheConfig::default(),
            revalidate_key: "dev-revalidate-key".to_owned(),
        }
    }
}
