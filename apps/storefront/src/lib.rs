//! # FunnelHub Storefront
//!
//! The public-facing renderer. Each request's `Host` header is resolved to a
//! site through the platform API, the page tree for the path is rendered to a
//! full HTML document, and the result is cached in process until the platform
//! revalidates it over HTTP.
//!
//! ## Example
//! ```no_run
//! use fhub_storefront::Storefront;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Storefront::builder()
//!         .port(4461)
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```

mod api;
mod cache;
mod error;
mod handlers;
mod render;
pub mod router;
mod state;

pub use api::ApiClient;
pub use cache::{PageCache, SiteCache};
pub use error::{StorefrontError, StorefrontErrorExt};
pub use state::{AppState, AppStateInner};

use anyhow::{Context, Result};
use axum_server::Handle;
use fhub_domain::config::StorefrontConfig;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

/// A fluent builder for configuring and initializing the [`Storefront`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct StorefrontBuilder {
    cfg: StorefrontConfig,
}

impl StorefrontBuilder {
    /// Set up the storefront's configuration.
    pub fn config(mut self, cfg: StorefrontConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.server.port = port;
        self
    }

    fn validate_ssl_config(&self) -> Result<()> {
        if let Some(ssl) = &self.cfg.server.ssl {
            if !ssl.cert.exists() {
                anyhow::bail!("SSL certificate not found at: {}", ssl.cert.display());
            }
            if !ssl.key.exists() {
                anyhow::bail!("SSL key not found at: {}", ssl.key.display());
            }
        }
        Ok(())
    }

    /// Consumes the builder and initializes the storefront.
    ///
    /// Unlike the platform server there is no database to connect; the
    /// storefront only needs its API client and caches, so this is
    /// synchronous.
    ///
    /// # Errors
    /// Returns an error if the SSL files are missing or the API client
    /// cannot be constructed.
    pub fn build(self) -> Result<Storefront> {
        self.validate_ssl_config()?;

        let address = SocketAddr::new(self.cfg.server.address, self.cfg.server.port);
        let state = AppState::new(self.cfg).context("Failed to initialize storefront state")?;

        Ok(Storefront { address, state })
    }
}

/// A fully initialized storefront instance ready to run.
#[must_use = "call .run().await to start serving"]
#[derive(Debug)]
pub struct Storefront {
    address: SocketAddr,
    state: AppState,
}

impl Storefront {
    /// Returns a new [`StorefrontBuilder`] to configure the storefront.
    pub fn builder() -> StorefrontBuilder {
        StorefrontBuilder::default()
    }

    /// Starts the storefront and runs until the shutdown signal is received.
    ///
    /// # Errors
    /// Returns an error if the storefront fails to bind to the configured
    /// address or if SSL/TLS setup fails.
    pub async fn run(self) -> Result<()> {
        info!(
            address = %self.address,
            ssl = self.state.config.server.ssl.is_some(),
            "Starting storefront"
        );

        let app = router::init(self.state.clone());

        let handle = Handle::<SocketAddr>::new();
        let shutdown_handle = handle.clone();

        // Spawn shutdown signal listener
        tokio::spawn(async move {
            if let Err(e) = shutdown_signal().await {
                error!("Error while waiting for shutdown signal: {e}");
                return;
            }
            info!("Shutdown signal received, starting graceful shutdown...");
            shutdown_handle.graceful_shutdown(Some(std::time::Duration::from_secs(30)));
        });

        if let Some(ssl_config) = &self.state.config.server.ssl {
            info!("Starting HTTPS storefront on https://{}", self.address);

            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                &ssl_config.cert,
                &ssl_config.key,
            )
            .await
            .context("Failed to load SSL/TLS certificates")?;

            axum_server::bind_rustls(self.address, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("HTTPS storefront failed")?;
        } else {
            info!("Starting HTTP storefront on http://{}", self.address);

            axum_server::bind(self.address)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("HTTP storefront failed")?;
        }

        info!("Storefront shutdown complete");
        Ok(())
    }

    /// Returns a reference to the application state.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }
}

/// Listens for shutdown signals (Ctrl+C, SIGTERM).
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => {
            res.context("Ctrl+C signal received")?;
        },
        res = terminate => {
            res.context("SIGTERM signal received")?;
        },
    }

    Ok(())
}
