use crate::app::App;
use crate::config::Config;
use crate::{proxy, Result};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// A bound, not yet running proxy server.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(config: &Config) -> Result<Self> {
        let app = App::from_config(config)?;
        Self::bind(Arc::new(app), &config.bind_address()).await
    }

    /// Binds `addr` (port 0 picks a free port) and prepares the router.
    pub async fn bind(app: Arc<App>, addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            e
        })?;
        let local = listener.local_addr()?;

        tracing::info!("Listening on {} ({})", local, proxy::PROXY_PATH);

        Ok(Self {
            port: local.port(),
            listener,
            router: proxy::router(app),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}
