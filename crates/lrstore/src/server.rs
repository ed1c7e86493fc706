//! HTTP server.
//!
//! Owns the listener and the storage handle for the lifetime of the
//! process. The storage handle is closed once in-flight requests drain.

use std::future::Future;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::api::{self, AppState};
use crate::config::Config;
use crate::error::Result;
use crate::storage::Storage;

/// The lrstore HTTP server.
#[derive(Debug)]
pub struct Server {
    addr: String,
    router: Router,
    storage: Storage,
}

impl Server {
    /// Create a server for the given configuration and storage handle.
    #[must_use]
    pub fn new(config: &Config, storage: Storage) -> Self {
        let router = api::router(AppState::new(&storage), &config.server.cors_origins);
        Self {
            addr: config.socket_addr(),
            router,
            storage,
        }
    }

    /// Get the configured socket address.
    #[must_use]
    pub fn socket_addr(&self) -> &str {
        &self.addr
    }

    /// Bind the configured address and serve until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound, serving fails, or
    /// the storage cannot be closed cleanly.
    pub async fn start(self) -> Result<()> {
        let listener = TcpListener::bind(&self.addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if serving fails or the storage cannot be closed
    /// cleanly.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;
        info!("lrstore listening on http://{}", local_addr);
        info!("Database: {}", self.storage.path().display());

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Server stopped, closing storage");
        self.storage.close().await
    }
}

/// Resolve when the process receives Ctrl+C or SIGTERM.
///
/// If a handler cannot be installed the corresponding branch never fires.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    #[test]
    fn test_socket_addr_from_config() {
        let mut config = Config::default();
        config.server.port = 8080;
        let server = Server::new(&config, Storage::open_in_memory().unwrap());
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }

    #[tokio::test]
    async fn test_serve_and_graceful_shutdown() {
        init_test_logging();

        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path().join("records.db")).unwrap();
        let server = Server::new(&Config::default(), storage);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve(listener, async {
            let _ = rx.await;
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains(r#"{"status":"ok"}"#));

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
