//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own catalog, users and ratings.

use super::constants::*;
use super::fixtures::{create_test_layout, TestLayout};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use vgs_server::server::{make_app, ServerConfig};
use vgs_server::{Catalog, FileUserStore, Library, RequestsLoggingLevel};

/// Test server instance with an isolated temporary layout
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Library shared with the server, for direct inspection in tests
    pub library: Arc<Library>,

    /// Directory holding the per-user ratings files
    pub ratings_dir: PathBuf,

    // Private fields - keep resources alive until drop
    _layout: TestLayout,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if the layout cannot be created, the port cannot be bound
    /// or the server doesn't become ready within timeout.
    pub async fn spawn() -> Self {
        let layout = create_test_layout().expect("Failed to create test layout");

        let catalog = Catalog::from_file(&layout.metadata_path, Some(TEST_RANDOM_SEED))
            .expect("Failed to load test catalog");
        let user_store =
            FileUserStore::load(&layout.users_path).expect("Failed to load test users");
        let library = Arc::new(Library::new(
            Arc::new(catalog),
            &layout.ratings_dir,
            TEST_BACKUP_COUNT,
        ));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port,
            ..Default::default()
        };
        let app = make_app(config, library.clone(), Arc::new(user_store));

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            library,
            ratings_dir: layout.ratings_dir.clone(),
            _layout: layout,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    pub fn ratings_path(&self, username: &str) -> PathBuf {
        self.ratings_dir.join(username).join("ratings.json")
    }

    /// Waits for the server to become ready by polling the status page
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
