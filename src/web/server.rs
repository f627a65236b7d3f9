//! Web server
//!
//! | Path | Description |
//! |------|-------------|
//! | `/current.mp3` | Blob in the current slot |
//! | `/api/status` | Rotation, presence and generation status |
//! | `/ws` | Listener presence WebSocket |
//! | anything else | Static files from the configured web directory |

use axum::{routing::get, Router};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::config::ServerConfig;
use crate::generation::GenerationClient;
use crate::presence::Presence;
use crate::rotation::RotationHandle;
use crate::slots::SharedSlotStore;
use crate::web::{handlers, websocket};

/// Shared state passed to all request handlers
pub struct AppState {
    pub rotation: RotationHandle,
    pub store: SharedSlotStore,
    pub presence: Arc<Presence>,
    pub generation: GenerationClient,
}

/// Web server for the station
pub struct WebServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl WebServer {
    pub fn new(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/current.mp3", get(handlers::get_current_audio))
            .route("/api/status", get(handlers::get_status))
            .route("/ws", get(websocket::ws_handler))
            .fallback_service(ServeDir::new(&self.config.web_dir))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Bind the configured address
    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);
        Ok(listener)
    }

    /// Serve on `listener` until `shutdown` resolves
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown)
            .await
    }
}
