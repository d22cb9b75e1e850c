//! # HTTP Server
//!
//! Thin axum glue over [`GuessService`].
//!
//! | Route | Method | Handler |
//! |-------|--------|---------|
//! | `/` | GET | `index.html` from the content root |
//! | `/static/*` | GET | files under `static/` |
//! | `/samples/*` | GET | files under `samples/` |
//! | `/upload` | POST | raw image body, returns `{"imageID", "width", "height"}` |
//! | `/resized` | GET | JPEG of the resized picture |
//! | `/guess` | GET | `{"answer": ...}` from the model |
//! | `/sample-list` | GET | JSON array of sample paths for the gallery |

pub mod handlers;
pub mod params;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::service::GuessService;

pub use handlers::{ApiError, PrettyJson};
pub use params::ResizeQuery;

/// Builds the application router.
pub fn router(service: Arc<GuessService>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/upload", post(handlers::upload))
        .route("/resized", get(handlers::resized))
        .route("/guess", get(handlers::guess))
        .route("/sample-list", get(handlers::sample_list))
        .route_service("/", ServeFile::new(config.index_file()))
        .nest_service("/static", ServeDir::new(config.static_dir()))
        .nest_service("/samples", ServeDir::new(config.samples_dir()))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Serves until Ctrl-C, then drains in-flight requests.
pub async fn serve(listener: TcpListener, app: Router) -> anyhow::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on {}", addr);
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            warn!(error = %e, "Unable to listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
