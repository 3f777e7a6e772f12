//! cardlink: short links that render a social preview card before
//! forwarding to their destination.

pub mod config;
pub mod error;
pub mod flash;
pub mod handlers;
pub mod short_id;
pub mod store;
pub mod templates;
pub mod upload;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use handlers::AppState;
pub use store::{PreviewRecord, RecordStore};

// Room for the text fields next to the image.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Builds the full router over the given state.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route(
            "/",
            get(handlers::index_handler).post(handlers::create_handler),
        )
        .route("/success/{short_id}", get(handlers::success_handler))
        .route("/s/{short_id}", get(handlers::short_redirect_handler))
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .nest_service("/src", ServeDir::new(&state.config.src_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Creates the upload and static directories if they are missing.
pub async fn bootstrap(config: &Config) -> std::io::Result<()> {
    for dir in [&config.upload_dir, &config.src_dir] {
        if !dir.exists() {
            tracing::info!("Creating {}", dir.display());
        }
        tokio::fs::create_dir_all(dir).await?;
    }
    Ok(())
}
