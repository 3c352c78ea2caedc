mod config;
mod deepseek_service;
mod document_processor;
mod handlers;
mod session;
#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use axum::{extract::DefaultBodyLimit, routing::post, Router};
use config::ServerConfig;
use handlers::{ask_question, not_found, upload_pdf};
use session::AppState;
use tower_http::cors::CorsLayer;

fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .route("/upload", post(upload_pdf))
        .route("/ask", post(ask_question))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment variables and logging
    dotenv::dotenv().ok();
    env_logger::init();

    let config = ServerConfig::from_env()?;
    let port = config.port;
    let state = AppState::new(config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
