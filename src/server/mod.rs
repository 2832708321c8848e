use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::analyzer::ContextSynthesizer;
use crate::embedding::EmbeddingIndex;
use crate::linker::EntityLinker;
use crate::storage::StoreHandle;

pub mod routes;

/// Server state; every member is shareable across blocking tasks
pub struct AppState {
    pub store: StoreHandle,
    pub synthesizer: Arc<ContextSynthesizer>,
    pub linker: Arc<EntityLinker>,
    pub index: Arc<EmbeddingIndex>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/analyze", post(routes::analyze))
        .route("/snippets", post(routes::save_snippet))
        .route("/snippets/{id}/links", post(routes::link_snippet))
        .route("/similar", get(routes::similar))
        .route("/stats", get(routes::stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(host: &str, port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let app = router(state);

    tracing::info!("Starting server on {}", addr);
    println!("🌍 Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
