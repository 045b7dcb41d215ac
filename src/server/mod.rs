use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::storage::RegistryStore;

pub mod routes;

/// Server state
pub struct AppState {
    pub store: Arc<RegistryStore>,
}

/// Build the registry router over a shared store
pub fn router(store: Arc<RegistryStore>) -> Router {
    let state = Arc::new(AppState { store });

    Router::new()
        .route("/api/registry", post(routes::handle_request))
        .route("/api/info/user", get(routes::get_user))
        .route("/api/info/model", get(routes::get_model))
        .route("/api/stats", get(routes::get_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(addr: &str, store: Arc<RegistryStore>) -> anyhow::Result<()> {
    let app = router(store);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Starting server on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
