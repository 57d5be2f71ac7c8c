use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use super::{api, AppState};

pub async fn start_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/health", get(api::health_check))
        // Strategy document
        .route("/api/strategies/load", post(api::post_load))
        .route("/api/strategies", get(api::get_tree))
        .route("/api/strategies/catalogue", get(api::get_catalogue))
        .route("/api/strategies/rows", post(api::post_rows))
        .route("/api/strategies/param", put(api::put_param))
        // Diff and commit
        .route("/api/strategies/changes", get(api::get_changes))
        .route("/api/strategies/clear", post(api::post_clear))
        .route("/api/strategies/commit", post(api::post_commit))
        // Change history
        .route("/api/history", get(api::get_history))
        .route("/api/history/:entry/:record", delete(api::delete_history_record))
        .route("/api/history/dispatch", post(api::post_dispatch))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Console API server starting on http://localhost:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
