use crate::core::schema::ReportSchema;
use crate::utils::error::Result;
use async_graphql::http::GraphiQLSource;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub const GRAPHQL_PATH: &str = "/graphql";

async fn graphql_handler(
    State(schema): State<ReportSchema>,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    Json(schema.execute(request).await)
}

async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST 只接受 `application/json`，瀏覽器的 simple request 無法觸發查詢
pub fn router(schema: ReportSchema) -> Router {
    Router::new()
        .route(GRAPHQL_PATH, get(graphiql).post(graphql_handler))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(schema)
}

pub async fn serve(addr: SocketAddr, schema: ReportSchema) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!("🚀 Server ready at http://{}{}", local_addr, GRAPHQL_PATH);

    axum::serve(listener, router(schema)).await?;
    Ok(())
}
