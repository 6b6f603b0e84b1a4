//! Fog Node HTTP Surface
//!
//! `GET /public-key` publishes the fog's confidentiality public key;
//! `POST /exchange` is the inbound meter hop. The transport layer is
//! deliberately thin: all protocol decisions live in [`FogNode`].

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::errors::Rejection;
use crate::protocol::MeterEnvelope;
use crate::relay::FogNode;

#[derive(Clone)]
struct FogState {
    node: Arc<FogNode>,
}

/// Build the fog node's router.
pub fn fog_router(node: Arc<FogNode>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/public-key", get(public_key_handler))
        .route("/exchange", post(exchange_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(FogState { node })
}

/// Bind and serve until `shutdown` fires.
pub async fn serve_fog(
    node: Arc<FogNode>,
    port: u16,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("fog node listening on {}", addr);

    axum::serve(listener, fog_router(node))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    Ok(())
}

async fn root_handler() -> impl IntoResponse {
    Json(json!({ "message": "Fog node running and aggregating data" }))
}

async fn public_key_handler(State(state): State<FogState>) -> impl IntoResponse {
    Json(json!({ "fog_public": state.node.public_key_b64() }))
}

async fn exchange_handler(
    State(state): State<FogState>,
    Json(envelope): Json<MeterEnvelope>,
) -> Result<impl IntoResponse, Rejection> {
    match state.node.handle_exchange(&envelope).await {
        Ok(_) => Ok(Json(json!({ "status": "ok" }))),
        Err(e) => {
            tracing::warn!(error = %e, "rejected meter envelope");
            Err(Rejection(e))
        }
    }
}
