//! Cloud Collector HTTP Surface
//!
//! `GET /public-key` publishes the cloud's confidentiality public key;
//! `POST /data` is the inbound fog hop.

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
use crate::protocol::AggregateEnvelope;
use crate::sink::CloudCollector;

#[derive(Clone)]
struct CloudState {
    collector: Arc<CloudCollector>,
}

/// Build the cloud collector's router.
pub fn cloud_router(collector: Arc<CloudCollector>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/public-key", get(public_key_handler))
        .route("/data", post(data_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(CloudState { collector })
}

/// Bind and serve until `shutdown` fires.
pub async fn serve_cloud(
    collector: Arc<CloudCollector>,
    port: u16,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("cloud collector listening on {}", addr);

    axum::serve(listener, cloud_router(collector))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    Ok(())
}

async fn root_handler() -> impl IntoResponse {
    Json(json!({ "message": "Cloud collector running" }))
}

async fn public_key_handler(State(state): State<CloudState>) -> impl IntoResponse {
    Json(json!({ "cloud_public": state.collector.public_key_b64() }))
}

async fn data_handler(
    State(state): State<CloudState>,
    Json(envelope): Json<AggregateEnvelope>,
) -> Result<impl IntoResponse, Rejection> {
    match state.collector.handle_data(&envelope) {
        Ok(_) => Ok(Json(json!({ "status": "accepted" }))),
        Err(e) => {
            tracing::warn!(error = %e, "rejected aggregate envelope");
            Err(Rejection(e))
        }
    }
}
