// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! Cloud collector binary: central sink terminating the fog->cloud channel.

use std::{env, sync::Arc};

use anyhow::Result;
use metermesh::{api::serve_cloud, config::CloudConfig, sink::CloudCollector};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = CloudConfig::from_env();
    let collector = Arc::new(CloudCollector::new());
    tracing::info!(port = config.port, "🚀 starting cloud collector");

    let shutdown = CancellationToken::new();
    {
        let token = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
                token.cancel();
            }
        });
    }

    serve_cloud(collector, config.port, shutdown).await
}
