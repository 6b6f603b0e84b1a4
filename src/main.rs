// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! Fog node binary: regional relay between smart meters and the cloud
//! collector.

use std::{env, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use metermesh::{
    api::serve_fog,
    config::FogConfig,
    protocol::{decode_fixed, CloudPublicKey},
    relay::FogNode,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = FogConfig::from_env();
    tracing::info!(
        fog_id = %config.fog_id,
        port = config.port,
        cloud_url = %config.cloud_url,
        "🚀 starting fog node"
    );

    // The fog cannot seal upstream envelopes without the sink's key, so
    // startup waits (bounded) for the cloud to come up.
    let cloud_public = fetch_cloud_public(&config).await?;
    let node = Arc::new(FogNode::new(config.clone(), cloud_public)?);

    let shutdown = CancellationToken::new();

    let aggregator = {
        let node = Arc::clone(&node);
        let token = shutdown.clone();
        tokio::spawn(async move {
            node.run_aggregator(token).await;
        })
    };

    {
        let token = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
                token.cancel();
            }
        });
    }

    serve_fog(Arc::clone(&node), config.port, shutdown).await?;

    // Let the aggregation task finish its in-flight tick before exit.
    aggregator.await.context("aggregation task panicked")?;
    Ok(())
}

async fn fetch_cloud_public(config: &FogConfig) -> Result<[u8; 32]> {
    let client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;
    let url = format!("{}/public-key", config.cloud_url);

    for attempt in 1..=5u32 {
        match client.get(&url).send().await {
            Ok(resp) => {
                let body: CloudPublicKey = resp
                    .json()
                    .await
                    .context("decoding cloud public key response")?;
                let bytes = decode_fixed::<32>("cloud_public", &body.cloud_public)
                    .map_err(|e| anyhow::anyhow!("cloud published a malformed key: {}", e))?;
                tracing::info!("fetched cloud public key");
                return Ok(bytes);
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "cloud not reachable yet");
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
    bail!("could not fetch cloud public key from {}", url);
}
