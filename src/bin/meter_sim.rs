// Copyright (c) 2026 MeterMesh
// SPDX-License-Identifier: BUSL-1.1
//! Meter simulator binary: runs N smart meters as concurrent tasks, each
//! with its own per-run identity, sending a signed and sealed reading every
//! interval.

use std::{env, time::Duration};

use anyhow::Result;
use metermesh::{
    config::MeterSimConfig,
    meter::{fetch_fog_public, Meter},
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = MeterSimConfig::from_env();
    let client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;

    let fog_public = fetch_fog_public(&client, &config.fog_url).await?;
    tracing::info!(
        num_meters = config.num_meters,
        fog_url = %config.fog_url,
        "🚀 starting simulated meters"
    );

    let shutdown = CancellationToken::new();
    let mut handles = Vec::with_capacity(config.num_meters);

    for i in 1..=config.num_meters {
        let meter = match Meter::new(format!("M-{:03}", i), &fog_public) {
            Ok(m) => m,
            Err(e) => anyhow::bail!("meter key setup failed: {}", e),
        };
        let client = client.clone();
        let fog_url = config.fog_url.clone();
        let interval = config.send_interval;
        let token = shutdown.clone();

        handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => meter.send_reading(&client, &fog_url).await,
                }
            }
        }));

        // Small stagger so the meters don't all send at once.
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    shutdown.cancel();
    for handle in handles {
        let _ = handle.await;
    }
    Ok(())
}
