//! Signal Pipeline Example
//!
//! Records points, metrics and a trace from several producer threads and
//! ships them to an ingestion service.
//!
//! Run with: cargo run --bin signal_pipeline [config_path]
//!
//! Without a config file the token comes from `SIGNAL_SDK_TOKEN` and the
//! service URL from `SIGNAL_SDK_BASE_URL`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use client::{Client, ClientConfig, Properties, Signal};
use config_loader::ConfigLoader;
use observability::{LogFormat, ObservabilityConfig};
use tracing::info;

const PRODUCERS: usize = 4;
const SIGNALS_PER_PRODUCER: usize = 30;

fn main() -> Result<()> {
    observability::init_with_config(ObservabilityConfig {
        log_format: LogFormat::Pretty,
        metrics_port: None,
        default_log_level: "info,client=debug".to_string(),
    })?;

    let config = load_config()?;
    info!(
        base_url = %config.base_url,
        max_batch_size = config.batching.max_batch_size,
        "Starting signal pipeline demo"
    );

    let client = Arc::new(Client::new(config).context("failed to create client")?);

    // ==== Stage 1: concurrent producers ====
    let producers: Vec<_> = (0..PRODUCERS)
        .map(|id| {
            let client = Arc::clone(&client);
            std::thread::spawn(move || produce(&client, id))
        })
        .collect();

    for producer in producers {
        producer
            .join()
            .map_err(|_| anyhow::anyhow!("producer thread panicked"))??;
    }

    // ==== Stage 2: a trace grouping related signals ====
    let steps = vec![
        Signal::new("sq.demo.checkout.cart", serde_json::json!({"items": 3})),
        Signal::new("sq.demo.checkout.pay", serde_json::json!({"amount": 42.5})),
    ];
    client.trace(
        steps,
        Properties::new()
            .actor(serde_json::json!({"ip_addresses": ["127.0.0.1"]}))
            .source("signal_pipeline"),
    )?;

    // ==== Stage 3: soft flush, then close ====
    client.flush(true)?;
    info!(pending = client.pending(), "Soft flush done");

    client.close();

    let metrics = client.metrics();
    info!(
        submitted = metrics.submitted,
        delivered = metrics.delivered,
        failed = metrics.failed(),
        "Demo finished"
    );

    Ok(())
}

fn produce(client: &Client, id: usize) -> client::Result<()> {
    for i in 0..SIGNALS_PER_PRODUCER {
        let properties = Properties::new()
            .source(format!("producer-{id}"))
            .time(chrono::Utc::now());

        if i % 3 == 0 {
            client.metric("sq.demo.latency_ms", (i * 7 % 50) as u64, properties)?;
        } else {
            client.point(
                "sq.demo.request",
                serde_json::json!({"producer": id, "seq": i}),
                properties,
            )?;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    Ok(())
}

fn load_config() -> Result<ClientConfig> {
    if let Some(path) = std::env::args().nth(1) {
        info!(path = %path, "Loading client config");
        return ConfigLoader::load_from_path(Path::new(&path)).context("failed to load config");
    }

    let token = std::env::var("SIGNAL_SDK_TOKEN").unwrap_or_else(|_| "demo-token".to_string());
    let mut config = ClientConfig::new(token)
        .with_app_name("signal-demo")
        .with_max_batch_size(25)
        .with_linger_time(Duration::from_secs(5));

    if let Ok(base_url) = std::env::var("SIGNAL_SDK_BASE_URL") {
        config = config.with_base_url(base_url);
    }

    config_loader::validate(&config)?;
    Ok(config)
}
