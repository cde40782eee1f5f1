//! Handle a single bucket notification document, then exit. Reads the document from the path
//! given as the first argument, or from stdin.

use std::sync::Arc;

use anyhow::Context;
use compression_relay::{
    env::EnvConfig, log, BucketStores, CompressionRelay, ObjectStorage, S3Event,
};
use tokio::io::{stdin, AsyncReadExt};
use tracing::info;

async fn read_event(path: Option<String>) -> anyhow::Result<S3Event> {
    let bytes = match path {
        Some(path) => tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read event from {path}"))?,
        None => {
            let mut bytes = Vec::new();
            stdin()
                .read_to_end(&mut bytes)
                .await
                .context("failed to read event from stdin")?;
            bytes
        }
    };

    serde_json::from_slice(&bytes).context("failed to decode S3 event")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    log::init().context("reading log config from env")?;

    let env_config = EnvConfig::from_env().context("reading config from env")?;

    let event = read_event(std::env::args().nth(1)).await?;
    let notifications = event.into_notifications();
    info!(count = notifications.len(), "relaying notification batch");

    let storage: Arc<dyn ObjectStorage> = Arc::new(
        BucketStores::from_env_config(&env_config).context("failed to build object store")?,
    );
    let relay = CompressionRelay::new(env_config.relay_config(), storage);

    let batch_result = relay
        .handle_batch(&notifications)
        .await
        .context("failed to relay notification batch")?;

    println!("{}", serde_json::to_string(&batch_result)?);

    Ok(())
}
