use std::sync::Arc;

use anyhow::Context;
use compression_relay::{
    env::EnvConfig, log, server, BucketStores, CompressionRelay, ObjectStorage,
};
use tracing::{info, warn};

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received ctrl-c, shutting down"),
        Err(e) => warn!("failed to listen for ctrl-c: {:?}", e),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    log::init().context("reading log config from env")?;

    let env_config = EnvConfig::from_env().context("reading config from env")?;

    info!(
        bucket = env_config.bucket_name,
        source_prefix = env_config.source_prefix,
        processed_prefix = env_config.processed_prefix,
        "starting compression relay"
    );

    let storage: Arc<dyn ObjectStorage> = Arc::new(
        BucketStores::from_env_config(&env_config).context("failed to build object store")?,
    );
    let relay = Arc::new(CompressionRelay::new(env_config.relay_config(), storage));

    server::serve(relay, &env_config, shutdown_signal()).await
}
