//! # Compression Relay
//! Takes batches of object creation notifications and, for each object that landed under the
//! source prefix, replaces it with a zip archive under the processed prefix.
//!
//! Per notification the steps are strictly sequential: read the object, build the archive, write
//! the archive, delete the original. The original is only deleted once the archive has been
//! written. Notifications are handled one at a time, in batch order, and the first failure aborts
//! the rest of the batch. The caller sees that failure and decides whether to redeliver.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, instrument, trace};

use crate::{
    archive,
    error::RelayError,
    notification::ChangeNotification,
    object_storage::ObjectStorage,
    transfer::{EligibleTransfer, RelayConfig},
};

/// Acknowledgement returned once per batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub status_code: u16,
    pub body: String,
}

impl BatchResult {
    pub fn success() -> Self {
        Self {
            status_code: 200,
            body: "Success".to_string(),
        }
    }
}

pub struct CompressionRelay {
    config: RelayConfig,
    storage: Arc<dyn ObjectStorage>,
}

impl CompressionRelay {
    pub fn new(config: RelayConfig, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { config, storage }
    }

    pub async fn handle_batch(
        &self,
        notifications: &[ChangeNotification],
    ) -> Result<BatchResult, RelayError> {
        for notification in notifications {
            let Some(transfer) = self.config.plan(notification) else {
                trace!(
                    bucket = notification.bucket,
                    key = notification.key,
                    "skipping ineligible notification"
                );
                continue;
            };

            if let Err(e) = self.relay_object(&transfer).await {
                error!(
                    source_key = transfer.source_key,
                    destination_key = transfer.destination_key,
                    "failed to relay object, abandoning batch: {:?}",
                    e
                );
                return Err(e);
            }
        }

        Ok(BatchResult::success())
    }

    #[instrument(skip_all, fields(bucket = %transfer.source_bucket, key = %transfer.source_key))]
    async fn relay_object(&self, transfer: &EligibleTransfer) -> Result<(), RelayError> {
        let payload = self
            .storage
            .read_object(&transfer.source_bucket, &transfer.source_key)
            .await?;

        let archive = archive::build_single_entry_archive(&transfer.base_file_name, payload).await?;

        self.storage
            .write_object(
                &transfer.source_bucket,
                &transfer.destination_key,
                archive,
            )
            .await?;

        // Only now that the archive is stored may the original go.
        self.storage
            .delete_object(&transfer.source_bucket, &transfer.source_key)
            .await?;

        info!(
            source_key = transfer.source_key,
            destination_key = transfer.destination_key,
            "compressed {} to {} and deleted original",
            transfer.source_key,
            transfer.destination_key
        );

        Ok(())
    }
}
