pub mod archive;
pub mod env;
pub mod error;
pub mod log;
pub mod notification;
pub mod object_storage;
pub mod relay;
pub mod server;
pub mod transfer;

pub use error::RelayError;
pub use notification::{ChangeNotification, S3Event};
pub use object_storage::{BucketStores, ObjectStorage, StoreBackend};
pub use relay::{BatchResult, CompressionRelay};
pub use transfer::{EligibleTransfer, RelayConfig};
