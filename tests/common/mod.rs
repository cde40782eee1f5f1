//! A storage fake which records every call the relay makes, in order.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    io::{Cursor, Read},
    sync::Mutex,
};

use async_trait::async_trait;
use bytes::Bytes;
use compression_relay::{
    error::{TransferError, TransferOperation},
    ObjectStorage,
};
use zip::ZipArchive;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageCall {
    Read(String, String),
    Write(String, String),
    Delete(String, String),
}

impl StorageCall {
    pub fn read(bucket: &str, key: &str) -> Self {
        Self::Read(bucket.to_string(), key.to_string())
    }

    pub fn write(bucket: &str, key: &str) -> Self {
        Self::Write(bucket.to_string(), key.to_string())
    }

    pub fn delete(bucket: &str, key: &str) -> Self {
        Self::Delete(bucket.to_string(), key.to_string())
    }
}

#[derive(Default)]
pub struct RecordingStorage {
    calls: Mutex<Vec<StorageCall>>,
    objects: Mutex<HashMap<(String, String), Bytes>>,
    failing: Mutex<Vec<(TransferOperation, String)>>,
}

impl RecordingStorage {
    pub fn with_object(self, bucket: &str, key: &str, bytes: impl Into<Bytes>) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), bytes.into());
        self
    }

    /// Make `operation` fail whenever it targets `key`.
    pub fn failing(self, operation: TransferOperation, key: &str) -> Self {
        self.failing
            .lock()
            .unwrap()
            .push((operation, key.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<StorageCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    fn check_failure(
        &self,
        operation: TransferOperation,
        bucket: &str,
        key: &str,
    ) -> Result<(), TransferError> {
        let should_fail = self
            .failing
            .lock()
            .unwrap()
            .iter()
            .any(|(failing_operation, failing_key)| {
                *failing_operation == operation && failing_key == key
            });
        if should_fail {
            Err(TransferError::new(operation, bucket, key, "injected failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ObjectStorage for RecordingStorage {
    async fn read_object(&self, bucket: &str, key: &str) -> Result<Bytes, TransferError> {
        self.calls.lock().unwrap().push(StorageCall::read(bucket, key));
        self.check_failure(TransferOperation::Read, bucket, key)?;
        self.object(bucket, key).ok_or_else(|| {
            TransferError::new(TransferOperation::Read, bucket, key, "no such key")
        })
    }

    async fn write_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
    ) -> Result<(), TransferError> {
        self.calls
            .lock()
            .unwrap()
            .push(StorageCall::write(bucket, key));
        self.check_failure(TransferOperation::Write, bucket, key)?;
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), bytes);
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), TransferError> {
        self.calls
            .lock()
            .unwrap()
            .push(StorageCall::delete(bucket, key));
        self.check_failure(TransferOperation::Delete, bucket, key)?;
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}

/// The name and content of the only entry in a zip archive.
pub fn unzip_single_entry(archive: &[u8]) -> (String, Vec<u8>) {
    let mut zip = ZipArchive::new(Cursor::new(archive)).unwrap();
    assert_eq!(zip.len(), 1, "expected a single entry archive");
    let mut entry = zip.by_index(0).unwrap();
    let mut content = Vec::new();
    entry.read_to_end(&mut content).unwrap();
    (entry.name().to_string(), content)
}
