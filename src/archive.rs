use std::io::{Cursor, Write};

use bytes::Bytes;
use chrono::{DateTime, Datelike, Timelike, Utc};
use flate2::Compression;
use tokio::task::spawn_blocking;
use tracing::debug;
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

use crate::error::ArchiveError;

pub const ARCHIVE_EXTENSION: &str = ".zip";

// Entries this large need the zip64 extensions.
const ZIP64_THRESHOLD: usize = u32::MAX as usize;

/// ZIP stores local time with two second precision, from 1980 onwards. Anything it can't
/// represent gets the format's epoch.
fn entry_timestamp(date_time: DateTime<Utc>) -> zip::DateTime {
    let year = u16::try_from(date_time.year()).unwrap_or(0);
    zip::DateTime::from_date_and_time(
        year,
        date_time.month() as u8,
        date_time.day() as u8,
        date_time.hour() as u8,
        date_time.minute() as u8,
        date_time.second() as u8,
    )
    .unwrap_or_default()
}

fn write_archive(
    entry_name: &str,
    payload: &[u8],
    modified_at: DateTime<Utc>,
) -> Result<Vec<u8>, ArchiveError> {
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(Compression::default().level() as i32))
        .last_modified_time(entry_timestamp(modified_at))
        .large_file(payload.len() >= ZIP64_THRESHOLD);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file(entry_name, options)?;
    writer.write_all(payload)?;
    let archive = writer.finish()?.into_inner();

    Ok(archive)
}

/// Wrap `payload` in a zip archive holding a single deflated entry named `entry_name`.
pub async fn build_single_entry_archive(
    entry_name: &str,
    payload: Bytes,
) -> Result<Bytes, ArchiveError> {
    let payload_size_kb = payload.len() / 1000;

    let archive: Bytes = spawn_blocking({
        let entry_name = entry_name.to_string();
        move || write_archive(&entry_name, &payload, Utc::now())
    })
    .await??
    .into();
    let archive_size_kb = archive.len() / 1000;

    debug!(
        entry_name,
        uncompressed_size_kb = payload_size_kb,
        compressed_size_kb = archive_size_kb,
        "built archive"
    );

    Ok(archive)
}
