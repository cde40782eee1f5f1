//! Deciding which notifications to act on and where their archives go.

use crate::{archive::ARCHIVE_EXTENSION, notification::ChangeNotification};

/// Prefixes that gate eligibility and place the produced archives.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    source_prefix: String,
    processed_prefix: String,
}

/// A notification that passed the eligibility filter, with its destination worked out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EligibleTransfer {
    pub source_bucket: String,
    pub source_key: String,
    pub base_file_name: String,
    pub destination_key: String,
}

/// The last `/` separated segment of a key.
pub fn base_file_name(key: &str) -> &str {
    match key.rsplit_once('/') {
        Some((_, name)) => name,
        None => key,
    }
}

// The extension starts at the last dot, unless only dots come before it. `.bashrc` has none.
fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(index) if file_name[..index].chars().any(|c| c != '.') => &file_name[..index],
        _ => file_name,
    }
}

/// `report.csv` becomes `report.zip`.
pub fn archive_file_name(base_file_name: &str) -> String {
    format!("{}{ARCHIVE_EXTENSION}", file_stem(base_file_name))
}

impl RelayConfig {
    pub fn new(source_prefix: &str, processed_prefix: &str) -> Self {
        Self {
            source_prefix: source_prefix.to_string(),
            processed_prefix: processed_prefix.to_string(),
        }
    }

    pub fn source_prefix(&self) -> &str {
        &self.source_prefix
    }

    pub fn processed_prefix(&self) -> &str {
        &self.processed_prefix
    }

    /// Eligible keys start with the source prefix and don't end with the archive extension, so
    /// archives we produced ourselves are never picked up again, even under the source prefix.
    ///
    /// On top of that we skip folder markers, keys ending in `/`. They have no file name to put
    /// in an archive.
    pub fn is_eligible(&self, key: &str) -> bool {
        key.starts_with(&self.source_prefix)
            && !key.ends_with(ARCHIVE_EXTENSION)
            && !base_file_name(key).is_empty()
    }

    /// Same named files from different folders map to the same destination key.
    pub fn destination_key(&self, key: &str) -> String {
        format!(
            "{}{}",
            self.processed_prefix,
            archive_file_name(base_file_name(key))
        )
    }

    pub fn plan(&self, notification: &ChangeNotification) -> Option<EligibleTransfer> {
        if !self.is_eligible(&notification.key) {
            return None;
        }

        Some(EligibleTransfer {
            source_bucket: notification.bucket.clone(),
            source_key: notification.key.clone(),
            base_file_name: base_file_name(&notification.key).to_string(),
            destination_key: self.destination_key(&notification.key),
        })
    }
}
