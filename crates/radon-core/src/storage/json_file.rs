//! JSON document store.
//!
//! The whole snapshot lives in one human-readable file. Writes go to a
//! sibling temp file which is then renamed over the original, so readers
//! never observe a half-written document.

use super::CampaignStore;
use crate::formats::{Snapshot, snapshot_from_json, snapshot_to_json};
use crate::{Campaign, RadonError, StockEntry};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Use the file at `path`, creating parent directories if needed.
    ///
    /// The file itself is created on the first save.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RadonError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| RadonError::IoError(e.to_string()))?;
        }
        Ok(Self { path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot, degrading to empty on any failure.
    fn read_snapshot(&self) -> Snapshot {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Snapshot::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot read store, using empty data");
                return Snapshot::default();
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Snapshot::default();
        }
        snapshot_from_json(&bytes).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "malformed store, using empty data");
            Snapshot::default()
        })
    }

    fn write_snapshot(&self, snapshot: &Snapshot) -> Result<(), RadonError> {
        let bytes = snapshot_to_json(snapshot)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, &bytes).map_err(|e| RadonError::IoError(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| RadonError::IoError(e.to_string()))?;
        tracing::trace!(path = %self.path.display(), bytes = bytes.len(), "store written");
        Ok(())
    }
}

impl CampaignStore for JsonFileStore {
    fn load_all(&self) -> Vec<Campaign> {
        self.read_snapshot().campaigns
    }

    fn save_all(&mut self, campaigns: &[Campaign]) -> Result<(), RadonError> {
        let mut snapshot = self.read_snapshot();
        snapshot.campaigns = campaigns.to_vec();
        self.write_snapshot(&snapshot)
    }

    fn load_ledger(&self) -> Vec<StockEntry> {
        self.read_snapshot().stock_ledger
    }

    fn save_ledger(&mut self, entries: &[StockEntry]) -> Result<(), RadonError> {
        let mut snapshot = self.read_snapshot();
        snapshot.stock_ledger = entries.to_vec();
        self.write_snapshot(&snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_campaigns;
    use tempfile::TempDir;

    #[test]
    fn missing_file_reads_empty() {
        let dir = TempDir::new().expect("tempdir");
        let store = JsonFileStore::open(dir.path().join("radon.json")).expect("open");
        assert!(store.load_all().is_empty());
        assert!(store.load_ledger().is_empty());
    }

    #[test]
    fn malformed_file_reads_empty() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("radon.json");
        fs::write(&path, b"{ not json").expect("write");

        let store = JsonFileStore::open(&path).expect("open");
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn saving_campaigns_keeps_ledger() {
        let dir = TempDir::new().expect("tempdir");
        let mut store = JsonFileStore::open(dir.path().join("nested/radon.json")).expect("open");

        let entry = StockEntry {
            id: 7,
            quantity: 20,
            order_ref: "ORD-7".to_string(),
            user: "Utente".to_string(),
            recorded_at: chrono::NaiveDate::from_ymd_opt(2025, 2, 1)
                .and_then(|d| d.and_hms_opt(8, 0, 0))
                .expect("datetime"),
        };
        store.save_ledger(std::slice::from_ref(&entry)).expect("ledger");
        store.save_all(&demo_campaigns()).expect("campaigns");

        assert_eq!(store.load_ledger(), vec![entry]);
        assert_eq!(store.load_all(), demo_campaigns());
        assert!(!dir.path().join("nested/radon.json.tmp").exists());
    }
}
