//! # redb-backed Campaign Storage
//!
//! Campaigns and ledger are stored as two binary blobs (header + postcard)
//! in a single table. redb gives crash safety through copy-on-write
//! B-trees; each save is one write transaction.

use super::CampaignStore;
use crate::formats::{decode_binary, encode_binary};
use crate::{Campaign, RadonError, StockEntry};
use redb::{Database, ReadableDatabase, TableDefinition};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Table for snapshots: collection name -> encoded collection
const COLLECTIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("collections");

const CAMPAIGNS_KEY: &str = "campaigns";
const LEDGER_KEY: &str = "stock_ledger";

pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RadonError> {
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| RadonError::IoError(e.to_string()))?;
        }
        let db =
            Database::create(path.as_ref()).map_err(|e| RadonError::IoError(e.to_string()))?;

        // Create the table up front so readers never see TableDoesNotExist
        let write_txn = db
            .begin_write()
            .map_err(|e| RadonError::IoError(e.to_string()))?;
        {
            let _ = write_txn
                .open_table(COLLECTIONS)
                .map_err(|e| RadonError::IoError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| RadonError::IoError(e.to_string()))?;

        Ok(Self { db })
    }

    fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>, RadonError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| RadonError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(COLLECTIONS)
            .map_err(|e| RadonError::IoError(e.to_string()))?;
        let blob = table
            .get(key)
            .map_err(|e| RadonError::IoError(e.to_string()))?
            .map(|guard| guard.value().to_vec());
        Ok(blob)
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let decoded = self
            .read_blob(key)
            .and_then(|blob| blob.map(|b| decode_binary::<Vec<T>>(&b)).transpose());
        match decoded {
            Ok(items) => items.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(collection = key, error = %e, "unreadable collection, using empty data");
                Vec::new()
            }
        }
    }

    fn write_blob(&mut self, key: &str, bytes: &[u8]) -> Result<(), RadonError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| RadonError::IoError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(COLLECTIONS)
                .map_err(|e| RadonError::IoError(e.to_string()))?;
            table
                .insert(key, bytes)
                .map_err(|e| RadonError::IoError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| RadonError::IoError(e.to_string()))?;
        Ok(())
    }
}

impl CampaignStore for RedbStore {
    fn load_all(&self) -> Vec<Campaign> {
        self.load(CAMPAIGNS_KEY)
    }

    fn save_all(&mut self, campaigns: &[Campaign]) -> Result<(), RadonError> {
        let bytes = encode_binary(&campaigns)?;
        self.write_blob(CAMPAIGNS_KEY, &bytes)
    }

    fn load_ledger(&self) -> Vec<StockEntry> {
        self.load(LEDGER_KEY)
    }

    fn save_ledger(&mut self, entries: &[StockEntry]) -> Result<(), RadonError> {
        let bytes = encode_binary(&entries)?;
        self.write_blob(LEDGER_KEY, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_campaigns;
    use tempfile::TempDir;

    #[test]
    fn fresh_database_is_empty() {
        let dir = TempDir::new().expect("tempdir");
        let store = RedbStore::open(dir.path().join("radon.redb")).expect("open");
        assert!(store.load_all().is_empty());
        assert!(store.load_ledger().is_empty());
    }

    #[test]
    fn survives_reopen() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("radon.redb");
        {
            let mut store = RedbStore::open(&path).expect("open");
            store.save_all(&demo_campaigns()).expect("save");
        }
        let store = RedbStore::open(&path).expect("reopen");
        assert_eq!(store.load_all(), demo_campaigns());
    }

    #[test]
    fn corrupt_blob_reads_empty() {
        let dir = TempDir::new().expect("tempdir");
        let mut store = RedbStore::open(dir.path().join("radon.redb")).expect("open");
        store
            .write_blob(CAMPAIGNS_KEY, b"RDON\x01\xff\xff\xff")
            .expect("write");
        assert!(store.load_all().is_empty());
    }
}
