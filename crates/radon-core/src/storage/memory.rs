//! Volatile store for tests and `--backend memory`.

use super::CampaignStore;
use crate::{Campaign, RadonError, StockEntry};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    campaigns: Vec<Campaign>,
    ledger: Vec<StockEntry>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with campaigns.
    #[must_use]
    pub fn with_campaigns(campaigns: Vec<Campaign>) -> Self {
        Self {
            campaigns,
            ledger: Vec::new(),
        }
    }
}

impl CampaignStore for MemoryStore {
    fn load_all(&self) -> Vec<Campaign> {
        self.campaigns.clone()
    }

    fn save_all(&mut self, campaigns: &[Campaign]) -> Result<(), RadonError> {
        self.campaigns = campaigns.to_vec();
        Ok(())
    }

    fn load_ledger(&self) -> Vec<StockEntry> {
        self.ledger.clone()
    }

    fn save_ledger(&mut self, entries: &[StockEntry]) -> Result<(), RadonError> {
        self.ledger = entries.to_vec();
        Ok(())
    }
}
