//! # Campaign Registry
//!
//! The single owner of a storage backend. All reads and writes of campaigns
//! and stock go through here, and every successful write is announced to
//! subscribers so views can refresh.

use super::{CampaignStore, StorageBackend};
use crate::inventory::{InventorySummary, StockForm, StockLedger};
use crate::{Campaign, CampaignId, RadonError, StockEntry};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// =============================================================================
// EVENTS
// =============================================================================

/// Something changed in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreEvent {
    /// The campaign collection was rewritten.
    CampaignsSaved { count: usize },
    /// A campaign finished Phase 2 replacement.
    PhaseTwoCompleted {
        campaign_id: CampaignId,
        campaign_name: String,
        dosimeter_count: u32,
    },
    /// A delivery was recorded; `total` is the new stock.
    StockChanged { total: i64 },
}

/// Handle returned by [`CampaignRegistry::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Callback invoked for every store event.
pub type Listener = Box<dyn Fn(&StoreEvent) + Send + Sync>;

// =============================================================================
// REGISTRY
// =============================================================================

pub struct CampaignRegistry {
    backend: StorageBackend,
    stock_baseline: u32,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for CampaignRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CampaignRegistry")
            .field("backend", &self.backend.kind())
            .field("stock_baseline", &self.stock_baseline)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl CampaignRegistry {
    #[must_use]
    pub fn new(backend: StorageBackend, stock_baseline: u32) -> Self {
        Self {
            backend,
            stock_baseline,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Registry over a fresh in-memory backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            StorageBackend::default(),
            crate::primitives::DEFAULT_STOCK_BASELINE,
        )
    }

    #[must_use]
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    // -------------------------------------------------------------------------
    // Campaigns
    // -------------------------------------------------------------------------

    /// Every campaign in stored order.
    #[must_use]
    pub fn load_all(&self) -> Vec<Campaign> {
        self.backend.load_all()
    }

    /// Replace the whole collection and notify subscribers.
    pub fn save_all(&mut self, campaigns: &[Campaign]) -> Result<(), RadonError> {
        self.backend.save_all(campaigns)?;
        tracing::debug!(count = campaigns.len(), "campaigns saved");
        self.publish(&StoreEvent::CampaignsSaved {
            count: campaigns.len(),
        });
        Ok(())
    }

    pub fn get(&self, id: &CampaignId) -> Result<Campaign, RadonError> {
        self.load_all()
            .into_iter()
            .find(|c| &c.id == id)
            .ok_or_else(|| RadonError::CampaignNotFound(id.clone()))
    }

    /// Append a new campaign, assigning it the next free id.
    pub fn insert(&mut self, mut campaign: Campaign) -> Result<CampaignId, RadonError> {
        let mut campaigns = self.load_all();
        campaign.id = CampaignId::next_after(campaigns.iter().map(|c| &c.id));
        let id = campaign.id.clone();
        campaigns.push(campaign);
        self.save_all(&campaigns)?;
        tracing::info!(campaign = %id, "campaign created");
        Ok(id)
    }

    /// Load, mutate one campaign in place, save.
    ///
    /// Nothing is written when `apply` fails.
    pub fn update<T>(
        &mut self,
        id: &CampaignId,
        apply: impl FnOnce(&mut Campaign) -> Result<T, RadonError>,
    ) -> Result<T, RadonError> {
        let mut campaigns = self.load_all();
        let campaign = campaigns
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| RadonError::CampaignNotFound(id.clone()))?;
        let out = apply(campaign)?;
        self.save_all(&campaigns)?;
        Ok(out)
    }

    // -------------------------------------------------------------------------
    // Stock
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn stock_baseline(&self) -> u32 {
        self.stock_baseline
    }

    #[must_use]
    pub fn ledger(&self) -> StockLedger {
        StockLedger::new(self.stock_baseline, self.backend.load_ledger())
    }

    /// Record a delivery on behalf of `user`.
    pub fn add_stock(
        &mut self,
        form: &StockForm,
        user: &str,
        now: NaiveDateTime,
    ) -> Result<StockEntry, RadonError> {
        let mut ledger = self.ledger();
        let entry = ledger.append(form, user, now)?.clone();
        self.backend.save_ledger(ledger.entries())?;
        self.publish(&StoreEvent::StockChanged {
            total: ledger.total(),
        });
        Ok(entry)
    }

    /// Inventory figures as of `today`.
    #[must_use]
    pub fn inventory(&self, today: NaiveDate) -> InventorySummary {
        InventorySummary::compute(&self.load_all(), &self.ledger(), today)
    }

    /// Replace campaigns and ledger together, as done by import.
    pub fn restore(
        &mut self,
        campaigns: &[Campaign],
        ledger: &[StockEntry],
    ) -> Result<(), RadonError> {
        self.backend.save_ledger(ledger)?;
        self.save_all(campaigns)?;
        self.publish(&StoreEvent::StockChanged {
            total: self.ledger().total(),
        });
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Observers
    // -------------------------------------------------------------------------

    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Returns false if the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn publish(&self, event: &StoreEvent) {
        for (_, listener) in &self.listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_campaigns;
    use crate::storage::MemoryStore;
    use std::sync::{Arc, Mutex};

    fn seeded() -> CampaignRegistry {
        CampaignRegistry::new(
            StorageBackend::Memory(MemoryStore::with_campaigns(demo_campaigns())),
            250,
        )
    }

    #[test]
    fn insert_assigns_next_id() {
        let mut registry = seeded();
        let mut draft = demo_campaigns().remove(0);
        draft.id = CampaignId::new("");
        let id = registry.insert(draft).expect("insert");
        assert_eq!(id, CampaignId::new("4"));
        assert_eq!(registry.load_all().len(), 4);
    }

    #[test]
    fn failed_update_writes_nothing() {
        let mut registry = seeded();
        let before = registry.load_all();
        let result: Result<(), _> = registry.update(&CampaignId::new("1"), |c| {
            c.name = "changed".to_string();
            Err(RadonError::InvalidTransition("nope".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(registry.load_all(), before);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut registry = seeded();
        let missing = CampaignId::new("99");
        assert!(matches!(
            registry.get(&missing),
            Err(RadonError::CampaignNotFound(_))
        ));
        assert!(matches!(
            registry.update(&missing, |_| Ok(())),
            Err(RadonError::CampaignNotFound(_))
        ));
    }

    #[test]
    fn subscribers_see_writes_until_unsubscribed() {
        let mut registry = seeded();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = registry.subscribe(Box::new(move |event| {
            if let Ok(mut events) = sink.lock() {
                events.push(event.clone());
            }
        }));

        let campaigns = registry.load_all();
        registry.save_all(&campaigns).expect("save");
        assert!(registry.unsubscribe(sub));
        assert!(!registry.unsubscribe(sub));
        registry.save_all(&campaigns).expect("save");

        let events = seen.lock().expect("lock");
        assert_eq!(*events, vec![StoreEvent::CampaignsSaved { count: 3 }]);
    }

    #[test]
    fn add_stock_persists_and_notifies() {
        let mut registry = seeded();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        registry.subscribe(Box::new(move |event| {
            if let Ok(mut events) = sink.lock() {
                events.push(event.clone());
            }
        }));

        let now = NaiveDate::from_ymd_opt(2025, 4, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("datetime");
        registry
            .add_stock(&StockForm::new(30, "ORD-30"), "Mario", now)
            .expect("add");

        assert_eq!(registry.ledger().total(), 280);
        let events = seen.lock().expect("lock");
        assert_eq!(*events, vec![StoreEvent::StockChanged { total: 280 }]);
    }
    #[test]
    fn restore_announces_campaigns_and_stock() {
        let mut registry = seeded();
        let now = NaiveDate::from_ymd_opt(2025, 4, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("datetime");
        let mut ledger = StockLedger::new(250, Vec::new());
        ledger
            .append(&StockForm::new(40, "ORD-40"), "Mario", now)
            .expect("append");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        registry.subscribe(Box::new(move |event| {
            if let Ok(mut events) = sink.lock() {
                events.push(event.clone());
            }
        }));

        let campaigns = demo_campaigns();
        registry
            .restore(&campaigns[..2], ledger.entries())
            .expect("restore");

        assert_eq!(registry.load_all().len(), 2);
        let events = seen.lock().expect("lock");
        assert_eq!(
            *events,
            vec![
                StoreEvent::CampaignsSaved { count: 2 },
                StoreEvent::StockChanged { total: 290 },
            ]
        );
    }
}
