//! # Dosimeter Inventory
//!
//! Warehouse figures derived from the campaign list and the stock ledger:
//!
//! - `active_dosimeters = active campaigns × 12`
//! - `stock = baseline + Σ ledger quantities`
//! - `available = stock − active_dosimeters` (may go negative)
//! - `forecast_phase2 = active campaigns still in Phase 1`
//!
//! Nothing here is stored; every figure is recomputed on demand.

use crate::calendar::{days_until, pickup_deadline};
use crate::phase::{Bucket, bucket_of};
use crate::primitives::DOSIMETERS_PER_CAMPAIGN;
use crate::{
    Campaign, CampaignId, CampaignStatus, FormField, IssueKind, RadonError, StockEntry,
    ValidationReport, limit_length, require,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// =============================================================================
// STOCK LEDGER
// =============================================================================

/// A delivery as typed into the "add stock" form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockForm {
    pub quantity: i64,
    pub order_ref: String,
}

impl StockForm {
    #[must_use]
    pub fn new(quantity: i64, order_ref: impl Into<String>) -> Self {
        Self {
            quantity,
            order_ref: order_ref.into(),
        }
    }

    /// Check the form, returning the accepted quantity.
    pub fn validate(&self) -> Result<u32, RadonError> {
        let mut report = ValidationReport::new();
        let quantity = if self.quantity < 1 {
            report.push(FormField::StockQuantity, IssueKind::NotPositive);
            0
        } else {
            u32::try_from(self.quantity).unwrap_or_else(|_| {
                report.push(
                    FormField::StockQuantity,
                    IssueKind::OutOfRange { max: u32::MAX },
                );
                0
            })
        };
        require(&mut report, FormField::StockOrderRef, &self.order_ref);
        limit_length(&mut report, FormField::StockOrderRef, &self.order_ref);
        report.into_result()?;
        Ok(quantity)
    }
}

/// Append-only record of dosimeter deliveries on top of a fixed baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLedger {
    baseline: u32,
    /// Chronological, oldest first.
    entries: Vec<StockEntry>,
}

impl StockLedger {
    #[must_use]
    pub fn new(baseline: u32, entries: Vec<StockEntry>) -> Self {
        Self { baseline, entries }
    }

    #[must_use]
    pub fn baseline(&self) -> u32 {
        self.baseline
    }

    /// Baseline plus every delivered quantity.
    #[must_use]
    pub fn total(&self) -> i64 {
        i64::from(self.baseline)
            + self
                .entries
                .iter()
                .map(|e| i64::from(e.quantity))
                .sum::<i64>()
    }

    /// Entries oldest first, as stored.
    #[must_use]
    pub fn entries(&self) -> &[StockEntry] {
        &self.entries
    }

    /// Entries most recent first, as shown in the ledger view.
    pub fn entries_recent_first(&self) -> impl Iterator<Item = &StockEntry> {
        self.entries.iter().rev()
    }

    /// Validate and record a delivery.
    ///
    /// The entry id is `now` in epoch milliseconds (the naive wall-clock time
    /// read as UTC, with no zone conversion), bumped past the last id when two
    /// entries land in the same millisecond or the clock went back.
    pub fn append(
        &mut self,
        form: &StockForm,
        user: &str,
        now: NaiveDateTime,
    ) -> Result<&StockEntry, RadonError> {
        let quantity = form.validate()?;
        let millis = now.and_utc().timestamp_millis();
        let id = match self.entries.last() {
            Some(last) if last.id >= millis => last.id.saturating_add(1),
            _ => millis,
        };
        let user = match user.trim() {
            "" => "Utente".to_string(),
            name => name.to_string(),
        };
        self.entries.push(StockEntry {
            id,
            quantity,
            order_ref: form.order_ref.trim().to_string(),
            user,
            recorded_at: now,
        });
        tracing::info!(id, quantity, total = self.total(), "stock delivery recorded");
        self.entries
            .last()
            .ok_or_else(|| RadonError::IoError("ledger append lost entry".to_string()))
    }
}

// =============================================================================
// INVENTORY SUMMARY
// =============================================================================

/// An active campaign as listed under the inventory figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCampaignRow {
    pub id: CampaignId,
    pub name: String,
    pub location: String,
    pub start_date: NaiveDate,
    pub deadline: NaiveDate,
    /// Negative once the pickup date has passed.
    pub days_to_deadline: i64,
    pub bucket: Bucket,
}

/// Warehouse figures as of one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub as_of: NaiveDate,
    pub stock: i64,
    pub active_campaigns: u32,
    pub active_dosimeters: i64,
    pub available: i64,
    /// Active campaigns whose dosimeters are still in Phase 1.
    pub forecast_phase2: u32,
    /// Dosimeters those campaigns will need at replacement.
    pub forecast_dosimeters: i64,
    /// Active campaigns, soonest deadline first.
    pub active: Vec<ActiveCampaignRow>,
}

impl InventorySummary {
    #[must_use]
    pub fn compute(campaigns: &[Campaign], ledger: &StockLedger, today: NaiveDate) -> Self {
        let per_campaign = i64::from(DOSIMETERS_PER_CAMPAIGN);

        let mut active: Vec<ActiveCampaignRow> = campaigns
            .iter()
            .filter(|c| c.status == CampaignStatus::Active)
            .map(|c| {
                let deadline = pickup_deadline(c.start_date);
                ActiveCampaignRow {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    location: c.location(),
                    start_date: c.start_date,
                    deadline,
                    days_to_deadline: days_until(today, deadline),
                    bucket: bucket_of(c, today),
                }
            })
            .collect();
        active.sort_by(|a, b| a.deadline.cmp(&b.deadline).then_with(|| a.id.cmp(&b.id)));

        let active_campaigns = active.len() as u32;
        let forecast_phase2 = active.iter().filter(|r| r.bucket == Bucket::Phase1).count() as u32;
        let stock = ledger.total();
        let active_dosimeters = i64::from(active_campaigns) * per_campaign;

        Self {
            as_of: today,
            stock,
            active_campaigns,
            active_dosimeters,
            available: stock - active_dosimeters,
            forecast_phase2,
            forecast_dosimeters: i64::from(forecast_phase2) * per_campaign,
            active,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_campaigns;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|d| d.and_hms_opt(h, min, 0))
            .expect("valid datetime")
    }

    #[test]
    fn stock_form_rules() {
        assert_eq!(StockForm::new(10, "ORD-1").validate().ok(), Some(10));

        let zero = StockForm::new(0, "ORD-1").validate();
        let report = zero.as_ref().err().and_then(RadonError::report).expect("report");
        assert_eq!(
            report.get(FormField::StockQuantity),
            Some(&IssueKind::NotPositive)
        );

        let negative = StockForm::new(-3, "").validate();
        let report = negative
            .as_ref()
            .err()
            .and_then(RadonError::report)
            .expect("report");
        assert_eq!(report.len(), 2);
        assert_eq!(
            report.get(FormField::StockOrderRef),
            Some(&IssueKind::Required)
        );

        assert!(StockForm::new(i64::MAX, "ORD").validate().is_err());
    }

    #[test]
    fn ledger_total_and_order() {
        let mut ledger = StockLedger::new(250, Vec::new());
        let now = at(2025, 3, 1, 10, 0);
        ledger
            .append(&StockForm::new(10, "A"), "Mario", now)
            .expect("first");
        ledger
            .append(&StockForm::new(5, "B"), "", now)
            .expect("second");

        assert_eq!(ledger.total(), 265);
        let recent: Vec<_> = ledger
            .entries_recent_first()
            .map(|e| e.order_ref.as_str())
            .collect();
        assert_eq!(recent, vec!["B", "A"]);
        assert_eq!(ledger.entries()[1].user, "Utente");
        assert_eq!(ledger.entries()[1].id, ledger.entries()[0].id + 1);
    }

    #[test]
    fn entry_id_reads_wall_clock_as_utc() {
        let mut ledger = StockLedger::new(0, Vec::new());
        let now = at(1970, 1, 1, 0, 1);
        let first = ledger
            .append(&StockForm::new(1, "ORD-A"), "", now)
            .expect("first")
            .id;
        assert_eq!(first, 60_000);

        let earlier = at(1970, 1, 1, 0, 0);
        let second = ledger
            .append(&StockForm::new(1, "ORD-B"), "", earlier)
            .expect("second")
            .id;
        assert_eq!(second, 60_001);
    }

    #[test]
    fn rejected_delivery_leaves_ledger_untouched() {
        let mut ledger = StockLedger::new(250, Vec::new());
        assert!(
            ledger
                .append(&StockForm::new(0, "X"), "Mario", at(2025, 3, 1, 10, 0))
                .is_err()
        );
        assert!(ledger.entries().is_empty());
        assert_eq!(ledger.total(), 250);
    }

    #[test]
    fn summary_counts() {
        // On 2025-12-01: campaign 1 (start 2025-11-03) in Phase 1,
        // campaign 2 (start 2025-01-13) past its pickup date.
        let today = NaiveDate::from_ymd_opt(2025, 12, 1).expect("date");
        let ledger = StockLedger::new(250, Vec::new());
        let summary = InventorySummary::compute(&demo_campaigns(), &ledger, today);

        assert_eq!(summary.active_campaigns, 2);
        assert_eq!(summary.active_dosimeters, 24);
        assert_eq!(summary.available, 226);
        assert_eq!(summary.forecast_phase2, 1);
        assert_eq!(summary.forecast_dosimeters, 12);
        assert_eq!(summary.active[0].id, CampaignId::new("2"));
        assert!(summary.active[0].days_to_deadline < 0);
    }

    #[test]
    fn available_goes_negative() {
        let today = NaiveDate::from_ymd_opt(2025, 12, 1).expect("date");
        let ledger = StockLedger::new(10, Vec::new());
        let summary = InventorySummary::compute(&demo_campaigns(), &ledger, today);
        assert_eq!(summary.available, -14);
    }
}
