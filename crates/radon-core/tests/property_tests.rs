//! # Property-Based Tests
//!
//! Invariants of the deriver, the board ordering and the stock ledger.

use chrono::{Days, NaiveDate};
use proptest::collection::vec;
use proptest::prelude::*;
use radon_core::calendar::{add_months, pickup_deadline};
use radon_core::phase::sort_bucket;
use radon_core::{
    Board, Bucket, Campaign, CampaignId, CampaignStatus, RiskLevel, StockForm, StockLedger,
    derive_bucket,
};

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date")
}

fn day(offset: u64) -> NaiveDate {
    base()
        .checked_add_days(Days::new(offset))
        .expect("in range")
}

fn campaign(id: u32, status: CampaignStatus, start: NaiveDate) -> Campaign {
    Campaign {
        id: CampaignId::new(id.to_string()),
        name: format!("Campagna {}", id),
        work_order: format!("COM-{}", id),
        client: "Cliente".to_string(),
        sign: String::new(),
        city: "Bologna".to_string(),
        province: "BO".to_string(),
        address: String::new(),
        phone: String::new(),
        email: String::new(),
        notes: String::new(),
        status,
        risk_level: RiskLevel::Low,
        start_date: start,
        end_date: None,
        average_level: None,
        expected_dosimeters: None,
        dosimeter_count: None,
        phase1: None,
        phase2: None,
    }
}

fn status_strategy() -> impl Strategy<Value = CampaignStatus> {
    prop_oneof![
        Just(CampaignStatus::Planned),
        Just(CampaignStatus::Unplanned),
        Just(CampaignStatus::Active),
        Just(CampaignStatus::AwaitingResults),
        Just(CampaignStatus::Completed),
    ]
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// An active campaign is in Phase 1 exactly until its pickup deadline.
    #[test]
    fn active_phase_follows_deadline(start in 0u64..4000, today in 0u64..5000) {
        let start = day(start);
        let today = day(today);
        let bucket = derive_bucket(CampaignStatus::Active, start, today);
        let expected = if today < add_months(start, 6) {
            Bucket::Phase1
        } else {
            Bucket::Phase2Due
        };
        prop_assert_eq!(bucket, expected);
    }

    /// Six calendar months span 181 to 184 days.
    #[test]
    fn deadline_after_start(start in 0u64..4000) {
        let start = day(start);
        let deadline = pickup_deadline(start);
        prop_assert!(deadline > start);
        prop_assert!(deadline.signed_duration_since(start).num_days() >= 181);
        prop_assert!(deadline.signed_duration_since(start).num_days() <= 184);
    }

    /// Non-active statuses never depend on the date.
    #[test]
    fn non_active_is_date_independent(
        status in status_strategy(),
        start in 0u64..4000,
        a in 0u64..5000,
        b in 0u64..5000,
    ) {
        prop_assume!(status != CampaignStatus::Active);
        prop_assert_eq!(
            derive_bucket(status, day(start), day(a)),
            derive_bucket(status, day(start), day(b))
        );
    }

    /// Sorting a bucket twice gives the same order as sorting once.
    #[test]
    fn sorting_is_idempotent(starts in vec(0u64..2000, 0..30)) {
        let mut campaigns: Vec<Campaign> = starts
            .iter()
            .enumerate()
            .map(|(i, &s)| campaign(i as u32, CampaignStatus::Active, day(s)))
            .collect();
        sort_bucket(&mut campaigns, Bucket::Phase1);
        let once = campaigns.clone();
        sort_bucket(&mut campaigns, Bucket::Phase1);
        prop_assert_eq!(once, campaigns);
    }

    /// Every campaign lands in exactly one board column.
    #[test]
    fn board_partitions_campaigns(
        entries in vec((status_strategy(), 0u64..3000), 0..40),
        today in 0u64..4000,
    ) {
        let campaigns: Vec<Campaign> = entries
            .iter()
            .enumerate()
            .map(|(i, &(status, s))| campaign(i as u32, status, day(s)))
            .collect();
        let board = Board::build(&campaigns, day(today), None);
        prop_assert_eq!(board.total(), campaigns.len());
        prop_assert_eq!(board.columns.len(), Bucket::ALL.len());
    }

    /// Stock after N deliveries is baseline plus the delivered quantities,
    /// listed most recent first.
    #[test]
    fn ledger_sums_and_orders(
        baseline in 0u32..1000,
        quantities in vec(1i64..500, 0..25),
    ) {
        let mut ledger = StockLedger::new(baseline, Vec::new());
        let now = base().and_hms_opt(9, 0, 0).expect("time");
        for (i, &q) in quantities.iter().enumerate() {
            ledger
                .append(&StockForm::new(q, format!("ORD-{}", i)), "Operatore", now)
                .expect("valid delivery");
        }

        let expected: i64 = i64::from(baseline) + quantities.iter().sum::<i64>();
        prop_assert_eq!(ledger.total(), expected);

        let refs: Vec<String> = ledger
            .entries_recent_first()
            .map(|e| e.order_ref.clone())
            .collect();
        let mut wanted: Vec<String> = (0..quantities.len()).map(|i| format!("ORD-{}", i)).collect();
        wanted.reverse();
        prop_assert_eq!(refs, wanted);

        let ids: Vec<i64> = ledger.entries().iter().map(|e| e.id).collect();
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }
}
