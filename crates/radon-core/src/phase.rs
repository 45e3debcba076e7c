//! # Phase Derivation
//!
//! Maps a campaign's stored status and start date to the board column it is
//! shown in. Stored status is never modified here.
//!
//! | Stored status      | Condition                    | Bucket            |
//! |--------------------|------------------------------|-------------------|
//! | `active`           | `today < start + 6 months`   | `Phase1`          |
//! | `active`           | `today >= start + 6 months`  | `Phase2Due`       |
//! | `awaiting_results` | always                       | `AwaitingResults` |
//! | anything else      | always                       | same as stored    |

use crate::calendar::pickup_deadline;
use crate::{Campaign, CampaignId, CampaignStatus, RiskLevel};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// =============================================================================
// BUCKET
// =============================================================================

/// Display bucket of a campaign on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Planned,
    Unplanned,
    /// Active, dosimeters of Phase 1 still exposed.
    Phase1,
    /// Active, pickup/replacement date reached.
    Phase2Due,
    AwaitingResults,
    Completed,
}

impl Bucket {
    /// Board columns, left to right.
    pub const ALL: [Bucket; 6] = [
        Bucket::Planned,
        Bucket::Unplanned,
        Bucket::Phase1,
        Bucket::Phase2Due,
        Bucket::AwaitingResults,
        Bucket::Completed,
    ];

    /// Column title.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Bucket::Planned => "Da iniziare",
            Bucket::Unplanned => "Non pianificate",
            Bucket::Phase1 => "Fase 1",
            Bucket::Phase2Due => "Fase 2",
            Bucket::AwaitingResults => "Attesa esiti",
            Bucket::Completed => "Terminate",
        }
    }

    /// Buckets holding campaigns with status `active`.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Bucket::Phase1 | Bucket::Phase2Due)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Derive the bucket for a stored status and start date.
#[must_use]
pub fn derive_bucket(status: CampaignStatus, start_date: NaiveDate, today: NaiveDate) -> Bucket {
    match status {
        CampaignStatus::Active => {
            if today < pickup_deadline(start_date) {
                Bucket::Phase1
            } else {
                Bucket::Phase2Due
            }
        }
        CampaignStatus::AwaitingResults => Bucket::AwaitingResults,
        CampaignStatus::Planned => Bucket::Planned,
        CampaignStatus::Unplanned => Bucket::Unplanned,
        CampaignStatus::Completed => Bucket::Completed,
    }
}

/// Bucket of a campaign as of `today`.
#[must_use]
pub fn bucket_of(campaign: &Campaign, today: NaiveDate) -> Bucket {
    derive_bucket(campaign.status, campaign.start_date, today)
}

// =============================================================================
// SORTING
// =============================================================================

/// Date a campaign is ordered by inside its bucket.
///
/// Planned work sorts by start date, active work by pickup deadline.
#[must_use]
pub fn sort_date(campaign: &Campaign, bucket: Bucket) -> NaiveDate {
    if bucket.is_active() {
        pickup_deadline(campaign.start_date)
    } else {
        campaign.start_date
    }
}

fn compare_in_bucket(a: &Campaign, b: &Campaign, bucket: Bucket) -> Ordering {
    sort_date(a, bucket)
        .cmp(&sort_date(b, bucket))
        .then_with(|| a.start_date.cmp(&b.start_date))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort campaigns of one bucket, soonest first.
///
/// The order is total (ties fall back to id), so sorting twice is a no-op.
pub fn sort_bucket(campaigns: &mut [Campaign], bucket: Bucket) {
    campaigns.sort_by(|a, b| compare_in_bucket(a, b, bucket));
}

// =============================================================================
// BOARD
// =============================================================================

/// Summary of one campaign as shown on a board card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignCard {
    pub id: CampaignId,
    pub name: String,
    pub location: String,
    pub client: String,
    pub work_order: String,
    pub status: CampaignStatus,
    pub bucket: Bucket,
    pub risk_level: RiskLevel,
    pub start_date: NaiveDate,
    /// Pickup deadline, for active campaigns.
    pub deadline: Option<NaiveDate>,
    pub average_level: Option<u32>,
}

impl CampaignCard {
    #[must_use]
    pub fn new(campaign: &Campaign, today: NaiveDate) -> Self {
        let bucket = bucket_of(campaign, today);
        Self {
            id: campaign.id.clone(),
            name: campaign.name.clone(),
            location: campaign.location(),
            client: campaign.client.clone(),
            work_order: campaign.work_order.clone(),
            status: campaign.status,
            bucket,
            risk_level: campaign.risk_level,
            start_date: campaign.start_date,
            deadline: bucket
                .is_active()
                .then(|| pickup_deadline(campaign.start_date)),
            average_level: campaign.average_level,
        }
    }
}

/// One column of the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardColumn {
    pub bucket: Bucket,
    pub title: String,
    pub cards: Vec<CampaignCard>,
}

impl BoardColumn {
    #[must_use]
    pub fn count(&self) -> usize {
        self.cards.len()
    }
}

/// Kanban grouping of campaigns by derived bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub as_of: NaiveDate,
    pub columns: Vec<BoardColumn>,
}

impl Board {
    /// Group and sort campaigns as of `today`.
    ///
    /// With a search term, only campaigns whose name, location, client or
    /// work order contain it (case-insensitive) are placed.
    #[must_use]
    pub fn build(campaigns: &[Campaign], today: NaiveDate, search: Option<&str>) -> Self {
        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let columns = Bucket::ALL
            .iter()
            .map(|&bucket| {
                let mut members: Vec<Campaign> = campaigns
                    .iter()
                    .filter(|c| bucket_of(c, today) == bucket)
                    .filter(|c| needle.as_deref().is_none_or(|n| matches_search(c, n)))
                    .cloned()
                    .collect();
                sort_bucket(&mut members, bucket);
                BoardColumn {
                    bucket,
                    title: bucket.title().to_string(),
                    cards: members
                        .iter()
                        .map(|c| CampaignCard::new(c, today))
                        .collect(),
                }
            })
            .collect();

        Self {
            as_of: today,
            columns,
        }
    }

    #[must_use]
    pub fn column(&self, bucket: Bucket) -> Option<&BoardColumn> {
        self.columns.iter().find(|c| c.bucket == bucket)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.columns.iter().map(BoardColumn::count).sum()
    }
}

/// Case-insensitive match against the searchable card fields.
///
/// `needle` must already be lowercase.
fn matches_search(campaign: &Campaign, needle: &str) -> bool {
    [
        campaign.name.as_str(),
        campaign.client.as_str(),
        campaign.work_order.as_str(),
        campaign.location().as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

// =============================================================================
// TESTS
// =============================================================================
