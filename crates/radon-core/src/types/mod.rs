//! # Core Type Definitions
//!
//! This module contains the records persisted by the campaign store:
//! - Campaign identity and lifecycle (`CampaignId`, `CampaignStatus`, `RiskLevel`)
//! - Phase sub-records (`PhaseRecord`, `Technician`, `ClientContact`)
//! - Dosimeter placements and their photos (`DosimeterPlacement`, `Photo`)
//! - Stock ledger entries (`StockEntry`)
//! - Error types (`RadonError`)
//!
//! ## Serialization
//!
//! All records round-trip through both JSON (file backend, HTTP API) and
//! postcard (binary snapshots). Postcard is not self-describing, so no field
//! here may use `skip_serializing_if` or internally tagged enums.

mod validation;

pub use validation::{
    CampaignField, DosimeterField, FormField, IssueKind, Phase, PhaseField, ValidationIssue,
    ValidationReport, parse_reading,
};
pub(crate) use validation::{limit_length, require};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// CAMPAIGN IDENTITY
// =============================================================================

/// Opaque campaign identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(pub String);

impl CampaignId {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Next free numeric id given the ids already in use.
    ///
    /// Non-numeric ids are ignored; an empty collection starts at "1".
    #[must_use]
    pub fn next_after<'a>(existing: impl IntoIterator<Item = &'a CampaignId>) -> Self {
        let max = existing
            .into_iter()
            .filter_map(|id| id.0.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self(max.saturating_add(1).to_string())
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// STATUS & RISK
// =============================================================================

/// Stored lifecycle status of a campaign.
///
/// `Active` covers both measurement phases; which one is shown is derived
/// from the start date (see [`crate::phase`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Planned,
    Unplanned,
    Active,
    AwaitingResults,
    Completed,
}

impl CampaignStatus {
    /// Machine name, as used in JSON.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Planned => "planned",
            CampaignStatus::Unplanned => "unplanned",
            CampaignStatus::Active => "active",
            CampaignStatus::AwaitingResults => "awaiting_results",
            CampaignStatus::Completed => "completed",
        }
    }

    /// Human label shown on campaign cards.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            CampaignStatus::Planned => "Pianificata",
            CampaignStatus::Unplanned => "Non pianificata",
            CampaignStatus::Active => "In corso",
            CampaignStatus::AwaitingResults => "Attesa esiti",
            CampaignStatus::Completed => "Terminata",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = RadonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planned" => Ok(CampaignStatus::Planned),
            "unplanned" => Ok(CampaignStatus::Unplanned),
            "active" => Ok(CampaignStatus::Active),
            "awaiting_results" => Ok(CampaignStatus::AwaitingResults),
            "completed" => Ok(CampaignStatus::Completed),
            other => Err(RadonError::SerializationError(format!(
                "Unknown campaign status: {}",
                other
            ))),
        }
    }
}

/// Risk classification of a site.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        })
    }
}

impl FromStr for RiskLevel {
    type Err = RadonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(RadonError::SerializationError(format!(
                "Unknown risk level: {}",
                other
            ))),
        }
    }
}

// =============================================================================
// SIGNATURE BLOCKS
// =============================================================================

/// The technician who performed a placement or replacement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Technician {
    pub first_name: String,
    pub last_name: String,
    pub signature: String,
}

/// The client's on-site contact who countersigned a phase.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientContact {
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub signature: String,
}

// =============================================================================
// PHOTOS
// =============================================================================

/// A photo of a placed dosimeter, carried as base64 text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub file_name: String,
    pub media_type: String,
    /// Base64 (standard alphabet) encoded image bytes.
    pub data: String,
}

impl Photo {
    /// Build a photo from raw bytes.
    #[must_use]
    pub fn from_bytes(
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: &[u8],
    ) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            data: BASE64.encode(bytes),
        }
    }

    /// Decode the payload, enforcing the size limit.
    pub fn decode(&self) -> Result<Vec<u8>, IssueKind> {
        // Base64 expands by 4/3; reject before allocating for oversized input.
        let max = crate::primitives::MAX_PHOTO_BYTES;
        if self.data.len() / 4 * 3 > max {
            return Err(IssueKind::InvalidPhoto(format!("larger than {} bytes", max)));
        }
        let bytes = BASE64
            .decode(self.data.as_bytes())
            .map_err(|e| IssueKind::InvalidPhoto(e.to_string()))?;
        if bytes.is_empty() {
            return Err(IssueKind::InvalidPhoto("empty image".to_string()));
        }
        Ok(bytes)
    }
}

// =============================================================================
// DOSIMETER PLACEMENT
// =============================================================================

/// One dosimeter position inside a campaign.
///
/// The same row carries both device codes: the one placed in Phase 1 and
/// its replacement placed in Phase 2.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DosimeterPlacement {
    /// Unique within the campaign.
    pub id: u32,
    pub code_phase1: String,
    pub code_phase2: String,
    pub floor: String,
    /// Room or position description.
    pub location: String,
    pub photos: Vec<Photo>,
    /// Lab reading for the Phase 1 device, Bq/m³.
    pub reading_phase1: Option<u32>,
    /// Lab reading for the Phase 2 device, Bq/m³.
    pub reading_phase2: Option<u32>,
}

impl DosimeterPlacement {
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Rounded mean of the two readings, once both are known.
    #[must_use]
    pub fn average_reading(&self) -> Option<u32> {
        match (self.reading_phase1, self.reading_phase2) {
            (Some(a), Some(b)) => Some(rounded_mean(&[a, b])),
            _ => None,
        }
    }
}

/// Integer mean rounded half up. Returns 0 for an empty slice.
#[must_use]
pub fn rounded_mean(values: &[u32]) -> u32 {
    if values.is_empty() {
        return 0;
    }
    let n = values.len() as u64;
    let sum: u64 = values.iter().map(|&v| v as u64).sum();
    ((sum * 2 + n) / (n * 2)) as u32
}

// =============================================================================
// PHASE RECORD
// =============================================================================

/// What was done on site during one phase.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub technician: Technician,
    pub client_contact: ClientContact,
    pub dosimeters: Vec<DosimeterPlacement>,
}

// =============================================================================
// CAMPAIGN
// =============================================================================

/// A radon monitoring engagement at one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    /// Commessa.
    pub work_order: String,
    /// Cliente.
    pub client: String,
    /// Insegna.
    pub sign: String,
    pub city: String,
    pub province: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    /// Altro.
    pub notes: String,
    pub status: CampaignStatus,
    pub risk_level: RiskLevel,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Campaign-wide average, Bq/m³.
    pub average_level: Option<u32>,
    /// Dosimeters planned at creation (dosimetri previsti).
    pub expected_dosimeters: Option<u32>,
    /// Total committed when Phase 2 completes.
    pub dosimeter_count: Option<u32>,
    pub phase1: Option<PhaseRecord>,
    pub phase2: Option<PhaseRecord>,
}

impl Campaign {
    /// Display location, "City, Address".
    #[must_use]
    pub fn location(&self) -> String {
        match (self.city.trim(), self.address.trim()) {
            (city, "") => city.to_string(),
            ("", address) => address.to_string(),
            (city, address) => format!("{}, {}", city, address),
        }
    }

    /// Dosimeters currently on record, from the most recent phase.
    #[must_use]
    pub fn dosimeters(&self) -> &[DosimeterPlacement] {
        self.phase2
            .as_ref()
            .or(self.phase1.as_ref())
            .map(|p| p.dosimeters.as_slice())
            .unwrap_or(&[])
    }
}

// =============================================================================
// STOCK LEDGER ENTRY
// =============================================================================

/// One delivery of dosimeters into the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    /// `recorded_at` as epoch milliseconds, the wall-clock time read as UTC.
    /// Only ordering matters: ids are unique and increase with each entry.
    pub id: i64,
    pub quantity: u32,
    pub order_ref: String,
    pub user: String,
    pub recorded_at: NaiveDateTime,
}

impl StockEntry {
    /// Timestamp as shown in the ledger, `dd/mm/yyyy HH:MM`.
    #[must_use]
    pub fn display_timestamp(&self) -> String {
        self.recorded_at.format("%d/%m/%Y %H:%M").to_string()
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Radon system.
///
/// - Validation failures are never fatal; they carry every field issue
/// - Storage read failures degrade to empty data inside the store and do
///   not surface here
#[derive(Debug, Error)]
pub enum RadonError {
    /// A form submission failed field validation.
    #[error("Validation failed: {0}")]
    Validation(ValidationReport),

    /// No campaign with this id exists.
    #[error("Campaign not found: {0}")]
    CampaignNotFound(CampaignId),

    /// The campaign is not in a state that allows this step.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl RadonError {
    /// The validation report, if this is a validation failure.
    #[must_use]
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            RadonError::Validation(report) => Some(report),
            _ => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_id_skips_non_numeric() {
        let ids = [
            CampaignId::new("1"),
            CampaignId::new("legacy-x"),
            CampaignId::new("7"),
        ];
        assert_eq!(CampaignId::next_after(&ids), CampaignId::new("8"));
        assert_eq!(CampaignId::next_after(&[]), CampaignId::new("1"));
    }

    #[test]
    fn rounded_mean_rounds_half_up() {
        assert_eq!(rounded_mean(&[100, 101]), 101);
        assert_eq!(rounded_mean(&[100, 100]), 100);
        assert_eq!(rounded_mean(&[1, 2, 2]), 2);
        assert_eq!(rounded_mean(&[]), 0);
    }

    #[test]
    fn placement_average_needs_both_readings() {
        let mut d = DosimeterPlacement::new(1);
        d.reading_phase1 = Some(120);
        assert_eq!(d.average_reading(), None);
        d.reading_phase2 = Some(95);
        assert_eq!(d.average_reading(), Some(108));
    }

    #[test]
    fn status_parse_roundtrip() {
        for status in [
            CampaignStatus::Planned,
            CampaignStatus::Unplanned,
            CampaignStatus::Active,
            CampaignStatus::AwaitingResults,
            CampaignStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<CampaignStatus>().ok(), Some(status));
        }
        assert!("fase1".parse::<CampaignStatus>().is_err());
    }

    #[test]
    fn photo_decode_rejects_garbage() {
        let photo = Photo {
            file_name: "a.jpg".to_string(),
            media_type: "image/jpeg".to_string(),
            data: "not base64!!".to_string(),
        };
        assert!(matches!(photo.decode(), Err(IssueKind::InvalidPhoto(_))));

        let ok = Photo::from_bytes("b.jpg", "image/jpeg", &[0xFF, 0xD8, 0xFF]);
        assert_eq!(ok.decode().expect("decode"), vec![0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn stock_entry_display_timestamp() {
        let entry = StockEntry {
            id: 1,
            quantity: 10,
            order_ref: "ORD-1".to_string(),
            user: "Mario".to_string(),
            recorded_at: NaiveDate::from_ymd_opt(2025, 3, 4)
                .and_then(|d| d.and_hms_opt(9, 5, 0))
                .expect("valid datetime"),
        };
        assert_eq!(entry.display_timestamp(), "04/03/2025 09:05");
    }
}
