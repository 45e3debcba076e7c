//! # API Request/Response Types
//!
//! JSON bodies of the HTTP API. Domain records (`Campaign`, `Board`,
//! `InventorySummary`, `StockEntry`) are served as-is; only the shapes
//! specific to HTTP live here.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use radon_core::{
    Campaign, CampaignId, DosimeterPlacement, Photo, RadonError, ReadingInput, ResultsForm,
    Signatures, StockEntry,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// BOARD QUERY
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardQuery {
    pub search: Option<String>,
}

// =============================================================================
// CAMPAIGN RESPONSES
// =============================================================================

/// Response to step 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: CampaignId,
    pub campaign: Campaign,
}

// =============================================================================
// PHASE REQUESTS
// =============================================================================

/// One dosimeter row of a Phase 1 submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementInput {
    /// Row id; rows without one are numbered in order.
    pub id: Option<u32>,
    pub code: String,
    pub floor: String,
    pub location: String,
    pub photos: Vec<Photo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Phase1Request {
    pub placement_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub signatures: Signatures,
    pub dosimeters: Vec<PlacementInput>,
}

impl Phase1Request {
    /// Rows with ids filled in, skipping ids already taken.
    pub fn rows(&self) -> Vec<DosimeterPlacement> {
        let mut next = self
            .dosimeters
            .iter()
            .filter_map(|d| d.id)
            .max()
            .unwrap_or(0);
        self.dosimeters
            .iter()
            .map(|d| {
                let id = d.id.unwrap_or_else(|| {
                    next += 1;
                    next
                });
                DosimeterPlacement {
                    code_phase1: d.code.clone(),
                    floor: d.floor.clone(),
                    location: d.location.clone(),
                    photos: d.photos.clone(),
                    ..DosimeterPlacement::new(id)
                }
            })
            .collect()
    }
}

/// One swapped dosimeter of a Phase 2 submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplacementInput {
    pub id: u32,
    pub code: String,
    pub photos: Vec<Photo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Phase2Request {
    /// Defaults to today.
    pub start_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub signatures: Signatures,
    pub replacements: Vec<ReplacementInput>,
}

// =============================================================================
// RESULTS REQUEST
// =============================================================================

/// A reading sent either as a JSON number (decimals allowed) or as typed
/// text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadingValue {
    Number(serde_json::Number),
    Text(String),
}

impl ReadingValue {
    fn into_text(self) -> String {
        match self {
            ReadingValue::Number(n) => n.to_string(),
            ReadingValue::Text(s) => s,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingRow {
    pub dosimeter: u32,
    pub phase1: Option<ReadingValue>,
    pub phase2: Option<ReadingValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsRequest {
    pub readings: Vec<ReadingRow>,
}

impl ResultsRequest {
    pub fn into_form(self) -> ResultsForm {
        let mut form = ResultsForm::default();
        for row in self.readings {
            form.readings.insert(
                row.dosimeter,
                ReadingInput {
                    phase1: row.phase1.map(ReadingValue::into_text).unwrap_or_default(),
                    phase2: row.phase2.map(ReadingValue::into_text).unwrap_or_default(),
                },
            );
        }
        form
    }
}

// =============================================================================
// STOCK
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRequest {
    pub quantity: i64,
    #[serde(default)]
    pub order_ref: String,
    /// Falls back to the configured operator.
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockResponse {
    pub baseline: u32,
    pub total: i64,
    /// Most recent first.
    pub entries: Vec<StockEntry>,
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub issues: Vec<FieldIssue>,
}

/// Maps core errors onto HTTP statuses.
#[derive(Debug)]
pub struct ApiError(pub RadonError);

impl From<RadonError> for ApiError {
    fn from(e: RadonError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            RadonError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RadonError::CampaignNotFound(_) => StatusCode::NOT_FOUND,
            RadonError::InvalidTransition(_) => StatusCode::CONFLICT,
            RadonError::SerializationError(_) | RadonError::IoError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let issues = self
            .0
            .report()
            .map(|report| {
                report
                    .issues()
                    .map(|i| FieldIssue {
                        field: i.field.to_string(),
                        message: i.kind.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let body = ErrorResponse {
            error: self.0.to_string(),
            issues,
        };
        (status, Json(body)).into_response()
    }
}
