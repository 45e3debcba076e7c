//! Unit tests for API request/response types.

#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use radon::api::{
    ApiError, HealthResponse, Phase1Request, ReadingValue, ResultsRequest, StockRequest,
};
use radon_core::{CampaignId, FormField, IssueKind, RadonError, ValidationReport};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

// =============================================================================
// PHASE 1 REQUEST
// =============================================================================

#[test]
fn test_phase1_rows_numbered_after_explicit_ids() {
    let json = r#"{
        "dosimeters": [
            {"code": "A"},
            {"id": 5, "code": "B"},
            {"code": "C"}
        ]
    }"#;
    let request: Phase1Request = serde_json::from_str(json).unwrap();
    let ids: Vec<u32> = request.rows().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![6, 5, 7]);
}

#[test]
fn test_phase1_signatures_are_flattened() {
    let json = r#"{
        "placement_date": "2025-03-01",
        "technician": {"first_name": "Luca"},
        "client_contact": {"role": "Custode"},
        "dosimeters": [{"code": "A", "floor": "1"}]
    }"#;
    let request: Phase1Request = serde_json::from_str(json).unwrap();
    assert_eq!(request.signatures.technician.first_name, "Luca");
    assert_eq!(request.signatures.client_contact.role, "Custode");
    assert_eq!(request.rows()[0].floor, "1");
}

// =============================================================================
// RESULTS REQUEST
// =============================================================================

#[test]
fn test_reading_accepts_number_or_text() {
    let json = r#"{"readings": [
        {"dosimeter": 1, "phase1": 120, "phase2": "95"},
        {"dosimeter": 2, "phase1": "1,5", "phase2": 87.5}
    ]}"#;
    let request: ResultsRequest = serde_json::from_str(json).unwrap();
    assert_eq!(
        request.readings[0].phase1,
        Some(ReadingValue::Number(120.into()))
    );

    let form = request.into_form();
    assert_eq!(form.readings[&1].phase1, "120");
    assert_eq!(form.readings[&1].phase2, "95");
    assert_eq!(form.readings[&2].phase1, "1,5");
    assert_eq!(form.readings[&2].phase2, "87.5");
}

#[test]
fn test_decimal_readings_round_half_up() {
    let json = r#"{"readings": [{"dosimeter": 1, "phase1": 120.5, "phase2": "99,4"}]}"#;
    let request: ResultsRequest = serde_json::from_str(json).unwrap();
    let results = request.into_form().parse(&[1]).unwrap();
    assert_eq!(results[0].reading_phase1, 121);
    assert_eq!(results[0].reading_phase2, 99);
    assert_eq!(results[0].average, 110);
}

// =============================================================================
// STOCK REQUEST
// =============================================================================

#[test]
fn test_stock_request_optional_fields() {
    let request: StockRequest = serde_json::from_str(r#"{"quantity": 20}"#).unwrap();
    assert_eq!(request.quantity, 20);
    assert!(request.order_ref.is_empty());
    assert!(request.user.is_none());
}

// =============================================================================
// ERROR MAPPING
// =============================================================================

#[test]
fn test_error_status_codes() {
    let mut report = ValidationReport::new();
    report.push(FormField::StockQuantity, IssueKind::NotPositive);

    let cases = [
        (RadonError::Validation(report), StatusCode::UNPROCESSABLE_ENTITY),
        (
            RadonError::CampaignNotFound(CampaignId::new("7")),
            StatusCode::NOT_FOUND,
        ),
        (
            RadonError::InvalidTransition("no".to_string()),
            StatusCode::CONFLICT,
        ),
        (
            RadonError::IoError("disk".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];
    for (error, status) in cases {
        assert_eq!(ApiError::from(error).status(), status);
    }
}
