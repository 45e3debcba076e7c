//! Form field identifiers and field-level validation reports.
//!
//! Every form in the workflow is a fixed set of named fields. Setters take
//! one of the enums below instead of a free-form key, and validation
//! failures point back at the same identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// FIELD IDENTIFIERS
// =============================================================================

/// Text fields of the campaign data step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignField {
    Name,
    /// Commessa.
    WorkOrder,
    /// Cliente.
    Client,
    /// Insegna.
    Sign,
    City,
    Province,
    Address,
    Phone,
    Email,
    Notes,
}

impl CampaignField {
    /// Fields that must be non-empty before the campaign is created.
    pub const REQUIRED: [CampaignField; 3] = [
        CampaignField::WorkOrder,
        CampaignField::Client,
        CampaignField::City,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignField::Name => "name",
            CampaignField::WorkOrder => "work_order",
            CampaignField::Client => "client",
            CampaignField::Sign => "sign",
            CampaignField::City => "city",
            CampaignField::Province => "province",
            CampaignField::Address => "address",
            CampaignField::Phone => "phone",
            CampaignField::Email => "email",
            CampaignField::Notes => "notes",
        }
    }
}

/// Signature-block fields shared by the Phase 1 and Phase 2 steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseField {
    TechnicianFirstName,
    TechnicianLastName,
    TechnicianSignature,
    ContactFirstName,
    ContactLastName,
    ContactRole,
    ContactSignature,
}

impl PhaseField {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseField::TechnicianFirstName => "technician.first_name",
            PhaseField::TechnicianLastName => "technician.last_name",
            PhaseField::TechnicianSignature => "technician.signature",
            PhaseField::ContactFirstName => "client_contact.first_name",
            PhaseField::ContactLastName => "client_contact.last_name",
            PhaseField::ContactRole => "client_contact.role",
            PhaseField::ContactSignature => "client_contact.signature",
        }
    }
}

/// Editable columns of a dosimeter row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DosimeterField {
    Code,
    Floor,
    Location,
}

/// Measurement phase a reading belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    One,
    Two,
}

impl Phase {
    #[must_use]
    pub fn number(&self) -> u8 {
        match self {
            Phase::One => 1,
            Phase::Two => 2,
        }
    }
}

/// A field that can carry a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Campaign(CampaignField),
    ExpectedDosimeters,
    Phase(PhaseField),
    Phase2StartDate,
    /// The dosimeter list as a whole.
    Dosimeters,
    DosimeterCode(u32),
    DosimeterPhotos(u32),
    Reading { dosimeter: u32, phase: Phase },
    WithdrawalDate,
    StockQuantity,
    StockOrderRef,
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormField::Campaign(field) => f.write_str(field.as_str()),
            FormField::ExpectedDosimeters => f.write_str("expected_dosimeters"),
            FormField::Phase(field) => f.write_str(field.as_str()),
            FormField::Phase2StartDate => f.write_str("start_date"),
            FormField::Dosimeters => f.write_str("dosimeters"),
            FormField::DosimeterCode(id) => write!(f, "dosimeters[{}].code", id),
            FormField::DosimeterPhotos(id) => write!(f, "dosimeters[{}].photos", id),
            FormField::Reading { dosimeter, phase } => {
                write!(f, "dosimeters[{}].reading_phase{}", dosimeter, phase.number())
            }
            FormField::WithdrawalDate => f.write_str("withdrawal_date"),
            FormField::StockQuantity => f.write_str("quantity"),
            FormField::StockOrderRef => f.write_str("order_ref"),
        }
    }
}

// =============================================================================
// ISSUES
// =============================================================================

/// What is wrong with a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// Field is empty but mandatory.
    Required,
    /// Text could not be read as a non-negative number.
    InvalidNumber,
    /// Number is outside the accepted range.
    OutOfRange { max: u32 },
    /// Quantity must be at least one.
    NotPositive,
    /// More photos than a dosimeter may carry.
    TooManyPhotos { max: usize },
    /// A replaced dosimeter needs at least one photo.
    PhotoRequired,
    /// Photo payload is not valid base64 or is too large.
    InvalidPhoto(String),
    /// Text exceeds the maximum length.
    TooLong { max: usize },
    /// A list that must keep at least one element.
    AtLeastOne,
    /// Date falls before the campaign start.
    BeforeStart,
    /// Another dosimeter row already uses this id.
    DuplicateId,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::Required => f.write_str("required field"),
            IssueKind::InvalidNumber => f.write_str("not a valid value"),
            IssueKind::OutOfRange { max } => write!(f, "must not exceed {}", max),
            IssueKind::NotPositive => f.write_str("must be at least 1"),
            IssueKind::TooManyPhotos { max } => write!(f, "at most {} photos per dosimeter", max),
            IssueKind::PhotoRequired => f.write_str("at least one photo is required"),
            IssueKind::InvalidPhoto(reason) => write!(f, "invalid photo: {}", reason),
            IssueKind::TooLong { max } => write!(f, "longer than {} characters", max),
            IssueKind::AtLeastOne => f.write_str("at least one entry is required"),
            IssueKind::BeforeStart => f.write_str("earlier than the campaign start"),
            IssueKind::DuplicateId => f.write_str("dosimeter id used twice"),
        }
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: FormField,
    pub kind: IssueKind,
}

impl ValidationIssue {
    #[must_use]
    pub fn new(field: FormField, kind: IssueKind) -> Self {
        Self { field, kind }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.kind)
    }
}

/// All issues found while validating one form submission.
///
/// Issues are kept sorted by field so reports compare equal regardless of
/// the order checks ran in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue. A field keeps only its first issue.
    pub fn push(&mut self, field: FormField, kind: IssueKind) {
        if self.has(field) {
            return;
        }
        let at = self.issues.partition_point(|i| i.field < field);
        self.issues.insert(at, ValidationIssue::new(field, kind));
    }

    #[must_use]
    pub fn has(&self, field: FormField) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }

    #[must_use]
    pub fn get(&self, field: FormField) -> Option<&IssueKind> {
        self.issues.iter().find(|i| i.field == field).map(|i| &i.kind)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter()
    }

    /// Convert into a `Result`, failing when any issue was recorded.
    pub fn into_result(self) -> Result<(), crate::RadonError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(crate::RadonError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for issue in &self.issues {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}", issue)?;
            first = false;
        }
        Ok(())
    }
}

/// Check a mandatory text field.
pub(crate) fn require(report: &mut ValidationReport, field: FormField, value: &str) {
    if value.trim().is_empty() {
        report.push(field, IssueKind::Required);
    }
}

/// Check a free-text field against the length limit.
pub(crate) fn limit_length(report: &mut ValidationReport, field: FormField, value: &str) {
    let max = crate::primitives::MAX_TEXT_LENGTH;
    if value.chars().count() > max {
        report.push(field, IssueKind::TooLong { max });
    }
}

/// Parse a reading typed into a form: a non-negative number of Bq/m³.
///
/// Lab reports may carry decimals, written with `.` or `,`. The value is
/// rounded half up to a whole Bq/m³.
pub fn parse_reading(raw: &str) -> Result<u32, IssueKind> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IssueKind::Required);
    }
    let (whole, fraction) = match trimmed.split_once(['.', ',']) {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !digits(whole) || !digits(fraction) {
        return Err(IssueKind::InvalidNumber);
    }

    let max = crate::primitives::MAX_READING_BQ_M3;
    let mut value: u64 = 0;
    for b in whole.bytes() {
        value = value * 10 + u64::from(b - b'0');
        if value > u64::from(max) {
            return Err(IssueKind::OutOfRange { max });
        }
    }
    if fraction.bytes().next().is_some_and(|b| b >= b'5') {
        value += 1;
    }
    if value > u64::from(max) {
        return Err(IssueKind::OutOfRange { max });
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_keeps_first_issue_per_field() {
        let mut report = ValidationReport::new();
        report.push(FormField::DosimeterCode(2), IssueKind::Required);
        report.push(FormField::DosimeterCode(2), IssueKind::TooLong { max: 4 });

        assert_eq!(report.len(), 1);
        assert_eq!(
            report.get(FormField::DosimeterCode(2)),
            Some(&IssueKind::Required)
        );
    }

    #[test]
    fn report_sorted_by_field() {
        let mut report = ValidationReport::new();
        report.push(FormField::DosimeterPhotos(1), IssueKind::PhotoRequired);
        report.push(
            FormField::Campaign(CampaignField::Client),
            IssueKind::Required,
        );

        let fields: Vec<_> = report.issues().map(|i| i.field).collect();
        assert_eq!(
            fields,
            vec![
                FormField::Campaign(CampaignField::Client),
                FormField::DosimeterPhotos(1)
            ]
        );
    }

    #[test]
    fn field_display_paths() {
        assert_eq!(FormField::DosimeterCode(3).to_string(), "dosimeters[3].code");
        assert_eq!(
            FormField::Reading {
                dosimeter: 4,
                phase: Phase::Two
            }
            .to_string(),
            "dosimeters[4].reading_phase2"
        );
        assert_eq!(
            FormField::Campaign(CampaignField::WorkOrder).to_string(),
            "work_order"
        );
    }

    #[test]
    fn parse_reading_rules() {
        assert_eq!(parse_reading(" 120 "), Ok(120));
        assert_eq!(parse_reading(""), Err(IssueKind::Required));
        assert_eq!(parse_reading("-4"), Err(IssueKind::InvalidNumber));
        assert!(matches!(
            parse_reading("999999999"),
            Err(IssueKind::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_reading("99999999999999999999999"),
            Err(IssueKind::OutOfRange { .. })
        ));
    }

    #[test]
    fn parse_reading_rounds_decimals_half_up() {
        assert_eq!(parse_reading("12.5"), Ok(13));
        assert_eq!(parse_reading("12.49"), Ok(12));
        assert_eq!(parse_reading("87,6"), Ok(88));
        assert_eq!(parse_reading("140.0"), Ok(140));
        assert_eq!(parse_reading("0.4"), Ok(0));
        assert_eq!(parse_reading(".5"), Ok(1));
        assert_eq!(parse_reading("7."), Ok(7));
        assert_eq!(parse_reading("1.2.3"), Err(IssueKind::InvalidNumber));
        assert_eq!(parse_reading("."), Err(IssueKind::InvalidNumber));
        assert_eq!(parse_reading("1e3"), Err(IssueKind::InvalidNumber));
        assert_eq!(parse_reading("-0.5"), Err(IssueKind::InvalidNumber));
    }
}
