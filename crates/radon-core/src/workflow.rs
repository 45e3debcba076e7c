//! # Campaign Wizard
//!
//! The linear data-entry flow that creates a campaign and carries it
//! through both placement phases:
//!
//! ```text
//! CampaignData ──▶ Phase1Placement ──▶ Phase2Replacement ──▶ Done
//!      ◀── back ──────────┘ ◀── back ──────────┘
//! ```
//!
//! Each step has its own typed form. A step only advances when its form
//! validates, and every advance commits to the registry:
//!
//! | Step submitted      | Commit                                            |
//! |---------------------|---------------------------------------------------|
//! | campaign data       | new campaign, status `planned` (or update on redo) |
//! | Phase 1 placement   | phase 1 record, status `active`, start date        |
//! | Phase 2 replacement | phase 2 record, dosimeter count, completion event  |
//!
//! Going back never discards what was typed.

use crate::primitives::{MAX_DOSIMETERS_PER_CAMPAIGN, MAX_PHOTOS_PER_DOSIMETER};
use crate::storage::{CampaignRegistry, StoreEvent};
use crate::{
    Campaign, CampaignField, CampaignId, CampaignStatus, ClientContact, DosimeterField,
    DosimeterPlacement, FormField, IssueKind, PhaseField, PhaseRecord, Photo, RadonError,
    RiskLevel, Technician, ValidationReport, limit_length, require,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// STEPS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    CampaignData,
    Phase1Placement,
    Phase2Replacement,
    Done,
}

impl WizardStep {
    /// Step shown before this one, if any.
    #[must_use]
    pub fn previous(&self) -> Option<WizardStep> {
        match self {
            WizardStep::CampaignData | WizardStep::Done => None,
            WizardStep::Phase1Placement => Some(WizardStep::CampaignData),
            WizardStep::Phase2Replacement => Some(WizardStep::Phase1Placement),
        }
    }
}

// =============================================================================
// STEP 1: CAMPAIGN DATA
// =============================================================================

/// Site and client details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignDataForm {
    pub name: String,
    pub work_order: String,
    pub client: String,
    pub sign: String,
    pub city: String,
    pub province: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub notes: String,
    pub risk_level: RiskLevel,
    /// Planned start; today when left empty.
    pub start_date: Option<NaiveDate>,
    pub expected_dosimeters: Option<u32>,
}

impl CampaignDataForm {
    pub fn set(&mut self, field: CampaignField, value: impl Into<String>) {
        *self.slot_mut(field) = value.into();
    }

    #[must_use]
    pub fn get(&self, field: CampaignField) -> &str {
        match field {
            CampaignField::Name => &self.name,
            CampaignField::WorkOrder => &self.work_order,
            CampaignField::Client => &self.client,
            CampaignField::Sign => &self.sign,
            CampaignField::City => &self.city,
            CampaignField::Province => &self.province,
            CampaignField::Address => &self.address,
            CampaignField::Phone => &self.phone,
            CampaignField::Email => &self.email,
            CampaignField::Notes => &self.notes,
        }
    }

    fn slot_mut(&mut self, field: CampaignField) -> &mut String {
        match field {
            CampaignField::Name => &mut self.name,
            CampaignField::WorkOrder => &mut self.work_order,
            CampaignField::Client => &mut self.client,
            CampaignField::Sign => &mut self.sign,
            CampaignField::City => &mut self.city,
            CampaignField::Province => &mut self.province,
            CampaignField::Address => &mut self.address,
            CampaignField::Phone => &mut self.phone,
            CampaignField::Email => &mut self.email,
            CampaignField::Notes => &mut self.notes,
        }
    }

    /// Prefill from a stored campaign.
    #[must_use]
    pub fn from_campaign(campaign: &Campaign) -> Self {
        Self {
            name: campaign.name.clone(),
            work_order: campaign.work_order.clone(),
            client: campaign.client.clone(),
            sign: campaign.sign.clone(),
            city: campaign.city.clone(),
            province: campaign.province.clone(),
            address: campaign.address.clone(),
            phone: campaign.phone.clone(),
            email: campaign.email.clone(),
            notes: campaign.notes.clone(),
            risk_level: campaign.risk_level,
            start_date: Some(campaign.start_date),
            expected_dosimeters: campaign.expected_dosimeters,
        }
    }

    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        for field in CampaignField::REQUIRED {
            require(&mut report, FormField::Campaign(field), self.get(field));
        }
        for field in ALL_CAMPAIGN_FIELDS {
            limit_length(&mut report, FormField::Campaign(field), self.get(field));
        }
        if self
            .expected_dosimeters
            .is_some_and(|n| (n as usize) > MAX_DOSIMETERS_PER_CAMPAIGN)
        {
            report.push(
                FormField::ExpectedDosimeters,
                IssueKind::OutOfRange {
                    max: MAX_DOSIMETERS_PER_CAMPAIGN as u32,
                },
            );
        }
        report
    }

    fn apply_to(&self, campaign: &mut Campaign) {
        campaign.name = display_name(self);
        campaign.work_order = self.work_order.trim().to_string();
        campaign.client = self.client.trim().to_string();
        campaign.sign = self.sign.trim().to_string();
        campaign.city = self.city.trim().to_string();
        campaign.province = self.province.trim().to_string();
        campaign.address = self.address.trim().to_string();
        campaign.phone = self.phone.trim().to_string();
        campaign.email = self.email.trim().to_string();
        campaign.notes = self.notes.trim().to_string();
        campaign.risk_level = self.risk_level;
        campaign.expected_dosimeters = self.expected_dosimeters;
    }
}

const ALL_CAMPAIGN_FIELDS: [CampaignField; 10] = [
    CampaignField::Name,
    CampaignField::WorkOrder,
    CampaignField::Client,
    CampaignField::Sign,
    CampaignField::City,
    CampaignField::Province,
    CampaignField::Address,
    CampaignField::Phone,
    CampaignField::Email,
    CampaignField::Notes,
];

/// Campaign name, falling back to "<client> - <city>" when none was typed.
fn display_name(form: &CampaignDataForm) -> String {
    match form.name.trim() {
        "" => format!("{} - {}", form.client.trim(), form.city.trim()),
        name => name.to_string(),
    }
}

// =============================================================================
// SIGNATURE BLOCKS
// =============================================================================

/// Technician and client contact, shared by both placement steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Signatures {
    pub technician: Technician,
    pub client_contact: ClientContact,
}

impl Signatures {
    pub fn set(&mut self, field: PhaseField, value: impl Into<String>) {
        let value = value.into();
        match field {
            PhaseField::TechnicianFirstName => self.technician.first_name = value,
            PhaseField::TechnicianLastName => self.technician.last_name = value,
            PhaseField::TechnicianSignature => self.technician.signature = value,
            PhaseField::ContactFirstName => self.client_contact.first_name = value,
            PhaseField::ContactLastName => self.client_contact.last_name = value,
            PhaseField::ContactRole => self.client_contact.role = value,
            PhaseField::ContactSignature => self.client_contact.signature = value,
        }
    }

    fn check(&self, report: &mut ValidationReport) {
        let fields = [
            (PhaseField::TechnicianFirstName, &self.technician.first_name),
            (PhaseField::TechnicianLastName, &self.technician.last_name),
            (PhaseField::TechnicianSignature, &self.technician.signature),
            (PhaseField::ContactFirstName, &self.client_contact.first_name),
            (PhaseField::ContactLastName, &self.client_contact.last_name),
            (PhaseField::ContactRole, &self.client_contact.role),
            (PhaseField::ContactSignature, &self.client_contact.signature),
        ];
        for (field, value) in fields {
            limit_length(report, FormField::Phase(field), value);
        }
    }
}

/// Check the photo set of one dosimeter row.
fn check_photos(report: &mut ValidationReport, id: u32, photos: &[Photo]) {
    let field = FormField::DosimeterPhotos(id);
    if photos.len() > MAX_PHOTOS_PER_DOSIMETER {
        report.push(
            field,
            IssueKind::TooManyPhotos {
                max: MAX_PHOTOS_PER_DOSIMETER,
            },
        );
        return;
    }
    for photo in photos {
        if let Err(kind) = photo.decode() {
            report.push(field, kind);
            return;
        }
    }
}

/// Append photos to a row, refusing to go past the per-dosimeter limit.
fn attach(row: &mut DosimeterPlacement, photos: Vec<Photo>) -> Result<(), RadonError> {
    if row.photos.len() + photos.len() > MAX_PHOTOS_PER_DOSIMETER {
        let mut report = ValidationReport::new();
        report.push(
            FormField::DosimeterPhotos(row.id),
            IssueKind::TooManyPhotos {
                max: MAX_PHOTOS_PER_DOSIMETER,
            },
        );
        return Err(RadonError::Validation(report));
    }
    row.photos.extend(photos);
    Ok(())
}

fn row_not_found(id: u32) -> RadonError {
    let mut report = ValidationReport::new();
    report.push(FormField::DosimeterCode(id), IssueKind::Required);
    RadonError::Validation(report)
}

// =============================================================================
// STEP 2: PHASE 1 PLACEMENT
// =============================================================================

/// Dosimeters placed at the start of the campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Phase1Form {
    /// Placement date; today when left empty.
    pub placement_date: Option<NaiveDate>,
    pub signatures: Signatures,
    pub rows: Vec<DosimeterPlacement>,
}

impl Default for Phase1Form {
    /// A form starts with one empty row.
    fn default() -> Self {
        Self {
            placement_date: None,
            signatures: Signatures::default(),
            rows: vec![DosimeterPlacement::new(1)],
        }
    }
}

impl Phase1Form {
    /// A form with `count` empty rows, clamped to `1..=MAX_DOSIMETERS_PER_CAMPAIGN`.
    #[must_use]
    pub fn with_rows(count: u32) -> Self {
        let count = count.clamp(1, MAX_DOSIMETERS_PER_CAMPAIGN as u32);
        Self {
            rows: (1..=count).map(DosimeterPlacement::new).collect(),
            ..Self::default()
        }
    }

    /// Add an empty row and return its id.
    pub fn add_row(&mut self) -> u32 {
        let id = self.rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        self.rows.push(DosimeterPlacement::new(id));
        id
    }

    /// Remove a row. The last remaining row cannot be removed.
    pub fn remove_row(&mut self, id: u32) -> Result<(), RadonError> {
        if self.rows.len() <= 1 {
            let mut report = ValidationReport::new();
            report.push(FormField::Dosimeters, IssueKind::AtLeastOne);
            return Err(RadonError::Validation(report));
        }
        let before = self.rows.len();
        self.rows.retain(|r| r.id != id);
        if self.rows.len() == before {
            return Err(row_not_found(id));
        }
        Ok(())
    }

    pub fn set_row(
        &mut self,
        id: u32,
        field: DosimeterField,
        value: impl Into<String>,
    ) -> Result<(), RadonError> {
        let row = self
            .rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| row_not_found(id))?;
        let value = value.into();
        match field {
            DosimeterField::Code => row.code_phase1 = value,
            DosimeterField::Floor => row.floor = value,
            DosimeterField::Location => row.location = value,
        }
        Ok(())
    }

    pub fn attach_photos(&mut self, id: u32, photos: Vec<Photo>) -> Result<(), RadonError> {
        let row = self
            .rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| row_not_found(id))?;
        attach(row, photos)
    }

    /// Every row needs a device code and an id of its own; photos are
    /// optional here.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        if self.rows.is_empty() {
            report.push(FormField::Dosimeters, IssueKind::AtLeastOne);
        } else if self.rows.len() > MAX_DOSIMETERS_PER_CAMPAIGN {
            report.push(
                FormField::Dosimeters,
                IssueKind::OutOfRange {
                    max: MAX_DOSIMETERS_PER_CAMPAIGN as u32,
                },
            );
        }
        let mut seen = BTreeSet::new();
        for row in &self.rows {
            let code = FormField::DosimeterCode(row.id);
            if !seen.insert(row.id) {
                report.push(code, IssueKind::DuplicateId);
            }
            require(&mut report, code, &row.code_phase1);
            limit_length(&mut report, code, &row.code_phase1);
            check_photos(&mut report, row.id, &row.photos);
        }
        self.signatures.check(&mut report);
        report
    }

    fn from_record(record: &PhaseRecord) -> Self {
        Self {
            placement_date: record.start_date,
            signatures: Signatures {
                technician: record.technician.clone(),
                client_contact: record.client_contact.clone(),
            },
            rows: record.dosimeters.clone(),
        }
    }
}

// =============================================================================
// STEP 3: PHASE 2 REPLACEMENT
// =============================================================================

/// One position in the replacement step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase2Row {
    pub placement: DosimeterPlacement,
    /// The Phase 1 device was swapped for a new one at this position.
    pub replaced: bool,
}

/// Dosimeters swapped at the six-month pickup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Phase2Form {
    /// Date the new devices went in; today when left empty.
    pub start_date: Option<NaiveDate>,
    pub signatures: Signatures,
    pub rows: Vec<Phase2Row>,
}

impl Phase2Form {
    /// Rows mirror Phase 1 positions; codes and photos start empty.
    #[must_use]
    pub fn seeded_from(phase1: &[DosimeterPlacement]) -> Self {
        Self {
            start_date: None,
            signatures: Signatures::default(),
            rows: phase1
                .iter()
                .map(|p| Phase2Row {
                    placement: DosimeterPlacement {
                        code_phase2: String::new(),
                        photos: Vec::new(),
                        ..p.clone()
                    },
                    replaced: false,
                })
                .collect(),
        }
    }

    fn row_mut(&mut self, id: u32) -> Result<&mut Phase2Row, RadonError> {
        self.rows
            .iter_mut()
            .find(|r| r.placement.id == id)
            .ok_or_else(|| row_not_found(id))
    }

    /// Set the replacement device code. A code marks the row replaced.
    pub fn set_code(&mut self, id: u32, code: impl Into<String>) -> Result<(), RadonError> {
        let row = self.row_mut(id)?;
        row.placement.code_phase2 = code.into();
        row.replaced = true;
        Ok(())
    }

    pub fn mark_replaced(&mut self, id: u32, replaced: bool) -> Result<(), RadonError> {
        self.row_mut(id)?.replaced = replaced;
        Ok(())
    }

    pub fn attach_photos(&mut self, id: u32, photos: Vec<Photo>) -> Result<(), RadonError> {
        attach(&mut self.row_mut(id)?.placement, photos)
    }

    /// Replaced rows need a code and one to three photos.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        for row in self.rows.iter().filter(|r| r.replaced) {
            let id = row.placement.id;
            let code = FormField::DosimeterCode(id);
            require(&mut report, code, &row.placement.code_phase2);
            limit_length(&mut report, code, &row.placement.code_phase2);
            if row.placement.photos.is_empty() {
                report.push(FormField::DosimeterPhotos(id), IssueKind::PhotoRequired);
            } else {
                check_photos(&mut report, id, &row.placement.photos);
            }
        }
        self.signatures.check(&mut report);
        report
    }

    fn from_record(record: &PhaseRecord) -> Self {
        Self {
            start_date: record.start_date,
            signatures: Signatures {
                technician: record.technician.clone(),
                client_contact: record.client_contact.clone(),
            },
            rows: record
                .dosimeters
                .iter()
                .map(|p| Phase2Row {
                    placement: p.clone(),
                    replaced: !p.code_phase2.trim().is_empty(),
                })
                .collect(),
        }
    }
}

// =============================================================================
// WIZARD
// =============================================================================

/// Result of completing Phase 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTwoSummary {
    pub campaign_id: CampaignId,
    pub campaign_name: String,
    pub dosimeter_count: u32,
    pub completed_on: NaiveDate,
}

/// Form state for one campaign across the wizard steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignWizard {
    step: WizardStep,
    campaign_id: Option<CampaignId>,
    pub campaign_data: CampaignDataForm,
    pub phase1: Phase1Form,
    pub phase2: Phase2Form,
}

impl Default for CampaignWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl CampaignWizard {
    /// A blank wizard at the campaign data step.
    #[must_use]
    pub fn new() -> Self {
        Self {
            step: WizardStep::CampaignData,
            campaign_id: None,
            campaign_data: CampaignDataForm::default(),
            phase1: Phase1Form::default(),
            phase2: Phase2Form::default(),
        }
    }

    /// Reopen the wizard for a stored campaign at the step it has reached.
    #[must_use]
    pub fn resume(campaign: &Campaign) -> Self {
        let phase1 = match &campaign.phase1 {
            Some(record) => Phase1Form::from_record(record),
            None => Phase1Form::with_rows(campaign.expected_dosimeters.unwrap_or(1)),
        };
        let phase2 = match (&campaign.phase2, &campaign.phase1) {
            (Some(record), _) => Phase2Form::from_record(record),
            (None, Some(record)) => Phase2Form::seeded_from(&record.dosimeters),
            (None, None) => Phase2Form::default(),
        };
        let step = match campaign.status {
            CampaignStatus::AwaitingResults | CampaignStatus::Completed => WizardStep::Done,
            _ if campaign.phase2.is_some() => WizardStep::Done,
            _ if campaign.phase1.is_some() => WizardStep::Phase2Replacement,
            _ => WizardStep::Phase1Placement,
        };
        Self {
            step,
            campaign_id: Some(campaign.id.clone()),
            campaign_data: CampaignDataForm::from_campaign(campaign),
            phase1,
            phase2,
        }
    }

    #[must_use]
    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// Id of the campaign committed at step 1, if any.
    #[must_use]
    pub fn campaign_id(&self) -> Option<&CampaignId> {
        self.campaign_id.as_ref()
    }

    /// Return to the previous step, keeping every form as typed.
    pub fn back(&mut self) -> WizardStep {
        if let Some(prev) = self.step.previous() {
            self.step = prev;
        }
        self.step
    }

    fn expect_step(&self, expected: WizardStep) -> Result<(), RadonError> {
        if self.step != expected {
            return Err(RadonError::InvalidTransition(format!(
                "wizard is at {:?}, not {:?}",
                self.step, expected
            )));
        }
        Ok(())
    }

    fn committed_id(&self) -> Result<CampaignId, RadonError> {
        self.campaign_id.clone().ok_or_else(|| {
            RadonError::InvalidTransition("campaign data not submitted yet".to_string())
        })
    }

    /// Step 1 → 2. Creates the campaign on first submit, updates it after
    /// back-navigation.
    pub fn submit_campaign_data(
        &mut self,
        registry: &mut CampaignRegistry,
        today: NaiveDate,
    ) -> Result<CampaignId, RadonError> {
        self.expect_step(WizardStep::CampaignData)?;
        self.campaign_data.validate().into_result()?;

        let form = &self.campaign_data;
        let start_date = form.start_date.unwrap_or(today);
        let id = match &self.campaign_id {
            Some(id) => {
                registry.update(id, |campaign| {
                    form.apply_to(campaign);
                    if campaign.status != CampaignStatus::Active {
                        campaign.start_date = start_date;
                    }
                    Ok(())
                })?;
                id.clone()
            }
            None => {
                let mut campaign = Campaign {
                    id: CampaignId::new(""),
                    name: String::new(),
                    work_order: String::new(),
                    client: String::new(),
                    sign: String::new(),
                    city: String::new(),
                    province: String::new(),
                    address: String::new(),
                    phone: String::new(),
                    email: String::new(),
                    notes: String::new(),
                    status: CampaignStatus::Planned,
                    risk_level: RiskLevel::Low,
                    start_date,
                    end_date: None,
                    average_level: None,
                    expected_dosimeters: None,
                    dosimeter_count: None,
                    phase1: None,
                    phase2: None,
                };
                form.apply_to(&mut campaign);
                registry.insert(campaign)?
            }
        };

        if let Some(expected) = self.campaign_data.expected_dosimeters {
            if self.phase1.rows.len() == 1 && self.phase1.rows[0].code_phase1.is_empty() {
                self.phase1 = Phase1Form::with_rows(expected);
            }
        }
        self.campaign_id = Some(id.clone());
        self.step = WizardStep::Phase1Placement;
        Ok(id)
    }

    /// Step 2 → 3. Commits the placement and starts the six-month clock.
    pub fn submit_phase1(
        &mut self,
        registry: &mut CampaignRegistry,
        today: NaiveDate,
    ) -> Result<(), RadonError> {
        self.expect_step(WizardStep::Phase1Placement)?;
        let id = self.committed_id()?;
        self.phase1.validate().into_result()?;

        let placed_on = self.phase1.placement_date.unwrap_or(today);
        let rows: Vec<DosimeterPlacement> = self
            .phase1
            .rows
            .iter()
            .map(|r| DosimeterPlacement {
                code_phase1: r.code_phase1.trim().to_string(),
                ..r.clone()
            })
            .collect();
        let record = PhaseRecord {
            start_date: Some(placed_on),
            end_date: None,
            technician: self.phase1.signatures.technician.clone(),
            client_contact: self.phase1.signatures.client_contact.clone(),
            dosimeters: rows.clone(),
        };

        registry.update(&id, |campaign| match campaign.status {
            CampaignStatus::Planned | CampaignStatus::Unplanned | CampaignStatus::Active
                if campaign.phase2.is_none() =>
            {
                campaign.phase1 = Some(record);
                campaign.status = CampaignStatus::Active;
                campaign.start_date = placed_on;
                Ok(())
            }
            status => Err(RadonError::InvalidTransition(format!(
                "cannot place Phase 1 dosimeters on a {} campaign",
                status
            ))),
        })?;
        tracing::info!(campaign = %id, dosimeters = rows.len(), %placed_on, "phase 1 placed");

        if !same_positions(&self.phase2, &rows) {
            self.phase2 = Phase2Form::seeded_from(&rows);
        }
        self.step = WizardStep::Phase2Replacement;
        Ok(())
    }

    /// Step 3 → Done. Commits the replacement and announces completion.
    pub fn submit_phase2(
        &mut self,
        registry: &mut CampaignRegistry,
        today: NaiveDate,
    ) -> Result<PhaseTwoSummary, RadonError> {
        self.expect_step(WizardStep::Phase2Replacement)?;
        let id = self.committed_id()?;
        self.phase2.validate().into_result()?;

        let rows: Vec<DosimeterPlacement> = self
            .phase2
            .rows
            .iter()
            .map(|r| DosimeterPlacement {
                code_phase2: if r.replaced {
                    r.placement.code_phase2.trim().to_string()
                } else {
                    String::new()
                },
                ..r.placement.clone()
            })
            .collect();
        let dosimeter_count = rows.len() as u32;
        let started_on = self.phase2.start_date.unwrap_or(today);
        let record = PhaseRecord {
            start_date: Some(started_on),
            end_date: Some(today),
            technician: self.phase2.signatures.technician.clone(),
            client_contact: self.phase2.signatures.client_contact.clone(),
            dosimeters: rows,
        };

        let campaign_name = registry.update(&id, |campaign| {
            if campaign.status != CampaignStatus::Active || campaign.phase1.is_none() {
                return Err(RadonError::InvalidTransition(format!(
                    "cannot replace dosimeters on a {} campaign without Phase 1",
                    campaign.status
                )));
            }
            if started_on < campaign.start_date {
                let mut report = ValidationReport::new();
                report.push(FormField::Phase2StartDate, IssueKind::BeforeStart);
                return Err(RadonError::Validation(report));
            }
            if let Some(phase1) = campaign.phase1.as_mut() {
                phase1.end_date.get_or_insert(today);
            }
            campaign.phase2 = Some(record);
            campaign.dosimeter_count = Some(dosimeter_count);
            Ok(campaign.name.clone())
        })?;

        registry.publish(&StoreEvent::PhaseTwoCompleted {
            campaign_id: id.clone(),
            campaign_name: campaign_name.clone(),
            dosimeter_count,
        });
        tracing::info!(campaign = %id, dosimeter_count, "phase 2 completed");

        self.step = WizardStep::Done;
        Ok(PhaseTwoSummary {
            campaign_id: id,
            campaign_name,
            dosimeter_count,
            completed_on: today,
        })
    }
}

/// Phase 2 rows still match the Phase 1 positions by id.
fn same_positions(form: &Phase2Form, rows: &[DosimeterPlacement]) -> bool {
    form.rows.len() == rows.len()
        && form
            .rows
            .iter()
            .zip(rows)
            .all(|(a, b)| a.placement.id == b.id)
}

// =============================================================================
// TESTS
// =============================================================================
