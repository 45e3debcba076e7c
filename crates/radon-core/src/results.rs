//! # Withdrawal and Lab Results
//!
//! The two steps that close a campaign after Phase 2:
//!
//! 1. [`WithdrawalForm`]: all dosimeters are collected and shipped to the
//!    lab. `active` → `awaiting_results`, end date recorded.
//! 2. [`ResultsForm`]: the lab readings for both devices of every position
//!    are entered. `awaiting_results` → `completed`, averages stored.
//!
//! Readings are stored as whole Bq/m³; decimals typed from a lab report are
//! rounded half up on entry. A position's average is the rounded mean of
//! its two readings; the campaign level is the rounded mean of those.

use crate::storage::CampaignRegistry;
use crate::{
    Campaign, CampaignId, CampaignStatus, FormField, IssueKind, Phase, RadonError,
    ValidationReport, parse_reading, rounded_mean,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// WITHDRAWAL
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WithdrawalForm {
    /// Defaults to today.
    pub withdrawal_date: Option<NaiveDate>,
}

impl WithdrawalForm {
    /// Mark the campaign's dosimeters as withdrawn and sent to the lab.
    pub fn apply(
        &self,
        registry: &mut CampaignRegistry,
        id: &CampaignId,
        today: NaiveDate,
    ) -> Result<Campaign, RadonError> {
        let date = self.withdrawal_date.unwrap_or(today);
        let campaign = registry.update(id, |campaign| {
            if campaign.status != CampaignStatus::Active || campaign.phase2.is_none() {
                return Err(RadonError::InvalidTransition(format!(
                    "campaign {} has no completed Phase 2 to withdraw",
                    campaign.id
                )));
            }
            if date < campaign.start_date {
                let mut report = ValidationReport::new();
                report.push(FormField::WithdrawalDate, IssueKind::BeforeStart);
                return Err(RadonError::Validation(report));
            }
            campaign.status = CampaignStatus::AwaitingResults;
            campaign.end_date = Some(date);
            Ok(campaign.clone())
        })?;
        tracing::info!(campaign = %id, %date, "dosimeters withdrawn");
        Ok(campaign)
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// Readings as typed, per dosimeter position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingInput {
    pub phase1: String,
    pub phase2: String,
}

/// Lab readings for every position of one campaign.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsForm {
    pub readings: BTreeMap<u32, ReadingInput>,
}

/// Per-position outcome of a completed campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionResult {
    pub dosimeter: u32,
    pub reading_phase1: u32,
    pub reading_phase2: u32,
    pub average: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub campaign_id: CampaignId,
    pub average_level: u32,
    pub positions: Vec<PositionResult>,
}

impl ResultsForm {
    /// One blank (or previously recorded) entry per dosimeter position.
    #[must_use]
    pub fn for_campaign(campaign: &Campaign) -> Self {
        let text = |v: Option<u32>| v.map(|r| r.to_string()).unwrap_or_default();
        Self {
            readings: campaign
                .dosimeters()
                .iter()
                .map(|d| {
                    (
                        d.id,
                        ReadingInput {
                            phase1: text(d.reading_phase1),
                            phase2: text(d.reading_phase2),
                        },
                    )
                })
                .collect(),
        }
    }

    pub fn set_reading(&mut self, dosimeter: u32, phase: Phase, raw: impl Into<String>) {
        let entry = self.readings.entry(dosimeter).or_default();
        match phase {
            Phase::One => entry.phase1 = raw.into(),
            Phase::Two => entry.phase2 = raw.into(),
        }
    }

    /// Parse every reading for the given positions.
    pub fn parse(&self, positions: &[u32]) -> Result<Vec<PositionResult>, RadonError> {
        let mut report = ValidationReport::new();
        if positions.is_empty() {
            report.push(FormField::Dosimeters, IssueKind::AtLeastOne);
        }
        let blank = ReadingInput::default();
        let mut results = Vec::with_capacity(positions.len());
        for &id in positions {
            let input = self.readings.get(&id).unwrap_or(&blank);
            let mut read = |phase: Phase, raw: &str| {
                parse_reading(raw)
                    .map_err(|kind| {
                        report.push(
                            FormField::Reading {
                                dosimeter: id,
                                phase,
                            },
                            kind,
                        );
                    })
                    .ok()
            };
            let r1 = read(Phase::One, &input.phase1);
            let r2 = read(Phase::Two, &input.phase2);
            if let (Some(r1), Some(r2)) = (r1, r2) {
                results.push(PositionResult {
                    dosimeter: id,
                    reading_phase1: r1,
                    reading_phase2: r2,
                    average: rounded_mean(&[r1, r2]),
                });
            }
        }
        report.into_result()?;
        Ok(results)
    }

    /// Record the readings and complete the campaign.
    pub fn apply(
        &self,
        registry: &mut CampaignRegistry,
        id: &CampaignId,
    ) -> Result<CompletionReport, RadonError> {
        let report = registry.update(id, |campaign| {
            if campaign.status != CampaignStatus::AwaitingResults {
                return Err(RadonError::InvalidTransition(format!(
                    "campaign {} is {}, results need awaiting_results",
                    campaign.id, campaign.status
                )));
            }
            let positions: Vec<u32> = campaign.dosimeters().iter().map(|d| d.id).collect();
            let results = self.parse(&positions)?;
            let averages: Vec<u32> = results.iter().map(|r| r.average).collect();
            let average_level = rounded_mean(&averages);

            for record in [campaign.phase1.as_mut(), campaign.phase2.as_mut()]
                .into_iter()
                .flatten()
            {
                for dosimeter in &mut record.dosimeters {
                    if let Some(r) = results.iter().find(|r| r.dosimeter == dosimeter.id) {
                        dosimeter.reading_phase1 = Some(r.reading_phase1);
                        dosimeter.reading_phase2 = Some(r.reading_phase2);
                    }
                }
            }
            campaign.average_level = Some(average_level);
            campaign.status = CampaignStatus::Completed;

            Ok(CompletionReport {
                campaign_id: campaign.id.clone(),
                average_level,
                positions: results,
            })
        })?;
        tracing::info!(campaign = %id, average_level = report.average_level, "campaign completed");
        Ok(report)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_campaigns;
    use crate::storage::{MemoryStore, StorageBackend};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
    }

    fn registry() -> CampaignRegistry {
        CampaignRegistry::new(
            StorageBackend::Memory(MemoryStore::with_campaigns(demo_campaigns())),
            250,
        )
    }

    #[test]
    fn withdrawal_needs_phase_two() {
        let mut registry = registry();
        let err = WithdrawalForm::default()
            .apply(&mut registry, &CampaignId::new("1"), d(2026, 1, 1))
            .expect_err("campaign 1 is still in phase 1");
        assert!(matches!(err, RadonError::InvalidTransition(_)));
    }

    #[test]
    fn withdrawal_then_results_completes() {
        let mut registry = registry();
        let id = CampaignId::new("2");
        let withdrawn = WithdrawalForm::default()
            .apply(&mut registry, &id, d(2026, 1, 20))
            .expect("withdraw");
        assert_eq!(withdrawn.status, CampaignStatus::AwaitingResults);
        assert_eq!(withdrawn.end_date, Some(d(2026, 1, 20)));

        let mut form = ResultsForm::for_campaign(&withdrawn);
        assert_eq!(form.readings.len(), 10);
        for id in 1..=10 {
            form.set_reading(id, Phase::One, "100");
            form.set_reading(id, Phase::Two, if id == 1 { "101" } else { "100" });
        }
        let report = form.apply(&mut registry, &id).expect("results");
        assert_eq!(report.positions[0].average, 101);
        assert_eq!(report.average_level, 100);

        let done = registry.get(&id).expect("stored");
        assert_eq!(done.status, CampaignStatus::Completed);
        assert_eq!(done.average_level, Some(100));
        assert_eq!(done.dosimeters()[0].reading_phase2, Some(101));
    }

    #[test]
    fn bad_readings_are_reported_per_field() {
        let mut form = ResultsForm::default();
        form.set_reading(1, Phase::One, "abc");
        form.set_reading(1, Phase::Two, "90");

        let err = form.parse(&[1, 2]).expect_err("invalid");
        let report = err.report().expect("validation");
        assert_eq!(
            report.get(FormField::Reading {
                dosimeter: 1,
                phase: Phase::One
            }),
            Some(&IssueKind::InvalidNumber)
        );
        assert_eq!(
            report.get(FormField::Reading {
                dosimeter: 2,
                phase: Phase::Two
            }),
            Some(&IssueKind::Required)
        );
        assert_eq!(report.len(), 3);
    }

    #[test]
    fn results_only_from_awaiting() {
        let mut registry = registry();
        let err = ResultsForm::default()
            .apply(&mut registry, &CampaignId::new("2"))
            .expect_err("still active");
        assert!(matches!(err, RadonError::InvalidTransition(_)));
    }
}
