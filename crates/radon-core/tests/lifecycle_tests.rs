//! # Campaign Lifecycle Tests
//!
//! End-to-end runs of the wizard and the closing steps against each
//! storage backend.

use chrono::NaiveDate;
use radon_core::seed::demo_campaigns;
use radon_core::{
    BackendKind, CampaignField, CampaignId, CampaignRegistry, CampaignStatus, CampaignStore,
    CampaignWizard, DosimeterField, FormField, IssueKind, Phase, Photo, ResultsForm,
    StorageBackend, StoreEvent, WithdrawalForm, WizardStep,
};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
}

fn open(kind: BackendKind, dir: &TempDir) -> StorageBackend {
    let file = match kind {
        BackendKind::Redb => "radon.redb",
        _ => "radon.json",
    };
    StorageBackend::open(kind, dir.path().join(file)).expect("open backend")
}

// =============================================================================
// STORE ROUND TRIP
// =============================================================================

mod store_roundtrip {
    use super::*;

    fn save_of_load_is_noop(kind: BackendKind) {
        let dir = TempDir::new().expect("tempdir");
        let mut backend = open(kind, &dir);
        backend.save_all(&demo_campaigns()).expect("seed");

        let before = backend.load_all();
        backend.save_all(&before).expect("resave");
        assert_eq!(backend.load_all(), before);
        assert_eq!(before, demo_campaigns());
    }

    #[test]
    fn json_file() {
        save_of_load_is_noop(BackendKind::Json);
    }

    #[test]
    fn redb() {
        save_of_load_is_noop(BackendKind::Redb);
    }

    #[test]
    fn memory() {
        save_of_load_is_noop(BackendKind::Memory);
    }

    #[test]
    fn json_file_is_plain_json() {
        let dir = TempDir::new().expect("tempdir");
        let mut backend = open(BackendKind::Json, &dir);
        backend.save_all(&demo_campaigns()).expect("seed");

        let raw = std::fs::read_to_string(dir.path().join("radon.json")).expect("read");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
        assert_eq!(value["campaigns"][0]["work_order"], "COM-2025-001");
        assert_eq!(value["campaigns"][1]["start_date"], "2025-01-13");
    }
}

// =============================================================================
// FULL LIFECYCLE
// =============================================================================

mod full_lifecycle {
    use super::*;

    fn run(kind: BackendKind) {
        let dir = TempDir::new().expect("tempdir");
        let mut registry = CampaignRegistry::new(open(kind, &dir), 250);

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        registry.subscribe(Box::new(move |event| {
            if matches!(event, StoreEvent::PhaseTwoCompleted { .. })
                && let Ok(mut seen) = sink.lock()
            {
                seen.push(event.clone());
            }
        }));

        // Step 1
        let mut wizard = CampaignWizard::new();
        wizard.campaign_data.set(CampaignField::Name, "Palestra Comunale");
        wizard.campaign_data.set(CampaignField::WorkOrder, "PAL-2025-010");
        wizard.campaign_data.set(CampaignField::Client, "Comune di Parma");
        wizard.campaign_data.set(CampaignField::City, "Parma");
        let id = wizard
            .submit_campaign_data(&mut registry, d(2025, 2, 1))
            .expect("campaign data");

        // Step 2
        wizard
            .phase1
            .set_row(1, DosimeterField::Code, "DOS-1-100")
            .expect("code");
        wizard
            .phase1
            .set_row(1, DosimeterField::Floor, "Piano Terra")
            .expect("floor");
        wizard
            .submit_phase1(&mut registry, d(2025, 2, 3))
            .expect("phase 1");
        assert_eq!(
            registry.inventory(d(2025, 3, 1)).forecast_phase2,
            1,
            "new campaign is waiting for its Phase 2"
        );

        // Step 3
        wizard.phase2.set_code(1, "DOS-2-100").expect("code");
        wizard
            .phase2
            .attach_photos(
                1,
                vec![Photo::from_bytes("a.png", "image/png", b"\x89PNG")],
            )
            .expect("photo");
        let summary = wizard
            .submit_phase2(&mut registry, d(2025, 8, 4))
            .expect("phase 2");
        assert_eq!(summary.dosimeter_count, 1);
        assert_eq!(wizard.step(), WizardStep::Done);

        // Withdrawal and results
        WithdrawalForm::default()
            .apply(&mut registry, &id, d(2026, 2, 4))
            .expect("withdraw");
        let mut results = ResultsForm::for_campaign(&registry.get(&id).expect("stored"));
        results.set_reading(1, Phase::One, "180");
        results.set_reading(1, Phase::Two, "141");
        let report = results.apply(&mut registry, &id).expect("results");
        assert_eq!(report.average_level, 161);

        let done = registry.get(&id).expect("stored");
        assert_eq!(done.status, CampaignStatus::Completed);
        assert_eq!(done.start_date, d(2025, 2, 3));
        assert_eq!(done.end_date, Some(d(2026, 2, 4)));

        let seen = events.lock().expect("lock");
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn json_file() {
        run(BackendKind::Json);
    }

    #[test]
    fn redb() {
        run(BackendKind::Redb);
    }
}

// =============================================================================
// GUARDS
// =============================================================================

mod guards {
    use super::*;

    #[test]
    fn empty_client_creates_nothing() {
        let mut registry = CampaignRegistry::in_memory();
        let mut wizard = CampaignWizard::new();
        wizard.campaign_data.set(CampaignField::WorkOrder, "X-1");
        wizard.campaign_data.set(CampaignField::City, "Bari");

        let err = wizard
            .submit_campaign_data(&mut registry, d(2025, 1, 1))
            .expect_err("client missing");
        assert_eq!(
            err.report()
                .and_then(|r| r.get(FormField::Campaign(CampaignField::Client))),
            Some(&IssueKind::Required)
        );
        assert_eq!(wizard.step(), WizardStep::CampaignData);
        assert!(registry.load_all().is_empty());
    }

    #[test]
    fn resumed_wizard_completes_seeded_campaign() {
        let mut registry = CampaignRegistry::in_memory();
        registry.save_all(&demo_campaigns()).expect("seed");
        let campaign = registry.get(&CampaignId::new("1")).expect("seeded");

        let mut wizard = CampaignWizard::resume(&campaign);
        assert_eq!(wizard.step(), WizardStep::Phase2Replacement);
        assert_eq!(wizard.phase2.rows.len(), 10);

        wizard.phase2.set_code(3, "DOS-2-003").expect("code");
        wizard
            .phase2
            .attach_photos(3, vec![Photo::from_bytes("c.jpg", "image/jpeg", b"jpg")])
            .expect("photo");
        let summary = wizard
            .submit_phase2(&mut registry, d(2026, 5, 4))
            .expect("phase 2");
        assert_eq!(summary.dosimeter_count, 10);
    }
}
