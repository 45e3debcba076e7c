//! Demo dataset loaded by `radon seed`.

use crate::{
    Campaign, CampaignId, CampaignStatus, ClientContact, DosimeterPlacement, PhaseRecord,
    RiskLevel, Technician,
};
use chrono::NaiveDate;

const FLOORS: [&str; 3] = ["Piano Terra", "Primo Piano", "Secondo Piano"];

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

/// `count` dosimeter rows with codes `DOS-<phase>-<nnn>`.
#[must_use]
pub fn demo_dosimeters(phase: u8, count: u32) -> Vec<DosimeterPlacement> {
    (1..=count)
        .map(|id| {
            let i = id - 1;
            let code = format!("DOS-{}-{:03}", phase, id);
            let room = char::from(b'A' + (i % 5) as u8);
            let mut row = DosimeterPlacement::new(id);
            row.floor = FLOORS[(i % 3) as usize].to_string();
            row.location = format!("Locale {}{}", room, id);
            if phase == 1 {
                row.code_phase1 = code;
            } else {
                row.code_phase2 = code;
            }
            row
        })
        .collect()
}

fn technician(first: &str, last: &str) -> Technician {
    Technician {
        first_name: first.to_string(),
        last_name: last.to_string(),
        signature: format!("{}.{}", &first[..1], last),
    }
}

fn contact(first: &str, last: &str, role: &str) -> ClientContact {
    ClientContact {
        first_name: first.to_string(),
        last_name: last.to_string(),
        role: role.to_string(),
        signature: format!("{}.{}", &first[..1], last),
    }
}

/// Three campaigns: one in Phase 1, one past its pickup date with a Phase 2
/// record, one still to be started.
#[must_use]
pub fn demo_campaigns() -> Vec<Campaign> {
    let offices = Campaign {
        id: CampaignId::new("1"),
        name: "Monitoraggio Uffici Comunali Centro".to_string(),
        work_order: "COM-2025-001".to_string(),
        client: "Comune di Milano".to_string(),
        sign: "Uffici Comunali".to_string(),
        city: "Milano".to_string(),
        province: "MI".to_string(),
        address: "Via Dante 45".to_string(),
        phone: "02 1234567".to_string(),
        email: "uffici@comune.milano.it".to_string(),
        notes: "Edificio storico del XIX secolo".to_string(),
        status: CampaignStatus::Active,
        risk_level: RiskLevel::Low,
        start_date: date(2025, 11, 3),
        end_date: None,
        average_level: None,
        expected_dosimeters: Some(10),
        dosimeter_count: None,
        phase1: Some(PhaseRecord {
            start_date: Some(date(2025, 11, 3)),
            end_date: None,
            technician: technician("Marco", "Rossi"),
            client_contact: contact("Laura", "Bianchi", "Responsabile Sicurezza"),
            dosimeters: demo_dosimeters(1, 10),
        }),
        phase2: None,
    };

    let mut phase2_rows = demo_dosimeters(1, 10);
    for (row, replacement) in phase2_rows.iter_mut().zip(demo_dosimeters(2, 10)) {
        row.code_phase2 = replacement.code_phase2;
    }

    let school = Campaign {
        id: CampaignId::new("2"),
        name: "Controllo Scuola Secondaria Leonardo Da Vinci".to_string(),
        work_order: "SCU-2025-002".to_string(),
        client: "Istituto Comprensivo Leonardo Da Vinci".to_string(),
        sign: "Scuola Secondaria".to_string(),
        city: "Roma".to_string(),
        province: "RM".to_string(),
        address: "Via Tiburtina 123".to_string(),
        phone: "06 9876543".to_string(),
        email: "segreteria@icleonardo.it".to_string(),
        notes: "Edificio scolastico su 3 piani, monitoraggio aule e laboratori".to_string(),
        status: CampaignStatus::Active,
        risk_level: RiskLevel::Low,
        start_date: date(2025, 1, 13),
        end_date: None,
        average_level: None,
        expected_dosimeters: Some(10),
        dosimeter_count: Some(10),
        phase1: Some(PhaseRecord {
            start_date: Some(date(2025, 1, 13)),
            end_date: Some(date(2025, 6, 18)),
            technician: technician("Giuseppe", "Verdi"),
            client_contact: contact("Maria", "Neri", "Dirigente Scolastico"),
            dosimeters: demo_dosimeters(1, 10),
        }),
        phase2: Some(PhaseRecord {
            start_date: Some(date(2025, 6, 18)),
            end_date: None,
            technician: technician("Giuseppe", "Verdi"),
            client_contact: contact("Maria", "Neri", "Dirigente Scolastico"),
            dosimeters: phase2_rows,
        }),
    };

    let residential = Campaign {
        id: CampaignId::new("3"),
        name: "Campagna Quartiere Residenziale".to_string(),
        work_order: "RES-2026-003".to_string(),
        client: "Condominio San Salvario".to_string(),
        sign: String::new(),
        city: "Torino".to_string(),
        province: "TO".to_string(),
        address: "Via Nizza 10".to_string(),
        phone: String::new(),
        email: String::new(),
        notes: String::new(),
        status: CampaignStatus::Planned,
        risk_level: RiskLevel::Medium,
        start_date: date(2026, 3, 10),
        end_date: None,
        average_level: None,
        expected_dosimeters: Some(12),
        dosimeter_count: None,
        phase1: None,
        phase2: None,
    };

    vec![offices, school, residential]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dosimeter_codes_and_rooms() {
        let rows = demo_dosimeters(1, 6);
        assert_eq!(rows[0].code_phase1, "DOS-1-001");
        assert_eq!(rows[0].floor, "Piano Terra");
        assert_eq!(rows[0].location, "Locale A1");
        assert_eq!(rows[5].location, "Locale A6");
        assert_eq!(rows[4].floor, "Primo Piano");
    }

    #[test]
    fn demo_ids_unique() {
        let campaigns = demo_campaigns();
        let mut ids: Vec<_> = campaigns.iter().map(|c| c.id.clone()).collect();
        ids.dedup();
        assert_eq!(ids.len(), campaigns.len());
    }
}
