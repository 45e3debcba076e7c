//! # CLI Command Implementations
//!
//! Each `cmd_*` opens the configured store, runs one operation and prints
//! either a human-readable summary or, with `--json-mode`, pretty JSON.

use super::{CampaignArgs, SignatureArgs};
use crate::api::{self, Clock};
use crate::config::RadonConfig;
use chrono::NaiveDate;
use radon_core::formats::MAX_SNAPSHOT_SIZE;
use radon_core::primitives::MAX_PHOTO_BYTES;
use radon_core::seed::demo_campaigns;
use radon_core::{
    Board, BackendKind, Campaign, CampaignDataForm, CampaignField, CampaignId, CampaignRegistry,
    CampaignWizard, DosimeterPlacement, Phase, Photo, RadonError, ResultsForm, Snapshot,
    StockForm, WithdrawalForm, WizardStep, snapshot_from_any, snapshot_to_bytes,
    snapshot_to_json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE VALIDATION
// =============================================================================

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), RadonError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| RadonError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(RadonError::SerializationError(format!(
            "File '{}' is {} bytes, maximum allowed is {} bytes",
            path.display(),
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path and make sure it names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, RadonError> {
    let canonical = path.canonicalize().map_err(|e| {
        RadonError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(RadonError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path against its (existing) parent directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, RadonError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        RadonError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(RadonError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| RadonError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// ARGUMENT PARSING
// =============================================================================

/// Split a `ROW=VALUE` argument.
pub fn parse_row_arg<'a>(arg: &'a str, what: &str) -> Result<(u32, &'a str), RadonError> {
    let (row, value) = arg.split_once('=').ok_or_else(|| {
        RadonError::SerializationError(format!("Expected ROW={} but got '{}'", what, arg))
    })?;
    let row = row.trim().parse::<u32>().map_err(|_| {
        RadonError::SerializationError(format!("Row must be a number in '{}'", arg))
    })?;
    Ok((row, value.trim()))
}

/// Build a Phase 1 row from `CODE[,FLOOR[,ROOM]]`.
pub fn parse_dosimeter_arg(id: u32, arg: &str) -> DosimeterPlacement {
    let mut parts = arg.splitn(3, ',').map(str::trim);
    DosimeterPlacement {
        code_phase1: parts.next().unwrap_or_default().to_string(),
        floor: parts.next().unwrap_or_default().to_string(),
        location: parts.next().unwrap_or_default().to_string(),
        ..DosimeterPlacement::new(id)
    }
}

fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Read an image file into a photo.
fn load_photo(path: &Path) -> Result<Photo, RadonError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_PHOTO_BYTES as u64)?;
    let bytes = std::fs::read(&validated)
        .map_err(|e| RadonError::IoError(format!("Read photo: {}", e)))?;
    let file_name = validated
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Photo::from_bytes(
        file_name,
        media_type_for(&validated),
        &bytes,
    ))
}

/// Load `ROW=PATH` photo arguments, grouped by row.
fn load_photos(args: &[String]) -> Result<BTreeMap<u32, Vec<Photo>>, RadonError> {
    let mut by_row: BTreeMap<u32, Vec<Photo>> = BTreeMap::new();
    for arg in args {
        let (row, path) = parse_row_arg(arg, "PATH")?;
        by_row
            .entry(row)
            .or_default()
            .push(load_photo(Path::new(path))?);
    }
    Ok(by_row)
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

fn open_registry(config: &RadonConfig) -> Result<CampaignRegistry, RadonError> {
    let registry = config.open_registry()?;
    tracing::debug!(
        backend = %registry.backend().kind(),
        database = %config.database.display(),
        "store opened"
    );
    Ok(registry)
}

fn today() -> NaiveDate {
    Clock::System.today()
}

fn print_campaign(campaign: &Campaign) {
    println!("Campaign {}: {}", campaign.id, campaign.name);
    println!("==================");
    println!("Work order: {}", campaign.work_order);
    println!("Client:     {}", campaign.client);
    if !campaign.sign.is_empty() {
        println!("Sign:       {}", campaign.sign);
    }
    println!("Location:   {}", campaign.location());
    if !campaign.address.is_empty() {
        println!("Address:    {}", campaign.address);
    }
    println!("Status:     {}", campaign.status.label());
    println!("Risk:       {}", campaign.risk_level);
    println!("Start:      {}", campaign.start_date);
    if let Some(end) = campaign.end_date {
        println!("End:        {}", end);
    }
    if let Some(level) = campaign.average_level {
        println!("Average:    {} Bq/m³", level);
    }

    for (label, record) in [("Phase 1", &campaign.phase1), ("Phase 2", &campaign.phase2)] {
        let Some(record) = record else { continue };
        println!();
        println!(
            "{} ({}) - technician {} {}",
            label,
            record
                .start_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            record.technician.first_name,
            record.technician.last_name
        );
        for d in &record.dosimeters {
            let code = if label == "Phase 1" {
                &d.code_phase1
            } else {
                &d.code_phase2
            };
            println!(
                "  #{:<3} {:<12} {} {} ({} photos)",
                d.id,
                code,
                d.floor,
                d.location,
                d.photos.len()
            );
        }
    }
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &RadonConfig, host: &str, port: u16) -> Result<(), RadonError> {
    let registry = open_registry(config)?;

    println!("Radon Campaign Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Backend:  {}", config.backend);
    println!("  Database: {:?}", config.database);
    println!();
    println!("Endpoints:");
    println!("  GET  /board            - Campaign board");
    println!("  GET  /campaigns        - All campaigns");
    println!("  POST /campaigns        - Create a campaign");
    println!("  POST /campaigns/{{id}}/phase1|phase2|withdraw|results");
    println!("  GET  /inventory        - Stock and forecast");
    println!("  GET  /stock, POST /stock - Stock ledger");
    println!("  GET  /health           - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, registry, config.operator.clone()).await
}

// =============================================================================
// READ COMMANDS
// =============================================================================

/// Show stock and demand figures.
pub fn cmd_status(config: &RadonConfig, json_mode: bool) -> Result<(), RadonError> {
    let registry = open_registry(config)?;
    let summary = registry.inventory(today());

    if json_mode {
        print_json(&summary);
        return Ok(());
    }

    println!("Radon Dosimeter Inventory ({})", summary.as_of);
    println!("==================");
    println!("Stock:              {}", summary.stock);
    println!("Active campaigns:   {}", summary.active_campaigns);
    println!("Dosimeters in use:  {}", summary.active_dosimeters);
    println!("Available:          {}", summary.available);
    println!(
        "Phase 2 forecast:   {} campaigns, {} dosimeters",
        summary.forecast_phase2, summary.forecast_dosimeters
    );

    if !summary.active.is_empty() {
        println!();
        println!("Active campaigns by pickup deadline:");
        for row in &summary.active {
            println!(
                "  [{}] {} ({}) - deadline {} ({} days) - {}",
                row.id,
                row.name,
                row.location,
                row.deadline,
                row.days_to_deadline,
                row.bucket.title()
            );
        }
    }

    Ok(())
}

/// Show the campaign board.
pub fn cmd_board(
    config: &RadonConfig,
    json_mode: bool,
    search: Option<&str>,
) -> Result<(), RadonError> {
    let registry = open_registry(config)?;
    let board = Board::build(&registry.load_all(), today(), search);

    if json_mode {
        print_json(&board);
        return Ok(());
    }

    for column in &board.columns {
        println!("{} ({})", column.title, column.count());
        for card in &column.cards {
            let deadline = card
                .deadline
                .map(|d| format!(" - deadline {}", d))
                .unwrap_or_default();
            println!(
                "  [{}] {} - {} - {}{}",
                card.id, card.name, card.location, card.work_order, deadline
            );
        }
    }
    println!();
    println!("{} campaigns", board.total());

    Ok(())
}

pub fn cmd_list(config: &RadonConfig, json_mode: bool) -> Result<(), RadonError> {
    let campaigns = open_registry(config)?.load_all();

    if json_mode {
        print_json(&campaigns);
        return Ok(());
    }

    if campaigns.is_empty() {
        println!("No campaigns. Use `radon create` or `radon seed`.");
        return Ok(());
    }
    for c in &campaigns {
        println!(
            "{:>4}  {:<18} {:<40} {}",
            c.id.as_str(),
            c.status.label(),
            c.name,
            c.start_date
        );
    }
    Ok(())
}

pub fn cmd_show(config: &RadonConfig, json_mode: bool, id: &str) -> Result<(), RadonError> {
    let campaign = open_registry(config)?.get(&CampaignId::new(id))?;

    if json_mode {
        print_json(&campaign);
    } else {
        print_campaign(&campaign);
    }
    Ok(())
}

// =============================================================================
// WIZARD COMMANDS
// =============================================================================

/// Step 1: create a planned campaign.
pub fn cmd_create(
    config: &RadonConfig,
    json_mode: bool,
    args: CampaignArgs,
) -> Result<(), RadonError> {
    let mut registry = open_registry(config)?;

    let mut form = CampaignDataForm {
        risk_level: args.risk.parse()?,
        start_date: args.start_date,
        expected_dosimeters: args.expected_dosimeters,
        ..CampaignDataForm::default()
    };
    form.set(CampaignField::WorkOrder, args.work_order);
    form.set(CampaignField::Client, args.client);
    form.set(CampaignField::City, args.city);
    let optional = [
        (CampaignField::Name, args.name),
        (CampaignField::Sign, args.sign),
        (CampaignField::Province, args.province),
        (CampaignField::Address, args.address),
        (CampaignField::Phone, args.phone),
        (CampaignField::Email, args.email),
        (CampaignField::Notes, args.notes),
    ];
    for (field, value) in optional {
        if let Some(value) = value {
            form.set(field, value);
        }
    }

    let mut wizard = CampaignWizard::new();
    wizard.campaign_data = form;
    let id = wizard.submit_campaign_data(&mut registry, today())?;
    let campaign = registry.get(&id)?;

    if json_mode {
        print_json(&campaign);
    } else {
        println!("Created campaign {}: {}", id, campaign.name);
        println!("Next: radon place {} -d CODE[,FLOOR[,ROOM]] ...", id);
    }
    Ok(())
}

/// Step 2: Phase 1 placement.
pub fn cmd_place(
    config: &RadonConfig,
    json_mode: bool,
    id: &str,
    dosimeters: &[String],
    photos: &[String],
    date: Option<NaiveDate>,
    signatures: SignatureArgs,
) -> Result<(), RadonError> {
    let id = CampaignId::new(id);
    let mut registry = open_registry(config)?;
    let mut wizard = CampaignWizard::resume(&registry.get(&id)?);

    wizard.phase1.rows = (1u32..)
        .zip(dosimeters)
        .map(|(row, arg)| parse_dosimeter_arg(row, arg))
        .collect();
    for (row, row_photos) in load_photos(photos)? {
        wizard.phase1.attach_photos(row, row_photos)?;
    }
    wizard.phase1.placement_date = date;
    signatures.apply_to(&mut wizard.phase1.signatures);

    wizard.submit_phase1(&mut registry, today())?;
    let campaign = registry.get(&id)?;

    if json_mode {
        print_json(&campaign);
    } else {
        println!(
            "Phase 1 placed for campaign {}: {} dosimeters on {}",
            id,
            campaign.dosimeters().len(),
            campaign.start_date
        );
    }
    Ok(())
}

/// Step 3: Phase 2 replacement.
pub fn cmd_replace(
    config: &RadonConfig,
    json_mode: bool,
    id: &str,
    replacements: &[String],
    photos: &[String],
    date: Option<NaiveDate>,
    signatures: SignatureArgs,
) -> Result<(), RadonError> {
    let id = CampaignId::new(id);
    let mut registry = open_registry(config)?;
    let mut wizard = CampaignWizard::resume(&registry.get(&id)?);
    if wizard.step() != WizardStep::Phase2Replacement {
        return Err(RadonError::InvalidTransition(format!(
            "campaign {} is not waiting for Phase 2",
            id
        )));
    }

    for arg in replacements {
        let (row, code) = parse_row_arg(arg, "CODE")?;
        wizard.phase2.set_code(row, code)?;
    }
    for (row, row_photos) in load_photos(photos)? {
        wizard.phase2.attach_photos(row, row_photos)?;
    }
    signatures.apply_to(&mut wizard.phase2.signatures);
    if date.is_some() {
        wizard.phase2.start_date = date;
    }

    let summary = wizard.submit_phase2(&mut registry, today())?;

    if json_mode {
        print_json(&summary);
    } else {
        println!(
            "Fase 2 completata: {} ({} dosimeters, {})",
            summary.campaign_name, summary.dosimeter_count, summary.completed_on
        );
    }
    Ok(())
}

// =============================================================================
// CLOSING COMMANDS
// =============================================================================

pub fn cmd_withdraw(
    config: &RadonConfig,
    json_mode: bool,
    id: &str,
    date: Option<NaiveDate>,
) -> Result<(), RadonError> {
    let mut registry = open_registry(config)?;
    let form = WithdrawalForm {
        withdrawal_date: date,
    };
    let campaign = form.apply(&mut registry, &CampaignId::new(id), today())?;

    if json_mode {
        print_json(&campaign);
    } else {
        println!(
            "Campaign {} withdrawn on {}, {}",
            campaign.id,
            campaign
                .end_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            campaign.status.label()
        );
    }
    Ok(())
}

pub fn cmd_results(
    config: &RadonConfig,
    json_mode: bool,
    id: &str,
    readings: &[String],
) -> Result<(), RadonError> {
    let id = CampaignId::new(id);
    let mut registry = open_registry(config)?;
    let mut form = ResultsForm::for_campaign(&registry.get(&id)?);

    for arg in readings {
        let (row, values) = parse_row_arg(arg, "PHASE1,PHASE2")?;
        let (first, second) = values.split_once(',').unwrap_or((values, ""));
        form.set_reading(row, Phase::One, first.trim());
        form.set_reading(row, Phase::Two, second.trim());
    }

    let report = form.apply(&mut registry, &id)?;

    if json_mode {
        print_json(&report);
        return Ok(());
    }

    println!("Campaign {} completed", report.campaign_id);
    for p in &report.positions {
        println!(
            "  #{:<3} {:>6} {:>6} -> {:>6} Bq/m³",
            p.dosimeter, p.reading_phase1, p.reading_phase2, p.average
        );
    }
    println!("Average level: {} Bq/m³", report.average_level);
    Ok(())
}

// =============================================================================
// STOCK COMMANDS
// =============================================================================

pub fn cmd_stock_add(
    config: &RadonConfig,
    json_mode: bool,
    quantity: i64,
    order_ref: &str,
    user: Option<String>,
) -> Result<(), RadonError> {
    let mut registry = open_registry(config)?;
    let user = user.unwrap_or_else(|| config.operator.clone());
    let form = StockForm::new(quantity, order_ref);
    let entry = registry.add_stock(&form, &user, Clock::System.now())?;

    if json_mode {
        print_json(&entry);
    } else {
        println!(
            "Recorded {} dosimeters ({}), stock now {}",
            entry.quantity,
            entry.order_ref,
            registry.ledger().total()
        );
    }
    Ok(())
}

pub fn cmd_stock_log(config: &RadonConfig, json_mode: bool) -> Result<(), RadonError> {
    let ledger = open_registry(config)?.ledger();

    if json_mode {
        let entries: Vec<_> = ledger.entries_recent_first().collect();
        print_json(&serde_json::json!({
            "baseline": ledger.baseline(),
            "total": ledger.total(),
            "entries": entries,
        }));
        return Ok(());
    }

    println!("Stock: {} (baseline {})", ledger.total(), ledger.baseline());
    for entry in ledger.entries_recent_first() {
        println!(
            "  {}  +{:<5} {:<20} {}",
            entry.display_timestamp(),
            entry.quantity,
            entry.order_ref,
            entry.user
        );
    }
    Ok(())
}

// =============================================================================
// EXPORT / IMPORT COMMANDS
// =============================================================================

/// Export campaigns and ledger.
pub fn cmd_export(config: &RadonConfig, output: &Path, format: &str) -> Result<(), RadonError> {
    let validated_output = validate_output_path(output)?;
    let registry = open_registry(config)?;
    let snapshot = Snapshot {
        campaigns: registry.load_all(),
        stock_ledger: registry.ledger().entries().to_vec(),
    };

    let data = match format {
        "snapshot" => snapshot_to_bytes(&snapshot)?,
        "json" => snapshot_to_json(&snapshot)?,
        _ => {
            return Err(RadonError::SerializationError(format!(
                "Unknown format: {}. Use: snapshot, json",
                format
            )));
        }
    };

    std::fs::write(&validated_output, &data)
        .map_err(|e| RadonError::IoError(format!("Write file: {}", e)))?;

    println!(
        "Exported {} campaigns, {} ledger entries ({} bytes) to {:?}",
        snapshot.campaigns.len(),
        snapshot.stock_ledger.len(),
        data.len(),
        validated_output
    );
    Ok(())
}

/// Replace the store contents with a snapshot.
pub fn cmd_import(config: &RadonConfig, input: &Path) -> Result<(), RadonError> {
    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_SNAPSHOT_SIZE as u64)?;

    let data = std::fs::read(&validated_path)
        .map_err(|e| RadonError::IoError(format!("Read file: {}", e)))?;
    let snapshot = snapshot_from_any(&data)?;

    let mut registry = open_registry(config)?;
    if registry.backend().kind() == BackendKind::Memory {
        tracing::warn!("Importing into the memory backend; nothing will be kept");
    }
    registry.restore(&snapshot.campaigns, &snapshot.stock_ledger)?;

    println!(
        "Imported {} campaigns, {} ledger entries",
        snapshot.campaigns.len(),
        snapshot.stock_ledger.len()
    );
    Ok(())
}

// =============================================================================
// INIT / SEED COMMANDS
// =============================================================================

/// Initialize an empty database.
pub fn cmd_init(config: &RadonConfig, force: bool) -> Result<(), RadonError> {
    if config.database.exists() && !force {
        return Err(RadonError::IoError(
            "Database already exists. Use --force to overwrite.".to_string(),
        ));
    }

    let mut registry = open_registry(config)?;
    registry.restore(&[], &[])?;
    println!(
        "Initialized new {} database at {:?}",
        registry.backend().kind(),
        config.database
    );
    Ok(())
}

/// Load the demo campaigns.
pub fn cmd_seed(config: &RadonConfig, force: bool) -> Result<(), RadonError> {
    let mut registry = open_registry(config)?;
    if !registry.load_all().is_empty() && !force {
        return Err(RadonError::IoError(
            "Database already has campaigns. Use --force to replace them.".to_string(),
        ));
    }

    let campaigns = demo_campaigns();
    registry.save_all(&campaigns)?;
    println!("Seeded {} demo campaigns", campaigns.len());
    Ok(())
}
