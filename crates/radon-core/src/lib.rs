//! # radon-core
//!
//! Campaign tracking for radon gas monitoring - THE LOGIC.
//!
//! A campaign places passive dosimeters at a site, swaps them for fresh ones
//! after six months, then collects both sets for lab analysis. This crate
//! holds the data model and every rule of that lifecycle; the `radon` binary
//! only wires it to a CLI and an HTTP API.
//!
//! ## Components
//!
//! - `storage` → whole-collection campaign store with memory, JSON and redb
//!   backends, plus the observing `CampaignRegistry`
//! - `phase` → derives the board column of a campaign from status and date
//! - `workflow` → the three-step campaign wizard
//! - `results` → withdrawal and lab results
//! - `inventory` → dosimeter stock and demand figures
//!
//! ## Constraints
//!
//! - Synchronous, no network, no async runtime
//! - Time is never read from the clock here: every operation that depends
//!   on the date takes `today` as an argument

// =============================================================================
// MODULES
// =============================================================================

pub mod calendar;
pub mod formats;
pub mod inventory;
pub mod phase;
pub mod primitives;
pub mod results;
pub mod seed;
pub mod storage;
pub mod types;
pub mod workflow;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Campaign, CampaignField, CampaignId, CampaignStatus, ClientContact, DosimeterField,
    DosimeterPlacement, FormField, IssueKind, Phase, PhaseField, PhaseRecord, Photo, RadonError,
    RiskLevel, StockEntry, Technician, ValidationIssue, ValidationReport, parse_reading,
    rounded_mean,
};
pub(crate) use types::{limit_length, require};

// =============================================================================
// RE-EXPORTS: Campaign Lifecycle
// =============================================================================

pub use inventory::{ActiveCampaignRow, InventorySummary, StockForm, StockLedger};
pub use phase::{Board, BoardColumn, Bucket, CampaignCard, bucket_of, derive_bucket};
pub use results::{CompletionReport, PositionResult, ReadingInput, ResultsForm, WithdrawalForm};
pub use storage::{
    BackendKind, CampaignRegistry, CampaignStore, StorageBackend, StoreEvent, SubscriptionId,
};
pub use workflow::{
    CampaignDataForm, CampaignWizard, Phase1Form, Phase2Form, Phase2Row, PhaseTwoSummary,
    Signatures, WizardStep,
};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{
    PersistenceHeader, Snapshot, snapshot_from_any, snapshot_from_bytes, snapshot_from_json,
    snapshot_to_bytes, snapshot_to_json,
};
