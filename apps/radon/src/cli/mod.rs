//! # Radon CLI Module
//!
//! Command-line front end for the campaign tracker.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Stock and demand figures
//! - `board` - Campaigns by board column
//! - `list` / `show` - Stored campaigns
//! - `create` / `place` / `replace` - The three wizard steps
//! - `withdraw` / `results` - Closing a campaign
//! - `stock` - Record deliveries, show the ledger
//! - `export` / `import` - Snapshots of the whole store
//! - `init` / `seed` - New or demo database

mod commands;

use crate::config::RadonConfig;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use radon_core::{PhaseField, RadonError, Signatures};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Radon - measurement campaign tracker
///
/// Plans radon measurement campaigns, records the two dosimeter placement
/// phases and the lab results, and keeps count of dosimeter stock.
#[derive(Parser, Debug)]
#[command(name = "radon")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (default: radon.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the database (overrides configuration)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend: "json", "redb" or "memory" (overrides configuration)
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Technician and client contact signing a placement.
#[derive(Args, Debug, Clone, Default)]
pub struct SignatureArgs {
    #[arg(long)]
    pub technician_first_name: Option<String>,
    #[arg(long)]
    pub technician_last_name: Option<String>,
    /// Technician signature (typed name or encoded image)
    #[arg(long)]
    pub technician_signature: Option<String>,
    #[arg(long)]
    pub contact_first_name: Option<String>,
    #[arg(long)]
    pub contact_last_name: Option<String>,
    #[arg(long)]
    pub contact_role: Option<String>,
    #[arg(long)]
    pub contact_signature: Option<String>,
}

impl SignatureArgs {
    /// Apply the given values over `base`.
    pub fn apply_to(self, base: &mut Signatures) {
        let fields = [
            (PhaseField::TechnicianFirstName, self.technician_first_name),
            (PhaseField::TechnicianLastName, self.technician_last_name),
            (PhaseField::TechnicianSignature, self.technician_signature),
            (PhaseField::ContactFirstName, self.contact_first_name),
            (PhaseField::ContactLastName, self.contact_last_name),
            (PhaseField::ContactRole, self.contact_role),
            (PhaseField::ContactSignature, self.contact_signature),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                base.set(field, value);
            }
        }
    }
}

/// Site and client details for `create`.
#[derive(Args, Debug, Clone, Default)]
pub struct CampaignArgs {
    /// Campaign name (default: "<client> - <city>")
    #[arg(long)]
    pub name: Option<String>,
    /// Work order number (commessa)
    #[arg(long)]
    pub work_order: String,
    #[arg(long)]
    pub client: String,
    /// Shop sign or building name
    #[arg(long)]
    pub sign: Option<String>,
    #[arg(long)]
    pub city: String,
    #[arg(long)]
    pub province: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Risk level: low, medium, high
    #[arg(long, default_value = "low")]
    pub risk: String,
    /// Planned start date (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
    /// Number of dosimeters planned
    #[arg(long)]
    pub expected_dosimeters: Option<u32>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (default from configuration)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (default from configuration)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show stock, active campaigns and Phase 2 forecast
    Status,

    /// Show campaigns grouped by board column
    Board {
        /// Filter on name, city, client or work order
        #[arg(short, long)]
        search: Option<String>,
    },

    /// List all campaigns
    List,

    /// Show one campaign
    Show {
        /// Campaign id
        id: String,
    },

    /// Create a planned campaign (wizard step 1)
    Create(CampaignArgs),

    /// Record the Phase 1 placement (wizard step 2)
    Place {
        /// Campaign id
        id: String,

        /// Dosimeter row as CODE[,FLOOR[,ROOM]] (repeatable, numbered in order)
        #[arg(short, long = "dosimeter", required = true)]
        dosimeters: Vec<String>,

        /// Photo of a row as ROW=PATH (repeatable)
        #[arg(long = "photo")]
        photos: Vec<String>,

        /// Placement date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        #[command(flatten)]
        signatures: SignatureArgs,
    },

    /// Record the Phase 2 replacement (wizard step 3)
    Replace {
        /// Campaign id
        id: String,

        /// Replacement device code as ROW=CODE (repeatable)
        #[arg(short, long = "replace")]
        replacements: Vec<String>,

        /// Photo of a replaced row as ROW=PATH (repeatable)
        #[arg(long = "photo")]
        photos: Vec<String>,

        /// Replacement date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        #[command(flatten)]
        signatures: SignatureArgs,
    },

    /// Mark dosimeters withdrawn and sent to the lab
    Withdraw {
        /// Campaign id
        id: String,

        /// Withdrawal date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Enter lab readings and complete the campaign
    Results {
        /// Campaign id
        id: String,

        /// Readings of a row as ROW=PHASE1,PHASE2 in Bq/m³ (repeatable)
        #[arg(short, long = "reading")]
        readings: Vec<String>,
    },

    /// Dosimeter stock ledger
    Stock {
        #[command(subcommand)]
        action: StockCommands,
    },

    /// Export the store
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (snapshot, json)
        #[arg(short = 't', long, default_value = "snapshot")]
        format: String,
    },

    /// Replace the store with an exported snapshot
    Import {
        /// Input file path (snapshot or json)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Load demo campaigns
    Seed {
        /// Replace existing campaigns
        #[arg(short, long)]
        force: bool,
    },
}

/// Stock ledger actions.
#[derive(Subcommand, Debug)]
pub enum StockCommands {
    /// Record a delivery of dosimeters
    Add {
        /// Number of dosimeters received
        #[arg(allow_negative_numbers = true)]
        quantity: i64,

        /// Order or delivery note reference
        #[arg(short, long)]
        order_ref: String,

        /// Acting user (default: configured operator)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Show ledger entries, most recent first
    Log,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve configuration with command-line overrides applied.
pub fn resolve_config(cli: &Cli) -> Result<RadonConfig, RadonError> {
    let mut config = RadonConfig::load(cli.config.as_deref())?;
    if let Some(database) = &cli.database {
        config.database = database.clone();
    }
    if let Some(backend) = &cli.backend {
        config.backend = backend.clone();
    }
    if cli.verbose {
        tracing::info!(
            database = %config.database.display(),
            backend = %config.backend,
            "configuration resolved"
        );
    }
    Ok(config)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), RadonError> {
    let config = resolve_config(&cli)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            let host = host.unwrap_or_else(|| config.host.clone());
            let port = port.unwrap_or(config.port);
            cmd_server(&config, &host, port).await
        }
        Some(Commands::Status) => cmd_status(&config, json_mode),
        Some(Commands::Board { search }) => cmd_board(&config, json_mode, search.as_deref()),
        Some(Commands::List) => cmd_list(&config, json_mode),
        Some(Commands::Show { id }) => cmd_show(&config, json_mode, &id),
        Some(Commands::Create(args)) => cmd_create(&config, json_mode, args),
        Some(Commands::Place {
            id,
            dosimeters,
            photos,
            date,
            signatures,
        }) => cmd_place(
            &config,
            json_mode,
            &id,
            &dosimeters,
            &photos,
            date,
            signatures,
        ),
        Some(Commands::Replace {
            id,
            replacements,
            photos,
            date,
            signatures,
        }) => cmd_replace(
            &config,
            json_mode,
            &id,
            &replacements,
            &photos,
            date,
            signatures,
        ),
        Some(Commands::Withdraw { id, date }) => cmd_withdraw(&config, json_mode, &id, date),
        Some(Commands::Results { id, readings }) => {
            cmd_results(&config, json_mode, &id, &readings)
        }
        Some(Commands::Stock { action }) => match action {
            StockCommands::Add {
                quantity,
                order_ref,
                user,
            } => cmd_stock_add(&config, json_mode, quantity, &order_ref, user),
            StockCommands::Log => cmd_stock_log(&config, json_mode),
        },
        Some(Commands::Export { output, format }) => cmd_export(&config, &output, &format),
        Some(Commands::Import { input }) => cmd_import(&config, &input),
        Some(Commands::Init { force }) => cmd_init(&config, force),
        Some(Commands::Seed { force }) => cmd_seed(&config, force),
        None => {
            // No subcommand - show status by default
            cmd_status(&config, json_mode)
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_place_with_repeated_rows() {
        let cli = Cli::try_parse_from([
            "radon",
            "place",
            "4",
            "-d",
            "DOS-1-001,Piano Terra,Ufficio",
            "-d",
            "DOS-1-002",
            "--photo",
            "1=a.jpg",
            "--technician-first-name",
            "Luca",
        ])
        .expect("parse");
        match cli.command {
            Some(Commands::Place {
                id,
                dosimeters,
                photos,
                signatures,
                ..
            }) => {
                assert_eq!(id, "4");
                assert_eq!(dosimeters.len(), 2);
                assert_eq!(photos, vec!["1=a.jpg".to_string()]);
                assert_eq!(signatures.technician_first_name.as_deref(), Some("Luca"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn stock_add_accepts_negative_quantity_for_validation() {
        let cli = Cli::try_parse_from(["radon", "stock", "add", "-5", "-o", "ORD-1"])
            .expect("parse");
        assert!(matches!(
            cli.command,
            Some(Commands::Stock {
                action: StockCommands::Add { quantity: -5, .. }
            })
        ));
    }

    #[test]
    fn create_requires_client() {
        let result = Cli::try_parse_from(["radon", "create", "--work-order", "X", "--city", "Y"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from(["radon", "status", "-B", "memory", "--json-mode"])
            .expect("parse");
        assert_eq!(cli.backend.as_deref(), Some("memory"));
        assert!(cli.json_mode);
    }

    #[test]
    fn signature_args_only_overwrite_given_fields() {
        let mut base = Signatures::default();
        base.set(PhaseField::ContactRole, "Titolare");
        SignatureArgs {
            technician_last_name: Some("Bianchi".to_string()),
            ..SignatureArgs::default()
        }
        .apply_to(&mut base);
        assert_eq!(base.technician.last_name, "Bianchi");
        assert_eq!(base.client_contact.role, "Titolare");
    }
}
