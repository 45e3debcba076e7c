//! # Radon - Measurement Campaign Tracker
//!
//! The main binary for planning radon measurement campaigns.
//!
//! This application provides:
//! - HTTP JSON API server (axum-based)
//! - CLI interface for the campaign wizard, results and stock
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                apps/radon (THE BINARY)               │
//! │                                                      │
//! │   ┌─────────────┐    ┌─────────────┐   ┌─────────┐   │
//! │   │    CLI      │    │  HTTP API   │   │ Config  │   │
//! │   │   (clap)    │    │   (axum)    │   │ (toml)  │   │
//! │   └──────┬──────┘    └──────┬──────┘   └────┬────┘   │
//! │          └──────────────────┼───────────────┘        │
//! │                             ▼                        │
//! │                     ┌──────────────┐                 │
//! │                     │  radon-core  │                 │
//! │                     │ (THE LOGIC)  │                 │
//! │                     └──────────────┘                 │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Demo data and the board
//! radon seed
//! radon board --search Milano
//!
//! # Wizard from the command line
//! radon create --work-order COM-2025-010 --client "Comune di Parma" --city Parma
//! radon place 4 -d DOS-1-001,"Piano Terra",Ingresso
//! radon replace 4 -r 1=DOS-2-001 --photo 1=ingresso.jpg
//!
//! # Start the HTTP server
//! radon server --host 0.0.0.0 --port 8080
//! ```

use clap::Parser;
use radon::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // RADON_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("RADON_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "radon=info,radon_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        if let Some(report) = e.report() {
            for issue in report.issues() {
                eprintln!("  {}: {}", issue.field, issue.kind);
            }
        }
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  ██████╗  █████╗ ██████╗  ██████╗ ███╗   ██╗
  ██╔══██╗██╔══██╗██╔══██╗██╔═══██╗████╗  ██║
  ██████╔╝███████║██║  ██║██║   ██║██╔██╗ ██║
  ██╔══██╗██╔══██║██║  ██║██║   ██║██║╚██╗██║
  ██║  ██║██║  ██║██████╔╝╚██████╔╝██║ ╚████║
  ╚═╝  ╚═╝╚═╝  ╚═╝╚═════╝  ╚═════╝ ╚═╝  ╚═══╝

  Campaign Tracker v{}

  Phase 1 • Phase 2 • Results
"#,
        env!("CARGO_PKG_VERSION")
    );
}
