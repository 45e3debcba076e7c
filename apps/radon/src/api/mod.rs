//! # Radon HTTP API Module
//!
//! JSON API over the campaign registry, standing in for the browser views.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /board?search=` - Campaigns grouped by board column
//! - `GET /campaigns` - All campaigns
//! - `GET /campaigns/{id}` - One campaign
//! - `POST /campaigns` - Wizard step 1, creates a planned campaign
//! - `POST /campaigns/{id}/phase1` - Wizard step 2, Phase 1 placement
//! - `POST /campaigns/{id}/phase2` - Wizard step 3, Phase 2 replacement
//! - `POST /campaigns/{id}/withdraw` - Dosimeters sent to the lab
//! - `POST /campaigns/{id}/results` - Lab readings, completes the campaign
//! - `GET /inventory` - Stock and demand figures
//! - `GET /stock` - Stock ledger, most recent first
//! - `POST /stock` - Record a delivery
//!
//! Validation failures answer 422 with one entry per offending field,
//! unknown campaigns 404, steps out of order 409.
//!
//! ## Configuration (Environment Variables)
//!
//! - `RADON_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)

mod handlers;
mod types;

// Re-export handlers and types for integration tests (via `radon::api::*`)
#[allow(unused_imports)]
pub use handlers::{
    add_stock_handler, board_handler, create_campaign_handler, get_campaign_handler,
    health_handler, inventory_handler, list_campaigns_handler, phase1_handler, phase2_handler,
    results_handler, stock_handler, withdraw_handler,
};
#[allow(unused_imports)]
pub use types::{
    ApiError, BoardQuery, CreatedResponse, ErrorResponse, FieldIssue, HealthResponse,
    Phase1Request, Phase2Request, PlacementInput, ReadingRow, ReadingValue, ReplacementInput,
    ResultsRequest, StockRequest, StockResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use radon_core::{CampaignRegistry, RadonError, StoreEvent};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Request bodies carry base64 photos: 3 per dosimeter, many dosimeters.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Where handlers get "now" from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    /// Local wall clock.
    System,
    /// Frozen instant, for tests and demos.
    Fixed(NaiveDateTime),
}

impl Clock {
    #[must_use]
    pub fn now(&self) -> NaiveDateTime {
        match self {
            Clock::System => Local::now().naive_local(),
            Clock::Fixed(at) => *at,
        }
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Shared server state containing the campaign registry.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RwLock<CampaignRegistry>>,
    /// Acting user for ledger entries that name none.
    pub operator: String,
    pub clock: Clock,
}

impl AppState {
    /// Create new app state around a registry.
    #[must_use]
    pub fn new(registry: CampaignRegistry, operator: impl Into<String>) -> Self {
        Self {
            registry: Arc::new(RwLock::new(registry)),
            operator: operator.into(),
            clock: Clock::System,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from `RADON_CORS_ORIGINS`.
///
/// - "*": any origin
/// - unset: localhost only
/// - otherwise: comma-separated origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("RADON_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins (RADON_CORS_ORIGINS=*)");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in RADON_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE])
            }
        }
        None => build_localhost_cors(),
    }
}

/// CORS layer that only allows the usual local dev-server origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5173",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner): tracing, CORS, body limit.
pub fn create_router(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES));

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/board", get(handlers::board_handler))
        .route(
            "/campaigns",
            get(handlers::list_campaigns_handler).post(handlers::create_campaign_handler),
        )
        .route("/campaigns/{id}", get(handlers::get_campaign_handler))
        .route("/campaigns/{id}/phase1", post(handlers::phase1_handler))
        .route("/campaigns/{id}/phase2", post(handlers::phase2_handler))
        .route("/campaigns/{id}/withdraw", post(handlers::withdraw_handler))
        .route("/campaigns/{id}/results", post(handlers::results_handler))
        .route("/inventory", get(handlers::inventory_handler))
        .route(
            "/stock",
            get(handlers::stock_handler).post(handlers::add_stock_handler),
        )
        .layer(middleware)
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Log store events as they happen.
fn log_store_event(event: &StoreEvent) {
    match event {
        StoreEvent::PhaseTwoCompleted {
            campaign_id,
            campaign_name,
            dosimeter_count,
        } => tracing::info!(
            campaign = %campaign_id,
            dosimeter_count,
            "Fase 2 completata: {}",
            campaign_name
        ),
        StoreEvent::StockChanged { total } => tracing::info!(total, "stock updated"),
        StoreEvent::CampaignsSaved { count } => tracing::debug!(count, "campaigns saved"),
    }
}

/// Start the HTTP server.
pub async fn run_server(
    addr: &str,
    mut registry: CampaignRegistry,
    operator: String,
) -> Result<(), RadonError> {
    registry.subscribe(Box::new(log_store_event));
    let state = AppState::new(registry, operator);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| RadonError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Radon HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RadonError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
