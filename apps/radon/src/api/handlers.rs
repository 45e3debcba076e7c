//! # API Endpoint Handlers
//!
//! Every mutating handler takes the registry write lock for the whole
//! load-modify-save cycle, so concurrent requests never interleave writes.

use super::{
    AppState,
    types::{
        ApiError, BoardQuery, CreatedResponse, HealthResponse, Phase1Request, Phase2Request,
        ResultsRequest, StockRequest, StockResponse,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use radon_core::{
    Board, Campaign, CampaignDataForm, CampaignId, CampaignWizard, CompletionReport,
    InventorySummary, Phase1Form, PhaseTwoSummary, RadonError, StockEntry, StockForm,
    WithdrawalForm, WizardStep,
};

type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// READ HANDLERS
// =============================================================================

/// Kanban board, optionally filtered.
pub async fn board_handler(
    State(state): State<AppState>,
    Query(query): Query<BoardQuery>,
) -> Json<Board> {
    let registry = state.registry.read().await;
    let campaigns = registry.load_all();
    Json(Board::build(
        &campaigns,
        state.clock.today(),
        query.search.as_deref(),
    ))
}

pub async fn list_campaigns_handler(State(state): State<AppState>) -> Json<Vec<Campaign>> {
    Json(state.registry.read().await.load_all())
}

pub async fn get_campaign_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Campaign>> {
    let campaign = state.registry.read().await.get(&CampaignId::new(id))?;
    Ok(Json(campaign))
}

pub async fn inventory_handler(State(state): State<AppState>) -> Json<InventorySummary> {
    let registry = state.registry.read().await;
    Json(registry.inventory(state.clock.today()))
}

// =============================================================================
// WIZARD HANDLERS
// =============================================================================

/// Step 1: create a campaign in `planned`.
pub async fn create_campaign_handler(
    State(state): State<AppState>,
    Json(form): Json<CampaignDataForm>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let mut registry = state.registry.write().await;
    let mut wizard = CampaignWizard::new();
    wizard.campaign_data = form;
    let id = wizard.submit_campaign_data(&mut registry, state.clock.today())?;
    let campaign = registry.get(&id)?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id, campaign })))
}

/// Step 2: Phase 1 placement.
pub async fn phase1_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<Phase1Request>,
) -> ApiResult<Json<Campaign>> {
    let id = CampaignId::new(id);
    let mut registry = state.registry.write().await;
    let mut wizard = CampaignWizard::resume(&registry.get(&id)?);
    wizard.phase1 = Phase1Form {
        placement_date: request.placement_date,
        signatures: request.signatures.clone(),
        rows: request.rows(),
    };
    wizard.submit_phase1(&mut registry, state.clock.today())?;
    Ok(Json(registry.get(&id)?))
}

/// Step 3: Phase 2 replacement.
pub async fn phase2_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<Phase2Request>,
) -> ApiResult<Json<PhaseTwoSummary>> {
    let id = CampaignId::new(id);
    let mut registry = state.registry.write().await;
    let mut wizard = CampaignWizard::resume(&registry.get(&id)?);
    if wizard.step() != WizardStep::Phase2Replacement {
        return Err(RadonError::InvalidTransition(format!(
            "campaign {} is not waiting for Phase 2",
            id
        ))
        .into());
    }

    wizard.phase2.signatures = request.signatures;
    if request.start_date.is_some() {
        wizard.phase2.start_date = request.start_date;
    }
    for replacement in request.replacements {
        wizard.phase2.set_code(replacement.id, replacement.code)?;
        if let Some(row) = wizard
            .phase2
            .rows
            .iter_mut()
            .find(|r| r.placement.id == replacement.id)
        {
            row.placement.photos = replacement.photos;
        }
    }
    let summary = wizard.submit_phase2(&mut registry, state.clock.today())?;
    Ok(Json(summary))
}

// =============================================================================
// CLOSING HANDLERS
// =============================================================================

pub async fn withdraw_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<WithdrawalForm>,
) -> ApiResult<Json<Campaign>> {
    let mut registry = state.registry.write().await;
    let campaign = form.apply(&mut registry, &CampaignId::new(id), state.clock.today())?;
    Ok(Json(campaign))
}

pub async fn results_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ResultsRequest>,
) -> ApiResult<Json<CompletionReport>> {
    let mut registry = state.registry.write().await;
    let report = request
        .into_form()
        .apply(&mut registry, &CampaignId::new(id))?;
    Ok(Json(report))
}

// =============================================================================
// STOCK HANDLERS
// =============================================================================

pub async fn stock_handler(State(state): State<AppState>) -> Json<StockResponse> {
    let ledger = state.registry.read().await.ledger();
    Json(StockResponse {
        baseline: ledger.baseline(),
        total: ledger.total(),
        entries: ledger.entries_recent_first().cloned().collect(),
    })
}

pub async fn add_stock_handler(
    State(state): State<AppState>,
    Json(request): Json<StockRequest>,
) -> ApiResult<(StatusCode, Json<StockEntry>)> {
    let user = request
        .user
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| state.operator.clone());
    let form = StockForm::new(request.quantity, request.order_ref);
    let mut registry = state.registry.write().await;
    let entry = registry.add_stock(&form, &user, state.clock.now())?;
    Ok((StatusCode::CREATED, Json(entry)))
}
