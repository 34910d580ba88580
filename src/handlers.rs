use crate::clients::BbpsClient;
use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::handoff::HandoffStore;
use crate::models::*;
use crate::orchestrator::{active_plans, Orchestrator};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use moka::future::Cache;
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Client for the BBPS aggregator upstream.
    pub bbps_client: BbpsClient,
    /// Biller-catalog cache to reduce upstream calls.
    /// Key: "{service_id}:{category_id}", Value: catalog slice.
    pub biller_cache: Cache<String, Arc<Vec<Biller>>>,
    /// Per-biller fee config cache. Key: biller id, Value: the record or
    /// None when the provider has no entry (checked and absent).
    pub fee_cache: Cache<String, Option<FeeConfig>>,
    /// Session-scoped hand-off slot consumed by the next screen.
    pub handoff_store: HandoffStore,
}

impl AppState {
    /// Cache-first biller catalog lookup.
    async fn billers_for(
        &self,
        service_id: &str,
        category_id: &str,
    ) -> Result<Arc<Vec<Biller>>, AppError> {
        let cache_key = format!("{}:{}", service_id, category_id);
        if let Some(cached) = self.biller_cache.get(&cache_key).await {
            tracing::debug!("Biller catalog cache hit for {}", cache_key);
            return Ok(cached);
        }

        let billers = Arc::new(self.bbps_client.list_billers(service_id, category_id).await?);
        self.biller_cache.insert(cache_key, billers.clone()).await;
        Ok(billers)
    }

    /// Cache-first fee config lookup. The fee record ships with the biller
    /// metadata, so the orchestration itself never has to call out for it.
    async fn fee_config_for(&self, biller_id: &str) -> Result<Option<FeeConfig>, AppError> {
        if let Some(cached) = self.fee_cache.get(biller_id).await {
            tracing::debug!("Fee config cache hit for {}", biller_id);
            return Ok(cached);
        }

        let fee = self.bbps_client.fee_config(biller_id).await?;
        self.fee_cache.insert(biller_id.to_string(), fee.clone()).await;
        Ok(fee)
    }
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-bbps-api",
            "version": "0.1.0"
        })),
    )
}

/// GET /api/v1/billers
///
/// Lists the billers registered for a service/category pair. Served from the
/// catalog cache when fresh.
pub async fn list_billers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListBillersParams>,
) -> Result<Json<Vec<Biller>>, AppError> {
    tracing::info!("GET /billers - params: {:?}", params);
    let billers = state
        .billers_for(&params.service_id, &params.category_id)
        .await
        .context("listing billers")?;
    Ok(Json(billers.as_ref().clone()))
}

/// GET /api/v1/billers/:biller_id/plans
///
/// Pulls the plan catalog for a biller and returns only currently-active
/// plans. Plans are fetched on demand; there is no plan cache because the
/// selection is discarded whenever the biller changes.
pub async fn pull_plans(
    State(state): State<Arc<AppState>>,
    Path(biller_id): Path<String>,
    Query(params): Query<PullPlansParams>,
) -> Result<Json<Vec<Plan>>, AppError> {
    tracing::info!("GET /billers/{}/plans - params: {:?}", biller_id, params);
    let plans = state
        .bbps_client
        .pull_plans(&params.service_id, &biller_id)
        .await
        .context("pulling plans")?;
    Ok(Json(active_plans(plans)))
}

/// POST /api/v1/bills/submit
///
/// Runs the full orchestration for one submission: validates the customer
/// inputs, executes whichever remote operations the biller's capability flags
/// require, and on success writes the hand-off payload to the session slot
/// (overwriting any previous value) before returning it.
///
/// A biller that demands a plan without one selected yields 409 with
/// `planSelectionRequired`; the caller pulls plans and resubmits.
pub async fn submit_bill(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitBillRequest>,
) -> Result<Json<HandoffPayload>, AppError> {
    tracing::info!(
        "POST /bills/submit - biller {} service {}",
        request.biller_id,
        request.service_id
    );

    let billers = state
        .billers_for(&request.service_id, &request.category_id)
        .await?;
    let biller = billers
        .iter()
        .find(|b| b.biller_id == request.biller_id)
        .ok_or_else(|| AppError::NotFound(format!("Biller {} not found", request.biller_id)))?;

    let fee_config = state.fee_config_for(&request.biller_id).await?;

    let orchestrator = Orchestrator::new(&state.bbps_client, &state.config.fee_direction_default);
    let payload = orchestrator
        .run(
            &request.service_id,
            biller,
            &request.customer,
            &request.input_values,
            request.selected_plan_id.as_deref(),
            fee_config.as_ref(),
        )
        .await?;

    // Single-writer hand-off: the new payload replaces whatever the session
    // had in flight. Written only after the whole run succeeded.
    let session_id = request.session_id.as_deref().unwrap_or("default");
    state.handoff_store.put(session_id, payload.clone()).await;

    tracing::info!(
        "Hand-off payload stored for session {} (source: {}, requestId: {})",
        session_id,
        payload.source,
        payload.request_id
    );

    Ok(Json(payload))
}

/// GET /api/v1/bills/handoff/:session_id
///
/// Consume-once read of the stored hand-off payload. The slot is cleared on
/// read; a second read returns 404.
pub async fn take_handoff(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<HandoffPayload>, AppError> {
    tracing::info!("GET /bills/handoff/{}", session_id);
    state
        .handoff_store
        .take(&session_id)
        .await
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound(format!("No hand-off payload for session {}", session_id))
        })
}
