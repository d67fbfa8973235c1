//! JSON HTTP surface for the scoring service.
//!
//! Request bodies that fail to parse are answered like any other rejected
//! input: 400 with the `{error, kind}` body from [`RiskError`].

use crate::errors::{RiskError, RiskResult};
use crate::features::FEATURE_ORDER;
use crate::recommendations::Recommendation;
use crate::scoring::{RawInputs, ScoringService};
use axum::{
    extract::{rejection::JsonRejection, Extension},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, info_span, warn};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub probability: f64,
    pub probability_percent: String,
    pub risk_tier: crate::classifier::RiskTier,
    pub summary: &'static str,
    pub recommendations: Vec<Recommendation>,
}

/// Build the router exposing scoring, model info and health checks
pub fn build_router(service: Arc<ScoringService>) -> Router {
    Router::new()
        .route("/api/score", post(score))
        .route("/api/model", get(model_info))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .layer(Extension(service))
        .layer(CorsLayer::permissive())
}

async fn score(
    Extension(service): Extension<Arc<ScoringService>>,
    payload: Result<Json<RawInputs>, JsonRejection>,
) -> RiskResult<Json<ScoreResponse>> {
    let request_id = Uuid::new_v4();
    let _span = info_span!("score_request", %request_id).entered();

    let Json(inputs) = payload.map_err(|rejection| {
        warn!(status = %rejection.status(), "Rejected score request body");
        RiskError::validation("body", rejection.body_text())
    })?;
    let result = service.score(&inputs)?;
    info!(risk_tier = %result.risk_tier, "Score request completed");

    Ok(Json(ScoreResponse {
        probability_percent: result.probability_percent(),
        probability: result.probability,
        risk_tier: result.risk_tier,
        summary: result.risk_tier.summary(),
        recommendations: result.recommendations,
    }))
}

async fn model_info(Extension(service): Extension<Arc<ScoringService>>) -> Json<serde_json::Value> {
    let resources = service.resources();
    let feature_order: Vec<&str> = FEATURE_ORDER.iter().map(|f| f.key()).collect();
    Json(serde_json::json!({
        "model_id": resources.model().model_id(),
        "kind": resources.model().kind(),
        "feature_order": feature_order,
        "cutoff": service.classifier().cutoff(),
        "trained_at": resources.metadata().trained_at,
        "description": resources.metadata().description,
        "digests": resources.digests(),
    }))
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn readyz() -> Json<serde_json::Value> {
    // The service only exists once both artifacts have loaded
    Json(serde_json::json!({ "ready": true }))
}

/// Bind and serve until the process is stopped
pub async fn serve(service: Arc<ScoringService>, host: &str, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!("HTTP server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, build_router(service)).await?;
    Ok(())
}
