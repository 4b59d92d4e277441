use axum::{http::HeaderMap, Json};
use serde_json::json;

use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::ZapierJob;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::onboarding_service::{
    OnboardingService, ProposalStatusPayload, ZapierStatusPayload,
};

/// Callback verification only runs when a shared secret is configured;
/// by default callbacks are accepted unauthenticated.
fn verify_shared_secret(headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = &config::config().security.webhook_shared_secret else {
        return Ok(());
    };

    let provided = headers
        .get("x-webhook-secret")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if provided == expected {
        Ok(())
    } else {
        tracing::warn!("Webhook rejected: missing or wrong shared secret");
        Err(ApiError::unauthorized("Invalid webhook secret"))
    }
}

/// POST /webhooks/zapier/status - Job status callback from Zapier.
/// Last writer wins by request_id; duplicates overwrite.
pub async fn zapier_status(
    headers: HeaderMap,
    Json(payload): Json<ZapierStatusPayload>,
) -> ApiResult<ZapierJob> {
    verify_shared_secret(&headers)?;

    let pool = DatabaseManager::pool().await?;
    let job = OnboardingService::new(pool)
        .zapier_status_callback(payload)
        .await?;

    Ok(ApiResponse::success(job))
}

/// POST /webhooks/ignition/proposal - Proposal/payment status callback.
/// Advances the questionnaire monotonically; confirmed payment triggers
/// client onboarding.
pub async fn ignition_proposal_status(
    headers: HeaderMap,
    Json(payload): Json<ProposalStatusPayload>,
) -> ApiResult<serde_json::Value> {
    verify_shared_secret(&headers)?;

    let pool = DatabaseManager::pool().await?;
    let (questionnaire, onboarding) = OnboardingService::new(pool)
        .ignition_proposal_status_callback(payload)
        .await?;

    Ok(ApiResponse::success(json!({
        "questionnaire": questionnaire,
        "onboarding": onboarding,
    })))
}
