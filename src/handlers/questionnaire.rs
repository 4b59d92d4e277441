use axum::{
    extract::{Extension, Path},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::{EngagementLetter, EngagementStatus, QuestionnaireResponse};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, RequestUser};
use crate::services::engagement_service::EngagementService;
use crate::services::onboarding_service::{DispatchOutcome, OnboardingService};

use super::{require_admin, require_staff_or_admin};

#[derive(Debug, Deserialize)]
pub struct SubmitQuestionnaireRequest {
    pub email: String,
    pub answers: Value,
    pub metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateEngagementLetterRequest {
    pub email: String,
    pub proposal_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEngagementStatusRequest {
    pub status: String,
}

/// POST /questionnaire - Public submission; upserts by email and resets
/// the TTL window
pub async fn submit(
    Json(payload): Json<SubmitQuestionnaireRequest>,
) -> ApiResult<QuestionnaireResponse> {
    let pool = DatabaseManager::pool().await?;
    let response = OnboardingService::new(pool)
        .submit_questionnaire(&payload.email, payload.answers, payload.metadata)
        .await?;

    Ok(ApiResponse::created(response))
}

/// GET /api/questionnaire/:email
pub async fn get(
    Extension(user): Extension<RequestUser>,
    Path(email): Path<String>,
) -> ApiResult<QuestionnaireResponse> {
    require_staff_or_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let response = OnboardingService::new(pool).get_questionnaire(&email).await?;
    Ok(ApiResponse::success(response))
}

/// POST /api/onboarding/ignition - Dispatch the client-creation job.
/// At most one in-flight job per email; the request succeeds even when
/// the webhook call fails, reporting the outcome informationally.
pub async fn create_client_in_ignition(
    Extension(user): Extension<RequestUser>,
    Json(payload): Json<CreateClientRequest>,
) -> ApiResult<DispatchOutcome> {
    require_staff_or_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let outcome = OnboardingService::new(pool)
        .create_client_in_ignition(&payload.email)
        .await?;

    Ok(ApiResponse::created(outcome))
}

/// POST /api/onboarding/onboard/:email - Manual (re-)trigger of the
/// find-or-create onboarding step; idempotent when already onboarded.
pub async fn onboard(
    Extension(user): Extension<RequestUser>,
    Path(email): Path<String>,
) -> ApiResult<crate::services::onboarding_service::OnboardOutcome> {
    require_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let outcome = OnboardingService::new(pool)
        .onboard_client_from_questionnaire(&email)
        .await?;

    Ok(ApiResponse::success(outcome))
}

/// POST /api/engagement-letters
pub async fn create_engagement_letter(
    Extension(user): Extension<RequestUser>,
    Json(payload): Json<CreateEngagementLetterRequest>,
) -> ApiResult<EngagementLetter> {
    require_staff_or_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let letter = EngagementService::new(pool)
        .create(&payload.email, payload.proposal_id.as_deref())
        .await?;

    Ok(ApiResponse::created(letter))
}

/// PUT /api/engagement-letters/:id/status
pub async fn update_engagement_status(
    Extension(user): Extension<RequestUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEngagementStatusRequest>,
) -> ApiResult<EngagementLetter> {
    require_staff_or_admin(&user)?;

    let status = EngagementStatus::parse(&payload.status).ok_or_else(|| {
        ApiError::validation_error(format!("Unknown letter status: {}", payload.status), None)
    })?;

    let pool = DatabaseManager::pool().await?;
    let letter = EngagementService::new(pool).update_status(id, status).await?;
    Ok(ApiResponse::success(letter))
}

/// GET /api/engagement-letters/by-email/:email
pub async fn get_engagement_letter(
    Extension(user): Extension<RequestUser>,
    Path(email): Path<String>,
) -> ApiResult<EngagementLetter> {
    require_staff_or_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let letter = EngagementService::new(pool)
        .find_active_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No active engagement letter for {}", email)))?;
    Ok(ApiResponse::success(letter))
}
