use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::{IntegrationAccount, Provider};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, RequestUser};
use crate::services::integration_service::{
    ConnectRequest, IntegrationService, IntegrationStatus,
};

#[derive(Debug, Deserialize)]
pub struct IntegrationTargetQuery {
    /// Admin override: read a client's integration data by passing their id.
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ConnectBody {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub external_id: Option<String>,
}

fn parse_provider(raw: &str) -> Result<Provider, ApiError> {
    Provider::parse(raw)
        .ok_or_else(|| ApiError::validation_error(format!("Unknown provider: {}", raw), None))
}

/// POST /api/integrations/:provider/connect
pub async fn connect(
    Extension(user): Extension<RequestUser>,
    Path(provider): Path<String>,
    Query(query): Query<IntegrationTargetQuery>,
    Json(payload): Json<ConnectBody>,
) -> ApiResult<IntegrationAccount> {
    let provider = parse_provider(&provider)?;

    let pool = DatabaseManager::pool().await?;
    let service = IntegrationService::new(pool);
    let target = service.resolve_target(&user, query.client_id).await?;

    let account = service
        .connect(
            target,
            ConnectRequest {
                provider,
                access_token: payload.access_token,
                refresh_token: payload.refresh_token,
                token_expires_at: payload.token_expires_at,
                external_id: payload.external_id,
            },
        )
        .await?;

    Ok(ApiResponse::created(account))
}

/// GET /api/integrations - Status of all three providers
pub async fn list(
    Extension(user): Extension<RequestUser>,
    Query(query): Query<IntegrationTargetQuery>,
) -> ApiResult<Vec<IntegrationStatus>> {
    let pool = DatabaseManager::pool().await?;
    let service = IntegrationService::new(pool);
    let target = service.resolve_target(&user, query.client_id).await?;

    let statuses = service.list(target).await?;
    Ok(ApiResponse::success(statuses))
}

/// GET /api/integrations/:provider
pub async fn status(
    Extension(user): Extension<RequestUser>,
    Path(provider): Path<String>,
    Query(query): Query<IntegrationTargetQuery>,
) -> ApiResult<IntegrationStatus> {
    let provider = parse_provider(&provider)?;

    let pool = DatabaseManager::pool().await?;
    let service = IntegrationService::new(pool);
    let target = service.resolve_target(&user, query.client_id).await?;

    let status = service.status(target, provider).await?;
    Ok(ApiResponse::success(status))
}

/// DELETE /api/integrations/:provider
pub async fn disconnect(
    Extension(user): Extension<RequestUser>,
    Path(provider): Path<String>,
    Query(query): Query<IntegrationTargetQuery>,
) -> ApiResult<Value> {
    let provider = parse_provider(&provider)?;

    let pool = DatabaseManager::pool().await?;
    let service = IntegrationService::new(pool);
    let target = service.resolve_target(&user, query.client_id).await?;

    service.disconnect(target, provider).await?;
    Ok(ApiResponse::success(json!({ "disconnected": true })))
}
