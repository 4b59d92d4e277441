use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::domain::Role;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, RequestUser};
use crate::services::billing_service::BillingService;

#[derive(Debug, Deserialize)]
pub struct BillingTargetQuery {
    /// Admin override: act on this client's billing instead of your own.
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub price_id: String,
}

/// Admins may act on any client via ?client_id=; everyone else only on
/// themselves.
fn resolve_billing_target(user: &RequestUser, client_id: Option<Uuid>) -> Result<Uuid, ApiError> {
    match client_id {
        None => Ok(user.id),
        Some(target) if target == user.id => Ok(user.id),
        Some(target) => {
            if user.role == Role::Admin {
                Ok(target)
            } else {
                Err(ApiError::forbidden("Billing for other accounts requires admin"))
            }
        }
    }
}

/// POST /api/billing/customer - Ensure a Stripe customer exists
pub async fn ensure_customer(
    Extension(user): Extension<RequestUser>,
    Query(query): Query<BillingTargetQuery>,
) -> ApiResult<Value> {
    let target = resolve_billing_target(&user, query.client_id)?;

    let pool = DatabaseManager::pool().await?;
    let service = BillingService::new(pool);
    let target_user = service.load_user(target).await?;
    let customer_id = service.ensure_customer(&target_user).await?;

    Ok(ApiResponse::success(
        serde_json::json!({ "customer_id": customer_id }),
    ))
}

/// POST /api/billing/subscriptions
pub async fn create_subscription(
    Extension(user): Extension<RequestUser>,
    Query(query): Query<BillingTargetQuery>,
    Json(payload): Json<CreateSubscriptionRequest>,
) -> ApiResult<Value> {
    let target = resolve_billing_target(&user, query.client_id)?;

    let pool = DatabaseManager::pool().await?;
    let service = BillingService::new(pool);
    let target_user = service.load_user(target).await?;
    let subscription = service
        .create_subscription(&target_user, &payload.price_id)
        .await?;

    Ok(ApiResponse::created(subscription))
}

/// GET /api/billing/subscriptions/:subscription_id
pub async fn get_subscription(
    Extension(user): Extension<RequestUser>,
    Path(subscription_id): Path<String>,
) -> ApiResult<Value> {
    // Back-office only; clients see their billing through invoices.
    crate::handlers::require_staff_or_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let subscription = BillingService::new(pool)
        .get_subscription(&subscription_id)
        .await?;
    Ok(ApiResponse::success(subscription))
}

/// DELETE /api/billing/subscriptions/:subscription_id
pub async fn cancel_subscription(
    Extension(user): Extension<RequestUser>,
    Path(subscription_id): Path<String>,
) -> ApiResult<Value> {
    crate::handlers::require_staff_or_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let cancelled = BillingService::new(pool)
        .cancel_subscription(&subscription_id)
        .await?;
    Ok(ApiResponse::success(cancelled))
}

/// GET /api/billing/invoices
pub async fn list_invoices(
    Extension(user): Extension<RequestUser>,
    Query(query): Query<BillingTargetQuery>,
) -> ApiResult<Value> {
    let target = resolve_billing_target(&user, query.client_id)?;

    let pool = DatabaseManager::pool().await?;
    let service = BillingService::new(pool);
    let target_user = service.load_user(target).await?;
    let invoices = service.list_invoices(&target_user).await?;
    Ok(ApiResponse::success(invoices))
}
