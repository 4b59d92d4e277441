use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
};
use uuid::Uuid;

use super::auth::AuthUser;
use crate::database::manager::DatabaseManager;
use crate::database::models::User;
use crate::domain::Role;
use crate::error::ApiError;

/// Fully validated request identity: the user row reloaded from the
/// database. The role always comes from here, never from the token.
#[derive(Clone, Debug)]
pub struct RequestUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

fn error_response(api_error: ApiError) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::from_u16(api_error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(api_error.to_json()),
    )
}

/// Middleware that validates the user from JWT claims against the users
/// table. Ensures the user still exists, is active, and carries a known
/// role.
pub async fn validate_user_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    // Get AuthUser from JWT middleware
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| {
            error_response(ApiError::unauthorized(
                "JWT authentication required before user validation",
            ))
        })?
        .clone();

    let pool = DatabaseManager::pool().await.map_err(|e| {
        tracing::error!("Database unavailable during user validation: {}", e);
        error_response(ApiError::service_unavailable("Database temporarily unavailable"))
    })?;

    let user: Option<User> = sqlx::query_as(
        "SELECT * FROM users WHERE id = $1 AND active = TRUE",
    )
    .bind(auth_user.user_id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Database error validating user {}: {}", auth_user.user_id, e);
        error_response(ApiError::internal_server_error("Failed to validate user"))
    })?;

    let user = user.ok_or_else(|| {
        tracing::warn!(
            "User validation failed: user {} not found or deactivated",
            auth_user.user_id
        );
        error_response(ApiError::forbidden("Account is not active"))
    })?;

    let role = user.role().ok_or_else(|| {
        tracing::warn!(
            "User validation failed: user {} has unknown role {}",
            user.id,
            user.role
        );
        error_response(ApiError::forbidden("Account role is not recognized"))
    })?;

    let request_user = RequestUser {
        id: user.id,
        email: user.email,
        role,
    };

    tracing::debug!(
        "User validation successful: {} as {}",
        request_user.email,
        request_user.role
    );

    // Inject validated user into request
    request.extensions_mut().insert(request_user);

    Ok(next.run(request).await)
}
