use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::User;
use crate::domain::Role;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, RequestUser};
use crate::services::user_service::{NewUser, UserService};

use super::require_admin;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<Role>,
}

/// POST /auth/signup - Self-service client registration
pub async fn signup(Json(payload): Json<SignupRequest>) -> ApiResult<User> {
    let pool = DatabaseManager::pool().await?;
    let user = UserService::new(pool)
        .create(NewUser {
            email: payload.email,
            password: payload.password,
            full_name: payload.full_name,
            // Self-registration always lands as a client account.
            role: Role::Client,
        })
        .await?;

    Ok(ApiResponse::created(user))
}

/// POST /auth/login - Authenticate and receive a JWT
pub async fn login(Json(payload): Json<LoginRequest>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;
    let (token, user) = UserService::new(pool)
        .login(&payload.email, &payload.password)
        .await?;

    let expires_in = crate::config::config().security.jwt_expiry_hours * 3600;
    Ok(ApiResponse::success(json!({
        "token": token,
        "user": user,
        "expires_in": expires_in,
    })))
}

/// GET /api/auth/whoami - Current validated identity
pub async fn whoami(Extension(user): Extension<RequestUser>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "id": user.id,
        "email": user.email,
        "role": user.role,
    })))
}

/// POST /api/users - Admin creates an account with an explicit role
pub async fn create(
    Extension(user): Extension<RequestUser>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<User> {
    require_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let created = UserService::new(pool)
        .create(NewUser {
            email: payload.email,
            password: payload.password,
            full_name: payload.full_name,
            role: payload.role,
        })
        .await?;

    Ok(ApiResponse::created(created))
}

/// GET /api/users - Admin lists accounts, optionally by role
pub async fn list(
    Extension(user): Extension<RequestUser>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Vec<User>> {
    require_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let users = UserService::new(pool).list(query.role).await?;
    Ok(ApiResponse::success(users))
}

/// GET /api/users/:id
pub async fn get(
    Extension(user): Extension<RequestUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<User> {
    if user.id != id {
        require_admin(&user)?;
    }

    let pool = DatabaseManager::pool().await?;
    let found = UserService::new(pool).get(id).await?;
    Ok(ApiResponse::success(found))
}

/// DELETE /api/users/:id - Soft-deactivate; accounts are never hard-deleted
pub async fn deactivate(
    Extension(user): Extension<RequestUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<User> {
    require_admin(&user)?;
    if user.id == id {
        return Err(ApiError::bad_request("You cannot deactivate your own account"));
    }

    let pool = DatabaseManager::pool().await?;
    let updated = UserService::new(pool).deactivate(id).await?;
    Ok(ApiResponse::success(updated))
}

/// POST /api/users/:id/activate - Reverse a soft-deactivation
pub async fn activate(
    Extension(user): Extension<RequestUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<User> {
    require_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let updated = UserService::new(pool).reactivate(id).await?;
    Ok(ApiResponse::success(updated))
}
