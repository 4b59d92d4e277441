use axum::{
    extract::{Extension, Path},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::ClientAssignment;
use crate::domain::Role;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, RequestUser};
use crate::services::assignment_service::AssignmentService;

use super::require_admin;

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub staff_id: Uuid,
    pub client_id: Uuid,
}

/// POST /api/assignments - Pair a staff member with a client
pub async fn create(
    Extension(user): Extension<RequestUser>,
    Json(payload): Json<AssignRequest>,
) -> ApiResult<ClientAssignment> {
    require_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let assignment = AssignmentService::new(pool)
        .assign(payload.staff_id, payload.client_id, user.id)
        .await?;

    Ok(ApiResponse::created(assignment))
}

/// DELETE /api/assignments/:staff_id/:client_id
pub async fn delete(
    Extension(user): Extension<RequestUser>,
    Path((staff_id, client_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Value> {
    require_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    AssignmentService::new(pool)
        .unassign(staff_id, client_id)
        .await?;

    Ok(ApiResponse::success(json!({ "removed": true })))
}

/// GET /api/assignments/staff/:staff_id - Clients assigned to a staff member
pub async fn list_for_staff(
    Extension(user): Extension<RequestUser>,
    Path(staff_id): Path<Uuid>,
) -> ApiResult<Vec<ClientAssignment>> {
    // Staff may read their own list; everything else is admin-only.
    if !(user.role == Role::Staff && user.id == staff_id) {
        require_admin(&user)?;
    }

    let pool = DatabaseManager::pool().await?;
    let assignments = AssignmentService::new(pool).list_for_staff(staff_id).await?;
    Ok(ApiResponse::success(assignments))
}

/// GET /api/assignments/client/:client_id - Staff assigned to a client
pub async fn list_for_client(
    Extension(user): Extension<RequestUser>,
    Path(client_id): Path<Uuid>,
) -> ApiResult<Vec<ClientAssignment>> {
    match user.role {
        Role::Admin => {}
        Role::Client if user.id == client_id => {}
        _ => return Err(ApiError::forbidden("Not your assignment list")),
    }

    let pool = DatabaseManager::pool().await?;
    let assignments = AssignmentService::new(pool)
        .list_for_client(client_id)
        .await?;
    Ok(ApiResponse::success(assignments))
}
