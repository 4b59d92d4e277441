use axum::{
    extract::{Extension, Path},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::{Task, TaskPriority};
use crate::domain::TaskStatus;
use crate::error::ApiError;
use crate::middleware::{authorize, Action, ApiResponse, ApiResult, RequestUser, Resource};
use crate::services::task_service::{NewTask, TaskService, TaskUpdate};

use super::require_staff_or_admin;

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub task_type: String,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub review_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct AttachDocumentRequest {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct HelpRequestBody {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    pub assigned_to: Option<Uuid>,
}

/// POST /api/tasks
pub async fn create(
    Extension(user): Extension<RequestUser>,
    Json(payload): Json<CreateTaskRequest>,
) -> ApiResult<Task> {
    require_staff_or_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let task = TaskService::new(pool)
        .create(
            &user,
            NewTask {
                title: payload.title,
                description: payload.description,
                task_type: payload.task_type,
                priority: payload.priority.unwrap_or(TaskPriority::Medium),
                assigned_to: payload.assigned_to,
                client_id: payload.client_id,
                staff_id: payload.staff_id,
                due_date: payload.due_date,
            },
        )
        .await?;

    Ok(ApiResponse::created(task))
}

/// GET /api/tasks - Role-scoped listing
pub async fn list(Extension(user): Extension<RequestUser>) -> ApiResult<Vec<Task>> {
    let pool = DatabaseManager::pool().await?;
    let tasks = TaskService::new(pool).list_for(&user).await?;
    Ok(ApiResponse::success(tasks))
}

/// GET /api/tasks/:id
pub async fn get(
    Extension(user): Extension<RequestUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Task> {
    let pool = DatabaseManager::pool().await?;
    let task = TaskService::new(pool.clone()).get(id).await?;
    authorize(&user, Resource::Task(&task), Action::Read, &pool).await?;
    Ok(ApiResponse::success(task))
}

/// PUT /api/tasks/:id - Update plain fields (not status)
pub async fn update(
    Extension(user): Extension<RequestUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> ApiResult<Task> {
    require_staff_or_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let service = TaskService::new(pool.clone());
    let task = service.get(id).await?;
    authorize(&user, Resource::Task(&task), Action::Update, &pool).await?;

    let task = service
        .update_fields(
            id,
            TaskUpdate {
                title: payload.title,
                description: payload.description,
                priority: payload.priority,
                due_date: payload.due_date,
            },
        )
        .await?;

    Ok(ApiResponse::success(task))
}

/// POST /api/tasks/:id/status - Explicit state-machine transition
pub async fn change_status(
    Extension(user): Extension<RequestUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusChangeRequest>,
) -> ApiResult<Task> {
    let to = TaskStatus::parse(&payload.status).ok_or_else(|| {
        ApiError::validation_error(format!("Unknown status: {}", payload.status), None)
    })?;

    let pool = DatabaseManager::pool().await?;
    let service = TaskService::new(pool.clone());
    let task = service.get(id).await?;
    authorize(&user, Resource::Task(&task), Action::Update, &pool).await?;

    let task = service.change_status(&task, &user, to, payload.notes).await?;
    Ok(ApiResponse::success(task))
}

/// POST /api/tasks/:id/approve - Force COMPLETED with review metadata
pub async fn approve(
    Extension(user): Extension<RequestUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApproveRequest>,
) -> ApiResult<Task> {
    require_staff_or_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let service = TaskService::new(pool.clone());
    let task = service.get(id).await?;
    authorize(&user, Resource::Task(&task), Action::Update, &pool).await?;

    let task = service.approve(&task, &user, payload.review_notes).await?;
    Ok(ApiResponse::success(task))
}

/// POST /api/tasks/:id/reject - Force NEEDS_REVISION, reason required
pub async fn reject(
    Extension(user): Extension<RequestUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectRequest>,
) -> ApiResult<Task> {
    require_staff_or_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let service = TaskService::new(pool.clone());
    let task = service.get(id).await?;
    authorize(&user, Resource::Task(&task), Action::Update, &pool).await?;

    let task = service.reject(&task, &user, &payload.reason).await?;
    Ok(ApiResponse::success(task))
}

/// POST /api/tasks/:id/cancel - Admin-only terminal cancellation
pub async fn cancel(
    Extension(user): Extension<RequestUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Task> {
    let pool = DatabaseManager::pool().await?;
    let service = TaskService::new(pool.clone());
    let task = service.get(id).await?;

    let task = service.cancel(&task, &user).await?;
    Ok(ApiResponse::success(task))
}

/// POST /api/tasks/:id/documents - Attach document metadata; may
/// auto-advance IN_PROGRESS to PENDING_REVIEW
pub async fn attach_document(
    Extension(user): Extension<RequestUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttachDocumentRequest>,
) -> ApiResult<Task> {
    let pool = DatabaseManager::pool().await?;
    let service = TaskService::new(pool.clone());
    let task = service.get(id).await?;
    authorize(&user, Resource::Document(&task), Action::Create, &pool).await?;

    let task = service
        .attach_document(&task, &user, &payload.name, &payload.url)
        .await?;
    Ok(ApiResponse::success(task))
}

/// POST /api/tasks/:id/help-requests
pub async fn add_help_request(
    Extension(user): Extension<RequestUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<HelpRequestBody>,
) -> ApiResult<Task> {
    let pool = DatabaseManager::pool().await?;
    let service = TaskService::new(pool.clone());
    let task = service.get(id).await?;
    authorize(&user, Resource::Task(&task), Action::Update, &pool).await?;

    let task = service.add_help_request(&task, &user, &payload.message).await?;
    Ok(ApiResponse::success(task))
}

/// POST /api/tasks/:id/help-requests/:help_id/resolve
pub async fn resolve_help_request(
    Extension(user): Extension<RequestUser>,
    Path((id, help_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Task> {
    require_staff_or_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let service = TaskService::new(pool.clone());
    let task = service.get(id).await?;
    authorize(&user, Resource::Task(&task), Action::Update, &pool).await?;

    let task = service.resolve_help_request(&task, &user, help_id).await?;
    Ok(ApiResponse::success(task))
}

/// POST /api/tasks/:id/reassign
pub async fn reassign(
    Extension(user): Extension<RequestUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReassignRequest>,
) -> ApiResult<Task> {
    require_staff_or_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let service = TaskService::new(pool.clone());
    let task = service.get(id).await?;
    authorize(&user, Resource::Task(&task), Action::Update, &pool).await?;

    let task = service.reassign(&task, &user, payload.assigned_to).await?;
    Ok(ApiResponse::success(task))
}
