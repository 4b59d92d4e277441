use axum::{
    extract::{Extension, Path},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::{Task, TaskPriority, TaskTemplate};
use crate::middleware::{ApiResponse, ApiResult, RequestUser};
use crate::services::template_service::{NewTemplate, TemplateService};

use super::require_staff_or_admin;

#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub task_type: String,
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub checklist: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct InstantiateRequest {
    pub client_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
}

/// POST /api/templates
pub async fn create(
    Extension(user): Extension<RequestUser>,
    Json(payload): Json<CreateTemplateRequest>,
) -> ApiResult<TaskTemplate> {
    require_staff_or_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let template = TemplateService::new(pool)
        .create(
            &user,
            NewTemplate {
                title: payload.title,
                description: payload.description,
                task_type: payload.task_type,
                priority: payload.priority.unwrap_or(TaskPriority::Medium),
                checklist: payload.checklist,
            },
        )
        .await?;

    Ok(ApiResponse::created(template))
}

/// GET /api/templates
pub async fn list(Extension(user): Extension<RequestUser>) -> ApiResult<Vec<TaskTemplate>> {
    require_staff_or_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let templates = TemplateService::new(pool).list().await?;
    Ok(ApiResponse::success(templates))
}

/// GET /api/templates/:id
pub async fn get(
    Extension(user): Extension<RequestUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<TaskTemplate> {
    require_staff_or_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let template = TemplateService::new(pool).get(id).await?;
    Ok(ApiResponse::success(template))
}

/// DELETE /api/templates/:id - Soft-deactivate the blueprint
pub async fn deactivate(
    Extension(user): Extension<RequestUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<TaskTemplate> {
    require_staff_or_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let template = TemplateService::new(pool).deactivate(id).await?;
    Ok(ApiResponse::success(template))
}

/// POST /api/templates/:id/instantiate - Create a task from the blueprint
pub async fn instantiate(
    Extension(user): Extension<RequestUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<InstantiateRequest>,
) -> ApiResult<Task> {
    require_staff_or_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let task = TemplateService::new(pool)
        .instantiate(
            &user,
            id,
            payload.client_id,
            payload.assigned_to,
            payload.due_date,
        )
        .await?;

    Ok(ApiResponse::created(task))
}
