use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{Task, TaskPriority, TaskTemplate};
use crate::error::ApiError;
use crate::middleware::RequestUser;

use super::task_service::{NewTask, TaskService};

pub struct TemplateService {
    pool: PgPool,
}

pub struct NewTemplate {
    pub title: String,
    pub description: String,
    pub task_type: String,
    pub priority: TaskPriority,
    pub checklist: Vec<String>,
}

impl TemplateService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        actor: &RequestUser,
        template: NewTemplate,
    ) -> Result<TaskTemplate, ApiError> {
        if template.title.trim().is_empty() {
            return Err(ApiError::validation_error("Template title is required", None));
        }
        if template.task_type.trim().is_empty() {
            return Err(ApiError::validation_error("Template task type is required", None));
        }

        let row: TaskTemplate = sqlx::query_as(
            r#"
            INSERT INTO task_templates (id, title, description, task_type, priority, checklist, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(template.title.trim())
        .bind(template.description.trim())
        .bind(template.task_type.trim())
        .bind(template.priority.as_str())
        .bind(Json(template.checklist))
        .bind(actor.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get(&self, id: Uuid) -> Result<TaskTemplate, ApiError> {
        let row: Option<TaskTemplate> =
            sqlx::query_as("SELECT * FROM task_templates WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.ok_or_else(|| ApiError::not_found(format!("Template {} not found", id)))
    }

    pub async fn list(&self) -> Result<Vec<TaskTemplate>, ApiError> {
        let rows: Vec<TaskTemplate> = sqlx::query_as(
            "SELECT * FROM task_templates WHERE active = TRUE ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<TaskTemplate, ApiError> {
        let row: Option<TaskTemplate> = sqlx::query_as(
            "UPDATE task_templates SET active = FALSE, updated_at = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| ApiError::not_found(format!("Template {} not found", id)))
    }

    /// Instantiate a task from the blueprint and bump its usage counter.
    pub async fn instantiate(
        &self,
        actor: &RequestUser,
        template_id: Uuid,
        client_id: Option<Uuid>,
        assigned_to: Option<Uuid>,
        due_date: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<Task, ApiError> {
        let template = self.get(template_id).await?;
        if !template.active {
            return Err(ApiError::conflict("Template has been deactivated"));
        }

        let priority = TaskPriority::parse(&template.priority).unwrap_or(TaskPriority::Medium);
        let task = TaskService::new(self.pool.clone())
            .create(
                actor,
                NewTask {
                    title: template.title.clone(),
                    description: template.description.clone(),
                    task_type: template.task_type.clone(),
                    priority,
                    assigned_to,
                    client_id,
                    staff_id: assigned_to,
                    due_date,
                },
            )
            .await?;

        sqlx::query(
            "UPDATE task_templates SET usage_count = usage_count + 1, updated_at = $2 WHERE id = $1",
        )
        .bind(template_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(task)
    }
}
