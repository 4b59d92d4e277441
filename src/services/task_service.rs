use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{
    AssignmentEntry, HelpRequest, StatusHistoryEntry, Task, TaskDocument, TaskPriority,
};
use crate::domain::{check_transition, Role, TaskStatus};
use crate::error::ApiError;
use crate::middleware::RequestUser;

pub struct TaskService {
    pool: PgPool,
}

pub struct NewTask {
    pub title: String,
    pub description: String,
    pub task_type: String,
    pub priority: TaskPriority,
    pub assigned_to: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
}

impl TaskService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<Task, ApiError> {
        let task: Option<Task> = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        task.ok_or_else(|| ApiError::not_found(format!("Task {} not found", id)))
    }

    pub async fn create(&self, actor: &RequestUser, new_task: NewTask) -> Result<Task, ApiError> {
        if new_task.title.trim().is_empty() {
            return Err(ApiError::validation_error("Task title is required", None));
        }
        if new_task.task_type.trim().is_empty() {
            return Err(ApiError::validation_error("Task type is required", None));
        }

        let now = Utc::now();
        let initial_history = vec![StatusHistoryEntry {
            status: TaskStatus::NotStarted.as_str().to_string(),
            actor: actor.id,
            at: now,
            notes: Some("Task created".to_string()),
        }];
        let initial_assignment = vec![AssignmentEntry {
            assigned_to: new_task.assigned_to,
            assigned_by: actor.id,
            at: now,
        }];

        let task: Task = sqlx::query_as(
            r#"
            INSERT INTO tasks (
                id, title, description, task_type, status, priority,
                assigned_to, assigned_by, client_id, staff_id, due_date,
                status_history, assignment_history
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_task.title.trim())
        .bind(new_task.description.trim())
        .bind(new_task.task_type.trim())
        .bind(TaskStatus::NotStarted.as_str())
        .bind(new_task.priority.as_str())
        .bind(new_task.assigned_to)
        .bind(actor.id)
        .bind(new_task.client_id)
        .bind(new_task.staff_id)
        .bind(new_task.due_date)
        .bind(Json(initial_history))
        .bind(Json(initial_assignment))
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    /// Role-scoped listing: admin sees everything, staff their own and
    /// their assigned clients' tasks, clients only their own.
    pub async fn list_for(&self, user: &RequestUser) -> Result<Vec<Task>, ApiError> {
        let tasks: Vec<Task> = match user.role {
            Role::Admin => {
                sqlx::query_as("SELECT * FROM tasks ORDER BY created_at DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
            Role::Staff => {
                sqlx::query_as(
                    r#"
                    SELECT * FROM tasks
                    WHERE assigned_to = $1
                       OR staff_id = $1
                       OR client_id IN (
                           SELECT client_id FROM client_assignments WHERE staff_id = $1
                       )
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(user.id)
                .fetch_all(&self.pool)
                .await?
            }
            Role::Client => {
                sqlx::query_as(
                    "SELECT * FROM tasks WHERE client_id = $1 OR assigned_to = $1 ORDER BY created_at DESC",
                )
                .bind(user.id)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(tasks)
    }

    pub async fn update_fields(&self, id: Uuid, update: TaskUpdate) -> Result<Task, ApiError> {
        let task = self.get(id).await?;

        let title = update.title.unwrap_or(task.title);
        if title.trim().is_empty() {
            return Err(ApiError::validation_error("Task title is required", None));
        }
        let description = update.description.unwrap_or(task.description);
        let priority = update
            .priority
            .map(|p| p.as_str().to_string())
            .unwrap_or(task.priority);
        let due_date = update.due_date.or(task.due_date);

        let task: Task = sqlx::query_as(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, priority = $4, due_date = $5, updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(title.trim())
        .bind(description)
        .bind(priority)
        .bind(due_date)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    /// Explicit status change, validated against the adjacency table and
    /// the actor's role. Appends to the immutable status history.
    pub async fn change_status(
        &self,
        task: &Task,
        actor: &RequestUser,
        to: TaskStatus,
        notes: Option<String>,
    ) -> Result<Task, ApiError> {
        let from = task
            .status()
            .ok_or_else(|| ApiError::internal_server_error("Task has an unknown status"))?;

        check_transition(actor.role, from, to)?;

        self.apply_status(task, actor.id, to, notes).await
    }

    /// Approve is a special-cased terminal action: forces COMPLETED
    /// regardless of the current status and records the reviewer.
    pub async fn approve(
        &self,
        task: &Task,
        actor: &RequestUser,
        review_notes: Option<String>,
    ) -> Result<Task, ApiError> {
        let now = Utc::now();
        let mut history = task.status_history.0.clone();
        history.push(StatusHistoryEntry {
            status: TaskStatus::Completed.as_str().to_string(),
            actor: actor.id,
            at: now,
            notes: review_notes.clone().or_else(|| Some("Approved".to_string())),
        });

        let task: Task = sqlx::query_as(
            r#"
            UPDATE tasks
            SET status = $2, completed_at = $3, reviewed_by = $4, review_notes = $5,
                status_history = $6, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(task.id)
        .bind(TaskStatus::Completed.as_str())
        .bind(now)
        .bind(actor.id)
        .bind(review_notes)
        .bind(Json(history))
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    /// Reject forces NEEDS_REVISION and requires a non-empty reason.
    pub async fn reject(
        &self,
        task: &Task,
        actor: &RequestUser,
        reason: &str,
    ) -> Result<Task, ApiError> {
        if reason.trim().is_empty() {
            return Err(ApiError::validation_error(
                "A rejection reason is required",
                None,
            ));
        }

        let now = Utc::now();
        let mut history = task.status_history.0.clone();
        history.push(StatusHistoryEntry {
            status: TaskStatus::NeedsRevision.as_str().to_string(),
            actor: actor.id,
            at: now,
            notes: Some(format!("Rejected: {}", reason.trim())),
        });

        let task: Task = sqlx::query_as(
            r#"
            UPDATE tasks
            SET status = $2, rejection_reason = $3, reviewed_by = $4,
                status_history = $5, updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(task.id)
        .bind(TaskStatus::NeedsRevision.as_str())
        .bind(reason.trim())
        .bind(actor.id)
        .bind(Json(history))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    /// Admin-only terminal cancellation.
    pub async fn cancel(&self, task: &Task, actor: &RequestUser) -> Result<Task, ApiError> {
        if !actor.role.is_admin() {
            return Err(ApiError::forbidden("Only admins may cancel tasks"));
        }
        self.apply_status(task, actor.id, TaskStatus::Cancelled, Some("Cancelled".to_string()))
            .await
    }

    /// Attach document metadata. A task in IN_PROGRESS auto-advances to
    /// PENDING_REVIEW as a side effect, bypassing the explicit
    /// status-change path.
    pub async fn attach_document(
        &self,
        task: &Task,
        actor: &RequestUser,
        name: &str,
        url: &str,
    ) -> Result<Task, ApiError> {
        if name.trim().is_empty() || url.trim().is_empty() {
            return Err(ApiError::validation_error(
                "Document name and url are required",
                None,
            ));
        }

        let now = Utc::now();
        let mut documents = task.documents.0.clone();
        documents.push(TaskDocument {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            url: url.trim().to_string(),
            uploaded_by: actor.id,
            uploaded_at: now,
        });

        let auto_advance = task.status() == Some(TaskStatus::InProgress);
        let mut history = task.status_history.0.clone();
        let status = if auto_advance {
            history.push(StatusHistoryEntry {
                status: TaskStatus::PendingReview.as_str().to_string(),
                actor: actor.id,
                at: now,
                notes: Some("Auto-advanced on document upload".to_string()),
            });
            TaskStatus::PendingReview.as_str()
        } else {
            task.status.as_str()
        };

        let task: Task = sqlx::query_as(
            r#"
            UPDATE tasks
            SET documents = $2, status = $3, status_history = $4, updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(task.id)
        .bind(Json(documents))
        .bind(status)
        .bind(Json(history))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    pub async fn add_help_request(
        &self,
        task: &Task,
        actor: &RequestUser,
        message: &str,
    ) -> Result<Task, ApiError> {
        if message.trim().is_empty() {
            return Err(ApiError::validation_error("A help message is required", None));
        }

        let mut requests = task.help_requests.0.clone();
        requests.push(HelpRequest {
            id: Uuid::new_v4(),
            message: message.trim().to_string(),
            created_by: actor.id,
            created_at: Utc::now(),
            resolved: false,
            resolved_by: None,
            resolved_at: None,
        });

        self.write_help_requests(task.id, requests).await
    }

    pub async fn resolve_help_request(
        &self,
        task: &Task,
        actor: &RequestUser,
        help_request_id: Uuid,
    ) -> Result<Task, ApiError> {
        let mut requests = task.help_requests.0.clone();
        let entry = requests
            .iter_mut()
            .find(|r| r.id == help_request_id)
            .ok_or_else(|| {
                ApiError::not_found(format!("Help request {} not found", help_request_id))
            })?;

        if entry.resolved {
            return Err(ApiError::conflict("Help request is already resolved"));
        }
        entry.resolved = true;
        entry.resolved_by = Some(actor.id);
        entry.resolved_at = Some(Utc::now());

        self.write_help_requests(task.id, requests).await
    }

    /// Reassign the task, appending to the assignment history.
    pub async fn reassign(
        &self,
        task: &Task,
        actor: &RequestUser,
        assigned_to: Option<Uuid>,
    ) -> Result<Task, ApiError> {
        let now = Utc::now();
        let mut assignment_history = task.assignment_history.0.clone();
        assignment_history.push(AssignmentEntry {
            assigned_to,
            assigned_by: actor.id,
            at: now,
        });

        let task: Task = sqlx::query_as(
            r#"
            UPDATE tasks
            SET assigned_to = $2, assigned_by = $3, assignment_history = $4, updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(task.id)
        .bind(assigned_to)
        .bind(actor.id)
        .bind(Json(assignment_history))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    async fn apply_status(
        &self,
        task: &Task,
        actor_id: Uuid,
        to: TaskStatus,
        notes: Option<String>,
    ) -> Result<Task, ApiError> {
        let now = Utc::now();
        let mut history = task.status_history.0.clone();
        history.push(StatusHistoryEntry {
            status: to.as_str().to_string(),
            actor: actor_id,
            at: now,
            notes,
        });

        let completed_at = if to == TaskStatus::Completed {
            Some(now)
        } else {
            task.completed_at
        };

        let task: Task = sqlx::query_as(
            r#"
            UPDATE tasks
            SET status = $2, completed_at = $3, status_history = $4, updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(task.id)
        .bind(to.as_str())
        .bind(completed_at)
        .bind(Json(history))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    async fn write_help_requests(
        &self,
        task_id: Uuid,
        requests: Vec<HelpRequest>,
    ) -> Result<Task, ApiError> {
        let task: Task = sqlx::query_as(
            "UPDATE tasks SET help_requests = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(task_id)
        .bind(Json(requests))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(task)
    }
}
