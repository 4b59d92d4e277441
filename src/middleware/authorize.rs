use sqlx::PgPool;

use super::validate_user::RequestUser;
use crate::database::models::Task;
use crate::domain::Role;
use crate::error::ApiError;

/// Resources the authorization layer knows about.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Task(&'a Task),
    Message,
    Document(&'a Task),
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

/// Single dispatch point routing (resource, action) pairs to
/// resource-specific checkers. Handlers call this before touching state.
pub async fn authorize(
    user: &RequestUser,
    resource: Resource<'_>,
    action: Action,
    pool: &PgPool,
) -> Result<(), ApiError> {
    match resource {
        Resource::Task(task) => check_task(user, task, action, pool).await,
        Resource::Document(task) => check_task(user, task, action, pool).await,
        // Message permissions are not modeled yet; any authenticated
        // user passes.
        Resource::Message => Ok(()),
        Resource::Settings => check_settings(user),
    }
}

/// Task ownership/assignment rules. Admin sees everything; staff must be
/// assigned the task directly or assigned to its client; clients only
/// their own tasks.
async fn check_task(
    user: &RequestUser,
    task: &Task,
    action: Action,
    pool: &PgPool,
) -> Result<(), ApiError> {
    match user.role {
        Role::Admin => Ok(()),
        Role::Staff => {
            if task.assigned_to == Some(user.id) || task.staff_id == Some(user.id) {
                return Ok(());
            }
            if let Some(client_id) = task.client_id {
                if is_staff_assigned(pool, user.id, client_id).await? {
                    return Ok(());
                }
            }
            tracing::warn!(
                "Staff {} denied {:?} on task {} (not assigned)",
                user.id,
                action,
                task.id
            );
            Err(ApiError::forbidden(
                "Task does not belong to one of your assigned clients",
            ))
        }
        Role::Client => {
            if task.client_id == Some(user.id) || task.assigned_to == Some(user.id) {
                // Clients never delete tasks.
                if action == Action::Delete {
                    return Err(ApiError::forbidden("Clients may not delete tasks"));
                }
                Ok(())
            } else {
                tracing::warn!(
                    "Client {} denied {:?} on task {} (not theirs)",
                    user.id,
                    action,
                    task.id
                );
                Err(ApiError::forbidden("Task is not assigned to you"))
            }
        }
    }
}

fn check_settings(user: &RequestUser) -> Result<(), ApiError> {
    match user.role {
        Role::Admin => Ok(()),
        Role::Staff | Role::Client => {
            Err(ApiError::forbidden("Settings require an admin account"))
        }
    }
}

/// Does a staff↔client assignment row exist for this pair?
pub async fn is_staff_assigned(
    pool: &PgPool,
    staff_id: uuid::Uuid,
    client_id: uuid::Uuid,
) -> Result<bool, ApiError> {
    let count: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM client_assignments WHERE staff_id = $1 AND client_id = $2",
    )
    .bind(staff_id)
    .bind(client_id)
    .fetch_one(pool)
    .await?;

    Ok(count.0 > 0)
}
