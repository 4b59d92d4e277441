use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Reusable task blueprint. usage_count increments on each instantiation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskTemplate {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub task_type: String,
    pub priority: String,
    pub checklist: Json<Vec<String>>,
    pub usage_count: i64,
    pub active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
