use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }

    pub fn parse(value: &str) -> Option<TaskPriority> {
        match value {
            "low" => Some(TaskPriority::Low),
            "medium" => Some(TaskPriority::Medium),
            "high" => Some(TaskPriority::High),
            "urgent" => Some(TaskPriority::Urgent),
            _ => None,
        }
    }
}

/// Document metadata attached to a task. Upload plumbing lives outside
/// this service; only the reference is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDocument {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub uploaded_by: Uuid,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpRequest {
    pub id: Uuid,
    pub message: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Append-only audit entry. The status history is authoritative and is
/// never edited or pruned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: String,
    pub actor: Uuid,
    pub at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentEntry {
    pub assigned_to: Option<Uuid>,
    pub assigned_by: Uuid,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub task_type: String,
    pub status: String,
    pub priority: String,
    pub assigned_to: Option<Uuid>,
    pub assigned_by: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
    pub review_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub documents: Json<Vec<TaskDocument>>,
    pub help_requests: Json<Vec<HelpRequest>>,
    pub status_history: Json<Vec<StatusHistoryEntry>>,
    pub assignment_history: Json<Vec<AssignmentEntry>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn status(&self) -> Option<crate::domain::TaskStatus> {
        crate::domain::TaskStatus::parse(&self.status)
    }
}
