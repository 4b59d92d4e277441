use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Staff-to-client assignment. The (staff_id, client_id) pair is unique.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientAssignment {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub client_id: Uuid,
    pub assigned_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
