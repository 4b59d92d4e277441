use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZapierJobStatus {
    Pending,
    Success,
    Failed,
    Timeout,
}

impl ZapierJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZapierJobStatus::Pending => "PENDING",
            ZapierJobStatus::Success => "SUCCESS",
            ZapierJobStatus::Failed => "FAILED",
            ZapierJobStatus::Timeout => "TIMEOUT",
        }
    }

    pub fn parse(value: &str) -> Option<ZapierJobStatus> {
        match value {
            "PENDING" => Some(ZapierJobStatus::Pending),
            "SUCCESS" => Some(ZapierJobStatus::Success),
            "FAILED" => Some(ZapierJobStatus::Failed),
            "TIMEOUT" => Some(ZapierJobStatus::Timeout),
            _ => None,
        }
    }
}

/// Fields reported back by the Zapier run via callback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZapierCallbackInfo {
    pub error: Option<String>,
    pub error_step: Option<String>,
    pub client_url: Option<String>,
    pub run_id: Option<String>,
}

/// Durable record of one Ignition client-creation dispatch. Created once,
/// then updated by the status callback; the row is never rolled back on
/// webhook failure so it remains an audit/retry anchor.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ZapierJob {
    pub id: Uuid,
    pub request_id: Uuid,
    pub email: String,
    pub payload: serde_json::Value,
    pub status: String,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub dispatch_error: Option<String>,
    pub zapier: Json<ZapierCallbackInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ZapierJob {
    pub fn status(&self) -> Option<ZapierJobStatus> {
        ZapierJobStatus::parse(&self.status)
    }
}
