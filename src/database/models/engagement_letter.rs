use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngagementStatus {
    Processing,
    Created,
    Sent,
    CreatedNotSent,
    Failed,
    Signed,
}

impl EngagementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementStatus::Processing => "PROCESSING",
            EngagementStatus::Created => "CREATED",
            EngagementStatus::Sent => "SENT",
            EngagementStatus::CreatedNotSent => "CREATED_NOT_SENT",
            EngagementStatus::Failed => "FAILED",
            EngagementStatus::Signed => "SIGNED",
        }
    }

    pub fn parse(value: &str) -> Option<EngagementStatus> {
        match value {
            "PROCESSING" => Some(EngagementStatus::Processing),
            "CREATED" => Some(EngagementStatus::Created),
            "SENT" => Some(EngagementStatus::Sent),
            "CREATED_NOT_SENT" => Some(EngagementStatus::CreatedNotSent),
            "FAILED" => Some(EngagementStatus::Failed),
            "SIGNED" => Some(EngagementStatus::Signed),
            _ => None,
        }
    }

    /// A questionnaire for this email may not be resubmitted once the
    /// letter has gone out or been signed.
    pub fn blocks_resubmission(&self) -> bool {
        matches!(self, EngagementStatus::Sent | EngagementStatus::Signed)
    }
}

/// One active (non-FAILED) letter per email, enforced by a partial
/// unique index.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EngagementLetter {
    pub id: Uuid,
    pub email: String,
    pub status: String,
    pub proposal_id: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EngagementLetter {
    pub fn status(&self) -> Option<EngagementStatus> {
        EngagementStatus::parse(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_sent_and_signed_block_resubmission() {
        use EngagementStatus::*;
        assert!(Sent.blocks_resubmission());
        assert!(Signed.blocks_resubmission());
        for status in [Processing, Created, CreatedNotSent, Failed] {
            assert!(!status.blocks_resubmission());
        }
    }
}
