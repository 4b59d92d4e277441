use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Questionnaire lifecycle. Advancement is monotonic; a status never
/// regresses once reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionnaireStatus {
    Pending,
    ProposalSent,
    Signed,
    Onboarded,
}

impl QuestionnaireStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionnaireStatus::Pending => "pending",
            QuestionnaireStatus::ProposalSent => "proposal_sent",
            QuestionnaireStatus::Signed => "signed",
            QuestionnaireStatus::Onboarded => "onboarded",
        }
    }

    pub fn parse(value: &str) -> Option<QuestionnaireStatus> {
        match value {
            "pending" => Some(QuestionnaireStatus::Pending),
            "proposal_sent" => Some(QuestionnaireStatus::ProposalSent),
            "signed" => Some(QuestionnaireStatus::Signed),
            "onboarded" => Some(QuestionnaireStatus::Onboarded),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuestionnaireResponse {
    pub id: Uuid,
    pub email: String,
    pub answers: serde_json::Value,
    pub recommended_plan: String,
    pub status: String,
    pub metadata: serde_json::Value,
    pub user_id: Option<Uuid>,
    /// TTL anchor, reset to now + 15 minutes on every resubmission.
    /// No automatic deletion is assumed; expired rows are simply
    /// replaceable by the next submission.
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QuestionnaireResponse {
    pub fn status(&self) -> Option<QuestionnaireStatus> {
        QuestionnaireStatus::parse(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_ordering_is_monotonic() {
        use QuestionnaireStatus::*;
        assert!(Pending < ProposalSent);
        assert!(ProposalSent < Signed);
        assert!(Signed < Onboarded);
    }

    #[test]
    fn status_strings_round_trip() {
        use QuestionnaireStatus::*;
        for status in [Pending, ProposalSent, Signed, Onboarded] {
            assert_eq!(QuestionnaireStatus::parse(status.as_str()), Some(status));
        }
    }
}
