use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{EngagementLetter, EngagementStatus};
use crate::database::schema::is_unique_violation;
use crate::error::ApiError;

pub struct EngagementService {
    pool: PgPool,
}

impl EngagementService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a letter in PROCESSING. The partial unique index guarantees
    /// at most one non-failed letter per email; a lost race is a 409.
    pub async fn create(
        &self,
        email: &str,
        proposal_id: Option<&str>,
    ) -> Result<EngagementLetter, ApiError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(ApiError::validation_error("A valid email is required", None));
        }

        let letter: EngagementLetter = sqlx::query_as(
            r#"
            INSERT INTO engagement_letters (id, email, status, proposal_id, metadata)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(EngagementStatus::Processing.as_str())
        .bind(proposal_id)
        .bind(json!({}))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::conflict(format!(
                    "An active engagement letter already exists for {}",
                    email
                ))
            } else {
                e.into()
            }
        })?;

        Ok(letter)
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: EngagementStatus,
    ) -> Result<EngagementLetter, ApiError> {
        let letter: Option<EngagementLetter> = sqlx::query_as(
            "UPDATE engagement_letters SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        letter.ok_or_else(|| ApiError::not_found(format!("Engagement letter {} not found", id)))
    }

    pub async fn find_active_by_email(
        &self,
        email: &str,
    ) -> Result<Option<EngagementLetter>, ApiError> {
        let letter: Option<EngagementLetter> = sqlx::query_as(
            "SELECT * FROM engagement_letters WHERE lower(email) = $1 AND status <> 'FAILED'",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;
        Ok(letter)
    }
}
