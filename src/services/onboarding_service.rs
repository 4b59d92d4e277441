use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config;
use crate::database::models::{
    EngagementLetter, QuestionnaireResponse, QuestionnaireStatus, ZapierCallbackInfo, ZapierJob,
    ZapierJobStatus,
};
use crate::database::schema::is_unique_violation;
use crate::domain::{recommend_plan, Role};
use crate::error::ApiError;
use crate::jobs;
use crate::services::email::WelcomeEmailJob;
use crate::services::user_service::{NewUser, UserService};
use crate::services::zapier_client;

pub struct OnboardingService {
    pool: PgPool,
}

/// Outcome of an Ignition client-creation dispatch. The job row always
/// persists; `dispatched` only reports whether the webhook call landed.
#[derive(Debug, Serialize)]
pub struct DispatchOutcome {
    pub job: ZapierJob,
    pub dispatched: bool,
    pub dispatch_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OnboardOutcome {
    #[serde(rename = "alreadyOnboarded")]
    pub already_onboarded: bool,
    pub user_id: Option<Uuid>,
}

/// Zapier job-status callback body.
#[derive(Debug, Deserialize)]
pub struct ZapierStatusPayload {
    #[serde(alias = "requestId")]
    pub request_id: Uuid,
    pub status: String,
    pub error: Option<String>,
    #[serde(rename = "errorStep")]
    pub error_step: Option<String>,
    #[serde(rename = "client_URL")]
    pub client_url: Option<String>,
    #[serde(alias = "runId")]
    pub run_id: Option<String>,
}

/// Ignition proposal-status callback body.
#[derive(Debug, Deserialize)]
pub struct ProposalStatusPayload {
    pub email: String,
    pub proposal_status: Option<String>,
    pub payment_status: Option<String>,
    pub proposal_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl OnboardingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert the questionnaire for an email, recompute the recommended
    /// plan, and reset the TTL anchor. Resubmission is blocked once an
    /// engagement letter has gone out or the client is onboarded.
    pub async fn submit_questionnaire(
        &self,
        email: &str,
        answers: Value,
        metadata: Option<Value>,
    ) -> Result<QuestionnaireResponse, ApiError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(ApiError::validation_error("A valid email is required", None));
        }

        let letter: Option<EngagementLetter> = sqlx::query_as(
            "SELECT * FROM engagement_letters WHERE lower(email) = $1 AND status <> 'FAILED'",
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(letter) = letter {
            if letter.status().map(|s| s.blocks_resubmission()).unwrap_or(false) {
                return Err(ApiError::conflict(
                    "An engagement letter is already out for this email",
                ));
            }
        }

        let existing: Option<QuestionnaireResponse> =
            sqlx::query_as("SELECT * FROM questionnaire_responses WHERE lower(email) = $1")
                .bind(&email)
                .fetch_optional(&self.pool)
                .await?;
        if let Some(existing) = &existing {
            if existing.status() == Some(QuestionnaireStatus::Onboarded) {
                return Err(ApiError::conflict("This client is already onboarded"));
            }
        }

        let plan = recommend_plan(&answers);
        let ttl_minutes = config::config().integrations.questionnaire_ttl_minutes;
        let expires_at = Utc::now() + Duration::minutes(ttl_minutes);
        let metadata = metadata.unwrap_or_else(|| json!({}));

        let response: QuestionnaireResponse = match existing {
            Some(existing) => {
                sqlx::query_as(
                    r#"
                    UPDATE questionnaire_responses
                    SET answers = $2, recommended_plan = $3, metadata = $4,
                        expires_at = $5, updated_at = $6
                    WHERE id = $1
                    RETURNING *
                    "#,
                )
                .bind(existing.id)
                .bind(&answers)
                .bind(plan.as_str())
                .bind(&metadata)
                .bind(expires_at)
                .bind(Utc::now())
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    INSERT INTO questionnaire_responses
                        (id, email, answers, recommended_plan, status, metadata, expires_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    RETURNING *
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(&email)
                .bind(&answers)
                .bind(plan.as_str())
                .bind(QuestionnaireStatus::Pending.as_str())
                .bind(&metadata)
                .bind(expires_at)
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(response)
    }

    pub async fn get_questionnaire(
        &self,
        email: &str,
    ) -> Result<QuestionnaireResponse, ApiError> {
        let response: Option<QuestionnaireResponse> =
            sqlx::query_as("SELECT * FROM questionnaire_responses WHERE lower(email) = $1")
                .bind(email.trim().to_lowercase())
                .fetch_optional(&self.pool)
                .await?;
        response.ok_or_else(|| ApiError::not_found(format!("No questionnaire for {}", email)))
    }

    /// At-most-one-in-flight job per email: reject while a job is PENDING
    /// or SUCCESS. The pre-check gives a clean message; concurrent racers
    /// are decided by the partial unique index on the insert. The job row
    /// is written before the webhook call and is never rolled back; a
    /// dispatch failure is reported informationally and the enclosing
    /// request still succeeds.
    pub async fn create_client_in_ignition(&self, email: &str) -> Result<DispatchOutcome, ApiError> {
        let email = email.trim().to_lowercase();
        let questionnaire = self.get_questionnaire(&email).await?;

        let in_flight: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM zapier_jobs WHERE lower(email) = $1 AND status IN ('PENDING', 'SUCCESS') LIMIT 1",
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?;
        if in_flight.is_some() {
            return Err(ApiError::conflict(
                "A client-creation job already exists for this email",
            ));
        }

        let request_id = Uuid::new_v4();
        let payload = json!({
            "email": email,
            "client_name": questionnaire
                .metadata
                .get("client_name")
                .and_then(Value::as_str)
                .unwrap_or(&email),
            "company_name": questionnaire
                .metadata
                .get("company_name")
                .and_then(Value::as_str)
                .unwrap_or_default(),
            "phone": questionnaire
                .metadata
                .get("phone")
                .and_then(Value::as_str)
                .unwrap_or_default(),
            "recommended_plan": questionnaire.recommended_plan,
        });

        let job: ZapierJob = sqlx::query_as(
            r#"
            INSERT INTO zapier_jobs (id, request_id, email, payload, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request_id)
        .bind(&email)
        .bind(&payload)
        .bind(ZapierJobStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::conflict("A client-creation job already exists for this email")
            } else {
                e.into()
            }
        })?;

        let (dispatched, dispatch_error) =
            match zapier_client::dispatch_catch_hook(request_id, &payload).await {
                Ok(()) => (true, None),
                Err(e) => {
                    tracing::warn!("Zapier dispatch failed for {}: {}", email, e);
                    (false, Some(e.to_string()))
                }
            };

        let job: ZapierJob = sqlx::query_as(
            r#"
            UPDATE zapier_jobs
            SET dispatched_at = $2, dispatch_error = $3, updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(job.id)
        .bind(dispatched.then(Utc::now))
        .bind(&dispatch_error)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(DispatchOutcome {
            job,
            dispatched,
            dispatch_error,
        })
    }

    /// Update the job by request id, last writer wins. Duplicate or
    /// out-of-order callbacks overwrite earlier state.
    pub async fn zapier_status_callback(
        &self,
        payload: ZapierStatusPayload,
    ) -> Result<ZapierJob, ApiError> {
        let status = ZapierJobStatus::parse(&payload.status).ok_or_else(|| {
            ApiError::validation_error(format!("Unknown job status: {}", payload.status), None)
        })?;

        let callback_info = ZapierCallbackInfo {
            error: payload.error,
            error_step: payload.error_step,
            client_url: payload.client_url,
            run_id: payload.run_id,
        };

        let job: Option<ZapierJob> = sqlx::query_as(
            r#"
            UPDATE zapier_jobs
            SET status = $2, zapier = $3, updated_at = $4
            WHERE request_id = $1
            RETURNING *
            "#,
        )
        .bind(payload.request_id)
        .bind(status.as_str())
        .bind(Json(callback_info))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        job.ok_or_else(|| {
            ApiError::not_found(format!("No job for request id {}", payload.request_id))
        })
    }

    /// Reconcile an Ignition proposal/payment callback into the
    /// questionnaire. Status only ever advances; a confirmed payment
    /// triggers onboarding.
    pub async fn ignition_proposal_status_callback(
        &self,
        payload: ProposalStatusPayload,
    ) -> Result<(QuestionnaireResponse, Option<OnboardOutcome>), ApiError> {
        let questionnaire = self.get_questionnaire(&payload.email).await?;
        let current = questionnaire
            .status()
            .unwrap_or(QuestionnaireStatus::Pending);

        let reported = match payload.proposal_status.as_deref() {
            Some("sent") | Some("proposal_sent") => Some(QuestionnaireStatus::ProposalSent),
            Some("signed") | Some("accepted") => Some(QuestionnaireStatus::Signed),
            _ => None,
        };

        // Monotonic: never regress a status already reached.
        let next = match reported {
            Some(reported) if reported > current => reported,
            _ => current,
        };

        let mut metadata = questionnaire.metadata.clone();
        if let Some(obj) = metadata.as_object_mut() {
            if let Some(proposal_id) = &payload.proposal_id {
                obj.insert("proposal_id".to_string(), json!(proposal_id));
            }
            if let Some(payment_status) = &payload.payment_status {
                obj.insert("payment_status".to_string(), json!(payment_status));
            }
            if let Some(paid_at) = &payload.paid_at {
                obj.insert("paid_at".to_string(), json!(paid_at));
            }
        }

        let questionnaire: QuestionnaireResponse = sqlx::query_as(
            r#"
            UPDATE questionnaire_responses
            SET status = $2, metadata = $3, updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(questionnaire.id)
        .bind(next.as_str())
        .bind(&metadata)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        let payment_confirmed = matches!(payload.payment_status.as_deref(), Some("paid"));
        let outcome = if payment_confirmed {
            Some(self.onboard_client_from_questionnaire(&payload.email).await?)
        } else {
            None
        };

        // Re-read after a possible onboarding status flip.
        let questionnaire = if outcome.is_some() {
            self.get_questionnaire(&payload.email).await?
        } else {
            questionnaire
        };

        Ok((questionnaire, outcome))
    }

    /// Find-or-create the client account and link the questionnaire.
    /// Idempotent under retries: an already-onboarded questionnaire is a
    /// no-op that reports `alreadyOnboarded`.
    pub async fn onboard_client_from_questionnaire(
        &self,
        email: &str,
    ) -> Result<OnboardOutcome, ApiError> {
        let questionnaire = self.get_questionnaire(email).await?;

        if questionnaire.status() == Some(QuestionnaireStatus::Onboarded) {
            return Ok(OnboardOutcome {
                already_onboarded: true,
                user_id: questionnaire.user_id,
            });
        }

        let users = UserService::new(self.pool.clone());
        let (user, temporary_password) = match users.find_by_email(&questionnaire.email).await? {
            Some(user) => (user, None),
            None => {
                let password = crate::auth::generate_random_password();
                let user = users
                    .create(NewUser {
                        email: questionnaire.email.clone(),
                        password: password.clone(),
                        full_name: questionnaire
                            .metadata
                            .get("client_name")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        role: Role::Client,
                    })
                    .await?;
                (user, Some(password))
            }
        };

        sqlx::query(
            r#"
            UPDATE questionnaire_responses
            SET status = $2, user_id = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(questionnaire.id)
        .bind(QuestionnaireStatus::Onboarded.as_str())
        .bind(user.id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        jobs::queue().enqueue(Arc::new(WelcomeEmailJob {
            email: user.email.clone(),
            temporary_password,
        }));

        Ok(OnboardOutcome {
            already_onboarded: false,
            user_id: Some(user.id),
        })
    }
}
