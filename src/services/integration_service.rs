use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{IntegrationAccount, Provider};
use crate::domain::Role;
use crate::error::ApiError;
use crate::middleware::authorize::is_staff_assigned;
use crate::middleware::RequestUser;

pub struct IntegrationService {
    pool: PgPool,
}

pub struct ConnectRequest {
    pub provider: Provider,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub external_id: Option<String>,
}

/// Connection status without token material.
#[derive(Debug, Serialize)]
pub struct IntegrationStatus {
    pub provider: Provider,
    pub connected: bool,
    pub external_id: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub connected_at: Option<DateTime<Utc>>,
}

impl IntegrationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Admin-override resolution: admins and assigned staff may act on a
    /// client's integrations by passing that client's id; clients only on
    /// themselves.
    pub async fn resolve_target(
        &self,
        actor: &RequestUser,
        client_id: Option<Uuid>,
    ) -> Result<Uuid, ApiError> {
        match client_id {
            None => Ok(actor.id),
            Some(target) if target == actor.id => Ok(actor.id),
            Some(target) => match actor.role {
                Role::Admin => Ok(target),
                Role::Staff => {
                    if is_staff_assigned(&self.pool, actor.id, target).await? {
                        Ok(target)
                    } else {
                        Err(ApiError::forbidden(
                            "Client is not assigned to you",
                        ))
                    }
                }
                Role::Client => Err(ApiError::forbidden(
                    "Clients may only access their own integrations",
                )),
            },
        }
    }

    /// Store or replace credentials for a (user, provider) pair. Tokens
    /// are replaced wholesale; there is no refresh flow here.
    pub async fn connect(
        &self,
        user_id: Uuid,
        request: ConnectRequest,
    ) -> Result<IntegrationAccount, ApiError> {
        if request.access_token.trim().is_empty() {
            return Err(ApiError::validation_error("access_token is required", None));
        }

        let account: IntegrationAccount = sqlx::query_as(
            r#"
            INSERT INTO integration_accounts
                (id, user_id, provider, access_token, refresh_token, token_expires_at, external_id, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, provider) DO UPDATE
            SET access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                token_expires_at = EXCLUDED.token_expires_at,
                external_id = EXCLUDED.external_id,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(request.provider.as_str())
        .bind(request.access_token.trim())
        .bind(&request.refresh_token)
        .bind(request.token_expires_at)
        .bind(&request.external_id)
        .bind(json!({}))
        .fetch_one(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn status(
        &self,
        user_id: Uuid,
        provider: Provider,
    ) -> Result<IntegrationStatus, ApiError> {
        let account: Option<IntegrationAccount> = sqlx::query_as(
            "SELECT * FROM integration_accounts WHERE user_id = $1 AND provider = $2",
        )
        .bind(user_id)
        .bind(provider.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(match account {
            Some(account) => IntegrationStatus {
                provider,
                connected: true,
                external_id: account.external_id,
                token_expires_at: account.token_expires_at,
                connected_at: Some(account.connected_at),
            },
            None => IntegrationStatus {
                provider,
                connected: false,
                external_id: None,
                token_expires_at: None,
                connected_at: None,
            },
        })
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<IntegrationStatus>, ApiError> {
        let mut statuses = Vec::with_capacity(3);
        for provider in [Provider::Amazon, Provider::Shopify, Provider::Quickbooks] {
            statuses.push(self.status(user_id, provider).await?);
        }
        Ok(statuses)
    }

    pub async fn disconnect(&self, user_id: Uuid, provider: Provider) -> Result<(), ApiError> {
        let result =
            sqlx::query("DELETE FROM integration_accounts WHERE user_id = $1 AND provider = $2")
                .bind(user_id)
                .bind(provider.as_str())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found(format!(
                "No {} connection for this user",
                provider
            )));
        }
        Ok(())
    }
}
