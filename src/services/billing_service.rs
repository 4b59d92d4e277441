use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config;
use crate::database::models::User;
use crate::error::ApiError;

/// Thin Stripe wrapper. Calls the v1 REST API directly with form-encoded
/// bodies; upstream failures surface as 502 with the detail logged, not
/// leaked to the client.
pub struct BillingService {
    pool: PgPool,
}

impl BillingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn api_key() -> Result<String, ApiError> {
        config::config()
            .integrations
            .stripe_secret_key
            .clone()
            .ok_or_else(|| ApiError::service_unavailable("Stripe is not configured"))
    }

    fn http_client() -> Result<reqwest::Client, ApiError> {
        let timeout = config::config().integrations.outbound_timeout_secs;
        reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                ApiError::internal_server_error("Failed to initialize billing client")
            })
    }

    async fn stripe_post(path: &str, form: &[(&str, String)]) -> Result<Value, ApiError> {
        let key = Self::api_key()?;
        let response = Self::http_client()?
            .post(format!("https://api.stripe.com/v1/{}", path))
            .basic_auth(&key, Option::<&str>::None)
            .form(form)
            .send()
            .await?;

        Self::read_stripe_response(response, path).await
    }

    async fn stripe_get(path: &str) -> Result<Value, ApiError> {
        let key = Self::api_key()?;
        let response = Self::http_client()?
            .get(format!("https://api.stripe.com/v1/{}", path))
            .basic_auth(&key, Option::<&str>::None)
            .send()
            .await?;

        Self::read_stripe_response(response, path).await
    }

    async fn stripe_delete(path: &str) -> Result<Value, ApiError> {
        let key = Self::api_key()?;
        let response = Self::http_client()?
            .delete(format!("https://api.stripe.com/v1/{}", path))
            .basic_auth(&key, Option::<&str>::None)
            .send()
            .await?;

        Self::read_stripe_response(response, path).await
    }

    async fn read_stripe_response(
        response: reqwest::Response,
        path: &str,
    ) -> Result<Value, ApiError> {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if status.is_success() {
            Ok(body)
        } else {
            let detail = body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            tracing::error!("Stripe {} returned {}: {}", path, status, detail);
            Err(ApiError::bad_gateway("Stripe request failed"))
        }
    }

    /// Resolve or create the Stripe customer for a user, caching the id
    /// on the user row.
    pub async fn ensure_customer(&self, user: &User) -> Result<String, ApiError> {
        if let Some(customer_id) = &user.stripe_customer_id {
            return Ok(customer_id.clone());
        }

        let body = Self::stripe_post(
            "customers",
            &[
                ("email", user.email.clone()),
                ("name", user.full_name.clone()),
            ],
        )
        .await?;

        let customer_id = body
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::bad_gateway("Stripe returned no customer id"))?
            .to_string();

        sqlx::query("UPDATE users SET stripe_customer_id = $2, updated_at = $3 WHERE id = $1")
            .bind(user.id)
            .bind(&customer_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(customer_id)
    }

    pub async fn create_subscription(
        &self,
        user: &User,
        price_id: &str,
    ) -> Result<Value, ApiError> {
        if price_id.trim().is_empty() {
            return Err(ApiError::validation_error("price_id is required", None));
        }
        let customer_id = self.ensure_customer(user).await?;

        Self::stripe_post(
            "subscriptions",
            &[
                ("customer", customer_id),
                ("items[0][price]", price_id.to_string()),
            ],
        )
        .await
    }

    pub async fn get_subscription(&self, subscription_id: &str) -> Result<Value, ApiError> {
        Self::stripe_get(&format!("subscriptions/{}", subscription_id)).await
    }

    pub async fn cancel_subscription(&self, subscription_id: &str) -> Result<Value, ApiError> {
        Self::stripe_delete(&format!("subscriptions/{}", subscription_id)).await
    }

    pub async fn list_invoices(&self, user: &User) -> Result<Value, ApiError> {
        let customer_id = user
            .stripe_customer_id
            .clone()
            .ok_or_else(|| ApiError::not_found("No billing account for this user"))?;

        Self::stripe_get(&format!("invoices?customer={}&limit=25", customer_id)).await
    }

    pub async fn load_user(&self, user_id: Uuid) -> Result<User, ApiError> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        user.ok_or_else(|| ApiError::not_found(format!("User {} not found", user_id)))
    }
}
