use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Amazon,
    Shopify,
    Quickbooks,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Amazon => "amazon",
            Provider::Shopify => "shopify",
            Provider::Quickbooks => "quickbooks",
        }
    }

    pub fn parse(value: &str) -> Option<Provider> {
        match value {
            "amazon" => Some(Provider::Amazon),
            "shopify" => Some(Provider::Shopify),
            "quickbooks" => Some(Provider::Quickbooks),
            _ => None,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored third-party credentials for one (user, provider) pair. Tokens
/// are replaced wholesale on reconnect; refresh flows live outside this
/// service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IntegrationAccount {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    /// Seller id (Amazon), shop domain (Shopify) or realm id (QuickBooks).
    pub external_id: Option<String>,
    pub metadata: serde_json::Value,
    pub connected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
