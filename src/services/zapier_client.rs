use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::config;

#[derive(Debug, Error)]
pub enum ZapierError {
    #[error("Zapier catch-hook URL is not configured")]
    NotConfigured,

    #[error("Webhook request failed: {0}")]
    Request(String),

    #[error("Webhook returned status {0}")]
    Status(u16),
}

/// Flattened key-value payload for the Zapier catch-hook. Zapier maps
/// these human-readable keys directly into Ignition fields.
pub fn flatten_payload(request_id: Uuid, payload: &Value) -> BTreeMap<String, String> {
    let mut flat = BTreeMap::new();

    let field = |key: &str| -> String {
        payload
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    flat.insert("Client Name".to_string(), field("client_name"));
    flat.insert("Contact Email".to_string(), field("email"));
    flat.insert("Company Name".to_string(), field("company_name"));
    flat.insert("Phone".to_string(), field("phone"));
    flat.insert("Recommended Plan".to_string(), field("recommended_plan"));
    flat.insert("requestId".to_string(), request_id.to_string());
    flat
}

/// POST the flattened payload to the configured catch-hook with the
/// fixed outbound timeout. A non-2xx response is a dispatch failure.
pub async fn dispatch_catch_hook(request_id: Uuid, payload: &Value) -> Result<(), ZapierError> {
    let cfg = &config::config().integrations;
    let url = cfg
        .zapier_hook_url
        .as_deref()
        .ok_or(ZapierError::NotConfigured)?;

    let body = flatten_payload(request_id, payload);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.outbound_timeout_secs))
        .build()
        .map_err(|e| ZapierError::Request(e.to_string()))?;

    let response = client
        .post(url)
        .json(&body)
        .send()
        .await
        .map_err(|e| ZapierError::Request(e.to_string()))?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(ZapierError::Status(response.status().as_u16()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_known_fields_and_carries_request_id() {
        let request_id = Uuid::new_v4();
        let payload = json!({
            "client_name": "Jordan Accountant",
            "email": "jordan@example.com",
            "recommended_plan": "essential"
        });

        let flat = flatten_payload(request_id, &payload);
        assert_eq!(flat["Client Name"], "Jordan Accountant");
        assert_eq!(flat["Contact Email"], "jordan@example.com");
        assert_eq!(flat["Recommended Plan"], "essential");
        assert_eq!(flat["requestId"], request_id.to_string());
        // Missing fields flatten to empty strings rather than being dropped.
        assert_eq!(flat["Phone"], "");
    }
}
