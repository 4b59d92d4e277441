mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn clients_cannot_read_subscriptions() -> Result<()> {
    let server = common::ensure_server().await?;
    if !common::database_available(server).await {
        eprintln!("skipping: no database configured");
        return Ok(());
    }

    let client = reqwest::Client::new();
    let email = format!("billing-{}@example.com", common::nonce());
    let password = "client test password";

    let res = client
        .post(format!("{}/auth/signup", server.base_url))
        .json(&json!({
            "email": email,
            "password": password,
            "full_name": "Billing Client"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED, "signup failed");

    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK, "login failed");
    let body = res.json::<serde_json::Value>().await?;
    let token = body["data"]["token"]
        .as_str()
        .expect("login response carries a token")
        .to_string();

    // Subscription reads are back-office only; a client token is turned
    // away before any Stripe call happens.
    let res = client
        .get(format!(
            "{}/api/billing/subscriptions/sub_000000000000",
            server.base_url
        ))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "FORBIDDEN");
    Ok(())
}
