mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn questionnaire_submit_upserts_by_email() -> Result<()> {
    let server = common::ensure_server().await?;
    if !common::database_available(server).await {
        eprintln!("skipping: no database configured");
        return Ok(());
    }

    let client = reqwest::Client::new();
    let email = format!("intake-{}@example.com", nonce());

    let res = client
        .post(format!("{}/questionnaire", server.base_url))
        .json(&json!({
            "email": email,
            "answers": { "q1Revenue": "R1", "q2Support": "S1", "q3Customization": "C1" }
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["recommended_plan"], "startup");

    // Re-submitting with bigger answers replaces, never duplicates
    let res = client
        .post(format!("{}/questionnaire", server.base_url))
        .json(&json!({
            "email": email,
            "answers": { "q1Revenue": "R3", "q2Support": "S1" }
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["recommended_plan"], "enterprise");
    Ok(())
}

#[tokio::test]
async fn questionnaire_rejects_missing_email() -> Result<()> {
    let server = common::ensure_server().await?;
    if !common::database_available(server).await {
        eprintln!("skipping: no database configured");
        return Ok(());
    }

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/questionnaire", server.base_url))
        .json(&json!({ "email": "", "answers": {} }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn second_in_flight_dispatch_is_a_conflict() -> Result<()> {
    let server = common::ensure_server().await?;
    let Some(token) = common::admin_token(server).await? else {
        eprintln!("skipping: no database configured");
        return Ok(());
    };

    let client = reqwest::Client::new();
    let email = format!("dispatch-{}@example.com", nonce());

    let res = client
        .post(format!("{}/questionnaire", server.base_url))
        .json(&json!({
            "email": email,
            "answers": { "q1Revenue": "R1" }
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    // First dispatch writes the job row; the request succeeds even when
    // the outbound webhook call cannot be delivered.
    let res = client
        .post(format!("{}/api/onboarding/ignition", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "email": email }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED, "first dispatch failed");
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["job"]["status"], "PENDING");

    // A second dispatch while the first is in flight must bounce.
    let res = client
        .post(format!("{}/api/onboarding/ignition", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "email": email }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "CONFLICT");
    Ok(())
}

#[tokio::test]
async fn onboarding_twice_is_idempotent() -> Result<()> {
    let server = common::ensure_server().await?;
    let Some(token) = common::admin_token(server).await? else {
        eprintln!("skipping: no database configured");
        return Ok(());
    };

    let client = reqwest::Client::new();
    let email = format!("onboard-{}@example.com", nonce());

    let res = client
        .post(format!("{}/questionnaire", server.base_url))
        .json(&json!({
            "email": email,
            "answers": { "q1Revenue": "R2" },
            "metadata": { "client_name": "Repeat Customer" }
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(format!(
            "{}/api/onboarding/onboard/{}",
            server.base_url, email
        ))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK, "first onboard failed");
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["alreadyOnboarded"], false);
    let user_id = body["data"]["user_id"]
        .as_str()
        .expect("onboarding creates a user")
        .to_string();

    // Retrying is a no-op that reports the state instead of mutating it.
    let res = client
        .post(format!(
            "{}/api/onboarding/onboard/{}",
            server.base_url, email
        ))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK, "second onboard failed");
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["alreadyOnboarded"], true);
    assert_eq!(body["data"]["user_id"], user_id.as_str());
    Ok(())
}

#[tokio::test]
async fn webhook_callbacks_are_public_routes() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // No bearer token; the route must not bounce with 401. An unknown
    // request id is a 404 when the database is up, 5xx when it is not.
    let res = client
        .post(format!("{}/webhooks/zapier/status", server.base_url))
        .json(&json!({
            "requestId": "00000000-0000-4000-8000-000000000000",
            "status": "SUCCESS"
        }))
        .send()
        .await?;
    assert_ne!(res.status(), StatusCode::UNAUTHORIZED);
    assert_ne!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

fn nonce() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    format!(
        "{:x}",
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos()
    )
}
