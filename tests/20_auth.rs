mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn protected_route_requires_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/tasks", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn garbage_token_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/auth/whoami", server.base_url))
        .header("Authorization", "Bearer not-a-jwt")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn signup_login_whoami_roundtrip() -> Result<()> {
    let server = common::ensure_server().await?;
    if !common::database_available(server).await {
        eprintln!("skipping: no database configured");
        return Ok(());
    }

    let client = reqwest::Client::new();
    let email = format!("smoke-{}@example.com", uuid_like());
    let password = "correct horse battery";

    let res = client
        .post(format!("{}/auth/signup", server.base_url))
        .json(&json!({
            "email": email,
            "password": password,
            "full_name": "Smoke Test"
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

    let res = client
        .get(format!("{}/api/auth/whoami", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["email"], email);
    Ok(())
}

#[tokio::test]
async fn login_with_wrong_password_fails() -> Result<()> {
    let server = common::ensure_server().await?;
    if !common::database_available(server).await {
        eprintln!("skipping: no database configured");
        return Ok(());
    }

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "email": "nobody@example.com", "password": "wrong" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

fn uuid_like() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{nanos:x}")
}
