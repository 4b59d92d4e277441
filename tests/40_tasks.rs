mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn approve_lands_completed_with_review_metadata() -> Result<()> {
    let server = common::ensure_server().await?;
    let Some(token) = common::admin_token(server).await? else {
        eprintln!("skipping: no database configured");
        return Ok(());
    };

    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/tasks", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "title": "January bank reconciliation",
            "task_type": "BOOKKEEPING"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED, "task creation failed");
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["status"], "NOT_STARTED");
    let task_id = body["data"]["id"]
        .as_str()
        .expect("created task has an id")
        .to_string();

    // Approval is an admin override: it completes the task from any
    // non-terminal status, not just PENDING_REVIEW.
    let res = client
        .post(format!("{}/api/tasks/{}/approve", server.base_url, task_id))
        .bearer_auth(&token)
        .json(&json!({ "review_notes": "Looks good" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK, "approve failed");
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["status"], "COMPLETED");
    assert!(
        body["data"]["completed_at"].is_string(),
        "approval stamps completed_at"
    );
    assert!(
        body["data"]["reviewed_by"].is_string(),
        "approval records the reviewer"
    );
    Ok(())
}

#[tokio::test]
async fn reject_requires_a_reason() -> Result<()> {
    let server = common::ensure_server().await?;
    let Some(token) = common::admin_token(server).await? else {
        eprintln!("skipping: no database configured");
        return Ok(());
    };

    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/tasks", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Quarterly VAT return",
            "task_type": "TAX"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<serde_json::Value>().await?;
    let task_id = body["data"]["id"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{}/api/tasks/{}/reject", server.base_url, task_id))
        .bearer_auth(&token)
        .json(&json!({ "reason": "" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
