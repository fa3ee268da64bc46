//! Node API endpoints over real HTTP: bearer auth, ingest, remove.

use crate::harness::{ApiHarness, Harness};

const TOKEN: &str = "integration-test-token";

async fn api_node(peer_names: &[&str]) -> ApiHarness {
    Harness::start("application/pdf", b"%PDF api payload", peer_names)
        .await
        .into_api(TOKEN)
        .await
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn test_missing_or_wrong_token_is_unauthorized() {
    let node = api_node(&[]).await;
    let url = format!("{}/api/v1/status", node.api_url);

    let no_auth = client().post(&url).json(&serde_json::json!({})).send().await.unwrap();
    assert_eq!(no_auth.status().as_u16(), 401);

    let wrong = client()
        .post(&url)
        .bearer_auth("not-the-token")
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status().as_u16(), 401);

    let right = client()
        .post(&url)
        .bearer_auth(&node.token)
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(right.status().as_u16(), 200);
    let body: serde_json::Value = right.json().await.unwrap();
    assert!(body.get("version").is_some());
    assert!(body.get("uptime_secs").is_some());
}

#[tokio::test]
async fn test_ingest_then_remove_through_the_api() {
    let node = api_node(&["alpha"]).await;

    let resp = client()
        .post(format!("{}/api/v1/files/ingest", node.api_url))
        .bearer_auth(&node.token)
        .json(&serde_json::json!({
            "link": format!("{}/file", node.source_url),
            "name": "report",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["stored_name"], "report.pdf");
    assert_eq!(body["kind"], "pdf");

    // The whole cycle ran before the handler answered
    assert_eq!(node.uploads.lock().unwrap().len(), 1);
    assert_eq!(node.notifications.lock().unwrap().len(), 2);

    let removed = client()
        .post(format!("{}/api/v1/files/remove", node.api_url))
        .bearer_auth(&node.token)
        .json(&serde_json::json!({ "stored_name": "report.pdf" }))
        .send()
        .await
        .unwrap();
    assert_eq!(removed.status().as_u16(), 200);

    // Gone now
    let again = client()
        .post(format!("{}/api/v1/files/remove", node.api_url))
        .bearer_auth(&node.token)
        .json(&serde_json::json!({ "stored_name": "report.pdf" }))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 404);
}

#[tokio::test]
async fn test_failed_ingest_is_bad_gateway() {
    let node = api_node(&[]).await;

    let resp = client()
        .post(format!("{}/api/v1/files/ingest", node.api_url))
        .bearer_auth(&node.token)
        .json(&serde_json::json!({
            "link": format!("{}/gone", node.source_url),
            "name": "missing",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 502);
    assert!(node.notifications.lock().unwrap().is_empty());
}
