//! HTTP-level tests for welli-access-server

use common::{TestServer, now, patient, requester};
use reqwest::Client;
use serde_json::{Value, json};
use welli_access::Identity;

mod common;

const SCOPE: &str = "read:fhir:lab";

async fn post(client: &Client, url: &str, caller: Option<Identity>, body: Value) -> (u16, Value) {
    let mut request = client.post(url).json(&body);
    if let Some(caller) = caller {
        request = request.header("X-Caller", caller.to_hex());
    }
    let response = request.send().await.expect("Failed to send request");
    let status = response.status().as_u16();
    let body: Value = response.json().await.expect("Failed to parse JSON");
    (status, body)
}

async fn get(client: &Client, url: String) -> (u16, Value) {
    let response = client.get(url).send().await.expect("Failed to send request");
    let status = response.status().as_u16();
    let body: Value = response.json().await.expect("Failed to parse JSON");
    (status, body)
}

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await;
    let client = Client::new();

    let (status, body) = get(&client, format!("{}/health", server.url)).await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_grant_revoke_over_http() {
    let server = TestServer::start().await;
    let client = Client::new();
    let expiry = now() + 3600;

    let (status, body) = post(
        &client,
        &format!("{}/grantAccess", server.url),
        Some(patient()),
        json!({ "requester": requester().to_hex(), "cid": "cidA", "scope": SCOPE, "expiry": expiry }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);

    let has_access_url = format!(
        "{}/hasAccess/{}/{}/cidA",
        server.url,
        patient().to_hex(),
        requester().to_hex()
    );
    let (status, body) = get(&client, has_access_url.clone()).await;
    assert_eq!(status, 200);
    assert_eq!(body["hasAccess"], true);

    let (_, body) = get(
        &client,
        format!(
            "{}/getPermission/{}/{}/cidA",
            server.url,
            patient().to_hex(),
            requester().to_hex()
        ),
    )
    .await;
    assert_eq!(body["patient"], patient().to_hex());
    assert_eq!(body["scope"], SCOPE);
    assert_eq!(body["expiry"], expiry.to_string());
    assert_eq!(body["active"], true);

    let revoke_url = format!("{}/revokeAccess", server.url);
    let revoke_body = json!({ "requester": requester().to_hex(), "cid": "cidA" });

    let (status, _) = post(&client, &revoke_url, Some(patient()), revoke_body.clone()).await;
    assert_eq!(status, 200);

    let (_, body) = get(&client, has_access_url).await;
    assert_eq!(body["hasAccess"], false);

    let (status, body) = post(&client, &revoke_url, Some(patient()), revoke_body).await;
    assert_eq!(status, 409);
    assert_eq!(body["code"], "PermissionNotActive");

    let (_, body) = get(&client, format!("{}/events", server.url)).await;
    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["event"], "AccessGranted");
    assert_eq!(events[1]["event"], "AccessRevoked");
}

#[tokio::test]
async fn test_policy_errors_map_to_status() {
    let server = TestServer::start().await;
    let client = Client::new();
    let url = format!("{}/grantAccess", server.url);

    let (status, body) = post(
        &client,
        &url,
        Some(patient()),
        json!({ "requester": "0xnotanaddress", "cid": "", "scope": SCOPE, "expiry": now() + 60 }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "InvalidRequester");

    let (status, body) = post(
        &client,
        &format!("{}/grantBatchAccess", server.url),
        Some(patient()),
        json!({ "requester": "bogus", "cids": ["cidA"], "scope": SCOPE, "expiry": now() + 60 }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "InvalidRequester");

    let (status, body) = post(
        &client,
        &url,
        Some(patient()),
        json!({ "requester": requester().to_hex(), "cid": "", "scope": SCOPE, "expiry": now() + 60 }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "MissingCid");

    let (status, body) = post(
        &client,
        &url,
        Some(patient()),
        json!({ "requester": requester().to_hex(), "cid": "cidA", "scope": SCOPE, "expiry": (now() - 1).to_string() }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "ExpiryNotInFuture");

    let (status, body) = post(
        &client,
        &url,
        Some(patient()),
        json!({ "requester": requester().to_hex(), "cid": "unregistered", "scope": SCOPE, "expiry": now() + 60 }),
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(body["code"], "CallerNotResourceOwner");

    server.state.identities.revoke(&patient()).unwrap();
    let (status, body) = post(
        &client,
        &url,
        Some(patient()),
        json!({ "requester": requester().to_hex(), "cid": "cidA", "scope": SCOPE, "expiry": now() + 60 }),
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(body["code"], "OwnerNotRegisteredOrRevoked");
}

#[tokio::test]
async fn test_missing_caller_is_unauthorized() {
    let server = TestServer::start().await;
    let client = Client::new();

    let (status, body) = post(
        &client,
        &format!("{}/grantAccess", server.url),
        None,
        json!({ "requester": requester().to_hex(), "cid": "cidA", "scope": SCOPE, "expiry": now() + 60 }),
    )
    .await;

    assert_eq!(status, 401);
    assert_eq!(body["code"], "Unauthorized");
}

#[tokio::test]
async fn test_batch_routes() {
    let server = TestServer::start().await;
    let client = Client::new();

    let (status, body) = post(
        &client,
        &format!("{}/grantBatchAccess", server.url),
        Some(patient()),
        json!({ "requester": requester().to_hex(), "cids": [], "scope": SCOPE, "expiry": now() + 60 }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "EmptyCidList");

    // One foreign cid: nothing is granted
    let (status, body) = post(
        &client,
        &format!("{}/grantBatchAccess", server.url),
        Some(patient()),
        json!({ "requester": requester().to_hex(), "cids": ["cidA", "other"], "scope": SCOPE, "expiry": now() + 60 }),
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(body["code"], "CallerNotResourceOwner");

    let (_, body) = get(
        &client,
        format!("{}/permissions/{}", server.url, patient().to_hex()),
    )
    .await;
    assert!(body["permissions"].as_array().unwrap().is_empty());

    let (status, body) = post(
        &client,
        &format!("{}/grantBatchAccess", server.url),
        Some(patient()),
        json!({ "requester": requester().to_hex(), "cids": ["cidA", "cidB"], "scope": SCOPE, "expiry": now() + 60 }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["cids"], json!(["cidA", "cidB"]));

    let (_, body) = get(
        &client,
        format!("{}/shared/{}", server.url, requester().to_hex()),
    )
    .await;
    assert_eq!(body["permissions"].as_array().unwrap().len(), 2);

    let (status, _) = post(
        &client,
        &format!("{}/revokeBatchAccess", server.url),
        Some(patient()),
        json!({ "requester": requester().to_hex(), "cids": ["cidA", "cidB"] }),
    )
    .await;
    assert_eq!(status, 200);

    let (_, body) = get(&client, format!("{}/events", server.url)).await;
    assert_eq!(body["events"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_get_permission_not_found_sentinel() {
    let server = TestServer::start().await;
    let client = Client::new();

    let (status, body) = get(
        &client,
        format!(
            "{}/getPermission/{}/{}/nonexistent",
            server.url,
            patient().to_hex(),
            requester().to_hex()
        ),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["patient"], Identity::ZERO.to_hex());
    assert_eq!(body["active"], false);
    assert_eq!(body["expiry"], "0");

    let (status, body) = get(
        &client,
        format!("{}/hasAccess/not-an-identity/{}/cidA", server.url, requester().to_hex()),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "InvalidIdentity");
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_sqlite_backend() {
    let temp = tempfile::TempDir::new().unwrap();
    let storage = welli_access_server::config::StorageConfig {
        backend: "sqlite".into(),
        sqlite_path: Some(temp.path().join("permissions.db").display().to_string()),
    };
    let server = TestServer::start_with(storage).await;
    let client = Client::new();

    let (status, _) = post(
        &client,
        &format!("{}/grantAccess", server.url),
        Some(patient()),
        json!({ "requester": requester().to_hex(), "cid": "cidB", "scope": SCOPE, "expiry": now() + 60 }),
    )
    .await;
    assert_eq!(status, 200);

    let (_, body) = get(
        &client,
        format!(
            "{}/hasAccess/{}/{}/cidB",
            server.url,
            patient().to_hex(),
            requester().to_hex()
        ),
    )
    .await;
    assert_eq!(body["hasAccess"], true);
}
