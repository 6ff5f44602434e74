use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::StatusCode;
use serde_json::json;

use ridgeline_authz::{
    AuthorizationEngine, CreateGrant, GrantStore, GrantStoreError, InMemoryGrantStore,
    PermissionGrant, PresetRegistry,
};
use ridgeline_core::{GrantId, UserId};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with_store(InMemoryGrantStore::arc()).await
    }

    async fn spawn_with_store(store: Arc<dyn GrantStore>) -> Self {
        // Same router as prod, ephemeral port.
        let engine = AuthorizationEngine::new(PresetRegistry::default_presets(), store);
        let app = ridgeline_api::app::build_app(engine);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn identified(
    req: reqwest::RequestBuilder,
    user_id: UserId,
    role: &str,
) -> reqwest::RequestBuilder {
    req.header("x-user-id", user_id.to_string())
        .header("x-user-role", role)
}

async fn check(
    client: &reqwest::Client,
    base_url: &str,
    user_id: UserId,
    role: &str,
    resource: &str,
    action: &str,
) -> bool {
    let res = identified(
        client.get(format!(
            "{base_url}/access/check?resource={resource}&action={action}"
        )),
        user_id,
        role,
    )
    .send()
    .await
    .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    res.json::<serde_json::Value>().await.unwrap()["allowed"]
        .as_bool()
        .unwrap()
}

#[tokio::test]
async fn grant_lifecycle_drives_access_decisions() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let admin = UserId::new();
    let investor = UserId::new();

    // Investor preset has projects:view but not edit.
    assert!(check(&client, &server.base_url, investor, "investor", "projects", "view").await);
    assert!(!check(&client, &server.base_url, investor, "investor", "projects", "edit").await);

    // Administrator issues a one-hour edit grant.
    let res = identified(
        client.post(format!("{}/admin/grants", server.base_url)),
        admin,
        "administrator",
    )
    .json(&json!({
        "subject": investor.to_string(),
        "resource": "projects",
        "actions": ["edit"],
        "expires_at": Utc::now() + ChronoDuration::hours(1),
    }))
    .send()
    .await
    .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let grant: serde_json::Value = res.json().await.unwrap();
    let grant_id = grant["id"].as_str().unwrap().to_string();
    assert_eq!(grant["active"], json!(true));

    assert!(check(&client, &server.base_url, investor, "investor", "projects", "edit").await);

    // The grant shows up in the active listing.
    let res = identified(
        client.get(format!(
            "{}/admin/grants?user={}&active=true",
            server.base_url, investor
        )),
        admin,
        "administrator",
    )
    .send()
    .await
    .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let listed: serde_json::Value = res.json().await.unwrap();
    assert_eq!(listed["grants"].as_array().unwrap().len(), 1);

    // Revoke flips the decision back; revoking again stays a no-op 200.
    for _ in 0..2 {
        let res = identified(
            client.post(format!("{}/admin/grants/{}/revoke", server.base_url, grant_id)),
            admin,
            "administrator",
        )
        .send()
        .await
        .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
    assert!(!check(&client, &server.base_url, investor, "investor", "projects", "edit").await);

    // History listing still shows the revoked grant.
    let res = identified(
        client.get(format!("{}/admin/grants?user={}", server.base_url, investor)),
        admin,
        "administrator",
    )
    .send()
    .await
    .unwrap();
    let listed: serde_json::Value = res.json().await.unwrap();
    assert_eq!(listed["grants"].as_array().unwrap().len(), 1);
    assert_eq!(listed["grants"][0]["active"], json!(false));
}

#[tokio::test]
async fn out_of_set_resource_is_rejected_and_nothing_is_persisted() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let admin = UserId::new();
    let subject = UserId::new();

    let res = identified(
        client.post(format!("{}/admin/grants", server.base_url)),
        admin,
        "administrator",
    )
    .json(&json!({
        "subject": subject.to_string(),
        "resource": "invoices",
        "actions": ["view"],
    }))
    .send()
    .await
    .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], json!("validation_error"));

    let res = identified(
        client.get(format!("{}/admin/grants?user={}", server.base_url, subject)),
        admin,
        "administrator",
    )
    .send()
    .await
    .unwrap();
    let listed: serde_json::Value = res.json().await.unwrap();
    assert!(listed["grants"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn fail_closed_and_guard_behavior() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let client_user = UserId::new();

    // Client role: no financial entry, deny.
    assert!(!check(&client, &server.base_url, client_user, "client", "financial", "view").await);

    // Unrecognized resource string answers allowed=false, not an error.
    assert!(!check(&client, &server.base_url, client_user, "client", "invoices", "view").await);

    // Missing identity is 401 before the engine is consulted.
    let res = client
        .get(format!(
            "{}/access/check?resource=projects&action=view",
            server.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Unknown role string is 401 as well: the role set is closed.
    let res = identified(
        client.get(format!(
            "{}/access/check?resource=projects&action=view",
            server.base_url
        )),
        client_user,
        "superuser",
    )
    .send()
    .await
    .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Non-admins cannot manage grants.
    let res = identified(
        client.post(format!("{}/admin/grants", server.base_url)),
        client_user,
        "client",
    )
    .json(&json!({
        "subject": client_user.to_string(),
        "resource": "financial",
        "actions": ["view"],
    }))
    .send()
    .await
    .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Revoking an unknown grant surfaces as 404, not silent success.
    let admin = UserId::new();
    let res = identified(
        client.post(format!(
            "{}/admin/grants/{}/revoke",
            server.base_url,
            uuid::Uuid::now_v7()
        )),
        admin,
        "administrator",
    )
    .send()
    .await
    .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

/// Store double whose every operation fails, as a severed database
/// connection would.
struct FailingStore;

impl GrantStore for FailingStore {
    fn create(
        &self,
        _request: CreateGrant,
        _now: DateTime<Utc>,
    ) -> Result<PermissionGrant, GrantStoreError> {
        Err(GrantStoreError::Storage("connection reset".to_string()))
    }

    fn get(&self, _id: GrantId) -> Result<Option<PermissionGrant>, GrantStoreError> {
        Err(GrantStoreError::Storage("connection reset".to_string()))
    }

    fn revoke(&self, _id: GrantId) -> Result<(), GrantStoreError> {
        Err(GrantStoreError::Storage("connection reset".to_string()))
    }

    fn list_for_subject(&self, _subject: UserId) -> Result<Vec<PermissionGrant>, GrantStoreError> {
        Err(GrantStoreError::Storage("connection reset".to_string()))
    }

    fn deactivate_expired(&self, _now: DateTime<Utc>) -> Result<usize, GrantStoreError> {
        Err(GrantStoreError::Storage("connection reset".to_string()))
    }
}

#[tokio::test]
async fn store_failure_surfaces_as_503_undecidable_not_a_crash() {
    let server = TestServer::spawn_with_store(Arc::new(FailingStore)).await;
    let client = reqwest::Client::new();
    let user = UserId::new();

    // The handler runs the engine from an async context; a broken store must
    // come back as an explicit 503 response, never tear down the request.
    let res = identified(
        client.get(format!(
            "{}/access/check?resource=projects&action=view",
            server.base_url
        )),
        user,
        "investor",
    )
    .send()
    .await
    .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], json!("undecidable"));

    // Grant management is equally undecidable: the admin guard itself needs
    // a store read, so it reports 503 rather than a false 403.
    let res = identified(
        client.get(format!("{}/admin/grants?user={}", server.base_url, user)),
        UserId::new(),
        "administrator",
    )
    .send()
    .await
    .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}
