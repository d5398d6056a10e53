//! API integration tests for lostfound-server.
//!
//! These tests drive the full router with realistic multipart and JSON
//! requests against the in-memory store and the mock uploader, using HS256
//! tokens minted the way the credential service does.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use lostfound_core::{LedgerStore, MediaUploader, MemoryStore, MockUploader};
use lostfound_server::{create_router, AppState, Config};
use serde::Serialize;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "integration-test-secret";
const ADMIN_EMAIL: &str = "admin@example.com";
const BOUNDARY: &str = "----TestBoundary7MA4YWxkTrZu0gW";

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
const MP4: &[u8] = b"\x00\x00\x00\x18ftypmp42";

#[derive(Serialize)]
struct TestClaims {
    sub: String,
    exp: u64,
    email: Option<String>,
    name: Option<String>,
}

fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn mint_token(sub: &str, email: Option<&str>, exp: u64) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        &TestClaims {
            sub: sub.to_string(),
            exp,
            email: email.map(str::to_string),
            name: Some("Test User".to_string()),
        },
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

/// Multipart body builder
#[derive(Default)]
struct Form {
    body: Vec<u8>,
}

impl Form {
    fn text(mut self, name: &str, value: &str) -> Self {
        self.body
            .extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        self.body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body
            .extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, file_name
            )
            .as_bytes(),
        );
        self.body
            .extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        (
            format!("multipart/form-data; boundary={}", BOUNDARY),
            self.body,
        )
    }
}

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    uploader: Arc<MockUploader>,
}

/// A synced user and their bearer token
struct Caller {
    id: String,
    token: String,
}

impl TestApp {
    fn new() -> Self {
        Self::with_uploader(MockUploader::new())
    }

    fn with_uploader(uploader: MockUploader) -> Self {
        let config = Config {
            jwt_secret: SECRET.to_string(),
            admin_emails: vec![ADMIN_EMAIL.to_string()],
            ..Config::default()
        };
        let store = Arc::new(MemoryStore::new());
        let uploader = Arc::new(uploader);
        let state = AppState::new(
            store.clone() as Arc<dyn LedgerStore>,
            uploader.clone() as Arc<dyn MediaUploader>,
            &config,
        );

        Self {
            router: create_router(state, &config),
            store,
            uploader,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn send_json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn post_form(&self, uri: &str, token: &str, form: Form) -> (StatusCode, Value) {
        let (content_type, body) = form.finish();
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn sync_user(&self, email: &str) -> Caller {
        let id = Uuid::new_v4().to_string();
        let token = mint_token(&id, Some(email), now_epoch() + 3600);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/users/sync")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let (status, json) = self.send(request).await;
        assert_eq!(status, StatusCode::OK, "sync failed: {}", json);
        Caller { id, token }
    }

    async fn report_found_item(&self, finder: &Caller, title: &str) -> String {
        let (status, json) = self
            .send_json(
                Method::POST,
                "/api/items/found",
                Some(&finder.token),
                json!({ "title": title, "location": "Library", "date": "2026-10-01" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "item creation failed: {}", json);
        json["data"]["id"].as_str().unwrap().to_string()
    }

    async fn file_claim(&self, claimer: &Caller, item_type: &str, item_id: &str, proofs: usize) -> (StatusCode, Value) {
        let mut form = Form::default()
            .text("item_type", item_type)
            .text("item_id", item_id)
            .text("verification_details", "Blue strap, scratched buckle");
        for i in 0..proofs {
            form = form.file("proof_images", &format!("proof{}.jpg", i), "image/jpeg", JPEG);
        }
        self.post_form("/api/claims", &claimer.token, form).await
    }

    async fn verify(&self, token: Option<&str>, claim_id: &str, status: &str) -> (StatusCode, Value) {
        self.send_json(
            Method::PUT,
            &format!("/api/claims/{}/verify", claim_id),
            token,
            json!({ "status": status }),
        )
        .await
    }
}

fn primary_count(media: &Value) -> usize {
    media
        .as_array()
        .unwrap()
        .iter()
        .filter(|m| m["is_primary"] == true)
        .count()
}

// ============================================================================
// Health & Docs
// ============================================================================

#[tokio::test]
async fn test_health_reports_memory_storage() {
    let app = TestApp::new();
    let (status, json) = app.get("/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["storage"], "memory");
    assert_eq!(json["media_provider"], "mock");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_ready_endpoint_returns_ok() {
    let app = TestApp::new();
    let (status, json) = app.get("/ready", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ready"], true);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = TestApp::new();
    let (status, json) = app.get("/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/api/claims/{claim_id}/verify"].is_object());
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_sync_assigns_admin_role_from_config() {
    let app = TestApp::new();
    let admin = app.sync_user("Admin@Example.com").await;
    let user = app.sync_user("someone@example.com").await;

    let (status, json) = app.get("/api/users/me", Some(&admin.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["role"], "admin");
    assert_eq!(json["data"]["email"], "admin@example.com");

    let (_, json) = app.get("/api/users/me", Some(&user.token)).await;
    assert_eq!(json["data"]["role"], "user");
    assert_eq!(json["data"]["id"], user.id.as_str());
}

#[tokio::test]
async fn test_sync_body_email_cannot_claim_admin_role() {
    let app = TestApp::new();

    // Token for one account, body naming the administrator
    let token = mint_token(
        &Uuid::new_v4().to_string(),
        Some("mallory@example.com"),
        now_epoch() + 3600,
    );
    let (status, json) = app
        .send_json(
            Method::POST,
            "/api/users/sync",
            Some(&token),
            json!({ "email": ADMIN_EMAIL }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Email does not match the signed-in account");

    let (status, _) = app.get("/api/claims/admin", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Token without an email claim: the body email is stored, the role is not granted
    let token = mint_token(&Uuid::new_v4().to_string(), None, now_epoch() + 3600);
    let (status, json) = app
        .send_json(
            Method::POST,
            "/api/users/sync",
            Some(&token),
            json!({ "email": ADMIN_EMAIL }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["data"]["user"]["role"], "user");

    let (status, _) = app.get("/api/claims/admin", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_sync_twice_updates_instead_of_creating() {
    let app = TestApp::new();
    let id = Uuid::new_v4().to_string();
    let token = mint_token(&id, Some("repeat@example.com"), now_epoch() + 3600);

    let (_, first) = app
        .send_json(Method::POST, "/api/users/sync", Some(&token), json!({}))
        .await;
    let (status, second) = app
        .send_json(
            Method::POST,
            "/api/users/sync",
            Some(&token),
            json!({ "name": "Renamed" }),
        )
        .await;

    assert_eq!(first["data"]["created"], true);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["created"], false);
    assert_eq!(second["data"]["user"]["name"], "Renamed");
}

#[tokio::test]
async fn test_token_without_user_record_is_not_found() {
    let app = TestApp::new();
    let token = mint_token(&Uuid::new_v4().to_string(), None, now_epoch() + 3600);

    let (status, json) = app.get("/api/users/me", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "User not found");
}

#[tokio::test]
async fn test_expired_and_missing_tokens_are_unauthorized() {
    let app = TestApp::new();
    let expired = mint_token(&Uuid::new_v4().to_string(), None, now_epoch() - 3600);

    let (status, json) = app.get("/api/users/me", Some(&expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "AUTH_ERROR");

    let (status, _) = app.get("/api/users/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Items
// ============================================================================

#[tokio::test]
async fn test_create_lost_item_with_media_is_public_as_preview() {
    let app = TestApp::new();
    let owner = app.sync_user("owner@example.com").await;

    let form = Form::default()
        .text("title", "Black wallet")
        .text("category", "Accessories")
        .text("date", "2026-10-02")
        .file("images", "front.jpg", "image/jpeg", JPEG)
        .file("images", "back.jpg", "image/jpeg", JPEG)
        .file("video", "clip.mp4", "video/mp4", MP4);
    let (status, json) = app.post_form("/api/items/lost", &owner.token, form).await;

    assert_eq!(status, StatusCode::CREATED, "{}", json);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["media"].as_array().unwrap().len(), 3);
    assert_eq!(primary_count(&json["data"]["media"]), 1);
    // The reporter sees the originals they just uploaded
    assert!(json["data"]["media"][0]["url"].is_string());

    let item_id = json["data"]["id"].as_str().unwrap();
    let (status, json) = app
        .get(&format!("/api/items/lost/{}", item_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let media = json["data"]["media"].as_array().unwrap();
    assert!(media.iter().all(|m| m.get("url").is_none()));
    assert!(media.iter().all(|m| m["preview_url"].is_string()));
    assert_eq!(media[0]["is_primary"], true);
    assert_eq!(media[0]["media_type"], "image");
    assert_eq!(json["data"]["image_url"], media[0]["preview_url"]);
}

#[tokio::test]
async fn test_create_item_validation_errors() {
    let app = TestApp::new();
    let owner = app.sync_user("owner@example.com").await;

    let (status, json) = app
        .send_json(
            Method::POST,
            "/api/items/lost",
            Some(&owner.token),
            json!({ "description": "no title" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Title is required");
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let (status, json) = app
        .send_json(
            Method::POST,
            "/api/items/found",
            Some(&owner.token),
            json!({ "title": "Umbrella", "date": "10/02/2026" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Date must be in YYYY-MM-DD format");
}

#[tokio::test]
async fn test_create_item_rejects_unsupported_file_type() {
    let app = TestApp::new();
    let owner = app.sync_user("owner@example.com").await;

    let form = Form::default()
        .text("title", "Notes")
        .file("images", "notes.pdf", "application/pdf", b"%PDF-1.7");
    let (status, _) = app.post_form("/api/items/lost", &owner.token, form).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.uploader.upload_count(), 0);
}

#[tokio::test]
async fn test_list_items_filters_and_status_membership() {
    let app = TestApp::new();
    let finder = app.sync_user("finder@example.com").await;
    app.report_found_item(&finder, "Red umbrella").await;
    app.report_found_item(&finder, "Silver watch").await;

    let (status, json) = app.get("/api/items/found?keyword=UMBRELLA", None).await;
    assert_eq!(status, StatusCode::OK);
    let items = json["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Red umbrella");

    let (_, json) = app.get("/api/items/found?status=available", None).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
    // Newest first
    assert_eq!(json["data"][0]["title"], "Silver watch");

    // "pending" belongs to lost items only
    let (status, json) = app.get("/api/items/found?status=pending", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_get_item_not_found_and_malformed_id() {
    let app = TestApp::new();

    let (status, json) = app
        .get(&format!("/api/items/found/{}", Uuid::new_v4()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Found item not found");

    let (status, _) = app.get("/api/items/lost/not-an-id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Claims: end-to-end scenarios
// ============================================================================

#[tokio::test]
async fn test_claim_verified_marks_item_claimed() {
    let app = TestApp::new();
    let admin = app.sync_user(ADMIN_EMAIL).await;
    let finder = app.sync_user("finder@example.com").await;
    let claimer = app.sync_user("claimer@example.com").await;
    let item_id = app.report_found_item(&finder, "Blue backpack").await;

    let (status, json) = app.file_claim(&claimer, "found", &item_id, 2).await;
    assert_eq!(status, StatusCode::CREATED, "{}", json);
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["media"].as_array().unwrap().len(), 2);
    assert_eq!(primary_count(&json["data"]["media"]), 1);
    let claim_id = json["data"]["id"].as_str().unwrap().to_string();

    // Public read never exposes original proof URLs
    let (status, json) = app.get(&format!("/api/claims/{}", claim_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"]["media"]
        .as_array()
        .unwrap()
        .iter()
        .all(|m| m.get("url").is_none()));

    let (status, json) = app.verify(Some(&admin.token), &claim_id, "verified").await;
    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["data"]["status"], "verified");
    assert_eq!(json["data"]["item_status"], "claimed");

    let (_, json) = app
        .get(&format!("/api/items/found/{}", item_id), None)
        .await;
    assert_eq!(json["data"]["status"], "claimed");

    // A claimed item takes no new claims
    let other = app.sync_user("other@example.com").await;
    let (status, json) = app.file_claim(&other, "found", &item_id, 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "ITEM_UNAVAILABLE");

    // verified -> returned closes the item
    let (status, json) = app.verify(Some(&admin.token), &claim_id, "returned").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["item_status"], "closed");
}

#[tokio::test]
async fn test_claim_without_proof_is_rejected() {
    let app = TestApp::new();
    let finder = app.sync_user("finder@example.com").await;
    let claimer = app.sync_user("claimer@example.com").await;
    let item_id = app.report_found_item(&finder, "Keys").await;

    let (status, json) = app.file_claim(&claimer, "found", &item_id, 0).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "PROOF_REQUIRED");
    assert_eq!(app.store.claim_count().await, 0);
}

#[tokio::test]
async fn test_duplicate_pending_claim_is_rejected() {
    let app = TestApp::new();
    let finder = app.sync_user("finder@example.com").await;
    let claimer = app.sync_user("claimer@example.com").await;
    let item_id = app.report_found_item(&finder, "Phone").await;

    let (status, _) = app.file_claim(&claimer, "found", &item_id, 1).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = app.file_claim(&claimer, "found", &item_id, 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "DUPLICATE_CLAIM");
    assert_eq!(json["error"], "You already have a pending claim for this item");
    assert_eq!(app.store.claim_count().await, 1);
}

#[tokio::test]
async fn test_verify_requires_admin_and_legal_transition() {
    let app = TestApp::new();
    let admin = app.sync_user(ADMIN_EMAIL).await;
    let finder = app.sync_user("finder@example.com").await;
    let claimer = app.sync_user("claimer@example.com").await;
    let item_id = app.report_found_item(&finder, "Laptop").await;
    let (_, json) = app.file_claim(&claimer, "found", &item_id, 1).await;
    let claim_id = json["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app.verify(None, &claim_id, "verified").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = app.verify(Some(&claimer.token), &claim_id, "verified").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"], "Access denied: admin privileges required");

    let (status, json) = app.verify(Some(&admin.token), &claim_id, "pending").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let (status, json) = app.verify(Some(&admin.token), &claim_id, "rejected").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["item_status"], "available");

    let (status, json) = app.verify(Some(&admin.token), &claim_id, "verified").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_TRANSITION");
    assert_eq!(json["error"], "Cannot transition claim from rejected to verified");

    let (status, json) = app.verify(Some(&admin.token), &claim_id, "rejected").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "ALREADY_IN_STATUS");

    // State is unchanged by the failed attempts
    let (_, json) = app.get(&format!("/api/claims/{}", claim_id), None).await;
    assert_eq!(json["data"]["status"], "rejected");

    let (status, json) = app
        .verify(Some(&admin.token), &Uuid::new_v4().to_string(), "verified")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Claim not found");
}

#[tokio::test]
async fn test_upload_failure_leaves_no_claim() {
    let app = TestApp::with_uploader(MockUploader::new().fail_at(1));
    let finder = app.sync_user("finder@example.com").await;
    let claimer = app.sync_user("claimer@example.com").await;
    let item_id = app.report_found_item(&finder, "Scarf").await;

    let (status, json) = app.file_claim(&claimer, "found", &item_id, 2).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "UPLOAD_FAILED");
    assert_eq!(app.store.claim_count().await, 0);
    assert_eq!(app.store.media_count().await, 0);
    assert_eq!(app.uploader.discarded().len(), 1);
}

#[tokio::test]
async fn test_claim_against_missing_item() {
    let app = TestApp::new();
    let claimer = app.sync_user("claimer@example.com").await;

    let (status, json) = app
        .file_claim(&claimer, "lost", &Uuid::new_v4().to_string(), 1)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Lost item not found");
    assert_eq!(app.uploader.upload_count(), 0);

    let (status, json) = app.file_claim(&claimer, "stolen", "whatever", 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Item Type must be one of: lost, found");
}

// ============================================================================
// Claims: reads
// ============================================================================

#[tokio::test]
async fn test_admin_media_endpoint_exposes_originals() {
    let app = TestApp::new();
    let admin = app.sync_user(ADMIN_EMAIL).await;
    let finder = app.sync_user("finder@example.com").await;
    let claimer = app.sync_user("claimer@example.com").await;
    let item_id = app.report_found_item(&finder, "Ring").await;

    let form = Form::default()
        .text("item_type", "found")
        .text("item_id", &item_id)
        .file("proof_media", "clip.mp4", "video/mp4", MP4)
        .file("proof_images", "receipt.jpg", "image/jpeg", JPEG);
    let (status, json) = app.post_form("/api/claims", &claimer.token, form).await;
    assert_eq!(status, StatusCode::CREATED, "{}", json);
    let claim_id = json["data"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/claims/{}/media", claim_id);
    let (status, _) = app.get(&uri, Some(&claimer.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app.get(&uri, Some(&admin.token)).await;
    assert_eq!(status, StatusCode::OK);
    let media = json["data"]["claim"]["media"].as_array().unwrap();
    assert_eq!(media.len(), 2);
    assert!(media.iter().all(|m| m["url"].is_string()));
    // Images are uploaded before video, and the first upload is primary
    assert_eq!(media[0]["media_type"], "image");
    assert_eq!(media[0]["is_primary"], true);
    assert_eq!(json["data"]["item"]["id"], item_id.as_str());
}

#[tokio::test]
async fn test_list_claims_filters() {
    let app = TestApp::new();
    let admin = app.sync_user(ADMIN_EMAIL).await;
    let finder = app.sync_user("finder@example.com").await;
    let claimer = app.sync_user("claimer@example.com").await;
    let first = app.report_found_item(&finder, "Gloves").await;
    let second = app.report_found_item(&finder, "Hat").await;
    app.file_claim(&claimer, "found", &first, 1).await;
    let (_, json) = app.file_claim(&claimer, "found", &second, 1).await;
    let claim_id = json["data"]["id"].as_str().unwrap().to_string();
    app.verify(Some(&admin.token), &claim_id, "rejected").await;

    let (status, json) = app
        .get(&format!("/api/claims?claimer_id={}", claimer.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let (_, json) = app.get("/api/claims?status=rejected", None).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["id"], claim_id.as_str());

    let (status, _) = app
        .get(&format!("/api/claims?claimer_id={}", Uuid::new_v4()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/claims/admin", Some(&claimer.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app
        .get("/api/claims/admin?status=pending", Some(&admin.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}
