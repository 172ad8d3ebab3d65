//! In-process stand-in for the Google endpoints the provider talks to.
#![allow(dead_code)]

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::{json, Value};

#[derive(Default)]
pub struct FakeGoogle {
    pub objects: Mutex<HashSet<(String, String)>>,
    pub calls: Mutex<Vec<String>>,
    pub rejected_keys: Mutex<HashSet<String>>,
    pub copy_denied: Mutex<bool>,
    pub serving_url_scheme: Mutex<String>,
}

impl FakeGoogle {
    pub fn with_object(self, bucket: &str, object: &str) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), object.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn bearer_ok(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "Bearer fake-token")
        .unwrap_or(false)
}

async fn metadata_token(State(fake): State<Arc<FakeGoogle>>, headers: HeaderMap) -> impl IntoResponse {
    if headers.get("metadata-flavor").and_then(|v| v.to_str().ok()) != Some("Google") {
        return (StatusCode::FORBIDDEN, "missing Metadata-Flavor").into_response();
    }
    fake.record("metadata_token".to_string());
    Json(json!({"access_token": "fake-token", "token_type": "Bearer", "expires_in": 3599})).into_response()
}

async fn metadata_email(State(fake): State<Arc<FakeGoogle>>, headers: HeaderMap) -> impl IntoResponse {
    if headers.get("metadata-flavor").and_then(|v| v.to_str().ok()) != Some("Google") {
        return (StatusCode::FORBIDDEN, "missing Metadata-Flavor").into_response();
    }
    fake.record("metadata_email".to_string());
    "gci-app@gci-test.iam.gserviceaccount.com\n".into_response()
}

async fn token_exchange(
    State(fake): State<Arc<FakeGoogle>>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    let grant_ok = form.get("grant_type").map(String::as_str)
        == Some("urn:ietf:params:oauth:grant-type:jwt-bearer");
    let assertion = form.get("assertion").cloned().unwrap_or_default();
    if !grant_ok || assertion.split('.').count() != 3 {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_grant"}))).into_response();
    }
    fake.record("token_exchange".to_string());
    Json(json!({"access_token": "fake-token", "token_type": "Bearer", "expires_in": 3600})).into_response()
}

async fn object_metadata(
    State(fake): State<Arc<FakeGoogle>>,
    Path((bucket, object)): Path<(String, String)>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !bearer_ok(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    fake.record(format!("get {bucket}/{object}"));
    let exists = fake
        .objects
        .lock()
        .unwrap()
        .contains(&(bucket.clone(), object.clone()));
    if !exists {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": {"code": 404, "message": "No such object"}})),
        )
            .into_response();
    }
    Json(json!({"bucket": bucket, "name": object, "contentType": "image/png", "size": "42"})).into_response()
}

async fn copy_object(
    State(fake): State<Arc<FakeGoogle>>,
    Path((bucket, object, dst_bucket, dst_object)): Path<(String, String, String, String)>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !bearer_ok(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    fake.record(format!("copy {bucket}/{object} -> {dst_bucket}/{dst_object}"));
    if *fake.copy_denied.lock().unwrap() {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"error": {"code": 403, "message": "storage.objects.create denied"}})),
        )
            .into_response();
    }
    let mut objects = fake.objects.lock().unwrap();
    if !objects.contains(&(bucket.clone(), object.clone())) {
        return StatusCode::NOT_FOUND.into_response();
    }
    objects.insert((dst_bucket.clone(), dst_object.clone()));
    Json(json!({"bucket": dst_bucket, "name": dst_object})).into_response()
}

async fn serving_url(
    State(fake): State<Arc<FakeGoogle>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !bearer_ok(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let key = body["blobKey"].as_str().unwrap_or_default().to_string();
    fake.record(format!("serving_url secure={}", body["secureUrl"]));
    if fake.rejected_keys.lock().unwrap().contains(&key) {
        return (StatusCode::BAD_REQUEST, "image too large").into_response();
    }
    let scheme = fake.serving_url_scheme.lock().unwrap().clone();
    let scheme = if scheme.is_empty() { "https".to_string() } else { scheme };
    Json(json!({"url": format!("{scheme}://lh3.googleusercontent.com/served")})).into_response()
}

/// Starts the fake on an ephemeral port and returns its `host:port`.
pub async fn start(fake: Arc<FakeGoogle>) -> String {
    let app = Router::new()
        .route(
            "/computeMetadata/v1/instance/service-accounts/default/token",
            get(metadata_token),
        )
        .route(
            "/computeMetadata/v1/instance/service-accounts/default/email",
            get(metadata_email),
        )
        .route("/token", post(token_exchange))
        .route("/storage/v1/b/:bucket/o/:object", get(object_metadata))
        .route(
            "/storage/v1/b/:bucket/o/:object/copyTo/b/:dst_bucket/o/:dst_object",
            post(copy_object),
        )
        .route("/images/serving_url", post(serving_url))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr.to_string()
}
