use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use gci_core::{
    contracts::{ServiceAccountResponse, ServingUrlResponse},
    ExecutionContext, GciError, IdentityReporter, ServingUrlResolver,
};
use gci_provider_gcp::{GcsBlobKeyResolver, GcsClient, GoogleAuth, ImagesApiClient};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

pub mod config;

use config::GciApiConfig;

/// Body sent for every failure; nothing about the cause reaches the client.
const FAILURE_BODY: &str = r#"{"success":false}"#;

pub struct AppState {
    pub resolver: ServingUrlResolver,
    pub identity: IdentityReporter,
    pub request_timeout: Duration,
}

impl AppState {
    /// Wires the Google Cloud implementations of every collaborator.
    pub fn from_config(config: &GciApiConfig) -> Result<Self, GciError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| GciError::Config(format!("failed to build http client: {e}")))?;
        let auth = Arc::new(GoogleAuth::new(http.clone(), config.credentials()?));
        let gcs = Arc::new(GcsClient::new(
            http.clone(),
            config.storage_api_url.clone(),
            auth.clone(),
        ));
        let images = Arc::new(ImagesApiClient::new(
            http,
            config.images_api_url.clone(),
            auth.clone(),
        ));

        Ok(Self {
            resolver: ServingUrlResolver::new(
                Arc::new(GcsBlobKeyResolver::new(gcs.clone())),
                images,
                gcs,
            ),
            identity: IdentityReporter::new(auth),
            request_timeout: config.request_timeout,
        })
    }

    fn new_context(&self) -> ExecutionContext {
        ExecutionContext::new().with_timeout(self.request_timeout)
    }
}

pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/_/serving_url", get(handle_serving_url))
        .route("/_/service_account", get(handle_service_account))
        .route("/_/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// First value of `name` in the query string; repeats are ignored.
fn first_param(pairs: Vec<(String, String)>, name: &str) -> Option<String> {
    pairs
        .into_iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

async fn handle_serving_url(
    State(state): State<Arc<AppState>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    let ctx = state.new_context();
    // Cancels outbound calls if the client goes away mid-request.
    let _guard = ctx.drop_guard();

    let pairs = match query {
        Ok(Query(pairs)) => pairs,
        Err(e) => {
            error!(request_id = ctx.request_id(), error = %e, "unreadable query string");
            return failure(StatusCode::BAD_REQUEST);
        }
    };
    let Some(gcs_path) = first_param(pairs, "gcs").filter(|p| !p.is_empty()) else {
        error!(request_id = ctx.request_id(), "missing gcs query parameter");
        return failure(StatusCode::BAD_REQUEST);
    };

    match state.resolver.resolve(&ctx, &gcs_path).await {
        Ok(serving_url) => {
            info!(request_id = ctx.request_id(), path = %gcs_path, %serving_url, "serving url");
            json_response(StatusCode::OK, &ServingUrlResponse::ok(serving_url))
        }
        Err(e) => {
            error!(
                request_id = ctx.request_id(),
                path = %gcs_path,
                kind = e.kind(),
                error = %e,
                "failed to get serving url"
            );
            failure(status_for(&e))
        }
    }
}

async fn handle_service_account(State(state): State<Arc<AppState>>) -> Response {
    let ctx = state.new_context();
    let _guard = ctx.drop_guard();

    match state.identity.identity(&ctx).await {
        Ok(email) => json_response(StatusCode::OK, &ServiceAccountResponse::ok(email)),
        Err(e) => {
            error!(
                request_id = ctx.request_id(),
                kind = e.kind(),
                error = %e,
                "failed to get service account"
            );
            failure(status_for(&e))
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    success: bool,
}

async fn handle_health() -> Response {
    json_response(StatusCode::OK, &HealthResponse { success: true })
}

fn status_for(e: &GciError) -> StatusCode {
    match e {
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        GciError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn with_headers(status: StatusCode, body: Vec<u8>) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Content-Type")),
        ],
        body,
    )
        .into_response()
}

fn failure(status: StatusCode) -> Response {
    with_headers(status, FAILURE_BODY.as_bytes().to_vec())
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => with_headers(status, bytes),
        Err(e) => {
            let e = GciError::from(e);
            error!(kind = e.kind(), error = %e, "failed to serialize json");
            failure(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
