use gci_core::{BoxError, ExecutionContext};

use crate::contracts::GoogleErrorResponse;

pub mod blob_key;
pub mod contracts;
pub mod gcs_client;
pub mod google_auth;
pub mod images_client;

pub use blob_key::GcsBlobKeyResolver;
pub use gcs_client::GcsClient;
pub use google_auth::{GoogleAuth, GoogleCredentials};
pub use images_client::ImagesApiClient;

/// Caps the request timeout at whatever is left of the context's deadline.
pub(crate) fn with_deadline(
    builder: reqwest::RequestBuilder,
    ctx: &ExecutionContext,
) -> reqwest::RequestBuilder {
    match ctx.remaining() {
        Some(remaining) => builder.timeout(remaining),
        None => builder,
    }
}

/// Turns a non-2xx response into an error carrying Google's message.
pub(crate) async fn check_status(
    res: reqwest::Response,
    operation: &str,
) -> Result<reqwest::Response, BoxError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<GoogleErrorResponse>(&body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body,
    };
    Err(format!("{operation} failed with {status}: {message}").into())
}
