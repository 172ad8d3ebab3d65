use std::sync::Arc;

use async_trait::async_trait;
use gci_core::{BoxError, ExecutionContext, ObjectStore};
use reqwest::{StatusCode, Url};

use crate::contracts::GcsObject;
use crate::google_auth::GoogleAuth;
use crate::{check_status, with_deadline};

pub const DEFAULT_STORAGE_API_URL: &str = "https://storage.googleapis.com";

/// Cloud Storage JSON API client.
#[derive(Clone)]
pub struct GcsClient {
    http: reqwest::Client,
    api_url: String,
    auth: Arc<GoogleAuth>,
}

impl GcsClient {
    pub fn new(http: reqwest::Client, api_url: String, auth: Arc<GoogleAuth>) -> Self {
        Self {
            http,
            api_url,
            auth,
        }
    }

    /// `{api}/storage/v1/b/{bucket}/o/{object}`, each name encoded as a
    /// single path segment so `/` inside object keys survives.
    fn object_url(&self, bucket: &str, object: &str) -> Result<Url, BoxError> {
        let mut url = Url::parse(&self.api_url)?;
        url.path_segments_mut()
            .map_err(|_| format!("storage api url {} cannot be a base", self.api_url))?
            .pop_if_empty()
            .extend(["storage", "v1", "b", bucket, "o", object]);
        Ok(url)
    }

    /// Object metadata, `None` if the object does not exist.
    pub async fn object_metadata(
        &self,
        ctx: &ExecutionContext,
        bucket: &str,
        object: &str,
    ) -> Result<Option<GcsObject>, BoxError> {
        let url = self.object_url(bucket, object)?;
        let auth = self.auth.get_auth_header_value(ctx).await?;

        let res = with_deadline(self.http.get(url), ctx)
            .header("Authorization", auth)
            .send()
            .await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let res = check_status(res, "object lookup").await?;
        Ok(Some(res.json::<GcsObject>().await?))
    }
}

#[async_trait]
impl ObjectStore for GcsClient {
    async fn copy_object(
        &self,
        ctx: &ExecutionContext,
        bucket: &str,
        source: &str,
        destination: &str,
    ) -> Result<(), BoxError> {
        let mut url = self.object_url(bucket, source)?;
        url.path_segments_mut()
            .map_err(|_| format!("storage api url {} cannot be a base", self.api_url))?
            .extend(["copyTo", "b", bucket, "o", destination]);
        let auth = self.auth.get_auth_header_value(ctx).await?;

        tracing::debug!(bucket, source, destination, "copying object");
        let res = with_deadline(self.http.post(url), ctx)
            .header("Authorization", auth)
            .header("Content-Type", "application/json")
            .body("{}")
            .send()
            .await?;
        let res = check_status(res, "object copy").await?;
        let copied: GcsObject = res.json().await?;
        tracing::debug!(bucket = %copied.bucket, name = %copied.name, "object copied");
        Ok(())
    }
}
