use std::sync::Arc;

use async_trait::async_trait;
use gci_core::contracts::{BlobKey, ServingUrlOptions};
use gci_core::{BoxError, ExecutionContext, ImageServingClient};
use reqwest::Url;

use crate::contracts::{ImagesServingUrlRequest, ImagesServingUrlResponse};
use crate::google_auth::GoogleAuth;
use crate::{check_status, with_deadline};

/// Client for the image-serving endpoint that turns blob keys into public
/// serving URLs.
#[derive(Clone)]
pub struct ImagesApiClient {
    http: reqwest::Client,
    api_url: String,
    auth: Arc<GoogleAuth>,
}

impl ImagesApiClient {
    pub fn new(http: reqwest::Client, api_url: String, auth: Arc<GoogleAuth>) -> Self {
        Self {
            http,
            api_url,
            auth,
        }
    }
}

#[async_trait]
impl ImageServingClient for ImagesApiClient {
    async fn serving_url(
        &self,
        ctx: &ExecutionContext,
        key: &BlobKey,
        options: ServingUrlOptions,
    ) -> Result<String, BoxError> {
        let auth = self.auth.get_auth_header_value(ctx).await?;
        let request = ImagesServingUrlRequest {
            blob_key: key.as_str().to_string(),
            secure_url: options.secure,
        };

        let res = with_deadline(self.http.post(&self.api_url), ctx)
            .header("Authorization", auth)
            .json(&request)
            .send()
            .await?;
        let res = check_status(res, "image serving url").await?;
        let response: ImagesServingUrlResponse = res.json().await?;

        let mut url = Url::parse(&response.url)
            .map_err(|e| format!("image api returned an invalid url {:?}: {}", response.url, e))?;
        if options.secure && url.scheme() == "http" {
            url.set_scheme("https")
                .map_err(|_| format!("cannot upgrade {} to https", response.url))?;
        }
        Ok(url.to_string())
    }
}

