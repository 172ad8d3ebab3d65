use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gci_core::{BoxError, CredentialsError, ExecutionContext, IdentityProvider};

use super::contracts::{GoogleAccessToken, JwtBearerClaims, ServiceAccount};
use crate::{check_status, with_deadline};

pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";
const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Where credentials come from.
#[derive(Debug, Clone)]
pub enum GoogleCredentials {
    /// A service-account key file; tokens come from a signed JWT exchange.
    ServiceAccount {
        account: ServiceAccount,
        token_url: String,
    },
    /// The instance metadata server (App Engine, Cloud Run, GCE).
    Metadata { host: String },
}

impl GoogleCredentials {
    pub fn service_account(account: ServiceAccount) -> Self {
        GoogleCredentials::ServiceAccount {
            account,
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }

    pub fn metadata() -> Self {
        GoogleCredentials::Metadata {
            host: DEFAULT_METADATA_HOST.to_string(),
        }
    }
}

/// Access tokens and identity for the running service account.
pub struct GoogleAuth {
    http: reqwest::Client,
    credentials: GoogleCredentials,
    token_state: tokio::sync::Mutex<TokenState>,
}

struct TokenState {
    access_token: String,
    token_type: String,
    expires_at: Option<DateTime<Utc>>,
}

impl GoogleAuth {
    pub fn new(http: reqwest::Client, credentials: GoogleCredentials) -> Self {
        Self {
            http,
            credentials,
            token_state: tokio::sync::Mutex::new(TokenState {
                access_token: String::new(),
                token_type: "Bearer".to_string(),
                expires_at: None,
            }),
        }
    }

    pub fn credentials(&self) -> &GoogleCredentials {
        &self.credentials
    }

    /// Cached access token, refreshed five minutes before it expires.
    ///
    /// A failed refresh comes back as a [`CredentialsError`].
    pub async fn get_token(&self, ctx: &ExecutionContext) -> Result<String, BoxError> {
        let refresh_skew = Duration::from_secs(5 * 60);
        let now = Utc::now();

        let mut state = self.token_state.lock().await;
        let needs_refresh = match state.expires_at {
            None => state.access_token.is_empty(),
            Some(exp) => state.access_token.is_empty() || (now + refresh_skew) >= exp,
        };
        if needs_refresh {
            tracing::debug!("google: refreshing access token");

            let response = self
                .fetch_new_token(ctx)
                .await
                .map_err(|e| CredentialsError(format!("access token refresh failed: {e}")))?;
            let expires_at = now + Duration::from_secs(response.expires_in);

            state.access_token = response.access_token;
            state.token_type = response.token_type;
            state.expires_at = Some(expires_at);

            tracing::info!(%expires_at, "google: new access token created");
        }
        Ok(state.access_token.clone())
    }

    pub async fn get_auth_header_value(&self, ctx: &ExecutionContext) -> Result<String, BoxError> {
        let token = self.get_token(ctx).await?;
        let state = self.token_state.lock().await;
        Ok(format!("{} {}", state.token_type, token))
    }

    pub async fn fetch_new_token(
        &self,
        ctx: &ExecutionContext,
    ) -> Result<GoogleAccessToken, BoxError> {
        match &self.credentials {
            GoogleCredentials::ServiceAccount { account, token_url } => {
                self.exchange_jwt(ctx, account, token_url).await
            }
            GoogleCredentials::Metadata { host } => {
                let url = format!(
                    "http://{host}/computeMetadata/v1/instance/service-accounts/default/token?scopes={CLOUD_PLATFORM_SCOPE}"
                );
                let res = with_deadline(self.http.get(&url), ctx)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await?;
                let res = check_status(res, "metadata token").await?;
                Ok(res.json::<GoogleAccessToken>().await?)
            }
        }
    }

    async fn exchange_jwt(
        &self,
        ctx: &ExecutionContext,
        account: &ServiceAccount,
        token_url: &str,
    ) -> Result<GoogleAccessToken, BoxError> {
        let now = Utc::now();
        let claims = JwtBearerClaims {
            iss: account.client_email.to_string(),
            scope: CLOUD_PLATFORM_SCOPE.to_owned(),
            aud: token_url.to_owned(),
            iat: now.timestamp(),
            exp: (now + Duration::from_secs(60 * 60)).timestamp(),
        };
        let jwt = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256),
            &claims,
            &jsonwebtoken::EncodingKey::from_rsa_pem(account.private_key.as_bytes())?,
        )?;
        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", jwt.as_str()),
        ];
        let res = with_deadline(self.http.post(token_url), ctx)
            .form(&params)
            .send()
            .await?;
        let res = check_status(res, "token exchange").await?;
        Ok(res.json::<GoogleAccessToken>().await?)
    }
}

#[async_trait]
impl IdentityProvider for GoogleAuth {
    async fn service_account(&self, ctx: &ExecutionContext) -> Result<String, BoxError> {
        match &self.credentials {
            GoogleCredentials::ServiceAccount { account, .. } => Ok(account.client_email.clone()),
            GoogleCredentials::Metadata { host } => {
                let url = format!(
                    "http://{host}/computeMetadata/v1/instance/service-accounts/default/email"
                );
                let res = with_deadline(self.http.get(&url), ctx)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await?;
                let res = check_status(res, "metadata email").await?;
                Ok(res.text().await?.trim().to_string())
            }
        }
    }
}
