use std::path::PathBuf;
use std::time::Duration;

use gci_core::GciError;
use gci_provider_gcp::contracts::ServiceAccount;
use gci_provider_gcp::gcs_client::DEFAULT_STORAGE_API_URL;
use gci_provider_gcp::google_auth::DEFAULT_METADATA_HOST;
use gci_provider_gcp::GoogleCredentials;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Service configuration, read from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GciApiConfig {
    /// Port to listen on (`PORT`, as set by App Engine and Cloud Run).
    pub port: u16,
    /// Deadline applied to each inbound request.
    pub request_timeout: Duration,
    /// Cloud Storage JSON API base URL.
    pub storage_api_url: String,
    /// Image-serving endpoint.
    pub images_api_url: String,
    /// Metadata server host, used when no key file is configured.
    pub metadata_host: String,
    /// Service-account key file.
    pub credentials_path: Option<PathBuf>,
}

impl GciApiConfig {
    pub fn from_env() -> Result<Self, GciError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GciError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(p) => p
                .trim()
                .parse::<u16>()
                .map_err(|e| GciError::Config(format!("PORT={p:?}: {e}")))?,
            None => DEFAULT_PORT,
        };
        let timeout_secs = match var("GCI_REQUEST_TIMEOUT_SECS") {
            Some(t) => t
                .trim()
                .parse::<u64>()
                .map_err(|e| GciError::Config(format!("GCI_REQUEST_TIMEOUT_SECS={t:?}: {e}")))?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(GciError::Config(
                "GCI_REQUEST_TIMEOUT_SECS must be positive".to_string(),
            ));
        }
        let images_api_url = var("GCI_IMAGES_API_URL")
            .ok_or_else(|| GciError::Config("GCI_IMAGES_API_URL is not set".to_string()))?;

        Ok(Self {
            port,
            request_timeout: Duration::from_secs(timeout_secs),
            storage_api_url: var("GCI_STORAGE_API_URL")
                .unwrap_or_else(|| DEFAULT_STORAGE_API_URL.to_string()),
            images_api_url,
            metadata_host: var("GCE_METADATA_HOST")
                .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string()),
            credentials_path: var("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from),
        })
    }

    /// Key file credentials when configured, the metadata server otherwise.
    pub fn credentials(&self) -> Result<GoogleCredentials, GciError> {
        match &self.credentials_path {
            Some(path) => {
                let account =
                    ServiceAccount::from_file(path).map_err(|e| GciError::Config(e.to_string()))?;
                Ok(GoogleCredentials::service_account(account))
            }
            None => Ok(GoogleCredentials::Metadata {
                host: self.metadata_host.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<GciApiConfig, GciError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GciApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[("GCI_IMAGES_API_URL", "http://images.internal/serving_url")]).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert_eq!(cfg.storage_api_url, "https://storage.googleapis.com");
        assert_eq!(cfg.metadata_host, "metadata.google.internal");
        assert_eq!(cfg.credentials_path, None);
        assert!(matches!(cfg.credentials().unwrap(), GoogleCredentials::Metadata { .. }));
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("PORT", "9000"),
            ("GCI_REQUEST_TIMEOUT_SECS", "5"),
            ("GCI_IMAGES_API_URL", "http://images"),
            ("GCI_STORAGE_API_URL", "http://localhost:4443"),
            ("GCE_METADATA_HOST", "localhost:8081"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));
        assert_eq!(cfg.storage_api_url, "http://localhost:4443");
        match cfg.credentials().unwrap() {
            GoogleCredentials::Metadata { host } => assert_eq!(host, "localhost:8081"),
            other => panic!("unexpected credentials {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[]).is_err());
        assert!(config(&[("GCI_IMAGES_API_URL", "x"), ("PORT", "eighty")]).is_err());
        assert!(config(&[("GCI_IMAGES_API_URL", "x"), ("GCI_REQUEST_TIMEOUT_SECS", "0")]).is_err());
    }

    #[test]
    fn missing_key_file_is_a_config_error() {
        let cfg = config(&[
            ("GCI_IMAGES_API_URL", "x"),
            ("GOOGLE_APPLICATION_CREDENTIALS", "/nonexistent/key.json"),
        ])
        .unwrap();
        assert!(matches!(cfg.credentials(), Err(GciError::Config(_))));
    }
}
