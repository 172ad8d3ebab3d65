use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use gci_core::contracts::gcs_path::GS_PREFIX;
use gci_core::contracts::{BlobKey, GcsPath};
use gci_core::{BlobKeyResolver, BoxError, ExecutionContext};

use crate::gcs_client::GcsClient;

/// Prefix of blob keys that point at Cloud Storage files.
pub const ENCODED_GS_FILE_PREFIX: &str = "encoded_gs_file:";

/// Encodes a `/gs/<bucket>/<object>` file name as a blob key.
pub fn encode_gs_file(file_name: &str) -> BlobKey {
    BlobKey::new(format!(
        "{ENCODED_GS_FILE_PREFIX}{}",
        URL_SAFE.encode(file_name.as_bytes())
    ))
}

/// Blob-key resolver for Cloud Storage files.
///
/// The object must exist and be readable by the service account; the key
/// itself is derived from the file name.
pub struct GcsBlobKeyResolver {
    gcs: Arc<GcsClient>,
}

impl GcsBlobKeyResolver {
    pub fn new(gcs: Arc<GcsClient>) -> Self {
        Self { gcs }
    }
}

#[async_trait]
impl BlobKeyResolver for GcsBlobKeyResolver {
    async fn blob_key_for_file(
        &self,
        ctx: &ExecutionContext,
        file_name: &str,
    ) -> Result<BlobKey, BoxError> {
        let path = file_name
            .strip_prefix(GS_PREFIX)
            .ok_or_else(|| format!("{file_name} is not a {GS_PREFIX} file name"))?;
        let path = GcsPath::parse(path)?;

        match self.gcs.object_metadata(ctx, path.bucket(), path.object()).await? {
            Some(_) => Ok(encode_gs_file(file_name)),
            None => Err(format!("{path} does not exist").into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_file_name_url_safe() {
        let key = encode_gs_file("/gs/bucket/a?b>c.png");
        assert!(key.as_str().starts_with(ENCODED_GS_FILE_PREFIX));
        let encoded = &key.as_str()[ENCODED_GS_FILE_PREFIX.len()..];
        assert!(!encoded.contains('+') && !encoded.contains('/'));
        assert_eq!(URL_SAFE.decode(encoded).unwrap(), b"/gs/bucket/a?b>c.png");
    }
}
