use async_trait::async_trait;
use mockall::automock;

use crate::contracts::{BlobKey, ServingUrlOptions};
pub mod context;
pub mod contracts;
pub mod copy_marker;
pub mod error;
pub mod identity;
pub mod logging;
pub mod resolver;

pub use context::ExecutionContext;
pub use error::{BoxError, CredentialsError, GciError, GciResult};
pub use identity::IdentityReporter;
pub use resolver::ServingUrlResolver;

/// Turns a blob-store file name (`/gs/<bucket>/<object>`) into a blob key.
#[automock]
#[async_trait]
pub trait BlobKeyResolver: Send + Sync {
    async fn blob_key_for_file(
        &self,
        ctx: &ExecutionContext,
        file_name: &str,
    ) -> Result<BlobKey, BoxError>;
}

/// Image API that hands out public serving URLs for blob keys.
#[automock]
#[async_trait]
pub trait ImageServingClient: Send + Sync {
    async fn serving_url(
        &self,
        ctx: &ExecutionContext,
        key: &BlobKey,
        options: ServingUrlOptions,
    ) -> Result<String, BoxError>;
}

#[automock]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Server-side copy of `source` to `destination` within `bucket`.
    async fn copy_object(
        &self,
        ctx: &ExecutionContext,
        bucket: &str,
        source: &str,
        destination: &str,
    ) -> Result<(), BoxError>;
}

#[automock]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Service-account email the process runs as.
    async fn service_account(&self, ctx: &ExecutionContext) -> Result<String, BoxError>;
}
