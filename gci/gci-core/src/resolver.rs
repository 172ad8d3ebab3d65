use std::sync::Arc;

use crate::contracts::{GcsPath, ServingUrlOptions};
use crate::error::from_collaborator;
use crate::logging::{IGciLogger, TracingGciLogger};
use crate::{
    BlobKeyResolver, ExecutionContext, GciError, GciResult, ImageServingClient, ObjectStore,
};

/// Attempts made per request: the original object plus at most one clone.
const MAX_ATTEMPTS: u32 = 2;

/// Resolves Cloud Storage paths to public image-serving URLs.
///
/// If the image API rejects an object that is not itself a copy, the object
/// is copied to a `.copy` sibling in the same bucket and the sibling is tried
/// once. The copy is left in place whatever happens next. Credential
/// failures surface as [`GciError::AuthFailed`] and are never retried.
pub struct ServingUrlResolver {
    blobs: Arc<dyn BlobKeyResolver>,
    images: Arc<dyn ImageServingClient>,
    store: Arc<dyn ObjectStore>,
    logger: Arc<dyn IGciLogger>,
}

impl ServingUrlResolver {
    pub fn new(
        blobs: Arc<dyn BlobKeyResolver>,
        images: Arc<dyn ImageServingClient>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            blobs,
            images,
            store,
            logger: Arc::new(TracingGciLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn IGciLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub async fn resolve(&self, ctx: &ExecutionContext, path: &str) -> GciResult<String> {
        let mut current = GcsPath::parse(path)?;
        let mut attempt = 1;

        loop {
            self.logger.log_attempt(ctx.request_id(), &current, attempt);

            let err = match self.serving_url_for(ctx, &current).await {
                Ok(url) => {
                    self.logger.log_resolved(ctx.request_id(), &current, attempt, &url);
                    return Ok(url);
                }
                Err(err) => err,
            };
            self.logger.log_failure(ctx.request_id(), &current, attempt, &err);

            // Only an image API rejection of an original is worth a clone.
            let retryable = matches!(err, GciError::ServingUrlFailed { .. })
                && !current.is_copy()
                && attempt < MAX_ATTEMPTS;
            if !retryable {
                return Err(err);
            }

            current = self.clone_object(ctx, &current, attempt).await?;
            attempt += 1;
        }
    }

    async fn serving_url_for(&self, ctx: &ExecutionContext, path: &GcsPath) -> GciResult<String> {
        let file_name = path.file_name();
        let key = ctx
            .run("blob_key_for_file", async {
                self.blobs
                    .blob_key_for_file(ctx, &file_name)
                    .await
                    .map_err(|e| {
                        from_collaborator("blob_key_for_file", e, |message| {
                            GciError::LookupFailed {
                                path: path.to_string(),
                                message,
                            }
                        })
                    })
            })
            .await?;

        ctx.run("serving_url", async {
            self.images
                .serving_url(ctx, &key, ServingUrlOptions { secure: true })
                .await
                .map_err(|e| {
                    from_collaborator("serving_url", e, |message| GciError::ServingUrlFailed {
                        path: path.to_string(),
                        message,
                    })
                })
        })
        .await
    }

    async fn clone_object(
        &self,
        ctx: &ExecutionContext,
        source: &GcsPath,
        attempt: u32,
    ) -> GciResult<GcsPath> {
        let destination = source.copy_sibling();

        let copied = ctx
            .run("copy_object", async {
                self.store
                    .copy_object(ctx, source.bucket(), source.object(), destination.object())
                    .await
                    .map_err(|e| {
                        from_collaborator("copy_object", e, |message| GciError::CopyFailed {
                            path: source.to_string(),
                            destination: destination.to_string(),
                            message,
                        })
                    })
            })
            .await;
        if let Err(err) = copied {
            self.logger.log_failure(ctx.request_id(), source, attempt, &err);
            return Err(err);
        }

        self.logger.log_clone(ctx.request_id(), source, &destination);
        Ok(destination)
    }
}
