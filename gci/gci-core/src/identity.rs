use std::sync::Arc;

use crate::{ExecutionContext, GciError, GciResult, IdentityProvider};

/// Reports the service account the process runs as, so bucket owners know
/// whom to grant access.
pub struct IdentityReporter {
    provider: Arc<dyn IdentityProvider>,
}

impl IdentityReporter {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    pub async fn identity(&self, ctx: &ExecutionContext) -> GciResult<String> {
        let email = ctx
            .run("service_account", async {
                self.provider
                    .service_account(ctx)
                    .await
                    .map_err(|e| GciError::IdentityUnavailable(e.to_string()))
            })
            .await?;

        let email = email.trim();
        if email.is_empty() {
            return Err(GciError::IdentityUnavailable(
                "identity provider returned an empty service account".to_string(),
            ));
        }
        Ok(email.to_string())
    }
}
