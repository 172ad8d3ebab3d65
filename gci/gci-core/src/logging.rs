use std::fmt::Debug;

use crate::contracts::GcsPath;
use crate::error::GciError;

/// Sink for serving-URL resolution events.
///
/// Clients only ever see `{"success": false}`; these events are what tells a
/// first-attempt failure apart from a failure after cloning.
pub trait IGciLogger: Send + Sync + Debug {
    fn log_attempt(&self, request_id: &str, path: &GcsPath, attempt: u32);
    fn log_failure(&self, request_id: &str, path: &GcsPath, attempt: u32, error: &GciError);
    fn log_clone(&self, request_id: &str, source: &GcsPath, destination: &GcsPath);
    fn log_resolved(&self, request_id: &str, path: &GcsPath, attempt: u32, serving_url: &str);
}

#[derive(Debug, Default)]
pub struct TracingGciLogger;

impl IGciLogger for TracingGciLogger {
    fn log_attempt(&self, request_id: &str, path: &GcsPath, attempt: u32) {
        tracing::debug!(request_id, path = %path, attempt, "resolving serving url");
    }

    fn log_failure(&self, request_id: &str, path: &GcsPath, attempt: u32, error: &GciError) {
        tracing::warn!(
            request_id,
            path = %path,
            attempt,
            kind = error.kind(),
            error = %error,
            "serving url attempt failed"
        );
    }

    fn log_clone(&self, request_id: &str, source: &GcsPath, destination: &GcsPath) {
        tracing::info!(
            request_id,
            source = %source,
            destination = %destination,
            "cloned object for image api retry"
        );
    }

    fn log_resolved(&self, request_id: &str, path: &GcsPath, attempt: u32, serving_url: &str) {
        tracing::info!(request_id, path = %path, attempt, serving_url, "serving url resolved");
    }
}
