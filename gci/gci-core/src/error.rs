use thiserror::Error;

/// Boxed error returned by the external collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type GciResult<T> = Result<T, GciError>;

/// Raised by collaborators that could not obtain credentials for an outbound
/// call. The resolver reports it as [`GciError::AuthFailed`] and never clones
/// in response to it.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CredentialsError(pub String);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GciError {
    #[error("invalid storage path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("blob key lookup failed for {path}: {message}")]
    LookupFailed { path: String, message: String },

    #[error("image serving url failed for {path}: {message}")]
    ServingUrlFailed { path: String, message: String },

    #[error("copy of {path} to {destination} failed: {message}")]
    CopyFailed {
        path: String,
        destination: String,
        message: String,
    },

    #[error("credentials unavailable during {operation}: {message}")]
    AuthFailed {
        operation: &'static str,
        message: String,
    },

    #[error("failed to serialize response: {0}")]
    SerializationFailed(String),

    #[error("service account unavailable: {0}")]
    IdentityUnavailable(String),

    #[error("deadline exceeded during {0}")]
    DeadlineExceeded(&'static str),

    #[error("request cancelled during {0}")]
    Cancelled(&'static str),

    #[error("configuration error: {0}")]
    Config(String),
}

impl GciError {
    /// True when the caller sent something unusable, as opposed to a
    /// failure on our side or in a collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(self, GciError::InvalidPath { .. })
    }

    /// Short machine-friendly name used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            GciError::InvalidPath { .. } => "invalid_path",
            GciError::LookupFailed { .. } => "lookup_failed",
            GciError::ServingUrlFailed { .. } => "serving_url_failed",
            GciError::CopyFailed { .. } => "copy_failed",
            GciError::AuthFailed { .. } => "auth_failed",
            GciError::SerializationFailed(_) => "serialization_failed",
            GciError::IdentityUnavailable(_) => "identity_unavailable",
            GciError::DeadlineExceeded(_) => "deadline_exceeded",
            GciError::Cancelled(_) => "cancelled",
            GciError::Config(_) => "config",
        }
    }
}

/// Maps a collaborator error, keeping credential failures apart from
/// everything `otherwise` describes.
pub(crate) fn from_collaborator(
    operation: &'static str,
    e: BoxError,
    otherwise: impl FnOnce(String) -> GciError,
) -> GciError {
    match e.downcast_ref::<CredentialsError>() {
        Some(CredentialsError(message)) => GciError::AuthFailed {
            operation,
            message: message.clone(),
        },
        None => otherwise(e.to_string()),
    }
}

impl From<serde_json::Error> for GciError {
    fn from(e: serde_json::Error) -> Self {
        GciError::SerializationFailed(e.to_string())
    }
}
