use std::fmt;
use std::str::FromStr;

use crate::copy_marker;
use crate::error::GciError;

/// Prefix the blob store expects in front of Cloud Storage file names.
pub const GS_PREFIX: &str = "/gs";

/// A Cloud Storage object addressed as `/<bucket>/<object>`.
///
/// The object key may itself contain `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GcsPath {
    bucket: String,
    object: String,
}

impl GcsPath {
    pub fn new(bucket: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            object: object.into(),
        }
    }

    pub fn parse(path: &str) -> Result<Self, GciError> {
        let invalid = |reason| GciError::InvalidPath {
            path: path.to_string(),
            reason,
        };

        let rest = path.strip_prefix('/').ok_or_else(|| invalid("must start with '/'"))?;
        let (bucket, object) = rest
            .split_once('/')
            .ok_or_else(|| invalid("missing object key"))?;

        if bucket.is_empty() {
            return Err(invalid("empty bucket name"));
        }
        if object.is_empty() {
            return Err(invalid("missing object key"));
        }
        if object.starts_with('/') {
            return Err(invalid("empty path segment"));
        }
        if object.ends_with('/') {
            return Err(invalid("object key names a directory"));
        }

        Ok(Self::new(bucket, object))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn object(&self) -> &str {
        &self.object
    }

    /// File name in the blob store's `/gs/<bucket>/<object>` form.
    pub fn file_name(&self) -> String {
        format!("{GS_PREFIX}/{}/{}", self.bucket, self.object)
    }

    pub fn is_copy(&self) -> bool {
        copy_marker::is_copy(&self.object)
    }

    /// Sibling path in the same bucket carrying the copy marker.
    pub fn copy_sibling(&self) -> Self {
        Self::new(
            self.bucket.clone(),
            copy_marker::add_copy_marker(&self.object),
        )
    }
}

impl fmt::Display for GcsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.bucket, self.object)
    }
}

impl FromStr for GcsPath {
    type Err = GciError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_object_keys() {
        let path = GcsPath::parse("/my-bucket/uploads/2024/cat.png").unwrap();
        assert_eq!(path.bucket(), "my-bucket");
        assert_eq!(path.object(), "uploads/2024/cat.png");
        assert_eq!(path.to_string(), "/my-bucket/uploads/2024/cat.png");
        assert_eq!(path.file_name(), "/gs/my-bucket/uploads/2024/cat.png");
    }

    #[test]
    fn rejects_malformed_paths() {
        for bad in ["", "/", "bucket/obj", "/bucket", "/bucket/", "//obj", "/bucket//obj", "/bucket/dir/"] {
            let err = GcsPath::parse(bad).unwrap_err();
            assert!(
                matches!(err, GciError::InvalidPath { .. }),
                "{bad:?} should be invalid, got {err:?}"
            );
        }
    }

    #[test]
    fn copy_sibling_stays_in_bucket() {
        let path = GcsPath::parse("/b/img/photo.jpg").unwrap();
        let copy = path.copy_sibling();
        assert_eq!(copy.to_string(), "/b/img/photo.copy.jpg");
        assert!(copy.is_copy());
        assert!(!path.is_copy());
    }
}
