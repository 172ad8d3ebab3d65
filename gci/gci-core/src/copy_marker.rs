//! Naming of derivative copies.
//!
//! When the image API rejects an object, the resolver copies it to a sibling
//! whose name carries the `.copy` marker and tries again with that. An object
//! whose key already contains the marker is never copied again.

pub const COPY_MARKER: &str = ".copy";

/// Inserts `.copy` before the extension of the last path segment.
///
/// `foo.png` becomes `foo.copy.png`, `foo` becomes `foo.copy` and
/// `a.b.c` becomes `a.b.copy.c`. Dots in parent "directories" are ignored.
pub fn add_copy_marker(object: &str) -> String {
    let file_start = object.rfind('/').map(|i| i + 1).unwrap_or(0);
    match object[file_start..].rfind('.') {
        // A leading dot (".hidden") is a name, not an extension.
        Some(dot) if dot > 0 => {
            let dot = file_start + dot;
            format!("{}{}{}", &object[..dot], COPY_MARKER, &object[dot..])
        }
        _ => format!("{object}{COPY_MARKER}"),
    }
}

/// Literal substring check, anywhere in the key.
pub fn is_copy(object: &str) -> bool {
    object.contains(COPY_MARKER)
}
