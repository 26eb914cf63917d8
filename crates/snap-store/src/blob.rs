use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Prefix under which item images are uploaded.
pub const IMAGE_PREFIX: &str = "images";

/// Opaque handle returned by a blob upload.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobHandle {
    key: String,
}

impl BlobHandle {
    pub(crate) fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Check that `key` is a relative, `/`-separated path with no empty, `.`
/// or `..` segments and no backslashes.
pub fn validate_blob_key(key: &str) -> StoreResult<()> {
    let invalid = |reason: &str| StoreError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };
    if key.is_empty() {
        return Err(invalid("empty key"));
    }
    if key.contains('\\') || key.contains('\0') {
        return Err(invalid("contains a backslash or NUL"));
    }
    for segment in key.split('/') {
        match segment {
            "" => return Err(invalid("empty path segment")),
            "." | ".." => return Err(invalid("relative path segment")),
            _ => {}
        }
    }
    Ok(())
}

/// Blob key for an uploaded image file: `images/<file_name>`.
///
/// Two uploads with the same file name share a key; the later one wins.
pub fn image_key(file_name: &str) -> StoreResult<String> {
    if file_name.contains('/') {
        return Err(StoreError::InvalidKey {
            key: file_name.to_string(),
            reason: "file name must not contain '/'".into(),
        });
    }
    let key = format!("{IMAGE_PREFIX}/{file_name}");
    validate_blob_key(&key)?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_keys_live_under_images() {
        assert_eq!(image_key("apple.png").unwrap(), "images/apple.png");
    }

    #[test]
    fn traversal_is_rejected() {
        assert!(validate_blob_key("../secret").is_err());
        assert!(validate_blob_key("images/./a").is_err());
        assert!(validate_blob_key("/abs").is_err());
        assert!(validate_blob_key("images//a").is_err());
        assert!(validate_blob_key("a\\b").is_err());
        assert!(image_key("..").is_err());
        assert!(image_key("x/y.png").is_err());
        assert!(image_key("").is_err());
    }

    #[test]
    fn nested_keys_are_fine() {
        assert!(validate_blob_key("images/2024/a.png").is_ok());
    }
}
