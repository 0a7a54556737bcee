//! Uploaded product image storage.
//!
//! Images arrive as multipart fields, are accepted only with the png/jpeg/jpg
//! MIME types, and are written under the configured upload directory with a
//! sanitized name plus a random suffix so repeated uploads of the same file
//! never collide. The stored URL handed back to clients is absolute, built
//! from the configured public base URL.

use std::path::Path;

use rand::{Rng, distr::Alphanumeric};
use thiserror::Error;

use crate::config::ApiConfig;

/// Route prefix under which stored images are served back.
pub const UPLOAD_ROUTE_PREFIX: &str = "/public/uploads";

/// Maximum number of gallery images accepted in one request.
pub const MAX_GALLERY_IMAGES: usize = 10;

/// Allowed image MIME types and their file extensions.
const FILE_TYPE_MAP: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpeg"),
    ("image/jpg", "jpg"),
];

/// Errors from storing uploaded images.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The upload's MIME type is not an accepted image type.
    #[error("invalid image type: {0}")]
    UnsupportedType(String),

    /// The request carried no image file.
    #[error("no image in the request")]
    MissingFile,

    /// More gallery files than allowed.
    #[error("at most {MAX_GALLERY_IMAGES} images per request")]
    TooManyFiles,

    /// Filesystem failure while persisting the image.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes uploaded images to disk and derives their public URLs.
pub struct ImageStore<'a> {
    config: &'a ApiConfig,
}

impl<'a> ImageStore<'a> {
    /// Create a new image store.
    #[must_use]
    pub const fn new(config: &'a ApiConfig) -> Self {
        Self { config }
    }

    /// Persist one uploaded image and return its absolute public URL.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::UnsupportedType` for a MIME type outside the
    /// png/jpeg/jpg allow-list and `UploadError::Io` on filesystem failure.
    pub async fn save(
        &self,
        original_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, UploadError> {
        let extension = extension_for(content_type)
            .ok_or_else(|| UploadError::UnsupportedType(content_type.to_owned()))?;

        let file_name = format!(
            "{}-{}.{}",
            sanitize_file_stem(original_name),
            random_suffix(),
            extension
        );

        tokio::fs::create_dir_all(&self.config.upload_dir).await?;
        tokio::fs::write(self.config.upload_dir.join(&file_name), bytes).await?;

        Ok(format!(
            "{}{}/{}",
            self.config.base_url, UPLOAD_ROUTE_PREFIX, file_name
        ))
    }
}

/// Look up the file extension for an accepted image MIME type.
#[must_use]
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    FILE_TYPE_MAP
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, ext)| *ext)
}

/// Reduce an uploaded file name to a safe stem: the extension is dropped
/// (it is re-derived from the MIME type), spaces become dashes, and anything
/// outside `[A-Za-z0-9._-]` is discarded.
#[must_use]
pub fn sanitize_file_stem(original_name: &str) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    let cleaned: String = stem
        .chars()
        .map(|c| if c == ' ' { '-' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    if cleaned.is_empty() {
        "image".to_owned()
    } else {
        cleaned
    }
}

/// Eight random alphanumeric characters.
fn random_suffix() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(8)
        .map(char::from)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_allowed_types() {
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/jpeg"), Some("jpeg"));
        assert_eq!(extension_for("image/jpg"), Some("jpg"));
    }

    #[test]
    fn test_extension_for_rejected_types() {
        assert_eq!(extension_for("image/gif"), None);
        assert_eq!(extension_for("application/pdf"), None);
        assert_eq!(extension_for("text/html"), None);
    }

    #[test]
    fn test_sanitize_replaces_spaces() {
        assert_eq!(sanitize_file_stem("summer hat.png"), "summer-hat");
    }

    #[test]
    fn test_sanitize_strips_hostile_characters() {
        assert_eq!(sanitize_file_stem("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_stem("a/b\\c?.jpeg"), "bc");
    }

    #[test]
    fn test_sanitize_empty_falls_back() {
        assert_eq!(sanitize_file_stem(""), "image");
        assert_eq!(sanitize_file_stem("???.png"), "image");
    }

    #[test]
    fn test_random_suffix_shape() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(random_suffix(), random_suffix());
    }
}
