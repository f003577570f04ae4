//! Photo file validation
//!
//! Files are checked by their declared MIME type and size before anything is
//! previewed or uploaded. The bytes are not sniffed.

use crate::error::ValidationError;

/// Maximum photo size (10 MiB)
pub const MAX_PHOTO_SIZE_BYTES: u64 = 10 * 1024 * 1024;

pub const ALLOWED_PHOTO_CONTENT_TYPES: &[&str] =
    &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Size and type limits for child photos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoPolicy {
    pub max_size_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

impl Default for PhotoPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: MAX_PHOTO_SIZE_BYTES,
            allowed_content_types: ALLOWED_PHOTO_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Validate a photo by declared content type and size.
pub fn validate_photo_file(
    content_type: &str,
    size_bytes: u64,
    policy: &PhotoPolicy,
) -> Result<(), ValidationError> {
    // Drop parameters such as "; charset=binary"
    let normalized = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    if !policy
        .allowed_content_types
        .iter()
        .any(|allowed| *allowed == normalized)
    {
        return Err(ValidationError::UnsupportedFileType {
            content_type: content_type.to_string(),
        });
    }

    if size_bytes > policy.max_size_bytes {
        return Err(ValidationError::FileTooLarge {
            actual_size_mb: size_bytes as f64 / (1024.0 * 1024.0),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_boundary() {
        let policy = PhotoPolicy::default();
        assert!(validate_photo_file("image/png", MAX_PHOTO_SIZE_BYTES, &policy).is_ok());

        let err = validate_photo_file("image/png", MAX_PHOTO_SIZE_BYTES + 1, &policy).unwrap_err();
        assert_eq!(err.reason(), "file-too-large");
        match err {
            ValidationError::FileTooLarge { actual_size_mb } => {
                assert!(actual_size_mb > 10.0 && actual_size_mb < 10.001)
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn declared_type_must_be_allowed() {
        let policy = PhotoPolicy::default();
        for ct in ["image/jpeg", "image/jpg", "IMAGE/PNG", "image/webp; q=1"] {
            assert!(validate_photo_file(ct, 1024, &policy).is_ok(), "{}", ct);
        }
        let err = validate_photo_file("image/gif", 1024, &policy).unwrap_err();
        assert_eq!(err.reason(), "unsupported-file-type");
        assert!(validate_photo_file("application/pdf", 1, &policy).is_err());
    }
}
