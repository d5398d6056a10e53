//! Upload checks applied to each multipart file before it reaches the
//! media uploader.

use lostfound_core::MediaKind;

use crate::error::ApiError;

/// What a declared Content-Type says about a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclaredType {
    Image,
    Video,
    /// `application/octet-stream` or no Content-Type at all
    Opaque,
}

fn declared_type(content_type: Option<&str>) -> Option<DeclaredType> {
    let Some(ct) = content_type else {
        return Some(DeclaredType::Opaque);
    };
    let essence = ct
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence.starts_with("image/") {
        Some(DeclaredType::Image)
    } else if essence.starts_with("video/") {
        Some(DeclaredType::Video)
    } else if essence == "application/octet-stream" {
        Some(DeclaredType::Opaque)
    } else {
        None
    }
}

/// Reject anything that is not an image, a video or opaque binary data.
pub fn validate_content_type(content_type: Option<&str>) -> Result<(), ApiError> {
    match declared_type(content_type) {
        Some(_) => Ok(()),
        None => Err(ApiError::bad_request(format!(
            "Unsupported file type '{}'. Only images and videos can be attached",
            content_type.unwrap_or_default()
        ))),
    }
}

pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ApiError> {
    if size == 0 {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }
    if size > max_size {
        return Err(ApiError::bad_request(format!(
            "File is {:.1} MB, the limit is {} MB",
            size as f64 / (1024.0 * 1024.0),
            max_size / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Media kind of a file sent through a field that takes either kind.
/// Only an explicit `video/*` type makes it a video.
pub fn media_kind_from_content_type(content_type: Option<&str>) -> MediaKind {
    match declared_type(content_type) {
        Some(DeclaredType::Video) => MediaKind::Video,
        _ => MediaKind::Image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_images_and_videos_accepted() {
        assert!(validate_content_type(Some("image/jpeg")).is_ok());
        assert!(validate_content_type(Some("IMAGE/HEIC")).is_ok());
        assert!(validate_content_type(Some("video/mp4")).is_ok());
        assert!(validate_content_type(Some("video/quicktime; codecs=avc1")).is_ok());
    }

    #[test]
    fn test_opaque_uploads_accepted() {
        assert!(validate_content_type(Some("application/octet-stream")).is_ok());
        assert!(validate_content_type(None).is_ok());
    }

    #[test]
    fn test_other_types_rejected() {
        for ct in ["audio/mpeg", "text/html", "application/pdf", "application/json"] {
            let err = validate_content_type(Some(ct)).unwrap_err();
            assert!(err.to_string().contains(ct));
        }
    }

    #[test]
    fn test_file_size_bounds() {
        let max = 10 * 1024 * 1024;
        assert!(validate_file_size(1024, max).is_ok());
        assert!(validate_file_size(max, max).is_ok());
        assert!(validate_file_size(0, max).is_err());

        let err = validate_file_size(max + 512 * 1024, max).unwrap_err();
        assert_eq!(err.to_string(), "File is 10.5 MB, the limit is 10 MB");
    }

    #[test]
    fn test_media_kind_from_content_type() {
        assert_eq!(media_kind_from_content_type(Some("video/webm")), MediaKind::Video);
        assert_eq!(media_kind_from_content_type(Some("image/png")), MediaKind::Image);
        assert_eq!(
            media_kind_from_content_type(Some("application/octet-stream")),
            MediaKind::Image
        );
        assert_eq!(media_kind_from_content_type(None), MediaKind::Image);
    }
}
