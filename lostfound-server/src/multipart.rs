//! Submission form parsing
//!
//! Create endpoints accept either `multipart/form-data` (text fields plus
//! media files) or a JSON object of text fields. Both are normalised into a
//! [`SubmissionForm`].

use std::collections::HashMap;

use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use lostfound_core::{ClaimSubmission, ItemDraft, MediaKind, MediaUpload};

use crate::error::ApiError;
use crate::validation::{media_kind_from_content_type, validate_content_type, validate_file_size};

/// How a multipart field carrying a file is interpreted.
#[derive(Debug, Clone, Copy)]
pub enum FileSlot {
    /// Always an image
    Image,
    /// Always a video
    Video,
    /// Image or video, decided by the part's Content-Type
    Any,
}

/// File fields of the item report forms
pub const ITEM_FILE_FIELDS: &[(&str, FileSlot)] = &[
    ("images", FileSlot::Image),
    ("image", FileSlot::Image),
    ("video", FileSlot::Video),
];

/// File fields of the claim form
pub const CLAIM_FILE_FIELDS: &[(&str, FileSlot)] = &[
    ("proof_images", FileSlot::Image),
    ("proof_media", FileSlot::Any),
    ("proof_video", FileSlot::Video),
];

/// Represents a file uploaded via multipart form
#[derive(Debug, Clone)]
pub struct FileField {
    /// File data bytes
    pub data: Vec<u8>,
    /// Content-Type from the multipart field (if provided)
    pub content_type: Option<String>,
    /// Original filename from the multipart field (if provided)
    pub file_name: Option<String>,
    /// Media kind implied by the field
    pub kind: MediaKind,
}

impl From<FileField> for MediaUpload {
    fn from(file: FileField) -> Self {
        MediaUpload {
            kind: file.kind,
            data: file.data,
            content_type: file.content_type,
            file_name: file.file_name,
        }
    }
}

/// Parsed text fields and files of a create request
#[derive(Debug, Default)]
pub struct SubmissionForm {
    /// Files in submission order
    files: Vec<FileField>,
    /// Text fields indexed by name
    text_fields: HashMap<String, String>,
}

impl SubmissionForm {
    /// Parse a multipart or JSON request body.
    pub async fn extract<S: Send + Sync>(
        req: Request,
        state: &S,
        file_fields: &[(&str, FileSlot)],
        max_file_size: usize,
    ) -> Result<Self, ApiError> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?;
            Self::parse_multipart(&mut multipart, file_fields, max_file_size).await
        } else if content_type.starts_with("application/json") {
            let Json(body) = Json::<HashMap<String, serde_json::Value>>::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))?;
            Ok(Self::from_json(body))
        } else {
            Err(ApiError::bad_request(
                "Content-Type must be multipart/form-data or application/json",
            ))
        }
    }

    /// Parse all fields from a multipart request
    pub async fn parse_multipart(
        multipart: &mut Multipart,
        file_fields: &[(&str, FileSlot)],
        max_file_size: usize,
    ) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to parse multipart: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();
            let slot = file_fields
                .iter()
                .find(|(field_name, _)| *field_name == name)
                .map(|(_, slot)| *slot);

            match slot {
                Some(slot) => {
                    let content_type = field.content_type().map(|s| s.to_string());
                    let file_name = field.file_name().map(|s| s.to_string());
                    validate_content_type(content_type.as_deref())?;

                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?
                        .to_vec();
                    validate_file_size(data.len(), max_file_size)?;

                    let kind = match slot {
                        FileSlot::Image => MediaKind::Image,
                        FileSlot::Video => MediaKind::Video,
                        FileSlot::Any => media_kind_from_content_type(content_type.as_deref()),
                    };

                    form.files.push(FileField {
                        data,
                        content_type,
                        file_name,
                        kind,
                    });
                }
                None => {
                    let value = field.text().await.map_err(|e| {
                        ApiError::bad_request(format!("Failed to read field '{}': {}", name, e))
                    })?;
                    form.text_fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// Text fields from a JSON object; numbers and booleans are kept as text.
    pub fn from_json(body: HashMap<String, serde_json::Value>) -> Self {
        let text_fields = body
            .into_iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((key, text))
            })
            .collect();

        Self {
            files: Vec::new(),
            text_fields,
        }
    }

    /// Get a text field value
    ///
    /// Returns `None` if the field is not present.
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.text_fields.get(name).map(|s| s.as_str())
    }

    fn owned(&self, name: &str) -> Option<String> {
        self.get_text(name).map(str::to_string)
    }

    /// Split into item report fields and media.
    pub fn into_item_draft(self) -> (ItemDraft, Vec<MediaUpload>) {
        let draft = ItemDraft {
            title: self.owned("title"),
            description: self.owned("description"),
            category: self.owned("category"),
            location: self.owned("location"),
            date: self.owned("date"),
            image_url: self.owned("image_url"),
        };
        (draft, self.files.into_iter().map(Into::into).collect())
    }

    /// Convert into a claim submission.
    pub fn into_claim_submission(self) -> ClaimSubmission {
        ClaimSubmission {
            item_type: self.owned("item_type"),
            item_id: self.owned("item_id"),
            verification_details: self.owned("verification_details"),
            proof: self.files.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_keeps_scalars_as_text() {
        let body: HashMap<String, serde_json::Value> = serde_json::from_value(serde_json::json!({
            "item_type": "found",
            "item_id": 42,
            "urgent": true,
            "tags": ["a", "b"],
        }))
        .unwrap();

        let form = SubmissionForm::from_json(body);
        assert_eq!(form.get_text("item_type"), Some("found"));
        assert_eq!(form.get_text("item_id"), Some("42"));
        assert_eq!(form.get_text("urgent"), Some("true"));
        assert_eq!(form.get_text("tags"), None);
    }

    #[test]
    fn test_into_claim_submission() {
        let mut form = SubmissionForm::default();
        form.text_fields
            .insert("item_type".to_string(), "lost".to_string());
        form.files.push(FileField {
            data: vec![1, 2, 3],
            content_type: Some("image/jpeg".to_string()),
            file_name: Some("proof.jpg".to_string()),
            kind: MediaKind::Image,
        });

        let submission = form.into_claim_submission();
        assert_eq!(submission.item_type.as_deref(), Some("lost"));
        assert_eq!(submission.proof.len(), 1);
        assert_eq!(submission.proof[0].kind, MediaKind::Image);
    }

    #[test]
    fn test_into_item_draft() {
        let mut form = SubmissionForm::default();
        form.text_fields
            .insert("title".to_string(), "Keys".to_string());
        form.text_fields
            .insert("date".to_string(), "2026-09-30".to_string());

        let (draft, media) = form.into_item_draft();
        assert_eq!(draft.title.as_deref(), Some("Keys"));
        assert_eq!(draft.date.as_deref(), Some("2026-09-30"));
        assert!(media.is_empty());
    }
}
