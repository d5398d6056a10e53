//! Cloudinary media uploader with retry and backoff.
//!
//! Uploads are signed requests carrying the file as a base64 data URI. Public
//! readers get a blurred derivative: images through `e_blur:120,q_50`, videos
//! through a blurred JPEG poster frame.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use backoff::{future::retry_notify, ExponentialBackoff};
use base64::{engine::general_purpose::STANDARD, Engine};
use lostfound_core::{MediaKind, MediaUploader, StoredObject, UploadError};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tracing::{debug, instrument, warn};

use crate::config::CloudinaryConfig;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";
const DELIVERY_BASE: &str = "https://res.cloudinary.com";

const IMAGE_PREVIEW_TRANSFORM: &str = "e_blur:120,q_50";
const VIDEO_PREVIEW_TRANSFORM: &str = "e_blur:200";

/// Retry tuning for the Cloudinary API.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts for transient errors.
    pub max_retries: u32,
    /// Initial retry interval.
    pub initial_interval: Duration,
    /// Maximum retry interval.
    pub max_interval: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_interval: Duration::from_millis(250),
            max_interval: Duration::from_secs(4),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    #[serde(default)]
    format: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Signed-upload client for one Cloudinary account.
pub struct CloudinaryUploader {
    client: Client,
    credentials: CloudinaryConfig,
    retry: RetryConfig,
}

impl CloudinaryUploader {
    pub fn new(credentials: CloudinaryConfig) -> Result<Self, UploadError> {
        Self::with_retry(credentials, RetryConfig::default())
    }

    pub fn with_retry(credentials: CloudinaryConfig, retry: RetryConfig) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(retry.timeout)
            .https_only(true)
            .build()
            .map_err(|e| UploadError::new(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            credentials,
            retry,
        })
    }

    fn endpoint(&self, kind: MediaKind, action: &str) -> String {
        format!(
            "{API_BASE}/{}/{}/{action}",
            self.credentials.cloud_name,
            resource_type(kind)
        )
    }

    /// Signed form parameters: the given ones plus `api_key` and `signature`.
    fn signed_form(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        let signature = sign(&params, &self.credentials.api_secret);
        params.push(("api_key", self.credentials.api_key.clone()));
        params.push(("signature", signature));
        params
    }

    fn build_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.retry.initial_interval,
            max_interval: self.retry.max_interval,
            max_elapsed_time: Some(self.retry.timeout * self.retry.max_retries),
            ..Default::default()
        }
    }

    /// POST a signed form with retry on transient failures.
    async fn post_signed<R: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&'static str, String)],
    ) -> Result<R, UploadError> {
        retry_notify(
            self.build_backoff(),
            || async move { self.post_once::<R>(url, form).await },
            |err: UploadError, duration: Duration| {
                warn!(
                    error = %err,
                    retry_after_ms = duration.as_millis() as u64,
                    "Retry scheduled"
                );
            },
        )
        .await
    }

    async fn post_once<R: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&'static str, String)],
    ) -> Result<R, backoff::Error<UploadError>> {
        let start = Instant::now();

        let response = self.client.post(url).form(form).send().await.map_err(|e| {
            let latency_ms = start.elapsed().as_millis() as u64;
            if is_transient_error(&e) {
                warn!(error = %e, latency_ms, "Transient error, will retry");
                backoff::Error::transient(UploadError::new(format!("Transient error: {e}")))
            } else {
                warn!(error = %e, latency_ms, "Permanent error, aborting");
                backoff::Error::permanent(UploadError::new(format!("Cloudinary request failed: {e}")))
            }
        })?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if !status.is_success() {
            let detail = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| format!("Cloudinary API returned status: {status}"));
            let err = UploadError::new(detail);
            return if is_transient_status(status) {
                warn!(status = %status, "Transient HTTP status, will retry");
                Err(backoff::Error::transient(err))
            } else {
                warn!(status = %status, "Permanent HTTP error");
                Err(backoff::Error::permanent(err))
            };
        }

        let parsed = response.json::<R>().await.map_err(|e| {
            warn!(error = %e, "Failed to parse JSON response");
            backoff::Error::permanent(UploadError::new(format!(
                "Failed to parse Cloudinary response: {e}"
            )))
        })?;

        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            "Request completed successfully"
        );
        Ok(parsed)
    }
}

#[async_trait]
impl MediaUploader for CloudinaryUploader {
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    async fn upload(
        &self,
        data: &[u8],
        folder: &str,
        kind: MediaKind,
    ) -> Result<StoredObject, UploadError> {
        if data.is_empty() {
            return Err(UploadError::new("Empty file"));
        }

        let mut form = self.signed_form(vec![
            ("folder", folder.to_string()),
            ("overwrite", "false".to_string()),
            ("timestamp", chrono::Utc::now().timestamp().to_string()),
            ("unique_filename", "true".to_string()),
        ]);
        // The file itself is not part of the signature
        form.push(("file", data_uri(data, kind)));

        let uploaded: UploadResponse = self
            .post_signed(&self.endpoint(kind, "upload"), &form)
            .await?;

        debug!(public_id = %uploaded.public_id, "Media stored");

        Ok(StoredObject {
            preview_url: preview_url(
                &self.credentials.cloud_name,
                kind,
                &uploaded.public_id,
                uploaded.format.as_deref(),
            ),
            url: uploaded.secure_url,
            provider_id: Some(uploaded.public_id),
            format: uploaded.format,
        })
    }

    #[instrument(skip(self))]
    async fn discard(&self, provider_id: &str, kind: MediaKind) -> Result<(), UploadError> {
        let form = self.signed_form(vec![
            ("public_id", provider_id.to_string()),
            ("timestamp", chrono::Utc::now().timestamp().to_string()),
        ]);
        let destroyed: DestroyResponse = self
            .post_signed(&self.endpoint(kind, "destroy"), &form)
            .await?;

        if destroyed.result != "ok" {
            warn!(result = %destroyed.result, "Cloudinary did not destroy object");
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cloudinary"
    }
}

fn resource_type(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "image",
        MediaKind::Video => "video",
    }
}

/// Request signature: SHA-1 over the alphabetically sorted `key=value` pairs
/// joined by `&`, followed by the API secret.
pub fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Blurred delivery URL for a stored object.
pub fn preview_url(cloud_name: &str, kind: MediaKind, public_id: &str, format: Option<&str>) -> String {
    match kind {
        MediaKind::Image => {
            let suffix = format.map(|f| format!(".{f}")).unwrap_or_default();
            format!("{DELIVERY_BASE}/{cloud_name}/image/upload/{IMAGE_PREVIEW_TRANSFORM}/{public_id}{suffix}")
        }
        MediaKind::Video => {
            format!("{DELIVERY_BASE}/{cloud_name}/video/upload/{VIDEO_PREVIEW_TRANSFORM}/{public_id}.jpg")
        }
    }
}

/// MIME type from the file signature, falling back to a generic type per kind.
fn sniff_mime(data: &[u8], kind: MediaKind) -> &'static str {
    match data {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        [0x1A, 0x45, 0xDF, 0xA3, ..] => "video/webm",
        [_, _, _, _, b'f', b't', b'y', b'p', b'q', b't', ..] => "video/quicktime",
        [_, _, _, _, b'f', b't', b'y', b'p', ..] => "video/mp4",
        _ => match kind {
            MediaKind::Image => "image/jpeg",
            MediaKind::Video => "video/mp4",
        },
    }
}

fn data_uri(data: &[u8], kind: MediaKind) -> String {
    format!("data:{};base64,{}", sniff_mime(data, kind), STANDARD.encode(data))
}

/// Check if a reqwest error is transient and should be retried.
fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

/// Check if an HTTP status code indicates a transient error.
fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
            | StatusCode::BAD_GATEWAY
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_sorts_params_and_appends_secret() {
        let params = vec![
            ("timestamp", "1315060510".to_string()),
            ("public_id", "sample_image".to_string()),
            ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop".to_string()),
        ];
        // Example from Cloudinary's signature documentation
        assert_eq!(
            sign(&params, "abcd"),
            "bfd09f95f331f558cbd1320e67aa8d488770583e"
        );
    }

    #[test]
    fn test_signature_ignores_empty_values() {
        let with_empty = vec![
            ("timestamp", "1".to_string()),
            ("folder", String::new()),
        ];
        let without = vec![("timestamp", "1".to_string())];
        assert_eq!(sign(&with_empty, "s"), sign(&without, "s"));
    }

    #[test]
    fn test_image_preview_url() {
        let url = preview_url("demo", MediaKind::Image, "lost_found_app/claims/images/abc", Some("png"));
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/e_blur:120,q_50/lost_found_app/claims/images/abc.png"
        );
    }

    #[test]
    fn test_video_preview_is_blurred_poster() {
        let url = preview_url("demo", MediaKind::Video, "clips/v1", Some("mp4"));
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/video/upload/e_blur:200/clips/v1.jpg"
        );
    }

    #[test]
    fn test_sniff_mime() {
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0], MediaKind::Image), "image/jpeg");
        assert_eq!(sniff_mime(b"\x89PNG\r\n", MediaKind::Image), "image/png");
        assert_eq!(sniff_mime(b"\0\0\0\x18ftypmp42", MediaKind::Video), "video/mp4");
        assert_eq!(sniff_mime(b"\0\0\0\x14ftypqt  ", MediaKind::Video), "video/quicktime");
        assert_eq!(sniff_mime(b"????", MediaKind::Video), "video/mp4");
    }

    #[test]
    fn test_data_uri() {
        assert_eq!(data_uri(b"GIF89a", MediaKind::Image), "data:image/gif;base64,R0lGODlh");
    }

    #[test]
    fn test_transient_status_codes() {
        assert!(is_transient_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient_status(StatusCode::BAD_GATEWAY));
        assert!(!is_transient_status(StatusCode::UNAUTHORIZED));
        assert!(!is_transient_status(StatusCode::BAD_REQUEST));
    }
}
