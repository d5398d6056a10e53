//! Caller-facing representations of items, claims and media.
//!
//! Every attachment has a blurred preview URL and a secure original URL. The
//! preview is always serialized; the original only under
//! [`Visibility::Secure`]. Proof photos can carry identifying details, and a
//! claimant who saw the original could fabricate matching "proof".

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::claim::{Claim, ClaimStatus};
use crate::item::{Item, ItemKind, ItemStatus};
use crate::media::{MediaAttachment, MediaKind};

/// Whether secure media URLs may be shown to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Redacted,
    Secure,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MediaView {
    pub id: Uuid,
    pub media_type: MediaKind,
    /// Blurred preview, always present
    pub preview_url: String,
    /// Original, only for privileged callers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub format: Option<String>,
    pub is_primary: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl MediaView {
    pub fn new(media: &MediaAttachment, visibility: Visibility) -> Self {
        Self {
            id: media.id,
            media_type: media.kind,
            preview_url: media.preview_url.clone(),
            url: match visibility {
                Visibility::Secure => Some(media.url.clone()),
                Visibility::Redacted => None,
            },
            format: media.format.clone(),
            is_primary: media.is_primary,
            position: media.position,
            created_at: media.created_at,
        }
    }

    fn shown_url(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.preview_url)
    }

    /// List view of already display-ordered attachments.
    pub fn list(media: &[MediaAttachment], visibility: Visibility) -> Vec<Self> {
        media.iter().map(|m| Self::new(m, visibility)).collect()
    }
}

/// URL of the primary attachment as the caller may see it.
fn primary_url(media: &[MediaView]) -> Option<String> {
    media
        .iter()
        .find(|m| m.is_primary)
        .map(|m| m.shown_url().to_string())
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ItemView {
    pub id: Uuid,
    pub item_type: ItemKind,
    /// Owner of a lost item or finder of a found item
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub date: Option<NaiveDate>,
    pub status: ItemStatus,
    pub image_url: Option<String>,
    pub media: Vec<MediaView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemView {
    pub fn new(item: &Item, media: &[MediaAttachment], visibility: Visibility) -> Self {
        let media = MediaView::list(media, visibility);
        Self {
            id: item.id,
            item_type: item.kind,
            owner_id: item.owner_id,
            title: item.title.clone(),
            description: item.description.clone(),
            category: item.category.clone(),
            location: item.location.clone(),
            date: item.date,
            status: item.status,
            image_url: primary_url(&media),
            media,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClaimView {
    pub id: Uuid,
    pub item_type: ItemKind,
    pub item_id: Uuid,
    pub claimer_id: Uuid,
    pub status: ClaimStatus,
    pub verification_details: Option<String>,
    pub item_title: Option<String>,
    pub item_status: Option<ItemStatus>,
    pub item_image_url: Option<String>,
    /// Proof media
    pub media: Vec<MediaView>,
    pub item_media: Vec<MediaView>,
    pub claimed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inputs for a [`ClaimView`], with separate visibility for the claim's own
/// proof and the item's media.
pub struct ClaimParts<'a> {
    pub claim: &'a Claim,
    pub proof: &'a [MediaAttachment],
    pub proof_visibility: Visibility,
    pub item: Option<&'a Item>,
    pub item_media: &'a [MediaAttachment],
    pub item_visibility: Visibility,
}

impl ClaimView {
    pub fn new(parts: ClaimParts<'_>) -> Self {
        let ClaimParts {
            claim,
            proof,
            proof_visibility,
            item,
            item_media,
            item_visibility,
        } = parts;
        let item_media = MediaView::list(item_media, item_visibility);

        Self {
            id: claim.id,
            item_type: claim.item.kind(),
            item_id: claim.item.id(),
            claimer_id: claim.claimer_id,
            status: claim.status,
            verification_details: claim.verification_details.clone(),
            item_title: item.map(|i| i.title.clone()),
            item_status: item.map(|i| i.status),
            item_image_url: primary_url(&item_media),
            media: MediaView::list(proof, proof_visibility),
            item_media,
            claimed_at: claim.claimed_at,
            created_at: claim.created_at,
            updated_at: claim.updated_at,
        }
    }
}

/// Administrator view of a claim's proof alongside the claimed item.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClaimMediaView {
    pub claim: ClaimView,
    pub item: ItemView,
}
