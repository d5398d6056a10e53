//! Media attachments owned by items and claims.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::item::{ItemKind, ItemRef};

/// Media resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    /// Folder segment used by the upload provider.
    pub fn folder_segment(self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Video => "video",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Image => "Image",
            Self::Video => "Video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            other => Err(format!("unknown media type '{other}'")),
        }
    }
}

/// Entity an attachment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaOwner {
    Lost(Uuid),
    Found(Uuid),
    Claim(Uuid),
}

impl MediaOwner {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Lost(_) => "lost",
            Self::Found(_) => "found",
            Self::Claim(_) => "claim",
        }
    }

    pub fn id(self) -> Uuid {
        match self {
            Self::Lost(id) | Self::Found(id) | Self::Claim(id) => id,
        }
    }

    pub fn from_tag(tag: &str, id: Uuid) -> Option<Self> {
        match tag {
            "lost" => Some(Self::Lost(id)),
            "found" => Some(Self::Found(id)),
            "claim" => Some(Self::Claim(id)),
            _ => None,
        }
    }

    /// Top-level folder the provider stores this owner's media under.
    pub fn folder_group(self) -> &'static str {
        match self {
            Self::Lost(_) => "lost_items",
            Self::Found(_) => "found_items",
            Self::Claim(_) => "claims",
        }
    }
}

impl From<ItemRef> for MediaOwner {
    fn from(item: ItemRef) -> Self {
        match item {
            ItemRef::Lost(id) => Self::Lost(id),
            ItemRef::Found(id) => Self::Found(id),
        }
    }
}

impl MediaOwner {
    pub fn for_item(kind: ItemKind, id: Uuid) -> Self {
        ItemRef::new(kind, id).into()
    }
}

/// A file submitted by a caller, not yet uploaded.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub kind: MediaKind,
    pub data: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

impl MediaUpload {
    pub fn image(data: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: MediaKind::Image,
            data: data.into(),
            content_type: None,
            file_name: None,
        }
    }

    pub fn video(data: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: MediaKind::Video,
            data: data.into(),
            content_type: None,
            file_name: None,
        }
    }
}

/// Stored attachment record.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaAttachment {
    pub id: Uuid,
    pub owner: MediaOwner,
    pub kind: MediaKind,
    /// Original (secure) URL
    pub url: String,
    /// Blurred preview URL, safe to show to anyone
    pub preview_url: String,
    pub provider_id: Option<String>,
    pub format: Option<String>,
    pub is_primary: bool,
    /// Submission order within the owner
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// Attachment ready to be inserted alongside its owner.
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub id: Uuid,
    pub owner: MediaOwner,
    pub kind: MediaKind,
    pub url: String,
    pub preview_url: String,
    pub provider_id: Option<String>,
    pub format: Option<String>,
    pub is_primary: bool,
    pub position: i32,
}

/// Order attachments for display: primary first, then creation order.
pub fn display_order(media: &mut [MediaAttachment]) {
    media.sort_by(|a, b| {
        b.is_primary
            .cmp(&a.is_primary)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.position.cmp(&b.position))
    });
}
