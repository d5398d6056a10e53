//! Lost and found item records.
//!
//! Lost and found reports live in separate tables but share one shape. The
//! [`ItemRef`] sum type is how claims and media point at either table: the
//! kind tag selects the table, the id selects the row. There is no storage
//! level foreign key behind it, so every resolution goes through the store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;

/// Which kind of report an item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Reported by its owner as lost
    Lost,
    /// Reported by a finder as found
    Found,
}

impl ItemKind {
    pub const ALL: [ItemKind; 2] = [ItemKind::Lost, ItemKind::Found];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lost => "lost",
            Self::Found => "found",
        }
    }

    /// Status every new item of this kind starts in.
    pub fn initial_status(self) -> ItemStatus {
        match self {
            Self::Lost => ItemStatus::Pending,
            Self::Found => ItemStatus::Available,
        }
    }

    /// Status domain of this kind.
    pub fn statuses(self) -> [ItemStatus; 3] {
        [
            self.initial_status(),
            ItemStatus::Claimed,
            ItemStatus::Closed,
        ]
    }

    pub fn accepts(self, status: ItemStatus) -> bool {
        self.statuses().contains(&status)
    }

    /// Human label used in error messages ("Lost item not found").
    pub fn label(self) -> &'static str {
        match self {
            Self::Lost => "Lost",
            Self::Found => "Found",
        }
    }

    /// Parse a status string and check that it belongs to this kind.
    pub fn parse_status(self, raw: &str) -> Result<ItemStatus, LedgerError> {
        raw.parse::<ItemStatus>()
            .ok()
            .filter(|status| self.accepts(*status))
            .ok_or_else(|| {
                let allowed: Vec<&str> = self.statuses().iter().map(|s| s.as_str()).collect();
                LedgerError::validation(format!("Status must be one of: {}", allowed.join(", ")))
            })
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lost" => Ok(Self::Lost),
            "found" => Ok(Self::Found),
            _ => Err(LedgerError::validation(
                "Item Type must be one of: lost, found",
            )),
        }
    }
}

/// Item status across both kinds.
///
/// `Pending` only exists for lost items and `Available` only for found items;
/// [`ItemKind::accepts`] is the membership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Available,
    Claimed,
    Closed,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Available => "available",
            Self::Claimed => "claimed",
            Self::Closed => "closed",
        }
    }

    /// Whether new claims may still be filed against an item in this status.
    pub fn is_claimable(self) -> bool {
        matches!(self, Self::Pending | Self::Available)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "available" => Ok(Self::Available),
            "claimed" => Ok(Self::Claimed),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown item status '{other}'")),
        }
    }
}

/// Polymorphic reference to a lost or found item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemRef {
    Lost(Uuid),
    Found(Uuid),
}

impl ItemRef {
    pub fn new(kind: ItemKind, id: Uuid) -> Self {
        match kind {
            ItemKind::Lost => Self::Lost(id),
            ItemKind::Found => Self::Found(id),
        }
    }

    pub fn kind(self) -> ItemKind {
        match self {
            Self::Lost(_) => ItemKind::Lost,
            Self::Found(_) => ItemKind::Found,
        }
    }

    pub fn id(self) -> Uuid {
        match self {
            Self::Lost(id) | Self::Found(id) => id,
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// Stored item record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub kind: ItemKind,
    /// Owner for lost items, finder for found items
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub date: Option<NaiveDate>,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn item_ref(&self) -> ItemRef {
        ItemRef::new(self.kind, self.id)
    }
}

/// Raw report fields as submitted by the caller, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    /// Legacy clients send an already-hosted image instead of a file
    pub image_url: Option<String>,
}

/// Validated item ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub id: Uuid,
    pub kind: ItemKind,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Conjunctive listing filter.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    /// Exact match
    pub status: Option<ItemStatus>,
    /// Case-insensitive substring
    pub category: Option<String>,
    /// Case-insensitive substring
    pub location: Option<String>,
    /// Case-insensitive substring over title or description
    pub keyword: Option<String>,
    /// Exact owner/finder match
    pub owner_id: Option<Uuid>,
}

impl ItemFilter {
    /// In-process evaluation of the filter, shared by the memory store and tests.
    pub fn matches(&self, item: &Item) -> bool {
        fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
            haystack
                .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
                .unwrap_or(false)
        }

        if self.status.is_some_and(|s| s != item.status) {
            return false;
        }
        if self.owner_id.is_some_and(|o| o != item.owner_id) {
            return false;
        }
        if let Some(category) = &self.category {
            if !contains_ci(item.category.as_deref(), category) {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if !contains_ci(item.location.as_deref(), location) {
                return false;
            }
        }
        if let Some(keyword) = &self.keyword {
            if !contains_ci(Some(&item.title), keyword)
                && !contains_ci(item.description.as_deref(), keyword)
            {
                return false;
            }
        }
        true
    }
}
