//! Ledger storage
//!
//! The [`LedgerStore`] trait is the only shared mutable state in the system.
//! Every operation that touches more than one record is a single trait call,
//! so each backend can make it atomic in its own way:
//! - **PostgreSQL** (server crate): one sqlx transaction per call, with the
//!   partial unique index `claims_one_pending_per_claimer` as the duplicate
//!   guard.
//! - **Memory** ([`MemoryStore`]): one write guard per call, validating before
//!   mutating. Used in tests and as the development fallback when no
//!   `DATABASE_URL` is configured.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::access::{UpsertUser, User};
use crate::claim::{Claim, ClaimFilter, ClaimStatus, ClaimTransition, NewClaim};
use crate::item::{Item, ItemFilter, ItemKind, ItemRef, ItemStatus, NewItem};
use crate::media::{MediaAttachment, MediaOwner, NewMedia};

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("A pending claim already exists for this item and claimer")]
    DuplicatePending,

    #[error("Item is {0} and cannot be claimed")]
    ItemUnavailable(ItemStatus),

    #[error("Item {0} does not exist")]
    ItemMissing(ItemRef),

    #[error("Claim status is no longer the observed one (now {0})")]
    StaleStatus(ClaimStatus),

    #[error("Email is already in use")]
    EmailTaken,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence backend for users, items, claims and media.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Insert or refresh a user. An existing admin is never demoted.
    async fn upsert_user(&self, user: UpsertUser) -> StoreResult<User>;

    /// Insert an item and its media atomically.
    async fn insert_item(&self, item: NewItem, media: Vec<NewMedia>) -> StoreResult<Item>;

    async fn find_item(&self, item: ItemRef) -> StoreResult<Option<Item>>;

    /// Items of one kind matching `filter`, newest first.
    async fn list_items(&self, kind: ItemKind, filter: &ItemFilter) -> StoreResult<Vec<Item>>;

    /// Insert a pending claim and its proof media atomically.
    ///
    /// Re-checks that the item exists and is claimable, and fails with
    /// [`StoreError::DuplicatePending`] if the claimer already holds a pending
    /// claim on the item.
    async fn insert_claim(&self, claim: NewClaim, media: Vec<NewMedia>) -> StoreResult<Claim>;

    async fn find_claim(&self, id: Uuid) -> StoreResult<Option<Claim>>;

    /// Claims matching `filter`, newest first.
    async fn list_claims(&self, filter: &ClaimFilter) -> StoreResult<Vec<Claim>>;

    /// Apply a claim status change together with its item effect.
    ///
    /// The claim is only updated while its status still equals
    /// `transition.from`. A `Claimed` effect on a closed item fails with
    /// [`StoreError::ItemUnavailable`]; a missing item fails with
    /// [`StoreError::ItemMissing`]. Any failure leaves both records untouched.
    async fn apply_transition(&self, transition: ClaimTransition) -> StoreResult<(Claim, Option<Item>)>;

    /// Attachments of one owner, primary first then creation order.
    async fn media_for(&self, owner: MediaOwner) -> StoreResult<Vec<MediaAttachment>>;

    async fn health_check(&self) -> StoreResult<()>;

    /// Whether data survives a restart.
    fn is_persistent(&self) -> bool;
}
