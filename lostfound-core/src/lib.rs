//! Lost & Found core - item registry and claim lifecycle engine
//!
//! Users report lost or found items, other users file claims with proof media
//! against them, and administrators move claims through a fixed state
//! machine. Item status only ever changes as a side effect of a claim
//! transition.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use lostfound_core::{
//!     ClaimEngine, ClaimSubmission, ItemDraft, ItemRegistry, LedgerStore, MediaBatch,
//!     MediaUpload, MemoryStore, MockUploader,
//! };
//!
//! # async fn example(owner: uuid::Uuid, claimer: uuid::Uuid) -> lostfound_core::Result<()> {
//! let store: Arc<dyn LedgerStore> = Arc::new(MemoryStore::new());
//! let media = MediaBatch::new(Arc::new(MockUploader::new()), "demo", Duration::from_secs(30));
//!
//! let items = ItemRegistry::new(store.clone(), media.clone());
//! let claims = ClaimEngine::new(store, media);
//!
//! let lost = items
//!     .create_lost_item(owner, ItemDraft { title: Some("Wallet".into()), ..Default::default() }, vec![])
//!     .await?;
//!
//! let claim = claims
//!     .create_claim(claimer, ClaimSubmission {
//!         item_type: Some("lost".into()),
//!         item_id: Some(lost.id.to_string()),
//!         verification_details: Some("Brown leather, initials J.D.".into()),
//!         proof: vec![MediaUpload::image(std::fs::read("wallet.jpg").unwrap_or_default())],
//!     })
//!     .await?;
//! # let _ = claim;
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod claim;
pub mod engine;
pub mod error;
pub mod item;
pub mod media;
pub mod registry;
pub mod storage;
pub mod upload;
pub mod validation;
pub mod view;

// Re-export main types for convenience
pub use access::{Access, Role, UpsertUser, User};
pub use claim::{Claim, ClaimDecision, ClaimFilter, ClaimStatus, ClaimSubmission, ClaimTransition, NewClaim};
pub use engine::{ClaimEngine, ClaimQuery};
pub use error::{ErrorKind, LedgerError, Result};
pub use item::{Item, ItemDraft, ItemFilter, ItemKind, ItemRef, ItemStatus, NewItem};
pub use media::{MediaAttachment, MediaKind, MediaOwner, MediaUpload, NewMedia};
pub use registry::{ItemQuery, ItemRegistry};
pub use storage::{LedgerStore, MemoryStore, StoreError, StoreResult};
pub use upload::{MediaBatch, MediaUploader, MockUploader, PrimaryRule, StoredObject, UploadError};
pub use view::{ClaimMediaView, ClaimView, ItemView, MediaView, Visibility};
