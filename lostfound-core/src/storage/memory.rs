//! In-memory ledger store
//!
//! Records are kept in insertion order, which is also creation order, so
//! listings iterate in reverse for newest first. Each mutation takes the
//! write guard once and checks every precondition before touching anything.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{LedgerStore, StoreError, StoreResult};
use crate::access::{Role, UpsertUser, User};
use crate::claim::{Claim, ClaimFilter, ClaimStatus, ClaimTransition, NewClaim};
use crate::item::{Item, ItemFilter, ItemKind, ItemRef, ItemStatus, NewItem};
use crate::media::{display_order, MediaAttachment, MediaOwner, NewMedia};

#[derive(Default)]
struct State {
    users: Vec<User>,
    items: Vec<Item>,
    claims: Vec<Claim>,
    media: Vec<MediaAttachment>,
}

impl State {
    fn item_index(&self, item: ItemRef) -> Option<usize> {
        self.items
            .iter()
            .position(|i| i.kind == item.kind() && i.id == item.id())
    }

    fn attach(&mut self, media: Vec<NewMedia>) {
        let now = Utc::now();
        self.media.extend(media.into_iter().map(|m| MediaAttachment {
            id: m.id,
            owner: m.owner,
            kind: m.kind,
            url: m.url,
            preview_url: m.preview_url,
            provider_id: m.provider_id,
            format: m.format,
            is_primary: m.is_primary,
            position: m.position,
            created_at: now,
        }));
    }
}

/// Ledger store backed by process memory. Data is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of claims currently stored, for tests and diagnostics.
    pub async fn claim_count(&self) -> usize {
        self.state.read().await.claims.len()
    }

    /// Number of media attachments currently stored.
    pub async fn media_count(&self) -> usize {
        self.state.read().await.media.len()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn upsert_user(&self, user: UpsertUser) -> StoreResult<User> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        if state
            .users
            .iter()
            .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::EmailTaken);
        }

        if let Some(existing) = state.users.iter_mut().find(|u| u.id == user.id) {
            existing.email = user.email;
            if user.name.is_some() {
                existing.name = user.name;
            }
            if user.grant_admin {
                existing.role = Role::Admin;
            }
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let created = User {
            id: user.id,
            email: user.email,
            name: user.name,
            role: if user.grant_admin { Role::Admin } else { Role::User },
            created_at: now,
            updated_at: now,
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn insert_item(&self, item: NewItem, media: Vec<NewMedia>) -> StoreResult<Item> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let created = Item {
            id: item.id,
            kind: item.kind,
            owner_id: item.owner_id,
            title: item.title,
            description: item.description,
            category: item.category,
            location: item.location,
            date: item.date,
            status: item.kind.initial_status(),
            created_at: now,
            updated_at: now,
        };
        state.items.push(created.clone());
        state.attach(media);
        Ok(created)
    }

    async fn find_item(&self, item: ItemRef) -> StoreResult<Option<Item>> {
        let state = self.state.read().await;
        Ok(state.item_index(item).map(|idx| state.items[idx].clone()))
    }

    async fn list_items(&self, kind: ItemKind, filter: &ItemFilter) -> StoreResult<Vec<Item>> {
        let state = self.state.read().await;
        Ok(state
            .items
            .iter()
            .rev()
            .filter(|i| i.kind == kind && filter.matches(i))
            .cloned()
            .collect())
    }

    async fn insert_claim(&self, claim: NewClaim, media: Vec<NewMedia>) -> StoreResult<Claim> {
        let mut state = self.state.write().await;

        let idx = state
            .item_index(claim.item)
            .ok_or(StoreError::ItemMissing(claim.item))?;
        let item_status = state.items[idx].status;
        if !item_status.is_claimable() {
            return Err(StoreError::ItemUnavailable(item_status));
        }
        if state.claims.iter().any(|c| {
            c.item == claim.item
                && c.claimer_id == claim.claimer_id
                && c.status == ClaimStatus::Pending
        }) {
            return Err(StoreError::DuplicatePending);
        }

        let now = Utc::now();
        let created = Claim {
            id: claim.id,
            item: claim.item,
            claimer_id: claim.claimer_id,
            status: ClaimStatus::Pending,
            verification_details: claim.verification_details,
            claimed_at: now,
            created_at: now,
            updated_at: now,
        };
        state.claims.push(created.clone());
        state.attach(media);
        Ok(created)
    }

    async fn find_claim(&self, id: Uuid) -> StoreResult<Option<Claim>> {
        let state = self.state.read().await;
        Ok(state.claims.iter().find(|c| c.id == id).cloned())
    }

    async fn list_claims(&self, filter: &ClaimFilter) -> StoreResult<Vec<Claim>> {
        let state = self.state.read().await;
        Ok(state
            .claims
            .iter()
            .rev()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }

    async fn apply_transition(
        &self,
        transition: ClaimTransition,
    ) -> StoreResult<(Claim, Option<Item>)> {
        let mut state = self.state.write().await;

        let claim_idx = state
            .claims
            .iter()
            .position(|c| c.id == transition.claim_id)
            .ok_or_else(|| StoreError::Query(format!("claim {} vanished", transition.claim_id)))?;
        let current = state.claims[claim_idx].status;
        if current != transition.from {
            return Err(StoreError::StaleStatus(current));
        }

        let item_idx = match transition.item_status {
            Some(target) => {
                let idx = state
                    .item_index(transition.item)
                    .ok_or(StoreError::ItemMissing(transition.item))?;
                let item_status = state.items[idx].status;
                if target == ItemStatus::Claimed && item_status == ItemStatus::Closed {
                    return Err(StoreError::ItemUnavailable(item_status));
                }
                Some((idx, target))
            }
            None => None,
        };

        let now = Utc::now();
        let item = item_idx.map(|(idx, target)| {
            let item = &mut state.items[idx];
            item.status = target;
            item.updated_at = now;
            item.clone()
        });

        let claim = &mut state.claims[claim_idx];
        claim.status = transition.to;
        if transition.verification_details.is_some() {
            claim.verification_details = transition.verification_details;
        }
        claim.updated_at = now;

        Ok((claim.clone(), item))
    }

    async fn media_for(&self, owner: MediaOwner) -> StoreResult<Vec<MediaAttachment>> {
        let state = self.state.read().await;
        let mut media: Vec<MediaAttachment> = state
            .media
            .iter()
            .filter(|m| m.owner == owner)
            .cloned()
            .collect();
        display_order(&mut media);
        Ok(media)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        false
    }
}
