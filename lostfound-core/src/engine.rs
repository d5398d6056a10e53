//! Claim engine
//!
//! Creates claims against items, attaches proof media and drives the claim
//! state machine together with the item status it implies. Checks run before
//! any upload, uploads run before any write, and every multi-record write is
//! a single atomic store call.

use std::sync::Arc;

use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::access::Access;
use crate::claim::{
    Claim, ClaimDecision, ClaimFilter, ClaimStatus, ClaimSubmission, ClaimTransition, NewClaim,
};
use crate::error::{LedgerError, Result};
use crate::item::{Item, ItemKind, ItemRef};
use crate::media::{MediaKind, MediaOwner};
use crate::storage::LedgerStore;
use crate::upload::{MediaBatch, PrimaryRule};
use crate::validation::{self, VERIFICATION_DETAILS_MAX};
use crate::view::{ClaimMediaView, ClaimParts, ClaimView, ItemView, Visibility};

/// Raw public listing query.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ClaimQuery {
    pub claimer_id: Option<Uuid>,
    /// pending, verified, returned or rejected
    pub status: Option<String>,
    /// lost or found
    pub item_type: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(validation::sanitize)
        .filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct ClaimEngine {
    store: Arc<dyn LedgerStore>,
    media: MediaBatch,
}

impl ClaimEngine {
    pub fn new(store: Arc<dyn LedgerStore>, media: MediaBatch) -> Self {
        Self { store, media }
    }

    /// File a pending claim with proof media.
    #[instrument(skip(self, submission), fields(proof = submission.proof.len()))]
    pub async fn create_claim(
        &self,
        claimer_id: Uuid,
        submission: ClaimSubmission,
    ) -> Result<ClaimView> {
        let ClaimSubmission {
            item_type,
            item_id,
            verification_details,
            proof,
        } = submission;

        let kind: ItemKind = non_blank(item_type.as_deref())
            .ok_or_else(|| LedgerError::validation("Item Type is required"))?
            .parse()?;
        let item_id = validation::id_field(item_id.as_deref(), "Item ID")?;
        let verification_details = validation::string_field(
            verification_details.as_deref(),
            "Verification Details",
            0,
            VERIFICATION_DETAILS_MAX,
            false,
        )?;
        let item_ref = ItemRef::new(kind, item_id);

        let item = self
            .store
            .find_item(item_ref)
            .await?
            .ok_or_else(|| LedgerError::not_found(format!("{} item not found", kind.label())))?;

        if self.store.find_user(claimer_id).await?.is_none() {
            return Err(LedgerError::not_found("User not found"));
        }

        if !item.status.is_claimable() {
            return Err(LedgerError::ItemUnavailable(item.status));
        }

        if proof.is_empty() {
            return Err(LedgerError::ProofRequired);
        }

        let pending = self
            .store
            .list_claims(&ClaimFilter {
                claimer_id: Some(claimer_id),
                status: Some(ClaimStatus::Pending),
                item_type: Some(kind),
            })
            .await?;
        if pending.iter().any(|c| c.item == item_ref) {
            return Err(LedgerError::DuplicateClaim);
        }

        // Images first, then video, each group in submission order.
        let mut proof = proof;
        proof.sort_by_key(|p| match p.kind {
            MediaKind::Image => 0,
            MediaKind::Video => 1,
        });

        let claim_id = Uuid::new_v4();
        let media = self
            .media
            .upload_all(MediaOwner::Claim(claim_id), proof, PrimaryRule::FirstUpload)
            .await?;

        let new_claim = NewClaim {
            id: claim_id,
            item: item_ref,
            claimer_id,
            verification_details,
        };
        let claim = match self.store.insert_claim(new_claim, media.clone()).await {
            Ok(claim) => claim,
            Err(e) => {
                self.media.discard_all(&media).await;
                let err = LedgerError::from(e);
                tracing::warn!(item = %item_ref, error = %err, "Claim insert refused");
                return Err(err);
            }
        };

        tracing::info!(
            claim_id = %claim.id,
            item = %item_ref,
            media = media.len(),
            "Claim submitted"
        );

        // The claimant just uploaded the proof; the item's media stays blurred.
        self.claim_view(&claim, Visibility::Secure, Visibility::Redacted)
            .await
    }

    /// Administrator decision on a claim.
    #[instrument(skip(self, access, decision))]
    pub async fn verify_claim(
        &self,
        access: &Access,
        claim_id: Uuid,
        decision: ClaimDecision,
    ) -> Result<ClaimView> {
        let admin = access.require_admin()?;

        let claim = self
            .store
            .find_claim(claim_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Claim not found"))?;

        let target = match non_blank(decision.status.as_deref()) {
            Some(raw) => ClaimStatus::parse_decision(&raw)?,
            None => return Err(LedgerError::validation("Status is required")),
        };
        claim.status.transition_to(target)?;

        let verification_details = validation::string_field(
            decision.verification_details.as_deref(),
            "Verification Details",
            0,
            VERIFICATION_DETAILS_MAX,
            false,
        )?;

        let (updated, item) = self
            .store
            .apply_transition(ClaimTransition {
                claim_id: claim.id,
                from: claim.status,
                to: target,
                verification_details,
                item: claim.item,
                item_status: target.item_effect(),
            })
            .await?;

        tracing::info!(
            claim_id = %updated.id,
            admin_id = %admin.id,
            from = %claim.status,
            to = %updated.status,
            item_status = ?item.as_ref().map(|i| i.status),
            "Claim status changed"
        );

        self.claim_view(&updated, Visibility::Redacted, Visibility::Redacted)
            .await
    }

    /// Public, read-only claim listing.
    pub async fn list_claims(&self, query: ClaimQuery) -> Result<Vec<ClaimView>> {
        if let Some(claimer_id) = query.claimer_id {
            if self.store.find_user(claimer_id).await?.is_none() {
                return Err(LedgerError::not_found("User not found"));
            }
        }
        let status = match non_blank(query.status.as_deref()) {
            Some(raw) => Some(ClaimStatus::parse_filter(&raw)?),
            None => None,
        };
        let item_type = match non_blank(query.item_type.as_deref()) {
            Some(raw) => Some(raw.parse::<ItemKind>()?),
            None => None,
        };

        self.views(&ClaimFilter {
            claimer_id: query.claimer_id,
            status,
            item_type,
        })
        .await
    }

    /// Every claim, for administrators.
    pub async fn list_all_claims(
        &self,
        access: &Access,
        status: Option<&str>,
    ) -> Result<Vec<ClaimView>> {
        access.require_admin()?;
        let status = match non_blank(status) {
            Some(raw) => Some(ClaimStatus::parse_filter(&raw)?),
            None => None,
        };
        self.views(&ClaimFilter {
            status,
            ..Default::default()
        })
        .await
    }

    pub async fn get_claim(&self, claim_id: Uuid) -> Result<ClaimView> {
        let claim = self.find_claim(claim_id).await?;
        self.claim_view(&claim, Visibility::Redacted, Visibility::Redacted)
            .await
    }

    /// Claim proof and item media with original URLs, for administrators.
    pub async fn get_claim_media(&self, access: &Access, claim_id: Uuid) -> Result<ClaimMediaView> {
        let admin = access.require_admin()?;
        let claim = self.find_claim(claim_id).await?;
        let item = self
            .store
            .find_item(claim.item)
            .await?
            .ok_or_else(|| LedgerError::not_found("Associated item not found"))?;

        let proof = self.store.media_for(MediaOwner::Claim(claim.id)).await?;
        let item_media = self.store.media_for(claim.item.into()).await?;

        tracing::debug!(claim_id = %claim.id, admin_id = %admin.id, "Secure claim media served");

        Ok(ClaimMediaView {
            claim: ClaimView::new(ClaimParts {
                claim: &claim,
                proof: &proof,
                proof_visibility: Visibility::Secure,
                item: Some(&item),
                item_media: &item_media,
                item_visibility: Visibility::Secure,
            }),
            item: ItemView::new(&item, &item_media, Visibility::Secure),
        })
    }

    async fn find_claim(&self, claim_id: Uuid) -> Result<Claim> {
        self.store
            .find_claim(claim_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Claim not found"))
    }

    async fn views(&self, filter: &ClaimFilter) -> Result<Vec<ClaimView>> {
        let claims = self.store.list_claims(filter).await?;
        let mut views = Vec::with_capacity(claims.len());
        for claim in &claims {
            views.push(
                self.claim_view(claim, Visibility::Redacted, Visibility::Redacted)
                    .await?,
            );
        }
        Ok(views)
    }

    async fn claim_view(
        &self,
        claim: &Claim,
        proof_visibility: Visibility,
        item_visibility: Visibility,
    ) -> Result<ClaimView> {
        let item: Option<Item> = self.store.find_item(claim.item).await?;
        let proof = self.store.media_for(MediaOwner::Claim(claim.id)).await?;
        let item_media = match &item {
            Some(_) => self.store.media_for(claim.item.into()).await?,
            None => Vec::new(),
        };

        Ok(ClaimView::new(ClaimParts {
            claim,
            proof: &proof,
            proof_visibility,
            item: item.as_ref(),
            item_media: &item_media,
            item_visibility,
        }))
    }
}

impl std::fmt::Debug for ClaimEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimEngine")
            .field("media", &self.media)
            .finish_non_exhaustive()
    }
}
