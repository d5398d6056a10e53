//! Item registry: lost and found reports.

use std::sync::Arc;

use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{LedgerError, Result};
use crate::item::{Item, ItemDraft, ItemFilter, ItemKind, ItemRef, NewItem};
use crate::media::{MediaKind, MediaOwner, MediaUpload, NewMedia};
use crate::storage::LedgerStore;
use crate::upload::{MediaBatch, PrimaryRule};
use crate::validation::{self, CATEGORY_MAX, DESCRIPTION_MAX, LOCATION_MAX, TITLE_MAX};
use crate::view::{ItemView, Visibility};

/// Raw listing query, validated against the item kind.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ItemQuery {
    /// Exact status; must belong to the item kind
    pub status: Option<String>,
    /// Case-insensitive substring
    pub category: Option<String>,
    /// Case-insensitive substring
    pub location: Option<String>,
    /// Matches title or description
    pub keyword: Option<String>,
    /// Owner (lost) or finder (found) id
    pub user_id: Option<Uuid>,
}

impl ItemQuery {
    fn into_filter(self, kind: ItemKind) -> Result<ItemFilter> {
        let text = |v: Option<String>| {
            v.map(|s| validation::sanitize(&s))
                .filter(|s| !s.is_empty())
        };
        let status = match text(self.status) {
            Some(raw) => Some(kind.parse_status(&raw)?),
            None => None,
        };
        Ok(ItemFilter {
            status,
            category: text(self.category),
            location: text(self.location),
            keyword: text(self.keyword),
            owner_id: self.user_id,
        })
    }
}

#[derive(Clone)]
pub struct ItemRegistry {
    store: Arc<dyn LedgerStore>,
    media: MediaBatch,
}

impl ItemRegistry {
    pub fn new(store: Arc<dyn LedgerStore>, media: MediaBatch) -> Self {
        Self { store, media }
    }

    pub async fn create_lost_item(
        &self,
        owner_id: Uuid,
        draft: ItemDraft,
        uploads: Vec<MediaUpload>,
    ) -> Result<ItemView> {
        self.create_item(ItemKind::Lost, owner_id, draft, uploads).await
    }

    pub async fn create_found_item(
        &self,
        finder_id: Uuid,
        draft: ItemDraft,
        uploads: Vec<MediaUpload>,
    ) -> Result<ItemView> {
        self.create_item(ItemKind::Found, finder_id, draft, uploads)
            .await
    }

    #[instrument(skip(self, draft, uploads), fields(uploads = uploads.len()))]
    async fn create_item(
        &self,
        kind: ItemKind,
        owner_id: Uuid,
        draft: ItemDraft,
        uploads: Vec<MediaUpload>,
    ) -> Result<ItemView> {
        let title = validation::required_field(draft.title.as_deref(), "Title", 1, TITLE_MAX)?;
        let description = validation::string_field(
            draft.description.as_deref(),
            "Description",
            0,
            DESCRIPTION_MAX,
            false,
        )?;
        let category =
            validation::string_field(draft.category.as_deref(), "Category", 0, CATEGORY_MAX, false)?;
        let location =
            validation::string_field(draft.location.as_deref(), "Location", 0, LOCATION_MAX, false)?;
        let date = validation::date_field(draft.date.as_deref())?;
        let legacy_url = validation::url_field(draft.image_url.as_deref())?;

        if self.store.find_user(owner_id).await?.is_none() {
            return Err(LedgerError::not_found("User not found"));
        }

        let id = Uuid::new_v4();
        let owner = MediaOwner::for_item(kind, id);
        let has_image_file = uploads.iter().any(|u| u.kind == MediaKind::Image);
        let mut media = self
            .media
            .upload_all(owner, uploads, PrimaryRule::FirstImage)
            .await?;

        if let (false, Some(url)) = (has_image_file, legacy_url) {
            media.push(NewMedia {
                id: Uuid::new_v4(),
                owner,
                kind: MediaKind::Image,
                preview_url: url.clone(),
                url,
                provider_id: None,
                format: None,
                is_primary: true,
                position: media.len() as i32,
            });
        }

        let new_item = NewItem {
            id,
            kind,
            owner_id,
            title,
            description,
            category,
            location,
            date,
        };

        let item = match self.store.insert_item(new_item, media.clone()).await {
            Ok(item) => item,
            Err(e) => {
                self.media.discard_all(&media).await;
                return Err(e.into());
            }
        };

        tracing::info!(item = %item.item_ref(), media = media.len(), "Item reported");

        // The reporter just uploaded these, so they see the originals.
        self.view(&item, Visibility::Secure).await
    }

    pub async fn get_item(&self, kind: ItemKind, id: Uuid) -> Result<Option<ItemView>> {
        match self.store.find_item(ItemRef::new(kind, id)).await? {
            Some(item) => Ok(Some(self.view(&item, Visibility::Redacted).await?)),
            None => Ok(None),
        }
    }

    pub async fn list_items(&self, kind: ItemKind, query: ItemQuery) -> Result<Vec<ItemView>> {
        let filter = query.into_filter(kind)?;
        let items = self.store.list_items(kind, &filter).await?;

        let mut views = Vec::with_capacity(items.len());
        for item in &items {
            views.push(self.view(item, Visibility::Redacted).await?);
        }
        Ok(views)
    }

    async fn view(&self, item: &Item, visibility: Visibility) -> Result<ItemView> {
        let media = self.store.media_for(item.item_ref().into()).await?;
        Ok(ItemView::new(item, &media, visibility))
    }
}

impl std::fmt::Debug for ItemRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemRegistry")
            .field("media", &self.media)
            .finish_non_exhaustive()
    }
}
