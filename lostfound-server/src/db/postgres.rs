//! PostgreSQL implementation of the ledger store.
//!
//! Every multi-record write runs in one transaction. A failed step returns
//! early with `?`, which drops the transaction and rolls it back.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use lostfound_core::{
    Claim, ClaimFilter, ClaimStatus, ClaimTransition, Item, ItemFilter, ItemKind, ItemRef,
    ItemStatus, LedgerStore, MediaAttachment, MediaOwner, NewClaim, NewItem, NewMedia,
    StoreError, StoreResult, UpsertUser, User,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

const PENDING_CLAIM_INDEX: &str = "claims_one_pending_per_claimer";
const USER_EMAIL_INDEX: &str = "users_email_lower_idx";

const CLAIM_COLUMNS: &str = "id, item_type, item_id, claimer_id, status, verification_details, \
                             claimed_at, created_at, updated_at";
const MEDIA_COLUMNS: &str = "id, owner_type, owner_id, media_type, url, preview_url, provider_id, \
                             format, is_primary, position, created_at";
const USER_COLUMNS: &str = "id, email, name, role, created_at, updated_at";

/// PostgreSQL-backed ledger store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        Ok(Self {
            id: row.id,
            email: row.email,
            name: row.name,
            role: row.role.parse().map_err(StoreError::Query)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ItemRow {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    description: Option<String>,
    category: Option<String>,
    location: Option<String>,
    date: Option<NaiveDate>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_item(self, kind: ItemKind) -> StoreResult<Item> {
        Ok(Item {
            id: self.id,
            kind,
            owner_id: self.owner_id,
            title: self.title,
            description: self.description,
            category: self.category,
            location: self.location,
            date: self.date,
            status: self.status.parse().map_err(StoreError::Query)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ClaimRow {
    id: Uuid,
    item_type: String,
    item_id: Uuid,
    claimer_id: Uuid,
    status: String,
    verification_details: Option<String>,
    claimed_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ClaimRow> for Claim {
    type Error = StoreError;

    fn try_from(row: ClaimRow) -> StoreResult<Self> {
        let kind: ItemKind = row
            .item_type
            .parse()
            .map_err(|_| StoreError::Query(format!("unknown item type '{}'", row.item_type)))?;
        Ok(Self {
            id: row.id,
            item: ItemRef::new(kind, row.item_id),
            claimer_id: row.claimer_id,
            status: row.status.parse().map_err(StoreError::Query)?,
            verification_details: row.verification_details,
            claimed_at: row.claimed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct MediaRow {
    id: Uuid,
    owner_type: String,
    owner_id: Uuid,
    media_type: String,
    url: String,
    preview_url: String,
    provider_id: Option<String>,
    format: Option<String>,
    is_primary: bool,
    position: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<MediaRow> for MediaAttachment {
    type Error = StoreError;

    fn try_from(row: MediaRow) -> StoreResult<Self> {
        let owner = MediaOwner::from_tag(&row.owner_type, row.owner_id)
            .ok_or_else(|| StoreError::Query(format!("unknown owner type '{}'", row.owner_type)))?;
        Ok(Self {
            id: row.id,
            owner,
            kind: row.media_type.parse().map_err(StoreError::Query)?,
            url: row.url,
            preview_url: row.preview_url,
            provider_id: row.provider_id,
            format: row.format,
            is_primary: row.is_primary,
            position: row.position,
            created_at: row.created_at,
        })
    }
}

/// Table and owner column for an item kind.
fn item_table(kind: ItemKind) -> (&'static str, &'static str) {
    match kind {
        ItemKind::Lost => ("lost_items", "owner_id"),
        ItemKind::Found => ("found_items", "finder_id"),
    }
}

fn item_select(kind: ItemKind) -> String {
    let (table, owner) = item_table(kind);
    format!(
        "SELECT id, {owner} AS owner_id, title, description, category, location, date, status, \
         created_at, updated_at FROM {table}"
    )
}

fn query_err(e: sqlx::Error) -> StoreError {
    StoreError::Query(e.to_string())
}

fn violates(e: &sqlx::Error, constraint: &str) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.constraint() == Some(constraint))
}

/// Escape `%`, `_` and `\` for use inside an ILIKE pattern.
fn like_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

impl PostgresStore {
    /// Connect and run migrations.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        tracing::info!(max_connections, "Ledger store connected and migrations applied");

        Ok(Self { pool })
    }

    /// Create a store from an existing pool (for testing).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_media(
        tx: &mut Transaction<'_, Postgres>,
        media: &[NewMedia],
    ) -> StoreResult<()> {
        for m in media {
            sqlx::query(
                r#"
                INSERT INTO media_attachments
                    (id, owner_type, owner_id, media_type, url, preview_url, provider_id, format, is_primary, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(m.id)
            .bind(m.owner.tag())
            .bind(m.owner.id())
            .bind(m.kind.as_str())
            .bind(&m.url)
            .bind(&m.preview_url)
            .bind(&m.provider_id)
            .bind(&m.format)
            .bind(m.is_primary)
            .bind(m.position)
            .execute(&mut **tx)
            .await
            .map_err(query_err)?;
        }
        Ok(())
    }

    /// Lock an item row and return its status.
    async fn lock_item_status(
        tx: &mut Transaction<'_, Postgres>,
        item: ItemRef,
    ) -> StoreResult<ItemStatus> {
        let (table, _) = item_table(item.kind());
        let status: Option<String> =
            sqlx::query_scalar(&format!("SELECT status FROM {table} WHERE id = $1 FOR UPDATE"))
                .bind(item.id())
                .fetch_optional(&mut **tx)
                .await
                .map_err(query_err)?;

        status
            .ok_or(StoreError::ItemMissing(item))?
            .parse()
            .map_err(StoreError::Query)
    }
}

#[async_trait]
impl LedgerStore for PostgresStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(query_err)?;
        row.map(User::try_from).transpose()
    }

    async fn upsert_user(&self, user: UpsertUser) -> StoreResult<User> {
        let role = if user.grant_admin { "admin" } else { "user" };
        let row: UserRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (id, email, name, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                name = COALESCE(EXCLUDED.name, users.name),
                role = CASE WHEN EXCLUDED.role = 'admin' THEN 'admin' ELSE users.role END,
                updated_at = now()
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, USER_EMAIL_INDEX) {
                StoreError::EmailTaken
            } else {
                query_err(e)
            }
        })?;

        User::try_from(row)
    }

    async fn insert_item(&self, item: NewItem, media: Vec<NewMedia>) -> StoreResult<Item> {
        let (table, owner) = item_table(item.kind);
        let mut tx = self.pool.begin().await.map_err(query_err)?;

        let row: ItemRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO {table} (id, {owner}, title, description, category, location, date, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, {owner} AS owner_id, title, description, category, location, date, status,
                      created_at, updated_at
            "#
        ))
        .bind(item.id)
        .bind(item.owner_id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.category)
        .bind(&item.location)
        .bind(item.date)
        .bind(item.kind.initial_status().as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(query_err)?;

        Self::insert_media(&mut tx, &media).await?;
        tx.commit().await.map_err(query_err)?;

        tracing::debug!(item_id = %row.id, kind = %item.kind, media = media.len(), "Stored item");
        row.into_item(item.kind)
    }

    async fn find_item(&self, item: ItemRef) -> StoreResult<Option<Item>> {
        let row: Option<ItemRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", item_select(item.kind())))
                .bind(item.id())
                .fetch_optional(&self.pool)
                .await
                .map_err(query_err)?;
        row.map(|r| r.into_item(item.kind())).transpose()
    }

    async fn list_items(&self, kind: ItemKind, filter: &ItemFilter) -> StoreResult<Vec<Item>> {
        let (_, owner) = item_table(kind);
        let mut query = QueryBuilder::<Postgres>::new(item_select(kind));
        query.push(" WHERE TRUE");

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(category) = &filter.category {
            query.push(" AND category ILIKE ").push_bind(like_pattern(category));
        }
        if let Some(location) = &filter.location {
            query.push(" AND location ILIKE ").push_bind(like_pattern(location));
        }
        if let Some(keyword) = &filter.keyword {
            let pattern = like_pattern(keyword);
            query
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(owner_id) = filter.owner_id {
            query.push(format!(" AND {owner} = ")).push_bind(owner_id);
        }
        query.push(" ORDER BY created_at DESC");

        let rows: Vec<ItemRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(query_err)?;
        rows.into_iter().map(|r| r.into_item(kind)).collect()
    }

    async fn insert_claim(&self, claim: NewClaim, media: Vec<NewMedia>) -> StoreResult<Claim> {
        let mut tx = self.pool.begin().await.map_err(query_err)?;

        let item_status = Self::lock_item_status(&mut tx, claim.item).await?;
        if !item_status.is_claimable() {
            return Err(StoreError::ItemUnavailable(item_status));
        }

        let row: ClaimRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO claims (id, item_type, item_id, claimer_id, status, verification_details)
            VALUES ($1, $2, $3, $4, 'pending', $5)
            RETURNING {CLAIM_COLUMNS}
            "#
        ))
        .bind(claim.id)
        .bind(claim.item.kind().as_str())
        .bind(claim.item.id())
        .bind(claim.claimer_id)
        .bind(&claim.verification_details)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if violates(&e, PENDING_CLAIM_INDEX) {
                StoreError::DuplicatePending
            } else {
                query_err(e)
            }
        })?;

        Self::insert_media(&mut tx, &media).await?;
        tx.commit().await.map_err(query_err)?;

        Claim::try_from(row)
    }

    async fn find_claim(&self, id: Uuid) -> StoreResult<Option<Claim>> {
        let row: Option<ClaimRow> =
            sqlx::query_as(&format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(query_err)?;
        row.map(Claim::try_from).transpose()
    }

    async fn list_claims(&self, filter: &ClaimFilter) -> StoreResult<Vec<Claim>> {
        let mut query =
            QueryBuilder::<Postgres>::new(format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE TRUE"));

        if let Some(claimer_id) = filter.claimer_id {
            query.push(" AND claimer_id = ").push_bind(claimer_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(kind) = filter.item_type {
            query.push(" AND item_type = ").push_bind(kind.as_str());
        }
        query.push(" ORDER BY created_at DESC");

        let rows: Vec<ClaimRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(query_err)?;
        rows.into_iter().map(Claim::try_from).collect()
    }

    async fn apply_transition(
        &self,
        transition: ClaimTransition,
    ) -> StoreResult<(Claim, Option<Item>)> {
        let mut tx = self.pool.begin().await.map_err(query_err)?;

        let row: Option<ClaimRow> = sqlx::query_as(&format!(
            r#"
            UPDATE claims
            SET status = $1,
                verification_details = COALESCE($2, verification_details),
                updated_at = now()
            WHERE id = $3 AND status = $4
            RETURNING {CLAIM_COLUMNS}
            "#
        ))
        .bind(transition.to.as_str())
        .bind(&transition.verification_details)
        .bind(transition.claim_id)
        .bind(transition.from.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_err)?;

        let row = match row {
            Some(row) => row,
            None => {
                // Either the claim vanished or another request moved it first
                let current: Option<String> =
                    sqlx::query_scalar("SELECT status FROM claims WHERE id = $1")
                        .bind(transition.claim_id)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(query_err)?;
                return Err(match current {
                    Some(status) => {
                        let status: ClaimStatus = status.parse().map_err(StoreError::Query)?;
                        StoreError::StaleStatus(status)
                    }
                    None => StoreError::Query(format!("claim {} vanished", transition.claim_id)),
                });
            }
        };

        let item = match transition.item_status {
            Some(target) => {
                let current = Self::lock_item_status(&mut tx, transition.item).await?;
                if target == ItemStatus::Claimed && current == ItemStatus::Closed {
                    return Err(StoreError::ItemUnavailable(current));
                }

                let kind = transition.item.kind();
                let (table, owner) = item_table(kind);
                let item_row: ItemRow = sqlx::query_as(&format!(
                    r#"
                    UPDATE {table} SET status = $1, updated_at = now()
                    WHERE id = $2
                    RETURNING id, {owner} AS owner_id, title, description, category, location, date,
                              status, created_at, updated_at
                    "#
                ))
                .bind(target.as_str())
                .bind(transition.item.id())
                .fetch_one(&mut *tx)
                .await
                .map_err(query_err)?;
                Some(item_row.into_item(kind)?)
            }
            None => None,
        };

        tx.commit().await.map_err(query_err)?;

        Ok((Claim::try_from(row)?, item))
    }

    async fn media_for(&self, owner: MediaOwner) -> StoreResult<Vec<MediaAttachment>> {
        let rows: Vec<MediaRow> = sqlx::query_as(&format!(
            r#"
            SELECT {MEDIA_COLUMNS} FROM media_attachments
            WHERE owner_type = $1 AND owner_id = $2
            ORDER BY is_primary DESC, created_at ASC, position ASC
            "#
        ))
        .bind(owner.tag())
        .bind(owner.id())
        .fetch_all(&self.pool)
        .await
        .map_err(query_err)?;

        rows.into_iter().map(MediaAttachment::try_from).collect()
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        true
    }
}
