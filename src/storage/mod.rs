// Storage interface - keyed lookups and clustered range scans over the
// comment tables. The store is treated as a black box offering point
// get/put/delete, descending range scans with a strict less-than seek bound,
// and best-effort counts. No transactions, no joins: the two time-index
// projections compensate with purpose-built clustering.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::cursor::PageCursor;
use crate::error::{AppError, AppResult};
use crate::models::{Comment, Reply};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Current time in milliseconds since Unix epoch
pub fn current_time_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

/// Flat interface over the four tables: two primary (comments, replies) and
/// two time-index projections (comments_by_video, replies_by_comment).
///
/// Writes to a primary row and to its projection row are independent calls;
/// the store offers no cross-table atomicity. A crash between the two leaves
/// them transiently inconsistent, which the mutation coordinator documents
/// rather than repairs.
#[async_trait]
pub trait StoreInterface: Send + Sync {
    // Comment primary rows
    async fn get_comment(&self, id: Uuid) -> AppResult<Option<Comment>>;
    async fn put_comment(&self, comment: &Comment) -> AppResult<()>;
    async fn delete_comment(&self, id: Uuid) -> AppResult<bool>;

    // Reply primary rows
    async fn get_reply(&self, id: Uuid) -> AppResult<Option<Reply>>;
    async fn put_reply(&self, reply: &Reply) -> AppResult<()>;
    async fn delete_reply(&self, id: Uuid) -> AppResult<bool>;

    // comments_by_video projection, clustered descending on (created_at, id)
    async fn put_video_entry(&self, comment: &Comment) -> AppResult<()>;
    async fn delete_video_entry(
        &self,
        video_id: Uuid,
        created_at: i64,
        id: Uuid,
    ) -> AppResult<bool>;
    /// Rows strictly below the seek position in (created_at, id) order,
    /// descending, at most `limit`.
    async fn scan_video_entries(
        &self,
        video_id: Uuid,
        seek: Option<PageCursor>,
        limit: u32,
    ) -> AppResult<Vec<Comment>>;

    // replies_by_comment projection
    async fn put_reply_entry(&self, reply: &Reply) -> AppResult<()>;
    async fn delete_reply_entry(
        &self,
        comment_id: Uuid,
        created_at: i64,
        id: Uuid,
    ) -> AppResult<bool>;
    async fn scan_reply_entries(
        &self,
        comment_id: Uuid,
        seek: Option<PageCursor>,
        limit: u32,
    ) -> AppResult<Vec<Reply>>;
    /// Batch variant for nested assembly. Ordering is only meaningful within
    /// a parent group: descending (created_at, id) per comment_id.
    async fn scan_reply_entries_many(&self, comment_ids: &[Uuid]) -> AppResult<Vec<Reply>>;

    // Best-effort counts, read from the primary tables rather than the
    // projections. Estimates only; may lag the index under concurrent writes.
    async fn count_comments_for_video(&self, video_id: Uuid) -> AppResult<u64>;
    async fn count_replies_for_comment(&self, comment_id: Uuid) -> AppResult<u64>;
}

/// Connect the configured backend: "memory" for the embedded store,
/// otherwise a postgresql:// URL.
pub async fn connect_store(config: &StoreConfig) -> AppResult<Arc<dyn StoreInterface>> {
    if config.url == "memory" {
        info!("Using in-memory store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    if config.url.starts_with("postgres") {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::StoreUnavailable(format!("Failed to connect to store: {}", e))
            })?;

        let store = PostgresStore::new(pool);
        store.initialize().await?;
        info!("Postgres store initialized");
        return Ok(Arc::new(store));
    }

    Err(AppError::Configuration(format!(
        "Unsupported store url: {}",
        config.url
    )))
}
