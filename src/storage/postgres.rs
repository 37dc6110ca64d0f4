// Postgres backend - primary tables plus the two clustered projections.
// Scans run against the projections with a row-value seek bound; counts run
// against the primary tables.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::cursor::PageCursor;
use crate::error::{AppError, AppResult};
use crate::models::{Comment, Reply};
use crate::storage::StoreInterface;

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Health check to verify store connectivity
    pub async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::StoreUnavailable(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Create the primary tables, the projection tables with their composite
    /// clustering keys, and the scan indexes.
    pub async fn initialize(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id UUID PRIMARY KEY,
                video_id UUID NOT NULL,
                author_id UUID NOT NULL,
                body TEXT NOT NULL,
                likes BIGINT NOT NULL DEFAULT 0,
                dislikes BIGINT NOT NULL DEFAULT 0,
                reply_count BIGINT NOT NULL DEFAULT 0,
                created_at BIGINT NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to create comments table: {}", e))
        })?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS replies (
                id UUID PRIMARY KEY,
                comment_id UUID NOT NULL,
                author_id UUID NOT NULL,
                body TEXT NOT NULL,
                likes BIGINT NOT NULL DEFAULT 0,
                dislikes BIGINT NOT NULL DEFAULT 0,
                created_at BIGINT NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to create replies table: {}", e))
        })?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comments_by_video (
                video_id UUID NOT NULL,
                created_at BIGINT NOT NULL,
                id UUID NOT NULL,
                author_id UUID NOT NULL,
                body TEXT NOT NULL,
                likes BIGINT NOT NULL,
                dislikes BIGINT NOT NULL,
                reply_count BIGINT NOT NULL,
                PRIMARY KEY (video_id, created_at, id)
            )
        "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to create comments_by_video table: {}", e))
        })?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS replies_by_comment (
                comment_id UUID NOT NULL,
                created_at BIGINT NOT NULL,
                id UUID NOT NULL,
                author_id UUID NOT NULL,
                body TEXT NOT NULL,
                likes BIGINT NOT NULL,
                dislikes BIGINT NOT NULL,
                PRIMARY KEY (comment_id, created_at, id)
            )
        "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to create replies_by_comment table: {}", e))
        })?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_comments_video ON comments(video_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to create comments video index: {}", e))
        })?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_replies_comment ON replies(comment_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to create replies comment index: {}", e))
        })?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_comments_by_video_scan \
             ON comments_by_video(video_id, created_at DESC, id DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to create comments scan index: {}", e))
        })?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_replies_by_comment_scan \
             ON replies_by_comment(comment_id, created_at DESC, id DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to create replies scan index: {}", e))
        })?;

        Ok(())
    }
}

fn comment_from_row(row: &sqlx::postgres::PgRow, video_id_col: &str) -> Comment {
    Comment {
        id: row.get("id"),
        video_id: row.get(video_id_col),
        author_id: row.get("author_id"),
        body: row.get("body"),
        likes: row.get("likes"),
        dislikes: row.get("dislikes"),
        reply_count: row.get("reply_count"),
        created_at: row.get("created_at"),
    }
}

fn reply_from_row(row: &sqlx::postgres::PgRow, comment_id_col: &str) -> Reply {
    Reply {
        id: row.get("id"),
        comment_id: row.get(comment_id_col),
        author_id: row.get("author_id"),
        body: row.get("body"),
        likes: row.get("likes"),
        dislikes: row.get("dislikes"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl StoreInterface for PostgresStore {
    async fn get_comment(&self, id: Uuid) -> AppResult<Option<Comment>> {
        let row = sqlx::query(
            "SELECT id, video_id, author_id, body, likes, dislikes, reply_count, created_at \
             FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::StoreUnavailable(format!("Failed to get comment {}: {}", id, e)))?;

        Ok(row.map(|row| comment_from_row(&row, "video_id")))
    }

    async fn put_comment(&self, comment: &Comment) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO comments (id, video_id, author_id, body, likes, dislikes, reply_count, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (id) DO UPDATE SET \
                body = EXCLUDED.body, likes = EXCLUDED.likes, \
                dislikes = EXCLUDED.dislikes, reply_count = EXCLUDED.reply_count",
        )
        .bind(comment.id)
        .bind(comment.video_id)
        .bind(comment.author_id)
        .bind(&comment.body)
        .bind(comment.likes)
        .bind(comment.dislikes)
        .bind(comment.reply_count)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to put comment {}: {}", comment.id, e))
        })?;

        Ok(())
    }

    async fn delete_comment(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::StoreUnavailable(format!("Failed to delete comment {}: {}", id, e))
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_reply(&self, id: Uuid) -> AppResult<Option<Reply>> {
        let row = sqlx::query(
            "SELECT id, comment_id, author_id, body, likes, dislikes, created_at \
             FROM replies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::StoreUnavailable(format!("Failed to get reply {}: {}", id, e)))?;

        Ok(row.map(|row| reply_from_row(&row, "comment_id")))
    }

    async fn put_reply(&self, reply: &Reply) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO replies (id, comment_id, author_id, body, likes, dislikes, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO UPDATE SET \
                body = EXCLUDED.body, likes = EXCLUDED.likes, dislikes = EXCLUDED.dislikes",
        )
        .bind(reply.id)
        .bind(reply.comment_id)
        .bind(reply.author_id)
        .bind(&reply.body)
        .bind(reply.likes)
        .bind(reply.dislikes)
        .bind(reply.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to put reply {}: {}", reply.id, e))
        })?;

        Ok(())
    }

    async fn delete_reply(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM replies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::StoreUnavailable(format!("Failed to delete reply {}: {}", id, e))
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn put_video_entry(&self, comment: &Comment) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO comments_by_video \
                (video_id, created_at, id, author_id, body, likes, dislikes, reply_count) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (video_id, created_at, id) DO UPDATE SET \
                body = EXCLUDED.body, likes = EXCLUDED.likes, \
                dislikes = EXCLUDED.dislikes, reply_count = EXCLUDED.reply_count",
        )
        .bind(comment.video_id)
        .bind(comment.created_at)
        .bind(comment.id)
        .bind(comment.author_id)
        .bind(&comment.body)
        .bind(comment.likes)
        .bind(comment.dislikes)
        .bind(comment.reply_count)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(format!(
                "Failed to put video entry for comment {}: {}",
                comment.id, e
            ))
        })?;

        Ok(())
    }

    async fn delete_video_entry(
        &self,
        video_id: Uuid,
        created_at: i64,
        id: Uuid,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM comments_by_video WHERE video_id = $1 AND created_at = $2 AND id = $3",
        )
        .bind(video_id)
        .bind(created_at)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to delete video entry {}: {}", id, e))
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn scan_video_entries(
        &self,
        video_id: Uuid,
        seek: Option<PageCursor>,
        limit: u32,
    ) -> AppResult<Vec<Comment>> {
        let mut sql = "SELECT video_id, created_at, id, author_id, body, likes, dislikes, reply_count \
                       FROM comments_by_video WHERE video_id = $1"
            .to_string();
        if seek.is_some() {
            sql.push_str(" AND (created_at, id) < ($2, $3)");
            sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT $4");
        } else {
            sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT $2");
        }

        let mut query_builder = sqlx::query(&sql).bind(video_id);
        if let Some(seek) = seek {
            query_builder = query_builder.bind(seek.created_at).bind(seek.id);
        }
        query_builder = query_builder.bind(limit as i64);

        let rows = query_builder.fetch_all(&self.pool).await.map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to scan video entries: {}", e))
        })?;

        Ok(rows
            .iter()
            .map(|row| comment_from_row(row, "video_id"))
            .collect())
    }

    async fn put_reply_entry(&self, reply: &Reply) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO replies_by_comment \
                (comment_id, created_at, id, author_id, body, likes, dislikes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (comment_id, created_at, id) DO UPDATE SET \
                body = EXCLUDED.body, likes = EXCLUDED.likes, dislikes = EXCLUDED.dislikes",
        )
        .bind(reply.comment_id)
        .bind(reply.created_at)
        .bind(reply.id)
        .bind(reply.author_id)
        .bind(&reply.body)
        .bind(reply.likes)
        .bind(reply.dislikes)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(format!(
                "Failed to put reply entry for reply {}: {}",
                reply.id, e
            ))
        })?;

        Ok(())
    }

    async fn delete_reply_entry(
        &self,
        comment_id: Uuid,
        created_at: i64,
        id: Uuid,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM replies_by_comment WHERE comment_id = $1 AND created_at = $2 AND id = $3",
        )
        .bind(comment_id)
        .bind(created_at)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to delete reply entry {}: {}", id, e))
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn scan_reply_entries(
        &self,
        comment_id: Uuid,
        seek: Option<PageCursor>,
        limit: u32,
    ) -> AppResult<Vec<Reply>> {
        let mut sql = "SELECT comment_id, created_at, id, author_id, body, likes, dislikes \
                       FROM replies_by_comment WHERE comment_id = $1"
            .to_string();
        if seek.is_some() {
            sql.push_str(" AND (created_at, id) < ($2, $3)");
            sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT $4");
        } else {
            sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT $2");
        }

        let mut query_builder = sqlx::query(&sql).bind(comment_id);
        if let Some(seek) = seek {
            query_builder = query_builder.bind(seek.created_at).bind(seek.id);
        }
        query_builder = query_builder.bind(limit as i64);

        let rows = query_builder.fetch_all(&self.pool).await.map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to scan reply entries: {}", e))
        })?;

        Ok(rows
            .iter()
            .map(|row| reply_from_row(row, "comment_id"))
            .collect())
    }

    async fn scan_reply_entries_many(&self, comment_ids: &[Uuid]) -> AppResult<Vec<Reply>> {
        if comment_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT comment_id, created_at, id, author_id, body, likes, dislikes \
             FROM replies_by_comment WHERE comment_id = ANY($1) \
             ORDER BY comment_id, created_at DESC, id DESC",
        )
        .bind(comment_ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to batch-scan reply entries: {}", e))
        })?;

        Ok(rows
            .iter()
            .map(|row| reply_from_row(row, "comment_id"))
            .collect())
    }

    async fn count_comments_for_video(&self, video_id: Uuid) -> AppResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM comments WHERE video_id = $1")
            .bind(video_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::StoreUnavailable(format!("Failed to count comments: {}", e))
            })?;

        Ok(row.get::<i64, _>("count") as u64)
    }

    async fn count_replies_for_comment(&self, comment_id: Uuid) -> AppResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM replies WHERE comment_id = $1")
            .bind(comment_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::StoreUnavailable(format!("Failed to count replies: {}", e)))?;

        Ok(row.get::<i64, _>("count") as u64)
    }
}
