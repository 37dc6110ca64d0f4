// Mutation coordinator - identity assignment and dual writes to the primary
// tables and their time-index projections.
//
// The two writes per mutation are independent store calls with no wrapping
// transaction and no automatic retry on partial failure. Counter changes are
// read-modify-write without a compare-and-swap: concurrent callers can lose
// an update. Both are documented consistency gaps, surfaced rather than
// masked.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Comment, Reply};
use crate::storage::{current_time_millis, StoreInterface};

#[derive(Clone)]
pub struct MutationService {
    store: Arc<dyn StoreInterface>,
    max_body_len: usize,
}

impl MutationService {
    pub fn new(store: Arc<dyn StoreInterface>, max_body_len: usize) -> Self {
        Self {
            store,
            max_body_len,
        }
    }

    fn validate_body(&self, body: &str) -> AppResult<()> {
        if body.trim().is_empty() {
            return Err(AppError::Validation("Body must not be empty".to_string()));
        }
        if body.len() > self.max_body_len {
            return Err(AppError::Validation(format!(
                "Body exceeds {} bytes",
                self.max_body_len
            )));
        }
        Ok(())
    }

    /// Read-modify-write on a comment: load the primary row, apply the
    /// change, clamp counters at zero, write primary then projection.
    async fn rewrite_comment(
        &self,
        id: Uuid,
        apply: impl FnOnce(&mut Comment) + Send,
    ) -> AppResult<Comment> {
        let mut comment = self
            .store
            .get_comment(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", id)))?;

        apply(&mut comment);
        comment.likes = comment.likes.max(0);
        comment.dislikes = comment.dislikes.max(0);
        comment.reply_count = comment.reply_count.max(0);

        self.store.put_comment(&comment).await?;
        self.store.put_video_entry(&comment).await?;
        Ok(comment)
    }

    async fn rewrite_reply(
        &self,
        id: Uuid,
        apply: impl FnOnce(&mut Reply) + Send,
    ) -> AppResult<Reply> {
        let mut reply = self
            .store
            .get_reply(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reply {} not found", id)))?;

        apply(&mut reply);
        reply.likes = reply.likes.max(0);
        reply.dislikes = reply.dislikes.max(0);

        self.store.put_reply(&reply).await?;
        self.store.put_reply_entry(&reply).await?;
        Ok(reply)
    }

    pub async fn create_comment(
        &self,
        video_id: Uuid,
        author_id: Uuid,
        body: String,
    ) -> AppResult<Comment> {
        self.validate_body(&body)?;

        let comment = Comment {
            id: Uuid::new_v4(),
            video_id,
            author_id,
            body,
            likes: 0,
            dislikes: 0,
            reply_count: 0,
            created_at: current_time_millis(),
        };

        self.store.put_comment(&comment).await?;
        self.store.put_video_entry(&comment).await?;
        info!("Created comment {} on video {}", comment.id, video_id);
        Ok(comment)
    }

    pub async fn create_reply(
        &self,
        comment_id: Uuid,
        author_id: Uuid,
        body: String,
    ) -> AppResult<Reply> {
        self.validate_body(&body)?;

        if self.store.get_comment(comment_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Comment {} not found",
                comment_id
            )));
        }

        let reply = Reply {
            id: Uuid::new_v4(),
            comment_id,
            author_id,
            body,
            likes: 0,
            dislikes: 0,
            created_at: current_time_millis(),
        };

        self.store.put_reply(&reply).await?;
        self.store.put_reply_entry(&reply).await?;
        self.rewrite_comment(comment_id, |comment| comment.reply_count += 1)
            .await?;
        info!("Created reply {} on comment {}", reply.id, comment_id);
        Ok(reply)
    }

    pub async fn get_comment(&self, id: Uuid) -> AppResult<Comment> {
        self.store
            .get_comment(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", id)))
    }

    pub async fn get_reply(&self, id: Uuid) -> AppResult<Reply> {
        self.store
            .get_reply(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reply {} not found", id)))
    }

    pub async fn update_comment_body(&self, id: Uuid, body: String) -> AppResult<Comment> {
        self.validate_body(&body)?;
        self.rewrite_comment(id, |comment| comment.body = body).await
    }

    pub async fn update_reply_body(&self, id: Uuid, body: String) -> AppResult<Reply> {
        self.validate_body(&body)?;
        self.rewrite_reply(id, |reply| reply.body = body).await
    }

    pub async fn increment_comment_likes(&self, id: Uuid) -> AppResult<Comment> {
        self.rewrite_comment(id, |comment| comment.likes += 1).await
    }

    /// Decrements clamp at zero rather than reject.
    pub async fn decrement_comment_likes(&self, id: Uuid) -> AppResult<Comment> {
        self.rewrite_comment(id, |comment| comment.likes -= 1).await
    }

    pub async fn increment_comment_dislikes(&self, id: Uuid) -> AppResult<Comment> {
        self.rewrite_comment(id, |comment| comment.dislikes += 1)
            .await
    }

    pub async fn decrement_comment_dislikes(&self, id: Uuid) -> AppResult<Comment> {
        self.rewrite_comment(id, |comment| comment.dislikes -= 1)
            .await
    }

    pub async fn increment_reply_likes(&self, id: Uuid) -> AppResult<Reply> {
        self.rewrite_reply(id, |reply| reply.likes += 1).await
    }

    pub async fn decrement_reply_likes(&self, id: Uuid) -> AppResult<Reply> {
        self.rewrite_reply(id, |reply| reply.likes -= 1).await
    }

    pub async fn increment_reply_dislikes(&self, id: Uuid) -> AppResult<Reply> {
        self.rewrite_reply(id, |reply| reply.dislikes += 1).await
    }

    pub async fn decrement_reply_dislikes(&self, id: Uuid) -> AppResult<Reply> {
        self.rewrite_reply(id, |reply| reply.dislikes -= 1).await
    }

    /// Cascade delete: every reply (primary + projection) first, then the
    /// comment (primary + projection). Not transactional; a crash
    /// mid-cascade can orphan replies.
    pub async fn delete_comment(&self, id: Uuid) -> AppResult<()> {
        let comment = self
            .store
            .get_comment(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", id)))?;

        let replies = self.store.scan_reply_entries_many(&[id]).await?;
        for reply in &replies {
            self.store.delete_reply(reply.id).await?;
            self.store
                .delete_reply_entry(reply.comment_id, reply.created_at, reply.id)
                .await?;
        }

        self.store.delete_comment(id).await?;
        self.store
            .delete_video_entry(comment.video_id, comment.created_at, comment.id)
            .await?;
        info!("Deleted comment {} and {} replies", id, replies.len());
        Ok(())
    }

    pub async fn delete_reply(&self, id: Uuid) -> AppResult<()> {
        let reply = self
            .store
            .get_reply(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reply {} not found", id)))?;

        self.store.delete_reply(id).await?;
        self.store
            .delete_reply_entry(reply.comment_id, reply.created_at, reply.id)
            .await?;

        match self
            .rewrite_comment(reply.comment_id, |comment| comment.reply_count -= 1)
            .await
        {
            Ok(_) => {}
            Err(AppError::NotFound(_)) => {
                // Orphaned reply: the parent vanished under us.
                warn!(
                    "Parent comment {} missing while deleting reply {}",
                    reply.comment_id, id
                );
            }
            Err(e) => return Err(e),
        }

        info!("Deleted reply {} from comment {}", id, reply.comment_id);
        Ok(())
    }
}
