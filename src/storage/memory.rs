// In-memory backend - BTreeMap projections keyed by (parent, created_at, id)
// with HashMap primaries. The embedded counterpart of the Postgres backend;
// serves the dev default and the integration tests. Key ordering matches the
// Postgres clustering: uuids compare bytewise in both.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::cursor::PageCursor;
use crate::error::AppResult;
use crate::models::{Comment, Reply};
use crate::storage::StoreInterface;

type IndexKey = (Uuid, i64, Uuid);

#[derive(Default)]
struct Tables {
    comments: HashMap<Uuid, Comment>,
    replies: HashMap<Uuid, Reply>,
    comments_by_video: BTreeMap<IndexKey, Comment>,
    replies_by_comment: BTreeMap<IndexKey, Reply>,
}

pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Descending walk of one parent's group, applying the strict less-than seek
/// bound on (created_at, id).
fn scan_desc<T: Clone>(
    map: &BTreeMap<IndexKey, T>,
    parent: Uuid,
    seek: Option<PageCursor>,
    limit: u32,
) -> Vec<T> {
    let lo = (parent, i64::MIN, Uuid::nil());
    let hi = (parent, i64::MAX, Uuid::max());
    map.range(lo..=hi)
        .rev()
        .filter(|((_, created_at, id), _)| match seek {
            Some(seek) => (*created_at, *id) < (seek.created_at, seek.id),
            None => true,
        })
        .take(limit as usize)
        .map(|(_, entry)| entry.clone())
        .collect()
}

#[async_trait]
impl StoreInterface for MemoryStore {
    async fn get_comment(&self, id: Uuid) -> AppResult<Option<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables.comments.get(&id).cloned())
    }

    async fn put_comment(&self, comment: &Comment) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.comments.insert(comment.id, comment.clone());
        Ok(())
    }

    async fn delete_comment(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.comments.remove(&id).is_some())
    }

    async fn get_reply(&self, id: Uuid) -> AppResult<Option<Reply>> {
        let tables = self.tables.read().await;
        Ok(tables.replies.get(&id).cloned())
    }

    async fn put_reply(&self, reply: &Reply) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.replies.insert(reply.id, reply.clone());
        Ok(())
    }

    async fn delete_reply(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.replies.remove(&id).is_some())
    }

    async fn put_video_entry(&self, comment: &Comment) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let key = (comment.video_id, comment.created_at, comment.id);
        tables.comments_by_video.insert(key, comment.clone());
        Ok(())
    }

    async fn delete_video_entry(
        &self,
        video_id: Uuid,
        created_at: i64,
        id: Uuid,
    ) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .comments_by_video
            .remove(&(video_id, created_at, id))
            .is_some())
    }

    async fn scan_video_entries(
        &self,
        video_id: Uuid,
        seek: Option<PageCursor>,
        limit: u32,
    ) -> AppResult<Vec<Comment>> {
        let tables = self.tables.read().await;
        Ok(scan_desc(&tables.comments_by_video, video_id, seek, limit))
    }

    async fn put_reply_entry(&self, reply: &Reply) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let key = (reply.comment_id, reply.created_at, reply.id);
        tables.replies_by_comment.insert(key, reply.clone());
        Ok(())
    }

    async fn delete_reply_entry(
        &self,
        comment_id: Uuid,
        created_at: i64,
        id: Uuid,
    ) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .replies_by_comment
            .remove(&(comment_id, created_at, id))
            .is_some())
    }

    async fn scan_reply_entries(
        &self,
        comment_id: Uuid,
        seek: Option<PageCursor>,
        limit: u32,
    ) -> AppResult<Vec<Reply>> {
        let tables = self.tables.read().await;
        Ok(scan_desc(&tables.replies_by_comment, comment_id, seek, limit))
    }

    async fn scan_reply_entries_many(&self, comment_ids: &[Uuid]) -> AppResult<Vec<Reply>> {
        if comment_ids.is_empty() {
            return Ok(Vec::new());
        }
        let tables = self.tables.read().await;
        let mut entries = Vec::new();
        for &comment_id in comment_ids {
            entries.extend(scan_desc(
                &tables.replies_by_comment,
                comment_id,
                None,
                u32::MAX,
            ));
        }
        Ok(entries)
    }

    async fn count_comments_for_video(&self, video_id: Uuid) -> AppResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .values()
            .filter(|comment| comment.video_id == video_id)
            .count() as u64)
    }

    async fn count_replies_for_comment(&self, comment_id: Uuid) -> AppResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .replies
            .values()
            .filter(|reply| reply.comment_id == comment_id)
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(video_id: Uuid, created_at: i64, id: Uuid) -> Comment {
        Comment {
            id,
            video_id,
            author_id: Uuid::new_v4(),
            body: "test".to_string(),
            likes: 0,
            dislikes: 0,
            reply_count: 0,
            created_at,
        }
    }

    #[tokio::test]
    async fn test_scan_orders_descending_with_id_tiebreak() {
        let store = MemoryStore::new();
        let video_id = Uuid::new_v4();
        let id_low = Uuid::from_u128(1);
        let id_high = Uuid::from_u128(2);

        for (created_at, id) in [(100, id_low), (300, id_low), (300, id_high), (200, id_low)] {
            store
                .put_video_entry(&comment(video_id, created_at, id))
                .await
                .unwrap();
        }

        let entries = store
            .scan_video_entries(video_id, None, 10)
            .await
            .unwrap();
        let keys: Vec<(i64, Uuid)> = entries.iter().map(|c| (c.created_at, c.id)).collect();
        assert_eq!(
            keys,
            vec![(300, id_high), (300, id_low), (200, id_low), (100, id_low)]
        );
    }

    #[tokio::test]
    async fn test_seek_bound_is_strict() {
        let store = MemoryStore::new();
        let video_id = Uuid::new_v4();
        let id = Uuid::from_u128(7);
        for created_at in [100, 200, 300] {
            store
                .put_video_entry(&comment(video_id, created_at, id))
                .await
                .unwrap();
        }

        // Seek at the middle row: only rows strictly below come back.
        let entries = store
            .scan_video_entries(video_id, Some(PageCursor::new(200, id)), 10)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].created_at, 100);
    }

    #[tokio::test]
    async fn test_scan_is_isolated_per_parent() {
        let store = MemoryStore::new();
        let video_a = Uuid::new_v4();
        let video_b = Uuid::new_v4();
        store
            .put_video_entry(&comment(video_a, 100, Uuid::new_v4()))
            .await
            .unwrap();
        store
            .put_video_entry(&comment(video_b, 200, Uuid::new_v4()))
            .await
            .unwrap();

        let entries = store.scan_video_entries(video_a, None, 10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].video_id, video_a);
    }
}
