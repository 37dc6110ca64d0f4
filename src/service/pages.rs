// Page assembler - cursor decode, over-fetch, scoring, optional re-sort,
// next-cursor emission. One pass per request, no retries.
//
// Pagination correctness never depends on display ordering: the next cursor
// is always derived from the last row of the chronological slice, even when
// the page is re-sorted by score for display.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::cursor::PageCursor;
use crate::error::{AppError, AppResult};
use crate::models::{
    CommentPage, CommentThread, RankedComment, RankedReply, Reply, ReplyPage, ThreadPage,
};
use crate::scoring::{rank_comment, rank_reply};
use crate::storage::StoreInterface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ranked,
    Chronological,
}

impl SortOrder {
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "ranked" => Ok(SortOrder::Ranked),
            "chronological" => Ok(SortOrder::Chronological),
            other => Err(AppError::Validation(format!(
                "Unknown sort order: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    /// Desired page size. Zero is allowed: the page is empty and has_more
    /// reports whether any row exists at all.
    pub limit: u32,
    pub cursor: Option<String>,
    pub sort: SortOrder,
}

#[derive(Clone)]
pub struct PageService {
    store: Arc<dyn StoreInterface>,
}

/// Split the over-fetched rows into the chronological slice and has_more.
/// The extra row only signals that a further page exists; it never feeds the
/// next cursor.
fn split_overfetch<T>(mut rows: Vec<T>, desired: u32) -> (Vec<T>, bool) {
    let has_more = rows.len() > desired as usize;
    rows.truncate(desired as usize);
    (rows, has_more)
}

/// Stable descending sort by score; chronological order survives among ties.
fn sort_ranked<T, F: Fn(&T) -> f64>(items: &mut [T], score: F) {
    items.sort_by(|a, b| {
        score(b)
            .partial_cmp(&score(a))
            .unwrap_or(Ordering::Equal)
    });
}

impl PageService {
    pub fn new(store: Arc<dyn StoreInterface>) -> Self {
        Self { store }
    }

    /// Flat page of top-level comments for a video.
    pub async fn comments_page(
        &self,
        video_id: Uuid,
        request: &PageRequest,
        now_millis: i64,
    ) -> AppResult<CommentPage> {
        let seek = request
            .cursor
            .as_deref()
            .map(PageCursor::decode)
            .transpose()?;

        let desired = request.limit;
        let (rows, total_estimated) = futures::try_join!(
            self.store
                .scan_video_entries(video_id, seek, desired.saturating_add(1)),
            self.store.count_comments_for_video(video_id),
        )?;

        let (slice, has_more) = split_overfetch(rows, desired);
        let next_cursor = match slice.last() {
            Some(last) => Some(PageCursor::new(last.created_at, last.id).encode()?),
            None => None,
        };

        let mut items: Vec<RankedComment> = slice
            .into_iter()
            .map(|comment| rank_comment(comment, now_millis))
            .collect();
        if request.sort == SortOrder::Ranked {
            sort_ranked(&mut items, |item| item.score);
        }

        Ok(CommentPage {
            items,
            next_cursor,
            has_more,
            total_estimated,
        })
    }

    /// Flat page of replies under a comment.
    pub async fn replies_page(
        &self,
        comment_id: Uuid,
        request: &PageRequest,
        now_millis: i64,
    ) -> AppResult<ReplyPage> {
        let seek = request
            .cursor
            .as_deref()
            .map(PageCursor::decode)
            .transpose()?;

        let desired = request.limit;
        let (rows, total_estimated) = futures::try_join!(
            self.store
                .scan_reply_entries(comment_id, seek, desired.saturating_add(1)),
            self.store.count_replies_for_comment(comment_id),
        )?;

        let (slice, has_more) = split_overfetch(rows, desired);
        let next_cursor = match slice.last() {
            Some(last) => Some(PageCursor::new(last.created_at, last.id).encode()?),
            None => None,
        };

        let mut items: Vec<RankedReply> = slice
            .into_iter()
            .map(|reply| rank_reply(reply, now_millis))
            .collect();
        if request.sort == SortOrder::Ranked {
            sort_ranked(&mut items, |item| item.score);
        }

        Ok(ReplyPage {
            items,
            next_cursor,
            has_more,
            total_estimated,
        })
    }

    /// Nested page: comments with their top replies attached. Replies are
    /// always ranked, regardless of the parent sort parameter.
    pub async fn threads_page(
        &self,
        video_id: Uuid,
        request: &PageRequest,
        replies_limit: u32,
        now_millis: i64,
    ) -> AppResult<ThreadPage> {
        let page = self.comments_page(video_id, request, now_millis).await?;

        let parent_ids: Vec<Uuid> = page.items.iter().map(|item| item.comment.id).collect();
        let mut by_parent: HashMap<Uuid, Vec<Reply>> = HashMap::new();
        if !parent_ids.is_empty() {
            for reply in self.store.scan_reply_entries_many(&parent_ids).await? {
                by_parent.entry(reply.comment_id).or_default().push(reply);
            }
        }

        let items = page
            .items
            .into_iter()
            .map(|comment| {
                let replies = by_parent.remove(&comment.comment.id).unwrap_or_default();
                let mut ranked: Vec<RankedReply> = replies
                    .into_iter()
                    .map(|reply| rank_reply(reply, now_millis))
                    .collect();
                sort_ranked(&mut ranked, |item| item.score);
                ranked.truncate(replies_limit as usize);
                CommentThread {
                    comment,
                    replies: ranked,
                }
            })
            .collect();

        Ok(ThreadPage {
            items,
            next_cursor: page.next_cursor,
            has_more: page.has_more,
            total_estimated: page.total_estimated,
        })
    }
}
