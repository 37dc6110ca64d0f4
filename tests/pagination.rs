// Pagination walks over a seeded store: exactly-once traversal, over-fetch
// accounting, and ranked display order layered on top of chronological
// cursors.

use std::sync::Arc;

use threadstore::models::{Comment, Reply};
use threadstore::service::{PageRequest, PageService, SortOrder};
use threadstore::storage::{MemoryStore, StoreInterface};
use uuid::Uuid;

const NOW: i64 = 1_722_860_000_000;
const HOUR: i64 = 3_600_000;

async fn seed_comment(
    store: &MemoryStore,
    video_id: Uuid,
    created_at: i64,
    likes: i64,
) -> Comment {
    let comment = Comment {
        id: Uuid::new_v4(),
        video_id,
        author_id: Uuid::new_v4(),
        body: format!("comment at {}", created_at),
        likes,
        dislikes: 0,
        reply_count: 0,
        created_at,
    };
    store.put_comment(&comment).await.unwrap();
    store.put_video_entry(&comment).await.unwrap();
    comment
}

async fn seed_reply(store: &MemoryStore, comment_id: Uuid, created_at: i64, likes: i64) -> Reply {
    let reply = Reply {
        id: Uuid::new_v4(),
        comment_id,
        author_id: Uuid::new_v4(),
        body: format!("reply at {}", created_at),
        likes,
        dislikes: 0,
        created_at,
    };
    store.put_reply(&reply).await.unwrap();
    store.put_reply_entry(&reply).await.unwrap();
    reply
}

fn request(limit: u32, cursor: Option<String>, sort: SortOrder) -> PageRequest {
    PageRequest {
        limit,
        cursor,
        sort,
    }
}

/// Walk every page via successive cursors, recording (created_at, id) in
/// visit order.
async fn walk(
    pages: &PageService,
    video_id: Uuid,
    page_size: u32,
    sort: SortOrder,
) -> Vec<(i64, Uuid)> {
    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = pages
            .comments_page(video_id, &request(page_size, cursor.clone(), sort), NOW)
            .await
            .unwrap();
        for item in &page.items {
            seen.push((item.comment.created_at, item.comment.id));
        }
        if !page.has_more {
            break;
        }
        cursor = page.next_cursor.clone();
    }
    seen
}

#[tokio::test]
async fn test_walk_visits_each_entry_exactly_once() {
    let store = Arc::new(MemoryStore::new());
    let pages = PageService::new(store.clone());
    let video_id = Uuid::new_v4();

    // Five comments, two sharing a timestamp to exercise the id tiebreak.
    let mut expected = Vec::new();
    for created_at in [NOW - 5 * HOUR, NOW - 4 * HOUR, NOW - 2 * HOUR, NOW - 2 * HOUR, NOW - HOUR]
    {
        let c = seed_comment(&store, video_id, created_at, 0).await;
        expected.push((c.created_at, c.id));
    }
    expected.sort();
    expected.reverse();

    for page_size in [1, 2, 3, 5, 7] {
        let seen = walk(&pages, video_id, page_size, SortOrder::Chronological).await;
        assert_eq!(seen, expected, "page size {}", page_size);
    }
}

#[tokio::test]
async fn test_page_size_two_over_five() {
    let store = Arc::new(MemoryStore::new());
    let pages = PageService::new(store.clone());
    let video_id = Uuid::new_v4();
    for i in 0..5 {
        seed_comment(&store, video_id, NOW - i * HOUR, 0).await;
    }

    let mut sizes = Vec::new();
    let mut has_more = Vec::new();
    let mut cursors = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = pages
            .comments_page(
                video_id,
                &request(2, cursor.clone(), SortOrder::Chronological),
                NOW,
            )
            .await
            .unwrap();
        sizes.push(page.items.len());
        has_more.push(page.has_more);
        cursors.push(page.next_cursor.clone().unwrap());
        assert_eq!(page.total_estimated, 5);
        if !page.has_more {
            break;
        }
        cursor = page.next_cursor.clone();
    }

    assert_eq!(sizes, vec![2, 2, 1]);
    assert_eq!(has_more, vec![true, true, false]);
    // Three distinct, non-overlapping cursors.
    assert_eq!(cursors.len(), 3);
    assert_ne!(cursors[0], cursors[1]);
    assert_ne!(cursors[1], cursors[2]);
    assert_ne!(cursors[0], cursors[2]);
}

#[tokio::test]
async fn test_ranked_is_a_permutation_of_chronological() {
    let store = Arc::new(MemoryStore::new());
    let pages = PageService::new(store.clone());
    let video_id = Uuid::new_v4();

    // Old comment with many likes outranks fresh ones; display order moves,
    // the item set must not.
    seed_comment(&store, video_id, NOW - 30 * HOUR, 50).await;
    seed_comment(&store, video_id, NOW - 2 * HOUR, 1).await;
    seed_comment(&store, video_id, NOW - HOUR, 0).await;

    let ranked = pages
        .comments_page(video_id, &request(3, None, SortOrder::Ranked), NOW)
        .await
        .unwrap();
    let chrono = pages
        .comments_page(video_id, &request(3, None, SortOrder::Chronological), NOW)
        .await
        .unwrap();

    let mut ranked_ids: Vec<Uuid> = ranked.items.iter().map(|i| i.comment.id).collect();
    let mut chrono_ids: Vec<Uuid> = chrono.items.iter().map(|i| i.comment.id).collect();
    assert_ne!(ranked_ids, chrono_ids, "ranking should reorder this fixture");
    ranked_ids.sort();
    chrono_ids.sort();
    assert_eq!(ranked_ids, chrono_ids);

    assert_eq!(ranked.has_more, chrono.has_more);
    assert_eq!(ranked.next_cursor, chrono.next_cursor);

    // Display scores are non-increasing in ranked order.
    for pair in ranked.items.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn test_next_cursor_ignores_display_order() {
    let store = Arc::new(MemoryStore::new());
    let pages = PageService::new(store.clone());
    let video_id = Uuid::new_v4();

    // The chronologically-last row of page one is the highest-scored, so a
    // cursor derived from display order would be wrong.
    seed_comment(&store, video_id, NOW - 4 * HOUR, 0).await;
    seed_comment(&store, video_id, NOW - 3 * HOUR, 0).await;
    seed_comment(&store, video_id, NOW - 2 * HOUR, 100).await;
    seed_comment(&store, video_id, NOW - HOUR, 0).await;

    let seen = walk(&pages, video_id, 2, SortOrder::Ranked).await;
    let unique: std::collections::HashSet<Uuid> = seen.iter().map(|(_, id)| *id).collect();
    assert_eq!(seen.len(), 4, "no gaps");
    assert_eq!(unique.len(), 4, "no duplicates");
}

#[tokio::test]
async fn test_equal_scores_keep_chronological_order() {
    let store = Arc::new(MemoryStore::new());
    let pages = PageService::new(store.clone());
    let video_id = Uuid::new_v4();

    // Same likes, same recency bucket: scores tie, newest stays first.
    let older = seed_comment(&store, video_id, NOW - 3 * HOUR, 2).await;
    let newer = seed_comment(&store, video_id, NOW - 2 * HOUR, 2).await;

    let page = pages
        .comments_page(video_id, &request(2, None, SortOrder::Ranked), NOW)
        .await
        .unwrap();
    assert_eq!(page.items[0].comment.id, newer.id);
    assert_eq!(page.items[1].comment.id, older.id);
    assert_eq!(page.items[0].score, page.items[1].score);
}

#[tokio::test]
async fn test_zero_limit_probes_existence() {
    let store = Arc::new(MemoryStore::new());
    let pages = PageService::new(store.clone());
    let video_id = Uuid::new_v4();

    let empty = pages
        .comments_page(video_id, &request(0, None, SortOrder::Ranked), NOW)
        .await
        .unwrap();
    assert!(empty.items.is_empty());
    assert!(!empty.has_more);
    assert!(empty.next_cursor.is_none());

    seed_comment(&store, video_id, NOW - HOUR, 0).await;
    let probed = pages
        .comments_page(video_id, &request(0, None, SortOrder::Ranked), NOW)
        .await
        .unwrap();
    assert!(probed.items.is_empty());
    assert!(probed.has_more);
    assert!(probed.next_cursor.is_none());
}

#[tokio::test]
async fn test_empty_video_page() {
    let store = Arc::new(MemoryStore::new());
    let pages = PageService::new(store.clone());

    let page = pages
        .comments_page(
            Uuid::new_v4(),
            &request(10, None, SortOrder::Ranked),
            NOW,
        )
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert!(!page.has_more);
    assert!(page.next_cursor.is_none());
    assert_eq!(page.total_estimated, 0);
}

#[tokio::test]
async fn test_replies_walk_and_ranking() {
    let store = Arc::new(MemoryStore::new());
    let pages = PageService::new(store.clone());
    let video_id = Uuid::new_v4();
    let parent = seed_comment(&store, video_id, NOW - 10 * HOUR, 0).await;

    let mut expected = Vec::new();
    for i in 0..4 {
        let r = seed_reply(&store, parent.id, NOW - i * HOUR, i).await;
        expected.push((r.created_at, r.id));
    }
    expected.sort();
    expected.reverse();

    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = pages
            .replies_page(
                parent.id,
                &request(3, cursor.clone(), SortOrder::Chronological),
                NOW,
            )
            .await
            .unwrap();
        for item in &page.items {
            seen.push((item.reply.created_at, item.reply.id));
        }
        if !page.has_more {
            break;
        }
        cursor = page.next_cursor.clone();
    }
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_threads_attach_ranked_truncated_replies() {
    let store = Arc::new(MemoryStore::new());
    let pages = PageService::new(store.clone());
    let video_id = Uuid::new_v4();

    let first = seed_comment(&store, video_id, NOW - 2 * HOUR, 0).await;
    let second = seed_comment(&store, video_id, NOW - HOUR, 0).await;

    // Oldest reply has the most likes: ranked attachment must float it up.
    let best = seed_reply(&store, first.id, NOW - 5 * HOUR, 40).await;
    seed_reply(&store, first.id, NOW - 4 * HOUR, 0).await;
    seed_reply(&store, first.id, NOW - 3 * HOUR, 1).await;

    // Parent page is chronological; replies are ranked regardless.
    let page = pages
        .threads_page(
            video_id,
            &request(10, None, SortOrder::Chronological),
            2,
            NOW,
        )
        .await
        .unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].comment.comment.id, second.id);
    assert!(page.items[0].replies.is_empty());

    let thread = &page.items[1];
    assert_eq!(thread.comment.comment.id, first.id);
    assert_eq!(thread.replies.len(), 2, "truncated to replies_limit");
    assert_eq!(thread.replies[0].reply.id, best.id);
    for reply in &thread.replies {
        assert_eq!(reply.reply.comment_id, first.id);
    }
    for pair in thread.replies.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn test_invalid_cursor_rejected_before_querying() {
    let store = Arc::new(MemoryStore::new());
    let pages = PageService::new(store.clone());

    let result = pages
        .comments_page(
            Uuid::new_v4(),
            &request(10, Some("not-a-cursor!!!".to_string()), SortOrder::Ranked),
            NOW,
        )
        .await;
    match result {
        Err(threadstore::AppError::InvalidCursor(_)) => {}
        other => panic!("expected InvalidCursor, got {:?}", other.map(|_| ())),
    }
}
