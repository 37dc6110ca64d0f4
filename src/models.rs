// Data model - comments, replies, and their ranked read-time views

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A top-level comment on a video. The primary row; a denormalized copy of
/// every field also lives in the comments_by_video projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub video_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub likes: i64,
    pub dislikes: i64,
    pub reply_count: i64,
    /// Milliseconds since the Unix epoch, assigned at creation, immutable.
    pub created_at: i64,
}

/// A reply to a comment. Projected into replies_by_comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: Uuid,
    pub comment_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub likes: i64,
    pub dislikes: i64,
    pub created_at: i64,
}

/// Read-time view of a comment. Never persisted; recomputed on every read
/// against the request's notion of "now".
#[derive(Debug, Clone, Serialize)]
pub struct RankedComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub score: f64,
    pub net_score: i64,
    pub age_label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedReply {
    #[serde(flatten)]
    pub reply: Reply,
    pub score: f64,
    pub net_score: i64,
    pub age_label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentPage {
    pub items: Vec<RankedComment>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
    pub total_estimated: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplyPage {
    pub items: Vec<RankedReply>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
    pub total_estimated: u64,
}

/// A comment with its highest-ranked replies attached.
#[derive(Debug, Clone, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: RankedComment,
    pub replies: Vec<RankedReply>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadPage {
    pub items: Vec<CommentThread>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
    pub total_estimated: u64,
}
