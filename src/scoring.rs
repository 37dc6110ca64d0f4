// Scoring engine - recency/engagement rank scores and age labels
//
// Pure functions of (entity, now_millis). "now" is always passed explicitly
// so results are deterministic and testable without clock mocking.

use crate::models::{Comment, RankedComment, RankedReply, Reply};

const MILLIS_PER_MINUTE: i64 = 60 * 1000;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;
const MILLIS_PER_WEEK: i64 = 7 * MILLIS_PER_DAY;
const MILLIS_PER_MONTH: i64 = 30 * MILLIS_PER_DAY;
const MILLIS_PER_YEAR: i64 = 365 * MILLIS_PER_DAY;

pub fn net_score(likes: i64, dislikes: i64) -> i64 {
    likes - dislikes
}

/// Step function over age in hours. Thresholds are inclusive upper bounds,
/// evaluated in ascending order, first match wins.
pub fn recency_bonus(age_hours: f64) -> f64 {
    if age_hours <= 1.0 {
        10.0
    } else if age_hours <= 6.0 {
        8.0
    } else if age_hours <= 24.0 {
        6.0
    } else if age_hours <= 168.0 {
        4.0
    } else if age_hours <= 672.0 {
        2.0
    } else {
        0.0
    }
}

/// Half a point per reply, capped at 5. Comments only; replies never carry it.
pub fn reply_bonus(reply_count: i64) -> f64 {
    (reply_count as f64 * 0.5).min(5.0)
}

fn age_hours(created_at: i64, now_millis: i64) -> f64 {
    now_millis.saturating_sub(created_at).max(0) as f64 / MILLIS_PER_HOUR as f64
}

/// A negative net score is floored at zero before the bonuses are added:
/// dislikes cannot drive the score negative, and a heavily-disliked but
/// brand-new comment still receives its full recency bonus.
pub fn comment_score(comment: &Comment, now_millis: i64) -> f64 {
    net_score(comment.likes, comment.dislikes).max(0) as f64
        + recency_bonus(age_hours(comment.created_at, now_millis))
        + reply_bonus(comment.reply_count)
}

pub fn reply_score(reply: &Reply, now_millis: i64) -> f64 {
    net_score(reply.likes, reply.dislikes).max(0) as f64
        + recency_bonus(age_hours(reply.created_at, now_millis))
}

/// Largest whole unit with count >= 1, pluralized past one; under a minute
/// falls back to "just now".
pub fn age_label(created_at: i64, now_millis: i64) -> String {
    let elapsed = now_millis.saturating_sub(created_at).max(0);
    let units = [
        (MILLIS_PER_YEAR, "year"),
        (MILLIS_PER_MONTH, "month"),
        (MILLIS_PER_WEEK, "week"),
        (MILLIS_PER_DAY, "day"),
        (MILLIS_PER_HOUR, "hour"),
        (MILLIS_PER_MINUTE, "minute"),
    ];
    for (span, unit) in units {
        let count = elapsed / span;
        if count >= 1 {
            return if count == 1 {
                format!("1 {} ago", unit)
            } else {
                format!("{} {}s ago", count, unit)
            };
        }
    }
    "just now".to_string()
}

pub fn rank_comment(comment: Comment, now_millis: i64) -> RankedComment {
    let score = comment_score(&comment, now_millis);
    let net_score = net_score(comment.likes, comment.dislikes);
    let age_label = age_label(comment.created_at, now_millis);
    RankedComment {
        comment,
        score,
        net_score,
        age_label,
    }
}

pub fn rank_reply(reply: Reply, now_millis: i64) -> RankedReply {
    let score = reply_score(&reply, now_millis);
    let net_score = net_score(reply.likes, reply.dislikes);
    let age_label = age_label(reply.created_at, now_millis);
    RankedReply {
        reply,
        score,
        net_score,
        age_label,
    }
}
