// Cursor codec - opaque pagination tokens over a (created_at, id) pair
//
// The token is URL-safe base64 of a small JSON object carrying the creation
// timestamp (RFC 3339) and the id of the last chronologically returned row.
// There is no schema version field: a structural change to the encoded shape
// invalidates all outstanding cursors. Known limitation.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// The last-seen position of a chronological walk. Doubles as the seek key
/// for the time-index scans: rows strictly below (created_at, id) qualify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub created_at: i64,
    pub id: Uuid,
}

#[derive(Serialize, Deserialize)]
struct CursorToken {
    created_at: String,
    id: String,
}

impl PageCursor {
    pub fn new(created_at: i64, id: Uuid) -> Self {
        Self { created_at, id }
    }

    /// Serialize into an opaque token safe to embed in a URL.
    pub fn encode(&self) -> AppResult<String> {
        let created_at = DateTime::<Utc>::from_timestamp_millis(self.created_at)
            .ok_or_else(|| {
                AppError::Internal(format!("timestamp {} out of range", self.created_at))
            })?
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let token = CursorToken {
            created_at,
            id: self.id.to_string(),
        };
        let json = serde_json::to_vec(&token)
            .map_err(|e| AppError::Internal(format!("Failed to serialize cursor: {}", e)))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decode a client-held token. Every malformation maps to InvalidCursor;
    /// callers treat it as a client error and never retry server-side.
    pub fn decode(token: &str) -> AppResult<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| AppError::InvalidCursor(format!("bad encoding: {}", e)))?;
        let token: CursorToken = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::InvalidCursor(format!("bad token shape: {}", e)))?;
        let created_at = DateTime::parse_from_rfc3339(&token.created_at)
            .map_err(|e| AppError::InvalidCursor(format!("bad timestamp: {}", e)))?
            .timestamp_millis();
        let id = Uuid::parse_str(&token.id)
            .map_err(|e| AppError::InvalidCursor(format!("bad id: {}", e)))?;
        Ok(Self { created_at, id })
    }
}
