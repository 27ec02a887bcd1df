//! External game-result lookup
//!
//! The automation loop asks this collaborator whether a game between two
//! paired players has already been played on the external platform. "Not
//! found" is the normal case and must be cheap; real implementations (e.g. a
//! Chess.com archive client) live outside this crate.

use crate::db::models::Outcome;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A result discovered on the external platform.
#[derive(Debug, Clone)]
pub struct DetectedResult {
    /// One of white_wins / black_wins / draw.
    pub outcome: Outcome,
    /// Platform reference (game URL or id) kept for audit.
    pub external_ref: String,
    pub played_at: DateTime<Utc>,
}

#[async_trait]
pub trait ResultSource: Send + Sync {
    /// Look for a finished game between the two players played after
    /// `since`. `Ok(None)` means nothing was found yet.
    async fn find_recent_result(
        &self,
        white_id: &str,
        black_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<DetectedResult>>;
}

/// A source that never finds anything; auto-detection becomes a no-op.
pub struct NullResultSource;

#[async_trait]
impl ResultSource for NullResultSource {
    async fn find_recent_result(
        &self,
        _white_id: &str,
        _black_id: &str,
        _since: DateTime<Utc>,
    ) -> Result<Option<DetectedResult>> {
        Ok(None)
    }
}
