//! Notification boundary
//!
//! Every state transition publishes an event. Delivery is fire-and-forget:
//! a failing notifier must never roll back or delay the transition, so the
//! trait is infallible and implementations swallow and log their own errors.

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationEvent {
    RoundStarted {
        tournament_id: String,
        round_number: i64,
    },
    PairingCreated {
        tournament_id: String,
        pairing_id: String,
        round_number: i64,
        white_id: Option<String>,
        black_id: Option<String>,
    },
    ResultClaimed {
        tournament_id: String,
        pairing_id: String,
        claimer_id: String,
        opponent_id: String,
        claimed_outcome: String,
    },
    ResultConfirmed {
        tournament_id: String,
        pairing_id: String,
        confirmer_id: String,
        outcome: String,
    },
    ResultDisputed {
        tournament_id: String,
        pairing_id: String,
        disputer_id: String,
        reason: String,
    },
    ClaimCancelled {
        tournament_id: String,
        pairing_id: String,
        opponent_id: String,
    },
    NoShowClaimed {
        tournament_id: String,
        pairing_id: String,
        claimer_id: String,
        accused_id: String,
    },
    /// A pairing reached a terminal outcome by any path.
    ResultRecorded {
        tournament_id: String,
        pairing_id: String,
        outcome: String,
    },
    StandingsChanged {
        tournament_id: String,
    },
    TournamentCompleted {
        tournament_id: String,
    },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: NotificationEvent);
}

/// Discards everything.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _event: NotificationEvent) {}
}

/// Emits each event as a structured log line. Default for the daemon, where
/// real delivery (push/SMS/websocket) lives outside this crate.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: NotificationEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => tracing::info!(event = %json, "notification"),
            Err(err) => tracing::warn!("failed to serialize notification: {}", err),
        }
    }
}
