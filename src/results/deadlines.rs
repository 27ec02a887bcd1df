//! Deadline enforcement
//!
//! Sweeps pairings whose no-show deadline has passed and resolves them by
//! forfeit. A standing no-show claim forfeits the accused side; without one,
//! both players forfeit. The sweep is idempotent: a pairing resolved between
//! selection and processing is skipped under its lock.

use crate::clock::Clock;
use crate::db::models::Outcome;
use crate::error::Result;
use crate::notify::{NotificationEvent, Notifier};
use crate::results::ResultService;
use crate::store::TournamentStore;
use std::sync::Arc;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineReport {
    /// Pairings resolved by this sweep.
    pub processed: usize,
    /// Single-sided forfeits among them.
    pub forfeits: usize,
    /// Double forfeits among them.
    pub double_forfeits: usize,
}

pub struct DeadlineProcessor {
    store: Arc<dyn TournamentStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    results: Arc<ResultService>,
}

impl DeadlineProcessor {
    pub fn new(
        store: Arc<dyn TournamentStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        results: Arc<ResultService>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            results,
        }
    }

    /// Resolve every expired pending pairing of one tournament.
    pub async fn process_tournament(&self, tournament_id: &str) -> Result<DeadlineReport> {
        let now = self.clock.now();
        let expired = self
            .store
            .pending_pairings_past_deadline(tournament_id, now)
            .await?;

        let mut report = DeadlineReport::default();
        for candidate in expired {
            let lock = self.results.lock_for(&candidate.id).await;
            let _guard = lock.lock().await;

            // Re-read under the lock; a result may have landed meanwhile.
            let mut pairing = self.store.pairing(&candidate.id).await?;
            if pairing.outcome != Outcome::Pending {
                continue;
            }

            let outcome = match pairing.no_show_claimed_by.as_deref() {
                Some(claimer) if pairing.white_id.as_deref() == Some(claimer) => {
                    Outcome::BlackForfeit
                }
                Some(_) => Outcome::WhiteForfeit,
                None => Outcome::DoubleForfeit,
            };

            pairing.outcome = outcome;
            pairing.played_at = Some(now);
            pairing.is_disputed = false;
            pairing.dispute_reason = None;
            pairing.clear_claim();

            self.store.update_pairing(&pairing).await?;
            self.results.apply_scores(&pairing).await?;

            report.processed += 1;
            if outcome == Outcome::DoubleForfeit {
                report.double_forfeits += 1;
            } else {
                report.forfeits += 1;
            }

            tracing::info!(
                "Deadline passed on pairing {}: resolved as {}",
                pairing.id,
                outcome.as_str()
            );
            self.notifier
                .notify(NotificationEvent::ResultRecorded {
                    tournament_id: pairing.tournament_id.clone(),
                    pairing_id: pairing.id.clone(),
                    outcome: outcome.as_str().to_string(),
                })
                .await;
            self.notifier
                .notify(NotificationEvent::StandingsChanged {
                    tournament_id: pairing.tournament_id.clone(),
                })
                .await;
        }

        if report.processed > 0 {
            tracing::info!(
                "Tournament {}: {} pairing(s) forfeited on deadline ({} double)",
                tournament_id,
                report.processed,
                report.double_forfeits
            );
        }

        Ok(report)
    }
}
