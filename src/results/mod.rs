//! Result lifecycle
//!
//! The state machine that turns a pairing's outcome authoritative:
//! claim -> confirm / dispute / cancel, the no-show path, direct submission
//! for online games, and the administrative override. All transitions on a
//! single pairing are serialized through a per-pairing lock; validation
//! happens before any write so a rejected transition changes nothing.

pub mod deadlines;

use crate::clock::Clock;
use crate::db::models::{Outcome, Pairing, TournamentStatus};
use crate::error::{AppError, ConflictReason, Result};
use crate::lookup::DetectedResult;
use crate::notify::{NotificationEvent, Notifier};
use crate::store::TournamentStore;
use chrono::Duration;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub use deadlines::{DeadlineProcessor, DeadlineReport};

pub struct ResultService {
    pub(crate) store: Arc<dyn TournamentStore>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) clock: Arc<dyn Clock>,
    /// One lock per pairing id; transitions are check-then-mutate and must
    /// not interleave on the same record.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ResultService {
    pub fn new(
        store: Arc<dyn TournamentStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) async fn lock_for(&self, pairing_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(pairing_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Pairings with an unresolved claim, for the arbiter's review queue.
    pub async fn open_claims(&self, tournament_id: &str) -> Result<Vec<Pairing>> {
        self.store.pairings_with_open_claim(tournament_id).await
    }

    /// A participant claims the outcome of an OTB game. The opponent gets
    /// the tournament's confirmation window to confirm or dispute.
    pub async fn claim_result(
        &self,
        pairing_id: &str,
        player_id: &str,
        outcome: Outcome,
    ) -> Result<Pairing> {
        if !outcome.is_claimable() {
            return Err(AppError::Validation(format!(
                "cannot claim outcome '{}'; use white_wins, black_wins or draw",
                outcome.as_str()
            )));
        }

        let lock = self.lock_for(pairing_id).await;
        let _guard = lock.lock().await;

        let mut pairing = self.store.pairing(pairing_id).await?;
        let tournament = self.store.tournament(&pairing.tournament_id).await?;

        if tournament.status != TournamentStatus::Active {
            return Err(AppError::Conflict(ConflictReason::TournamentNotActive));
        }
        if !pairing.involves(player_id) {
            return Err(AppError::Conflict(ConflictReason::NotParticipant));
        }
        if pairing.outcome != Outcome::Pending {
            return Err(AppError::Conflict(ConflictReason::AlreadyResolved));
        }
        if pairing.has_pending_claim() {
            return Err(AppError::Conflict(ConflictReason::ClaimPending));
        }

        let now = self.clock.now();
        pairing.claimed_outcome = Some(outcome);
        pairing.claimed_by = Some(player_id.to_string());
        pairing.claimed_at = Some(now);
        pairing.confirmation_deadline =
            Some(now + Duration::minutes(tournament.confirmation_window_minutes));
        // A fresh claim supersedes an earlier dispute round-trip.
        pairing.is_disputed = false;
        pairing.dispute_reason = None;

        self.store.update_pairing(&pairing).await?;

        let opponent_id = pairing.opponent_of(player_id).unwrap_or_default().to_string();
        tracing::info!(
            "Player {} claimed {} on pairing {}",
            player_id,
            outcome.as_str(),
            pairing_id
        );
        self.notifier
            .notify(NotificationEvent::ResultClaimed {
                tournament_id: pairing.tournament_id.clone(),
                pairing_id: pairing.id.clone(),
                claimer_id: player_id.to_string(),
                opponent_id,
                claimed_outcome: outcome.as_str().to_string(),
            })
            .await;

        Ok(pairing)
    }

    /// The non-claimer accepts the claim; the claimed outcome becomes
    /// authoritative and scores are applied.
    pub async fn confirm_result(&self, pairing_id: &str, player_id: &str) -> Result<Pairing> {
        let lock = self.lock_for(pairing_id).await;
        let _guard = lock.lock().await;

        let mut pairing = self.store.pairing(pairing_id).await?;

        if !pairing.has_pending_claim() {
            return Err(AppError::Conflict(ConflictReason::NoPendingClaim));
        }
        if !pairing.involves(player_id) {
            return Err(AppError::Conflict(ConflictReason::NotParticipant));
        }
        if pairing.claimed_by.as_deref() == Some(player_id) {
            return Err(AppError::Conflict(ConflictReason::SelfConfirmation));
        }

        let Some(outcome) = pairing.claimed_outcome else {
            return Err(AppError::Conflict(ConflictReason::NoPendingClaim));
        };
        let now = self.clock.now();
        pairing.outcome = outcome;
        pairing.confirmed_by = Some(player_id.to_string());
        pairing.confirmed_at = Some(now);
        pairing.played_at = Some(now);
        // Claim fields stay in place for audit.

        self.store.update_pairing(&pairing).await?;
        self.apply_scores(&pairing).await?;

        tracing::info!(
            "Player {} confirmed {} on pairing {}",
            player_id,
            outcome.as_str(),
            pairing_id
        );
        self.notifier
            .notify(NotificationEvent::ResultConfirmed {
                tournament_id: pairing.tournament_id.clone(),
                pairing_id: pairing.id.clone(),
                confirmer_id: player_id.to_string(),
                outcome: outcome.as_str().to_string(),
            })
            .await;
        self.notify_resolved(&pairing).await;

        Ok(pairing)
    }

    /// The non-claimer rejects the claim. The outcome stays pending until an
    /// administrator resolves it (or the deadline sweep does).
    pub async fn dispute_result(
        &self,
        pairing_id: &str,
        player_id: &str,
        reason: &str,
    ) -> Result<Pairing> {
        if reason.trim().is_empty() {
            return Err(AppError::Validation(
                "a dispute requires a reason".to_string(),
            ));
        }

        let lock = self.lock_for(pairing_id).await;
        let _guard = lock.lock().await;

        let mut pairing = self.store.pairing(pairing_id).await?;

        if !pairing.has_pending_claim() {
            return Err(AppError::Conflict(ConflictReason::NoPendingClaim));
        }
        if !pairing.involves(player_id) {
            return Err(AppError::Conflict(ConflictReason::NotParticipant));
        }
        if pairing.claimed_by.as_deref() == Some(player_id) {
            return Err(AppError::Conflict(ConflictReason::SelfDispute));
        }

        pairing.is_disputed = true;
        pairing.dispute_reason = Some(reason.to_string());

        self.store.update_pairing(&pairing).await?;

        tracing::info!("Player {} disputed pairing {}: {}", player_id, pairing_id, reason);
        self.notifier
            .notify(NotificationEvent::ResultDisputed {
                tournament_id: pairing.tournament_id.clone(),
                pairing_id: pairing.id.clone(),
                disputer_id: player_id.to_string(),
                reason: reason.to_string(),
            })
            .await;

        Ok(pairing)
    }

    /// The claimer retracts an accidental claim, allowed only within the
    /// 2-minute window.
    pub async fn cancel_claim(&self, pairing_id: &str, player_id: &str) -> Result<Pairing> {
        let lock = self.lock_for(pairing_id).await;
        let _guard = lock.lock().await;

        let mut pairing = self.store.pairing(pairing_id).await?;

        if !pairing.has_pending_claim() {
            return Err(AppError::Conflict(ConflictReason::NoPendingClaim));
        }
        if pairing.claimed_by.as_deref() != Some(player_id) {
            return Err(AppError::Conflict(ConflictReason::NotClaimant));
        }
        if !pairing.can_cancel_claim(self.clock.now()) {
            return Err(AppError::Conflict(ConflictReason::CancelWindowExpired));
        }

        let opponent_id = pairing.opponent_of(player_id).unwrap_or_default().to_string();
        pairing.clear_claim();

        self.store.update_pairing(&pairing).await?;

        tracing::info!("Player {} cancelled their claim on pairing {}", player_id, pairing_id);
        self.notifier
            .notify(NotificationEvent::ClaimCancelled {
                tournament_id: pairing.tournament_id.clone(),
                pairing_id: pairing.id.clone(),
                opponent_id,
            })
            .await;

        Ok(pairing)
    }

    /// A participant flags that the opponent never appeared. This only
    /// records the claim; the deadline sweep resolves it once the pairing's
    /// deadline passes. Repeating your own claim is a no-op.
    pub async fn claim_no_show(&self, pairing_id: &str, player_id: &str) -> Result<Pairing> {
        let lock = self.lock_for(pairing_id).await;
        let _guard = lock.lock().await;

        let mut pairing = self.store.pairing(pairing_id).await?;

        if !pairing.involves(player_id) {
            return Err(AppError::Conflict(ConflictReason::NotParticipant));
        }
        if pairing.outcome != Outcome::Pending {
            return Err(AppError::Conflict(ConflictReason::AlreadyResolved));
        }
        if let Some(claimer) = pairing.no_show_claimed_by.as_deref() {
            if claimer == player_id {
                return Ok(pairing);
            }
            return Err(AppError::Conflict(ConflictReason::NoShowAlreadyClaimed));
        }

        pairing.no_show_claimed_by = Some(player_id.to_string());
        pairing.no_show_claimed_at = Some(self.clock.now());

        self.store.update_pairing(&pairing).await?;

        let accused_id = pairing.opponent_of(player_id).unwrap_or_default().to_string();
        tracing::info!(
            "Player {} claimed no-show against {} on pairing {}",
            player_id,
            accused_id,
            pairing_id
        );
        self.notifier
            .notify(NotificationEvent::NoShowClaimed {
                tournament_id: pairing.tournament_id.clone(),
                pairing_id: pairing.id.clone(),
                claimer_id: player_id.to_string(),
                accused_id,
            })
            .await;

        Ok(pairing)
    }

    /// A participant records a finished online game directly, bypassing the
    /// claim handshake. Verification of `external_ref` happens outside this
    /// crate.
    pub async fn submit_result(
        &self,
        pairing_id: &str,
        player_id: &str,
        outcome: Outcome,
        external_ref: Option<String>,
    ) -> Result<Pairing> {
        if !outcome.is_claimable() {
            return Err(AppError::Validation(format!(
                "cannot submit outcome '{}'",
                outcome.as_str()
            )));
        }

        let lock = self.lock_for(pairing_id).await;
        let _guard = lock.lock().await;

        let mut pairing = self.store.pairing(pairing_id).await?;

        if !pairing.involves(player_id) {
            return Err(AppError::Conflict(ConflictReason::NotParticipant));
        }
        if pairing.outcome != Outcome::Pending {
            return Err(AppError::Conflict(ConflictReason::AlreadyResolved));
        }

        pairing.outcome = outcome;
        pairing.played_at = Some(self.clock.now());
        pairing.external_ref = external_ref;

        self.store.update_pairing(&pairing).await?;
        self.apply_scores(&pairing).await?;

        tracing::info!(
            "Player {} submitted {} on pairing {}",
            player_id,
            outcome.as_str(),
            pairing_id
        );
        self.notify_resolved(&pairing).await;

        Ok(pairing)
    }

    /// Administrative override: sets the outcome unconditionally, clearing
    /// any claim or dispute. The only transition allowed to overwrite an
    /// already-terminal outcome; scores are applied only if the pairing had
    /// not been scored before.
    pub async fn override_result(
        &self,
        pairing_id: &str,
        outcome: Outcome,
        admin_id: &str,
    ) -> Result<Pairing> {
        if outcome == Outcome::Pending || outcome == Outcome::Bye {
            return Err(AppError::Validation(format!(
                "cannot override to '{}'",
                outcome.as_str()
            )));
        }

        let lock = self.lock_for(pairing_id).await;
        let _guard = lock.lock().await;

        let mut pairing = self.store.pairing(pairing_id).await?;
        let was_pending = pairing.outcome == Outcome::Pending;
        let now = self.clock.now();

        pairing.outcome = outcome;
        pairing.played_at = Some(now);
        pairing.confirmed_by = Some(admin_id.to_string());
        pairing.confirmed_at = Some(now);
        pairing.is_disputed = false;
        pairing.dispute_reason = None;
        pairing.clear_claim();

        self.store.update_pairing(&pairing).await?;
        if was_pending {
            self.apply_scores(&pairing).await?;
        }

        tracing::info!(
            "Admin {} overrode pairing {} to {}",
            admin_id,
            pairing_id,
            outcome.as_str()
        );
        self.notify_resolved(&pairing).await;

        Ok(pairing)
    }

    /// Apply an externally detected result. Behaves like an override of a
    /// pending pairing; returns false if the pairing resolved in the
    /// meantime (detection raced a manual transition).
    pub async fn record_detected(
        &self,
        pairing_id: &str,
        detected: DetectedResult,
    ) -> Result<bool> {
        let lock = self.lock_for(pairing_id).await;
        let _guard = lock.lock().await;

        let mut pairing = self.store.pairing(pairing_id).await?;
        if pairing.outcome != Outcome::Pending {
            return Ok(false);
        }

        pairing.outcome = detected.outcome;
        pairing.played_at = Some(detected.played_at);
        pairing.external_ref = Some(detected.external_ref);
        pairing.is_disputed = false;
        pairing.dispute_reason = None;
        pairing.clear_claim();

        self.store.update_pairing(&pairing).await?;
        self.apply_scores(&pairing).await?;

        tracing::info!(
            "Auto-detected {} on pairing {}",
            detected.outcome.as_str(),
            pairing_id
        );
        self.notify_resolved(&pairing).await;

        Ok(true)
    }

    async fn notify_resolved(&self, pairing: &Pairing) {
        self.notifier
            .notify(NotificationEvent::ResultRecorded {
                tournament_id: pairing.tournament_id.clone(),
                pairing_id: pairing.id.clone(),
                outcome: pairing.outcome.as_str().to_string(),
            })
            .await;
        self.notifier
            .notify(NotificationEvent::StandingsChanged {
                tournament_id: pairing.tournament_id.clone(),
            })
            .await;
    }

    /// Apply the score update for a terminal outcome, exactly once per
    /// pairing. Forfeits award the point without touching color counters
    /// because no game was played.
    pub(crate) async fn apply_scores(&self, pairing: &Pairing) -> Result<()> {
        if pairing.is_bye() {
            return Ok(());
        }
        let (white_id, black_id) = match (&pairing.white_id, &pairing.black_id) {
            (Some(w), Some(b)) => (w.as_str(), b.as_str()),
            _ => return Ok(()),
        };

        let tid = &pairing.tournament_id;
        let mut white = self.store.roster_entry(tid, white_id).await?;
        let mut black = self.store.roster_entry(tid, black_id).await?;

        match pairing.outcome {
            Outcome::WhiteWins => {
                white.score += 1.0;
                white.wins += 1;
                white.games_as_white += 1;
                black.losses += 1;
                black.games_as_black += 1;
            }
            Outcome::BlackWins => {
                black.score += 1.0;
                black.wins += 1;
                black.games_as_black += 1;
                white.losses += 1;
                white.games_as_white += 1;
            }
            Outcome::Draw => {
                white.score += 0.5;
                white.draws += 1;
                white.games_as_white += 1;
                black.score += 0.5;
                black.draws += 1;
                black.games_as_black += 1;
            }
            Outcome::WhiteForfeit => {
                black.score += 1.0;
                black.wins += 1;
                white.losses += 1;
            }
            Outcome::BlackForfeit => {
                white.score += 1.0;
                white.wins += 1;
                black.losses += 1;
            }
            Outcome::DoubleForfeit => {
                white.losses += 1;
                black.losses += 1;
            }
            Outcome::Pending | Outcome::Bye => return Ok(()),
        }

        self.store.update_roster_entry(&white).await?;
        self.store.update_roster_entry(&black).await?;

        Ok(())
    }
}
