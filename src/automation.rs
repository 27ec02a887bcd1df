//! Automation loop
//!
//! A background pass over every active tournament, in a fixed order per
//! tournament: detect externally played results, enforce no-show deadlines,
//! then advance to the next round or finalize. Each phase observes the
//! writes of the previous one, so a detected result can tip a round into
//! completion within the same cycle.

use crate::clock::Clock;
use crate::db::models::{
    Outcome, Pairing, Tournament, TournamentStatus,
};
use crate::error::Result;
use crate::lookup::ResultSource;
use crate::notify::{NotificationEvent, Notifier};
use crate::pairing::{self, PairingPlayer};
use crate::results::{DeadlineProcessor, ResultService};
use crate::standings;
use crate::store::TournamentStore;
use chrono::Duration;
use std::sync::Arc;
use tokio::sync::watch;

pub struct AutomationScheduler {
    store: Arc<dyn TournamentStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    results: Arc<ResultService>,
    deadlines: Arc<DeadlineProcessor>,
    source: Arc<dyn ResultSource>,
    interval_secs: u64,
}

/// Handle returned by [`AutomationScheduler::start`]; dropping it does not
/// stop the loop, calling [`SchedulerHandle::stop`] does.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl SchedulerHandle {
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

impl AutomationScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn TournamentStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        results: Arc<ResultService>,
        deadlines: Arc<DeadlineProcessor>,
        source: Arc<dyn ResultSource>,
        interval_secs: u64,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            results,
            deadlines,
            source,
            interval_secs,
        }
    }

    /// Spawn the periodic loop. One cycle runs immediately.
    pub fn start(self: Arc<Self>) -> SchedulerHandle {
        let (shutdown, mut watcher) = watch::channel(false);
        let interval = std::time::Duration::from_secs(self.interval_secs);
        let scheduler = self;

        let task = tokio::spawn(async move {
            tracing::info!(
                "Automation loop started, interval {}s",
                scheduler.interval_secs
            );
            loop {
                if let Err(err) = scheduler.run_cycle().await {
                    tracing::error!("Automation cycle failed: {}", err);
                }
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = watcher.changed() => {
                        if *watcher.borrow() {
                            tracing::info!("Automation loop stopping");
                            break;
                        }
                    }
                }
            }
        });

        SchedulerHandle { shutdown, task }
    }

    /// One full pass over all active tournaments. A failure in one
    /// tournament is logged and does not block the others.
    pub async fn run_cycle(&self) -> Result<()> {
        let active = self.store.active_tournaments().await?;
        for tournament in active {
            if let Err(err) = self.process_tournament(&tournament).await {
                tracing::error!(
                    "Automation pass failed for tournament {}: {}",
                    tournament.id,
                    err
                );
            }
        }
        Ok(())
    }

    async fn process_tournament(&self, tournament: &Tournament) -> Result<()> {
        self.detect_results(tournament).await?;
        self.deadlines.process_tournament(&tournament.id).await?;
        self.advance_if_round_complete(&tournament.id).await?;
        Ok(())
    }

    /// Ask the external source about every pending two-sided pairing of the
    /// current round. Lookups run outside the pairing locks; recording
    /// re-checks under the lock and drops results that raced a manual
    /// transition.
    async fn detect_results(&self, tournament: &Tournament) -> Result<()> {
        if tournament.current_round == 0 {
            return Ok(());
        }
        let pending = self.store.pending_pairings(&tournament.id).await?;
        for pairing in pending {
            let (Some(white), Some(black)) = (&pairing.white_id, &pairing.black_id) else {
                continue;
            };
            let found = match self
                .source
                .find_recent_result(white, black, pairing.created_at)
                .await
            {
                Ok(found) => found,
                Err(err) => {
                    tracing::warn!(
                        "Result lookup failed for pairing {}: {}",
                        pairing.id,
                        err
                    );
                    continue;
                }
            };
            if let Some(detected) = found {
                self.results.record_detected(&pairing.id, detected).await?;
            }
        }
        Ok(())
    }

    /// If every pairing of the current round is resolved, either generate
    /// the next round or finalize the tournament.
    async fn advance_if_round_complete(&self, tournament_id: &str) -> Result<()> {
        // Re-read: earlier phases may have resolved pairings.
        let tournament = self.store.tournament(tournament_id).await?;
        if tournament.status != TournamentStatus::Active {
            return Ok(());
        }

        if tournament.current_round > 0 {
            let open = self.store.pending_pairings(&tournament.id).await?;
            if !open.is_empty() {
                return Ok(());
            }
        }

        if tournament.current_round >= tournament.total_rounds {
            self.finalize(tournament).await
        } else {
            self.generate_next_round(tournament).await
        }
    }

    async fn generate_next_round(&self, mut tournament: Tournament) -> Result<()> {
        let roster = self.store.roster(&tournament.id).await?;
        let history = self.store.pairings_for_tournament(&tournament.id).await?;
        let opponents = pairing::opponents_from_history(&history);

        let players: Vec<PairingPlayer> = roster
            .iter()
            .map(|entry| PairingPlayer {
                id: entry.player_id.clone(),
                score: entry.score,
                rating: entry.seed_rating,
                games_as_white: entry.games_as_white,
                games_as_black: entry.games_as_black,
                opponents: opponents.get(&entry.player_id).cloned().unwrap_or_default(),
                is_withdrawn: entry.is_withdrawn,
            })
            .collect();

        let round = tournament.current_round + 1;
        let boards = match pairing::generate_round(tournament.format, &players, round) {
            Ok(boards) => boards,
            Err(err) => {
                // Too many withdrawals to continue; settle on what was played.
                tracing::warn!(
                    "Cannot pair round {} of tournament {}: {}",
                    round,
                    tournament.id,
                    err
                );
                return self.finalize(tournament).await;
            }
        };
        if boards.is_empty() {
            return self.finalize(tournament).await;
        }

        let now = self.clock.now();
        let deadline = now + Duration::hours(tournament.pairing_deadline_hours);
        let mut pairings = Vec::with_capacity(boards.len());
        for board in &boards {
            let mut pairing = Pairing::new(
                tournament.id.clone(),
                round,
                board.board_number,
                board.white_id.clone(),
                board.black_id.clone(),
                now,
            );
            if board.is_bye {
                pairing.outcome = Outcome::Bye;
                pairing.played_at = Some(now);
            } else {
                pairing.deadline = Some(deadline);
            }
            pairings.push(pairing);
        }

        self.store.insert_pairings(&pairings).await?;

        // Byes score immediately; no game will resolve them later.
        for pairing in pairings.iter().filter(|p| p.outcome == Outcome::Bye) {
            if let Some(recipient) = pairing.white_id.as_deref() {
                let mut entry = self.store.roster_entry(&tournament.id, recipient).await?;
                entry.score += 1.0;
                entry.wins += 1;
                self.store.update_roster_entry(&entry).await?;
            }
        }

        tournament.current_round = round;
        self.store.update_tournament(&tournament).await?;

        tracing::info!(
            "Tournament {}: round {} generated with {} board(s)",
            tournament.id,
            round,
            pairings.len()
        );
        self.notifier
            .notify(NotificationEvent::RoundStarted {
                tournament_id: tournament.id.clone(),
                round_number: round,
            })
            .await;
        for pairing in &pairings {
            self.notifier
                .notify(NotificationEvent::PairingCreated {
                    tournament_id: tournament.id.clone(),
                    pairing_id: pairing.id.clone(),
                    round_number: round,
                    white_id: pairing.white_id.clone(),
                    black_id: pairing.black_id.clone(),
                })
                .await;
        }

        Ok(())
    }

    /// Compute the final ordering and stamp ranks 1..N.
    async fn finalize(&self, mut tournament: Tournament) -> Result<()> {
        let roster = self.store.roster(&tournament.id).await?;
        let pairings = self.store.pairings_for_tournament(&tournament.id).await?;

        let rows = standings::standings(&roster, &pairings);
        for (index, row) in rows.iter().enumerate() {
            let mut entry = self
                .store
                .roster_entry(&tournament.id, &row.entry.player_id)
                .await?;
            entry.final_rank = Some(index as i64 + 1);
            self.store.update_roster_entry(&entry).await?;
        }

        tournament.status = TournamentStatus::Completed;
        tournament.finished_at = Some(self.clock.now());
        self.store.update_tournament(&tournament).await?;

        tracing::info!("Tournament {} completed after {} round(s)", tournament.id, tournament.current_round);
        self.notifier
            .notify(NotificationEvent::TournamentCompleted {
                tournament_id: tournament.id.clone(),
            })
            .await;

        Ok(())
    }
}
