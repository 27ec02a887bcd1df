//! Tournament lifecycle
//!
//! Creation, registration, withdrawal and the registration -> active ->
//! completed/cancelled transitions. Round generation and finalization live
//! in the automation layer; this module only gates what players and
//! organizers may do at each stage.

use crate::clock::Clock;
use crate::db::models::{
    RosterEntry, Tournament, TournamentFormat, TournamentStatus,
};
use crate::error::{AppError, ConflictReason, Result};
use crate::pairing;
use crate::store::TournamentStore;
use std::sync::Arc;

pub struct TournamentService {
    store: Arc<dyn TournamentStore>,
    clock: Arc<dyn Clock>,
}

impl TournamentService {
    pub fn new(store: Arc<dyn TournamentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn create_tournament(
        &self,
        name: &str,
        format: TournamentFormat,
        total_rounds: i64,
        confirmation_window_minutes: Option<i64>,
        pairing_deadline_hours: Option<i64>,
    ) -> Result<Tournament> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("tournament name is required".to_string()));
        }
        if total_rounds < 1 {
            return Err(AppError::Validation(
                "a tournament needs at least one round".to_string(),
            ));
        }

        let mut tournament = Tournament::new(name.trim().to_string(), format, total_rounds);
        tournament.created_at = self.clock.now();
        if let Some(minutes) = confirmation_window_minutes {
            if minutes < 1 {
                return Err(AppError::Validation(
                    "confirmation window must be at least one minute".to_string(),
                ));
            }
            tournament.confirmation_window_minutes = minutes;
        }
        if let Some(hours) = pairing_deadline_hours {
            if hours < 1 {
                return Err(AppError::Validation(
                    "pairing deadline must be at least one hour".to_string(),
                ));
            }
            tournament.pairing_deadline_hours = hours;
        }

        self.store.insert_tournament(&tournament).await?;
        tracing::info!("Created tournament {} ({})", tournament.name, tournament.id);

        Ok(tournament)
    }

    /// Register a player while the tournament is still open.
    pub async fn register_player(
        &self,
        tournament_id: &str,
        player_id: &str,
        rating: i64,
    ) -> Result<RosterEntry> {
        let tournament = self.store.tournament(tournament_id).await?;
        if tournament.status != TournamentStatus::Registration {
            return Err(AppError::Conflict(ConflictReason::TournamentNotActive));
        }
        if self.store.roster_entry(tournament_id, player_id).await.is_ok() {
            return Err(AppError::Conflict(ConflictReason::AlreadyRegistered));
        }

        let mut entry =
            RosterEntry::new(tournament_id.to_string(), player_id.to_string(), rating);
        entry.joined_at = self.clock.now();
        self.store.insert_roster_entry(&entry).await?;

        tracing::info!("Player {} registered for tournament {}", player_id, tournament_id);
        Ok(entry)
    }

    /// Withdraw a player. Before the start this removes them from pairing
    /// consideration entirely; mid-tournament they keep played results but
    /// are skipped by future rounds and excluded from standings.
    pub async fn withdraw_player(&self, tournament_id: &str, player_id: &str) -> Result<()> {
        let tournament = self.store.tournament(tournament_id).await?;
        if tournament.status == TournamentStatus::Completed
            || tournament.status == TournamentStatus::Cancelled
        {
            return Err(AppError::Conflict(ConflictReason::TournamentNotActive));
        }

        let mut entry = self.store.roster_entry(tournament_id, player_id).await?;
        if entry.is_withdrawn {
            return Ok(());
        }
        entry.is_withdrawn = true;
        self.store.update_roster_entry(&entry).await?;

        tracing::info!("Player {} withdrew from tournament {}", player_id, tournament_id);
        Ok(())
    }

    /// Close registration and activate. Round one is generated by the next
    /// automation pass.
    pub async fn start_tournament(&self, tournament_id: &str) -> Result<Tournament> {
        let mut tournament = self.store.tournament(tournament_id).await?;
        if tournament.status != TournamentStatus::Registration {
            return Err(AppError::Conflict(ConflictReason::TournamentNotActive));
        }

        let roster = self.store.roster(tournament_id).await?;
        let active = roster.iter().filter(|e| !e.is_withdrawn).count();
        if active < 2 {
            return Err(AppError::InsufficientPlayers { active });
        }

        if let Some(required) = pairing::required_rounds(tournament.format, active) {
            if tournament.total_rounds < required {
                return Err(AppError::Validation(format!(
                    "round robin with {} players needs {} rounds, tournament has {}",
                    active, required, tournament.total_rounds
                )));
            }
        }

        tournament.status = TournamentStatus::Active;
        self.store.update_tournament(&tournament).await?;

        tracing::info!(
            "Tournament {} started with {} players",
            tournament_id,
            active
        );
        Ok(tournament)
    }

    pub async fn cancel_tournament(&self, tournament_id: &str) -> Result<Tournament> {
        let mut tournament = self.store.tournament(tournament_id).await?;
        if tournament.status == TournamentStatus::Completed
            || tournament.status == TournamentStatus::Cancelled
        {
            return Err(AppError::Conflict(ConflictReason::TournamentNotActive));
        }

        tournament.status = TournamentStatus::Cancelled;
        tournament.finished_at = Some(self.clock.now());
        self.store.update_tournament(&tournament).await?;

        tracing::info!("Tournament {} cancelled", tournament_id);
        Ok(tournament)
    }
}
