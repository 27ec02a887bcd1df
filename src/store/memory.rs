//! In-memory store, used as the persistence fake in tests and suitable for
//! single-process demos. Mirrors the semantics of `SqliteStore` exactly.

use super::TournamentStore;
use crate::db::models::{Outcome, Pairing, RosterEntry, Tournament, TournamentStatus};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    tournaments: HashMap<String, Tournament>,
    // Keyed by (tournament_id, player_id)
    roster: HashMap<(String, String), RosterEntry>,
    pairings: HashMap<String, Pairing>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_pairings(pairings: &mut Vec<Pairing>) {
    pairings.sort_by_key(|p| (p.round_number, p.board_number, p.id.clone()));
}

#[async_trait]
impl TournamentStore for MemoryStore {
    async fn insert_tournament(&self, tournament: &Tournament) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .tournaments
            .insert(tournament.id.clone(), tournament.clone());
        Ok(())
    }

    async fn tournament(&self, id: &str) -> Result<Tournament> {
        let tables = self.tables.read().await;
        tables
            .tournaments
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Tournament not found".to_string()))
    }

    async fn active_tournaments(&self) -> Result<Vec<Tournament>> {
        let tables = self.tables.read().await;
        let mut active: Vec<Tournament> = tables
            .tournaments
            .values()
            .filter(|t| t.status == TournamentStatus::Active)
            .cloned()
            .collect();
        active.sort_by_key(|t| (t.created_at, t.id.clone()));
        Ok(active)
    }

    async fn update_tournament(&self, tournament: &Tournament) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.tournaments.contains_key(&tournament.id) {
            return Err(AppError::NotFound("Tournament not found".to_string()));
        }
        tables
            .tournaments
            .insert(tournament.id.clone(), tournament.clone());
        Ok(())
    }

    async fn insert_roster_entry(&self, entry: &RosterEntry) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.roster.insert(
            (entry.tournament_id.clone(), entry.player_id.clone()),
            entry.clone(),
        );
        Ok(())
    }

    async fn roster(&self, tournament_id: &str) -> Result<Vec<RosterEntry>> {
        let tables = self.tables.read().await;
        let mut entries: Vec<RosterEntry> = tables
            .roster
            .values()
            .filter(|e| e.tournament_id == tournament_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.player_id.cmp(&b.player_id));
        Ok(entries)
    }

    async fn roster_entry(&self, tournament_id: &str, player_id: &str) -> Result<RosterEntry> {
        let tables = self.tables.read().await;
        tables
            .roster
            .get(&(tournament_id.to_string(), player_id.to_string()))
            .cloned()
            .ok_or_else(|| AppError::NotFound("Roster entry not found".to_string()))
    }

    async fn update_roster_entry(&self, entry: &RosterEntry) -> Result<()> {
        let mut tables = self.tables.write().await;
        let key = (entry.tournament_id.clone(), entry.player_id.clone());
        if !tables.roster.contains_key(&key) {
            return Err(AppError::NotFound("Roster entry not found".to_string()));
        }
        tables.roster.insert(key, entry.clone());
        Ok(())
    }

    async fn insert_pairings(&self, pairings: &[Pairing]) -> Result<()> {
        let mut tables = self.tables.write().await;
        for pairing in pairings {
            tables.pairings.insert(pairing.id.clone(), pairing.clone());
        }
        Ok(())
    }

    async fn pairing(&self, id: &str) -> Result<Pairing> {
        let tables = self.tables.read().await;
        tables
            .pairings
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Pairing not found".to_string()))
    }

    async fn pairings_for_tournament(&self, tournament_id: &str) -> Result<Vec<Pairing>> {
        let tables = self.tables.read().await;
        let mut pairings: Vec<Pairing> = tables
            .pairings
            .values()
            .filter(|p| p.tournament_id == tournament_id)
            .cloned()
            .collect();
        sort_pairings(&mut pairings);
        Ok(pairings)
    }

    async fn pairings_for_round(&self, tournament_id: &str, round: i64) -> Result<Vec<Pairing>> {
        let tables = self.tables.read().await;
        let mut pairings: Vec<Pairing> = tables
            .pairings
            .values()
            .filter(|p| p.tournament_id == tournament_id && p.round_number == round)
            .cloned()
            .collect();
        sort_pairings(&mut pairings);
        Ok(pairings)
    }

    async fn pending_pairings(&self, tournament_id: &str) -> Result<Vec<Pairing>> {
        let tables = self.tables.read().await;
        let mut pairings: Vec<Pairing> = tables
            .pairings
            .values()
            .filter(|p| p.tournament_id == tournament_id && p.outcome == Outcome::Pending)
            .cloned()
            .collect();
        sort_pairings(&mut pairings);
        Ok(pairings)
    }

    async fn pending_pairings_past_deadline(
        &self,
        tournament_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Pairing>> {
        let tables = self.tables.read().await;
        let mut pairings: Vec<Pairing> = tables
            .pairings
            .values()
            .filter(|p| {
                p.tournament_id == tournament_id
                    && p.outcome == Outcome::Pending
                    && p.deadline.map(|d| d < now).unwrap_or(false)
            })
            .cloned()
            .collect();
        sort_pairings(&mut pairings);
        Ok(pairings)
    }

    async fn pairings_with_open_claim(&self, tournament_id: &str) -> Result<Vec<Pairing>> {
        let tables = self.tables.read().await;
        let mut pairings: Vec<Pairing> = tables
            .pairings
            .values()
            .filter(|p| {
                p.tournament_id == tournament_id
                    && p.claimed_outcome.is_some()
                    && p.outcome == Outcome::Pending
            })
            .cloned()
            .collect();
        sort_pairings(&mut pairings);
        Ok(pairings)
    }

    async fn update_pairing(&self, pairing: &Pairing) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.pairings.contains_key(&pairing.id) {
            return Err(AppError::NotFound("Pairing not found".to_string()));
        }
        tables.pairings.insert(pairing.id.clone(), pairing.clone());
        Ok(())
    }
}
