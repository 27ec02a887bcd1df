//! SQLite-backed store.

use super::TournamentStore;
use crate::db::models::{Outcome, Pairing, RosterEntry, Tournament};
use crate::db::DbPool;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct SqliteStore {
    pool: Arc<DbPool>,
}

impl SqliteStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TournamentStore for SqliteStore {
    async fn insert_tournament(&self, tournament: &Tournament) -> Result<()> {
        sqlx::query(
            "INSERT INTO tournaments (
                id, name, format, total_rounds, current_round, status,
                confirmation_window_minutes, pairing_deadline_hours,
                created_at, finished_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&tournament.id)
        .bind(&tournament.name)
        .bind(tournament.format)
        .bind(tournament.total_rounds)
        .bind(tournament.current_round)
        .bind(tournament.status)
        .bind(tournament.confirmation_window_minutes)
        .bind(tournament.pairing_deadline_hours)
        .bind(tournament.created_at)
        .bind(tournament.finished_at)
        .execute(&*self.pool)
        .await?;

        Ok(())
    }

    async fn tournament(&self, id: &str) -> Result<Tournament> {
        sqlx::query_as::<_, Tournament>("SELECT * FROM tournaments WHERE id = ?")
            .bind(id)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => AppError::NotFound("Tournament not found".to_string()),
                _ => AppError::Database(e),
            })
    }

    async fn active_tournaments(&self) -> Result<Vec<Tournament>> {
        Ok(sqlx::query_as::<_, Tournament>(
            "SELECT * FROM tournaments WHERE status = 'active' ORDER BY created_at",
        )
        .fetch_all(&*self.pool)
        .await?)
    }

    async fn update_tournament(&self, tournament: &Tournament) -> Result<()> {
        sqlx::query(
            "UPDATE tournaments
             SET name = ?, format = ?, total_rounds = ?, current_round = ?,
                 status = ?, confirmation_window_minutes = ?,
                 pairing_deadline_hours = ?, finished_at = ?
             WHERE id = ?",
        )
        .bind(&tournament.name)
        .bind(tournament.format)
        .bind(tournament.total_rounds)
        .bind(tournament.current_round)
        .bind(tournament.status)
        .bind(tournament.confirmation_window_minutes)
        .bind(tournament.pairing_deadline_hours)
        .bind(tournament.finished_at)
        .bind(&tournament.id)
        .execute(&*self.pool)
        .await?;

        Ok(())
    }

    async fn insert_roster_entry(&self, entry: &RosterEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO roster_entries (
                tournament_id, player_id, seed_rating, score, wins, draws,
                losses, games_as_white, games_as_black, final_rank,
                is_withdrawn, joined_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.tournament_id)
        .bind(&entry.player_id)
        .bind(entry.seed_rating)
        .bind(entry.score)
        .bind(entry.wins)
        .bind(entry.draws)
        .bind(entry.losses)
        .bind(entry.games_as_white)
        .bind(entry.games_as_black)
        .bind(entry.final_rank)
        .bind(entry.is_withdrawn)
        .bind(entry.joined_at)
        .execute(&*self.pool)
        .await?;

        Ok(())
    }

    async fn roster(&self, tournament_id: &str) -> Result<Vec<RosterEntry>> {
        Ok(sqlx::query_as::<_, RosterEntry>(
            "SELECT * FROM roster_entries WHERE tournament_id = ? ORDER BY player_id",
        )
        .bind(tournament_id)
        .fetch_all(&*self.pool)
        .await?)
    }

    async fn roster_entry(&self, tournament_id: &str, player_id: &str) -> Result<RosterEntry> {
        sqlx::query_as::<_, RosterEntry>(
            "SELECT * FROM roster_entries WHERE tournament_id = ? AND player_id = ?",
        )
        .bind(tournament_id)
        .bind(player_id)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Roster entry not found".to_string()),
            _ => AppError::Database(e),
        })
    }

    async fn update_roster_entry(&self, entry: &RosterEntry) -> Result<()> {
        sqlx::query(
            "UPDATE roster_entries
             SET seed_rating = ?, score = ?, wins = ?, draws = ?, losses = ?,
                 games_as_white = ?, games_as_black = ?, final_rank = ?,
                 is_withdrawn = ?
             WHERE tournament_id = ? AND player_id = ?",
        )
        .bind(entry.seed_rating)
        .bind(entry.score)
        .bind(entry.wins)
        .bind(entry.draws)
        .bind(entry.losses)
        .bind(entry.games_as_white)
        .bind(entry.games_as_black)
        .bind(entry.final_rank)
        .bind(entry.is_withdrawn)
        .bind(&entry.tournament_id)
        .bind(&entry.player_id)
        .execute(&*self.pool)
        .await?;

        Ok(())
    }

    async fn insert_pairings(&self, pairings: &[Pairing]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for pairing in pairings {
            sqlx::query(
                "INSERT INTO pairings (
                    id, tournament_id, round_number, board_number, white_id,
                    black_id, outcome, deadline, played_at, no_show_claimed_by,
                    no_show_claimed_at, claimed_outcome, claimed_by, claimed_at,
                    confirmation_deadline, confirmed_by, confirmed_at,
                    is_disputed, dispute_reason, external_ref, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&pairing.id)
            .bind(&pairing.tournament_id)
            .bind(pairing.round_number)
            .bind(pairing.board_number)
            .bind(&pairing.white_id)
            .bind(&pairing.black_id)
            .bind(pairing.outcome)
            .bind(pairing.deadline)
            .bind(pairing.played_at)
            .bind(&pairing.no_show_claimed_by)
            .bind(pairing.no_show_claimed_at)
            .bind(pairing.claimed_outcome)
            .bind(&pairing.claimed_by)
            .bind(pairing.claimed_at)
            .bind(pairing.confirmation_deadline)
            .bind(&pairing.confirmed_by)
            .bind(pairing.confirmed_at)
            .bind(pairing.is_disputed)
            .bind(&pairing.dispute_reason)
            .bind(&pairing.external_ref)
            .bind(pairing.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn pairing(&self, id: &str) -> Result<Pairing> {
        sqlx::query_as::<_, Pairing>("SELECT * FROM pairings WHERE id = ?")
            .bind(id)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => AppError::NotFound("Pairing not found".to_string()),
                _ => AppError::Database(e),
            })
    }

    async fn pairings_for_tournament(&self, tournament_id: &str) -> Result<Vec<Pairing>> {
        Ok(sqlx::query_as::<_, Pairing>(
            "SELECT * FROM pairings WHERE tournament_id = ?
             ORDER BY round_number, board_number",
        )
        .bind(tournament_id)
        .fetch_all(&*self.pool)
        .await?)
    }

    async fn pairings_for_round(&self, tournament_id: &str, round: i64) -> Result<Vec<Pairing>> {
        Ok(sqlx::query_as::<_, Pairing>(
            "SELECT * FROM pairings WHERE tournament_id = ? AND round_number = ?
             ORDER BY board_number",
        )
        .bind(tournament_id)
        .bind(round)
        .fetch_all(&*self.pool)
        .await?)
    }

    async fn pending_pairings(&self, tournament_id: &str) -> Result<Vec<Pairing>> {
        Ok(sqlx::query_as::<_, Pairing>(
            "SELECT * FROM pairings WHERE tournament_id = ? AND outcome = ?
             ORDER BY round_number, board_number",
        )
        .bind(tournament_id)
        .bind(Outcome::Pending)
        .fetch_all(&*self.pool)
        .await?)
    }

    async fn pending_pairings_past_deadline(
        &self,
        tournament_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Pairing>> {
        Ok(sqlx::query_as::<_, Pairing>(
            "SELECT * FROM pairings
             WHERE tournament_id = ? AND outcome = ? AND deadline < ?
             ORDER BY round_number, board_number",
        )
        .bind(tournament_id)
        .bind(Outcome::Pending)
        .bind(now)
        .fetch_all(&*self.pool)
        .await?)
    }

    async fn pairings_with_open_claim(&self, tournament_id: &str) -> Result<Vec<Pairing>> {
        Ok(sqlx::query_as::<_, Pairing>(
            "SELECT * FROM pairings
             WHERE tournament_id = ? AND claimed_outcome IS NOT NULL AND outcome = ?
             ORDER BY round_number, board_number",
        )
        .bind(tournament_id)
        .bind(Outcome::Pending)
        .fetch_all(&*self.pool)
        .await?)
    }

    async fn update_pairing(&self, pairing: &Pairing) -> Result<()> {
        sqlx::query(
            "UPDATE pairings
             SET outcome = ?, deadline = ?, played_at = ?, no_show_claimed_by = ?,
                 no_show_claimed_at = ?, claimed_outcome = ?, claimed_by = ?,
                 claimed_at = ?, confirmation_deadline = ?, confirmed_by = ?,
                 confirmed_at = ?, is_disputed = ?, dispute_reason = ?,
                 external_ref = ?
             WHERE id = ?",
        )
        .bind(pairing.outcome)
        .bind(pairing.deadline)
        .bind(pairing.played_at)
        .bind(&pairing.no_show_claimed_by)
        .bind(pairing.no_show_claimed_at)
        .bind(pairing.claimed_outcome)
        .bind(&pairing.claimed_by)
        .bind(pairing.claimed_at)
        .bind(pairing.confirmation_deadline)
        .bind(&pairing.confirmed_by)
        .bind(pairing.confirmed_at)
        .bind(pairing.is_disputed)
        .bind(&pairing.dispute_reason)
        .bind(&pairing.external_ref)
        .bind(&pairing.id)
        .execute(&*self.pool)
        .await?;

        Ok(())
    }
}
