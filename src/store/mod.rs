//! Persistence boundary
//!
//! The core never talks to a database directly; it goes through
//! [`TournamentStore`]. `SqliteStore` is the production implementation,
//! `MemoryStore` the fake the test suites run against.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::db::models::{Pairing, RosterEntry, Tournament};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait TournamentStore: Send + Sync {
    // Tournaments
    async fn insert_tournament(&self, tournament: &Tournament) -> Result<()>;
    async fn tournament(&self, id: &str) -> Result<Tournament>;
    async fn active_tournaments(&self) -> Result<Vec<Tournament>>;
    async fn update_tournament(&self, tournament: &Tournament) -> Result<()>;

    // Roster
    async fn insert_roster_entry(&self, entry: &RosterEntry) -> Result<()>;
    async fn roster(&self, tournament_id: &str) -> Result<Vec<RosterEntry>>;
    async fn roster_entry(&self, tournament_id: &str, player_id: &str) -> Result<RosterEntry>;
    async fn update_roster_entry(&self, entry: &RosterEntry) -> Result<()>;

    // Pairings
    async fn insert_pairings(&self, pairings: &[Pairing]) -> Result<()>;
    async fn pairing(&self, id: &str) -> Result<Pairing>;
    async fn pairings_for_tournament(&self, tournament_id: &str) -> Result<Vec<Pairing>>;
    async fn pairings_for_round(&self, tournament_id: &str, round: i64) -> Result<Vec<Pairing>>;
    /// All pairings still awaiting an outcome.
    async fn pending_pairings(&self, tournament_id: &str) -> Result<Vec<Pairing>>;
    /// Pending pairings whose no-show deadline has lapsed.
    async fn pending_pairings_past_deadline(
        &self,
        tournament_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Pairing>>;
    /// Pairings with an outstanding, unresolved result claim.
    async fn pairings_with_open_claim(&self, tournament_id: &str) -> Result<Vec<Pairing>>;
    async fn update_pairing(&self, pairing: &Pairing) -> Result<()>;
}
