//! Pairing engine
//!
//! Pure pairing logic: given immutable snapshots of the roster, produce one
//! round's board assignments. No I/O, no randomness; identical inputs always
//! produce identical boards. The strategy is picked once from the
//! tournament's format, not branched ad hoc at call sites.

mod round_robin;
mod swiss;

use crate::db::models::{Pairing, TournamentFormat};
use crate::error::{AppError, Result};
use std::collections::{HashMap, HashSet};

/// Roster snapshot the engine pairs from.
#[derive(Debug, Clone)]
pub struct PairingPlayer {
    pub id: String,
    pub score: f64,
    pub rating: i64,
    pub games_as_white: i64,
    pub games_as_black: i64,
    /// Opponents already faced, rebuilt from pairing history per generation.
    pub opponents: HashSet<String>,
    pub is_withdrawn: bool,
}

impl PairingPlayer {
    /// Positive means more games as white.
    pub fn color_balance(&self) -> i64 {
        self.games_as_white - self.games_as_black
    }

    pub fn needs_white(&self) -> bool {
        self.color_balance() < 0
    }

    pub fn needs_black(&self) -> bool {
        self.color_balance() > 0
    }
}

/// One generated board. Byes carry the recipient as white, no opponent, and
/// board number 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardAssignment {
    pub white_id: Option<String>,
    pub black_id: Option<String>,
    pub board_number: i64,
    pub is_bye: bool,
}

impl BoardAssignment {
    fn board(white_id: String, black_id: String, board_number: i64) -> Self {
        Self {
            white_id: Some(white_id),
            black_id: Some(black_id),
            board_number,
            is_bye: false,
        }
    }

    fn bye(player_id: String) -> Self {
        Self {
            white_id: Some(player_id),
            black_id: None,
            board_number: 0,
            is_bye: true,
        }
    }
}

/// Generate one round of assignments for the given format.
///
/// Fails with `InsufficientPlayers` when fewer than 2 non-withdrawn players
/// remain; this is the engine's only failure mode.
pub fn generate_round(
    format: TournamentFormat,
    players: &[PairingPlayer],
    round_number: i64,
) -> Result<Vec<BoardAssignment>> {
    let active: Vec<PairingPlayer> = players
        .iter()
        .filter(|p| !p.is_withdrawn)
        .cloned()
        .collect();

    if active.len() < 2 {
        return Err(AppError::InsufficientPlayers {
            active: active.len(),
        });
    }

    match format {
        TournamentFormat::Swiss => Ok(swiss::generate(&active, round_number)),
        TournamentFormat::RoundRobin => Ok(round_robin::generate(&active, round_number)),
    }
}

/// Total rounds the schedule needs to cover everyone. Only round-robin has a
/// hard requirement; Swiss length is an organizer choice.
pub fn required_rounds(format: TournamentFormat, active_players: usize) -> Option<i64> {
    match format {
        TournamentFormat::Swiss => None,
        TournamentFormat::RoundRobin => Some(round_robin::required_rounds(active_players)),
    }
}

/// Rebuild the opponent adjacency from authoritative pairing history.
/// Byes never count as opponents.
pub fn opponents_from_history(pairings: &[Pairing]) -> HashMap<String, HashSet<String>> {
    let mut map: HashMap<String, HashSet<String>> = HashMap::new();
    for pairing in pairings {
        if let (Some(white), Some(black)) = (&pairing.white_id, &pairing.black_id) {
            map.entry(white.clone()).or_default().insert(black.clone());
            map.entry(black.clone()).or_default().insert(white.clone());
        }
    }
    map
}

#[cfg(test)]
pub(crate) fn test_player(id: &str, rating: i64) -> PairingPlayer {
    PairingPlayer {
        id: id.to_string(),
        score: 0.0,
        rating,
        games_as_white: 0,
        games_as_black: 0,
        opponents: HashSet::new(),
        is_withdrawn: false,
    }
}
