//! Domain records persisted per tournament.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How long a claimer may retract an accidental result claim.
pub const CLAIM_CANCEL_WINDOW_MINUTES: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TournamentStatus {
    Registration,
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TournamentFormat {
    Swiss,
    RoundRobin,
}

/// Outcome of a single pairing. Terminal once set, except through an
/// administrative override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Outcome {
    Pending,
    WhiteWins,
    BlackWins,
    Draw,
    WhiteForfeit,
    BlackForfeit,
    DoubleForfeit,
    Bye,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        self != Outcome::Pending
    }

    /// Outcomes a participant may claim over the board.
    pub fn is_claimable(self) -> bool {
        matches!(self, Outcome::WhiteWins | Outcome::BlackWins | Outcome::Draw)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Pending => "pending",
            Outcome::WhiteWins => "white_wins",
            Outcome::BlackWins => "black_wins",
            Outcome::Draw => "draw",
            Outcome::WhiteForfeit => "white_forfeit",
            Outcome::BlackForfeit => "black_forfeit",
            Outcome::DoubleForfeit => "double_forfeit",
            Outcome::Bye => "bye",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tournament {
    pub id: String,
    pub name: String,
    pub format: TournamentFormat,
    pub total_rounds: i64,
    /// 0 until the first round has been generated.
    pub current_round: i64,
    pub status: TournamentStatus,
    /// Window the opponent has to confirm an OTB result claim.
    pub confirmation_window_minutes: i64,
    /// No-show deadline applied to each new online pairing.
    pub pairing_deadline_hours: i64,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Tournament {
    pub fn new(name: String, format: TournamentFormat, total_rounds: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            format,
            total_rounds,
            current_round: 0,
            status: TournamentStatus::Registration,
            confirmation_window_minutes: 10,
            pairing_deadline_hours: 24,
            created_at: Utc::now(),
            finished_at: None,
        }
    }
}

/// A player's standing within one tournament.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RosterEntry {
    pub tournament_id: String,
    pub player_id: String,
    /// Rating at registration time; used for seeding, never recomputed.
    pub seed_rating: i64,
    pub score: f64,
    pub wins: i64,
    pub draws: i64,
    pub losses: i64,
    pub games_as_white: i64,
    pub games_as_black: i64,
    pub final_rank: Option<i64>,
    pub is_withdrawn: bool,
    pub joined_at: DateTime<Utc>,
}

impl RosterEntry {
    pub fn new(tournament_id: String, player_id: String, seed_rating: i64) -> Self {
        Self {
            tournament_id,
            player_id,
            seed_rating,
            score: 0.0,
            wins: 0,
            draws: 0,
            losses: 0,
            games_as_white: 0,
            games_as_black: 0,
            final_rank: None,
            is_withdrawn: false,
            joined_at: Utc::now(),
        }
    }
}

/// One board in one round. Created by pairing generation, mutated only by
/// the result lifecycle and deadline processing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Pairing {
    pub id: String,
    pub tournament_id: String,
    pub round_number: i64,
    /// 0 for byes, which never occupy a board.
    pub board_number: i64,
    pub white_id: Option<String>,
    pub black_id: Option<String>,
    pub outcome: Outcome,

    /// No-show deadline. None for byes.
    pub deadline: Option<DateTime<Utc>>,
    pub played_at: Option<DateTime<Utc>>,

    // No-show tracking (online play)
    pub no_show_claimed_by: Option<String>,
    pub no_show_claimed_at: Option<DateTime<Utc>>,

    // Result claim tracking (OTB play)
    pub claimed_outcome: Option<Outcome>,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub confirmation_deadline: Option<DateTime<Utc>>,

    pub confirmed_by: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub is_disputed: bool,
    pub dispute_reason: Option<String>,

    /// Reference into the external result source (e.g. a game URL).
    pub external_ref: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Pairing {
    pub fn new(
        tournament_id: String,
        round_number: i64,
        board_number: i64,
        white_id: Option<String>,
        black_id: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tournament_id,
            round_number,
            board_number,
            white_id,
            black_id,
            outcome: Outcome::Pending,
            deadline: None,
            played_at: None,
            no_show_claimed_by: None,
            no_show_claimed_at: None,
            claimed_outcome: None,
            claimed_by: None,
            claimed_at: None,
            confirmation_deadline: None,
            confirmed_by: None,
            confirmed_at: None,
            is_disputed: false,
            dispute_reason: None,
            external_ref: None,
            created_at,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.outcome == Outcome::Bye || self.white_id.is_none() || self.black_id.is_none()
    }

    pub fn involves(&self, player_id: &str) -> bool {
        self.white_id.as_deref() == Some(player_id)
            || self.black_id.as_deref() == Some(player_id)
    }

    /// The other participant, if both sides are occupied.
    pub fn opponent_of(&self, player_id: &str) -> Option<&str> {
        match (self.white_id.as_deref(), self.black_id.as_deref()) {
            (Some(w), Some(b)) if w == player_id => Some(b),
            (Some(w), Some(b)) if b == player_id => Some(w),
            _ => None,
        }
    }

    /// A claim is outstanding: submitted, undisputed, unconfirmed, and the
    /// pairing itself still unresolved.
    pub fn has_pending_claim(&self) -> bool {
        self.claimed_outcome.is_some()
            && self.outcome == Outcome::Pending
            && !self.is_disputed
            && self.confirmed_at.is_none()
    }

    pub fn can_cancel_claim(&self, now: DateTime<Utc>) -> bool {
        match self.claimed_at {
            Some(claimed_at) => {
                now < claimed_at + Duration::minutes(CLAIM_CANCEL_WINDOW_MINUTES)
            }
            None => false,
        }
    }

    pub fn clear_claim(&mut self) {
        self.claimed_outcome = None;
        self.claimed_by = None;
        self.claimed_at = None;
        self.confirmation_deadline = None;
    }
}
