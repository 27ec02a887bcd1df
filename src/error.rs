//! Crate-wide error types
//!
//! Every fallible operation in the core returns `Result<T>` with a typed
//! error. Callers can match on the variant to distinguish recoverable
//! validation problems from conflicts and infrastructure failures.

use std::fmt;

/// Named reasons a state transition is rejected without any mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    /// A result claim is already waiting for confirmation.
    ClaimPending,
    /// The pairing already has a terminal outcome.
    AlreadyResolved,
    /// There is no outstanding claim to confirm, dispute or cancel.
    NoPendingClaim,
    /// The claimer tried to confirm their own claim.
    SelfConfirmation,
    /// The claimer tried to dispute their own claim.
    SelfDispute,
    /// Only the original claimer may cancel a claim.
    NotClaimant,
    /// The 2-minute cancellation window has passed.
    CancelWindowExpired,
    /// The acting player is not part of this pairing.
    NotParticipant,
    /// The opponent already filed a no-show claim for this pairing.
    NoShowAlreadyClaimed,
    /// The tournament is not in the status this operation requires.
    TournamentNotActive,
    /// The player is already registered for this tournament.
    AlreadyRegistered,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictReason::ClaimPending => {
                write!(f, "A result claim is already pending for this pairing")
            }
            ConflictReason::AlreadyResolved => write!(f, "Result already recorded"),
            ConflictReason::NoPendingClaim => write!(f, "No pending result claim"),
            ConflictReason::SelfConfirmation => write!(f, "You cannot confirm your own claim"),
            ConflictReason::SelfDispute => write!(f, "You cannot dispute your own claim"),
            ConflictReason::NotClaimant => write!(f, "Only the claimer can cancel the claim"),
            ConflictReason::CancelWindowExpired => {
                write!(f, "Cancellation window expired")
            }
            ConflictReason::NotParticipant => {
                write!(f, "You are not a participant in this pairing")
            }
            ConflictReason::NoShowAlreadyClaimed => {
                write!(f, "Your opponent has already claimed no-show for this pairing")
            }
            ConflictReason::TournamentNotActive => write!(f, "Tournament is not active"),
            ConflictReason::AlreadyRegistered => write!(f, "Already registered"),
        }
    }
}

/// Errors surfaced by the tournament core.
#[derive(Debug)]
pub enum AppError {
    /// Bad input, rejected before any mutation.
    Validation(String),
    /// Pairing generation needs at least 2 active players.
    InsufficientPlayers { active: usize },
    /// The operation clashes with the current state; nothing changed.
    Conflict(ConflictReason),
    /// Unknown tournament, pairing or roster entry.
    NotFound(String),
    /// An external collaborator (result source) failed.
    External(String),
    /// Storage layer failure.
    Database(sqlx::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::InsufficientPlayers { active } => {
                write!(f, "Need at least 2 active players, have {}", active)
            }
            AppError::Conflict(reason) => write!(f, "Conflict: {}", reason),
            AppError::NotFound(what) => write!(f, "Not found: {}", what),
            AppError::External(msg) => write!(f, "External service error: {}", msg),
            AppError::Database(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Database(err) => Some(err),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, AppError>;
