//! Integration tests for the result lifecycle:
//! - claim / confirm / dispute / cancel on over-the-board games
//! - the no-show path and deadline forfeits
//! - direct submission and administrative overrides
//! - registration and start-up validation

mod common;

use chrono::Duration;
use common::setup;
use tourney_server::db::models::{Outcome, Pairing, TournamentFormat};
use tourney_server::error::{AppError, ConflictReason};
use tourney_server::store::TournamentStore;

/// Start a 2-player Swiss and return the single round-one pairing.
async fn one_board(harness: &common::Harness) -> (String, Pairing) {
    let tournament = harness
        .started_tournament(TournamentFormat::Swiss, 1, &[("alice", 1600), ("bob", 1400)])
        .await;
    harness.scheduler.run_cycle().await.unwrap();

    let pairings = harness
        .store
        .pairings_for_round(&tournament.id, 1)
        .await
        .unwrap();
    assert_eq!(pairings.len(), 1);
    (tournament.id, pairings[0].clone())
}

#[tokio::test]
async fn claim_and_confirm_resolves_and_scores() {
    let harness = setup();
    let (tid, pairing) = one_board(&harness).await;
    let white = pairing.white_id.clone().unwrap();
    let black = pairing.black_id.clone().unwrap();

    harness
        .results
        .claim_result(&pairing.id, &white, Outcome::WhiteWins)
        .await
        .unwrap();
    let confirmed = harness
        .results
        .confirm_result(&pairing.id, &black)
        .await
        .unwrap();

    assert_eq!(confirmed.outcome, Outcome::WhiteWins);
    assert!(confirmed.played_at.is_some());

    let winner = harness.store.roster_entry(&tid, &white).await.unwrap();
    let loser = harness.store.roster_entry(&tid, &black).await.unwrap();
    assert_eq!(winner.score, 1.0);
    assert_eq!(winner.wins, 1);
    assert_eq!(winner.games_as_white, 1);
    assert_eq!(loser.score, 0.0);
    assert_eq!(loser.losses, 1);
    assert_eq!(loser.games_as_black, 1);

    assert_eq!(harness.notifier.count("result_claimed"), 1);
    assert_eq!(harness.notifier.count("result_confirmed"), 1);
    assert_eq!(harness.notifier.count("standings_changed"), 1);
}

#[tokio::test]
async fn claimer_cannot_confirm_their_own_claim() {
    let harness = setup();
    let (_tid, pairing) = one_board(&harness).await;
    let white = pairing.white_id.clone().unwrap();

    harness
        .results
        .claim_result(&pairing.id, &white, Outcome::Draw)
        .await
        .unwrap();
    let err = harness
        .results
        .confirm_result(&pairing.id, &white)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Conflict(ConflictReason::SelfConfirmation)
    ));
}

#[tokio::test]
async fn only_participants_may_claim() {
    let harness = setup();
    let (_tid, pairing) = one_board(&harness).await;

    let err = harness
        .results
        .claim_result(&pairing.id, "mallory", Outcome::WhiteWins)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Conflict(ConflictReason::NotParticipant)
    ));
}

#[tokio::test]
async fn second_claim_is_rejected_while_one_is_pending() {
    let harness = setup();
    let (_tid, pairing) = one_board(&harness).await;
    let white = pairing.white_id.clone().unwrap();
    let black = pairing.black_id.clone().unwrap();

    harness
        .results
        .claim_result(&pairing.id, &white, Outcome::WhiteWins)
        .await
        .unwrap();
    let err = harness
        .results
        .claim_result(&pairing.id, &black, Outcome::BlackWins)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Conflict(ConflictReason::ClaimPending)
    ));
}

#[tokio::test]
async fn dispute_freezes_the_pairing_until_an_override() {
    let harness = setup();
    let (tid, pairing) = one_board(&harness).await;
    let white = pairing.white_id.clone().unwrap();
    let black = pairing.black_id.clone().unwrap();

    harness
        .results
        .claim_result(&pairing.id, &white, Outcome::WhiteWins)
        .await
        .unwrap();

    // The claim shows up on the arbiter's queue until resolution.
    let open = harness.results.open_claims(&tid).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, pairing.id);
    let disputed = harness
        .results
        .dispute_result(&pairing.id, &black, "we agreed a draw")
        .await
        .unwrap();
    assert!(disputed.is_disputed);
    assert_eq!(disputed.outcome, Outcome::Pending);

    // The arbiter rules it a draw.
    let resolved = harness
        .results
        .override_result(&pairing.id, Outcome::Draw, "arbiter")
        .await
        .unwrap();
    assert_eq!(resolved.outcome, Outcome::Draw);
    assert!(!resolved.is_disputed);

    let a = harness.store.roster_entry(&tid, &white).await.unwrap();
    let b = harness.store.roster_entry(&tid, &black).await.unwrap();
    assert_eq!(a.score, 0.5);
    assert_eq!(b.score, 0.5);

    assert!(harness.results.open_claims(&tid).await.unwrap().is_empty());
}

#[tokio::test]
async fn claim_cancel_window_is_enforced() {
    let harness = setup();
    let (_tid, pairing) = one_board(&harness).await;
    let white = pairing.white_id.clone().unwrap();
    let black = pairing.black_id.clone().unwrap();

    harness
        .results
        .claim_result(&pairing.id, &white, Outcome::WhiteWins)
        .await
        .unwrap();

    // Only the claimer may cancel.
    let err = harness
        .results
        .cancel_claim(&pairing.id, &black)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Conflict(ConflictReason::NotClaimant)
    ));

    // Within two minutes the claim comes off cleanly.
    harness.clock.advance(Duration::seconds(90));
    let cancelled = harness
        .results
        .cancel_claim(&pairing.id, &white)
        .await
        .unwrap();
    assert!(cancelled.claimed_outcome.is_none());
    assert_eq!(cancelled.outcome, Outcome::Pending);

    // A fresh claim past the window cannot be retracted.
    harness
        .results
        .claim_result(&pairing.id, &white, Outcome::WhiteWins)
        .await
        .unwrap();
    harness.clock.advance(Duration::minutes(3));
    let err = harness
        .results
        .cancel_claim(&pairing.id, &white)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Conflict(ConflictReason::CancelWindowExpired)
    ));
}

#[tokio::test]
async fn no_show_claim_forfeits_the_accused_at_the_deadline() {
    let harness = setup();
    let (tid, pairing) = one_board(&harness).await;
    let white = pairing.white_id.clone().unwrap();
    let black = pairing.black_id.clone().unwrap();

    // White shows up, black doesn't.
    harness
        .results
        .claim_no_show(&pairing.id, &white)
        .await
        .unwrap();

    // Repeating your own claim is a no-op; the opponent cannot counter-claim.
    harness
        .results
        .claim_no_show(&pairing.id, &white)
        .await
        .unwrap();
    let err = harness
        .results
        .claim_no_show(&pairing.id, &black)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Conflict(ConflictReason::NoShowAlreadyClaimed)
    ));

    // Nothing happens before the deadline.
    let report = harness.deadlines.process_tournament(&tid).await.unwrap();
    assert_eq!(report.processed, 0);

    harness.clock.advance(Duration::hours(25));
    let report = harness.deadlines.process_tournament(&tid).await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.forfeits, 1);

    let resolved = harness.store.pairing(&pairing.id).await.unwrap();
    assert_eq!(resolved.outcome, Outcome::BlackForfeit);

    // Forfeits award the point but never touch color counters.
    let winner = harness.store.roster_entry(&tid, &white).await.unwrap();
    assert_eq!(winner.score, 1.0);
    assert_eq!(winner.wins, 1);
    assert_eq!(winner.games_as_white, 0);

    // The sweep is idempotent.
    let report = harness.deadlines.process_tournament(&tid).await.unwrap();
    assert_eq!(report.processed, 0);
}

#[tokio::test]
async fn expired_pairing_without_a_claim_is_a_double_forfeit() {
    let harness = setup();
    let (tid, pairing) = one_board(&harness).await;
    let white = pairing.white_id.clone().unwrap();
    let black = pairing.black_id.clone().unwrap();

    harness.clock.advance(Duration::hours(25));
    let report = harness.deadlines.process_tournament(&tid).await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.double_forfeits, 1);

    let resolved = harness.store.pairing(&pairing.id).await.unwrap();
    assert_eq!(resolved.outcome, Outcome::DoubleForfeit);

    // Two losses, no points, for anyone.
    for player in [&white, &black] {
        let entry = harness.store.roster_entry(&tid, player).await.unwrap();
        assert_eq!(entry.score, 0.0);
        assert_eq!(entry.losses, 1);
    }
}

#[tokio::test]
async fn direct_submission_records_the_external_reference() {
    let harness = setup();
    let (tid, pairing) = one_board(&harness).await;
    let white = pairing.white_id.clone().unwrap();
    let black = pairing.black_id.clone().unwrap();

    let resolved = harness
        .results
        .submit_result(
            &pairing.id,
            &black,
            Outcome::BlackWins,
            Some("https://example.org/game/42".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(resolved.outcome, Outcome::BlackWins);
    assert_eq!(
        resolved.external_ref.as_deref(),
        Some("https://example.org/game/42")
    );

    let winner = harness.store.roster_entry(&tid, &black).await.unwrap();
    assert_eq!(winner.score, 1.0);

    // Terminal pairings reject further transitions.
    let err = harness
        .results
        .claim_result(&pairing.id, &white, Outcome::WhiteWins)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Conflict(ConflictReason::AlreadyResolved)
    ));
}

#[tokio::test]
async fn override_of_a_settled_pairing_does_not_rescore() {
    let harness = setup();
    let (tid, pairing) = one_board(&harness).await;
    let white = pairing.white_id.clone().unwrap();
    let black = pairing.black_id.clone().unwrap();

    harness
        .results
        .submit_result(&pairing.id, &white, Outcome::WhiteWins, None)
        .await
        .unwrap();

    // Correcting the record changes the outcome but leaves tallies alone;
    // score repair is a separate administrative action.
    let corrected = harness
        .results
        .override_result(&pairing.id, Outcome::Draw, "arbiter")
        .await
        .unwrap();
    assert_eq!(corrected.outcome, Outcome::Draw);

    let a = harness.store.roster_entry(&tid, &white).await.unwrap();
    let b = harness.store.roster_entry(&tid, &black).await.unwrap();
    assert_eq!(a.score, 1.0);
    assert_eq!(b.score, 0.0);
}

#[tokio::test]
async fn override_cannot_unset_an_outcome() {
    let harness = setup();
    let (_tid, pairing) = one_board(&harness).await;

    let err = harness
        .results
        .override_result(&pairing.id, Outcome::Pending, "arbiter")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn registration_is_closed_once_started() {
    let harness = setup();
    let tournament = harness
        .started_tournament(TournamentFormat::Swiss, 3, &[("a", 1500), ("b", 1500)])
        .await;

    let err = harness
        .tournaments
        .register_player(&tournament.id, "late", 1500)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Conflict(ConflictReason::TournamentNotActive)
    ));
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let harness = setup();
    let tournament = harness
        .tournaments
        .create_tournament("Open", TournamentFormat::Swiss, 3, None, None)
        .await
        .unwrap();
    harness
        .tournaments
        .register_player(&tournament.id, "a", 1500)
        .await
        .unwrap();

    let err = harness
        .tournaments
        .register_player(&tournament.id, "a", 1500)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Conflict(ConflictReason::AlreadyRegistered)
    ));
}

#[tokio::test]
async fn starting_needs_two_active_players() {
    let harness = setup();
    let tournament = harness
        .tournaments
        .create_tournament("Open", TournamentFormat::Swiss, 3, None, None)
        .await
        .unwrap();
    harness
        .tournaments
        .register_player(&tournament.id, "a", 1500)
        .await
        .unwrap();

    let err = harness
        .tournaments
        .start_tournament(&tournament.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientPlayers { active: 1 }));
}

#[tokio::test]
async fn cancelled_tournament_rejects_further_transitions() {
    let harness = setup();
    let tournament = harness
        .started_tournament(TournamentFormat::Swiss, 3, &[("a", 1500), ("b", 1500)])
        .await;

    let cancelled = harness
        .tournaments
        .cancel_tournament(&tournament.id)
        .await
        .unwrap();
    assert!(cancelled.finished_at.is_some());

    let err = harness
        .tournaments
        .cancel_tournament(&tournament.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Conflict(ConflictReason::TournamentNotActive)
    ));

    // The automation loop no longer touches it.
    harness.scheduler.run_cycle().await.unwrap();
    let unchanged = harness.store.tournament(&tournament.id).await.unwrap();
    assert_eq!(unchanged.current_round, 0);
}

#[tokio::test]
async fn round_robin_requires_enough_scheduled_rounds() {
    let harness = setup();
    let tournament = harness
        .tournaments
        .create_tournament("Berger", TournamentFormat::RoundRobin, 2, None, None)
        .await
        .unwrap();
    for id in ["a", "b", "c", "d"] {
        harness
            .tournaments
            .register_player(&tournament.id, id, 1500)
            .await
            .unwrap();
    }

    // 4 players need 3 rounds; 2 were scheduled.
    let err = harness
        .tournaments
        .start_tournament(&tournament.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}
