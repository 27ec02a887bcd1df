//! Tiebreaks and ranking
//!
//! Computes Buchholz, Sonneborn-Berger and head-to-head comparisons from
//! pairing history, and orders a roster for live standings and the final
//! ranking. Ranks are strict ordinals 1..N with no gaps: two players on
//! identical tiebreaks still receive distinct consecutive ranks. That is a
//! deliberate policy choice, not standard "1224" competition ranking.

use crate::db::models::{Outcome, Pairing, RosterEntry};
use std::cmp::Ordering;
use std::collections::HashMap;

/// A roster entry annotated with its computed tiebreaks, ordered best first.
#[derive(Debug, Clone)]
pub struct StandingsRow {
    pub entry: RosterEntry,
    pub buchholz: f64,
    pub sonneborn_berger: f64,
}

/// Game points `player_id` earned from this pairing, if it is a finished
/// two-sided game. Forfeit wins count as wins here.
fn points_for(pairing: &Pairing, player_id: &str) -> Option<f64> {
    if pairing.is_bye() || !pairing.involves(player_id) {
        return None;
    }
    let as_white = pairing.white_id.as_deref() == Some(player_id);
    match pairing.outcome {
        Outcome::WhiteWins | Outcome::BlackForfeit => Some(if as_white { 1.0 } else { 0.0 }),
        Outcome::BlackWins | Outcome::WhiteForfeit => Some(if as_white { 0.0 } else { 1.0 }),
        Outcome::Draw => Some(0.5),
        Outcome::DoubleForfeit => Some(0.0),
        Outcome::Pending | Outcome::Bye => None,
    }
}

/// Sum of the current scores of every opponent faced. Bye rounds contribute
/// nothing because they have no opponent.
pub fn buchholz(player_id: &str, pairings: &[Pairing], scores: &HashMap<String, f64>) -> f64 {
    pairings
        .iter()
        .filter(|p| !p.is_bye() && p.involves(player_id))
        .filter_map(|p| p.opponent_of(player_id))
        .map(|opponent| scores.get(opponent).copied().unwrap_or(0.0))
        .sum()
}

/// Sum over opponents of `opponent_score * points_earned_against_them`.
pub fn sonneborn_berger(
    player_id: &str,
    pairings: &[Pairing],
    scores: &HashMap<String, f64>,
) -> f64 {
    pairings
        .iter()
        .filter_map(|p| {
            let points = points_for(p, player_id)?;
            let opponent = p.opponent_of(player_id)?;
            Some(scores.get(opponent).copied().unwrap_or(0.0) * points)
        })
        .sum()
}

/// Direct comparison between two players, if they played a decisive game.
/// `Ordering::Less` means `a` ranks above `b`.
pub fn head_to_head(a: &str, b: &str, pairings: &[Pairing]) -> Option<Ordering> {
    for pairing in pairings {
        if !pairing.involves(a) || pairing.opponent_of(a) != Some(b) {
            continue;
        }
        let a_points = points_for(pairing, a)?;
        let b_points = points_for(pairing, b)?;
        if a_points > b_points {
            return Some(Ordering::Less);
        }
        if b_points > a_points {
            return Some(Ordering::Greater);
        }
    }
    None
}

/// Order the non-withdrawn roster best first:
/// score, then Buchholz, then Sonneborn-Berger, then head-to-head, then
/// total wins. Head-to-head is deliberately applied only after Buchholz,
/// which can rank a player above an opponent who beat them directly.
pub fn standings(roster: &[RosterEntry], pairings: &[Pairing]) -> Vec<StandingsRow> {
    let scores: HashMap<String, f64> = roster
        .iter()
        .map(|e| (e.player_id.clone(), e.score))
        .collect();

    let mut rows: Vec<StandingsRow> = roster
        .iter()
        .filter(|e| !e.is_withdrawn)
        .map(|entry| StandingsRow {
            buchholz: buchholz(&entry.player_id, pairings, &scores),
            sonneborn_berger: sonneborn_berger(&entry.player_id, pairings, &scores),
            entry: entry.clone(),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.entry
            .score
            .total_cmp(&a.entry.score)
            .then(b.buchholz.total_cmp(&a.buchholz))
            .then(b.sonneborn_berger.total_cmp(&a.sonneborn_berger))
            .then_with(|| {
                head_to_head(&a.entry.player_id, &b.entry.player_id, pairings)
                    .unwrap_or(Ordering::Equal)
            })
            .then(b.entry.wins.cmp(&a.entry.wins))
            .then_with(|| a.entry.player_id.cmp(&b.entry.player_id))
    });

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(id: &str, score: f64, wins: i64) -> RosterEntry {
        let mut e = RosterEntry::new("t".to_string(), id.to_string(), 1500);
        e.score = score;
        e.wins = wins;
        e
    }

    fn game(white: &str, black: &str, outcome: Outcome) -> Pairing {
        let mut p = Pairing::new(
            "t".to_string(),
            1,
            1,
            Some(white.to_string()),
            Some(black.to_string()),
            Utc::now(),
        );
        p.outcome = outcome;
        p
    }

    fn bye(player: &str) -> Pairing {
        let mut p = Pairing::new("t".to_string(), 1, 0, Some(player.to_string()), None, Utc::now());
        p.outcome = Outcome::Bye;
        p
    }

    #[test]
    fn buchholz_sums_current_opponent_scores() {
        let scores: HashMap<String, f64> =
            [("a", 2.0), ("b", 1.5), ("c", 1.0)].map(|(k, v)| (k.to_string(), v)).into();
        let pairings = vec![
            game("a", "b", Outcome::WhiteWins),
            game("c", "a", Outcome::Draw),
            bye("a"),
        ];

        // a faced b (1.5) and c (1.0); the bye contributes nothing.
        assert_eq!(buchholz("a", &pairings, &scores), 2.5);
    }

    #[test]
    fn buchholz_tracks_opponent_score_changes() {
        let pairings = vec![game("a", "b", Outcome::WhiteWins)];
        let before: HashMap<String, f64> = [("b".to_string(), 1.0)].into();
        let after: HashMap<String, f64> = [("b".to_string(), 2.0)].into();

        assert_eq!(buchholz("a", &pairings, &before), 1.0);
        assert_eq!(buchholz("a", &pairings, &after), 2.0);
    }

    #[test]
    fn sonneborn_berger_weights_results() {
        let scores: HashMap<String, f64> =
            [("b", 2.0), ("c", 1.0)].map(|(k, v)| (k.to_string(), v)).into();
        let pairings = vec![
            game("a", "b", Outcome::WhiteWins), // full weight of b's score
            game("c", "a", Outcome::Draw),      // half of c's score
        ];

        assert_eq!(sonneborn_berger("a", &pairings, &scores), 2.0 + 0.5);
    }

    #[test]
    fn head_to_head_picks_the_winner() {
        let pairings = vec![game("a", "b", Outcome::BlackWins)];
        assert_eq!(head_to_head("b", "a", &pairings), Some(Ordering::Less));
        assert_eq!(head_to_head("a", "b", &pairings), Some(Ordering::Greater));
        // A draw decides nothing.
        let drawn = vec![game("a", "b", Outcome::Draw)];
        assert_eq!(head_to_head("a", "b", &drawn), None);
    }

    #[test]
    fn standings_order_score_then_buchholz() {
        let roster = vec![entry("a", 2.0, 2), entry("b", 2.0, 2), entry("c", 1.0, 1)];
        // b beat a stronger field: b faced a (2.0), a faced c (1.0).
        let pairings = vec![
            game("b", "a", Outcome::WhiteWins),
            game("a", "c", Outcome::WhiteWins),
        ];

        let rows = standings(&roster, &pairings);
        assert_eq!(rows[0].entry.player_id, "b");
        assert_eq!(rows[1].entry.player_id, "a");
        assert_eq!(rows[2].entry.player_id, "c");
    }

    #[test]
    fn direct_winner_ranks_first_on_equal_score_and_buchholz() {
        let roster = vec![entry("a", 1.0, 1), entry("b", 1.0, 1)];
        let pairings = vec![game("a", "b", Outcome::BlackWins)];

        let rows = standings(&roster, &pairings);
        assert_eq!(rows[0].entry.player_id, "b");
    }

    #[test]
    fn withdrawn_players_are_excluded() {
        let mut quitter = entry("q", 3.0, 3);
        quitter.is_withdrawn = true;
        let roster = vec![entry("a", 1.0, 1), quitter];

        let rows = standings(&roster, &[]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entry.player_id, "a");
    }

    #[test]
    fn forfeit_win_counts_toward_sonneborn_berger() {
        let scores: HashMap<String, f64> = [("b".to_string(), 1.0)].into();
        let pairings = vec![game("a", "b", Outcome::BlackForfeit)];
        assert_eq!(sonneborn_berger("a", &pairings, &scores), 1.0);
    }
}
