//! Round-robin pairing via the circle method.
//!
//! Seats are seeded by rating; one seat stays fixed while the rest rotate
//! each round. An odd roster gets a synthetic empty seat, and whoever lands
//! opposite it takes a bye that round.

use super::{BoardAssignment, PairingPlayer};

/// Rounds needed for everyone to meet everyone: n-1 for an even roster,
/// n when a bye seat has to be injected.
pub(super) fn required_rounds(active_players: usize) -> i64 {
    if active_players % 2 == 0 {
        (active_players as i64) - 1
    } else {
        active_players as i64
    }
}

pub(super) fn generate(players: &[PairingPlayer], round_number: i64) -> Vec<BoardAssignment> {
    // None marks the synthetic bye seat.
    let mut seats: Vec<Option<String>> = {
        let mut sorted: Vec<&PairingPlayer> = players.iter().collect();
        sorted.sort_by(|a, b| b.rating.cmp(&a.rating).then_with(|| a.id.cmp(&b.id)));
        sorted.iter().map(|p| Some(p.id.clone())).collect()
    };
    if seats.len() % 2 == 1 {
        seats.push(None);
    }

    let n = seats.len();
    let total_rounds = (n as i64) - 1;
    if round_number < 1 || round_number > total_rounds {
        return Vec::new();
    }

    let mut indices: Vec<usize> = (0..n).collect();
    for _ in 1..round_number {
        rotate(&mut indices);
    }

    let mut assignments = Vec::new();
    let mut board = 1;

    for i in 0..n / 2 {
        let seat_a = &seats[indices[i]];
        let seat_b = &seats[indices[n - 1 - i]];

        match (seat_a, seat_b) {
            (Some(a), None) => assignments.push(BoardAssignment::bye(a.clone())),
            (None, Some(b)) => assignments.push(BoardAssignment::bye(b.clone())),
            (Some(a), Some(b)) => {
                // Alternate colors by round parity, with an extra flip every
                // other board to even out color totals across the schedule.
                let (mut white, mut black) = if round_number % 2 == 1 {
                    (a.clone(), b.clone())
                } else {
                    (b.clone(), a.clone())
                };
                if i % 2 == 1 {
                    std::mem::swap(&mut white, &mut black);
                }
                assignments.push(BoardAssignment::board(white, black, board));
                board += 1;
            }
            (None, None) => unreachable!("only one bye seat is ever injected"),
        }
    }

    assignments
}

/// Keep the first seat fixed, rotate the rest one step:
/// [0, 1, 2, 3, 4, 5] -> [0, 5, 1, 2, 3, 4]
fn rotate(indices: &mut Vec<usize>) {
    let last = indices.pop().unwrap();
    indices.insert(1, last);
}
