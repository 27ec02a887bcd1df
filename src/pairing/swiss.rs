//! Swiss pairing
//!
//! Round 1 pairs by rating: top half vs bottom half, top half takes white.
//! Later rounds pair within score groups, avoiding rematches; players who
//! cannot be paired in their group float down to the next one. An odd player
//! out receives a bye worth a full point.

use super::{BoardAssignment, PairingPlayer};

pub(super) fn generate(players: &[PairingPlayer], round_number: i64) -> Vec<BoardAssignment> {
    if round_number <= 1 {
        generate_round_one(players)
    } else {
        generate_scored_round(players)
    }
}

fn generate_round_one(players: &[PairingPlayer]) -> Vec<BoardAssignment> {
    let mut sorted: Vec<&PairingPlayer> = players.iter().collect();
    sorted.sort_by(|a, b| b.rating.cmp(&a.rating).then_with(|| a.id.cmp(&b.id)));

    let mut assignments = Vec::new();

    // Odd roster: lowest rated sits out with a bye.
    if sorted.len() % 2 == 1 {
        let bye_player = sorted.pop().unwrap();
        assignments.push(BoardAssignment::bye(bye_player.id.clone()));
    }

    let half = sorted.len() / 2;
    let (top_half, bottom_half) = sorted.split_at(half);

    for (i, (top, bottom)) in top_half.iter().zip(bottom_half.iter()).enumerate() {
        assignments.push(BoardAssignment::board(
            top.id.clone(),
            bottom.id.clone(),
            (i + 1) as i64,
        ));
    }

    assignments
}

fn generate_scored_round(players: &[PairingPlayer]) -> Vec<BoardAssignment> {
    let mut sorted: Vec<&PairingPlayer> = players.iter().collect();
    sorted.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.rating.cmp(&a.rating))
            .then_with(|| a.id.cmp(&b.id))
    });

    // Score groups, highest first. Players are already ordered, so groups
    // are contiguous runs of equal score.
    let mut groups: Vec<Vec<&PairingPlayer>> = Vec::new();
    for player in sorted {
        match groups.last_mut() {
            Some(group) if group[0].score == player.score => group.push(player),
            _ => groups.push(vec![player]),
        }
    }

    let mut assignments = Vec::new();
    let mut board = 1;
    // Players floating down from a group that could not pair them.
    let mut carried: Vec<&PairingPlayer> = Vec::new();

    for group in groups {
        let mut available: Vec<&PairingPlayer> = carried.drain(..).collect();
        available.extend(group);

        while available.len() >= 2 {
            let player = available.remove(0);
            let opponent_idx = available
                .iter()
                .position(|candidate| !player.opponents.contains(&candidate.id));

            match opponent_idx {
                Some(idx) => {
                    let opponent = available.remove(idx);
                    let (white, black) = assign_colors(player, opponent);
                    assignments.push(BoardAssignment::board(white, black, board));
                    board += 1;
                }
                None => carried.push(player),
            }
        }

        carried.extend(available);
    }

    // An odd leftover takes the bye; prefer the lowest score, then rating.
    if carried.len() % 2 == 1 {
        let bye_idx = carried
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.score
                    .total_cmp(&b.score)
                    .then_with(|| a.rating.cmp(&b.rating))
                    .then_with(|| a.id.cmp(&b.id))
            })
            .map(|(idx, _)| idx)
            .unwrap();
        let bye_player = carried.remove(bye_idx);
        assignments.push(BoardAssignment::bye(bye_player.id.clone()));
    }

    // Pair whoever remains, accepting a rematch when nothing else is left.
    while carried.len() >= 2 {
        let player = carried.remove(0);
        let idx = carried
            .iter()
            .position(|candidate| !player.opponents.contains(&candidate.id))
            .unwrap_or(0);
        let opponent = carried.remove(idx);
        let (white, black) = assign_colors(player, opponent);
        assignments.push(BoardAssignment::board(white, black, board));
        board += 1;
    }

    assignments
}

/// Returns (white_id, black_id). A player who has had more blacks gets
/// white next; if both lean the same way the higher rating takes white.
fn assign_colors(p1: &PairingPlayer, p2: &PairingPlayer) -> (String, String) {
    if p1.needs_white() && !p2.needs_white() {
        return (p1.id.clone(), p2.id.clone());
    }
    if p2.needs_white() && !p1.needs_white() {
        return (p2.id.clone(), p1.id.clone());
    }
    if p1.needs_black() && !p2.needs_black() {
        return (p2.id.clone(), p1.id.clone());
    }
    if p2.needs_black() && !p1.needs_black() {
        return (p1.id.clone(), p2.id.clone());
    }

    if p1.rating > p2.rating || (p1.rating == p2.rating && p1.id < p2.id) {
        (p1.id.clone(), p2.id.clone())
    } else {
        (p2.id.clone(), p1.id.clone())
    }
}
