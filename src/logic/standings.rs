//! Group standings: points and leg tallies, ordering with head-to-head
//! tie-breaks, and shared ranks.

use crate::error::{EngineError, EngineResult, NotFound, ValidationError};
use crate::models::{GameMatch, Group, PlayerId, Standing, Standings};
use log::debug;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Points for a match win. A loss scores nothing.
pub const POINTS_PER_WIN: u32 = 2;

/// Winners of finished matches, keyed by the (unordered) pair of players.
/// When a pair met more than once, the first recorded meeting counts.
#[derive(Debug, Default)]
pub struct HeadToHead {
    winners: HashMap<(PlayerId, PlayerId), PlayerId>,
}

impl HeadToHead {
    pub fn from_matches<'a>(matches: impl IntoIterator<Item = &'a GameMatch>) -> Self {
        let mut winners = HashMap::new();
        for m in matches {
            if let (Some(p1), Some(p2), Some(winner)) = (m.player1, m.player2, m.winner) {
                winners.entry(pair_key(p1, p2)).or_insert(winner);
            }
        }
        Self { winners }
    }

    /// Winner of the match between `a` and `b`, if one was played.
    pub fn winner(&self, a: PlayerId, b: PlayerId) -> Option<PlayerId> {
        self.winners.get(&pair_key(a, b)).copied()
    }

    /// `Less` if `a` beat `b`, `Greater` if `b` beat `a`, else `Equal`.
    fn compare(&self, a: PlayerId, b: PlayerId) -> Ordering {
        match self.winner(a, b) {
            Some(w) if w == a => Ordering::Less,
            Some(w) if w == b => Ordering::Greater,
            _ => Ordering::Equal,
        }
    }
}

fn pair_key(a: PlayerId, b: PlayerId) -> (PlayerId, PlayerId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Record a finished group match and recompute the whole table.
///
/// `finished_matches` are all finished matches of this group, including
/// `finished` itself. Returns the new table, which also replaces
/// `group.standings`.
pub fn record_group_result(
    group: &mut Group,
    finished: &GameMatch,
    finished_matches: &[GameMatch],
) -> EngineResult<Vec<Standing>> {
    let (player1, player2) = finished.participants()?;
    let winner = finished.winner.ok_or_else(|| {
        EngineError::Internal(format!("match {} finished without a winner", finished.id))
    })?;

    let mut rows = match std::mem::take(&mut group.standings) {
        Standings::Uninitialized => seed_rows(&group.players, player1, player2),
        Standings::Ranked(rows) => rows,
    };

    let legs1 = finished.stats.player1.legs_won;
    let legs2 = finished.stats.player2.legs_won;
    let update = apply_result(&mut rows, (player1, legs1), (player2, legs2), winner);
    if let Err(err) = update {
        group.standings = Standings::Ranked(rows);
        return Err(err);
    }

    let head_to_head = HeadToHead::from_matches(finished_matches);
    sort_standings(&mut rows, &head_to_head);
    assign_ranks(&mut rows, &head_to_head);
    debug!(
        "Recomputed standings for {} players after match {}",
        rows.len(),
        finished.id
    );

    group.standings = Standings::Ranked(rows.clone());
    Ok(rows)
}

/// Zeroed rows for every group player, plus either match participant that is
/// not (yet) on the group's list.
fn seed_rows(players: &[PlayerId], player1: PlayerId, player2: PlayerId) -> Vec<Standing> {
    let mut rows: Vec<Standing> = players.iter().copied().map(Standing::zeroed).collect();
    for p in [player1, player2] {
        if !rows.iter().any(|r| r.player_id == p) {
            rows.push(Standing::zeroed(p));
        }
    }
    rows
}

fn apply_result(
    rows: &mut [Standing],
    (player1, legs1): (PlayerId, u32),
    (player2, legs2): (PlayerId, u32),
    winner: PlayerId,
) -> EngineResult<()> {
    let i1 = row_index(rows, player1)?;
    let i2 = row_index(rows, player2)?;
    let mut row1 = rows[i1].checked_add_legs(legs1, legs2).ok_or_else(tally_overflow)?;
    let mut row2 = rows[i2].checked_add_legs(legs2, legs1).ok_or_else(tally_overflow)?;
    for row in [&mut row1, &mut row2] {
        if row.player_id == winner {
            row.points = row.points.checked_add(POINTS_PER_WIN).ok_or_else(tally_overflow)?;
        }
    }
    rows[i1] = row1;
    rows[i2] = row2;
    Ok(())
}

fn tally_overflow() -> EngineError {
    ValidationError::InvalidField {
        field: "legsWon",
        reason: "standings tally out of range".to_string(),
    }
    .into()
}

fn row_index(rows: &[Standing], player: PlayerId) -> EngineResult<usize> {
    Ok(rows
        .iter()
        .position(|r| r.player_id == player)
        .ok_or(NotFound::StandingRow(player))?)
}

/// Points descending, then leg difference descending, then head-to-head.
///
/// Head-to-head results need not be transitive (A beat B, B beat C, C beat A),
/// so it is applied with an insertion pass inside each block of numerically
/// equal rows rather than through `sort_by`. Rows with no deciding result
/// keep their relative order.
pub fn sort_standings(rows: &mut [Standing], head_to_head: &HeadToHead) {
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.leg_difference.cmp(&a.leg_difference))
    });

    let mut start = 0;
    while start < rows.len() {
        let end = start
            + rows[start..]
                .iter()
                .take_while(|r| numerically_tied(r, &rows[start]))
                .count();
        let block = &mut rows[start..end];
        for i in 1..block.len() {
            let mut j = i;
            while j > 0
                && head_to_head.compare(block[j - 1].player_id, block[j].player_id) == Ordering::Greater
            {
                block.swap(j - 1, j);
                j -= 1;
            }
        }
        start = end;
    }
}

/// Rank 1 for the first row. A row shares its predecessor's rank only when
/// both are numerically tied and the pair never played; otherwise its rank is
/// its 1-based position.
pub fn assign_ranks(rows: &mut [Standing], head_to_head: &HeadToHead) {
    let mut rank = 1;
    for i in 0..rows.len() {
        if i > 0 {
            let (prev, curr) = (&rows[i - 1], &rows[i]);
            let shared = numerically_tied(prev, curr)
                && head_to_head.winner(prev.player_id, curr.player_id).is_none();
            if !shared {
                rank = i as u32 + 1;
            }
        }
        rows[i].rank = rank;
    }
}

fn numerically_tied(a: &Standing, b: &Standing) -> bool {
    a.points == b.points && a.leg_difference == b.leg_difference
}
