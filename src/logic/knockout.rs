//! Knockout progression: move a winner into the next round, schedule the next
//! match once both players are known, and detect the end of the tournament.

use crate::error::{EngineError, EngineResult, NotFound};
use crate::models::{
    Board, FirstRoundFeed, GameMatch, KnockoutBracket, MatchId, MatchStage, MatchStatus,
    NextPosition, PlayerId, Tournament,
};
use log::{debug, info, warn};

/// What advancing a winner did to the bracket.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KnockoutAdvance {
    /// Where the winner was placed; `None` when the match was in the last round.
    pub placed: Option<NextPosition>,
    /// The pending match created for a slot that just became complete.
    pub scheduled: Option<GameMatch>,
}

/// Advance the winner of a finished knockout match played in 1-based `round`.
///
/// Mutates only `tournament.knockout`; the caller persists the new match and
/// the bracket together. `boards` must be the tournament's registered boards.
pub fn advance_winner(
    tournament: &mut Tournament,
    finished: &GameMatch,
    round: u32,
    winner: PlayerId,
    boards: &[Board],
) -> EngineResult<KnockoutAdvance> {
    let round_index = round
        .checked_sub(1)
        .map(|r| r as usize)
        .ok_or(NotFound::Round(round))?;
    let slot_index = tournament
        .knockout
        .rounds
        .get(round_index)
        .ok_or(NotFound::Round(round))?
        .position_of(finished.id)
        .ok_or(NotFound::BracketSlot(finished.id))?;

    let Some(next) = tournament.knockout.next_position(round_index, slot_index) else {
        debug!("Match {} was in the last knockout round; nothing to advance", finished.id);
        return Ok(KnockoutAdvance::default());
    };
    warn_on_shrinking_qualifier(&tournament.knockout, round_index);

    let tournament_id = tournament.id;
    let board_count = tournament.board_count;
    let slot = tournament.knockout.rounds[next.round].slot_or_create(next.slot);
    slot.set_player(next.side, winner);

    let Some((player1, player2)) = slot.players() else {
        return Ok(KnockoutAdvance {
            placed: Some(next),
            scheduled: None,
        });
    };
    if let Some(existing) = slot.match_reference {
        warn!(
            "Knockout slot {}/{} already references match {}; not scheduling another",
            next.round, next.slot, existing
        );
        return Ok(KnockoutAdvance {
            placed: Some(next),
            scheduled: None,
        });
    }

    let board = resolve_board(next.round, board_count, boards)?;
    let scheduled = GameMatch::new(
        tournament_id,
        board.id,
        MatchStage::Knockout {
            round: next.round as u32 + 1,
        },
        Some(player1),
        Some(player2),
    );
    slot.match_reference = Some(scheduled.id);
    info!(
        "Scheduled knockout match {} (round {}, slot {}) on board {}",
        scheduled.id,
        next.round + 1,
        next.slot,
        board.number
    );

    Ok(KnockoutAdvance {
        placed: Some(next),
        scheduled: Some(scheduled),
    })
}

/// Pick the board for a match of 0-based `round`: round-robin over the
/// configured board count, in board-number order.
pub fn resolve_board(round: usize, board_count: u32, boards: &[Board]) -> EngineResult<Board> {
    if board_count == 0 || boards.len() < board_count as usize {
        return Err(EngineError::InsufficientBoards {
            required: board_count.max(1),
            registered: boards.len(),
        });
    }
    let mut ordered: Vec<&Board> = boards.iter().collect();
    ordered.sort_by_key(|b| b.number);
    Ok(ordered[round % board_count as usize].clone())
}

/// True when the last round is a single slot whose match has finished.
/// `status_of` must see the current request's writes.
pub fn is_final_finished(
    bracket: &KnockoutBracket,
    status_of: impl Fn(MatchId) -> Option<MatchStatus>,
) -> bool {
    bracket
        .final_match()
        .and_then(status_of)
        .is_some_and(|status| status == MatchStatus::Finished)
}

// A qualifying round 0 assumes round 1 has a slot per qualifier. A smaller
// round 1 means the bracket was generated for halving and winners will land
// in slots that do not pair up.
fn warn_on_shrinking_qualifier(bracket: &KnockoutBracket, round_index: usize) {
    if round_index != 0 || bracket.first_round_feed != FirstRoundFeed::Qualifying {
        return;
    }
    let (first, second) = (bracket.rounds[0].slots.len(), bracket.rounds[1].slots.len());
    if second < first {
        warn!(
            "Qualifying round has {} slots but round 2 only {}; winners are placed 1:1",
            first, second
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BracketSlot, KnockoutRound, MatchResult, OneEighties, PlayerPair, ReportedStats};
    use chrono::Utc;
    use uuid::Uuid;

    fn finish(m: &mut GameMatch, winner: PlayerId) {
        let result = MatchResult {
            winner_id: winner,
            player1_legs_won: if m.player1 == Some(winner) { 3 } else { 1 },
            player2_legs_won: if m.player2 == Some(winner) { 3 } else { 1 },
            stats: PlayerPair::new(ReportedStats::default(), ReportedStats::default()),
            highest_checkout: PlayerPair::new(0, 0),
            one_eighties: PlayerPair::new(OneEighties::default(), OneEighties::default()),
        };
        m.finish(&result, Utc::now()).unwrap();
    }

    /// Elimination bracket with `n` first-round matches (all created).
    fn bracket_with_matches(n: usize, board_count: u32) -> (Tournament, Vec<GameMatch>, Vec<Board>) {
        let mut t = Tournament::new("cup", board_count);
        let boards: Vec<Board> = (1..=board_count).map(|i| Board::new(t.id, i)).collect();
        let mut matches = Vec::new();
        let mut slots = Vec::new();
        for i in 0..n {
            let m = GameMatch::new(
                t.id,
                boards[i % boards.len()].id,
                MatchStage::Knockout { round: 1 },
                Some(Uuid::new_v4()),
                Some(Uuid::new_v4()),
            );
            slots.push(BracketSlot {
                player1: m.player1,
                player2: m.player2,
                match_reference: Some(m.id),
            });
            matches.push(m);
        }
        t.knockout = KnockoutBracket::elimination(slots);
        (t, matches, boards)
    }

    #[test]
    fn first_winner_waits_for_sibling() {
        let (mut t, mut matches, boards) = bracket_with_matches(2, 2);
        let winner = matches[1].player2.unwrap();
        finish(&mut matches[1], winner);

        let advance = advance_winner(&mut t, &matches[1], 1, winner, &boards).unwrap();
        assert_eq!(advance.scheduled, None);
        let slot = t.knockout.rounds[1].slots[0].as_ref().unwrap();
        assert_eq!(slot.player2, Some(winner));
        assert_eq!(slot.player1, None);
        assert_eq!(slot.match_reference, None);
    }

    #[test]
    fn second_winner_schedules_match_on_round_robin_board() {
        let (mut t, mut matches, boards) = bracket_with_matches(2, 2);
        let a = matches[0].player1.unwrap();
        let c = matches[1].player1.unwrap();
        finish(&mut matches[0], a);
        finish(&mut matches[1], c);
        advance_winner(&mut t, &matches[0], 1, a, &boards).unwrap();
        let advance = advance_winner(&mut t, &matches[1], 1, c, &boards).unwrap();

        let scheduled = advance.scheduled.expect("final scheduled");
        assert_eq!(scheduled.player1, Some(a));
        assert_eq!(scheduled.player2, Some(c));
        assert_eq!(scheduled.stage, MatchStage::Knockout { round: 2 });
        assert_eq!(scheduled.status, MatchStatus::Pending);
        assert_eq!(scheduled.scorer, None);
        // next round index 1 % 2 boards -> board number 2
        assert_eq!(scheduled.board_id, boards[1].id);
        assert_eq!(t.knockout.final_match(), Some(scheduled.id));
    }

    #[test]
    fn qualifying_round_fills_player_one_of_same_slot() {
        let mut t = Tournament::new("cup", 1);
        let boards = vec![Board::new(t.id, 1)];
        let seeded = Uuid::new_v4();
        let mut q = GameMatch::new(
            t.id,
            boards[0].id,
            MatchStage::Knockout { round: 1 },
            Some(Uuid::new_v4()),
            Some(Uuid::new_v4()),
        );
        let mut round0 = KnockoutRound::empty(2);
        round0.slots[1] = Some(BracketSlot {
            player1: q.player1,
            player2: q.player2,
            match_reference: Some(q.id),
        });
        let mut round1 = KnockoutRound::empty(2);
        round1.slots[1] = Some(BracketSlot::with_players(None, Some(seeded)));
        t.knockout = KnockoutBracket::qualifying(vec![round0, round1, KnockoutRound::empty(1)]);

        let winner = q.player1.unwrap();
        finish(&mut q, winner);
        let advance = advance_winner(&mut t, &q, 1, winner, &boards).unwrap();
        let scheduled = advance.scheduled.unwrap();
        assert_eq!(scheduled.player1, Some(winner));
        assert_eq!(scheduled.player2, Some(seeded));
    }

    #[test]
    fn unknown_round_and_slot_are_not_found() {
        let (mut t, mut matches, boards) = bracket_with_matches(2, 1);
        let w = matches[0].player1.unwrap();
        finish(&mut matches[0], w);
        assert!(matches!(
            advance_winner(&mut t, &matches[0], 7, w, &boards),
            Err(EngineError::NotFound(NotFound::Round(7)))
        ));
        assert!(matches!(
            advance_winner(&mut t, &matches[0], 0, w, &boards),
            Err(EngineError::NotFound(NotFound::Round(0)))
        ));
        assert!(matches!(
            advance_winner(&mut t, &matches[0], 2, w, &boards),
            Err(EngineError::NotFound(NotFound::BracketSlot(_)))
        ));
    }

    #[test]
    fn too_few_boards_is_a_resource_error() {
        let (mut t, mut matches, boards) = bracket_with_matches(2, 2);
        t.board_count = 3;
        let a = matches[0].player1.unwrap();
        let c = matches[1].player1.unwrap();
        finish(&mut matches[0], a);
        finish(&mut matches[1], c);
        advance_winner(&mut t, &matches[0], 1, a, &boards).unwrap();
        assert!(matches!(
            advance_winner(&mut t, &matches[1], 1, c, &boards),
            Err(EngineError::InsufficientBoards { required: 3, registered: 2 })
        ));
    }

    #[test]
    fn final_detection_needs_finished_single_slot() {
        let (t, mut matches, _) = bracket_with_matches(1, 1);
        assert!(!is_final_finished(&t.knockout, |_| Some(matches[0].status)));
        let w = matches[0].player1.unwrap();
        finish(&mut matches[0], w);
        assert!(is_final_finished(&t.knockout, |_| Some(matches[0].status)));
    }
}
