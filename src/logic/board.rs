//! Board occupancy after a match leaves (or is queued on) a board.

use crate::models::{Board, BoardStatus, BoardStatusChange, GameMatch, MatchId, MatchStatus};
use chrono::{DateTime, Utc};

/// Set `board` to `Waiting` if any match on it other than `vacated_by` is
/// still pending, else to `Idle`. Idempotent.
///
/// `matches` may contain matches from other boards; they are ignored. It must
/// reflect the current request's writes (the finished match, any newly
/// scheduled one).
pub fn reconcile_board<'a>(
    board: &mut Board,
    vacated_by: Option<MatchId>,
    matches: impl IntoIterator<Item = &'a GameMatch>,
    now: DateTime<Utc>,
) -> BoardStatusChange {
    let board_id = board.id;
    let has_pending = matches.into_iter().any(|m| {
        m.board_id == board_id && Some(m.id) != vacated_by && m.status == MatchStatus::Pending
    });
    let from = board.status;
    let to = if has_pending {
        BoardStatus::Waiting
    } else {
        BoardStatus::Idle
    };
    board.set_status(to, now);
    BoardStatusChange { board_id, from, to }
}
