//! Match-completion logic: validation, knockout progression, group standings, boards.

mod board;
mod knockout;
mod standings;
mod validation;

pub use board::reconcile_board;
pub use knockout::{advance_winner, is_final_finished, resolve_board, KnockoutAdvance};
pub use standings::{
    assign_ranks, record_group_result, sort_standings, HeadToHead, POINTS_PER_WIN,
};
pub use validation::{validate_finish_request, MAX_LEGS_PER_MATCH};
