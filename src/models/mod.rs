//! Data structures for the match engine: matches, boards, brackets, groups, tournaments.

mod board;
mod bracket;
mod game;
mod group;
mod player;
mod tournament;

pub use board::{Board, BoardId, BoardStatus, BoardStatusChange};
pub use bracket::{BracketSlot, FirstRoundFeed, KnockoutBracket, KnockoutRound, NextPosition};
pub use game::{GameMatch, Leg, MatchId, MatchResult, MatchStage, MatchStatus, ReportedStats};
pub use group::{Group, Standing, Standings};
pub use player::{OneEighties, PlayerId, PlayerMatchStats, PlayerPair, PlayerSlot};
pub use tournament::{Tournament, TournamentId, TournamentStatus};
