//! Dart tournament match engine: library with models, progression logic, storage and REST API.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod logic;
pub mod models;
pub mod store;

pub use engine::{
    CompletionPath, FinishOutcome, MatchEngine, ScheduledMatch, StartMatch, StartOutcome,
};
pub use error::{EngineError, EngineResult, ErrorKind, NotFound, ValidationError};
pub use models::{
    Board, BoardId, BoardStatus, BoardStatusChange, BracketSlot, FirstRoundFeed, GameMatch, Group,
    KnockoutBracket, KnockoutRound, MatchId, MatchResult, MatchStage, MatchStatus, PlayerId,
    PlayerPair, PlayerSlot, Standing, Standings, Tournament, TournamentId, TournamentStatus,
};
pub use store::{Changeset, MemoryStore, Snapshot, Store};
