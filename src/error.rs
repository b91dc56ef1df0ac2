//! Engine errors and their HTTP mapping.

use crate::models::{BoardId, MatchId, MatchStatus, PlayerId, TournamentId};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Problems with the caller's request. Never retried.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Request body is not valid JSON: {0}")]
    Malformed(String),

    #[error("Winner {winner} is not a participant of match {match_id}")]
    WinnerNotParticipant { winner: PlayerId, match_id: MatchId },

    #[error("Match {0} does not have both participants assigned")]
    ParticipantsNotAssigned(MatchId),

    #[error("Match {0} is already finished")]
    AlreadyFinished(MatchId),

    #[error("Match {match_id} cannot move from {from} to {to}")]
    InvalidTransition {
        match_id: MatchId,
        from: MatchStatus,
        to: MatchStatus,
    },
}

/// Something the caller referred to does not exist.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum NotFound {
    #[error("Match not found: {0}")]
    Match(MatchId),

    #[error("Tournament not found: {0}")]
    Tournament(TournamentId),

    #[error("Group {0} not found")]
    Group(usize),

    #[error("Knockout round {0} not found")]
    Round(u32),

    #[error("Match {0} is not referenced by its knockout round")]
    BracketSlot(MatchId),

    #[error("Player {0} has no standings row")]
    StandingRow(PlayerId),

    #[error("Board not found: {0}")]
    Board(BoardId),
}

/// Errors returned by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFound),

    #[error("Not enough boards registered: need {required}, have {registered}")]
    InsufficientBoards { required: u32, registered: usize },

    #[error("Tournament {tournament} changed concurrently: expected revision {expected}, found {actual}")]
    ConcurrencyConflict {
        tournament: TournamentId,
        expected: u64,
        actual: u64,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Closed classification of [`EngineError`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Resource,
    ConcurrencyConflict,
    Internal,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation(_) => ErrorKind::Validation,
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::InsufficientBoards { .. } => ErrorKind::Resource,
            EngineError::ConcurrencyConflict { .. } => ErrorKind::ConcurrencyConflict,
            EngineError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Only a revision conflict is worth repeating, and then from scratch.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::ConcurrencyConflict
    }

    /// Message safe to hand to clients; storage details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            EngineError::Internal(_) => "Failed to finish the match".to_string(),
            _ => self.to_string(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for EngineError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        EngineError::Internal(format!("lock poisoned: {err}"))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Resource => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::ConcurrencyConflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.client_message(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn only_conflicts_are_retryable() {
        let conflict = EngineError::ConcurrencyConflict {
            tournament: Uuid::new_v4(),
            expected: 1,
            actual: 2,
        };
        assert!(conflict.is_retryable());
        assert!(!EngineError::from(ValidationError::MissingField("winnerId")).is_retryable());
        assert!(!EngineError::InsufficientBoards { required: 4, registered: 2 }.is_retryable());
    }

    #[test]
    fn status_codes_follow_kind() {
        assert_eq!(
            EngineError::from(NotFound::Group(3)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            EngineError::from(ValidationError::MissingField("stats")).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            EngineError::Internal("disk".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = EngineError::Internal("connection reset by peer".into());
        assert!(!err.client_message().contains("peer"));
    }
}
