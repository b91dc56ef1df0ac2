//! Physical boards and their occupancy state.

use crate::models::tournament::TournamentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a board.
pub type BoardId = Uuid;

/// Occupancy of a board.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardStatus {
    /// Nothing scheduled.
    #[default]
    Idle,
    /// At least one pending match is queued on it.
    Waiting,
    /// A match is in progress.
    Playing,
}

impl fmt::Display for BoardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BoardStatus::Idle => "idle",
            BoardStatus::Waiting => "waiting",
            BoardStatus::Playing => "playing",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    pub tournament_id: TournamentId,
    /// Display number; boards are allocated in this order.
    pub number: u32,
    pub status: BoardStatus,
    pub updated_at: DateTime<Utc>,
}

impl Board {
    pub fn new(tournament_id: TournamentId, number: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            number,
            status: BoardStatus::Idle,
            updated_at: Utc::now(),
        }
    }

    pub fn set_status(&mut self, status: BoardStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }
}

/// A board status as it was before and after an engine operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardStatusChange {
    pub board_id: BoardId,
    pub from: BoardStatus,
    pub to: BoardStatus,
}
