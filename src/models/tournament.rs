//! Tournament aggregate: groups, knockout bracket, and status.

use crate::models::bracket::KnockoutBracket;
use crate::models::group::Group;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Current phase of the tournament.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Registration open; nothing played yet.
    #[default]
    Created,
    /// Round-robin groups in progress.
    Group,
    /// Knockout bracket in progress.
    Knockout,
    /// The final has been played.
    Finished,
}

/// The shared aggregate every match completion reads and rewrites.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    /// Physical boards the tournament is configured to use.
    pub board_count: u32,
    pub status: TournamentStatus,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub knockout: KnockoutBracket,
    /// Bumped on every committed write; used for optimistic concurrency.
    #[serde(default)]
    pub revision: u64,
    pub updated_at: DateTime<Utc>,
}

impl Tournament {
    /// Create a new tournament in Created state with no groups or bracket.
    pub fn new(name: impl Into<String>, board_count: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            board_count,
            status: TournamentStatus::Created,
            groups: Vec::new(),
            knockout: KnockoutBracket::default(),
            revision: 0,
            updated_at: Utc::now(),
        }
    }

    /// Tournament in group play with the given groups.
    pub fn with_groups(name: impl Into<String>, board_count: u32, groups: Vec<Group>) -> Self {
        Self {
            status: TournamentStatus::Group,
            groups,
            ..Self::new(name, board_count)
        }
    }

    /// Tournament in the knockout stage with the given bracket.
    pub fn with_knockout(name: impl Into<String>, board_count: u32, knockout: KnockoutBracket) -> Self {
        Self {
            status: TournamentStatus::Knockout,
            knockout,
            ..Self::new(name, board_count)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status == TournamentStatus::Finished
    }
}
