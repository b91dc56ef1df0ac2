//! Player references and the per-player numbers recorded on a match.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player (used in matches, brackets and standings).
pub type PlayerId = Uuid;

/// Which side of a match (or bracket slot) a player occupies.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerSlot {
    #[default]
    One,
    Two,
}

/// A value held once per side of a match: `{ player1, player2 }` on the wire.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlayerPair<T> {
    pub player1: T,
    pub player2: T,
}

impl<T> PlayerPair<T> {
    pub fn new(player1: T, player2: T) -> Self {
        Self { player1, player2 }
    }

    pub fn get(&self, slot: PlayerSlot) -> &T {
        match slot {
            PlayerSlot::One => &self.player1,
            PlayerSlot::Two => &self.player2,
        }
    }
}

/// 180s thrown in a match and the dart count of each visit that produced one.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct OneEighties {
    pub count: u32,
    pub darts: Vec<u32>,
}

/// Final statistics for one player in one match.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMatchStats {
    pub legs_won: u32,
    pub darts_thrown: u32,
    pub average: f64,
    pub highest_checkout: u32,
    pub one_eighties: OneEighties,
}
