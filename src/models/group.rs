//! Round-robin groups and their standings table.

use crate::models::player::PlayerId;
use serde::{Deserialize, Serialize};

/// One row of a group's standings table.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub player_id: PlayerId,
    pub points: u32,
    pub legs_won: u32,
    pub legs_lost: u32,
    /// Always `legs_won - legs_lost`; may be negative.
    pub leg_difference: i32,
    /// 1-based; 0 until the first ranking pass.
    pub rank: u32,
}

impl Standing {
    pub fn zeroed(player_id: PlayerId) -> Self {
        Self {
            player_id,
            ..Self::default()
        }
    }

    /// This row with one more match's legs added, or `None` if a tally would
    /// leave the representable range.
    pub fn checked_add_legs(&self, won: u32, lost: u32) -> Option<Self> {
        let legs_won = self.legs_won.checked_add(won)?;
        let legs_lost = self.legs_lost.checked_add(lost)?;
        let leg_difference = i32::try_from(i64::from(legs_won) - i64::from(legs_lost)).ok()?;
        Some(Self {
            legs_won,
            legs_lost,
            leg_difference,
            ..self.clone()
        })
    }
}

/// A group's standings. The table is created exactly once, on the first
/// finished match of the group, and only re-sorted and re-ranked afterwards.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "rows", rename_all = "snake_case")]
pub enum Standings {
    #[default]
    Uninitialized,
    Ranked(Vec<Standing>),
}

impl Standings {
    pub fn rows(&self) -> &[Standing] {
        match self {
            Standings::Uninitialized => &[],
            Standings::Ranked(rows) => rows,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub players: Vec<PlayerId>,
    #[serde(default)]
    pub standings: Standings,
}

impl Group {
    pub fn new(players: Vec<PlayerId>) -> Self {
        Self {
            players,
            standings: Standings::Uninitialized,
        }
    }
}
