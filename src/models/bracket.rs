//! Knockout bracket: rounds of slots that fill up as winners advance.

use crate::models::game::MatchId;
use crate::models::player::{PlayerId, PlayerSlot};
use serde::{Deserialize, Serialize};

/// One cell of a knockout round.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketSlot {
    pub player1: Option<PlayerId>,
    pub player2: Option<PlayerId>,
    /// Set once, when both players are known and the match is created.
    pub match_reference: Option<MatchId>,
}

impl BracketSlot {
    pub fn with_players(player1: Option<PlayerId>, player2: Option<PlayerId>) -> Self {
        Self {
            player1,
            player2,
            match_reference: None,
        }
    }

    pub fn set_player(&mut self, side: PlayerSlot, player: PlayerId) {
        match side {
            PlayerSlot::One => self.player1 = Some(player),
            PlayerSlot::Two => self.player2 = Some(player),
        }
    }

    /// Both players, once the slot is fully populated.
    pub fn players(&self) -> Option<(PlayerId, PlayerId)> {
        self.player1.zip(self.player2)
    }
}

/// A knockout round. `None` marks a slot that has not been created yet.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct KnockoutRound {
    pub slots: Vec<Option<BracketSlot>>,
}

impl KnockoutRound {
    /// A round of `size` empty, already-created slots.
    pub fn empty(size: usize) -> Self {
        Self {
            slots: vec![Some(BracketSlot::default()); size],
        }
    }

    pub fn from_slots(slots: Vec<BracketSlot>) -> Self {
        Self {
            slots: slots.into_iter().map(Some).collect(),
        }
    }

    /// Index of the slot that references `match_id`.
    pub fn position_of(&self, match_id: MatchId) -> Option<usize> {
        self.slots.iter().position(|slot| {
            slot.as_ref()
                .is_some_and(|s| s.match_reference == Some(match_id))
        })
    }

    /// The slot at `index`, creating it (and any gap before it) if needed.
    pub fn slot_or_create(&mut self, index: usize) -> &mut BracketSlot {
        if self.slots.len() <= index {
            self.slots.resize(index + 1, None);
        }
        self.slots[index].get_or_insert_with(BracketSlot::default)
    }
}

/// How round 0 feeds round 1.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstRoundFeed {
    /// Round 0 is a qualifying round: slot `i` sends its winner to round 1
    /// slot `i` as player 1, against a player 2 seeded there in advance.
    #[default]
    Qualifying,
    /// Round 0 halves into round 1 like every later round.
    Elimination,
}

/// Where a winner goes next.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NextPosition {
    pub round: usize,
    pub slot: usize,
    pub side: PlayerSlot,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnockoutBracket {
    #[serde(default)]
    pub first_round_feed: FirstRoundFeed,
    pub rounds: Vec<KnockoutRound>,
}

impl KnockoutBracket {
    /// A bracket whose round 0 qualifies 1:1 into round 1.
    pub fn qualifying(rounds: Vec<KnockoutRound>) -> Self {
        Self {
            first_round_feed: FirstRoundFeed::Qualifying,
            rounds,
        }
    }

    /// A plain single-elimination bracket: `first_round` followed by empty
    /// rounds of `ceil(n / 2)` slots down to a one-slot final.
    pub fn elimination(first_round: Vec<BracketSlot>) -> Self {
        let mut size = first_round.len();
        let mut rounds = vec![KnockoutRound::from_slots(first_round)];
        while size > 1 {
            size = size.div_ceil(2);
            rounds.push(KnockoutRound::empty(size));
        }
        Self {
            first_round_feed: FirstRoundFeed::Elimination,
            rounds,
        }
    }

    /// Destination of the winner of `rounds[round][slot]`, or `None` when
    /// `round` is the last round.
    pub fn next_position(&self, round: usize, slot: usize) -> Option<NextPosition> {
        let next_round = round + 1;
        if next_round >= self.rounds.len() {
            return None;
        }
        let (next_slot, side) = match (round, self.first_round_feed) {
            (0, FirstRoundFeed::Qualifying) => (slot, PlayerSlot::One),
            _ if slot % 2 == 0 => (slot / 2, PlayerSlot::One),
            _ => (slot / 2, PlayerSlot::Two),
        };
        Some(NextPosition {
            round: next_round,
            slot: next_slot,
            side,
        })
    }

    /// Match of the final, when the last round is a single created slot.
    pub fn final_match(&self) -> Option<MatchId> {
        match self.rounds.last()?.slots.as_slice() {
            [Some(slot)] => slot.match_reference,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elimination_rounds_halve_to_single_final() {
        let bracket = KnockoutBracket::elimination(vec![BracketSlot::default(); 5]);
        let sizes: Vec<usize> = bracket.rounds.iter().map(|r| r.slots.len()).collect();
        assert_eq!(sizes, vec![5, 3, 2, 1]);
    }

    #[test]
    fn qualifying_round_feeds_one_to_one() {
        let bracket = KnockoutBracket::qualifying(vec![KnockoutRound::empty(4), KnockoutRound::empty(4)]);
        assert_eq!(
            bracket.next_position(0, 3),
            Some(NextPosition { round: 1, slot: 3, side: PlayerSlot::One })
        );
    }

    #[test]
    fn later_rounds_halve() {
        let bracket = KnockoutBracket::qualifying(vec![
            KnockoutRound::empty(4),
            KnockoutRound::empty(4),
            KnockoutRound::empty(2),
        ]);
        assert_eq!(
            bracket.next_position(1, 2),
            Some(NextPosition { round: 2, slot: 1, side: PlayerSlot::One })
        );
        assert_eq!(
            bracket.next_position(1, 3),
            Some(NextPosition { round: 2, slot: 1, side: PlayerSlot::Two })
        );
        assert_eq!(bracket.next_position(2, 0), None);
    }

    #[test]
    fn slot_or_create_fills_gaps_with_uncreated_slots() {
        let mut round = KnockoutRound::default();
        round.slot_or_create(2).player1 = Some(uuid::Uuid::new_v4());
        assert_eq!(round.slots.len(), 3);
        assert!(round.slots[0].is_none());
        assert!(round.slots[2].is_some());
    }
}
