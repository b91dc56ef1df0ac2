//! Match records: status lifecycle, participants, and final statistics.

use crate::error::ValidationError;
use crate::models::board::BoardId;
use crate::models::player::{OneEighties, PlayerId, PlayerMatchStats, PlayerPair, PlayerSlot};
use crate::models::tournament::TournamentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Lifecycle of a match. Only `Pending -> Ongoing -> Finished` and
/// `Pending -> Finished` are allowed; `Finished` is terminal.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Pending,
    Ongoing,
    Finished,
}

impl MatchStatus {
    pub fn can_transition_to(self, next: MatchStatus) -> bool {
        use MatchStatus::*;
        matches!(
            (self, next),
            (Pending, Ongoing) | (Pending, Finished) | (Ongoing, Finished)
        )
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Ongoing => "ongoing",
            MatchStatus::Finished => "finished",
        };
        f.write_str(s)
    }
}

/// Where a match sits in the tournament.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum MatchStage {
    /// Round-robin match inside `groups[group_index]`.
    Group { group_index: usize },
    /// Knockout match; `round` is 1-based (`knockout.rounds[round - 1]`).
    Knockout { round: u32 },
}

/// One completed leg, as recorded by the live-scoring pipeline.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    pub winner: Option<PlayerId>,
    pub player1_score: u32,
    pub player2_score: u32,
    pub checkout_score: Option<u32>,
    pub winner_darts: Option<u32>,
}

/// Darts thrown and three-dart average reported for one player.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportedStats {
    pub darts_thrown: u32,
    pub average: f64,
}

/// A validated "finish match" payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub winner_id: PlayerId,
    pub player1_legs_won: u32,
    pub player2_legs_won: u32,
    pub stats: PlayerPair<ReportedStats>,
    pub highest_checkout: PlayerPair<u32>,
    pub one_eighties: PlayerPair<OneEighties>,
}

impl MatchResult {
    pub fn legs_won(&self, slot: PlayerSlot) -> u32 {
        match slot {
            PlayerSlot::One => self.player1_legs_won,
            PlayerSlot::Two => self.player2_legs_won,
        }
    }

    fn player_stats(&self, slot: PlayerSlot) -> PlayerMatchStats {
        let reported = self.stats.get(slot);
        PlayerMatchStats {
            legs_won: self.legs_won(slot),
            darts_thrown: reported.darts_thrown,
            average: reported.average,
            highest_checkout: *self.highest_checkout.get(slot),
            one_eighties: self.one_eighties.get(slot).clone(),
        }
    }
}

/// A single 1v1 match played on a board.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMatch {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub board_id: BoardId,
    pub stage: MatchStage,
    pub status: MatchStatus,
    /// None until the bracket (or group draw) assigns a player.
    pub player1: Option<PlayerId>,
    pub player2: Option<PlayerId>,
    /// Set exactly once, when the match finishes.
    pub winner: Option<PlayerId>,
    pub scorer: Option<PlayerId>,
    pub legs_to_win: Option<u32>,
    pub starting_player: Option<PlayerSlot>,
    pub stats: PlayerPair<PlayerMatchStats>,
    #[serde(default)]
    pub legs: Vec<Leg>,
    pub updated_at: DateTime<Utc>,
}

impl GameMatch {
    /// A fresh pending match with zeroed statistics and no scorer.
    pub fn new(
        tournament_id: TournamentId,
        board_id: BoardId,
        stage: MatchStage,
        player1: Option<PlayerId>,
        player2: Option<PlayerId>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            board_id,
            stage,
            status: MatchStatus::Pending,
            player1,
            player2,
            winner: None,
            scorer: None,
            legs_to_win: None,
            starting_player: None,
            stats: PlayerPair::default(),
            legs: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status == MatchStatus::Finished
    }

    /// Both participants, or an error if either side is still unassigned.
    pub fn participants(&self) -> Result<(PlayerId, PlayerId), ValidationError> {
        match (self.player1, self.player2) {
            (Some(p1), Some(p2)) => Ok((p1, p2)),
            _ => Err(ValidationError::ParticipantsNotAssigned(self.id)),
        }
    }

    pub fn slot_of(&self, player: PlayerId) -> Option<PlayerSlot> {
        if self.player1 == Some(player) {
            Some(PlayerSlot::One)
        } else if self.player2 == Some(player) {
            Some(PlayerSlot::Two)
        } else {
            None
        }
    }

    pub fn involves_any(&self, players: &[PlayerId]) -> bool {
        [self.player1, self.player2]
            .iter()
            .flatten()
            .any(|p| players.contains(p))
    }

    /// Move a pending match to `Ongoing`.
    pub fn start(
        &mut self,
        legs_to_win: u32,
        starting_player: PlayerSlot,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        self.transition(MatchStatus::Ongoing)?;
        self.participants()?;
        self.status = MatchStatus::Ongoing;
        self.legs_to_win = Some(legs_to_win);
        self.starting_player = Some(starting_player);
        self.updated_at = now;
        Ok(())
    }

    /// Record the terminal result. Fails if the match is already finished or
    /// the winner is not one of the two participants; nothing is changed then.
    pub fn finish(&mut self, result: &MatchResult, now: DateTime<Utc>) -> Result<(), ValidationError> {
        self.transition(MatchStatus::Finished)?;
        self.participants()?;
        if self.slot_of(result.winner_id).is_none() {
            return Err(ValidationError::WinnerNotParticipant {
                winner: result.winner_id,
                match_id: self.id,
            });
        }
        self.status = MatchStatus::Finished;
        self.winner = Some(result.winner_id);
        self.stats = PlayerPair::new(
            result.player_stats(PlayerSlot::One),
            result.player_stats(PlayerSlot::Two),
        );
        self.updated_at = now;
        Ok(())
    }

    fn transition(&self, next: MatchStatus) -> Result<(), ValidationError> {
        if self.status == MatchStatus::Finished {
            return Err(ValidationError::AlreadyFinished(self.id));
        }
        if !self.status.can_transition_to(next) {
            return Err(ValidationError::InvalidTransition {
                match_id: self.id,
                from: self.status,
                to: next,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_for(winner: PlayerId) -> MatchResult {
        MatchResult {
            winner_id: winner,
            player1_legs_won: 3,
            player2_legs_won: 1,
            stats: PlayerPair::new(
                ReportedStats { darts_thrown: 60, average: 71.5 },
                ReportedStats { darts_thrown: 57, average: 55.0 },
            ),
            highest_checkout: PlayerPair::new(121, 40),
            one_eighties: PlayerPair::new(
                OneEighties { count: 1, darts: vec![3] },
                OneEighties::default(),
            ),
        }
    }

    fn pending_match() -> (GameMatch, PlayerId, PlayerId) {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let m = GameMatch::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            MatchStage::Group { group_index: 0 },
            Some(a),
            Some(b),
        );
        (m, a, b)
    }

    #[test]
    fn finish_records_winner_and_stats() {
        let (mut m, a, _) = pending_match();
        m.finish(&result_for(a), Utc::now()).unwrap();
        assert_eq!(m.status, MatchStatus::Finished);
        assert_eq!(m.winner, Some(a));
        assert_eq!(m.stats.player1.legs_won, 3);
        assert_eq!(m.stats.player1.highest_checkout, 121);
        assert_eq!(m.stats.player1.one_eighties.darts, vec![3]);
        assert_eq!(m.stats.player2.darts_thrown, 57);
    }

    #[test]
    fn finished_match_is_immutable() {
        let (mut m, a, b) = pending_match();
        m.finish(&result_for(a), Utc::now()).unwrap();
        let before = m.clone();
        assert!(matches!(
            m.finish(&result_for(b), Utc::now()),
            Err(ValidationError::AlreadyFinished(_))
        ));
        assert_eq!(m, before);
    }

    #[test]
    fn winner_must_be_a_participant() {
        let (mut m, _, _) = pending_match();
        let stranger = Uuid::new_v4();
        assert!(matches!(
            m.finish(&result_for(stranger), Utc::now()),
            Err(ValidationError::WinnerNotParticipant { .. })
        ));
        assert_eq!(m.status, MatchStatus::Pending);
        assert_eq!(m.winner, None);
    }

    #[test]
    fn start_only_from_pending() {
        let (mut m, _, _) = pending_match();
        m.start(3, PlayerSlot::Two, Utc::now()).unwrap();
        assert_eq!(m.status, MatchStatus::Ongoing);
        assert_eq!(m.starting_player, Some(PlayerSlot::Two));
        assert!(matches!(
            m.start(3, PlayerSlot::One, Utc::now()),
            Err(ValidationError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn unassigned_match_cannot_finish() {
        let a = Uuid::new_v4();
        let mut m = GameMatch::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            MatchStage::Knockout { round: 2 },
            Some(a),
            None,
        );
        assert!(matches!(
            m.finish(&result_for(a), Utc::now()),
            Err(ValidationError::ParticipantsNotAssigned(_))
        ));
    }

    #[test]
    fn stage_serializes_with_type_tag() {
        let json = serde_json::to_value(MatchStage::Group { group_index: 2 }).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "group", "groupIndex": 2 }));
    }
}
