//! Shared fixtures: tournaments seeded into a `MemoryStore`, finish-request bodies.

#![allow(dead_code)]

use dart_match_engine::{
    Board, BracketSlot, GameMatch, Group, KnockoutBracket, MatchEngine, MatchStage, MemoryStore,
    PlayerId, Tournament,
};
use serde_json::{json, Value};
use uuid::Uuid;

pub fn players(n: usize) -> Vec<PlayerId> {
    (0..n).map(|_| Uuid::new_v4()).collect()
}

/// A finish-match request body where `winner` won with the given leg counts.
pub fn finish_body(winner: PlayerId, player1_legs: u32, player2_legs: u32) -> Value {
    json!({
        "winnerId": winner.to_string(),
        "player1LegsWon": player1_legs,
        "player2LegsWon": player2_legs,
        "stats": {
            "player1": { "dartsThrown": 60, "average": 71.4 },
            "player2": { "dartsThrown": 57, "average": 64.2 }
        },
        "highestCheckout": { "player1": 96, "player2": 40 },
        "oneEighties": {
            "player1": { "count": 1, "darts": [12] },
            "player2": { "count": 0, "darts": [] }
        }
    })
}

pub struct Knockout {
    pub engine: MatchEngine<MemoryStore>,
    pub tournament: Tournament,
    pub boards: Vec<Board>,
    /// Round-0 matches, one per first-round slot.
    pub first_round: Vec<GameMatch>,
}

/// Single-elimination bracket over `pairs` first-round matches, with
/// `registered` of `board_count` boards registered. First-round matches go on
/// boards round-robin.
pub fn knockout(pairs: &[(PlayerId, PlayerId)], board_count: u32, registered: u32) -> Knockout {
    let mut tournament = Tournament::with_knockout("Friday cup", board_count, KnockoutBracket::default());
    let boards: Vec<Board> = (1..=registered).map(|n| Board::new(tournament.id, n)).collect();

    let first_round: Vec<GameMatch> = pairs
        .iter()
        .enumerate()
        .map(|(i, (p1, p2))| {
            let board = &boards[i % boards.len()];
            GameMatch::new(
                tournament.id,
                board.id,
                MatchStage::Knockout { round: 1 },
                Some(*p1),
                Some(*p2),
            )
        })
        .collect();
    let slots = first_round
        .iter()
        .map(|m| BracketSlot {
            player1: m.player1,
            player2: m.player2,
            match_reference: Some(m.id),
        })
        .collect();
    tournament.knockout = KnockoutBracket::elimination(slots);

    let store = MemoryStore::new();
    store.insert_tournament(tournament.clone()).unwrap();
    for b in &boards {
        store.register_board(b.clone()).unwrap();
    }
    for m in &first_round {
        store.insert_match(m.clone()).unwrap();
    }
    Knockout {
        engine: MatchEngine::new(store),
        tournament,
        boards,
        first_round,
    }
}

pub struct GroupStage {
    pub engine: MatchEngine<MemoryStore>,
    pub tournament: Tournament,
    pub board: Board,
}

/// One group over `members` with a single board; add matches with [`GroupStage::schedule`].
pub fn group_stage(members: &[PlayerId]) -> GroupStage {
    let tournament = Tournament::with_groups("League", 1, vec![Group::new(members.to_vec())]);
    let board = Board::new(tournament.id, 1);
    let store = MemoryStore::new();
    store.insert_tournament(tournament.clone()).unwrap();
    store.register_board(board.clone()).unwrap();
    GroupStage {
        engine: MatchEngine::new(store),
        tournament,
        board,
    }
}

impl GroupStage {
    pub fn schedule(&self, p1: PlayerId, p2: PlayerId) -> GameMatch {
        let m = GameMatch::new(
            self.tournament.id,
            self.board.id,
            MatchStage::Group { group_index: 0 },
            Some(p1),
            Some(p2),
        );
        self.engine.store().insert_match(m.clone()).unwrap();
        m
    }

    /// Schedule and immediately finish a match that `p1` or `p2` won.
    pub fn play(&self, p1: PlayerId, p2: PlayerId, p1_legs: u32, p2_legs: u32) -> GameMatch {
        let m = self.schedule(p1, p2);
        let winner = if p1_legs > p2_legs { p1 } else { p2 };
        self.engine
            .finish_match(self.tournament.id, m.id, &finish_body(winner, p1_legs, p2_legs))
            .unwrap();
        m
    }
}
