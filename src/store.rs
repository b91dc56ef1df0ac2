//! Storage collaborators (tournaments, matches, boards) and an in-memory store.

use crate::error::{EngineError, EngineResult, NotFound};
use crate::models::{Board, BoardId, GameMatch, MatchId, Tournament, TournamentId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

pub trait TournamentStore {
    fn tournament(&self, id: TournamentId) -> EngineResult<Option<Tournament>>;
}

pub trait MatchStore {
    fn find_match(&self, id: MatchId) -> EngineResult<Option<GameMatch>>;
    fn tournament_matches(&self, tournament_id: TournamentId) -> EngineResult<Vec<GameMatch>>;
}

pub trait BoardRegistry {
    fn board(&self, id: BoardId) -> EngineResult<Option<Board>>;
    fn tournament_boards(&self, tournament_id: TournamentId) -> EngineResult<Vec<Board>>;
}

/// Everything one engine operation writes, applied all-or-nothing.
#[derive(Clone, Debug)]
pub struct Changeset {
    pub tournament_id: TournamentId,
    /// Revision the operation read; the commit fails if it moved since.
    pub expected_revision: u64,
    /// New aggregate, if the operation changed it.
    pub tournament: Option<Tournament>,
    pub matches: Vec<GameMatch>,
    pub boards: Vec<Board>,
}

/// A store the engine can read from and commit to.
pub trait Store: TournamentStore + MatchStore + BoardRegistry + Send + Sync {
    /// Apply `changes` atomically. Returns the tournament revision after the
    /// write; fails with `ConcurrencyConflict` without writing anything if the
    /// stored revision differs from `changes.expected_revision`.
    fn commit(&self, changes: Changeset) -> EngineResult<u64>;
}

/// Serializable contents of a store (seed files, exports).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub tournaments: Vec<Tournament>,
    #[serde(default)]
    pub matches: Vec<GameMatch>,
    #[serde(default)]
    pub boards: Vec<Board>,
}

#[derive(Default)]
struct StoreState {
    tournaments: HashMap<TournamentId, Tournament>,
    matches: HashMap<MatchId, GameMatch>,
    boards: HashMap<BoardId, Board>,
}

/// In-memory store: all collections behind a single lock, so a commit is one
/// critical section.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let state = StoreState {
            tournaments: snapshot.tournaments.into_iter().map(|t| (t.id, t)).collect(),
            matches: snapshot.matches.into_iter().map(|m| (m.id, m)).collect(),
            boards: snapshot.boards.into_iter().map(|b| (b.id, b)).collect(),
        };
        Self {
            state: RwLock::new(state),
        }
    }

    pub fn snapshot(&self) -> EngineResult<Snapshot> {
        let g = self.state.read()?;
        Ok(Snapshot {
            tournaments: g.tournaments.values().cloned().collect(),
            matches: g.matches.values().cloned().collect(),
            boards: g.boards.values().cloned().collect(),
        })
    }

    pub fn insert_tournament(&self, tournament: Tournament) -> EngineResult<()> {
        self.state.write()?.tournaments.insert(tournament.id, tournament);
        Ok(())
    }

    pub fn insert_match(&self, game: GameMatch) -> EngineResult<()> {
        self.state.write()?.matches.insert(game.id, game);
        Ok(())
    }

    pub fn register_board(&self, board: Board) -> EngineResult<()> {
        self.state.write()?.boards.insert(board.id, board);
        Ok(())
    }
}

impl TournamentStore for MemoryStore {
    fn tournament(&self, id: TournamentId) -> EngineResult<Option<Tournament>> {
        Ok(self.state.read()?.tournaments.get(&id).cloned())
    }
}

impl MatchStore for MemoryStore {
    fn find_match(&self, id: MatchId) -> EngineResult<Option<GameMatch>> {
        Ok(self.state.read()?.matches.get(&id).cloned())
    }

    fn tournament_matches(&self, tournament_id: TournamentId) -> EngineResult<Vec<GameMatch>> {
        let g = self.state.read()?;
        let mut matches: Vec<GameMatch> = g
            .matches
            .values()
            .filter(|m| m.tournament_id == tournament_id)
            .cloned()
            .collect();
        matches.sort_by_key(|m| (m.updated_at, m.id));
        Ok(matches)
    }
}

impl BoardRegistry for MemoryStore {
    fn board(&self, id: BoardId) -> EngineResult<Option<Board>> {
        Ok(self.state.read()?.boards.get(&id).cloned())
    }

    fn tournament_boards(&self, tournament_id: TournamentId) -> EngineResult<Vec<Board>> {
        let g = self.state.read()?;
        let mut boards: Vec<Board> = g
            .boards
            .values()
            .filter(|b| b.tournament_id == tournament_id)
            .cloned()
            .collect();
        boards.sort_by_key(|b| b.number);
        Ok(boards)
    }
}

impl Store for MemoryStore {
    fn commit(&self, changes: Changeset) -> EngineResult<u64> {
        let mut g = self.state.write()?;
        let actual = g
            .tournaments
            .get(&changes.tournament_id)
            .map(|t| t.revision)
            .ok_or(NotFound::Tournament(changes.tournament_id))?;
        if actual != changes.expected_revision {
            return Err(EngineError::ConcurrencyConflict {
                tournament: changes.tournament_id,
                expected: changes.expected_revision,
                actual,
            });
        }

        let mut revision = actual;
        if let Some(mut tournament) = changes.tournament {
            revision += 1;
            tournament.revision = revision;
            g.tournaments.insert(tournament.id, tournament);
        }
        for m in changes.matches {
            g.matches.insert(m.id, m);
        }
        for b in changes.boards {
            g.boards.insert(b.id, b);
        }
        Ok(revision)
    }
}
