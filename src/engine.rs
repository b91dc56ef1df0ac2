//! Transactional entry points: finish a match, start a match.
//!
//! Each operation runs under a per-tournament lock, works on copies of what it
//! read, and writes everything through one [`Changeset`]. A failure at any step
//! leaves the store untouched. A revision conflict at commit time re-runs the
//! operation from the beginning, up to `max_commit_attempts` times.

use crate::error::{EngineError, EngineResult, ErrorKind, NotFound, ValidationError};
use crate::logic::{
    advance_winner, is_final_finished, reconcile_board, record_group_result,
    validate_finish_request,
};
use crate::models::{
    Board, BoardId, BoardStatus, BoardStatusChange, GameMatch, MatchId, MatchResult, MatchStage,
    PlayerId, PlayerSlot, Standing, Tournament, TournamentId, TournamentStatus,
};
use crate::store::{Changeset, Store};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const DEFAULT_MAX_COMMIT_ATTEMPTS: usize = 3;

/// A knockout match created because its bracket slot just filled up.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledMatch {
    pub match_id: MatchId,
    pub board_id: BoardId,
    pub player1: PlayerId,
    pub player2: PlayerId,
    /// 1-based knockout round.
    pub round: u32,
}

impl ScheduledMatch {
    fn from_match(game: &GameMatch) -> Option<Self> {
        let MatchStage::Knockout { round } = game.stage else {
            return None;
        };
        Some(Self {
            match_id: game.id,
            board_id: game.board_id,
            player1: game.player1?,
            player2: game.player2?,
            round,
        })
    }
}

/// Which progression ran for a finished match.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum CompletionPath {
    Knockout {
        scheduled: Option<ScheduledMatch>,
        tournament_finished: bool,
    },
    Group {
        group_index: usize,
        standings: Vec<Standing>,
    },
}

/// Everything a finish-match call changed.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishOutcome {
    pub match_id: MatchId,
    pub winner: PlayerId,
    pub path: CompletionPath,
    pub board_changes: Vec<BoardStatusChange>,
    /// Tournament revision after the commit.
    pub revision: u64,
}

/// Body of a start-match call. `startingPlayer` is 1 or 2.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartMatch {
    pub legs_to_win: u32,
    pub starting_player: u8,
}

impl StartMatch {
    fn validated(&self) -> Result<(u32, PlayerSlot), ValidationError> {
        if self.legs_to_win == 0 {
            return Err(ValidationError::InvalidField {
                field: "legsToWin",
                reason: "must be at least 1".to_string(),
            });
        }
        let slot = match self.starting_player {
            1 => PlayerSlot::One,
            2 => PlayerSlot::Two,
            other => {
                return Err(ValidationError::InvalidField {
                    field: "startingPlayer",
                    reason: format!("expected 1 or 2, got {other}"),
                })
            }
        };
        Ok((self.legs_to_win, slot))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOutcome {
    pub match_record: GameMatch,
    pub board_change: BoardStatusChange,
}

/// Match-completion engine over a [`Store`].
pub struct MatchEngine<S> {
    store: S,
    locks: Mutex<HashMap<TournamentId, Arc<Mutex<()>>>>,
    max_commit_attempts: usize,
}

impl<S: Store> MatchEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
            max_commit_attempts: DEFAULT_MAX_COMMIT_ATTEMPTS,
        }
    }

    /// Attempts per operation before a revision conflict is reported (min 1).
    pub fn with_max_commit_attempts(mut self, attempts: usize) -> Self {
        self.max_commit_attempts = attempts.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record a finished match and run bracket or group progression.
    ///
    /// `body` is the raw request body; it is validated before anything is read.
    /// A match that is already finished is rejected and nothing changes.
    pub fn finish_match(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
        body: &Value,
    ) -> EngineResult<FinishOutcome> {
        let result = validate_finish_request(body).inspect_err(|e| {
            warn!("Rejected finish request for match {match_id}: {e}");
        })?;
        let outcome = self.serialized(tournament_id, match_id, || {
            self.try_finish(tournament_id, match_id, &result)
        })?;
        if let CompletionPath::Knockout {
            tournament_finished: true,
            ..
        } = outcome.path
        {
            self.locks().remove(&tournament_id);
        }
        Ok(outcome)
    }

    /// Move a pending match to ongoing and mark its board as playing.
    pub fn start_match(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
        request: StartMatch,
    ) -> EngineResult<StartOutcome> {
        let (legs_to_win, starting) = request.validated()?;
        self.serialized(tournament_id, match_id, || {
            self.try_start(tournament_id, match_id, legs_to_win, starting)
        })
    }

    pub fn tournament(&self, id: TournamentId) -> EngineResult<Tournament> {
        Ok(self.store.tournament(id)?.ok_or(NotFound::Tournament(id))?)
    }

    pub fn match_record(&self, id: MatchId) -> EngineResult<GameMatch> {
        Ok(self.store.find_match(id)?.ok_or(NotFound::Match(id))?)
    }

    pub fn board(&self, id: BoardId) -> EngineResult<Board> {
        Ok(self.store.board(id)?.ok_or(NotFound::Board(id))?)
    }

    fn try_finish(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
        result: &MatchResult,
    ) -> EngineResult<FinishOutcome> {
        let now = Utc::now();
        let (mut tournament, mut game) = self.load(tournament_id, match_id)?;
        let expected_revision = tournament.revision;

        game.finish(result, now)?;
        let winner = result.winner_id;

        // Working copies: every query below must see this request's writes.
        let mut matches = self.store.tournament_matches(tournament_id)?;
        upsert(&mut matches, game.clone());
        let mut boards = self.store.tournament_boards(tournament_id)?;
        let mut written = vec![game.clone()];
        let mut board_changes = Vec::new();

        let path = match game.stage {
            MatchStage::Knockout { round } => {
                let advance = advance_winner(&mut tournament, &game, round, winner, &boards)?;
                let scheduled = match advance.scheduled {
                    Some(next) => {
                        matches.push(next.clone());
                        board_changes.push(reconcile_on(&mut boards, next.board_id, None, &matches, now)?);
                        let scheduled = ScheduledMatch::from_match(&next);
                        written.push(next);
                        scheduled
                    }
                    None => None,
                };
                let tournament_finished = is_final_finished(&tournament.knockout, |id| {
                    matches.iter().find(|m| m.id == id).map(|m| m.status)
                });
                if tournament_finished && !tournament.is_finished() {
                    tournament.status = TournamentStatus::Finished;
                    info!("Tournament {} finished: final won by {}", tournament_id, winner);
                }
                CompletionPath::Knockout {
                    scheduled,
                    tournament_finished,
                }
            }
            MatchStage::Group { group_index } => {
                let group = tournament
                    .groups
                    .get_mut(group_index)
                    .ok_or(NotFound::Group(group_index))?;
                let group_matches: Vec<GameMatch> = matches
                    .iter()
                    .filter(|m| m.stage == game.stage && m.is_finished())
                    .filter(|m| m.id == game.id || m.involves_any(&group.players))
                    .cloned()
                    .collect();
                let standings = record_group_result(group, &game, &group_matches)?;
                CompletionPath::Group {
                    group_index,
                    standings,
                }
            }
        };

        board_changes.push(reconcile_on(&mut boards, game.board_id, Some(game.id), &matches, now)?);
        tournament.updated_at = now;

        let touched: Vec<Board> = boards
            .into_iter()
            .filter(|b| board_changes.iter().any(|c| c.board_id == b.id))
            .collect();
        let revision = self.store.commit(Changeset {
            tournament_id,
            expected_revision,
            tournament: Some(tournament),
            matches: written,
            boards: touched,
        })?;

        info!("Match {} finished, winner {}", match_id, winner);
        Ok(FinishOutcome {
            match_id,
            winner,
            path,
            board_changes,
            revision,
        })
    }

    fn try_start(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
        legs_to_win: u32,
        starting: PlayerSlot,
    ) -> EngineResult<StartOutcome> {
        let now = Utc::now();
        let (tournament, mut game) = self.load(tournament_id, match_id)?;
        game.start(legs_to_win, starting, now)?;

        let mut board = self
            .store
            .board(game.board_id)?
            .ok_or(NotFound::Board(game.board_id))?;
        let board_change = BoardStatusChange {
            board_id: board.id,
            from: board.status,
            to: BoardStatus::Playing,
        };
        board.set_status(BoardStatus::Playing, now);

        self.store.commit(Changeset {
            tournament_id,
            expected_revision: tournament.revision,
            tournament: None,
            matches: vec![game.clone()],
            boards: vec![board],
        })?;
        info!("Match {} started on board {}", match_id, board_change.board_id);
        Ok(StartOutcome {
            match_record: game,
            board_change,
        })
    }

    fn load(&self, tournament_id: TournamentId, match_id: MatchId) -> EngineResult<(Tournament, GameMatch)> {
        let game = self
            .store
            .find_match(match_id)?
            .filter(|m| m.tournament_id == tournament_id)
            .ok_or(NotFound::Match(match_id))?;
        let tournament = self
            .store
            .tournament(tournament_id)?
            .ok_or(NotFound::Tournament(tournament_id))?;
        Ok((tournament, game))
    }

    /// Run `op` while holding the tournament's lock, repeating it from scratch
    /// on revision conflicts.
    fn serialized<T>(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
        op: impl Fn() -> EngineResult<T>,
    ) -> EngineResult<T> {
        let lock = self.tournament_lock(tournament_id);
        // The lock guards no data, so a panic while it was held leaves nothing
        // inconsistent; the store only changes through `commit`.
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut attempt = 1;
        loop {
            match op() {
                Err(err) if err.is_retryable() && attempt < self.max_commit_attempts => {
                    attempt += 1;
                    warn!("{err}; retrying (attempt {attempt}/{})", self.max_commit_attempts);
                }
                Err(err) => {
                    log_failure(&err, tournament_id, match_id);
                    return Err(err);
                }
                ok => return ok,
            }
        }
    }

    fn tournament_lock(&self, id: TournamentId) -> Arc<Mutex<()>> {
        self.locks().entry(id).or_default().clone()
    }

    fn locks(&self) -> MutexGuard<'_, HashMap<TournamentId, Arc<Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn upsert(matches: &mut Vec<GameMatch>, game: GameMatch) {
    match matches.iter_mut().find(|m| m.id == game.id) {
        Some(existing) => *existing = game,
        None => matches.push(game),
    }
}

fn reconcile_on(
    boards: &mut [Board],
    board_id: BoardId,
    vacated_by: Option<MatchId>,
    matches: &[GameMatch],
    now: DateTime<Utc>,
) -> EngineResult<BoardStatusChange> {
    let board = boards
        .iter_mut()
        .find(|b| b.id == board_id)
        .ok_or(NotFound::Board(board_id))?;
    Ok(reconcile_board(board, vacated_by, matches, now))
}

fn log_failure(err: &EngineError, tournament_id: TournamentId, match_id: MatchId) {
    match err.kind() {
        ErrorKind::Internal => {
            error!("Engine failure (tournament {tournament_id}, match {match_id}): {err:?}")
        }
        ErrorKind::Resource => {
            error!("Tournament {tournament_id} needs operator attention: {err}")
        }
        _ => warn!("Request for match {match_id} in tournament {tournament_id} failed: {err}"),
    }
}
