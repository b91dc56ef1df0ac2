//! REST endpoints over a shared [`MatchEngine`].

use crate::engine::{MatchEngine, StartMatch};
use crate::error::{EngineError, ValidationError};
use crate::models::{BoardId, MatchId, TournamentId};
use crate::store::MemoryStore;
use actix_web::{
    get, patch, post,
    web::{self, Data, Json, Path},
    HttpResponse,
};
use serde::{Deserialize, Serialize};

/// Engine shared by all workers.
pub type AppState = Data<MatchEngine<MemoryStore>>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

/// Path segments: match id and tournament id (e.g. /api/matches/{match_id}/{tournament_id}/finish)
#[derive(Deserialize)]
struct MatchTournamentPath {
    match_id: MatchId,
    tournament_id: TournamentId,
}

#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

#[derive(Deserialize)]
struct MatchPath {
    id: MatchId,
}

#[derive(Deserialize)]
struct BoardPath {
    id: BoardId,
}

#[get("/api/health")]
async fn api_health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "dart-match-engine",
    })
}

/// Report a finished match; advances the bracket or recomputes group standings.
#[patch("/api/matches/{match_id}/{tournament_id}/finish")]
async fn api_finish_match(
    engine: AppState,
    path: Path<MatchTournamentPath>,
    body: Json<serde_json::Value>,
) -> Result<HttpResponse, EngineError> {
    engine.finish_match(path.tournament_id, path.match_id, &body)?;
    Ok(HttpResponse::Ok().json(SuccessResponse { success: true }))
}

/// Start a pending match (board becomes `playing`).
#[post("/api/matches/{match_id}/{tournament_id}/start")]
async fn api_start_match(
    engine: AppState,
    path: Path<MatchTournamentPath>,
    body: Json<StartMatch>,
) -> Result<HttpResponse, EngineError> {
    let outcome = engine.start_match(path.tournament_id, path.match_id, body.into_inner())?;
    Ok(HttpResponse::Ok().json(outcome.match_record))
}

#[get("/api/tournaments/{id}")]
async fn api_get_tournament(engine: AppState, path: Path<TournamentPath>) -> Result<HttpResponse, EngineError> {
    Ok(HttpResponse::Ok().json(engine.tournament(path.id)?))
}

#[get("/api/matches/{id}")]
async fn api_get_match(engine: AppState, path: Path<MatchPath>) -> Result<HttpResponse, EngineError> {
    Ok(HttpResponse::Ok().json(engine.match_record(path.id)?))
}

#[get("/api/boards/{id}")]
async fn api_get_board(engine: AppState, path: Path<BoardPath>) -> Result<HttpResponse, EngineError> {
    Ok(HttpResponse::Ok().json(engine.board(path.id)?))
}

/// Register routes and a JSON error handler that answers `{ "error": ... }`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        EngineError::from(ValidationError::Malformed(err.to_string())).into()
    }))
    .service(api_health)
    .service(api_finish_match)
    .service(api_start_match)
    .service(api_get_tournament)
    .service(api_get_match)
    .service(api_get_board);
}
