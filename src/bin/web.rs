//! Web server for the match engine: REST API over an in-memory store.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env (or .env): HOST, PORT, SEED_FILE (JSON snapshot), MAX_COMMIT_ATTEMPTS.

use actix_web::{middleware::Logger, web::Data, App, HttpServer};
use dart_match_engine::{api, config::ServerConfig, MatchEngine, MemoryStore, Snapshot};
use std::io;
use std::path::Path;

async fn load_store(seed_file: Option<&Path>) -> io::Result<MemoryStore> {
    let Some(path) = seed_file else {
        return Ok(MemoryStore::new());
    };
    let raw = tokio::fs::read_to_string(path).await?;
    let snapshot: Snapshot =
        serde_json::from_str(&raw).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    log::info!(
        "Seeded {} tournament(s), {} match(es), {} board(s) from {}",
        snapshot.tournaments.len(),
        snapshot.matches.len(),
        snapshot.boards.len(),
        path.display()
    );
    Ok(MemoryStore::from_snapshot(snapshot))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let store = load_store(config.seed_file.as_deref()).await?;
    let engine = Data::new(MatchEngine::new(store).with_max_commit_attempts(config.max_commit_attempts));

    let bind = (config.host.clone(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(engine.clone())
            .configure(api::configure)
    })
    .bind(bind)?
    .run()
    .await
}
