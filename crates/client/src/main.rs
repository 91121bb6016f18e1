//! Local hot-seat client: two seats, one in-memory ledger.
mod app;
mod command;
mod config;
mod logging;
mod render;

use std::sync::Arc;

use anyhow::Result;
use client_blockchain_core::{GameLedger, InMemoryLedger, MockProver, WitnessProver};
use game_core::{GameConfig, PlayerId};
use runtime::MatchRuntime;

use crate::app::App;
use crate::config::ClientConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = ClientConfig::from_env();
    let _guard = logging::setup_logging(&config)?;

    let mut ledger = InMemoryLedger::new();
    if let Some(latency) = config.ledger_latency {
        ledger = ledger.with_latency(latency);
    }

    let game_config = match config.board {
        Some(dimensions) => GameConfig::default().with_dimensions(dimensions.rows, dimensions.cols),
        None => GameConfig::default(),
    };
    let players = [PlayerId::repeat_byte(1), PlayerId::repeat_byte(2)];
    let match_id = ledger.create_match(game_config, players[0], players[1])?;
    tracing::info!(%match_id, "local match created");

    let ledger: Arc<dyn GameLedger> = Arc::new(ledger);
    let prover: Arc<dyn WitnessProver> = Arc::new(MockProver::new());

    let mut runtimes = Vec::with_capacity(players.len());
    for player in players {
        let runtime = MatchRuntime::builder()
            .config(config.runtime.clone())
            .ledger(Arc::clone(&ledger))
            .prover(Arc::clone(&prover))
            .join(match_id, player)
            .build()
            .await?;
        runtimes.push(runtime);
    }

    let handles = [runtimes[0].handle(), runtimes[1].handle()];
    App::new(players, handles).run().await?;

    for runtime in runtimes {
        runtime.shutdown().await?;
    }
    tracing::info!("session closed");
    Ok(())
}
