use std::future::IntoFuture;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast;

use terraforge_engine::game::Game;
use terraforge_server::api::{self, AppState};
use terraforge_server::config::ServerConfig;
use terraforge_server::event_bus::{self, WorldChangeBatch};
use terraforge_server::persistence;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = ServerConfig::from_args(&args)?;

    tracing::info!("terraforge -- voxel world server");

    // ── Load the saved world, or start a fresh one ───────────────────────
    let game = match persistence::load_game(&config.world_dir)
        .with_context(|| format!("loading world from {}", config.world_dir.display()))?
    {
        Some(game) => {
            let saved_seed = game.generator().world_seed();
            if saved_seed != config.seed {
                tracing::warn!(
                    "Configured seed {} ignored, the saved world uses seed {}",
                    config.seed,
                    saved_seed
                );
            }
            game
        }
        None => {
            tracing::info!("No saved world found, generating with seed {}", config.seed);
            Game::with_seed(config.seed)
        }
    };

    // Mutating calls publish here; live-feed sockets subscribe.
    let (bus_tx, _) = broadcast::channel::<WorldChangeBatch>(event_bus::BUS_CAPACITY);
    let state = Arc::new(AppState::new(game.clone(), bus_tx));

    // ── Periodic autosave ────────────────────────────────────────────────
    if let Some(period) = config.autosave_interval() {
        let save_game = game.clone();
        let save_dir = config.world_dir.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // first tick is immediate, skip it
            loop {
                interval.tick().await;
                let game = save_game.clone();
                let dir = save_dir.clone();
                // Serializing a large world is blocking work.
                let result =
                    tokio::task::spawn_blocking(move || persistence::save_game(&game, &dir)).await;
                match result {
                    Ok(Ok(Some(stats))) => tracing::info!(
                        "Autosave complete: {} slots, {} balances",
                        stats.slots,
                        stats.balances
                    ),
                    Ok(Ok(None)) => {}
                    Ok(Err(e)) => tracing::error!("Autosave failed: {:#}", e),
                    Err(e) => tracing::error!("Autosave task panicked: {}", e),
                }
            }
        });
    }

    // ── Serve until Ctrl+C ───────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!("Listening on http://{}", config.bind);

    tokio::select! {
        result = axum::serve(listener, api::router(state)).into_future() => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received, shutting down...");
        }
    }

    // ── Save on shutdown ─────────────────────────────────────────────────
    tracing::info!("Saving world before exit...");
    match persistence::save_game(&game, &config.world_dir) {
        Ok(Some(stats)) => tracing::info!(
            "Shutdown save complete: {} slots, {} balances",
            stats.slots,
            stats.balances
        ),
        Ok(None) => tracing::info!("Shutdown save: nothing changed"),
        Err(e) => tracing::error!("Shutdown save failed: {:#}", e),
    }

    Ok(())
}
