//! HTTP/JSON surface of the game.
//!
//! One route per call; block types travel as their raw numeric value.
//! Every call is timed into [`Metrics`](crate::dashboard::Metrics), and every
//! successful mutation is published to the event bus.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use terraforge_engine::game::Game;
use terraforge_engine::game::error::GameError;
use terraforge_engine::game::event::WorldEvent;
use terraforge_engine::game::ledger::PlayerId;
use terraforge_engine::world::block::BlockType;
use terraforge_engine::world::position::BlockPos;

use crate::dashboard::{self, Call, DashboardState};
use crate::event_bus::WorldChangeBatch;

/// State shared by every handler via `Arc<AppState>`.
pub struct AppState {
    pub game: Game,
    pub dashboard: DashboardState,
}

impl AppState {
    pub fn new(game: Game, bus_tx: broadcast::Sender<WorldChangeBatch>) -> Self {
        Self {
            game,
            dashboard: DashboardState::new(bus_tx),
        }
    }

    /// Run one call, recording its duration and outcome.
    fn timed<T>(
        &self,
        call: Call,
        f: impl FnOnce(&Game) -> Result<T, GameError>,
    ) -> Result<T, ApiError> {
        let started = Instant::now();
        let result = f(&self.game);
        self.dashboard
            .metrics
            .record(call, started.elapsed(), result.is_ok());
        if let Err(e) = &result {
            tracing::debug!("{} rejected: {}", call.name(), e);
        }
        result.map_err(ApiError::Game)
    }

    fn publish(&self, event: WorldEvent) {
        if let Some(batch) = WorldChangeBatch::from_events(&[event]) {
            self.dashboard.publish(batch);
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/block/:x/:y/:z", get(get_block))
        .route("/blocks/:x/:y/:z/:count", get(get_blocks))
        .route("/generate/:x/:y/:z", get(generate_block))
        .route("/mine", post(mine_block))
        .route("/place", post(place_block))
        .route("/state/:x/:y/:z", get(read_state))
        .route("/state", post(write_state))
        .route("/balance/:player/:block_type", get(get_block_balance))
        .route("/balances/:player", get(get_balances))
        .merge(dashboard::server::routes())
        .with_state(state)
}

// ── Errors ──────────────────────────────────────────────────────────────

/// A failed call, rendered as `{"error": ..., "kind": ...}`.
#[derive(Debug)]
pub enum ApiError {
    /// The game rejected the call.
    Game(GameError),
    /// The call never completed, e.g. its worker task panicked.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let e = match self {
            ApiError::Game(e) => e,
            ApiError::Internal(message) => {
                let body = Json(serde_json::json!({ "error": message, "kind": "internal" }));
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }
        };
        let status = match &e {
            GameError::MiningInvalidTarget { .. } | GameError::PlacementBlocked { .. } => {
                StatusCode::CONFLICT
            }
            GameError::InsufficientBalance { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            GameError::InvalidBlockType(_)
            | GameError::InvalidState(_)
            | GameError::QueryTooLarge { .. }
            | GameError::QueryOutOfRange { .. } => StatusCode::BAD_REQUEST,
        };
        let body = Json(serde_json::json!({
            "error": e.to_string(),
            "kind": e.kind(),
        }));
        (status, body).into_response()
    }
}

fn block_type(raw: u8) -> Result<BlockType, GameError> {
    BlockType::from_raw(raw).ok_or(GameError::InvalidState(raw))
}

fn player_id(uuid: Uuid) -> PlayerId {
    PlayerId(uuid.as_u128())
}

// ── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BlockResponse {
    pub block_type: u8,
}

#[derive(Debug, Serialize)]
pub struct BlocksResponse {
    pub block_states: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub block_state: u8,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: u64,
}

#[derive(Debug, Serialize)]
pub struct BalancesResponse {
    pub balances: BTreeMap<u8, u64>,
}

#[derive(Debug, Serialize)]
pub struct Empty {}

#[derive(Debug, Deserialize)]
pub struct MineRequest {
    pub player: Uuid,
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

#[derive(Debug, Deserialize)]
pub struct PlaceRequest {
    pub player: Uuid,
    pub x: i64,
    pub y: i64,
    pub z: i64,
    pub block_type: u8,
}

#[derive(Debug, Deserialize)]
pub struct WriteStateRequest {
    pub x: i64,
    pub y: i64,
    pub z: i64,
    pub value: u8,
}

type Coords = Path<(i64, i64, i64)>;

// ── Handlers ────────────────────────────────────────────────────────────

pub async fn get_block(
    State(state): State<Arc<AppState>>,
    Path((x, y, z)): Coords,
) -> Result<Json<BlockResponse>, ApiError> {
    let block = state.timed(Call::GetBlock, |game| Ok(game.get_block(BlockPos::new(x, y, z))))?;
    Ok(Json(BlockResponse { block_type: block.raw() }))
}

pub async fn get_blocks(
    State(state): State<Arc<AppState>>,
    Path((x, y, z, count)): Path<(i64, i64, i64, usize)>,
) -> Result<Json<BlocksResponse>, ApiError> {
    // Up to a full query of generator calls fanned out on rayon: keep it off
    // the async workers.
    let task_state = Arc::clone(&state);
    let blocks = tokio::task::spawn_blocking(move || {
        task_state.timed(Call::GetBlocks, |game| {
            game.get_blocks(BlockPos::new(x, y, z), count)
        })
    })
    .await
    .map_err(|e| {
        tracing::error!("get_blocks task failed: {}", e);
        ApiError::Internal("get_blocks did not complete".into())
    })??;
    Ok(Json(BlocksResponse {
        block_states: blocks.into_iter().map(BlockType::raw).collect(),
    }))
}

pub async fn generate_block(
    State(state): State<Arc<AppState>>,
    Path((x, y, z)): Coords,
) -> Result<Json<BlockResponse>, ApiError> {
    let block = state.timed(Call::GenerateBlock, |game| {
        Ok(game.generate_block(BlockPos::new(x, y, z)))
    })?;
    Ok(Json(BlockResponse { block_type: block.raw() }))
}

pub async fn mine_block(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MineRequest>,
) -> Result<Json<BlockResponse>, ApiError> {
    let pos = BlockPos::new(req.x, req.y, req.z);
    let event = state.timed(Call::MineBlock, |game| game.mine(player_id(req.player), pos))?;
    let block = event.block();
    state.publish(event);
    Ok(Json(BlockResponse { block_type: block.raw() }))
}

pub async fn place_block(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlaceRequest>,
) -> Result<Json<Empty>, ApiError> {
    let pos = BlockPos::new(req.x, req.y, req.z);
    let event = state.timed(Call::PlaceBlock, |game| {
        game.place(player_id(req.player), pos, block_type(req.block_type)?)
    })?;
    state.publish(event);
    Ok(Json(Empty {}))
}

pub async fn read_state(
    State(state): State<Arc<AppState>>,
    Path((x, y, z)): Coords,
) -> Result<Json<StateResponse>, ApiError> {
    let block = state.timed(Call::ReadState, |game| Ok(game.read_state(BlockPos::new(x, y, z))))?;
    Ok(Json(StateResponse { block_state: block.raw() }))
}

pub async fn write_state(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WriteStateRequest>,
) -> Result<Json<Empty>, ApiError> {
    let pos = BlockPos::new(req.x, req.y, req.z);
    let event = state.timed(Call::WriteState, |game| game.write_state(pos, req.value))?;
    state.publish(event);
    Ok(Json(Empty {}))
}

pub async fn get_block_balance(
    State(state): State<Arc<AppState>>,
    Path((player, raw)): Path<(Uuid, u8)>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.timed(Call::GetBlockBalance, |game| {
        Ok(game.get_block_balance(player_id(player), block_type(raw)?))
    })?;
    Ok(Json(BalanceResponse { balance }))
}

pub async fn get_balances(
    State(state): State<Arc<AppState>>,
    Path(player): Path<Uuid>,
) -> Json<BalancesResponse> {
    let balances = state
        .game
        .ledger()
        .balances_of(player_id(player))
        .into_iter()
        .map(|(block, count)| (block.raw(), count))
        .collect();
    Json(BalancesResponse { balances })
}
