//! HTTP handler tests: handlers are called directly with their extractors.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tokio::sync::broadcast;
use uuid::Uuid;

use terraforge_engine::game::{Game, MAX_BLOCKS_PER_QUERY};
use terraforge_engine::world::block::BlockType;
use terraforge_engine::world::position::BlockPos;
use terraforge_server::api::{self, AppState, MineRequest, PlaceRequest, WriteStateRequest};
use terraforge_server::event_bus::{ChangeSource, WorldChangeBatch};

const ALICE: Uuid = Uuid::from_u128(0xa11ce);

fn app() -> (Arc<AppState>, broadcast::Receiver<WorldChangeBatch>) {
    let (tx, rx) = broadcast::channel(16);
    (Arc::new(AppState::new(Game::with_seed(11), tx)), rx)
}

fn surface(state: &AppState, x: i64, y: i64) -> BlockPos {
    BlockPos::new(x, y, state.game.generator().surface_height(x, y))
}

fn mine_req(pos: BlockPos) -> Json<MineRequest> {
    Json(MineRequest {
        player: ALICE,
        x: pos.x,
        y: pos.y,
        z: pos.z,
    })
}

fn place_req(pos: BlockPos, block: BlockType) -> Json<PlaceRequest> {
    Json(PlaceRequest {
        player: ALICE,
        x: pos.x,
        y: pos.y,
        z: pos.z,
        block_type: block.raw(),
    })
}

fn status<T: IntoResponse>(result: Result<T, api::ApiError>) -> StatusCode {
    match result {
        Ok(r) => r.into_response().status(),
        Err(e) => e.into_response().status(),
    }
}

#[tokio::test]
async fn get_block_returns_generated_terrain() {
    let (state, _rx) = app();
    let top = surface(&state, 3, -4);

    let Json(resp) = api::get_block(State(state.clone()), Path((top.x, top.y, top.z)))
        .await
        .unwrap();
    assert_eq!(resp.block_type, BlockType::Grass.raw());

    let Json(resp) = api::read_state(State(state.clone()), Path((top.x, top.y, top.z)))
        .await
        .unwrap();
    assert_eq!(resp.block_state, BlockType::Uninitialized.raw());
}

#[tokio::test]
async fn get_blocks_matches_single_reads() {
    let (state, _rx) = app();
    let base = surface(&state, 0, 0).offset(0, 0, -8);

    let Json(resp) = api::get_blocks(State(state.clone()), Path((base.x, base.y, base.z, 16)))
        .await
        .unwrap();
    assert_eq!(resp.block_states.len(), 16);
    for (i, raw) in resp.block_states.iter().enumerate() {
        let pos = base.offset(0, 0, i as i64);
        assert_eq!(*raw, state.game.get_block(pos).raw());
    }

    let too_many = api::get_blocks(
        State(state.clone()),
        Path((0, 0, 0, MAX_BLOCKS_PER_QUERY + 1)),
    )
    .await;
    assert_eq!(status(too_many), StatusCode::BAD_REQUEST);
    let past_top = api::get_blocks(State(state.clone()), Path((0, 0, i64::MAX, 2))).await;
    assert_eq!(status(past_top), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn extreme_coordinates_are_served() {
    let (state, _rx) = app();
    for v in [i64::MIN, i64::MAX] {
        let block = api::get_block(State(state.clone()), Path((v, v, v))).await;
        assert_eq!(status(block), StatusCode::OK);
        let generated = api::generate_block(State(state.clone()), Path((v, -1, v))).await;
        assert_eq!(status(generated), StatusCode::OK);
    }
    let column = api::get_blocks(State(state.clone()), Path((i64::MIN, 0, i64::MAX - 3, 4))).await;
    assert_eq!(status(column), StatusCode::OK);
}

#[tokio::test]
async fn mine_then_place_round_trip() {
    let (state, mut rx) = app();
    let top = surface(&state, 5, 5);

    let Json(mined) = api::mine_block(State(state.clone()), mine_req(top))
        .await
        .unwrap();
    assert_eq!(mined.block_type, BlockType::Grass.raw());

    let Json(balance) = api::get_block_balance(
        State(state.clone()),
        Path((ALICE, BlockType::Grass.raw())),
    )
    .await
    .unwrap();
    assert_eq!(balance.balance, 1);

    let batch = rx.try_recv().expect("mining publishes a change");
    assert_eq!(batch.source, ChangeSource::Player(api_player(ALICE)));
    assert_eq!(&*batch.changes, &[(top, BlockType::Air)]);

    // Mining the same voxel again has nothing to take.
    let again = api::mine_block(State(state.clone()), mine_req(top)).await;
    assert_eq!(status(again), StatusCode::CONFLICT);

    let placed = api::place_block(State(state.clone()), place_req(top, BlockType::Grass)).await;
    assert_eq!(status(placed), StatusCode::OK);
    assert_eq!(state.game.get_block(top), BlockType::Grass);

    let Json(balances) = api::get_balances(State(state.clone()), Path(ALICE)).await;
    assert!(balances.balances.is_empty());

    let batch = rx.try_recv().expect("placing publishes a change");
    assert_eq!(&*batch.changes, &[(top, BlockType::Grass)]);
}

#[tokio::test]
async fn placement_errors_map_to_statuses() {
    let (state, mut rx) = app();
    let top = surface(&state, -2, 9);
    let sky = top.offset(0, 0, 10);

    // Occupied target.
    let blocked = api::place_block(State(state.clone()), place_req(top, BlockType::Stone)).await;
    assert_eq!(status(blocked), StatusCode::CONFLICT);

    // Empty balance.
    let broke = api::place_block(State(state.clone()), place_req(sky, BlockType::Stone)).await;
    assert_eq!(status(broke), StatusCode::UNPROCESSABLE_ENTITY);

    // Air and Uninitialized can't be placed; 9 isn't a block type at all.
    for raw in [BlockType::Air.raw(), BlockType::Uninitialized.raw(), 9] {
        let req = Json(PlaceRequest {
            player: ALICE,
            x: sky.x,
            y: sky.y,
            z: sky.z,
            block_type: raw,
        });
        let invalid = api::place_block(State(state.clone()), req).await;
        assert_eq!(status(invalid), StatusCode::BAD_REQUEST);
    }

    assert!(rx.try_recv().is_err(), "failed calls publish nothing");
    assert_eq!(state.game.read_state(sky), BlockType::Uninitialized);
}

#[tokio::test]
async fn write_state_overrides_terrain() {
    let (state, mut rx) = app();
    let top = surface(&state, 1, 1);

    let ok = api::write_state(
        State(state.clone()),
        Json(WriteStateRequest {
            x: top.x,
            y: top.y,
            z: top.z,
            value: BlockType::Ore.raw(),
        }),
    )
    .await;
    assert_eq!(status(ok), StatusCode::OK);
    assert_eq!(state.game.get_block(top), BlockType::Ore);
    assert_eq!(rx.try_recv().unwrap().source, ChangeSource::Admin);

    let bad = api::write_state(
        State(state.clone()),
        Json(WriteStateRequest {
            x: 0,
            y: 0,
            z: 0,
            value: 8,
        }),
    )
    .await;
    assert_eq!(status(bad), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn calls_are_counted() {
    let (state, _rx) = app();
    let top = surface(&state, 0, 0);

    let _ = api::get_block(State(state.clone()), Path((0, 0, 0))).await;
    let _ = api::mine_block(State(state.clone()), mine_req(top)).await;
    let _ = api::mine_block(State(state.clone()), mine_req(top)).await;
    let _ = api::get_blocks(State(state.clone()), Path((0, 0, 0, 4))).await;
    let bad_type = Json(PlaceRequest {
        player: ALICE,
        x: 0,
        y: 0,
        z: 500,
        block_type: 9,
    });
    let _ = api::place_block(State(state.clone()), bad_type).await;

    let Json(snap) = terraforge_server::dashboard::server::metrics(State(state.clone())).await;
    assert_eq!(snap.calls["get_block"].calls, 1);
    assert_eq!(snap.calls["mine_block"].calls, 2);
    assert_eq!(snap.calls["mine_block"].failures, 1);
    assert_eq!(snap.calls["get_blocks"].calls, 1);
    assert_eq!(snap.calls["place_block"].failures, 1);
    assert_eq!(snap.slots_stored, 1);
}

fn api_player(uuid: Uuid) -> terraforge_engine::game::ledger::PlayerId {
    terraforge_engine::game::ledger::PlayerId(uuid.as_u128())
}
