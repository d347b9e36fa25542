//! HTTP-level tests for the player endpoints: tick, tap, purchase, level-up
//! and profile edits.

mod common;

use axum::http::StatusCode;
use classiklust_db::repositories::PlayerUpgradeRepo;
use common::{body_json, get, get_auth, patch_json_auth, post_json_auth};
use serde_json::{json, Value};
use sqlx::PgPool;
use tokio::task::JoinSet;

async fn tap(app: &common::TestApp, token: &str, count: i32) -> Value {
    let response = post_json_auth(app.router(), "/api/player/tap", json!({ "count": count }), token).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn me_requires_a_session(pool: PgPool) {
    let app = common::build_test_app(pool).await;

    let response = get(app.router(), "/api/player/me").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_auth(app.router(), "/api/player/me", "not-a-real-token").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn me_returns_fresh_player_state(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let (player_id, token) = common::dev_login(&app, "newbie").await;

    let response = get_auth(app.router(), "/api/player/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["player"]["id"], player_id);
    assert_eq!(json["player"]["level"], 1);
    assert_eq!(json["player"]["points"], 0);
    assert_eq!(json["player"]["maxEnergy"], 1000);
    assert_eq!(json["upgrades"], json!({}));
    assert!(json.get("result").is_none());
}

// ---------------------------------------------------------------------------
// Tap
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn tap_spends_energy_for_points(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let (_, token) = common::dev_login(&app, "tapper").await;

    let json = tap(&app, &token, 20).await;
    assert_eq!(json["result"]["pointsEarned"], 20);
    assert_eq!(json["result"]["perTap"], 1);
    assert_eq!(json["player"]["points"], 20);
    assert_eq!(json["player"]["energy"], 980);
    assert_eq!(json["player"]["experience"], 20);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn tap_rejects_out_of_range_counts(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let (_, token) = common::dev_login(&app, "greedy").await;

    for count in [0, -5, 201] {
        let response =
            post_json_auth(app.router(), "/api/player/tap", json!({ "count": count }), &token).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "count {count}");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_taps_are_all_applied(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let (_, token) = common::dev_login(&app, "drummer").await;

    let mut tasks = JoinSet::new();
    for _ in 0..10 {
        let router = app.router();
        let token = token.clone();
        tasks.spawn(async move {
            post_json_auth(router, "/api/player/tap", json!({ "count": 10 }), &token)
                .await
                .status()
        });
    }
    while let Some(status) = tasks.join_next().await {
        assert_eq!(status.unwrap(), StatusCode::OK);
    }

    let json = body_json(get_auth(app.router(), "/api/player/me", &token).await).await;
    assert_eq!(json["player"]["points"], 100);
    assert_eq!(json["player"]["experience"], 100);
}

// ---------------------------------------------------------------------------
// Upgrades
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn purchase_requires_the_next_level_exactly(pool: PgPool) {
    let app = common::build_test_app(pool.clone()).await;
    let (player_id, token) = common::dev_login(&app, "shopper").await;
    tap(&app, &token, 20).await;

    let response = post_json_auth(
        app.router(),
        "/api/player/upgrades",
        json!({ "upgradeId": "tap_power", "level": 1 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["result"]["cost"], 10);
    assert_eq!(json["result"]["newLevel"], 1);
    assert_eq!(json["player"]["points"], 10);
    assert_eq!(json["upgrades"]["tap_power"], 1);

    // Skipping a level is refused.
    let response = post_json_auth(
        app.router(),
        "/api/player/upgrades",
        json!({ "upgradeId": "tap_power", "level": 3 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid level increment");

    // The owned level survives in the database.
    let owned = PlayerUpgradeRepo::list_for_player(&pool, player_id).await.unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].upgrade_id, "tap_power");
    assert_eq!(owned[0].level, 1);

    // Each tap is now worth two points.
    let json = tap(&app, &token, 5).await;
    assert_eq!(json["result"]["perTap"], 2);
    assert_eq!(json["player"]["points"], 20);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn purchase_without_enough_points_changes_nothing(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let (_, token) = common::dev_login(&app, "broke").await;
    tap(&app, &token, 5).await;

    let response = post_json_auth(
        app.router(),
        "/api/player/upgrades",
        json!({ "upgradeId": "tap_power", "level": 1 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(get_auth(app.router(), "/api/player/me", &token).await).await;
    assert_eq!(json["player"]["points"], 5);
    assert_eq!(json["upgrades"], json!({}));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn hidden_and_unknown_upgrades_are_not_purchasable(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let (_, token) = common::dev_login(&app, "snoop").await;

    for id in ["secret_boost", "does_not_exist"] {
        let response = post_json_auth(
            app.router(),
            "/api/player/upgrades",
            json!({ "upgradeId": id, "level": 1 }),
            &token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "upgrade {id}");
    }
}

// ---------------------------------------------------------------------------
// Level-up and profile
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn level_up_unlocks_characters_and_stops_at_the_top(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let (_, token) = common::dev_login(&app, "climber").await;

    // Not enough points yet.
    let response = post_json_auth(app.router(), "/api/player/level-up", json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    tap(&app, &token, 60).await;
    let response = post_json_auth(app.router(), "/api/player/level-up", json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["result"]["newLevel"], 2);
    assert_eq!(json["result"]["cost"], 50);
    assert_eq!(json["player"]["level"], 2);
    assert_eq!(json["player"]["points"], 10);
    let unlocked = json["player"]["unlockedCharacters"].as_array().unwrap();
    assert!(unlocked.contains(&json!("luna")));

    // Level 2 is the highest defined level.
    let response = post_json_auth(app.router(), "/api/player/level-up", json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn selecting_a_character_requires_it_unlocked(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let (_, token) = common::dev_login(&app, "picker").await;

    let select = |id: &'static str| json!({ "selectedCharacterId": id });

    let response = patch_json_auth(app.router(), "/api/player/me", select("luna"), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = patch_json_auth(app.router(), "/api/player/me", select("ghost"), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    tap(&app, &token, 60).await;
    post_json_auth(app.router(), "/api/player/level-up", json!({}), &token).await;

    let response = patch_json_auth(app.router(), "/api/player/me", select("luna"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["player"]["selectedCharacterId"], "luna");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn username_edits_are_trimmed_and_bounded(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let (_, token) = common::dev_login(&app, "renamer").await;

    let response =
        patch_json_auth(app.router(), "/api/player/me", json!({ "username": "  Star  " }), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["player"]["username"], "Star");

    let response =
        patch_json_auth(app.router(), "/api/player/me", json!({ "username": "   " }), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let long = "x".repeat(65);
    let response =
        patch_json_auth(app.router(), "/api/player/me", json!({ "username": long }), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn gameplay_writes_a_player_snapshot(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let (_, token) = common::dev_login(&app, "archivist").await;
    tap(&app, &token, 3).await;

    let path = app
        .layout()
        .player_data_dir()
        .join("dev_archivist")
        .join("player.json");
    let snapshot: Value = serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
    assert_eq!(snapshot["player"]["points"], 3);
    assert!(snapshot["savedAt"].is_string());
}
