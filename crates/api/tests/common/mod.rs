#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

use classiklust_api::config::{AppEnv, ServerConfig};
use classiklust_api::middleware::rbac::ADMIN_TOKEN_HEADER;
use classiklust_api::router::build_app_router;
use classiklust_api::state::AppState;
use classiklust_core::catalog::EntityKind;
use classiklust_gamedata::snapshot::PlayerSnapshotWriter;
use classiklust_gamedata::{DataLayout, GameData, PgCatalogStore};
use classiklust_lunabug::{CircuitBreakerConfig, LunaBug};

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const BOT_TOKEN: &str = "424242:TEST-BOT-TOKEN";

/// Build a test `ServerConfig` with safe defaults rooted at the given
/// directories.
pub fn test_config(game_data_dir: PathBuf, uploads_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        app_env: AppEnv::Development,
        game_data_dir,
        uploads_dir,
        telegram_bot_token: Some(BOT_TOKEN.to_string()),
        telegram_auth_max_age_secs: 24 * 60 * 60,
        admin_token: Some(ADMIN_TOKEN.to_string()),
        session_ttl_days: 30,
    }
}

/// A running application plus the temp directories backing it.
pub struct TestApp {
    pub state: AppState,
    router: Router,
    pub game_data_dir: TempDir,
    pub uploads_dir: TempDir,
}

impl TestApp {
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::new(self.game_data_dir.path())
    }
}

/// Build the full application with a seeded game-data directory, after
/// running the startup sync against `pool`.
///
/// LunaBug has no remote providers, so every answer comes from the local
/// responder.
pub async fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with(pool, |_| {}).await
}

/// Like [`build_test_app`] but lets the caller adjust the configuration.
pub async fn build_test_app_with(pool: PgPool, adjust: impl FnOnce(&mut ServerConfig)) -> TestApp {
    let game_data_dir = TempDir::new().expect("temp game-data dir");
    let uploads_dir = TempDir::new().expect("temp uploads dir");
    seed_master_files(game_data_dir.path());

    let mut config = test_config(
        game_data_dir.path().to_path_buf(),
        uploads_dir.path().to_path_buf(),
    );
    adjust(&mut config);

    let layout = DataLayout::new(game_data_dir.path());
    let game_data = Arc::new(GameData::new(layout.clone(), PgCatalogStore::new(pool.clone())));
    let report = game_data.sync_all().await;
    assert!(!report.has_errors(), "seed sync failed: {report:?}");

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        game_data,
        snapshots: Arc::new(PlayerSnapshotWriter::new(&layout)),
        lunabug: Arc::new(LunaBug::new(Vec::new(), CircuitBreakerConfig::default())),
    };
    let router = build_app_router(state.clone(), &config);

    TestApp {
        state,
        router,
        game_data_dir,
        uploads_dir,
    }
}

/// Small catalog shared by every API test.
///
/// - `tap_power`: perTap, cost 10 x 1.5^level, +1 per tap per level
/// - `secret_boost`: hidden
/// - characters `aria` (level 1) and `luna` (level 2)
/// - level 2 costs 50 and unlocks `luna`
pub fn seed_master_files(root: &std::path::Path) {
    let master = root.join("master-data");
    std::fs::create_dir_all(&master).expect("create master-data");

    let upgrades = json!({
        "upgrades": [
            {
                "id": "tap_power", "name": "Tap Power", "type": "perTap",
                "maxLevel": 10, "baseCost": 10, "costMultiplier": 1.5,
                "baseValue": 1.0, "valueIncrement": 1.0
            },
            {
                "id": "secret_boost", "name": "Secret Boost", "type": "perHour",
                "maxLevel": 5, "baseCost": 100, "costMultiplier": 2.0,
                "baseValue": 50.0, "valueIncrement": 50.0, "isHidden": true
            }
        ]
    });
    let characters = json!({
        "characters": [
            { "id": "aria", "name": "Aria", "unlockLevel": 1, "rarity": "Common" },
            { "id": "luna", "name": "Luna", "unlockLevel": 2, "rarity": "Rare" }
        ]
    });
    let levels = json!({
        "levels": [
            { "level": 1, "cost": 0 },
            { "level": 2, "cost": 50, "unlocks": ["luna"] }
        ]
    });

    for (kind, doc) in [
        (EntityKind::Upgrades, upgrades),
        (EntityKind::Characters, characters),
        (EntityKind::Levels, levels),
    ] {
        let path = master.join(format!("{}-master.json", kind.as_str()));
        std::fs::write(path, serde_json::to_vec_pretty(&doc).expect("serialize seed"))
            .expect("write seed file");
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("request should complete")
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request");
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("valid request");
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, None, &body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response<Body> {
    send(app, json_request(Method::POST, uri, Some(token), &body)).await
}

pub async fn patch_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response<Body> {
    send(app, json_request(Method::PATCH, uri, Some(token), &body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("valid request");
    send(app, request).await
}

/// Send a request authenticated with the shared admin token.
pub async fn admin_request(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(ADMIN_TOKEN_HEADER, ADMIN_TOKEN);
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("valid request");
    send(app, request).await
}

/// Send a prebuilt request.
pub async fn request(app: Router, request: Request<Body>) -> Response<Body> {
    send(app, request).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

/// Dev-login `username` and return `(player_id, session_token)`.
pub async fn dev_login(app: &TestApp, username: &str) -> (i64, String) {
    let response = post_json(app.router(), "/api/auth/dev", json!({ "username": username })).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let json = body_json(response).await;
    let id = json["player"]["id"].as_i64().expect("player id");
    let token = json["sessionToken"].as_str().expect("session token").to_string();
    (id, token)
}
