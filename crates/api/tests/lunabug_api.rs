//! HTTP-level tests for the LunaBug proxy. The test app has no remote
//! providers configured, so every answer comes from the local responder.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, post_json};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn debug_mode_falls_back_to_local_analysis(pool: PgPool) {
    let app = common::build_test_app(pool).await;

    let body = json!({
        "message": "The tap button stopped working",
        "error": "TypeError: Cannot read properties of undefined (reading 'energy')",
        "stack": "at TapButton (TapButton.tsx:42)"
    });
    let response = post_json(app.router(), "/api/lunabug/debug", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["provider"], "local");
    assert_eq!(json["data"]["fallback"], true);
    assert_eq!(json["data"]["mode"], "debug");
    assert!(!json["data"]["response"].as_str().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn chat_and_ai_modes_answer(pool: PgPool) {
    let app = common::build_test_app(pool).await;

    for (path, mode) in [("/api/lunabug/chat", "chat"), ("/api/lunabug/ai", "ai")] {
        let body = json!({
            "message": "hello",
            "history": [{ "role": "user", "content": "hi" }, { "role": "assistant", "content": "hey" }]
        });
        let response = post_json(app.router(), path, body).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["mode"], mode);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_requests_are_rejected(pool: PgPool) {
    let app = common::build_test_app(pool).await;

    let response = post_json(app.router(), "/api/lunabug/ai", json!({ "message": "   " })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn status_lists_providers_and_fallback(pool: PgPool) {
    let app = common::build_test_app(pool).await;

    let response = get(app.router(), "/api/lunabug/status").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["providers"], json!([]));
    assert_eq!(json["data"]["fallbackAvailable"], true);
}
