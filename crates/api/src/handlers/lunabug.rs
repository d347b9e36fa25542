//! Handlers for `/lunabug`: the AI debugging assistant proxy.
//!
//! These endpoints never fail because a provider is down; the local
//! responder answers instead.

use axum::extract::State;
use axum::Json;
use classiklust_core::error::CoreError;
use classiklust_lunabug::{LunaBugRequest, LunaBugResponse, Mode, ProviderStatus};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LunaBugStatus {
    pub providers: Vec<ProviderStatus>,
    pub fallback_available: bool,
}

/// POST /api/lunabug/ai
pub async fn ai(
    State(state): State<AppState>,
    Json(request): Json<LunaBugRequest>,
) -> AppResult<Json<DataResponse<LunaBugResponse>>> {
    ask(&state, Mode::Ai, request).await
}

/// POST /api/lunabug/debug
pub async fn debug(
    State(state): State<AppState>,
    Json(request): Json<LunaBugRequest>,
) -> AppResult<Json<DataResponse<LunaBugResponse>>> {
    ask(&state, Mode::Debug, request).await
}

/// POST /api/lunabug/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<LunaBugRequest>,
) -> AppResult<Json<DataResponse<LunaBugResponse>>> {
    ask(&state, Mode::Chat, request).await
}

/// GET /api/lunabug/status
pub async fn status(State(state): State<AppState>) -> Json<DataResponse<LunaBugStatus>> {
    Json(DataResponse {
        data: LunaBugStatus {
            providers: state.lunabug.status(),
            fallback_available: true,
        },
    })
}

async fn ask(
    state: &AppState,
    mode: Mode,
    request: LunaBugRequest,
) -> AppResult<Json<DataResponse<LunaBugResponse>>> {
    if request.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Either message or error is required".into(),
        )));
    }
    let response = state.lunabug.respond(mode, &request).await;
    Ok(Json(DataResponse { data: response }))
}
