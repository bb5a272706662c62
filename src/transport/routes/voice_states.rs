use std::sync::Arc;

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::{common::ApiError, scheduler::VoiceStateUpdate, server::AppState};

const PATH: &str = "/v1/voice-states";

/// POST /v1/voice-states
pub async fn post_voice_state(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VoiceStateUpdate>, JsonRejection>,
) -> Response {
    let Json(update) = match payload {
        Ok(payload) => payload,
        Err(e) => return ApiError::bad_request(e.body_text(), PATH).into_response(),
    };
    if !state.scheduler.is_running() {
        return ApiError::unavailable("scheduler is shutting down", PATH).into_response();
    }

    tracing::debug!(
        "POST {}: {} in guild {}: {:?} -> {:?}",
        PATH,
        update.member.name,
        update.guild.id,
        update.before,
        update.after
    );
    state.scheduler.handle_voice_state(update);
    StatusCode::NO_CONTENT.into_response()
}
