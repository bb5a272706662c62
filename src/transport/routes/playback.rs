use std::sync::Arc;

use axum::{
    extract::{Path, State, rejection::PathRejection},
    response::{IntoResponse, Json, Response},
};

use crate::{
    common::{ApiError, GuildId},
    server::AppState,
};

/// GET /v1/guilds/{guildId}/playback
pub async fn get_playback(
    path: Result<Path<GuildId>, PathRejection>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Path(guild_id) = match path {
        Ok(path) => path,
        Err(e) => {
            return ApiError::bad_request(e.body_text(), "/v1/guilds/{guildId}/playback")
                .into_response();
        }
    };
    tracing::debug!("GET /v1/guilds/{}/playback", guild_id);
    Json(state.scheduler.snapshot(guild_id).await).into_response()
}
