use axum::response::Json;

use crate::common::banner::BuildInfo;

/// GET /version
pub async fn get_version() -> String {
    tracing::debug!("GET /version");
    env!("CARGO_PKG_VERSION").to_string()
}

/// GET /v1/info
pub async fn get_info() -> Json<BuildInfo> {
    tracing::debug!("GET /v1/info");
    Json(BuildInfo::default())
}
