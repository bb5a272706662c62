use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::server::AppState;

pub const API_VERSION_HEADER: &str = "Chimebot-Api-Version";

/// The password from `Authorization`, bare or as a bearer token.
fn presented_password(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    Some(value.strip_prefix("Bearer ").unwrap_or(value))
}

pub async fn check_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    match presented_password(req.headers()) {
        Some(password) if password == state.config.server.password => Ok(next.run(req).await),
        Some(_) => {
            warn!("Rejected {} {}: invalid password", req.method(), req.uri().path());
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            warn!("Rejected {} {}: no Authorization header", req.method(), req.uri().path());
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

pub async fn add_response_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(API_VERSION_HEADER, HeaderValue::from_static("1"));
    response
}
