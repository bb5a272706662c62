use std::sync::Arc;

use axum::{
    Router,
    http::Uri,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};

use crate::{
    common::ApiError,
    server::AppState,
    transport::{
        middleware::{add_response_headers, check_auth},
        routes::{info, playback, voice_states},
    },
};

const API_V1: &str = "/v1";

pub fn router(state: Arc<AppState>) -> Router {
    let v1_routes = Router::new()
        .route("/info", get(info::get_info))
        .route("/voice-states", post(voice_states::post_voice_state))
        .route("/guilds/{guild_id}/playback", get(playback::get_playback))
        .layer(middleware::from_fn_with_state(state.clone(), check_auth));

    Router::new()
        .nest(API_V1, v1_routes)
        .route("/version", get(info::get_version))
        .fallback(not_found)
        .layer(middleware::from_fn(add_response_headers))
        .with_state(state)
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    ApiError::not_found(format!("No route for {}", uri.path()), uri.path())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{
        audio::{codec::testing::RawPcmFactory, decode::testing::FakeDecoder},
        common::UserId,
        configs::{Config, VoiceConfig},
        scheduler::{Collaborators, PlaybackScheduler},
        sounds::testing::StaticLookup,
        transport::middleware::API_VERSION_HEADER,
        voice::UdpTransport,
    };

    const PASSWORD: &str = "youshallnotpass";

    fn app() -> (Router, Arc<AppState>) {
        let scheduler = PlaybackScheduler::new(
            Collaborators {
                lookup: Arc::new(StaticLookup::default()),
                decoder: Arc::new(FakeDecoder::default()),
                encoders: Arc::new(RawPcmFactory::default()),
                transport: Arc::new(UdpTransport::new(&VoiceConfig::default())),
            },
            UserId(99),
        );
        let state = Arc::new(AppState {
            config: Config::default(),
            scheduler: Arc::new(scheduler),
        });
        (router(state.clone()), state)
    }

    fn request(method: &str, uri: &str, body: Option<&str>, auth: bool) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if auth {
            builder = builder.header("authorization", PASSWORD);
        }
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn version_needs_no_auth() {
        let (app, _) = app();
        let response = app
            .oneshot(request("GET", "/version", None, false))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[API_VERSION_HEADER], "1");
    }

    #[tokio::test]
    async fn api_routes_need_the_password() {
        let (app, _) = app();
        let response = app
            .clone()
            .oneshot(request("GET", "/v1/guilds/1/playback", None, false))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut wrong = request("GET", "/v1/info", None, false);
        wrong
            .headers_mut()
            .insert("authorization", "nope".parse().unwrap());
        let response = app.oneshot(wrong).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_guild_reports_idle() {
        let (app, _) = app();
        let response = app
            .oneshot(request("GET", "/v1/guilds/42/playback", None, true))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["guildId"], 42);
        assert_eq!(body["connected"], false);
    }

    #[tokio::test]
    async fn malformed_guild_id_is_a_bad_request() {
        let (app, _) = app();
        let response = app
            .oneshot(request("GET", "/v1/guilds/abc/playback", None, true))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["status"], 400);
    }

    #[tokio::test]
    async fn voice_state_is_accepted() {
        let (app, state) = app();
        let body = r#"{
            "guild": {"id": 1, "name": "home"},
            "member": {"id": 2, "name": "alice"},
            "before": null,
            "after": 10
        }"#;
        let response = app
            .oneshot(request("POST", "/v1/voice-states", Some(body), true))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        // alice has no sounds, so the guild stays idle.
        let snapshot = state.scheduler.snapshot(crate::common::GuildId(1)).await;
        assert!(!snapshot.connected);
    }

    #[tokio::test]
    async fn malformed_voice_state_is_rejected() {
        let (app, _) = app();
        let response = app
            .oneshot(request("POST", "/v1/voice-states", Some(r#"{"guild": 1}"#), true))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["error"], "Bad Request");
        assert_eq!(body["path"], "/v1/voice-states");
    }

    #[tokio::test]
    async fn shutting_down_refuses_voice_states() {
        let (app, state) = app();
        state.scheduler.shutdown();
        let body = r#"{"guild":{"id":1,"name":"home"},"member":{"id":2,"name":"a"},"after":10}"#;
        let response = app
            .oneshot(request("POST", "/v1/voice-states", Some(body), true))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (app, _) = app();
        let response = app
            .oneshot(request("GET", "/nowhere", None, true))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["path"], "/nowhere");
    }
}
