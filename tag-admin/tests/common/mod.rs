//! Shared helpers for the tag-admin integration tests.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tag_admin::config::{BackendSettings, ServerSettings};
use tag_admin::services::ApiClient;
use tag_admin::startup::build_router;
use tag_admin::AppState;
use tower::util::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ADMIN_TOKEN: &str = "admin-token";

/// Mock backend plus an API client pointed at it.
pub async fn backend() -> (MockServer, Arc<ApiClient>) {
    let server = MockServer::start().await;
    let api = Arc::new(
        ApiClient::new(BackendSettings::new(server.uri())).expect("Failed to build API client"),
    );
    (server, api)
}

pub fn router(api: Arc<ApiClient>) -> Router {
    let server = ServerSettings {
        host: "127.0.0.1".to_string(),
        port: 0,
        secure_cookies: false,
        static_dir: "static".to_string(),
    };
    build_router(AppState::new(api), &server)
}

pub async fn mock_admin_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "token": ADMIN_TOKEN,
                "user": { "_id": "admin-1", "role": "admin", "name": "Asha Rao" }
            }
        })))
        .mount(server)
        .await;
}

/// Signs in through `/login` and returns the session cookie.
pub async fn sign_in(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("email=admin%40example.com&password=secret123"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_redirection(), "login did not redirect");
    session_cookie(&response).expect("login did not set a session cookie")
}

pub fn session_cookie<B>(response: &Response<B>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .next()
        .map(str::to_string)
}

pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut request = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_form(app: &Router, uri: &str, cookie: &str, body: &str) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::COOKIE, cookie)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}
