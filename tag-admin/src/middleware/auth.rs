use axum::{
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::user::ACCESS_TOKEN_KEY;

/// Sends visitors without a session token to the login page. htmx requests
/// get an `HX-Redirect` instead so the whole page navigates, not the fragment.
pub async fn auth_middleware(session: Session, request: Request, next: Next) -> Response {
    let access_token: Option<String> = session.get(ACCESS_TOKEN_KEY).await.unwrap_or(None);

    if access_token.is_none() {
        if request.headers().contains_key("hx-request") {
            let mut response = StatusCode::UNAUTHORIZED.into_response();
            response
                .headers_mut()
                .insert("hx-redirect", HeaderValue::from_static("/login"));
            return response;
        }
        return Redirect::to("/login").into_response();
    }

    let mut response = next.run(request).await;
    // Dashboard pages carry operator data.
    response
        .headers_mut()
        .entry(header::CACHE_CONTROL)
        .or_insert(HeaderValue::from_static("no-store"));
    response
}
