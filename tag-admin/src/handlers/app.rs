use axum::response::{IntoResponse, Redirect};
use tower_sessions::Session;

use crate::models::user::ACCESS_TOKEN_KEY;

pub async fn index(session: Session) -> impl IntoResponse {
    let access_token: Option<String> = session.get(ACCESS_TOKEN_KEY).await.unwrap_or(None);
    if access_token.is_some() {
        Redirect::to("/dashboard")
    } else {
        Redirect::to("/login")
    }
}

pub async fn health_check() -> &'static str {
    "OK"
}
