use askama::Template;
use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use service_core::middleware::RequestId;
use tower_sessions::Session;

use super::toast::flash_success;
use crate::dtos::auth::LoginRequest;
use crate::models::user::{ACCESS_TOKEN_KEY, EMAIL_KEY, NAME_KEY, ROLE_KEY, USER_ID_KEY};
use crate::services::auth_client::LoginSession;
use crate::services::{ApiError, CallContext};
use crate::AppState;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub error: Option<String>,
}

pub async fn login_page(session: Session) -> Response {
    let access_token: Option<String> = session.get(ACCESS_TOKEN_KEY).await.unwrap_or(None);
    if access_token.is_some() {
        return Redirect::to("/dashboard").into_response();
    }

    LoginTemplate {
        email: String::new(),
        error: None,
    }
    .into_response()
}

async fn store_login(session: &Session, login: &LoginSession) -> Result<(), tower_sessions::session::Error> {
    // New id on privilege change.
    session.cycle_id().await?;
    session.insert(ACCESS_TOKEN_KEY, &login.access_token).await?;
    session.insert(USER_ID_KEY, &login.user_id).await?;
    session.insert(ROLE_KEY, login.role).await?;
    if let Some(name) = &login.name {
        session.insert(NAME_KEY, name).await?;
    }
    if let Some(email) = &login.email {
        session.insert(EMAIL_KEY, email).await?;
    }
    Ok(())
}

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    request_id: Option<Extension<RequestId>>,
    form: Result<Form<LoginRequest>, FormRejection>,
) -> Response {
    let Ok(Form(payload)) = form else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            LoginTemplate {
                email: String::new(),
                error: Some("Enter your email and password".to_string()),
            },
        )
            .into_response();
    };

    let request_id = request_id.map(|Extension(id)| id.0);
    let ctx = CallContext::new(None, request_id.as_deref());

    match state.auth_client.login(ctx, &payload).await {
        Ok(login) => {
            if let Err(e) = store_login(&session, &login).await {
                tracing::error!(error = %e, "Failed to store login in session");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    LoginTemplate {
                        email: payload.email.clone(),
                        error: Some("Authentication error".to_string()),
                    },
                )
                    .into_response();
            }

            flash_success(&session, "Signed in").await;
            Redirect::to("/dashboard").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            let message = match e {
                ApiError::Unauthorized => "Invalid email or password".to_string(),
                other => other.user_message(),
            };
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                LoginTemplate {
                    email: payload.email.clone(),
                    error: Some(message),
                },
            )
                .into_response()
        }
    }
}

pub async fn logout_handler(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let user_id: Option<String> = session.get(USER_ID_KEY).await.unwrap_or(None);
    if let Some(user_id) = user_id {
        state.verifications.forget(&user_id);
    }
    session.clear().await;
    Redirect::to("/login")
}
