use secrecy::ExposeSecret;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use super::api_client::{ApiClient, CallContext};
use super::error::ApiError;
use crate::dtos::auth::LoginRequest;
use crate::models::Role;
use crate::normalize::{pick_object, pick_str, unwrap_data};
use crate::utils::jwt::decode_jwt_claims;

/// What the session keeps after a successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginSession {
    pub access_token: String,
    pub user_id: String,
    pub role: Role,
    pub name: Option<String>,
    pub email: Option<String>,
}

pub struct AuthClient {
    api: Arc<ApiClient>,
}

impl AuthClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Signs in against the backend. The user's id and role come from the
    /// response's `user` object, or from the token claims when it is absent.
    #[tracing::instrument(skip(self, ctx, request), fields(email = %request.email))]
    pub async fn login(
        &self,
        ctx: CallContext<'_>,
        request: &LoginRequest,
    ) -> Result<LoginSession, ApiError> {
        request.validate()?;

        let body = self
            .api
            .post(
                ctx,
                "/auth/login",
                "/auth/login",
                &json!({
                    "email": request.email.trim(),
                    "password": request.password.expose_secret(),
                }),
            )
            .await?;

        let value = unwrap_data(body);
        let obj = value
            .as_object()
            .ok_or_else(|| ApiError::precondition("Unexpected login response"))?;

        let access_token = pick_str(obj, &["token", "accessToken", "access_token"])
            .ok_or_else(|| ApiError::precondition("Login response did not include a token"))?;

        let user = pick_object(obj, &["user"]);
        let mut user_id = user.and_then(|u| pick_str(u, &["_id", "id", "userId"]));
        let mut role = user.and_then(|u| pick_str(u, &["role"]));
        let mut name = user.and_then(|u| pick_str(u, &["name", "fullName"]));
        let email = user
            .and_then(|u| pick_str(u, &["email"]))
            .or_else(|| Some(request.email.trim().to_string()));

        if user_id.is_none() || role.is_none() {
            match decode_jwt_claims(&access_token) {
                Ok(claims) => {
                    user_id = user_id.or_else(|| claims.subject().map(str::to_string));
                    role = role.or(claims.role);
                    name = name.or(claims.name);
                }
                Err(e) => tracing::warn!(error = %e, "Could not read claims from access token"),
            }
        }

        let user_id = user_id
            .ok_or_else(|| ApiError::precondition("Login response did not identify the user"))?;

        tracing::info!(user_id = %user_id, "User logged in successfully");

        Ok(LoginSession {
            access_token,
            user_id,
            role: role.as_deref().map(Role::parse).unwrap_or(Role::Other),
            name,
            email,
        })
    }
}
