use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const USER_ID_KEY: &str = "user_id";
pub const ROLE_KEY: &str = "role";
pub const NAME_KEY: &str = "name";
pub const EMAIL_KEY: &str = "email";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Affiliate,
    Staff,
    #[serde(other)]
    Other,
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" | "superadmin" => Role::Admin,
            "affiliate" | "partner" | "affiliate_partner" => Role::Affiliate,
            "staff" | "sales" => Role::Staff,
            _ => Role::Other,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Signed-in operator, as shown in the page header.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|e| e.split('@').next())
                    .map(|s| s.to_string())
            })
            .unwrap_or_else(|| "User".to_string())
    }

    pub fn initials(&self) -> String {
        let initials: String = self
            .display_name()
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .take(2)
            .collect::<String>()
            .to_uppercase();
        if initials.is_empty() {
            "U".to_string()
        } else {
            initials
        }
    }
}

/// Authenticated operator context extracted from the session.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Role,
    pub name: Option<String>,
    pub email: Option<String>,
    pub access_token: String,
}

impl AuthUser {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }

    pub fn token(&self) -> Option<&str> {
        Some(self.access_token.as_str())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to extract session",
                )
                    .into_response()
            })?;

        let access_token: Option<String> = session.get(ACCESS_TOKEN_KEY).await.unwrap_or(None);
        let user_id: Option<String> = session.get(USER_ID_KEY).await.unwrap_or(None);

        match (access_token, user_id) {
            (Some(token), Some(uid)) => {
                let role: Option<String> = session.get(ROLE_KEY).await.unwrap_or(None);
                let name: Option<String> = session.get(NAME_KEY).await.unwrap_or(None);
                let email: Option<String> = session.get(EMAIL_KEY).await.unwrap_or(None);

                Ok(AuthUser {
                    user_id: uid,
                    role: role.map(|r| Role::parse(&r)).unwrap_or(Role::Other),
                    name,
                    email,
                    access_token: token,
                })
            }
            _ => Err(Redirect::to("/login").into_response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initials_from_name_or_email() {
        let p = UserProfile {
            name: Some("Asha Rao".to_string()),
            email: None,
            role: Role::Admin,
        };
        assert_eq!(p.initials(), "AR");

        let p = UserProfile {
            name: None,
            email: Some("ravi@example.com".to_string()),
            role: Role::Staff,
        };
        assert_eq!(p.display_name(), "ravi");
        assert_eq!(p.initials(), "R");
    }

    #[test]
    fn role_parsing() {
        assert!(Role::parse("ADMIN").is_admin());
        assert_eq!(Role::parse("partner"), Role::Affiliate);
        assert_eq!(Role::parse("guest"), Role::Other);
    }
}
