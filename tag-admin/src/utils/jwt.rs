use anyhow::Result;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;

/// Claims the dashboard reads from the backend's access token. The backend
/// has used several id keys over time, so all of them are optional.
#[derive(Debug, Deserialize)]
pub struct JwtClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "_id")]
    pub object_id: Option<String>,
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl JwtClaims {
    pub fn subject(&self) -> Option<&str> {
        self.id
            .as_deref()
            .or(self.object_id.as_deref())
            .or(self.user_id.as_deref())
            .or(self.sub.as_deref())
    }
}

/// Decode JWT claims without validation.
///
/// The token was just issued to us by the backend over TLS and is only used
/// to recover the user's id and role for the session; the backend validates
/// it on every call.
pub fn decode_jwt_claims(token: &str) -> Result<JwtClaims> {
    let parts: Vec<&str> = token.split('.').collect();

    if parts.len() != 3 {
        return Err(anyhow::anyhow!("Invalid JWT format"));
    }

    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .map_err(|e| anyhow::anyhow!("Failed to decode JWT payload: {}", e))?;

    let claims: JwtClaims = serde_json::from_slice(&payload)
        .map_err(|e| anyhow::anyhow!("Failed to parse JWT claims: {}", e))?;

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(payload: &str) -> String {
        format!(
            "eyJhbGciOiJIUzI1NiJ9.{}.signature",
            general_purpose::URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_decode_jwt_claims() {
        let claims =
            decode_jwt_claims(&token(r#"{"id":"u42","role":"admin","exp":9999999999}"#)).unwrap();
        assert_eq!(claims.subject(), Some("u42"));
        assert_eq!(claims.role.as_deref(), Some("admin"));
    }

    #[test]
    fn falls_back_to_sub() {
        let claims = decode_jwt_claims(&token(r#"{"sub":"u7"}"#)).unwrap();
        assert_eq!(claims.subject(), Some("u7"));
        assert!(claims.role.is_none());
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(decode_jwt_claims("not-a-jwt").is_err());
        assert!(decode_jwt_claims("a.%%%.c").is_err());
    }
}
