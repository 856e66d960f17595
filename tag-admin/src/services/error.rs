use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised by the backend clients and the workflows built on them.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// A client-side guard refused the call before it reached the network.
    #[error("{0}")]
    Precondition(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Session expired, please sign in again")]
    Unauthorized,

    #[error("Backend returned {status}: {message}")]
    Upstream { status: StatusCode, message: String },

    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    pub fn precondition(message: impl Into<String>) -> Self {
        ApiError::Precondition(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    /// Text shown to the operator in a toast.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(errors) => validation_summary(errors),
            ApiError::Upstream { message, .. } => message.clone(),
            ApiError::Transport(_) => "Could not reach the server, please retry".to_string(),
            ApiError::Config(_) => "The dashboard is misconfigured".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

/// Flattens field errors into "field: message" pairs, sorted by field name.
fn validation_summary(errors: &validator::ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .unwrap_or_else(|| "is invalid".to_string());
            format!("{}: {}", field, message)
        })
        .collect();
    parts.sort();
    if parts.is_empty() {
        "Please correct the highlighted fields".to_string()
    } else {
        parts.join("; ")
    }
}

impl From<ApiError> for service_core::error::AppError {
    fn from(err: ApiError) -> Self {
        use service_core::error::AppError;
        match err {
            ApiError::Validation(errors) => AppError::ValidationError(errors),
            ApiError::Precondition(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ApiError::NotFound(msg) => AppError::NotFound(anyhow::anyhow!(msg)),
            ApiError::Unauthorized => {
                AppError::Unauthorized(anyhow::anyhow!("Session expired, please sign in again"))
            }
            ApiError::Upstream { status, message } if status.is_client_error() => {
                AppError::BadRequest(anyhow::anyhow!(message))
            }
            ApiError::Upstream { message, .. } => AppError::BadGateway(message),
            ApiError::Transport(_) => AppError::ServiceUnavailable,
            ApiError::Config(msg) => AppError::ConfigError(anyhow::anyhow!(msg)),
        }
    }
}
