//! Flash toasts carried across a redirect in the session.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::services::ApiError;

const FLASH_KEY: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

impl ToastKind {
    pub fn css(&self) -> &'static str {
        match self {
            ToastKind::Success => "toast-success",
            ToastKind::Error => "toast-error",
            ToastKind::Info => "toast-info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

pub async fn flash(session: &Session, kind: ToastKind, message: impl Into<String>) {
    let mut pending: Vec<Toast> = session.get(FLASH_KEY).await.unwrap_or(None).unwrap_or_default();
    pending.push(Toast {
        kind,
        message: message.into(),
    });
    if let Err(e) = session.insert(FLASH_KEY, pending).await {
        tracing::error!(error = %e, "Failed to store flash message");
    }
}

pub async fn flash_success(session: &Session, message: impl Into<String>) {
    flash(session, ToastKind::Success, message).await
}

pub async fn flash_info(session: &Session, message: impl Into<String>) {
    flash(session, ToastKind::Info, message).await
}

pub async fn flash_error(session: &Session, err: &ApiError) {
    flash(session, ToastKind::Error, err.user_message()).await
}

/// Returns and clears the pending toasts.
pub async fn take_flashes(session: &Session) -> Vec<Toast> {
    match session.remove::<Vec<Toast>>(FLASH_KEY).await {
        Ok(toasts) => toasts.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read flash messages");
            Vec::new()
        }
    }
}
