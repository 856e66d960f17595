use askama::Template;
use axum::{
    extract::{rejection::FormRejection, Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};

use super::{rejected_form_error, Chrome, Page, SelectOption};
use crate::dtos::tags::{ConfirmActivationForm, RequestOtpForm};
use crate::utils::format;
use crate::workflows::activation::{ActivationWizard, SESSION_KEY};
use crate::AppState;

#[derive(Template)]
#[template(path = "pages/activation.html")]
pub struct ActivationTemplate {
    pub chrome: Chrome,
    pub short_code: String,
    pub step: usize,
    pub phone: String,
    pub message: String,
    pub expires_at: String,
    pub form: ConfirmActivationForm,
    pub vehicle_types: Vec<SelectOption>,
}

const VEHICLE_TYPES: [&str; 5] = ["car", "bike", "scooter", "truck", "other"];

fn wizard_url(short_code: &str) -> String {
    format!("/tags/{}/activate", urlencoding::encode(short_code))
}

/// Wizard for `short_code` from the session, or a fresh one.
async fn load_wizard(page: &Page, short_code: &str) -> ActivationWizard {
    let stored: Option<ActivationWizard> = page.session.get(SESSION_KEY).await.unwrap_or(None);
    stored
        .filter(|w| w.short_code == short_code.trim())
        .unwrap_or_else(|| ActivationWizard::new(short_code))
}

async fn save_wizard(page: &Page, wizard: &ActivationWizard) {
    if let Err(e) = page.session.insert(SESSION_KEY, wizard).await {
        tracing::error!(error = %e, "Failed to store activation wizard");
    }
}

async fn clear_wizard(page: &Page) {
    if let Err(e) = page.session.remove_value(SESSION_KEY).await {
        tracing::warn!(error = %e, "Failed to clear activation wizard");
    }
}

async fn render(
    page: &Page,
    wizard: ActivationWizard,
    form: ConfirmActivationForm,
) -> ActivationTemplate {
    ActivationTemplate {
        chrome: page.chrome("tags").await,
        step: wizard.step.index(),
        phone: wizard.phone.clone().unwrap_or_default(),
        message: wizard.message.clone().unwrap_or_default(),
        expires_at: wizard
            .expires_at
            .map(|dt| format::date_time(Some(dt)))
            .unwrap_or_default(),
        vehicle_types: SelectOption::list(
            VEHICLE_TYPES,
            Some(form.vehicle_type.as_str()).filter(|v| !v.is_empty()),
        ),
        form,
        short_code: wizard.short_code,
    }
}

pub async fn activation_page(Path(short_code): Path<String>, page: Page) -> impl IntoResponse {
    let wizard = load_wizard(&page, &short_code).await;
    let form = wizard.confirm_form();
    render(&page, wizard, form).await
}

pub async fn request_otp(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
    page: Page,
    form: Result<Form<RequestOtpForm>, FormRejection>,
) -> impl IntoResponse {
    let mut wizard = load_wizard(&page, &short_code).await;

    let result = match form {
        Ok(Form(form)) => {
            wizard
                .request_otp(&state.tag_client, page.call(), &form)
                .await
        }
        Err(rejection) => Err(rejected_form_error(rejection)),
    };

    match result {
        Ok(()) => {
            let message = wizard
                .message
                .clone()
                .unwrap_or_else(|| "OTP sent to the owner's phone".to_string());
            save_wizard(&page, &wizard).await;
            page.info(message).await;
        }
        Err(e) => page.failure(&e).await,
    }
    Redirect::to(&wizard_url(&wizard.short_code))
}

pub async fn confirm_activation(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
    page: Page,
    form: Result<Form<ConfirmActivationForm>, FormRejection>,
) -> Response {
    let mut wizard = load_wizard(&page, &short_code).await;

    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            page.failure(&rejected_form_error(rejection)).await;
            return Redirect::to(&wizard_url(&wizard.short_code)).into_response();
        }
    };

    match wizard.confirm(&state.tag_client, page.call(), &form).await {
        Ok(tag) => {
            clear_wizard(&page).await;
            page.success(format!(
                "Tag {} activated",
                tag.short_code.as_deref().unwrap_or(&wizard.short_code)
            ))
            .await;
            Redirect::to("/tags").into_response()
        }
        // Stay on the confirm step with everything the operator typed.
        Err(e) => {
            save_wizard(&page, &wizard).await;
            page.failure(&e).await;
            render(&page, wizard, form).await.into_response()
        }
    }
}

pub async fn back(Path(short_code): Path<String>, page: Page) -> impl IntoResponse {
    let mut wizard = load_wizard(&page, &short_code).await;
    wizard.back();
    save_wizard(&page, &wizard).await;
    Redirect::to(&wizard_url(&wizard.short_code))
}

pub async fn cancel(page: Page) -> impl IntoResponse {
    clear_wizard(&page).await;
    Redirect::to("/tags")
}
