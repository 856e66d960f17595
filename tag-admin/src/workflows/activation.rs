//! Two-step OTP activation of a tag: request an OTP for the owner's phone,
//! then confirm it together with the owner and vehicle details.
//!
//! The wizard is plain data so it can live in the session between requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dtos::tags::{ConfirmActivationForm, RequestOtpForm};
use crate::models::TagItem;
use crate::services::tag_client::{OtpChallenge, TagClient};
use crate::services::{ApiError, CallContext};

pub const SESSION_KEY: &str = "activation_wizard";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationStep {
    #[default]
    RequestOtp,
    ConfirmActivation,
}

impl ActivationStep {
    pub fn index(&self) -> usize {
        match self {
            ActivationStep::RequestOtp => 0,
            ActivationStep::ConfirmActivation => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationWizard {
    pub short_code: String,
    pub step: ActivationStep,
    pub phone: Option<String>,
    /// Set only when the backend echoed the OTP back.
    pub otp_prefill: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub message: Option<String>,
}

impl ActivationWizard {
    pub fn new(short_code: impl Into<String>) -> Self {
        Self {
            short_code: short_code.into().trim().to_string(),
            step: ActivationStep::RequestOtp,
            phone: None,
            otp_prefill: None,
            expires_at: None,
            message: None,
        }
    }

    /// Step 0 -> 1 once the backend accepted the OTP request.
    pub fn otp_requested(&mut self, phone: &str, challenge: OtpChallenge) {
        self.phone = Some(phone.trim().to_string());
        self.otp_prefill = challenge.otp;
        self.expires_at = challenge.expires_at;
        self.message = challenge.message;
        self.step = ActivationStep::ConfirmActivation;
    }

    /// Back to step 0. The phone stays so it can be edited.
    pub fn back(&mut self) {
        self.step = ActivationStep::RequestOtp;
        self.otp_prefill = None;
        self.expires_at = None;
        self.message = None;
    }

    pub fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.short_code));
    }

    /// Form for step 1, with the echoed OTP filled in when there is one.
    pub fn confirm_form(&self) -> ConfirmActivationForm {
        ConfirmActivationForm {
            otp: self.otp_prefill.clone().unwrap_or_default(),
            ..ConfirmActivationForm::default()
        }
    }

    /// Runs step 0. On failure the wizard is left unchanged.
    pub async fn request_otp(
        &mut self,
        client: &TagClient,
        ctx: CallContext<'_>,
        form: &RequestOtpForm,
    ) -> Result<(), ApiError> {
        let challenge = client
            .request_activation_otp(ctx, &self.short_code, form)
            .await?;
        self.otp_requested(&form.phone, challenge);
        Ok(())
    }

    /// Runs step 1. On success the wizard resets; on failure it stays on
    /// step 1 with the phone kept.
    pub async fn confirm(
        &mut self,
        client: &TagClient,
        ctx: CallContext<'_>,
        form: &ConfirmActivationForm,
    ) -> Result<TagItem, ApiError> {
        let phone = match (self.step, self.phone.as_deref()) {
            (ActivationStep::ConfirmActivation, Some(phone)) => phone.to_string(),
            _ => return Err(ApiError::precondition("Request an OTP first")),
        };

        let tag = client
            .confirm_tag_activation(ctx, &self.short_code, &phone, form)
            .await?;
        self.reset();
        Ok(tag)
    }
}
