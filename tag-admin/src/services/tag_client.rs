//! QR tag endpoints: listing, bulk generation, status changes, short-code
//! verification and OTP activation.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use validator::Validate;

use super::api_client::{ApiClient, CallContext};
use super::error::ApiError;
use super::params::{path_segment, sanitize_params};
use crate::dtos::tags::{ConfirmActivationForm, GenerateTagsForm, RequestOtpForm};
use crate::models::{normalize_tag_item, TagItem, TagListResponse, TagStatus, TagVerifyResult};
use crate::normalize::{pick, pick_datetime, pick_object, pick_str, unwrap_data};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagFilters {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub batch_name: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// What the backend answered to an OTP request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpChallenge {
    pub message: Option<String>,
    /// Only present when the backend echoes the code back.
    pub otp: Option<String>,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl OtpChallenge {
    pub fn from_value(value: Value) -> Self {
        // The envelope usually carries the message, `data` the rest.
        let envelope_message = value
            .as_object()
            .and_then(|obj| pick_str(obj, &["message"]));
        let value = unwrap_data(value);
        let empty = Map::new();
        let obj = value.as_object().unwrap_or(&empty);
        Self {
            message: pick_str(obj, &["message"]).or(envelope_message),
            otp: pick_str(obj, &["otp", "code"]),
            expires_at: pick_datetime(obj, &["expiresAt", "expiry"]),
        }
    }
}

pub struct TagClient {
    api: Arc<ApiClient>,
}

impl TagClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Admin tag list. Never fails on malformed bodies: they produce an empty
    /// page with default pagination.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn list_admin_tags(
        &self,
        ctx: CallContext<'_>,
        filters: &TagFilters,
    ) -> Result<TagListResponse, ApiError> {
        let mut filters = filters.clone();
        filters.limit = filters.limit.or(Some(self.api.page_size()));
        let query = sanitize_params(&filters);

        let body = self.api.get(ctx, "/tags/admin", "/tags/admin", &query).await?;
        Ok(TagListResponse::from_value(body))
    }

    #[tracing::instrument(skip(self, ctx, form), fields(count = form.count))]
    pub async fn generate_bulk(
        &self,
        ctx: CallContext<'_>,
        form: &GenerateTagsForm,
    ) -> Result<Vec<TagItem>, ApiError> {
        form.validate()?;

        let mut metadata = Map::new();
        if let Some(note) = form.note.as_deref().filter(|n| !n.trim().is_empty()) {
            metadata.insert("note".to_string(), Value::String(note.trim().to_string()));
        }

        let body = json!({
            "count": form.count,
            "batchName": form.batch_name.as_deref().map(str::trim).filter(|b| !b.is_empty()),
            "metadata": metadata,
        });

        let response = self
            .api
            .post(ctx, "/tags/generate-bulk", "/tags/generate-bulk", &body)
            .await?;
        let created = TagListResponse::from_value(response).tags;
        tracing::info!(created = created.len(), "Generated tags");
        Ok(created)
    }

    /// Moves a tag to `next`, refusing transitions the lifecycle forbids.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn update_status(
        &self,
        ctx: CallContext<'_>,
        tag_id: &str,
        current: TagStatus,
        next: TagStatus,
    ) -> Result<TagItem, ApiError> {
        if current != TagStatus::Unknown && !current.can_transition_to(next) {
            return Err(ApiError::precondition(format!(
                "A {} tag cannot be marked {}",
                current, next
            )));
        }
        if next == TagStatus::Unknown {
            return Err(ApiError::precondition("Choose a valid status"));
        }

        let response = self
            .api
            .patch(
                ctx,
                "/tags/:id/status",
                &format!("/tags/{}/status", path_segment(tag_id)?),
                &json!({ "status": next }),
            )
            .await?;

        let value = unwrap_data(response);
        let item = value
            .as_object()
            .and_then(|obj| pick(obj, &["tag"]))
            .cloned()
            .unwrap_or(value);
        Ok(normalize_tag_item(&item))
    }

    /// Looks a tag up by short code. A response without `_id` means the tag
    /// does not exist.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn verify_tag_by_short_code(
        &self,
        ctx: CallContext<'_>,
        short_code: &str,
    ) -> Result<TagVerifyResult, ApiError> {
        let code = short_code.trim();
        if code.is_empty() {
            return Err(ApiError::precondition("Enter a tag short code"));
        }

        let response = self
            .api
            .get(
                ctx,
                "/tags/verify/:shortCode",
                &format!("/tags/verify/{}", path_segment(code)?),
                &[],
            )
            .await?;

        TagVerifyResult::from_value(response, code)
            .ok_or_else(|| ApiError::not_found("Tag not found"))
    }

    #[tracing::instrument(skip(self, ctx, form))]
    pub async fn request_activation_otp(
        &self,
        ctx: CallContext<'_>,
        short_code: &str,
        form: &RequestOtpForm,
    ) -> Result<OtpChallenge, ApiError> {
        form.validate()?;

        let response = self
            .api
            .post(
                ctx,
                "/tags/activation/request-otp",
                "/tags/activation/request-otp",
                &json!({ "shortCode": short_code.trim(), "phone": form.phone.trim() }),
            )
            .await?;

        let challenge = OtpChallenge::from_value(response);
        if challenge.otp.is_some() {
            tracing::warn!(short_code = %short_code, "Backend echoed the activation OTP in its response");
        }
        Ok(challenge)
    }

    #[tracing::instrument(skip(self, ctx, form))]
    pub async fn confirm_tag_activation(
        &self,
        ctx: CallContext<'_>,
        short_code: &str,
        phone: &str,
        form: &ConfirmActivationForm,
    ) -> Result<TagItem, ApiError> {
        form.validate()?;

        let payload = form.payload(short_code.trim(), phone.trim());
        let response = self
            .api
            .post(
                ctx,
                "/tags/activation/confirm",
                "/tags/activation/confirm",
                &payload,
            )
            .await?;

        let value = unwrap_data(response);
        let item = value
            .as_object()
            .and_then(|obj| pick_object(obj, &["tag"]))
            .map(|o| Value::Object(o.clone()))
            .unwrap_or(value);
        let tag = normalize_tag_item(&item);
        tracing::info!(short_code = %short_code, "Tag activated");
        Ok(tag)
    }
}
