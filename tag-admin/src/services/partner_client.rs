use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

use super::api_client::{ApiClient, CallContext};
use super::error::ApiError;
use super::params::{path_segment, sanitize_params};
use crate::dtos::partners::{NewPartnerForm, UpdatePartnerForm};
use crate::models::{
    normalize_partner, AffiliatePartner, PartnerListResponse, PartnerStats, TagListResponse,
};
use crate::normalize::{pick_object, unwrap_data};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerFilters {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

pub struct PartnerClient {
    api: Arc<ApiClient>,
}

/// Partner payloads come bare, under `data`, or under `partner`.
fn partner_from_response(value: Value) -> AffiliatePartner {
    let value = unwrap_data(value);
    let inner = value
        .as_object()
        .and_then(|obj| pick_object(obj, &["partner", "affiliatePartner"]))
        .map(|o| Value::Object(o.clone()));
    normalize_partner(inner.as_ref().unwrap_or(&value))
}

impl PartnerClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn list_partners(
        &self,
        ctx: CallContext<'_>,
        filters: &PartnerFilters,
    ) -> Result<PartnerListResponse, ApiError> {
        let mut filters = filters.clone();
        filters.limit = filters.limit.or(Some(self.api.page_size()));
        let query = sanitize_params(&filters);

        let body = self
            .api
            .get(ctx, "/affiliate-partners", "/affiliate-partners", &query)
            .await?;
        Ok(PartnerListResponse::from_value(body))
    }

    /// Validates the form first; an invalid form never reaches the backend.
    #[tracing::instrument(skip(self, ctx, form), fields(email = %form.email))]
    pub async fn create_partner(
        &self,
        ctx: CallContext<'_>,
        form: &NewPartnerForm,
    ) -> Result<AffiliatePartner, ApiError> {
        form.validate()?;

        let body = self
            .api
            .post(
                ctx,
                "/affiliate-partners",
                "/affiliate-partners",
                &form.payload(),
            )
            .await?;
        let partner = partner_from_response(body);
        tracing::info!(partner_id = ?partner.id, "Affiliate partner created");
        Ok(partner)
    }

    #[tracing::instrument(skip(self, ctx, form))]
    pub async fn update_partner(
        &self,
        ctx: CallContext<'_>,
        partner_id: &str,
        form: &UpdatePartnerForm,
    ) -> Result<AffiliatePartner, ApiError> {
        form.validate()?;
        if form.status.is_some() && form.status().is_none() {
            return Err(ApiError::precondition("Choose a valid partner status"));
        }

        let payload = form.payload();
        if payload.as_object().is_some_and(|o| o.is_empty()) {
            return Err(ApiError::precondition("Nothing to update"));
        }

        let body = self
            .api
            .patch(
                ctx,
                "/affiliate-partners/:id",
                &format!("/affiliate-partners/{}", path_segment(partner_id)?),
                &payload,
            )
            .await?;
        Ok(partner_from_response(body))
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn delete_partner(&self, ctx: CallContext<'_>, partner_id: &str) -> Result<(), ApiError> {
        self.api
            .delete(
                ctx,
                "/affiliate-partners/:id",
                &format!("/affiliate-partners/{}", path_segment(partner_id)?),
            )
            .await?;
        tracing::info!(partner_id = %partner_id, "Affiliate partner deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_partner(
        &self,
        ctx: CallContext<'_>,
        partner_id: &str,
    ) -> Result<AffiliatePartner, ApiError> {
        let body = self
            .api
            .get(
                ctx,
                "/affiliate-partners/:id",
                &format!("/affiliate-partners/{}", path_segment(partner_id)?),
                &[],
            )
            .await?;

        let partner = partner_from_response(body);
        if partner.id.is_none() {
            return Err(ApiError::not_found("Partner not found"));
        }
        Ok(partner)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_partner_stats(
        &self,
        ctx: CallContext<'_>,
        partner_id: &str,
    ) -> Result<PartnerStats, ApiError> {
        let body = self
            .api
            .get(
                ctx,
                "/affiliate-partners/:id/stats",
                &format!("/affiliate-partners/{}/stats", path_segment(partner_id)?),
                &[],
            )
            .await?;
        Ok(PartnerStats::from_value(body))
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_assigned_tags(
        &self,
        ctx: CallContext<'_>,
        partner_id: &str,
        page: Option<u32>,
    ) -> Result<TagListResponse, ApiError> {
        let query = sanitize_params(&PartnerFilters {
            page,
            limit: Some(self.api.page_size()),
            ..PartnerFilters::default()
        });
        let body = self
            .api
            .get(
                ctx,
                "/affiliate-partners/:id/tags",
                &format!("/affiliate-partners/{}/tags", path_segment(partner_id)?),
                &query,
            )
            .await?;
        Ok(TagListResponse::from_value(body))
    }
}
