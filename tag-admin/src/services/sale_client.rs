use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

use super::api_client::{ApiClient, CallContext};
use super::error::ApiError;
use super::params::{path_segment, sanitize_params};
use crate::dtos::sales::SaleForm;
use crate::models::{normalize_sale, SaleListResponse, TagSale};
use crate::normalize::{pick_object, unwrap_data};

pub const UNVERIFIED_TAG_MESSAGE: &str = "Please verify the tag short code before creating a sale";
pub const MISSING_OWNER_MESSAGE: &str = "Owner is required";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleFilters {
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub verification_status: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

fn sale_from_response(value: Value) -> TagSale {
    let value = unwrap_data(value);
    let inner = value
        .as_object()
        .and_then(|obj| pick_object(obj, &["sale", "tagSale"]))
        .map(|o| Value::Object(o.clone()));
    normalize_sale(inner.as_ref().unwrap_or(&value))
}

/// Guards shared by create and update: both ids must be resolved first.
fn resolved_ids(form: &SaleForm) -> Result<(String, String), ApiError> {
    let tag = form
        .tag
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::precondition(UNVERIFIED_TAG_MESSAGE))?;
    let owner = form
        .owner
        .as_deref()
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .ok_or_else(|| ApiError::precondition(MISSING_OWNER_MESSAGE))?;
    form.validate()?;
    Ok((tag.to_string(), owner.to_string()))
}

pub struct SaleClient {
    api: Arc<ApiClient>,
}

impl SaleClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn list_sales(
        &self,
        ctx: CallContext<'_>,
        filters: &SaleFilters,
    ) -> Result<SaleListResponse, ApiError> {
        let mut filters = filters.clone();
        filters.limit = filters.limit.or(Some(self.api.page_size()));
        let query = sanitize_params(&filters);

        let body = self.api.get(ctx, "/tag-sales", "/tag-sales", &query).await?;
        Ok(SaleListResponse::from_value(body))
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_sale(&self, ctx: CallContext<'_>, sale_id: &str) -> Result<TagSale, ApiError> {
        let body = self
            .api
            .get(
                ctx,
                "/tag-sales/:id",
                &format!("/tag-sales/{}", path_segment(sale_id)?),
                &[],
            )
            .await?;

        let sale = sale_from_response(body);
        if sale.id.is_none() {
            return Err(ApiError::not_found("Sale not found"));
        }
        Ok(sale)
    }

    /// Requires a verified tag id and an owner id; without them nothing is
    /// sent.
    #[tracing::instrument(skip(self, ctx, form), fields(short_code = ?form.short_code))]
    pub async fn create_tag_sale(
        &self,
        ctx: CallContext<'_>,
        form: &SaleForm,
    ) -> Result<TagSale, ApiError> {
        let (tag, owner) = resolved_ids(form)?;

        let body = self
            .api
            .post(ctx, "/tag-sales", "/tag-sales", &form.payload(&tag, &owner))
            .await?;
        let sale = sale_from_response(body);
        tracing::info!(sale_id = ?sale.id, tag_id = %tag, "Tag sale created");
        Ok(sale)
    }

    #[tracing::instrument(skip(self, ctx, form))]
    pub async fn update_tag_sale(
        &self,
        ctx: CallContext<'_>,
        sale_id: &str,
        form: &SaleForm,
    ) -> Result<TagSale, ApiError> {
        let (tag, owner) = resolved_ids(form)?;

        let body = self
            .api
            .patch(
                ctx,
                "/tag-sales/:id",
                &format!("/tag-sales/{}", path_segment(sale_id)?),
                &form.payload(&tag, &owner),
            )
            .await?;
        Ok(sale_from_response(body))
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn delete_sale(&self, ctx: CallContext<'_>, sale_id: &str) -> Result<(), ApiError> {
        self.api
            .delete(
                ctx,
                "/tag-sales/:id",
                &format!("/tag-sales/{}", path_segment(sale_id)?),
            )
            .await?;
        tracing::info!(sale_id = %sale_id, "Tag sale deleted");
        Ok(())
    }
}
