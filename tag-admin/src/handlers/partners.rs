use askama::Template;
use axum::{
    extract::{rejection::FormRejection, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use super::tags::TagRow;
use super::{rejected_form_error, Chrome, Page, Pager, SelectOption};
use crate::dtos::partners::{NewPartnerForm, UpdatePartnerForm};
use crate::models::{AffiliatePartner, Pagination, PartnerStatus};
use crate::services::partner_client::PartnerFilters;
use crate::utils::format;
use crate::AppState;

pub struct PartnerRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub commission_rate: String,
    pub status: String,
    pub status_label: String,
    pub cards_activated: u64,
    pub total_sales: u64,
    pub created_at: String,
}

impl PartnerRow {
    fn from_partner(p: &AffiliatePartner) -> Self {
        let status = p.status.map(|s| s.as_str()).unwrap_or("unknown");
        Self {
            id: p.id.clone().unwrap_or_default(),
            name: format::text(p.name.as_deref()),
            email: format::text(p.email.as_deref()),
            phone: format::text(p.phone.as_deref()),
            company: format::text(p.company.as_deref()),
            commission_rate: format::percent(p.commission_rate),
            status: status.to_string(),
            status_label: format::label(status),
            cards_activated: p.stats.cards_activated,
            total_sales: p.stats.total_sales,
            created_at: format::date(p.created_at),
        }
    }
}

/// Values shown in the partner form, kept as entered.
#[derive(Default)]
pub struct PartnerFormValues {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company_name: String,
    pub address: String,
    pub commission_rate: String,
}

impl PartnerFormValues {
    fn from_new(form: &NewPartnerForm) -> Self {
        Self {
            name: form.name.clone(),
            email: form.email.clone(),
            phone: form.phone.clone(),
            company_name: form.company_name.clone().unwrap_or_default(),
            address: form.address.clone().unwrap_or_default(),
            commission_rate: form.commission_rate.to_string(),
        }
    }

    fn from_update(form: &UpdatePartnerForm) -> Self {
        Self {
            name: form.name.clone().unwrap_or_default(),
            email: form.email.clone().unwrap_or_default(),
            phone: form.phone.clone().unwrap_or_default(),
            company_name: form.company_name.clone().unwrap_or_default(),
            address: form.address.clone().unwrap_or_default(),
            commission_rate: form.commission_rate.map(|r| r.to_string()).unwrap_or_default(),
        }
    }

    fn from_partner(p: &AffiliatePartner) -> Self {
        Self {
            name: p.name.clone().unwrap_or_default(),
            email: p.email.clone().unwrap_or_default(),
            phone: p.phone.clone().unwrap_or_default(),
            company_name: p.company.clone().unwrap_or_default(),
            address: p.address.clone().unwrap_or_default(),
            commission_rate: p.commission_rate.map(|r| r.to_string()).unwrap_or_default(),
        }
    }
}

fn partner_url(partner_id: &str) -> String {
    format!("/partners/{}", urlencoding::encode(partner_id))
}

fn status_options(selected: Option<&str>) -> Vec<SelectOption> {
    SelectOption::list(PartnerStatus::ALL.iter().map(|s| s.as_str()), selected)
}

#[derive(Template)]
#[template(path = "pages/partners.html")]
pub struct PartnersTemplate {
    pub chrome: Chrome,
    pub search: String,
    pub status_options: Vec<SelectOption>,
    pub rows: Vec<PartnerRow>,
    pub pager: Pager,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/partner_form.html")]
pub struct PartnerFormTemplate {
    pub chrome: Chrome,
    pub title: String,
    pub action: String,
    pub is_new: bool,
    pub values: PartnerFormValues,
    pub status_options: Vec<SelectOption>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/partner_detail.html")]
pub struct PartnerDetailTemplate {
    pub chrome: Chrome,
    pub partner: PartnerRow,
    pub address: String,
    pub total_revenue: String,
    pub commission_earned: String,
    pub tags: Vec<TagRow>,
    pub pager: Pager,
}

#[derive(Deserialize)]
pub struct AssignedTagsQuery {
    pub page: Option<u32>,
}

pub async fn list_partners(
    State(state): State<AppState>,
    page: Page,
    Query(filters): Query<PartnerFilters>,
) -> impl IntoResponse {
    let (rows, pagination, error) = match state
        .partner_client
        .list_partners(page.call(), &filters)
        .await
    {
        Ok(list) => (
            list.partners.iter().map(PartnerRow::from_partner).collect(),
            list.pagination,
            None,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load partners");
            (Vec::new(), Pagination::default(), Some(e.user_message()))
        }
    };

    PartnersTemplate {
        chrome: page.chrome("partners").await,
        search: filters.search.clone().unwrap_or_default(),
        status_options: status_options(filters.status.as_deref()),
        pager: Pager::new("/partners", &filters, &pagination),
        rows,
        error,
    }
}

pub async fn new_partner_page(page: Page) -> impl IntoResponse {
    PartnerFormTemplate {
        chrome: page.chrome("partners").await,
        title: "New affiliate partner".to_string(),
        action: "/partners".to_string(),
        is_new: true,
        values: PartnerFormValues::default(),
        status_options: Vec::new(),
        error: None,
    }
}

pub async fn create_partner(
    State(state): State<AppState>,
    page: Page,
    form: Result<Form<NewPartnerForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            page.failure(&rejected_form_error(rejection)).await;
            return Redirect::to("/partners/new").into_response();
        }
    };

    match state.partner_client.create_partner(page.call(), &form).await {
        Ok(partner) => {
            page.success(format!(
                "Partner {} created",
                partner.name.as_deref().unwrap_or(form.name.trim())
            ))
            .await;
            Redirect::to("/partners").into_response()
        }
        Err(e) => PartnerFormTemplate {
            chrome: page.chrome("partners").await,
            title: "New affiliate partner".to_string(),
            action: "/partners".to_string(),
            is_new: true,
            values: PartnerFormValues::from_new(&form),
            status_options: Vec::new(),
            error: Some(e.user_message()),
        }
        .into_response(),
    }
}

pub async fn partner_detail(
    State(state): State<AppState>,
    Path(partner_id): Path<String>,
    page: Page,
    Query(query): Query<AssignedTagsQuery>,
) -> Response {
    let partner = match state.partner_client.get_partner(page.call(), &partner_id).await {
        Ok(partner) => partner,
        Err(e) => {
            page.failure(&e).await;
            return Redirect::to("/partners").into_response();
        }
    };

    let stats = match state
        .partner_client
        .get_partner_stats(page.call(), &partner_id)
        .await
    {
        Ok(stats) => stats,
        Err(e) => {
            tracing::warn!(error = %e, "Partner stats unavailable, using embedded figures");
            partner.stats
        }
    };

    let (tags, tag_pagination) = match state
        .partner_client
        .get_assigned_tags(page.call(), &partner_id, query.page)
        .await
    {
        Ok(list) => (
            list.tags.iter().map(TagRow::from_tag).collect(),
            list.pagination,
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Assigned tags unavailable");
            (Vec::new(), Pagination::default())
        }
    };

    let mut row = PartnerRow::from_partner(&partner);
    row.cards_activated = stats.cards_activated;
    row.total_sales = stats.total_sales;

    PartnerDetailTemplate {
        chrome: page.chrome("partners").await,
        address: format::text(partner.address.as_deref()),
        total_revenue: format::currency(Some(stats.total_revenue)),
        commission_earned: format::currency(Some(stats.commission_earned)),
        pager: Pager::new(
            &partner_url(&partner_id),
            &serde_json::json!({}),
            &tag_pagination,
        ),
        partner: row,
        tags,
    }
    .into_response()
}

pub async fn edit_partner_page(
    State(state): State<AppState>,
    Path(partner_id): Path<String>,
    page: Page,
) -> Response {
    match state.partner_client.get_partner(page.call(), &partner_id).await {
        Ok(partner) => PartnerFormTemplate {
            chrome: page.chrome("partners").await,
            title: format!("Edit {}", partner.name.as_deref().unwrap_or("partner")),
            action: partner_url(&partner_id),
            is_new: false,
            values: PartnerFormValues::from_partner(&partner),
            status_options: status_options(partner.status.map(|s| s.as_str())),
            error: None,
        }
        .into_response(),
        Err(e) => {
            page.failure(&e).await;
            Redirect::to("/partners").into_response()
        }
    }
}

pub async fn update_partner(
    State(state): State<AppState>,
    Path(partner_id): Path<String>,
    page: Page,
    form: Result<Form<UpdatePartnerForm>, FormRejection>,
) -> Response {
    let action = partner_url(&partner_id);
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            page.failure(&rejected_form_error(rejection)).await;
            return Redirect::to(&format!("{}/edit", action)).into_response();
        }
    };

    match state
        .partner_client
        .update_partner(page.call(), &partner_id, &form)
        .await
    {
        Ok(_) => {
            page.success("Partner updated").await;
            Redirect::to(&action).into_response()
        }
        // Keep what was typed; a redirect would reload the stored partner.
        Err(e) => PartnerFormTemplate {
            chrome: page.chrome("partners").await,
            title: "Edit partner".to_string(),
            action,
            is_new: false,
            values: PartnerFormValues::from_update(&form),
            status_options: status_options(form.status().map(|s| s.as_str())),
            error: Some(e.user_message()),
        }
        .into_response(),
    }
}

pub async fn delete_partner(
    State(state): State<AppState>,
    Path(partner_id): Path<String>,
    page: Page,
) -> impl IntoResponse {
    match state
        .partner_client
        .delete_partner(page.call(), &partner_id)
        .await
    {
        Ok(()) => page.success("Partner deleted").await,
        Err(e) => page.failure(&e).await,
    }
    Redirect::to("/partners")
}
