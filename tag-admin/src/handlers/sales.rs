use askama::Template;
use axum::{
    extract::{rejection::FormRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use service_core::error::AppError;

use super::{rejected_form_error, Chrome, Page, Pager, SelectOption};
use crate::dtos::sales::SaleForm;
use crate::models::{Pagination, PaymentStatus, TagSale, TagVerifyResult, VerificationStatus};
use crate::services::sale_client::SaleFilters;
use crate::utils::format;
use crate::workflows::tag_verifier::{should_verify, MIN_SHORT_CODE_LEN};
use crate::AppState;

/// Session key of the short code the sale form last verified.
const LAST_VERIFIED_KEY: &str = "last_verified_short_code";

pub struct SaleRow {
    pub id: String,
    pub short_code: String,
    pub sales_person: String,
    pub owner: String,
    pub owner_phone: String,
    pub sale_amount: String,
    pub cost: String,
    pub sales_person_commission: String,
    pub owner_commission: String,
    pub margin: String,
    pub payment_status: String,
    pub verification_status: String,
    pub messages: Vec<String>,
    pub created_at: String,
}

impl SaleRow {
    pub fn from_sale(sale: &TagSale) -> Self {
        let party = |p: &crate::models::PartyRef| {
            format::text(p.name.as_deref().or(p.email.as_deref()).or(p.id.as_deref()))
        };
        Self {
            id: sale.id.clone().unwrap_or_default(),
            short_code: format::text(sale.tag.short_code.as_deref().or(sale.tag.id.as_deref())),
            sales_person: party(&sale.sales_person),
            owner: party(&sale.owner),
            owner_phone: format::text(sale.owner.phone.as_deref()),
            sale_amount: format::currency(sale.sale_amount),
            cost: format::currency(sale.cost),
            sales_person_commission: format::currency(sale.sales_person_commission),
            owner_commission: format::currency(sale.owner_commission),
            margin: format::currency(sale.margin()),
            payment_status: sale
                .payment_status
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| format::PLACEHOLDER.to_string()),
            verification_status: sale
                .verification_status
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| format::PLACEHOLDER.to_string()),
            messages: sale.messages.clone(),
            created_at: format::date(sale.created_at),
        }
    }
}

/// State of the short-code check shown inside the sale form.
#[derive(Default)]
pub struct TagVerificationView {
    /// `idle`, `hint`, `verified` or `error`.
    pub state: &'static str,
    pub message: String,
    pub tag_id: String,
    pub owner_id: String,
    pub owner_name: String,
    pub sales_person: String,
    pub status_label: String,
}

impl TagVerificationView {
    fn idle(sales_person: String) -> Self {
        Self {
            state: "idle",
            sales_person,
            ..Self::default()
        }
    }

    fn hint(sales_person: String) -> Self {
        Self {
            state: "hint",
            message: format!("Enter at least {} characters", MIN_SHORT_CODE_LEN),
            sales_person,
            ..Self::default()
        }
    }

    fn verified(result: &TagVerifyResult, sales_person: Option<String>) -> Self {
        Self {
            state: "verified",
            message: format!("Tag {} verified", result.short_code),
            tag_id: result.id.clone(),
            owner_id: result.owner_id.clone().unwrap_or_default(),
            owner_name: format::text(
                result
                    .owner_name
                    .as_deref()
                    .or(result.owner_phone.as_deref()),
            ),
            sales_person: sales_person
                .or_else(|| result.assigned_to.clone())
                .unwrap_or_default(),
            status_label: format::label(result.status.as_str()),
        }
    }

    fn failed(message: String, sales_person: String) -> Self {
        Self {
            state: "error",
            message,
            sales_person,
            ..Self::default()
        }
    }

    /// Rebuilds the view from a submitted form so a re-rendered form keeps
    /// its verified tag.
    fn from_form(form: &SaleForm) -> Self {
        let sales_person = form.sales_person.clone().unwrap_or_default();
        match form.tag.as_deref() {
            Some(tag_id) => Self {
                state: "verified",
                message: format!(
                    "Tag {} verified",
                    form.short_code.as_deref().unwrap_or(tag_id)
                ),
                tag_id: tag_id.to_string(),
                owner_id: form.owner.clone().unwrap_or_default(),
                owner_name: format::PLACEHOLDER.to_string(),
                sales_person,
                status_label: String::new(),
            },
            None => Self::idle(sales_person),
        }
    }
}

pub struct SaleFormValues {
    pub short_code: String,
    pub sale_amount: String,
    pub cost: String,
    pub sales_person_commission: String,
    pub owner_commission: String,
    pub message: String,
    pub payment_options: Vec<SelectOption>,
    pub verification_options: Vec<SelectOption>,
}

fn amount(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn payment_options(selected: Option<PaymentStatus>) -> Vec<SelectOption> {
    SelectOption::list(
        PaymentStatus::ALL.iter().map(|s| s.as_str()),
        Some(selected.unwrap_or(PaymentStatus::Pending).as_str()),
    )
}

fn verification_options(selected: Option<VerificationStatus>) -> Vec<SelectOption> {
    SelectOption::list(
        VerificationStatus::ALL.iter().map(|s| s.as_str()),
        Some(selected.unwrap_or(VerificationStatus::Pending).as_str()),
    )
}

impl SaleFormValues {
    fn empty() -> Self {
        Self {
            short_code: String::new(),
            sale_amount: String::new(),
            cost: String::new(),
            sales_person_commission: String::new(),
            owner_commission: String::new(),
            message: String::new(),
            payment_options: payment_options(None),
            verification_options: verification_options(None),
        }
    }

    fn from_form(form: &SaleForm) -> Self {
        Self {
            short_code: form.short_code.clone().unwrap_or_default(),
            sale_amount: form.sale_amount.to_string(),
            cost: amount(form.cost),
            sales_person_commission: amount(form.sales_person_commission),
            owner_commission: amount(form.owner_commission),
            message: form.message.clone().unwrap_or_default(),
            payment_options: payment_options(form.payment_status()),
            verification_options: verification_options(form.verification_status()),
        }
    }

    fn from_sale(sale: &TagSale) -> Self {
        Self {
            short_code: sale.tag.short_code.clone().unwrap_or_default(),
            sale_amount: amount(sale.sale_amount),
            cost: amount(sale.cost),
            sales_person_commission: amount(sale.sales_person_commission),
            owner_commission: amount(sale.owner_commission),
            message: String::new(),
            payment_options: payment_options(sale.payment_status),
            verification_options: verification_options(sale.verification_status),
        }
    }
}

#[derive(Template)]
#[template(path = "pages/sales.html")]
pub struct SalesTemplate {
    pub chrome: Chrome,
    pub search: String,
    pub payment_options: Vec<SelectOption>,
    pub verification_options: Vec<SelectOption>,
    pub rows: Vec<SaleRow>,
    pub pager: Pager,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/sale_form.html")]
pub struct SaleFormTemplate {
    pub chrome: Chrome,
    pub title: String,
    pub action: String,
    pub values: SaleFormValues,
    pub verification: TagVerificationView,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/sale_detail.html")]
pub struct SaleDetailTemplate {
    pub chrome: Chrome,
    pub sale: SaleRow,
}

#[derive(Template)]
#[template(path = "partials/tag_verification.html")]
pub struct TagVerificationFragment {
    pub verification: TagVerificationView,
}

pub async fn list_sales(
    State(state): State<AppState>,
    page: Page,
    Query(filters): Query<SaleFilters>,
) -> impl IntoResponse {
    let (rows, pagination, error) = match state.sale_client.list_sales(page.call(), &filters).await
    {
        Ok(list) => (
            list.sales.iter().map(SaleRow::from_sale).collect(),
            list.pagination,
            None,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load sales");
            (Vec::new(), Pagination::default(), Some(e.user_message()))
        }
    };

    SalesTemplate {
        chrome: page.chrome("sales").await,
        search: filters.search.clone().unwrap_or_default(),
        payment_options: SelectOption::list(
            PaymentStatus::ALL.iter().map(|s| s.as_str()),
            filters.payment_status.as_deref(),
        ),
        verification_options: SelectOption::list(
            VerificationStatus::ALL.iter().map(|s| s.as_str()),
            filters.verification_status.as_deref(),
        ),
        pager: Pager::new("/sales", &filters, &pagination),
        rows,
        error,
    }
}

fn sale_url(sale_id: &str) -> String {
    format!("/sales/{}", urlencoding::encode(sale_id))
}

async fn forget_last_verified(page: &Page) {
    if let Err(e) = page.session.remove_value(LAST_VERIFIED_KEY).await {
        tracing::warn!(error = %e, "Failed to reset verified short code");
    }
}

pub async fn new_sale_page(page: Page) -> impl IntoResponse {
    forget_last_verified(&page).await;
    SaleFormTemplate {
        chrome: page.chrome("sales").await,
        title: "New tag sale".to_string(),
        action: "/sales".to_string(),
        values: SaleFormValues::empty(),
        verification: TagVerificationView::idle(String::new()),
        error: None,
    }
}

pub async fn create_sale(
    State(state): State<AppState>,
    page: Page,
    form: Result<Form<SaleForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            page.failure(&rejected_form_error(rejection)).await;
            return Redirect::to("/sales/new").into_response();
        }
    };

    match state.sale_client.create_tag_sale(page.call(), &form).await {
        Ok(_) => {
            forget_last_verified(&page).await;
            page.success("Tag sale created").await;
            Redirect::to("/sales").into_response()
        }
        Err(e) => SaleFormTemplate {
            chrome: page.chrome("sales").await,
            title: "New tag sale".to_string(),
            action: "/sales".to_string(),
            values: SaleFormValues::from_form(&form),
            verification: TagVerificationView::from_form(&form),
            error: Some(e.user_message()),
        }
        .into_response(),
    }
}

pub async fn sale_detail(
    State(state): State<AppState>,
    Path(sale_id): Path<String>,
    page: Page,
) -> Response {
    match state.sale_client.get_sale(page.call(), &sale_id).await {
        Ok(sale) => SaleDetailTemplate {
            chrome: page.chrome("sales").await,
            sale: SaleRow::from_sale(&sale),
        }
        .into_response(),
        Err(e) => {
            page.failure(&e).await;
            Redirect::to("/sales").into_response()
        }
    }
}

pub async fn edit_sale_page(
    State(state): State<AppState>,
    Path(sale_id): Path<String>,
    page: Page,
) -> Response {
    let sale = match state.sale_client.get_sale(page.call(), &sale_id).await {
        Ok(sale) => sale,
        Err(e) => {
            page.failure(&e).await;
            return Redirect::to("/sales").into_response();
        }
    };

    // The stored tag counts as verified until the code is edited.
    if let Some(code) = sale.tag.short_code.as_deref() {
        if let Err(e) = page.session.insert(LAST_VERIFIED_KEY, code).await {
            tracing::warn!(error = %e, "Failed to remember verified short code");
        }
    }

    let verification = TagVerificationView {
        state: if sale.tag.id.is_some() { "verified" } else { "idle" },
        message: sale
            .tag
            .short_code
            .as_deref()
            .map(|c| format!("Tag {} verified", c))
            .unwrap_or_default(),
        tag_id: sale.tag.id.clone().unwrap_or_default(),
        owner_id: sale.owner.id.clone().unwrap_or_default(),
        owner_name: format::text(sale.owner.name.as_deref().or(sale.owner.phone.as_deref())),
        sales_person: sale.sales_person.id.clone().unwrap_or_default(),
        status_label: String::new(),
    };

    SaleFormTemplate {
        chrome: page.chrome("sales").await,
        title: "Edit tag sale".to_string(),
        action: sale_url(&sale_id),
        values: SaleFormValues::from_sale(&sale),
        verification,
        error: None,
    }
    .into_response()
}

pub async fn update_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<String>,
    page: Page,
    form: Result<Form<SaleForm>, FormRejection>,
) -> Response {
    let action = sale_url(&sale_id);
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            page.failure(&rejected_form_error(rejection)).await;
            return Redirect::to(&format!("{}/edit", action)).into_response();
        }
    };

    match state
        .sale_client
        .update_tag_sale(page.call(), &sale_id, &form)
        .await
    {
        Ok(_) => {
            forget_last_verified(&page).await;
            page.success("Tag sale updated").await;
            Redirect::to(&action).into_response()
        }
        Err(e) => SaleFormTemplate {
            chrome: page.chrome("sales").await,
            title: "Edit tag sale".to_string(),
            action,
            values: SaleFormValues::from_form(&form),
            verification: TagVerificationView::from_form(&form),
            error: Some(e.user_message()),
        }
        .into_response(),
    }
}

pub async fn delete_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<String>,
    page: Page,
) -> impl IntoResponse {
    match state.sale_client.delete_sale(page.call(), &sale_id).await {
        Ok(()) => page.success("Tag sale deleted").await,
        Err(e) => page.failure(&e).await,
    }
    Redirect::to("/sales")
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTagQuery {
    #[serde(default)]
    pub short_code: String,
    #[serde(default, rename = "SalesPerson")]
    pub sales_person: Option<String>,
}

/// htmx endpoint behind the sale form's short-code input. Responds with the
/// verification fragment, or `204 No Content` when there is nothing new to
/// show: the code was already verified, or a newer lookup superseded this one.
pub async fn verify_tag_fragment(
    State(state): State<AppState>,
    page: Page,
    Query(query): Query<VerifyTagQuery>,
) -> Response {
    let code = query.short_code.trim().to_string();
    let sales_person = query
        .sales_person
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    if code.chars().count() < MIN_SHORT_CODE_LEN {
        forget_last_verified(&page).await;
        return TagVerificationFragment {
            verification: TagVerificationView::hint(sales_person.unwrap_or_default()),
        }
        .into_response();
    }

    let last: Option<String> = page.session.get(LAST_VERIFIED_KEY).await.unwrap_or(None);
    if !should_verify(&code, last.as_deref()) {
        return StatusCode::NO_CONTENT.into_response();
    }

    let (slot, ticket) = state.verifications.begin(&page.user.user_id);
    let result = tokio::select! {
        _ = ticket.cancelled() => return StatusCode::NO_CONTENT.into_response(),
        result = state.tag_client.verify_tag_by_short_code(page.call(), &code) => result,
    };
    if !slot.is_current(&ticket) {
        return StatusCode::NO_CONTENT.into_response();
    }

    let verification = match result {
        Ok(verified) => {
            if let Err(e) = page.session.insert(LAST_VERIFIED_KEY, &code).await {
                tracing::warn!(error = %e, "Failed to remember verified short code");
            }
            TagVerificationView::verified(&verified, sales_person)
        }
        Err(e) => {
            forget_last_verified(&page).await;
            TagVerificationView::failed(e.user_message(), sales_person.unwrap_or_default())
        }
    };

    TagVerificationFragment { verification }.into_response()
}

/// JSON lookup of a tag by short code.
pub async fn verify_tag_json(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
    page: Page,
) -> Result<Json<TagVerifyResult>, AppError> {
    if short_code.trim().chars().count() < MIN_SHORT_CODE_LEN {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Short code must be at least {} characters",
            MIN_SHORT_CODE_LEN
        )));
    }

    let result = state
        .tag_client
        .verify_tag_by_short_code(page.call(), &short_code)
        .await?;
    Ok(Json(result))
}
