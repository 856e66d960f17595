use askama::Template;
use axum::{
    extract::{rejection::FormRejection, Path, Query, State},
    response::{IntoResponse, Redirect},
    Form,
};

use super::{rejected_form_error, Chrome, Page, Pager, SelectOption};
use crate::dtos::tags::{GenerateTagsForm, TagStatusForm};
use crate::models::{TagItem, TagStatus};
use crate::services::tag_client::TagFilters;
use crate::utils::format;
use crate::AppState;

pub struct TagRow {
    pub id: String,
    pub short_code: String,
    pub status: String,
    pub status_label: String,
    pub batch: String,
    pub assigned_to: String,
    pub owner: String,
    pub vehicle: String,
    pub activated_at: String,
    pub created_at: String,
    pub next_states: Vec<SelectOption>,
    pub can_activate: bool,
}

impl TagRow {
    pub fn from_tag(tag: &TagItem) -> Self {
        let owner = tag.owner.as_ref();
        Self {
            id: tag.key().unwrap_or_default().to_string(),
            short_code: format::text(tag.short_code.as_deref()),
            status: tag.status.as_str().to_string(),
            status_label: format::label(tag.status.as_str()),
            batch: format::text(tag.batch_name.as_deref()),
            assigned_to: format::text(
                tag.assigned_to
                    .as_ref()
                    .and_then(|a| a.name.as_deref().or(a.email.as_deref()).or(a.id.as_deref())),
            ),
            owner: format::text(owner.and_then(|o| o.name.as_deref().or(o.phone.as_deref()))),
            vehicle: format::text(owner.and_then(|o| o.vehicle_number.as_deref())),
            activated_at: format::date(tag.activated_at),
            created_at: format::date(tag.created_at),
            next_states: SelectOption::list(
                tag.status.next_states().iter().map(|s| s.as_str()),
                None,
            ),
            can_activate: tag.short_code.is_some()
                && matches!(tag.status, TagStatus::Generated | TagStatus::Assigned),
        }
    }
}

#[derive(Template)]
#[template(path = "pages/tags.html")]
pub struct TagsTemplate {
    pub chrome: Chrome,
    pub search: String,
    pub batch_name: String,
    pub status_options: Vec<SelectOption>,
    pub rows: Vec<TagRow>,
    pub pager: Pager,
    pub error: Option<String>,
}

pub async fn list_tags(
    State(state): State<AppState>,
    page: Page,
    Query(filters): Query<TagFilters>,
) -> impl IntoResponse {
    let (rows, pagination, error) = match state
        .tag_client
        .list_admin_tags(page.call(), &filters)
        .await
    {
        Ok(list) => (
            list.tags.iter().map(TagRow::from_tag).collect(),
            list.pagination,
            None,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load tags");
            (Vec::new(), Default::default(), Some(e.user_message()))
        }
    };

    TagsTemplate {
        chrome: page.chrome("tags").await,
        search: filters.search.clone().unwrap_or_default(),
        batch_name: filters.batch_name.clone().unwrap_or_default(),
        status_options: SelectOption::list(
            TagStatus::ALL.iter().map(|s| s.as_str()),
            filters.status.as_deref(),
        ),
        pager: Pager::new("/tags", &filters, &pagination),
        rows,
        error,
    }
}

pub async fn generate_tags(
    State(state): State<AppState>,
    page: Page,
    form: Result<Form<GenerateTagsForm>, FormRejection>,
) -> impl IntoResponse {
    let result = match form {
        Ok(Form(form)) => state.tag_client.generate_bulk(page.call(), &form).await,
        Err(rejection) => Err(rejected_form_error(rejection)),
    };

    match result {
        Ok(created) => page.success(format!("Generated {} tags", created.len())).await,
        Err(e) => page.failure(&e).await,
    }
    Redirect::to("/tags")
}

pub async fn update_tag_status(
    State(state): State<AppState>,
    page: Page,
    Path(tag_id): Path<String>,
    Form(form): Form<TagStatusForm>,
) -> impl IntoResponse {
    let current = form
        .current
        .as_deref()
        .map(TagStatus::parse)
        .unwrap_or(TagStatus::Unknown);
    let next = TagStatus::parse(&form.status);

    match state
        .tag_client
        .update_status(page.call(), &tag_id, current, next)
        .await
    {
        Ok(tag) => {
            page.success(format!(
                "Tag {} marked {}",
                tag.short_code.as_deref().unwrap_or(&tag_id),
                next
            ))
            .await
        }
        Err(e) => page.failure(&e).await,
    }
    Redirect::to("/tags")
}
