pub mod activation;
pub mod app;
pub mod auth;
pub mod dashboard;
pub mod metrics;
pub mod partners;
pub mod sales;
pub mod tags;
pub mod toast;
pub mod wallet;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use service_core::middleware::RequestId;
use tower_sessions::Session;

use crate::models::{AuthUser, Pagination, Role};
use crate::services::params::sanitize_params;
use crate::services::{ApiError, CallContext};
use toast::{flash_error, flash_info, flash_success, take_flashes, Toast};

/// Everything a dashboard page handler needs about the current request: the
/// signed-in operator, the session and the correlation id.
pub struct Page {
    pub user: AuthUser,
    pub session: Session,
    pub request_id: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for Page
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to extract session",
                )
                    .into_response()
            })?;
        let request_id = parts
            .extensions
            .get::<RequestId>()
            .map(|id| id.as_str().to_string());

        Ok(Self {
            user,
            session,
            request_id,
        })
    }
}

impl Page {
    pub fn call(&self) -> CallContext<'_> {
        CallContext::new(self.user.token(), self.request_id.as_deref())
    }

    pub fn is_admin(&self) -> bool {
        self.user.role.is_admin()
    }

    /// Header/navigation data for the base layout. Consumes pending toasts.
    pub async fn chrome(&self, current_page: &'static str) -> Chrome {
        let profile = self.user.profile();
        Chrome {
            user_name: profile.display_name(),
            initials: profile.initials(),
            role: role_label(self.user.role).to_string(),
            is_admin: self.user.role.is_admin(),
            current_page,
            toasts: take_flashes(&self.session).await,
        }
    }

    pub async fn success(&self, message: impl Into<String>) {
        flash_success(&self.session, message).await
    }

    pub async fn info(&self, message: impl Into<String>) {
        flash_info(&self.session, message).await
    }

    pub async fn failure(&self, err: &ApiError) {
        flash_error(&self.session, err).await
    }
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::Admin => "Administrator",
        Role::Affiliate => "Affiliate partner",
        Role::Staff => "Staff",
        Role::Other => "User",
    }
}

/// Layout data shared by every signed-in page.
pub struct Chrome {
    pub user_name: String,
    pub initials: String,
    pub role: String,
    pub is_admin: bool,
    pub current_page: &'static str,
    pub toasts: Vec<Toast>,
}

/// `<option>` entry for a select box.
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    pub fn list<'a>(
        values: impl IntoIterator<Item = &'a str>,
        selected: Option<&str>,
    ) -> Vec<SelectOption> {
        values
            .into_iter()
            .map(|value| SelectOption {
                value: value.to_string(),
                label: crate::utils::format::label(value),
                selected: selected == Some(value),
            })
            .collect()
    }
}

/// Previous/next links for a server-paginated table. The links keep the
/// current filters.
pub struct Pager {
    pub page: u64,
    pub total_pages: u64,
    pub total: u64,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
}

impl Pager {
    pub fn new<F: Serialize>(base: &str, filters: &F, pagination: &Pagination) -> Self {
        let mut params: Vec<(String, String)> = sanitize_params(filters)
            .into_iter()
            .filter(|(key, _)| key != "page" && key != "limit")
            .collect();

        let mut href = |page: u64| {
            params.push(("page".to_string(), page.to_string()));
            let query = serde_urlencoded::to_string(&params).unwrap_or_default();
            params.pop();
            format!("{}?{}", base, query)
        };

        Self {
            page: pagination.page,
            total_pages: pagination.total_pages.max(1),
            total: pagination.total,
            previous_href: pagination
                .has_previous()
                .then(|| href(pagination.previous_page())),
            next_href: pagination.has_next().then(|| href(pagination.next_page())),
        }
    }
}

/// Form bodies that fail to deserialize (e.g. a non-numeric amount) are
/// reported as a toast rather than a bare 422.
pub fn rejected_form_error(rejection: impl std::fmt::Display) -> ApiError {
    tracing::debug!(error = %rejection, "Form rejected");
    ApiError::precondition("Please check the form: some values are missing or invalid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pager_keeps_filters() {
        let filters = json!({ "status": "activated", "search": "", "page": 2 });
        let pagination = Pagination {
            page: 2,
            limit: 10,
            total: 45,
            total_pages: 5,
        };
        let pager = Pager::new("/tags", &filters, &pagination);
        assert_eq!(pager.previous_href.as_deref(), Some("/tags?status=activated&page=1"));
        assert_eq!(pager.next_href.as_deref(), Some("/tags?status=activated&page=3"));
    }

    #[test]
    fn single_page_has_no_links() {
        let pager = Pager::new("/sales", &json!({}), &Pagination::default());
        assert!(pager.previous_href.is_none());
        assert!(pager.next_href.is_none());
        assert_eq!(pager.total_pages, 1);
    }

    #[test]
    fn select_options_mark_selection() {
        let options = SelectOption::list(["active", "inactive"], Some("inactive"));
        assert!(!options[0].selected);
        assert!(options[1].selected);
        assert_eq!(options[1].label, "Inactive");
    }
}
