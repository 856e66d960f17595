use std::sync::Arc;

use super::api_client::{ApiClient, CallContext};
use crate::models::{normalize_dashboard, DashboardSummary};

pub struct DashboardClient {
    api: Arc<ApiClient>,
}

impl DashboardClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Admin summary merged over the fallback figures. Never fails: a backend
    /// error yields the fallback as a whole.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn summary(&self, ctx: CallContext<'_>) -> DashboardSummary {
        match self
            .api
            .get(
                ctx,
                "/admin/dashboard/summary",
                "/admin/dashboard/summary",
                &[],
            )
            .await
        {
            Ok(body) => {
                let summary = normalize_dashboard(body);
                if summary.uses_fallback {
                    tracing::debug!("Dashboard summary incomplete, fallback figures merged in");
                }
                summary
            }
            Err(e) => {
                tracing::warn!(error = %e, "Dashboard summary unavailable, showing fallback");
                DashboardSummary::fallback()
            }
        }
    }
}
