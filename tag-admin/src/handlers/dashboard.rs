use askama::Template;
use axum::{extract::State, response::IntoResponse};

use super::sales::SaleRow;
use super::{Chrome, Page};
use crate::utils::format;
use crate::AppState;

pub struct StatCard {
    pub label: &'static str,
    pub value: String,
    pub hint: String,
}

pub struct MonthBar {
    pub month: String,
    pub revenue: String,
    /// Bar width in percent of the best month.
    pub width: u32,
}

#[derive(Template)]
#[template(path = "pages/dashboard.html")]
pub struct DashboardTemplate {
    pub chrome: Chrome,
    pub cards: Vec<StatCard>,
    pub months: Vec<MonthBar>,
    pub recent_sales: Vec<SaleRow>,
    pub uses_fallback: bool,
}

pub async fn dashboard_handler(State(state): State<AppState>, page: Page) -> impl IntoResponse {
    let summary = state.dashboard_client.summary(page.call()).await;

    let cards = vec![
        StatCard {
            label: "Total tags",
            value: summary.total_tags.to_string(),
            hint: format!("{} activated", summary.activated_tags),
        },
        StatCard {
            label: "Activation rate",
            value: format::percent(Some(summary.activation_rate())),
            hint: "of all generated tags".to_string(),
        },
        StatCard {
            label: "Affiliate partners",
            value: summary.total_partners.to_string(),
            hint: format!("{} active", summary.active_partners),
        },
        StatCard {
            label: "Tag sales",
            value: summary.total_sales.to_string(),
            hint: format::currency(Some(summary.total_revenue)),
        },
        StatCard {
            label: "Pending commissions",
            value: format::currency(Some(summary.pending_commissions)),
            hint: "awaiting settlement".to_string(),
        },
    ];

    let peak = summary.peak_revenue();
    let months = summary
        .monthly_revenue
        .iter()
        .map(|m| MonthBar {
            month: m.month.clone(),
            revenue: format::currency(Some(m.revenue)),
            width: if peak > 0.0 {
                (m.revenue / peak * 100.0).round().clamp(0.0, 100.0) as u32
            } else {
                0
            },
        })
        .collect();

    DashboardTemplate {
        chrome: page.chrome("dashboard").await,
        cards,
        months,
        recent_sales: summary.recent_sales.iter().map(SaleRow::from_sale).collect(),
        uses_fallback: summary.uses_fallback,
    }
}
