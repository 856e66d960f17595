use serde::Serialize;
use serde_json::Value;

use super::sale::{normalize_sale, TagSale};
use crate::normalize::{
    pick_array, pick_f64, pick_object, pick_str, pick_u64, unwrap_data, Object,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_tags: u64,
    pub activated_tags: u64,
    pub total_partners: u64,
    pub active_partners: u64,
    pub total_sales: u64,
    pub total_revenue: f64,
    pub pending_commissions: f64,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub recent_sales: Vec<TagSale>,
    /// True when at least one figure came from the fallback.
    pub uses_fallback: bool,
}

impl DashboardSummary {
    /// Figures shown when the summary endpoint is unavailable.
    pub fn fallback() -> Self {
        let monthly = [
            ("Jan", 12000.0),
            ("Feb", 15500.0),
            ("Mar", 14200.0),
            ("Apr", 18900.0),
            ("May", 21300.0),
            ("Jun", 19800.0),
        ];
        Self {
            total_tags: 1250,
            activated_tags: 840,
            total_partners: 48,
            active_partners: 36,
            total_sales: 612,
            total_revenue: 101_700.0,
            pending_commissions: 8_450.0,
            monthly_revenue: monthly
                .iter()
                .map(|(month, revenue)| MonthlyRevenue {
                    month: month.to_string(),
                    revenue: *revenue,
                })
                .collect(),
            recent_sales: Vec::new(),
            uses_fallback: true,
        }
    }

    /// Activated share of all tags, 0–100.
    pub fn activation_rate(&self) -> f64 {
        if self.total_tags == 0 {
            0.0
        } else {
            self.activated_tags as f64 * 100.0 / self.total_tags as f64
        }
    }

    /// Largest monthly revenue, used to scale the bar chart.
    pub fn peak_revenue(&self) -> f64 {
        self.monthly_revenue
            .iter()
            .map(|m| m.revenue)
            .fold(0.0, f64::max)
    }
}

/// Merges a summary payload over [`DashboardSummary::fallback`], field by
/// field. Accepts flat payloads and the `{ tags: {..}, partners: {..},
/// sales: {..} }` grouping.
pub fn normalize_dashboard(value: Value) -> DashboardSummary {
    let mut summary = DashboardSummary::fallback();
    let value = unwrap_data(value);
    let Some(root) = value.as_object() else {
        return summary;
    };

    let tags = pick_object(root, &["tags"]);
    let partners = pick_object(root, &["partners", "affiliates"]);
    let sales = pick_object(root, &["sales"]);
    let mut missing = false;

    let counts: [(&[&str], Option<&Object>, &[&str], &mut u64); 5] = [
        (&["totalTags"][..], tags, &["total"][..], &mut summary.total_tags),
        (&["activatedTags", "activeTags"][..], tags, &["activated"][..], &mut summary.activated_tags),
        (&["totalPartners"][..], partners, &["total"][..], &mut summary.total_partners),
        (&["activePartners"][..], partners, &["active"][..], &mut summary.active_partners),
        (&["totalSales"][..], sales, &["total", "count"][..], &mut summary.total_sales),
    ];
    for (flat, group, nested, slot) in counts {
        match pick_u64(root, flat).or_else(|| group.and_then(|g| pick_u64(g, nested))) {
            Some(v) => *slot = v,
            None => missing = true,
        }
    }

    match pick_f64(root, &["totalRevenue"]).or_else(|| sales.and_then(|s| pick_f64(s, &["revenue"])))
    {
        Some(v) => summary.total_revenue = v,
        None => missing = true,
    }
    match pick_f64(root, &["pendingCommissions", "pendingCommission"]) {
        Some(v) => summary.pending_commissions = v,
        None => missing = true,
    }

    match pick_array(root, &["monthlyRevenue", "revenueByMonth"]) {
        Some(items) if !items.is_empty() => {
            summary.monthly_revenue = items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|m| {
                    Some(MonthlyRevenue {
                        month: pick_str(m, &["month", "label", "_id"])?,
                        revenue: pick_f64(m, &["revenue", "total", "amount"]).unwrap_or(0.0),
                    })
                })
                .collect();
        }
        _ => missing = true,
    }

    if let Some(items) = pick_array(root, &["recentSales"]) {
        summary.recent_sales = items.iter().map(normalize_sale).collect();
    }

    summary.uses_fallback = missing;
    summary
}
