use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::pagination::Pagination;
use crate::normalize::{
    pick_array, pick_datetime, pick_f64, pick_object, pick_str, pick_u64, unwrap_data, Object,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartnerStatus {
    Active,
    Inactive,
    Suspended,
}

impl PartnerStatus {
    pub const ALL: [PartnerStatus; 3] = [
        PartnerStatus::Active,
        PartnerStatus::Inactive,
        PartnerStatus::Suspended,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Some(PartnerStatus::Active),
            "inactive" => Some(PartnerStatus::Inactive),
            "suspended" => Some(PartnerStatus::Suspended),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PartnerStatus::Active => "active",
            PartnerStatus::Inactive => "inactive",
            PartnerStatus::Suspended => "suspended",
        }
    }
}

impl fmt::Display for PartnerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifetime figures computed by the backend; display only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerStats {
    pub cards_activated: u64,
    pub total_sales: u64,
    pub total_revenue: f64,
    pub commission_earned: f64,
}

impl PartnerStats {
    pub fn from_object(obj: &Object) -> Self {
        Self {
            cards_activated: pick_u64(obj, &["cardsActivated", "totalCardsActivated", "activatedTags"])
                .unwrap_or(0),
            total_sales: pick_u64(obj, &["totalSales", "salesCount"]).unwrap_or(0),
            total_revenue: pick_f64(obj, &["totalRevenue", "revenue"]).unwrap_or(0.0),
            commission_earned: pick_f64(obj, &["commissionEarned", "totalCommission"])
                .unwrap_or(0.0),
        }
    }

    pub fn from_value(value: Value) -> Self {
        let value = unwrap_data(value);
        value
            .as_object()
            .map(|obj| Self::from_object(pick_object(obj, &["stats"]).unwrap_or(obj)))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliatePartner {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub commission_rate: Option<f64>,
    pub status: Option<PartnerStatus>,
    pub stats: PartnerStats,
    pub created_at: Option<DateTime<Utc>>,
}

/// Maps a raw partner payload. Partner records sometimes nest contact details
/// under `user`; those are used when the top level lacks them.
pub fn normalize_partner(raw: &Value) -> AffiliatePartner {
    let empty = Object::new();
    let obj = raw.as_object().unwrap_or(&empty);
    let user = pick_object(obj, &["user", "userId"]).unwrap_or(&empty);

    let field = |keys: &[&str]| pick_str(obj, keys).or_else(|| pick_str(user, keys));

    AffiliatePartner {
        id: pick_str(obj, &["_id", "id"]),
        name: field(&["name", "fullName"]),
        email: field(&["email"]),
        phone: field(&["phone", "mobile"]),
        company: pick_str(obj, &["companyName", "company"]),
        address: pick_str(obj, &["address"]),
        commission_rate: pick_f64(obj, &["commissionRate", "commissionPercentage", "commission"]),
        status: pick_str(obj, &["status"]).and_then(|s| PartnerStatus::parse(&s)),
        stats: pick_object(obj, &["stats"])
            .map(PartnerStats::from_object)
            .unwrap_or_else(|| PartnerStats::from_object(obj)),
        created_at: pick_datetime(obj, &["createdAt"]),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerListResponse {
    pub partners: Vec<AffiliatePartner>,
    pub pagination: Pagination,
}

impl PartnerListResponse {
    pub fn from_value(value: Value) -> Self {
        let value = unwrap_data(value);
        match &value {
            Value::Array(items) => Self {
                partners: items.iter().map(normalize_partner).collect(),
                pagination: Pagination {
                    total: items.len() as u64,
                    total_pages: u64::from(!items.is_empty()),
                    ..Pagination::default()
                },
            },
            Value::Object(obj) => {
                let partners: Vec<AffiliatePartner> =
                    pick_array(obj, &["partners", "affiliatePartners", "items", "data"])
                        .map(|items| items.iter().map(normalize_partner).collect())
                        .unwrap_or_default();
                let pagination = Pagination::from_response(obj, partners.len());
                Self {
                    partners,
                    pagination,
                }
            }
            _ => Self {
                partners: Vec::new(),
                pagination: Pagination::default(),
            },
        }
    }
}
