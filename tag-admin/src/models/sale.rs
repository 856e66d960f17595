use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::pagination::Pagination;
use crate::normalize::{pick, pick_array, pick_datetime, pick_f64, pick_str, unwrap_data, Object};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Pending,
        PaymentStatus::Paid,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(PaymentStatus::Pending),
            "paid" | "completed" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub const ALL: [VerificationStatus; 3] = [
        VerificationStatus::Pending,
        VerificationStatus::Verified,
        VerificationStatus::Rejected,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(VerificationStatus::Pending),
            "verified" => Some(VerificationStatus::Verified),
            "rejected" => Some(VerificationStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The tag a sale refers to.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleTagRef {
    pub id: Option<String>,
    pub short_code: Option<String>,
}

/// Sales person or vehicle owner on a sale.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartyRef {
    pub id: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl PartyRef {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(obj) => Self {
                id: pick_str(obj, &["_id", "id"]),
                name: pick_str(obj, &["name", "fullName"]),
                phone: pick_str(obj, &["phone", "mobile"]),
                email: pick_str(obj, &["email"]),
            },
            Value::String(id) if !id.trim().is_empty() => Self {
                id: Some(id.trim().to_string()),
                ..Self::default()
            },
            _ => Self::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSale {
    pub id: Option<String>,
    pub tag: SaleTagRef,
    pub sales_person: PartyRef,
    pub owner: PartyRef,
    pub sale_amount: Option<f64>,
    pub cost: Option<f64>,
    pub sales_person_commission: Option<f64>,
    pub owner_commission: Option<f64>,
    pub payment_status: Option<PaymentStatus>,
    pub verification_status: Option<VerificationStatus>,
    pub messages: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

fn party(obj: &Object, keys: &[&str]) -> PartyRef {
    pick(obj, keys)
        .map(PartyRef::from_value)
        .unwrap_or_default()
}

fn messages(obj: &Object) -> Vec<String> {
    match pick(obj, &["messages", "message", "notes"]) {
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(o) => pick_str(o, &["text", "message", "body"]),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Maps a raw tag-sale payload. Never fails.
pub fn normalize_sale(raw: &Value) -> TagSale {
    let empty = Object::new();
    let obj = raw.as_object().unwrap_or(&empty);

    let tag = match pick(obj, &["tag", "tagId"]) {
        Some(Value::Object(t)) => SaleTagRef {
            id: pick_str(t, &["_id", "id"]),
            short_code: pick_str(t, &["shortCode"]),
        },
        Some(Value::String(id)) => SaleTagRef {
            id: Some(id.clone()),
            short_code: pick_str(obj, &["shortCode"]),
        },
        _ => SaleTagRef {
            id: None,
            short_code: pick_str(obj, &["shortCode"]),
        },
    };

    TagSale {
        id: pick_str(obj, &["_id", "id"]),
        tag,
        sales_person: party(obj, &["SalesPerson", "salesPerson", "salesperson"]),
        owner: party(obj, &["owner", "vehicleOwner"]),
        sale_amount: pick_f64(obj, &["saleAmount", "amount", "price"]),
        cost: pick_f64(obj, &["cost", "costPrice"]),
        sales_person_commission: pick_f64(
            obj,
            &["salesPersonCommission", "SalesPersonCommission", "salespersonCommission"],
        ),
        owner_commission: pick_f64(obj, &["ownerCommission"]),
        payment_status: pick_str(obj, &["paymentStatus"]).and_then(|s| PaymentStatus::parse(&s)),
        verification_status: pick_str(obj, &["verificationStatus"])
            .and_then(|s| VerificationStatus::parse(&s)),
        messages: messages(obj),
        created_at: pick_datetime(obj, &["createdAt", "saleDate"]),
    }
}

impl TagSale {
    /// Sale amount minus cost and both commissions, when all are known.
    pub fn margin(&self) -> Option<f64> {
        Some(
            self.sale_amount?
                - self.cost.unwrap_or(0.0)
                - self.sales_person_commission.unwrap_or(0.0)
                - self.owner_commission.unwrap_or(0.0),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleListResponse {
    pub sales: Vec<TagSale>,
    pub pagination: Pagination,
}

impl SaleListResponse {
    pub fn from_value(value: Value) -> Self {
        let value = unwrap_data(value);
        match &value {
            Value::Array(items) => Self {
                sales: items.iter().map(normalize_sale).collect(),
                pagination: Pagination {
                    total: items.len() as u64,
                    total_pages: u64::from(!items.is_empty()),
                    ..Pagination::default()
                },
            },
            Value::Object(obj) => {
                let sales: Vec<TagSale> = pick_array(obj, &["sales", "tagSales", "items", "data"])
                    .map(|items| items.iter().map(normalize_sale).collect())
                    .unwrap_or_default();
                let pagination = Pagination::from_response(obj, sales.len());
                Self { sales, pagination }
            }
            _ => Self {
                sales: Vec::new(),
                pagination: Pagination::default(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_embedded_references() {
        let sale = normalize_sale(&json!({
            "_id": "s1",
            "tag": { "_id": "t1", "shortCode": "QX7K2" },
            "SalesPerson": { "_id": "u1", "name": "Ravi" },
            "owner": "o1",
            "saleAmount": 999,
            "cost": 200,
            "salesPersonCommission": 100,
            "ownerCommission": 50,
            "paymentStatus": "paid",
            "verificationStatus": "verified",
            "messages": ["first", { "text": "second" }]
        }));

        assert_eq!(sale.tag.short_code.as_deref(), Some("QX7K2"));
        assert_eq!(sale.sales_person.name.as_deref(), Some("Ravi"));
        assert_eq!(sale.owner.id.as_deref(), Some("o1"));
        assert_eq!(sale.payment_status, Some(PaymentStatus::Paid));
        assert_eq!(sale.messages, vec!["first".to_string(), "second".to_string()]);
        assert_eq!(sale.margin(), Some(649.0));
    }

    #[test]
    fn missing_fields_stay_empty() {
        let sale = normalize_sale(&json!({ "amount": "150" }));
        assert_eq!(sale.sale_amount, Some(150.0));
        assert!(sale.id.is_none());
        assert!(sale.owner.id.is_none());
        assert!(sale.messages.is_empty());
        assert_eq!(normalize_sale(&json!(null)).sale_amount, None);
    }
}
