use serde::Deserialize;
use serde_json::{Map, Value};
use validator::Validate;

use super::{clean, empty_as_none, finite};
use crate::models::{PaymentStatus, VerificationStatus};

/// Create/edit form for a tag sale. `tag` holds the id resolved by short-code
/// verification, never the short code itself.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaleForm {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub short_code: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub tag: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub owner: Option<String>,

    #[serde(default, rename = "SalesPerson", deserialize_with = "empty_as_none")]
    pub sales_person: Option<String>,

    #[validate(
        range(min = 0.0, message = "Sale amount cannot be negative"),
        custom(function = "finite", message = "Enter a valid sale amount")
    )]
    pub sale_amount: f64,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(
        range(min = 0.0, message = "Cost cannot be negative"),
        custom(function = "finite", message = "Enter a valid cost")
    )]
    pub cost: Option<f64>,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(
        range(min = 0.0, message = "Commission cannot be negative"),
        custom(function = "finite", message = "Enter a valid commission")
    )]
    pub sales_person_commission: Option<f64>,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(
        range(min = 0.0, message = "Commission cannot be negative"),
        custom(function = "finite", message = "Enter a valid commission")
    )]
    pub owner_commission: Option<f64>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub payment_status: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub verification_status: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(max = 1000, message = "Message is too long"))]
    pub message: Option<String>,
}

impl SaleForm {
    pub fn payment_status(&self) -> Option<PaymentStatus> {
        self.payment_status.as_deref().and_then(PaymentStatus::parse)
    }

    pub fn verification_status(&self) -> Option<VerificationStatus> {
        self.verification_status
            .as_deref()
            .and_then(VerificationStatus::parse)
    }

    /// Request body; callers must have checked that `tag` and `owner` are set.
    pub fn payload(&self, tag_id: &str, owner_id: &str) -> Value {
        let mut body = Map::new();
        body.insert("tag".into(), tag_id.into());
        body.insert("owner".into(), owner_id.into());
        if let Some(sales_person) = clean(&self.sales_person) {
            body.insert("SalesPerson".into(), sales_person.into());
        }
        body.insert("saleAmount".into(), self.sale_amount.into());
        if let Some(cost) = self.cost {
            body.insert("cost".into(), cost.into());
        }
        if let Some(c) = self.sales_person_commission {
            body.insert("salesPersonCommission".into(), c.into());
        }
        if let Some(c) = self.owner_commission {
            body.insert("ownerCommission".into(), c.into());
        }
        if let Some(status) = self.payment_status() {
            body.insert("paymentStatus".into(), status.as_str().into());
        }
        if let Some(status) = self.verification_status() {
            body.insert("verificationStatus".into(), status.as_str().into());
        }
        if let Some(message) = clean(&self.message) {
            body.insert("message".into(), message.into());
        }
        Value::Object(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_verified_ids() {
        let form = SaleForm {
            short_code: Some("QX7K2".into()),
            tag: Some("t1".into()),
            owner: Some("o1".into()),
            sales_person: Some("u1".into()),
            sale_amount: 999.0,
            payment_status: Some("PAID".into()),
            ..SaleForm::default()
        };
        let body = form.payload("t1", "o1");
        assert_eq!(body["tag"], "t1");
        assert_eq!(body["SalesPerson"], "u1");
        assert_eq!(body["paymentStatus"], "paid");
        assert!(body.get("shortCode").is_none());
    }

    #[test]
    fn negative_amounts_rejected() {
        let form = SaleForm {
            sale_amount: -5.0,
            ..SaleForm::default()
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn non_finite_amounts_rejected() {
        let form = SaleForm {
            sale_amount: 500.0,
            owner_commission: Some(f64::NAN),
            ..SaleForm::default()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("owner_commission"));

        let form = SaleForm {
            sale_amount: f64::INFINITY,
            ..SaleForm::default()
        };
        assert!(form.validate().is_err());
    }
}
