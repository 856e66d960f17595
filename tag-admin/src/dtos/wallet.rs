use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use super::{clean, empty_as_none, finite};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WithdrawForm {
    #[validate(
        range(min = 1.0, message = "Withdrawal amount must be at least 1"),
        custom(function = "finite", message = "Enter a valid amount")
    )]
    pub amount: f64,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub note: Option<String>,
}

impl WithdrawForm {
    pub fn payload(&self) -> Value {
        json!({ "amount": self.amount, "note": clean(&self.note) })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ManualCreditForm {
    #[validate(length(min = 1, message = "Choose a partner to credit"))]
    pub user_id: String,

    #[validate(
        range(min = 0.01, message = "Credit amount must be positive"),
        custom(function = "finite", message = "Enter a valid amount")
    )]
    pub amount: f64,

    #[validate(length(min = 3, message = "Describe why the credit is made"))]
    pub description: String,
}

impl ManualCreditForm {
    pub fn payload(&self) -> Value {
        json!({
            "userId": self.user_id.trim(),
            "amount": self.amount,
            "description": self.description.trim(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionStatusForm {
    pub status: String,
    #[serde(default)]
    pub current: Option<String>,
    /// Wallet page to return to.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub user: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_requires_positive_amount_and_reason() {
        let form = ManualCreditForm {
            user_id: "u1".into(),
            amount: 0.0,
            description: "ok".into(),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("amount"));
        assert!(errors.field_errors().contains_key("description"));
    }

    #[test]
    fn withdraw_payload() {
        let form = WithdrawForm {
            amount: 250.0,
            note: Some(" UPI ".into()),
        };
        assert!(form.validate().is_ok());
        assert_eq!(form.payload()["note"], "UPI");
    }

    #[test]
    fn nan_amounts_rejected() {
        let form: WithdrawForm = serde_urlencoded::from_str("amount=NaN").unwrap();
        assert!(form.amount.is_nan());
        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("amount"));

        let credit = ManualCreditForm {
            user_id: "u1".into(),
            amount: f64::NAN,
            description: "Festival bonus".into(),
        };
        assert!(credit.validate().is_err());
    }
}
