use serde::Deserialize;
use serde_json::{Map, Value};
use validator::Validate;

use super::{clean, empty_as_none, finite, PHONE_RE};
use crate::models::PartnerStatus;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewPartnerForm {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(regex(path = *PHONE_RE, message = "Enter a 10 digit phone number"))]
    pub phone: String,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub company_name: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub address: Option<String>,

    #[validate(
        range(min = 0.0, max = 100.0, message = "Commission rate must be between 0 and 100"),
        custom(function = "finite", message = "Commission rate must be a number")
    )]
    pub commission_rate: f64,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
}

impl NewPartnerForm {
    pub fn payload(&self) -> Value {
        let mut body = Map::new();
        body.insert("name".into(), self.name.trim().into());
        body.insert("email".into(), self.email.trim().to_lowercase().into());
        body.insert("phone".into(), self.phone.trim().into());
        body.insert("commissionRate".into(), self.commission_rate.into());
        if let Some(company) = clean(&self.company_name) {
            body.insert("companyName".into(), company.into());
        }
        if let Some(address) = clean(&self.address) {
            body.insert("address".into(), address.into());
        }
        if let Some(password) = clean(&self.password) {
            body.insert("password".into(), password.into());
        }
        Value::Object(body)
    }
}

/// Partial update; only fields that were filled in are sent.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePartnerForm {
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(regex(path = *PHONE_RE, message = "Enter a 10 digit phone number"))]
    pub phone: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub company_name: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub address: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(
        range(min = 0.0, max = 100.0, message = "Commission rate must be between 0 and 100"),
        custom(function = "finite", message = "Commission rate must be a number")
    )]
    pub commission_rate: Option<f64>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<String>,
}

impl UpdatePartnerForm {
    pub fn status(&self) -> Option<PartnerStatus> {
        self.status.as_deref().and_then(PartnerStatus::parse)
    }

    pub fn payload(&self) -> Value {
        let mut body = Map::new();
        if let Some(name) = clean(&self.name) {
            body.insert("name".into(), name.into());
        }
        if let Some(email) = clean(&self.email) {
            body.insert("email".into(), email.to_lowercase().into());
        }
        if let Some(phone) = clean(&self.phone) {
            body.insert("phone".into(), phone.into());
        }
        if let Some(company) = clean(&self.company_name) {
            body.insert("companyName".into(), company.into());
        }
        if let Some(address) = clean(&self.address) {
            body.insert("address".into(), address.into());
        }
        if let Some(rate) = self.commission_rate {
            body.insert("commissionRate".into(), rate.into());
        }
        if let Some(status) = self.status() {
            body.insert("status".into(), status.as_str().into());
        }
        Value::Object(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partner(rate: f64) -> NewPartnerForm {
        NewPartnerForm {
            name: "Ravi Kumar".into(),
            email: "Ravi@Example.com".into(),
            phone: "9876543210".into(),
            company_name: Some("  ".into()),
            address: None,
            commission_rate: rate,
            password: None,
        }
    }

    #[test]
    fn commission_rate_bounds() {
        assert!(partner(0.0).validate().is_ok());
        assert!(partner(100.0).validate().is_ok());
        let errors = partner(150.0).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("commission_rate"));
        assert!(partner(-1.0).validate().is_err());
    }

    #[test]
    fn payload_skips_blank_optionals() {
        let body = partner(10.0).payload();
        assert_eq!(body["email"], "ravi@example.com");
        assert!(body.get("companyName").is_none());
    }

    #[test]
    fn update_payload_is_partial() {
        let form = UpdatePartnerForm {
            commission_rate: Some(7.5),
            status: Some("Suspended".into()),
            ..UpdatePartnerForm::default()
        };
        assert!(form.validate().is_ok());
        let body = form.payload();
        assert_eq!(body["status"], "suspended");
        assert_eq!(body.as_object().unwrap().len(), 2);
    }

    #[test]
    fn commission_rate_must_be_a_number() {
        let errors = partner(f64::NAN).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("commission_rate"));
        assert!(partner(f64::INFINITY).validate().is_err());

        let form = UpdatePartnerForm {
            commission_rate: Some(f64::NAN),
            ..UpdatePartnerForm::default()
        };
        assert!(form.validate().is_err());
    }
}
