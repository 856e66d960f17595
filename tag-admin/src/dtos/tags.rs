use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use super::{checkbox, clean, empty_as_none, OTP_RE, PHONE_RE};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTagsForm {
    #[validate(range(min = 1, max = 1000, message = "Generate between 1 and 1000 tags"))]
    pub count: u32,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(max = 80, message = "Batch name is too long"))]
    pub batch_name: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagStatusForm {
    pub status: String,
    /// Status the row showed when the operator picked the new one.
    #[serde(default)]
    pub current: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RequestOtpForm {
    #[validate(regex(path = *PHONE_RE, message = "Enter a 10 digit phone number"))]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmActivationForm {
    #[validate(regex(path = *OTP_RE, message = "Enter the 6 digit OTP"))]
    pub otp: String,

    #[validate(length(min = 2, message = "Full name is required"))]
    pub full_name: String,

    #[validate(length(min = 1, message = "Vehicle number is required"))]
    pub vehicle_number: String,

    #[validate(length(min = 1, message = "Vehicle type is required"))]
    pub vehicle_type: String,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub city: Option<String>,

    #[serde(default, deserialize_with = "checkbox")]
    pub sms: bool,
    #[serde(default, deserialize_with = "checkbox")]
    pub whatsapp: bool,
    #[serde(default, deserialize_with = "checkbox")]
    pub call: bool,
}

impl Default for ConfirmActivationForm {
    fn default() -> Self {
        Self {
            otp: String::new(),
            full_name: String::new(),
            vehicle_number: String::new(),
            vehicle_type: String::new(),
            email: None,
            city: None,
            sms: true,
            whatsapp: true,
            call: true,
        }
    }
}

impl ConfirmActivationForm {
    /// Request body for the confirm-activation endpoint.
    pub fn payload(&self, short_code: &str, phone: &str) -> Value {
        json!({
            "shortCode": short_code,
            "phone": phone,
            "otp": self.otp.trim(),
            "name": self.full_name.trim(),
            "email": clean(&self.email),
            "vehicleNumber": self.vehicle_number.trim().to_uppercase(),
            "vehicleType": self.vehicle_type.trim(),
            "city": clean(&self.city),
            "notificationPreferences": {
                "sms": self.sms,
                "whatsapp": self.whatsapp,
                "call": self.call,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confirm() -> ConfirmActivationForm {
        ConfirmActivationForm {
            otp: "123456".to_string(),
            full_name: "Asha Rao".to_string(),
            vehicle_number: "ka01ab1234".to_string(),
            vehicle_type: "car".to_string(),
            ..ConfirmActivationForm::default()
        }
    }

    #[test]
    fn phone_must_be_ten_digits() {
        assert!(RequestOtpForm { phone: "9876543210".into() }.validate().is_ok());
        assert!(RequestOtpForm { phone: "98765".into() }.validate().is_err());
        assert!(RequestOtpForm { phone: "+919876543210".into() }.validate().is_err());
    }

    #[test]
    fn otp_and_email_rules() {
        assert!(confirm().validate().is_ok());

        let mut form = confirm();
        form.otp = "12345".into();
        assert!(form.validate().is_err());

        let mut form = confirm();
        form.email = Some("not-an-email".into());
        assert!(form.validate().is_err());
    }

    #[test]
    fn payload_defaults_preferences_on() {
        let body = confirm().payload("QX7K2", "9876543210");
        assert_eq!(body["vehicleNumber"], "KA01AB1234");
        assert_eq!(body["notificationPreferences"]["whatsapp"], true);
        assert!(body["email"].is_null());
    }

    #[test]
    fn generate_count_bounds() {
        let form = GenerateTagsForm { count: 0, batch_name: None, note: None };
        assert!(form.validate().is_err());
        let form = GenerateTagsForm { count: 1000, batch_name: Some("Mar".into()), note: None };
        assert!(form.validate().is_ok());
    }
}
