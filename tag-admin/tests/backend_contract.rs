//! Client behaviour against a mocked REST backend.

mod common;

use common::{backend, ADMIN_TOKEN};
use serde_json::json;
use tag_admin::dtos::partners::NewPartnerForm;
use tag_admin::dtos::sales::SaleForm;
use tag_admin::dtos::tags::{ConfirmActivationForm, RequestOtpForm};
use tag_admin::dtos::wallet::WithdrawForm;
use tag_admin::models::{Pagination, TagStatus};
use tag_admin::services::partner_client::PartnerClient;
use tag_admin::services::sale_client::{SaleClient, UNVERIFIED_TAG_MESSAGE};
use tag_admin::services::tag_client::{TagClient, TagFilters};
use tag_admin::services::wallet_client::WalletClient;
use tag_admin::services::dashboard_client::DashboardClient;
use tag_admin::services::{ApiError, CallContext};
use tag_admin::workflows::{ActivationStep, ActivationWizard};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

fn ctx() -> CallContext<'static> {
    CallContext::new(Some(ADMIN_TOKEN), Some("req-1"))
}

#[tokio::test]
async fn malformed_tag_list_yields_empty_page() {
    let (server, api) = backend().await;
    Mock::given(method("GET"))
        .and(path("/tags/admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": 42 })))
        .mount(&server)
        .await;

    let tags = TagClient::new(api)
        .list_admin_tags(ctx(), &TagFilters::default())
        .await
        .unwrap();

    assert!(tags.tags.is_empty());
    assert_eq!(tags.pagination, Pagination::default());
}

#[tokio::test]
async fn tag_list_accepts_nested_shapes() {
    let (server, api) = backend().await;
    Mock::given(method("GET"))
        .and(path("/tags/admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "tags": [
                    { "_id": "t1", "shortCode": "QX7K2", "status": "generated" },
                    { "_id": "t2", "shortCode": "ZZ9P1", "status": "activated" }
                ],
                "pagination": { "page": 1, "limit": 10, "total": 2 }
            }
        })))
        .mount(&server)
        .await;

    let tags = TagClient::new(api)
        .list_admin_tags(ctx(), &TagFilters::default())
        .await
        .unwrap();

    assert_eq!(tags.tags.len(), 2);
    assert_eq!(tags.tags[1].status, TagStatus::Activated);
    assert_eq!(tags.pagination.total, 2);
}

#[tokio::test]
async fn verify_without_id_is_not_found() {
    let (server, api) = backend().await;
    Mock::given(method("GET"))
        .and(path("/tags/verify/NOPE1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": {} })))
        .mount(&server)
        .await;

    let err = TagClient::new(api)
        .verify_tag_by_short_code(ctx(), "NOPE1")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn verify_echoes_requested_short_code() {
    let (server, api) = backend().await;
    Mock::given(method("GET"))
        .and(path("/tags/verify/QX7K2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "_id": "t1",
                "shortCode": "qx7k2",
                "status": "assigned",
                "assignedTo": { "_id": "aff-9", "name": "Ravi" },
                "ownerAssignedTo": { "_id": "own-3", "name": "Meera", "phone": "9876543210" }
            }
        })))
        .mount(&server)
        .await;

    let verified = TagClient::new(api)
        .verify_tag_by_short_code(ctx(), " QX7K2 ")
        .await
        .unwrap();

    assert_eq!(verified.id, "t1");
    assert_eq!(verified.short_code, "QX7K2");
    assert_eq!(verified.assigned_to.as_deref(), Some("aff-9"));
    assert_eq!(verified.owner_id.as_deref(), Some("own-3"));
}

#[tokio::test]
async fn illegal_tag_transition_never_reaches_backend() {
    let (server, api) = backend().await;

    let err = TagClient::new(api)
        .update_status(ctx(), "t1", TagStatus::Activated, TagStatus::Generated)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Precondition(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn out_of_range_commission_is_rejected_locally() {
    let (server, api) = backend().await;
    let form = NewPartnerForm {
        name: "Ravi Kumar".to_string(),
        email: "ravi@example.com".to_string(),
        phone: "9876543210".to_string(),
        company_name: None,
        address: None,
        commission_rate: 150.0,
        password: None,
    };

    let err = PartnerClient::new(api)
        .create_partner(ctx(), &form)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Validation(_)));
    assert!(err.user_message().contains("between 0 and 100"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn sale_without_verified_tag_is_refused() {
    let (server, api) = backend().await;
    let form = SaleForm {
        short_code: Some("QX7K2".to_string()),
        owner: Some("own-3".to_string()),
        sale_amount: 499.0,
        ..SaleForm::default()
    };

    let err = SaleClient::new(api)
        .create_tag_sale(ctx(), &form)
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), UNVERIFIED_TAG_MESSAGE);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn verified_sale_posts_resolved_ids() {
    let (server, api) = backend().await;
    Mock::given(method("POST"))
        .and(path("/tag-sales"))
        .and(body_partial_json(json!({ "tag": "t1", "owner": "own-3", "saleAmount": 499.0 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "tagSale": { "_id": "s1", "tag": { "_id": "t1", "shortCode": "QX7K2" } } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let form = SaleForm {
        short_code: Some("QX7K2".to_string()),
        tag: Some("t1".to_string()),
        owner: Some("own-3".to_string()),
        sale_amount: 499.0,
        ..SaleForm::default()
    };

    let sale = SaleClient::new(api).create_tag_sale(ctx(), &form).await.unwrap();
    assert_eq!(sale.id.as_deref(), Some("s1"));
}

#[tokio::test]
async fn withdrawal_over_balance_is_refused() {
    let (server, api) = backend().await;
    let form = WithdrawForm {
        amount: 900.0,
        note: None,
    };

    let err = WalletClient::new(api)
        .request_withdrawal(ctx(), &form, Some(250.0))
        .await
        .unwrap_err();

    assert!(err.user_message().contains("250.00"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn dashboard_falls_back_when_backend_fails() {
    let (server, api) = backend().await;
    Mock::given(method("GET"))
        .and(path("/admin/dashboard/summary"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let summary = DashboardClient::new(api).summary(ctx()).await;
    assert!(summary.uses_fallback);
    assert!(summary.total_tags > 0);
}

#[tokio::test]
async fn activation_wizard_runs_both_steps() {
    let (server, api) = backend().await;
    Mock::given(method("POST"))
        .and(path("/tags/activation/request-otp"))
        .and(body_partial_json(json!({ "shortCode": "QX7K2", "phone": "9876543210" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "OTP sent",
            "data": { "expiresAt": "2024-03-01T10:05:00Z" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/tags/activation/confirm"))
        .and(body_partial_json(json!({
            "shortCode": "QX7K2",
            "phone": "9876543210",
            "otp": "123456",
            "vehicleNumber": "KA01AB1234"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "tag": { "_id": "t1", "shortCode": "QX7K2", "status": "activated" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = TagClient::new(api);
    let mut wizard = ActivationWizard::new("QX7K2");

    wizard
        .request_otp(&client, ctx(), &RequestOtpForm { phone: "9876543210".into() })
        .await
        .unwrap();
    assert_eq!(wizard.step, ActivationStep::ConfirmActivation);
    assert_eq!(wizard.phone.as_deref(), Some("9876543210"));

    let form = ConfirmActivationForm {
        otp: "123456".into(),
        full_name: "Meera Nair".into(),
        vehicle_number: "ka01ab1234".into(),
        vehicle_type: "car".into(),
        ..ConfirmActivationForm::default()
    };
    let tag = wizard.confirm(&client, ctx(), &form).await.unwrap();

    assert_eq!(tag.status, TagStatus::Activated);
    assert_eq!(wizard.step, ActivationStep::RequestOtp);
    assert!(wizard.phone.is_none());
}

#[tokio::test]
async fn failed_confirmation_keeps_the_phone() {
    let (server, api) = backend().await;
    Mock::given(method("POST"))
        .and(path("/tags/activation/request-otp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "OTP sent" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/tags/activation/confirm"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Invalid OTP" })),
        )
        .mount(&server)
        .await;

    let client = TagClient::new(api);
    let mut wizard = ActivationWizard::new("QX7K2");
    wizard
        .request_otp(&client, ctx(), &RequestOtpForm { phone: "9876543210".into() })
        .await
        .unwrap();

    let form = ConfirmActivationForm {
        otp: "000000".into(),
        full_name: "Meera Nair".into(),
        vehicle_number: "KA01AB1234".into(),
        vehicle_type: "car".into(),
        ..ConfirmActivationForm::default()
    };
    let err = wizard.confirm(&client, ctx(), &form).await.unwrap_err();

    assert_eq!(err.user_message(), "Invalid OTP");
    assert_eq!(wizard.step, ActivationStep::ConfirmActivation);
    assert_eq!(wizard.phone.as_deref(), Some("9876543210"));
}

#[tokio::test]
async fn nan_commission_rate_is_rejected_locally() {
    let (server, api) = backend().await;
    let form: NewPartnerForm = serde_urlencoded::from_str(
        "name=Ravi+Kumar&email=ravi%40example.com&phone=9876543210&commissionRate=NaN",
    )
    .unwrap();
    assert!(form.commission_rate.is_nan());

    let err = PartnerClient::new(api)
        .create_partner(ctx(), &form)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Validation(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn nan_withdrawal_is_rejected_locally() {
    let (server, api) = backend().await;
    let form: WithdrawForm = serde_urlencoded::from_str("amount=NaN").unwrap();

    let err = WalletClient::new(api)
        .request_withdrawal(ctx(), &form, Some(100.0))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Validation(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn reserved_characters_stay_inside_the_short_code_segment() {
    let (server, api) = backend().await;
    Mock::given(method("GET"))
        .and(path("/tags/verify/ABC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "_id": "t-abc", "shortCode": "ABC" }
        })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tags/verify/ABC%3FX9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Tag not found" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = TagClient::new(api);
    let err = client
        .verify_tag_by_short_code(ctx(), "ABC?X9")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = client.verify_tag_by_short_code(ctx(), "..").await.unwrap_err();
    assert!(matches!(err, ApiError::Precondition(_)));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
