//! End-to-end requests through the full router and session layer.

mod common;

use axum::http::{header, Request, StatusCode};
use common::{backend, body_text, get, mock_admin_login, post_form, router, sign_in};
use serde_json::json;
use tower::util::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn health_check_works() {
    let (_server, api) = backend().await;
    let app = router(api);

    let response = get(&app, "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_text(response).await, "OK");
}

#[tokio::test]
async fn protected_pages_redirect_to_login() {
    let (server, api) = backend().await;
    let app = router(api);

    let response = get(&app, "/dashboard", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn htmx_requests_get_hx_redirect() {
    let (_server, api) = backend().await;
    let app = router(api);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/sales/verify-tag?shortCode=QX7K2")
                .header("hx-request", "true")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["hx-redirect"], "/login");
}

#[tokio::test]
async fn bad_credentials_rerender_login() {
    let (server, api) = backend().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "nope" })))
        .mount(&server)
        .await;
    let app = router(api);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(axum::body::Body::from("email=ops%40example.com&password=wrong"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("Invalid email or password"));
    assert!(html.contains("ops@example.com"));
}

#[tokio::test]
async fn dashboard_renders_fallback_after_login() {
    let (server, api) = backend().await;
    mock_admin_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/admin/dashboard/summary"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let app = router(api);

    let cookie = sign_in(&app).await;
    let response = get(&app, "/dashboard", Some(cookie.as_str())).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    let html = body_text(response).await;
    assert!(html.contains("Asha Rao"));
    assert!(html.contains("Signed in"));
    assert!(html.contains("Live figures are unavailable"));
}

#[tokio::test]
async fn short_code_verification_fragment() {
    let (server, api) = backend().await;
    mock_admin_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/tags/verify/QX7K2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "_id": "t1",
                "status": "assigned",
                "assignedTo": "aff-9",
                "ownerAssignedTo": { "_id": "own-3", "name": "Meera" }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let app = router(api);
    let cookie = sign_in(&app).await;

    // Too short: hint only, no lookup.
    let response = get(&app, "/sales/verify-tag?shortCode=QX", Some(cookie.as_str())).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("at least 3 characters"));

    let response = get(&app, "/sales/verify-tag?shortCode=QX7K2", Some(cookie.as_str())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"name="tag" value="t1""#));
    assert!(html.contains(r#"name="owner" value="own-3""#));
    assert!(html.contains(r#"value="aff-9""#));

    // Same code again: nothing new to show.
    let response = get(&app, "/sales/verify-tag?shortCode=QX7K2", Some(cookie.as_str())).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn unknown_short_code_reports_not_found() {
    let (server, api) = backend().await;
    mock_admin_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/tags/verify/NOPE1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": null })))
        .mount(&server)
        .await;
    let app = router(api);
    let cookie = sign_in(&app).await;

    let response = get(&app, "/sales/verify-tag?shortCode=NOPE1", Some(cookie.as_str())).await;
    assert!(body_text(response).await.contains("Tag not found"));

    let response = get(&app, "/api/tags/verify/NOPE1", Some(cookie.as_str())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn creating_a_sale_without_verification_shows_the_error() {
    let (server, api) = backend().await;
    mock_admin_login(&server).await;
    let app = router(api);
    let cookie = sign_in(&app).await;
    let before = server.received_requests().await.unwrap().len();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/sales")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(axum::body::Body::from("shortCode=QX7K2&saleAmount=499&owner=own-3"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Please verify the tag short code before creating a sale"));
    assert_eq!(server.received_requests().await.unwrap().len(), before);
}

#[tokio::test]
async fn failed_activation_keeps_the_typed_details() {
    let (server, api) = backend().await;
    mock_admin_login(&server).await;
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
        .expect(1)
        .mount(&server)
        .await;
    let app = router(api);
    let cookie = sign_in(&app).await;

    let response = post_form(&app, "/tags/QX7K2/activate/otp", &cookie, "phone=9876543210").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = post_form(
        &app,
        "/tags/QX7K2/activate/confirm",
        &cookie,
        "otp=000000&fullName=Meera+Nair&vehicleNumber=KA01AB1234&vehicleType=bike&city=Kochi&sms=on",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Invalid OTP"));
    assert!(html.contains(r#"value="Meera Nair""#));
    assert!(html.contains(r#"value="KA01AB1234""#));
    assert!(html.contains(r#"value="Kochi""#));
    assert!(html.contains(r#"<option value="bike" selected>"#));
    assert!(html.contains("9876543210"));
}

#[tokio::test]
async fn failed_sale_update_keeps_the_edits() {
    let (server, api) = backend().await;
    mock_admin_login(&server).await;
    Mock::given(method("PATCH"))
        .and(path("/tag-sales/s1"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Sale is locked" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let app = router(api);
    let cookie = sign_in(&app).await;

    let response = post_form(
        &app,
        "/sales/s1",
        &cookie,
        "shortCode=QX7K2&tag=t1&owner=own-3&saleAmount=750&message=Paid+at+the+kiosk",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Sale is locked"));
    assert!(html.contains("Paid at the kiosk"));
    assert!(html.contains(r#"action="/sales/s1""#));
}

#[tokio::test]
async fn ids_in_links_are_percent_encoded() {
    let (server, api) = backend().await;
    mock_admin_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/tags/activation/request-otp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "OTP sent" })))
        .mount(&server)
        .await;
    let app = router(api);
    let cookie = sign_in(&app).await;

    let response = post_form(&app, "/tags/AB%3FC9/activate/otp", &cookie, "phone=9876543210").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/tags/AB%3FC9/activate"
    );
}
