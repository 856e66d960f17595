use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::middleware::{request_id_middleware, security_headers_middleware};
use service_core::observability::REQUEST_ID_HEADER;
use time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::ServerSettings;
use crate::handlers::{
    activation,
    app::{health_check, index},
    auth::{login_handler, login_page, logout_handler},
    dashboard::dashboard_handler,
    partners, sales, tags, wallet,
};
use crate::middleware::auth::auth_middleware;
use crate::services::metrics::http_metrics_middleware;
use crate::AppState;

/// Pages that require a signed-in operator.
fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard_handler))
        // Tags and the activation wizard
        .route("/tags", get(tags::list_tags))
        .route("/tags/generate", post(tags::generate_tags))
        .route("/tags/:id/status", post(tags::update_tag_status))
        .route("/tags/:id/activate", get(activation::activation_page))
        .route("/tags/:id/activate/otp", post(activation::request_otp))
        .route("/tags/:id/activate/confirm", post(activation::confirm_activation))
        .route("/tags/:id/activate/back", post(activation::back))
        .route("/tags/:id/activate/cancel", post(activation::cancel))
        // Affiliate partners
        .route(
            "/partners",
            get(partners::list_partners).post(partners::create_partner),
        )
        .route("/partners/new", get(partners::new_partner_page))
        .route(
            "/partners/:id",
            get(partners::partner_detail).post(partners::update_partner),
        )
        .route("/partners/:id/edit", get(partners::edit_partner_page))
        .route("/partners/:id/delete", post(partners::delete_partner))
        // Tag sales
        .route("/sales", get(sales::list_sales).post(sales::create_sale))
        .route("/sales/new", get(sales::new_sale_page))
        .route("/sales/verify-tag", get(sales::verify_tag_fragment))
        .route("/sales/:id", get(sales::sale_detail).post(sales::update_sale))
        .route("/sales/:id/edit", get(sales::edit_sale_page))
        .route("/sales/:id/delete", post(sales::delete_sale))
        .route("/api/tags/verify/:short_code", get(sales::verify_tag_json))
        // Wallet
        .route("/wallet", get(wallet::wallet_page))
        .route("/wallet/withdraw", post(wallet::request_withdrawal))
        .route("/wallet/credit", post(wallet::manual_credit))
        .route(
            "/wallet/transactions/:id/status",
            post(wallet::update_transaction_status),
        )
        .route_layer(from_fn(auth_middleware))
}

pub fn build_router(state: AppState, server: &ServerSettings) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(server.secure_cookies)
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(crate::handlers::metrics::metrics))
        .route("/login", get(login_page).post(login_handler))
        .route("/logout", get(logout_handler).post(logout_handler))
        .merge(protected_routes())
        // route_layer so the matched path is known when recording metrics
        .route_layer(from_fn(http_metrics_middleware))
        .nest_service("/static", ServeDir::new(&server.static_dir))
        .layer(session_layer)
        .layer(CompressionLayer::new())
        .layer(from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
