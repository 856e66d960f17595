pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod normalize;
pub mod services;
pub mod startup;
pub mod utils;
pub mod workflows;

use services::{
    auth_client::AuthClient, dashboard_client::DashboardClient, partner_client::PartnerClient,
    sale_client::SaleClient, tag_client::TagClient, wallet_client::WalletClient, ApiClient,
};
use std::sync::Arc;
use workflows::LatestByKey;

/// Shared application state containing the backend clients.
#[derive(Clone)]
pub struct AppState {
    pub auth_client: Arc<AuthClient>,
    pub tag_client: Arc<TagClient>,
    pub partner_client: Arc<PartnerClient>,
    pub sale_client: Arc<SaleClient>,
    pub wallet_client: Arc<WalletClient>,
    pub dashboard_client: Arc<DashboardClient>,
    /// In-flight short-code lookups, one slot per operator.
    pub verifications: Arc<LatestByKey>,
}

impl AppState {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            auth_client: Arc::new(AuthClient::new(api.clone())),
            tag_client: Arc::new(TagClient::new(api.clone())),
            partner_client: Arc::new(PartnerClient::new(api.clone())),
            sale_client: Arc::new(SaleClient::new(api.clone())),
            wallet_client: Arc::new(WalletClient::new(api.clone())),
            dashboard_client: Arc::new(DashboardClient::new(api)),
            verifications: Arc::new(LatestByKey::new()),
        }
    }
}
