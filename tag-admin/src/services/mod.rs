pub mod api_client;
pub mod auth_client;
pub mod dashboard_client;
pub mod error;
pub mod metrics;
pub mod params;
pub mod partner_client;
pub mod sale_client;
pub mod tag_client;
pub mod wallet_client;

pub use api_client::{ApiClient, CallContext};
pub use error::ApiError;
