pub mod dashboard;
pub mod pagination;
pub mod partner;
pub mod sale;
pub mod tag;
pub mod user;
pub mod wallet;

pub use dashboard::{normalize_dashboard, DashboardSummary, MonthlyRevenue};
pub use pagination::{normalize_pagination, Pagination};
pub use partner::{
    normalize_partner, AffiliatePartner, PartnerListResponse, PartnerStats, PartnerStatus,
};
pub use sale::{
    normalize_sale, PartyRef, PaymentStatus, SaleListResponse, SaleTagRef, TagSale,
    VerificationStatus,
};
pub use tag::{
    normalize_tag_item, AffiliateRef, NotificationPreferences, OwnerAssignment, TagItem,
    TagListResponse, TagStatus, TagVerifyResult,
};
pub use user::{AuthUser, Role, UserProfile};
pub use wallet::{
    normalize_transaction, normalize_wallet_summary, TransactionKind, TransactionStatus,
    WalletSummary, WalletTransaction,
};
