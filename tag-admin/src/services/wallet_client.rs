use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use super::api_client::{ApiClient, CallContext};
use super::error::ApiError;
use super::params::{path_segment, sanitize_params};
use crate::dtos::wallet::{ManualCreditForm, WithdrawForm};
use crate::models::{
    normalize_transaction, normalize_wallet_summary, TransactionStatus, WalletSummary,
    WalletTransaction,
};
use crate::normalize::{pick_object, unwrap_data};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletFilters {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

fn transaction_from_response(value: serde_json::Value) -> WalletTransaction {
    let value = unwrap_data(value);
    let inner = value
        .as_object()
        .and_then(|obj| pick_object(obj, &["transaction"]))
        .map(|o| serde_json::Value::Object(o.clone()));
    normalize_transaction(inner.as_ref().unwrap_or(&value))
}

pub struct WalletClient {
    api: Arc<ApiClient>,
}

impl WalletClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    fn query(&self, filters: &WalletFilters) -> Vec<(String, String)> {
        let mut filters = filters.clone();
        filters.limit = filters.limit.or(Some(self.api.page_size()));
        sanitize_params(&filters)
    }

    /// Wallet of the signed-in operator.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_my_wallet(
        &self,
        ctx: CallContext<'_>,
        filters: &WalletFilters,
    ) -> Result<WalletSummary, ApiError> {
        let body = self
            .api
            .get(ctx, "/wallet/me", "/wallet/me", &self.query(filters))
            .await?;
        Ok(normalize_wallet_summary(body))
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_wallet_by_user(
        &self,
        ctx: CallContext<'_>,
        user_id: &str,
        filters: &WalletFilters,
    ) -> Result<WalletSummary, ApiError> {
        let body = self
            .api
            .get(
                ctx,
                "/wallet/user/:userId",
                &format!("/wallet/user/{}", path_segment(user_id)?),
                &self.query(filters),
            )
            .await?;
        let mut summary = normalize_wallet_summary(body);
        summary.user_id.get_or_insert_with(|| user_id.to_string());
        Ok(summary)
    }

    /// `available` is the balance shown to the operator, when known; asking
    /// for more than that is refused locally.
    #[tracing::instrument(skip(self, ctx, form), fields(amount = form.amount))]
    pub async fn request_withdrawal(
        &self,
        ctx: CallContext<'_>,
        form: &WithdrawForm,
        available: Option<f64>,
    ) -> Result<WalletTransaction, ApiError> {
        form.validate()?;
        if let Some(available) = available {
            if form.amount > available {
                return Err(ApiError::precondition(format!(
                    "Withdrawal exceeds the available balance of {:.2}",
                    available
                )));
            }
        }

        let body = self
            .api
            .post(ctx, "/wallet/withdraw", "/wallet/withdraw", &form.payload())
            .await?;
        Ok(transaction_from_response(body))
    }

    #[tracing::instrument(skip(self, ctx, form), fields(user_id = %form.user_id, amount = form.amount))]
    pub async fn manual_credit(
        &self,
        ctx: CallContext<'_>,
        form: &ManualCreditForm,
    ) -> Result<WalletTransaction, ApiError> {
        form.validate()?;

        let body = self
            .api
            .post(
                ctx,
                "/wallet/manual-credit",
                "/wallet/manual-credit",
                &form.payload(),
            )
            .await?;
        let transaction = transaction_from_response(body);
        tracing::info!(transaction_id = ?transaction.id, "Manual credit recorded");
        Ok(transaction)
    }

    /// Settles a pending ledger entry. Amounts are never changed.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn update_transaction_status(
        &self,
        ctx: CallContext<'_>,
        transaction_id: &str,
        current: Option<TransactionStatus>,
        next: TransactionStatus,
    ) -> Result<WalletTransaction, ApiError> {
        if let Some(current) = current {
            if !current.can_transition_to(next) {
                return Err(ApiError::precondition(format!(
                    "A {} transaction cannot be marked {}",
                    current, next
                )));
            }
        }

        let body = self
            .api
            .patch(
                ctx,
                "/wallet/transactions/:id/status",
                &format!("/wallet/transactions/{}/status", path_segment(transaction_id)?),
                &serde_json::json!({ "status": next }),
            )
            .await?;
        Ok(transaction_from_response(body))
    }
}
