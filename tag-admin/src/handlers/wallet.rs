use askama::Template;
use axum::{
    extract::{rejection::FormRejection, Path, Query, State},
    response::{IntoResponse, Redirect},
    Form,
};
use serde::{Deserialize, Serialize};

use super::{rejected_form_error, Chrome, Page, Pager, SelectOption};
use crate::dtos::wallet::{ManualCreditForm, TransactionStatusForm, WithdrawForm};
use crate::models::{Pagination, TransactionStatus, WalletSummary, WalletTransaction};
use crate::services::wallet_client::WalletFilters;
use crate::utils::format;
use crate::AppState;

const KINDS: [&str; 2] = ["credit", "debit"];
const STATUSES: [&str; 3] = ["pending", "completed", "cancelled"];

/// Wallet page query. Admins may pass `user` to inspect another wallet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletQuery {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
}

impl WalletQuery {
    fn filters(&self) -> WalletFilters {
        WalletFilters {
            kind: self.kind.clone(),
            status: self.status.clone(),
            page: self.page,
            limit: None,
        }
    }
}

pub struct TransactionRow {
    pub id: String,
    pub kind: String,
    pub amount: String,
    pub status: String,
    pub status_label: String,
    pub balance: String,
    pub description: String,
    pub created_at: String,
    pub can_settle: bool,
}

impl TransactionRow {
    fn from_transaction(tx: &WalletTransaction) -> Self {
        let status = tx.status.map(|s| s.as_str()).unwrap_or("unknown");
        Self {
            id: tx.id.clone().unwrap_or_default(),
            kind: tx
                .kind
                .map(|k| format::label(k.as_str()))
                .unwrap_or_else(|| format::PLACEHOLDER.to_string()),
            amount: format::currency(tx.amount),
            status: status.to_string(),
            status_label: format::label(status),
            balance: format::currency(tx.balance_snapshot),
            description: format::text(tx.description.as_deref()),
            created_at: format::date_time(tx.created_at),
            can_settle: tx.id.is_some() && tx.is_pending(),
        }
    }
}

#[derive(Template)]
#[template(path = "pages/wallet.html")]
pub struct WalletTemplate {
    pub chrome: Chrome,
    /// Wallet owner when an admin views someone else's wallet.
    pub viewed_user: String,
    pub available_balance: String,
    pub pending_commission: String,
    pub completed_commission: String,
    pub total_withdrawn: String,
    pub kind_options: Vec<SelectOption>,
    pub status_options: Vec<SelectOption>,
    pub rows: Vec<TransactionRow>,
    pub pager: Pager,
    pub error: Option<String>,
}

fn wallet_url(user: Option<&str>) -> String {
    match user {
        Some(user) => format!("/wallet?user={}", urlencoding::encode(user)),
        None => "/wallet".to_string(),
    }
}

pub async fn wallet_page(
    State(state): State<AppState>,
    page: Page,
    Query(query): Query<WalletQuery>,
) -> impl IntoResponse {
    let viewed_user = query
        .user
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty() && page.is_admin())
        .map(str::to_string);
    let filters = query.filters();

    let result = match viewed_user.as_deref() {
        Some(user_id) => {
            state
                .wallet_client
                .get_wallet_by_user(page.call(), user_id, &filters)
                .await
        }
        None => {
            state
                .wallet_client
                .get_my_wallet(page.call(), &filters)
                .await
        }
    };

    let (summary, error) = match result {
        Ok(summary) => (summary, None),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load wallet");
            (WalletSummary::default(), Some(e.user_message()))
        }
    };
    let pagination: &Pagination = &summary.pagination;

    WalletTemplate {
        chrome: page.chrome("wallet").await,
        viewed_user: viewed_user.clone().unwrap_or_default(),
        available_balance: format::currency(summary.available_balance),
        pending_commission: format::currency(summary.pending_commission),
        completed_commission: format::currency(summary.completed_commission),
        total_withdrawn: format::currency(summary.total_withdrawn),
        kind_options: SelectOption::list(KINDS, query.kind.as_deref()),
        status_options: SelectOption::list(STATUSES, query.status.as_deref()),
        rows: summary
            .transactions
            .iter()
            .map(TransactionRow::from_transaction)
            .collect(),
        pager: Pager::new(
            "/wallet",
            &WalletQuery {
                user: viewed_user,
                ..query
            },
            pagination,
        ),
        error,
    }
}

pub async fn request_withdrawal(
    State(state): State<AppState>,
    page: Page,
    form: Result<Form<WithdrawForm>, FormRejection>,
) -> impl IntoResponse {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            page.failure(&rejected_form_error(rejection)).await;
            return Redirect::to("/wallet");
        }
    };

    // Balance check happens locally when the wallet can be read.
    let available = match state
        .wallet_client
        .get_my_wallet(page.call(), &WalletFilters::default())
        .await
    {
        Ok(summary) => summary.available_balance,
        Err(e) => {
            tracing::warn!(error = %e, "Balance unavailable, deferring check to backend");
            None
        }
    };

    match state
        .wallet_client
        .request_withdrawal(page.call(), &form, available)
        .await
    {
        Ok(_) => page.success("Withdrawal requested").await,
        Err(e) => page.failure(&e).await,
    }
    Redirect::to("/wallet")
}

pub async fn manual_credit(
    State(state): State<AppState>,
    page: Page,
    form: Result<Form<ManualCreditForm>, FormRejection>,
) -> impl IntoResponse {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            page.failure(&rejected_form_error(rejection)).await;
            return Redirect::to("/wallet");
        }
    };
    let target = wallet_url(Some(form.user_id.trim()).filter(|u| !u.is_empty()));

    match state.wallet_client.manual_credit(page.call(), &form).await {
        Ok(_) => {
            page.success(format!(
                "Credited {} to the wallet",
                format::currency(Some(form.amount))
            ))
            .await
        }
        Err(e) => page.failure(&e).await,
    }
    Redirect::to(&target)
}

pub async fn update_transaction_status(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
    page: Page,
    Form(form): Form<TransactionStatusForm>,
) -> impl IntoResponse {
    let target = wallet_url(form.user.as_deref());

    let Some(next) = TransactionStatus::parse(&form.status) else {
        page.failure(&crate::services::ApiError::precondition(format!(
            "Unknown transaction status {}",
            form.status
        )))
        .await;
        return Redirect::to(&target);
    };
    let current = form.current.as_deref().and_then(TransactionStatus::parse);

    match state
        .wallet_client
        .update_transaction_status(page.call(), &transaction_id, current, next)
        .await
    {
        Ok(_) => page.success(format!("Transaction marked {}", next)).await,
        Err(e) => page.failure(&e).await,
    }
    Redirect::to(&target)
}
