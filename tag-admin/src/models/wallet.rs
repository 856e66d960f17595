use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::pagination::Pagination;
use crate::normalize::{
    pick, pick_array, pick_datetime, pick_f64, pick_object, pick_str, ref_id, unwrap_data, Object,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl TransactionKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "credit" | "commission" => Some(TransactionKind::Credit),
            "debit" | "withdrawal" => Some(TransactionKind::Debit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Credit => "credit",
            TransactionKind::Debit => "debit",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Cancelled,
}

impl TransactionStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(TransactionStatus::Pending),
            "completed" => Some(TransactionStatus::Completed),
            "cancelled" | "canceled" => Some(TransactionStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }

    /// Ledger entries are append-only: only a pending entry may settle.
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        matches!(
            (self, next),
            (
                TransactionStatus::Pending,
                TransactionStatus::Completed | TransactionStatus::Cancelled
            )
        )
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    pub id: Option<String>,
    pub kind: Option<TransactionKind>,
    pub amount: Option<f64>,
    pub status: Option<TransactionStatus>,
    pub balance_snapshot: Option<f64>,
    pub description: Option<String>,
    pub user_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Maps a raw ledger entry. Never fails.
pub fn normalize_transaction(raw: &Value) -> WalletTransaction {
    let empty = Object::new();
    let obj = raw.as_object().unwrap_or(&empty);

    WalletTransaction {
        id: pick_str(obj, &["_id", "id"]),
        kind: pick_str(obj, &["type", "kind", "transactionType"])
            .and_then(|s| TransactionKind::parse(&s)),
        amount: pick_f64(obj, &["amount"]),
        status: pick_str(obj, &["status"]).and_then(|s| TransactionStatus::parse(&s)),
        balance_snapshot: pick_f64(obj, &["balanceSnapshot", "balanceAfter", "balance"]),
        description: pick_str(obj, &["description", "note", "remarks"]),
        user_id: pick(obj, &["userId", "user"]).and_then(ref_id),
        created_at: pick_datetime(obj, &["createdAt", "date"]),
    }
}

impl WalletTransaction {
    pub fn is_pending(&self) -> bool {
        self.status == Some(TransactionStatus::Pending)
    }
}

/// Backend-computed projection of a partner's ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSummary {
    pub user_id: Option<String>,
    pub available_balance: Option<f64>,
    pub pending_commission: Option<f64>,
    pub completed_commission: Option<f64>,
    pub total_withdrawn: Option<f64>,
    pub transactions: Vec<WalletTransaction>,
    pub pagination: Pagination,
}

/// Accepts `{ wallet: {..}, transactions: [..] }` or a flat summary object.
pub fn normalize_wallet_summary(value: Value) -> WalletSummary {
    let value = unwrap_data(value);
    let empty = Object::new();
    let root = value.as_object().unwrap_or(&empty);
    let wallet = pick_object(root, &["wallet", "summary"]).unwrap_or(root);

    let transactions: Vec<WalletTransaction> = pick_array(root, &["transactions", "items"])
        .or_else(|| pick_array(wallet, &["transactions"]))
        .map(|items| items.iter().map(normalize_transaction).collect())
        .unwrap_or_default();
    let pagination = Pagination::from_response(root, transactions.len());

    WalletSummary {
        user_id: pick(wallet, &["userId", "user"]).and_then(ref_id),
        available_balance: pick_f64(wallet, &["availableBalance", "balance"]),
        pending_commission: pick_f64(wallet, &["pendingCommission", "pendingBalance"]),
        completed_commission: pick_f64(
            wallet,
            &["completedCommission", "totalEarned", "totalCommission"],
        ),
        total_withdrawn: pick_f64(wallet, &["totalWithdrawn", "withdrawn"]),
        transactions,
        pagination,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transaction_alternate_names() {
        let t = normalize_transaction(&json!({
            "_id": "w1",
            "type": "debit",
            "amount": 500,
            "status": "pending",
            "balanceAfter": 1500,
            "user": { "_id": "u1" }
        }));
        assert_eq!(t.kind, Some(TransactionKind::Debit));
        assert_eq!(t.balance_snapshot, Some(1500.0));
        assert_eq!(t.user_id.as_deref(), Some("u1"));
        assert!(t.is_pending());
    }

    #[test]
    fn only_pending_settles() {
        use TransactionStatus::*;
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn summary_nested_or_flat() {
        let nested = normalize_wallet_summary(json!({
            "data": {
                "wallet": { "balance": 1200, "pendingCommission": 300 },
                "transactions": [{ "_id": "w1", "amount": 10 }],
                "pagination": { "page": 1, "limit": 10, "total": 1, "totalPages": 1 }
            }
        }));
        assert_eq!(nested.available_balance, Some(1200.0));
        assert_eq!(nested.transactions.len(), 1);

        let flat = normalize_wallet_summary(json!({ "availableBalance": 50 }));
        assert_eq!(flat.available_balance, Some(50.0));
        assert!(flat.transactions.is_empty());

        let junk = normalize_wallet_summary(json!("oops"));
        assert_eq!(junk.available_balance, None);
    }
}
