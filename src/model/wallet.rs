//! Wallet ledger entries and the refund summary returned to callers.

use super::{SessionId, TransactionId, WalletId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of ledger movement. All kinds flow through the same apply path;
/// the type is a label, the sign of the amount is what matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Refund,
    Freeze,
    Unfreeze,
}

/// Entry status. `Compensated` marks an entry whose effect was reversed by
/// a later compensating entry; the ledger itself stays append-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Completed,
    Compensated,
}

/// Wallet lifecycle. Only `Active` wallets accept ledger movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletStatus {
    Active,
    Frozen,
    Closed,
}

/// Immutable ledger entry. The wallet's current balance is always the
/// `balance_after` of its most recent entry, never stored independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: TransactionId,
    pub wallet_id: WalletId,
    /// Signed movement; credits positive, debits negative.
    pub amount: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub transaction_type: TransactionType,
    /// The session/booking (or external event) that caused this entry.
    pub reference_id: String,
    /// Present when the entry was applied through the idempotent path.
    pub idempotency_key: Option<String>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl WalletTransaction {
    /// Ledger arithmetic invariant for this entry.
    pub fn is_balanced(&self) -> bool {
        self.balance_after == self.balance_before + self.amount
    }
}

/// How a refund is paid out. Wallet credit is the only method in this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundMethod {
    WalletCredit,
}

/// Outcome of a cancellation, returned to the caller. Derived from the
/// verdict and the ledger entry; not separately persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRecord {
    pub booking_id: SessionId,
    pub original_amount: Decimal,
    pub refund_amount: Decimal,
    pub refund_method: RefundMethod,
    pub is_auto_approved: bool,
    pub processed_at: DateTime<Utc>,
}
