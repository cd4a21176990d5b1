//! Append-only wallet ledger with atomic apply/compensate operations.
//!
//! The wallet balance is never stored on its own: it is always the
//! `balance_after` of the newest entry. Every mutation is a read-modify-
//! append performed under the store's write lock, so concurrent movements
//! on one wallet cannot interleave. Refund application goes through the
//! idempotent path keyed on the booking id, which makes a retried
//! cancellation a no-op instead of a double credit.

use crate::clock::Clock;
use crate::error::{RebookError, Result};
use crate::model::{
    TransactionId, TransactionStatus, TransactionType, WalletId, WalletStatus, WalletTransaction,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Trait for the money ledger backing user balances.
#[async_trait]
pub trait WalletLedger: Send + Sync {
    /// Register a wallet as active with an empty ledger.
    async fn open(&self, wallet_id: WalletId) -> Result<()>;

    /// Change a wallet's lifecycle status (admin freeze/close).
    async fn set_status(&self, wallet_id: &WalletId, status: WalletStatus) -> Result<()>;

    /// Append one movement. Debits that would take the balance negative fail
    /// with `InsufficientFunds`.
    async fn apply(
        &self,
        wallet_id: &WalletId,
        amount: Decimal,
        transaction_type: TransactionType,
        reference_id: &str,
    ) -> Result<WalletTransaction>;

    /// Append one movement at most once per idempotency key. Re-application
    /// with the same key returns the original entry without appending.
    async fn apply_idempotent(
        &self,
        wallet_id: &WalletId,
        amount: Decimal,
        transaction_type: TransactionType,
        reference_id: &str,
        idempotency_key: &str,
    ) -> Result<WalletTransaction>;

    /// Reverse a previous entry by appending its negation. The original entry
    /// is marked compensated; compensating twice fails.
    async fn compensate(
        &self,
        wallet_id: &WalletId,
        transaction_id: &TransactionId,
    ) -> Result<WalletTransaction>;

    /// Current balance: the `balance_after` of the latest entry, or zero for
    /// a freshly opened wallet.
    async fn balance(&self, wallet_id: &WalletId) -> Result<Decimal>;

    /// Full ledger listing, oldest first.
    async fn transactions(&self, wallet_id: &WalletId) -> Result<Vec<WalletTransaction>>;
}

struct WalletAccount {
    status: WalletStatus,
    entries: Vec<WalletTransaction>,
    by_idempotency_key: HashMap<String, usize>,
}

impl WalletAccount {
    fn new() -> Self {
        Self {
            status: WalletStatus::Active,
            entries: Vec::new(),
            by_idempotency_key: HashMap::new(),
        }
    }

    fn balance(&self) -> Decimal {
        self.entries
            .last()
            .map(|entry| entry.balance_after)
            .unwrap_or(Decimal::ZERO)
    }
}

/// In-memory wallet ledger.
pub struct InMemoryWalletLedger {
    wallets: RwLock<HashMap<WalletId, WalletAccount>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryWalletLedger {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            wallets: RwLock::new(HashMap::new()),
            clock,
        }
    }

    fn append_entry(
        &self,
        wallet_id: &WalletId,
        account: &mut WalletAccount,
        amount: Decimal,
        transaction_type: TransactionType,
        reference_id: &str,
        idempotency_key: Option<&str>,
    ) -> Result<WalletTransaction> {
        let balance_before = account.balance();
        if amount < Decimal::ZERO && balance_before + amount < Decimal::ZERO {
            return Err(RebookError::InsufficientFunds {
                wallet_id: wallet_id.clone(),
                balance: balance_before,
                requested: amount,
            });
        }

        let entry = WalletTransaction {
            id: TransactionId::new(),
            wallet_id: wallet_id.clone(),
            amount,
            balance_before,
            balance_after: balance_before + amount,
            transaction_type,
            reference_id: reference_id.to_string(),
            idempotency_key: idempotency_key.map(str::to_string),
            status: TransactionStatus::Completed,
            created_at: self.clock.now(),
        };
        debug!(
            wallet = %wallet_id,
            amount = %amount,
            balance_after = %entry.balance_after,
            kind = ?transaction_type,
            reference = reference_id,
            "ledger append"
        );
        if let Some(key) = idempotency_key {
            account
                .by_idempotency_key
                .insert(key.to_string(), account.entries.len());
        }
        account.entries.push(entry.clone());
        Ok(entry)
    }
}

fn active_account<'a>(
    wallets: &'a mut HashMap<WalletId, WalletAccount>,
    wallet_id: &WalletId,
) -> Result<&'a mut WalletAccount> {
    let account = wallets
        .get_mut(wallet_id)
        .ok_or_else(|| RebookError::WalletNotFound {
            wallet: wallet_id.to_string(),
        })?;
    if account.status != WalletStatus::Active {
        return Err(RebookError::WalletNotFound {
            wallet: wallet_id.to_string(),
        });
    }
    Ok(account)
}

#[async_trait]
impl WalletLedger for InMemoryWalletLedger {
    async fn open(&self, wallet_id: WalletId) -> Result<()> {
        let mut wallets = self.wallets.write().await;
        wallets.entry(wallet_id).or_insert_with(WalletAccount::new);
        Ok(())
    }

    async fn set_status(&self, wallet_id: &WalletId, status: WalletStatus) -> Result<()> {
        let mut wallets = self.wallets.write().await;
        let account = wallets
            .get_mut(wallet_id)
            .ok_or_else(|| RebookError::WalletNotFound {
                wallet: wallet_id.to_string(),
            })?;
        info!(wallet = %wallet_id, status = ?status, "wallet status change");
        account.status = status;
        Ok(())
    }

    async fn apply(
        &self,
        wallet_id: &WalletId,
        amount: Decimal,
        transaction_type: TransactionType,
        reference_id: &str,
    ) -> Result<WalletTransaction> {
        let mut wallets = self.wallets.write().await;
        let account = active_account(&mut wallets, wallet_id)?;
        self.append_entry(wallet_id, account, amount, transaction_type, reference_id, None)
    }

    async fn apply_idempotent(
        &self,
        wallet_id: &WalletId,
        amount: Decimal,
        transaction_type: TransactionType,
        reference_id: &str,
        idempotency_key: &str,
    ) -> Result<WalletTransaction> {
        let mut wallets = self.wallets.write().await;
        let account = active_account(&mut wallets, wallet_id)?;
        if let Some(&index) = account.by_idempotency_key.get(idempotency_key) {
            debug!(
                wallet = %wallet_id,
                key = idempotency_key,
                "idempotent replay, returning original entry"
            );
            return Ok(account.entries[index].clone());
        }
        self.append_entry(
            wallet_id,
            account,
            amount,
            transaction_type,
            reference_id,
            Some(idempotency_key),
        )
    }

    async fn compensate(
        &self,
        wallet_id: &WalletId,
        transaction_id: &TransactionId,
    ) -> Result<WalletTransaction> {
        let mut wallets = self.wallets.write().await;
        let account = active_account(&mut wallets, wallet_id)?;

        let index = account
            .entries
            .iter()
            .position(|entry| &entry.id == transaction_id)
            .ok_or_else(|| RebookError::TransactionNotFound {
                wallet_id: wallet_id.clone(),
                transaction_id: transaction_id.to_string(),
            })?;
        if account.entries[index].status == TransactionStatus::Compensated {
            return Err(RebookError::AlreadyCompensated {
                transaction_id: transaction_id.to_string(),
            });
        }

        let (amount, transaction_type, reference_id) = {
            let original = &account.entries[index];
            (-original.amount, original.transaction_type, original.reference_id.clone())
        };
        let reversal = self.append_entry(
            wallet_id,
            account,
            amount,
            transaction_type,
            &reference_id,
            None,
        )?;
        account.entries[index].status = TransactionStatus::Compensated;
        info!(wallet = %wallet_id, original = %transaction_id, "ledger entry compensated");
        Ok(reversal)
    }

    async fn balance(&self, wallet_id: &WalletId) -> Result<Decimal> {
        let wallets = self.wallets.read().await;
        let account = wallets
            .get(wallet_id)
            .ok_or_else(|| RebookError::WalletNotFound {
                wallet: wallet_id.to_string(),
            })?;
        Ok(account.balance())
    }

    async fn transactions(&self, wallet_id: &WalletId) -> Result<Vec<WalletTransaction>> {
        let wallets = self.wallets.read().await;
        let account = wallets
            .get(wallet_id)
            .ok_or_else(|| RebookError::WalletNotFound {
                wallet: wallet_id.to_string(),
            })?;
        Ok(account.entries.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn ledger() -> InMemoryWalletLedger {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        ));
        InMemoryWalletLedger::new(clock)
    }

    #[tokio::test]
    async fn every_entry_is_balanced() {
        let ledger = ledger();
        let wallet = WalletId::from_string("wallet-1");
        ledger.open(wallet.clone()).await.unwrap();

        ledger
            .apply(&wallet, dec!(100), TransactionType::Deposit, "topup-1")
            .await
            .unwrap();
        ledger
            .apply(&wallet, dec!(-30), TransactionType::Withdrawal, "purchase-1")
            .await
            .unwrap();
        ledger
            .apply(&wallet, dec!(50), TransactionType::Refund, "booking-1")
            .await
            .unwrap();

        let entries = ledger.transactions(&wallet).await.unwrap();
        assert_eq!(entries.len(), 3);
        for entry in &entries {
            assert!(entry.is_balanced());
        }
        assert_eq!(ledger.balance(&wallet).await.unwrap(), dec!(120));
        assert_eq!(entries.last().unwrap().balance_after, dec!(120));
    }

    #[tokio::test]
    async fn fresh_wallet_has_zero_balance() {
        let ledger = ledger();
        let wallet = WalletId::from_string("wallet-1");
        ledger.open(wallet.clone()).await.unwrap();
        assert_eq!(ledger.balance(&wallet).await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn unknown_wallet_is_rejected() {
        let ledger = ledger();
        let wallet = WalletId::from_string("wallet-ghost");
        let err = ledger
            .apply(&wallet, dec!(10), TransactionType::Deposit, "topup-1")
            .await
            .unwrap_err();
        assert!(matches!(err, RebookError::WalletNotFound { .. }));
    }

    #[tokio::test]
    async fn frozen_wallet_rejects_movements() {
        let ledger = ledger();
        let wallet = WalletId::from_string("wallet-1");
        ledger.open(wallet.clone()).await.unwrap();
        ledger
            .set_status(&wallet, WalletStatus::Frozen)
            .await
            .unwrap();
        let err = ledger
            .apply(&wallet, dec!(10), TransactionType::Deposit, "topup-1")
            .await
            .unwrap_err();
        assert!(matches!(err, RebookError::WalletNotFound { .. }));
    }

    #[tokio::test]
    async fn overdraft_is_rejected() {
        let ledger = ledger();
        let wallet = WalletId::from_string("wallet-1");
        ledger.open(wallet.clone()).await.unwrap();
        ledger
            .apply(&wallet, dec!(20), TransactionType::Deposit, "topup-1")
            .await
            .unwrap();

        let err = ledger
            .apply(&wallet, dec!(-25), TransactionType::Withdrawal, "purchase-1")
            .await
            .unwrap_err();
        assert!(matches!(err, RebookError::InsufficientFunds { .. }));
        // Failed debit leaves no trace.
        assert_eq!(ledger.transactions(&wallet).await.unwrap().len(), 1);
        assert_eq!(ledger.balance(&wallet).await.unwrap(), dec!(20));
    }

    #[tokio::test]
    async fn idempotent_replay_returns_the_original_entry() {
        let ledger = ledger();
        let wallet = WalletId::from_string("wallet-1");
        ledger.open(wallet.clone()).await.unwrap();

        let first = ledger
            .apply_idempotent(&wallet, dec!(50), TransactionType::Refund, "booking-1", "booking-1")
            .await
            .unwrap();
        let second = ledger
            .apply_idempotent(&wallet, dec!(50), TransactionType::Refund, "booking-1", "booking-1")
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(ledger.transactions(&wallet).await.unwrap().len(), 1);
        assert_eq!(ledger.balance(&wallet).await.unwrap(), dec!(50));
    }

    #[tokio::test]
    async fn compensation_reverses_exactly_once() {
        let ledger = ledger();
        let wallet = WalletId::from_string("wallet-1");
        ledger.open(wallet.clone()).await.unwrap();

        let deposit = ledger
            .apply(&wallet, dec!(80), TransactionType::Deposit, "topup-1")
            .await
            .unwrap();
        let reversal = ledger.compensate(&wallet, &deposit.id).await.unwrap();
        assert_eq!(reversal.amount, dec!(-80));
        assert_eq!(ledger.balance(&wallet).await.unwrap(), Decimal::ZERO);

        let err = ledger.compensate(&wallet, &deposit.id).await.unwrap_err();
        assert!(matches!(err, RebookError::AlreadyCompensated { .. }));
    }

    #[tokio::test]
    async fn concurrent_movements_do_not_interleave() {
        let ledger = Arc::new(ledger());
        let wallet = WalletId::from_string("wallet-1");
        ledger.open(wallet.clone()).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..20 {
            let ledger = Arc::clone(&ledger);
            let wallet = wallet.clone();
            handles.push(tokio::spawn(async move {
                ledger
                    .apply(
                        &wallet,
                        dec!(5),
                        TransactionType::Deposit,
                        &format!("topup-{i}"),
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let entries = ledger.transactions(&wallet).await.unwrap();
        assert_eq!(entries.len(), 20);
        for entry in &entries {
            assert!(entry.is_balanced());
        }
        assert_eq!(ledger.balance(&wallet).await.unwrap(), dec!(100));
    }
}
