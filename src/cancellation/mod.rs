//! Booking cancellation orchestration: the engine's top-level entry point.
//!
//! A cancellation is evaluated by the policy, applied to the session status
//! machine, and — when auto-approved — credited back to the student's
//! wallet through the idempotent ledger path. Nothing is mutated before the
//! verdict and wallet resolution succeed, so a rejected request is never
//! partially applied. Concurrent cancels of one booking serialize on a
//! per-booking lock; a duplicate that still slips through is absorbed by
//! the ledger's idempotency key.

use crate::clock::Clock;
use crate::error::{RebookError, Result};
use crate::ledger::WalletLedger;
use crate::model::{RefundMethod, RefundRecord, SessionId, SessionStatus, TransactionType};
use crate::policy::{CancellationPolicy, RejectionReason};
use crate::ports::WalletAccountDirectory;
use crate::registry::SessionRegistry;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Orchestrates policy, registry, and ledger for a cancellation request.
pub struct BookingCancellationService {
    registry: Arc<dyn SessionRegistry>,
    ledger: Arc<dyn WalletLedger>,
    wallets: Arc<dyn WalletAccountDirectory>,
    policy: CancellationPolicy,
    clock: Arc<dyn Clock>,
    /// Per-booking serialization for concurrent cancel attempts.
    locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl BookingCancellationService {
    pub fn new(
        registry: Arc<dyn SessionRegistry>,
        ledger: Arc<dyn WalletLedger>,
        wallets: Arc<dyn WalletAccountDirectory>,
        policy: CancellationPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            ledger,
            wallets,
            policy,
            clock,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn booking_lock(&self, booking_id: &SessionId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(booking_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Cancel a booking, returning the refund summary.
    ///
    /// The booking id is also the refund reference and the idempotency key,
    /// so retrying a completed cancellation can never double-credit.
    pub async fn cancel(&self, booking_id: &SessionId, reason: &str) -> Result<RefundRecord> {
        let lock = self.booking_lock(booking_id).await;
        let _guard = lock.lock().await;

        let session = self.registry.get(booking_id).await?;
        let now = self.clock.now();
        let verdict = self.policy.evaluate(&session, now, reason);

        if !verdict.allowed {
            return Err(match verdict.rejection {
                Some(RejectionReason::ReasonRequired) => RebookError::ReasonRequired {
                    session_id: booking_id.clone(),
                },
                Some(RejectionReason::AlreadyElapsed) => RebookError::AlreadyElapsed {
                    session_id: booking_id.clone(),
                },
                _ => RebookError::NotCancellable {
                    session_id: booking_id.clone(),
                    status: session.status,
                },
            });
        }

        let refund_amount = if verdict.is_auto_approved {
            // Resolve the wallet before touching any state, so a directory
            // failure cannot strand a half-cancelled booking.
            let wallet_id = self
                .wallets
                .wallet_id_for(&session.student_id)
                .await
                .map_err(|err| RebookError::WalletNotFound {
                    wallet: format!("for user {}: {err}", session.student_id),
                })?;

            self.registry
                .transition(booking_id, SessionStatus::CancellationRequested)
                .await?;
            self.registry
                .transition(booking_id, SessionStatus::Cancelled)
                .await?;

            if verdict.refund_amount > Decimal::ZERO {
                let entry = self
                    .ledger
                    .apply_idempotent(
                        &wallet_id,
                        verdict.refund_amount,
                        TransactionType::Refund,
                        booking_id.as_str(),
                        booking_id.as_str(),
                    )
                    .await?;
                entry.amount
            } else {
                Decimal::ZERO
            }
        } else {
            // Pending manual review; the refund follows the reviewer's call.
            self.registry
                .transition(booking_id, SessionStatus::CancellationRequested)
                .await?;
            Decimal::ZERO
        };

        info!(
            booking = %booking_id,
            auto_approved = verdict.is_auto_approved,
            refund = %refund_amount,
            "booking cancelled"
        );

        Ok(RefundRecord {
            booking_id: booking_id.clone(),
            original_amount: session.price,
            refund_amount,
            refund_method: RefundMethod::WalletCredit,
            is_auto_approved: verdict.is_auto_approved,
            processed_at: now,
        })
    }
}
