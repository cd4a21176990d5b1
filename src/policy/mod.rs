//! Cancellation policy: a pure decision function over `(session, now, reason)`.
//!
//! No mutation happens here. The orchestration layer applies the verdict;
//! this module only computes it, which keeps the policy testable on fixed
//! instants.

use crate::model::{Session, SessionStatus};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Why a cancellation was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    /// Session status is not `Confirmed`.
    NotCancellable,
    /// Inside the refund window and no reason supplied.
    ReasonRequired,
    /// Session already started or ended.
    AlreadyElapsed,
}

/// Outcome of evaluating a cancellation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationVerdict {
    pub allowed: bool,
    pub requires_reason: bool,
    pub is_auto_approved: bool,
    pub refund_amount: Decimal,
    pub rejection: Option<RejectionReason>,
}

impl CancellationVerdict {
    fn rejected(reason: RejectionReason, requires_reason: bool) -> Self {
        Self {
            allowed: false,
            requires_reason,
            is_auto_approved: false,
            refund_amount: Decimal::ZERO,
            rejection: Some(reason),
        }
    }

    fn approved(refund_amount: Decimal, requires_reason: bool) -> Self {
        Self {
            allowed: true,
            requires_reason,
            is_auto_approved: true,
            refund_amount,
            rejection: None,
        }
    }
}

/// Time-to-start keyed cancellation policy.
///
/// Outside the window a cancellation is auto-approved with a full refund and
/// no reason. Inside the window (boundary inclusive) a non-empty reason is
/// required; once supplied, the cancellation is still auto-approved with a
/// full refund. This mirrors the confirmed business policy: the reason
/// satisfies auto-approval, there is no partial-refund tiering.
#[derive(Debug, Clone)]
pub struct CancellationPolicy {
    /// Lead time at or under which a reason becomes mandatory. The boundary
    /// itself counts as inside the window.
    pub full_refund_window: Duration,
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self {
            full_refund_window: Duration::hours(24),
        }
    }
}

impl CancellationPolicy {
    pub fn new(full_refund_window: Duration) -> Self {
        Self { full_refund_window }
    }

    /// Evaluate a cancellation request. Pure: no side effects, deterministic
    /// in `(session, now, reason)`.
    pub fn evaluate(
        &self,
        session: &Session,
        now: DateTime<Utc>,
        reason: &str,
    ) -> CancellationVerdict {
        if session.status != SessionStatus::Confirmed {
            return CancellationVerdict::rejected(RejectionReason::NotCancellable, false);
        }

        let lead = session.start_time - now;
        if lead < Duration::zero() {
            return CancellationVerdict::rejected(RejectionReason::AlreadyElapsed, false);
        }

        if lead > self.full_refund_window {
            return CancellationVerdict::approved(session.price, false);
        }

        if reason.trim().is_empty() {
            return CancellationVerdict::rejected(RejectionReason::ReasonRequired, true);
        }
        CancellationVerdict::approved(session.price, true)
    }
}
