//! Domain entities for the booking lifecycle engine.
//!
//! Identifiers are newtype wrappers over strings so callers cannot mix a
//! wallet id with a session id; entities are constructed once at the system
//! boundary with validation, then flow through the engine strongly typed.

pub mod leave;
pub mod session;
pub mod wallet;

pub use leave::{LeaveRequest, LeaveStatus};
pub use session::{AttendanceStatus, GroupStatus, NewSession, Session, SessionStatus};
pub use wallet::{
    RefundMethod, RefundRecord, TransactionStatus, TransactionType, WalletStatus,
    WalletTransaction,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn new() -> Self {
                Self(format!(concat!($prefix, "-{}"), Uuid::new_v4()))
            }

            /// Wrap an existing identifier string.
            pub fn from_string(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Unique identifier for a scheduled session (one class occurrence or
    /// court booking). Doubles as the booking reference for single-slot
    /// bookings.
    SessionId,
    "session"
);

string_id!(
    /// Identifier shared by every session generated from one recurring
    /// booking.
    GroupId,
    "group"
);

string_id!(
    /// Identifier for a leave/makeup negotiation record.
    LeaveRequestId,
    "leave"
);

string_id!(
    /// Identifier for a user (student or coach).
    UserId,
    "user"
);

string_id!(
    /// Identifier for a wallet ledger.
    WalletId,
    "wallet"
);

string_id!(
    /// Identifier for a single ledger entry.
    TransactionId,
    "txn"
);
