//! Unified error type for the booking lifecycle engine.
//!
//! Every fallible operation returns [`RebookError`]. Variants map one-to-one
//! onto the engine's error taxonomy: policy rejections are expected and
//! user-facing, state conflicts indicate a race or stale client view,
//! resource errors a bad reference, ledger errors an invariant check, and
//! collaborator failures a best-effort side effect that did not land.

use crate::model::{LeaveRequestId, LeaveStatus, SessionId, SessionStatus, UserId, WalletId};
use rust_decimal::Decimal;
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RebookError>;

/// Broad classification of an error, matching how callers should react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Expected rejection; retry with corrected input.
    PolicyRejection,
    /// Race or stale view; reload state before retrying.
    StateConflict,
    /// Unknown or stale reference; do not retry.
    Resource,
    /// Ledger invariant check failed.
    Ledger,
    /// Best-effort collaborator did not respond; committed state stands.
    Collaborator,
    /// Inbound data failed boundary validation.
    Boundary,
}

/// The unified error type for the booking lifecycle engine.
#[derive(Error, Debug)]
pub enum RebookError {
    #[error("[E1001] session {session_id} not cancellable in current state ({status:?})")]
    NotCancellable {
        session_id: SessionId,
        status: SessionStatus,
    },

    #[error("[E1002] session {session_id}: reason required within 24 hours")]
    ReasonRequired { session_id: SessionId },

    #[error("[E1003] session {session_id} already elapsed")]
    AlreadyElapsed { session_id: SessionId },

    #[error("[E1004] session {session_id} not eligible for leave: {detail}")]
    SessionNotEligible {
        session_id: SessionId,
        detail: String,
    },

    #[error("[E2001] invalid transition {from:?} -> {to:?} for session {session_id}")]
    InvalidTransition {
        session_id: SessionId,
        from: SessionStatus,
        to: SessionStatus,
    },

    #[error("[E2002] leave request {request_id} in state {current:?} does not permit {operation}")]
    InvalidState {
        request_id: LeaveRequestId,
        current: LeaveStatus,
        operation: &'static str,
    },

    #[error("[E2003] active leave request already exists for student {student_id} and session {session_id}")]
    DuplicateActiveRequest {
        student_id: UserId,
        session_id: SessionId,
    },

    #[error("[E2004] session {session_id} already linked as a replacement")]
    ReplacementAlreadyLinked { session_id: SessionId },

    #[error("[E3001] session {session_id} not found")]
    SessionNotFound { session_id: SessionId },

    #[error("[E3002] wallet {wallet} not found or not active")]
    WalletNotFound { wallet: String },

    #[error("[E3003] replacement session {session_id} not found")]
    ReplacementSessionNotFound { session_id: SessionId },

    #[error("[E3004] leave request {request_id} not found")]
    LeaveRequestNotFound { request_id: LeaveRequestId },

    #[error("[E4001] wallet {wallet_id}: insufficient funds (balance {balance}, requested {requested})")]
    InsufficientFunds {
        wallet_id: WalletId,
        balance: Decimal,
        requested: Decimal,
    },

    #[error("[E4002] ledger entry {transaction_id} not found in wallet {wallet_id}")]
    TransactionNotFound {
        wallet_id: WalletId,
        transaction_id: String,
    },

    #[error("[E4003] ledger entry {transaction_id} already compensated")]
    AlreadyCompensated { transaction_id: String },

    #[error("[E5001] collaborator {gateway} unavailable: {message}")]
    Collaborator { gateway: String, message: String },

    #[error("[E9001] invalid session data: {message}")]
    InvalidSession { message: String },
}

impl RebookError {
    /// Create a boundary validation error.
    pub fn invalid_session(message: impl Into<String>) -> Self {
        Self::InvalidSession {
            message: message.into(),
        }
    }

    /// Create a collaborator failure.
    pub fn collaborator(gateway: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Collaborator {
            gateway: gateway.into(),
            message: message.into(),
        }
    }

    /// Registry code for this error.
    pub fn code(&self) -> u16 {
        match self {
            Self::NotCancellable { .. } => ErrorCode::POLICY_NOT_CANCELLABLE,
            Self::ReasonRequired { .. } => ErrorCode::POLICY_REASON_REQUIRED,
            Self::AlreadyElapsed { .. } => ErrorCode::POLICY_ALREADY_ELAPSED,
            Self::SessionNotEligible { .. } => ErrorCode::POLICY_SESSION_NOT_ELIGIBLE,
            Self::InvalidTransition { .. } => ErrorCode::STATE_INVALID_TRANSITION,
            Self::InvalidState { .. } => ErrorCode::STATE_INVALID_LEAVE_STATE,
            Self::DuplicateActiveRequest { .. } => ErrorCode::STATE_DUPLICATE_ACTIVE_REQUEST,
            Self::ReplacementAlreadyLinked { .. } => ErrorCode::STATE_REPLACEMENT_ALREADY_LINKED,
            Self::SessionNotFound { .. } => ErrorCode::RESOURCE_SESSION_NOT_FOUND,
            Self::WalletNotFound { .. } => ErrorCode::RESOURCE_WALLET_NOT_FOUND,
            Self::ReplacementSessionNotFound { .. } => {
                ErrorCode::RESOURCE_REPLACEMENT_SESSION_NOT_FOUND
            }
            Self::LeaveRequestNotFound { .. } => ErrorCode::RESOURCE_LEAVE_REQUEST_NOT_FOUND,
            Self::InsufficientFunds { .. } => ErrorCode::LEDGER_INSUFFICIENT_FUNDS,
            Self::TransactionNotFound { .. } => ErrorCode::LEDGER_TRANSACTION_NOT_FOUND,
            Self::AlreadyCompensated { .. } => ErrorCode::LEDGER_ALREADY_COMPENSATED,
            Self::Collaborator { .. } => ErrorCode::COLLABORATOR_UNAVAILABLE,
            Self::InvalidSession { .. } => ErrorCode::BOUNDARY_INVALID_SESSION,
        }
    }

    /// Classify the error for caller-side handling.
    pub fn kind(&self) -> ErrorKind {
        match self.code() {
            1000..=1999 => ErrorKind::PolicyRejection,
            2000..=2999 => ErrorKind::StateConflict,
            3000..=3999 => ErrorKind::Resource,
            4000..=4999 => ErrorKind::Ledger,
            5000..=5999 => ErrorKind::Collaborator,
            _ => ErrorKind::Boundary,
        }
    }

    /// Whether the caller can recover by correcting input or reloading state.
    ///
    /// Resource and ledger errors point at a caller bug or a hard invariant;
    /// those are surfaced as-is and never retried.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::PolicyRejection | ErrorKind::StateConflict | ErrorKind::Collaborator
        )
    }
}
