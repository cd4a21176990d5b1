/// Error code registry for the booking lifecycle engine.
///
/// Codes are organized by category:
/// - 1000-1999: Policy rejections (user-facing, retryable with corrected input)
/// - 2000-2999: State conflicts (race or stale client view)
/// - 3000-3999: Resource errors (unknown or stale references)
/// - 4000-4999: Ledger errors
/// - 5000-5999: Collaborator failures (non-fatal, best-effort side effects)
/// - 9000-9999: Boundary/validation errors
pub struct ErrorCode;

impl ErrorCode {
    // Policy rejections (1000-1999)
    pub const POLICY_NOT_CANCELLABLE: u16 = 1001;
    pub const POLICY_REASON_REQUIRED: u16 = 1002;
    pub const POLICY_ALREADY_ELAPSED: u16 = 1003;
    pub const POLICY_SESSION_NOT_ELIGIBLE: u16 = 1004;

    // State conflicts (2000-2999)
    pub const STATE_INVALID_TRANSITION: u16 = 2001;
    pub const STATE_INVALID_LEAVE_STATE: u16 = 2002;
    pub const STATE_DUPLICATE_ACTIVE_REQUEST: u16 = 2003;
    pub const STATE_REPLACEMENT_ALREADY_LINKED: u16 = 2004;

    // Resource errors (3000-3999)
    pub const RESOURCE_SESSION_NOT_FOUND: u16 = 3001;
    pub const RESOURCE_WALLET_NOT_FOUND: u16 = 3002;
    pub const RESOURCE_REPLACEMENT_SESSION_NOT_FOUND: u16 = 3003;
    pub const RESOURCE_LEAVE_REQUEST_NOT_FOUND: u16 = 3004;

    // Ledger errors (4000-4999)
    pub const LEDGER_INSUFFICIENT_FUNDS: u16 = 4001;
    pub const LEDGER_TRANSACTION_NOT_FOUND: u16 = 4002;
    pub const LEDGER_ALREADY_COMPENSATED: u16 = 4003;

    // Collaborator failures (5000-5999)
    pub const COLLABORATOR_UNAVAILABLE: u16 = 5001;

    // Boundary/validation errors (9000-9999)
    pub const BOUNDARY_INVALID_SESSION: u16 = 9001;
}

/// Describe an error code for diagnostics and support tooling.
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        ErrorCode::POLICY_NOT_CANCELLABLE => "Booking is not cancellable in its current state",
        ErrorCode::POLICY_REASON_REQUIRED => {
            "A cancellation reason is required within the refund window"
        }
        ErrorCode::POLICY_ALREADY_ELAPSED => "The session has already started or ended",
        ErrorCode::POLICY_SESSION_NOT_ELIGIBLE => "The session is not eligible for a leave request",
        ErrorCode::STATE_INVALID_TRANSITION => {
            "The requested session status transition is not permitted"
        }
        ErrorCode::STATE_INVALID_LEAVE_STATE => {
            "The leave request is not in a state permitting this operation"
        }
        ErrorCode::STATE_DUPLICATE_ACTIVE_REQUEST => {
            "An active leave request already exists for this session"
        }
        ErrorCode::STATE_REPLACEMENT_ALREADY_LINKED => {
            "The replacement session already backs another leave request"
        }
        ErrorCode::RESOURCE_SESSION_NOT_FOUND => "Session not found",
        ErrorCode::RESOURCE_WALLET_NOT_FOUND => "Wallet not found or not active",
        ErrorCode::RESOURCE_REPLACEMENT_SESSION_NOT_FOUND => "Replacement session not found",
        ErrorCode::RESOURCE_LEAVE_REQUEST_NOT_FOUND => "Leave request not found",
        ErrorCode::LEDGER_INSUFFICIENT_FUNDS => "Insufficient funds for this debit",
        ErrorCode::LEDGER_TRANSACTION_NOT_FOUND => "Ledger entry not found",
        ErrorCode::LEDGER_ALREADY_COMPENSATED => "Ledger entry was already compensated",
        ErrorCode::COLLABORATOR_UNAVAILABLE => "An external collaborator was unavailable",
        ErrorCode::BOUNDARY_INVALID_SESSION => "Inbound session data failed validation",
        _ => "Unknown error code",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_have_descriptions() {
        assert_ne!(
            describe_error_code(ErrorCode::POLICY_REASON_REQUIRED),
            "Unknown error code"
        );
        assert_eq!(describe_error_code(8888), "Unknown error code");
    }
}
