//! Booking and class-session lifecycle engine.
//!
//! The engine governs how a confirmed reservation or recurring class
//! session is cancelled, how a refund lands on the student's wallet ledger
//! exactly once, and how a missed recurring session turns into a
//! leave-request/makeup negotiation between student and coach.
//!
//! Components, leaf first:
//! - [`ledger`]: append-only wallet ledger with atomic, idempotent apply.
//! - [`policy`]: pure cancellation verdicts keyed on time-to-start.
//! - [`registry`]: session store, status machine, derived group status.
//! - [`workflow`]: leave/makeup negotiation state machine with outbound
//!   collaborator intents.
//! - [`cancellation`]: the orchestration entry point tying them together.
//!
//! Persistence, HTTP, auth, and the notification transport are external
//! collaborators reached only through the traits in [`ports`]. Time is
//! injected through [`clock::Clock`] so every decision is testable on fixed
//! instants.

pub mod cancellation;
pub mod clock;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod model;
pub mod policy;
pub mod ports;
pub mod registry;
pub mod workflow;

pub use cancellation::BookingCancellationService;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ErrorKind, RebookError, Result};
pub use ledger::{InMemoryWalletLedger, WalletLedger};
pub use model::{
    AttendanceStatus, GroupId, GroupStatus, LeaveRequest, LeaveRequestId, LeaveStatus, NewSession,
    RefundMethod, RefundRecord, Session, SessionId, SessionStatus, TransactionId,
    TransactionStatus, TransactionType, UserId, WalletId, WalletStatus, WalletTransaction,
};
pub use policy::{CancellationPolicy, CancellationVerdict, RejectionReason};
pub use ports::{
    MessagingGateway, OutboundMessage, PortError, SocialGraph, WalletAccountDirectory,
};
pub use registry::{group_status, InMemorySessionRegistry, SessionRegistry};
pub use workflow::{CollaboratorWarning, LeaveRequestWorkflow, LeaveRequests, MakeupDispatch};
