//! Leave request entity: one negotiation record per missed session.

use super::{LeaveRequestId, SessionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Negotiation states. `Approved` and `Declined` are terminal and immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    Draft,
    MessageSent,
    Approved,
    Declined,
}

impl LeaveStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeaveStatus::Approved | LeaveStatus::Declined)
    }

    /// Active requests block a second draft for the same student/session pair.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

/// A student-initiated request to be excused from an upcoming session,
/// negotiated with the coach into a makeup slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: LeaveRequestId,
    pub student_id: UserId,
    pub coach_id: UserId,
    pub original_session_id: SessionId,
    /// Set when the coach approves with a concrete makeup slot.
    pub replacement_session_id: Option<SessionId>,
    pub reason: String,
    pub status: LeaveStatus,
    /// Coach's notes recorded on decline.
    pub decline_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// Key under which the duplicate-active-request invariant is enforced.
    pub fn active_key(&self) -> (UserId, SessionId) {
        (self.student_id.clone(), self.original_session_id.clone())
    }
}
