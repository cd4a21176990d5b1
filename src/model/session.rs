//! Session entity and its status machines.

use super::{GroupId, SessionId, UserId};
use crate::error::RebookError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a session. `Cancelled` and `Completed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Confirmed,
    CancellationRequested,
    Cancelled,
    Completed,
}

impl SessionStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Cancelled | SessionStatus::Completed)
    }

    /// Whether the status machine permits moving to `to` from here.
    ///
    /// `CancellationRequested -> Confirmed` is the manual-review rejection
    /// path; everything out of a terminal state is refused.
    pub fn can_transition_to(&self, to: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, to),
            (Confirmed, CancellationRequested)
                | (Confirmed, Cancelled)
                | (Confirmed, Completed)
                | (CancellationRequested, Cancelled)
                | (CancellationRequested, Confirmed)
        )
    }
}

/// Attendance of a student at a session. `Makeup` marks a replacement
/// session attended in place of an excused one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    NotStarted,
    InProgress,
    Present,
    Absent,
    Late,
    Makeup,
    Unset,
}

/// Read-side aggregate status of a recurring group, derived against a
/// caller-supplied instant and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupStatus {
    Upcoming,
    Ongoing,
    Completed,
}

/// Inbound data for constructing a [`Session`] at the system boundary.
///
/// Mapping raw caller input through this struct once, with validation, keeps
/// fallback/defaulting logic out of the business rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSession {
    pub id: SessionId,
    pub recurring_group_id: Option<GroupId>,
    pub coach_id: UserId,
    pub student_id: UserId,
    pub title: String,
    pub venue: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub price: Decimal,
}

/// One scheduled occurrence of a class or court booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub recurring_group_id: Option<GroupId>,
    pub coach_id: UserId,
    pub student_id: UserId,
    pub title: String,
    pub venue: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub price: Decimal,
    pub status: SessionStatus,
    /// Recorded attendance; presentation goes through [`Session::attendance_at`].
    pub attendance_status: AttendanceStatus,
    /// Set exactly once, when a leave request referencing this session as
    /// its makeup slot is approved.
    pub replacement_for_session_id: Option<SessionId>,
}

impl Session {
    /// Validate boundary input and build a confirmed session.
    pub fn new(new: NewSession) -> Result<Self, RebookError> {
        if new.title.trim().is_empty() {
            return Err(RebookError::invalid_session("title must not be empty"));
        }
        if new.end_time <= new.start_time {
            return Err(RebookError::invalid_session(
                "end_time must be after start_time",
            ));
        }
        if new.price < Decimal::ZERO {
            return Err(RebookError::invalid_session("price must not be negative"));
        }
        Ok(Self {
            id: new.id,
            recurring_group_id: new.recurring_group_id,
            coach_id: new.coach_id,
            student_id: new.student_id,
            title: new.title,
            venue: new.venue,
            start_time: new.start_time,
            end_time: new.end_time,
            price: new.price,
            status: SessionStatus::Confirmed,
            attendance_status: AttendanceStatus::Unset,
            replacement_for_session_id: None,
        })
    }

    /// Attendance as presented for a given instant.
    ///
    /// Before the session starts the recorded value is irrelevant; while it
    /// runs it reads as in progress; afterwards the recorded value stands.
    pub fn attendance_at(&self, now: DateTime<Utc>) -> AttendanceStatus {
        if self.start_time > now {
            AttendanceStatus::NotStarted
        } else if now < self.end_time {
            AttendanceStatus::InProgress
        } else {
            self.attendance_status
        }
    }

    /// Whether the session has not yet started at `now`.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.start_time > now
    }
}
