//! Session registry: storage, status transitions, and read-side derivations.
//!
//! Aggregate facts about a recurring group (its status, a session's
//! presented attendance) are recomputed on every query against a supplied
//! `now` — they are never stored, so they can never go stale.

use crate::error::{RebookError, Result};
use crate::model::{AttendanceStatus, GroupId, GroupStatus, Session, SessionId, SessionStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

/// Derive the aggregate status of a recurring group at `now`.
///
/// `Ongoing` means the group straddles `now`: at least one session still
/// ahead and at least one already started. An empty slice reads as
/// `Completed` (nothing left to run).
pub fn group_status(sessions: &[Session], now: DateTime<Utc>) -> GroupStatus {
    let any_future = sessions.iter().any(|s| s.start_time > now);
    let any_started = sessions.iter().any(|s| s.start_time <= now);
    match (any_future, any_started) {
        (true, true) => GroupStatus::Ongoing,
        (true, false) => GroupStatus::Upcoming,
        _ => GroupStatus::Completed,
    }
}

/// Store of sessions and recurring groups.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Add a session. Replaces nothing: inserting an existing id fails.
    async fn insert(&self, session: Session) -> Result<()>;

    /// Load one session.
    async fn get(&self, session_id: &SessionId) -> Result<Session>;

    /// All sessions sharing the given session's recurring group, or just the
    /// session itself when standalone.
    async fn group_of(&self, session_id: &SessionId) -> Result<Vec<Session>>;

    /// All sessions of a group id.
    async fn sessions_in_group(&self, group_id: &GroupId) -> Result<Vec<Session>>;

    /// Move a session through its status machine. The expected source status
    /// is re-read under the write lock, so a concurrent transition loses
    /// cleanly with `InvalidTransition` instead of clobbering.
    async fn transition(&self, session_id: &SessionId, to: SessionStatus) -> Result<Session>;

    /// Mark `replacement_id` as the makeup slot for `original_id`. A session
    /// can back at most one leave request; linking twice fails.
    async fn link_replacement(
        &self,
        replacement_id: &SessionId,
        original_id: &SessionId,
    ) -> Result<Session>;

    /// Attendance as presented at `now` (derived, not stored).
    async fn attendance_of(
        &self,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<AttendanceStatus>;
}

/// In-memory session registry.
#[derive(Default)]
pub struct InMemorySessionRegistry {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRegistry for InMemorySessionRegistry {
    async fn insert(&self, session: Session) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(RebookError::invalid_session(format!(
                "session {} already registered",
                session.id
            )));
        }
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, session_id: &SessionId) -> Result<Session> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| RebookError::SessionNotFound {
                session_id: session_id.clone(),
            })
    }

    async fn group_of(&self, session_id: &SessionId) -> Result<Vec<Session>> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(session_id)
            .ok_or_else(|| RebookError::SessionNotFound {
                session_id: session_id.clone(),
            })?;
        match &session.recurring_group_id {
            None => Ok(vec![session.clone()]),
            Some(group_id) => {
                let mut members: Vec<Session> = sessions
                    .values()
                    .filter(|s| s.recurring_group_id.as_ref() == Some(group_id))
                    .cloned()
                    .collect();
                members.sort_by_key(|s| s.start_time);
                Ok(members)
            }
        }
    }

    async fn sessions_in_group(&self, group_id: &GroupId) -> Result<Vec<Session>> {
        let sessions = self.sessions.read().await;
        let mut members: Vec<Session> = sessions
            .values()
            .filter(|s| s.recurring_group_id.as_ref() == Some(group_id))
            .cloned()
            .collect();
        members.sort_by_key(|s| s.start_time);
        Ok(members)
    }

    async fn transition(&self, session_id: &SessionId, to: SessionStatus) -> Result<Session> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| RebookError::SessionNotFound {
                session_id: session_id.clone(),
            })?;
        let from = session.status;
        if !from.can_transition_to(to) {
            return Err(RebookError::InvalidTransition {
                session_id: session_id.clone(),
                from,
                to,
            });
        }
        session.status = to;
        info!(session = %session_id, ?from, ?to, "session status transition");
        Ok(session.clone())
    }

    async fn link_replacement(
        &self,
        replacement_id: &SessionId,
        original_id: &SessionId,
    ) -> Result<Session> {
        let mut sessions = self.sessions.write().await;
        if !sessions.contains_key(original_id) {
            return Err(RebookError::SessionNotFound {
                session_id: original_id.clone(),
            });
        }
        let replacement = sessions.get_mut(replacement_id).ok_or_else(|| {
            RebookError::ReplacementSessionNotFound {
                session_id: replacement_id.clone(),
            }
        })?;
        if replacement.replacement_for_session_id.is_some() {
            return Err(RebookError::ReplacementAlreadyLinked {
                session_id: replacement_id.clone(),
            });
        }
        replacement.replacement_for_session_id = Some(original_id.clone());
        info!(replacement = %replacement_id, original = %original_id, "makeup session linked");
        Ok(replacement.clone())
    }

    async fn attendance_of(
        &self,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<AttendanceStatus> {
        let session = self.get(session_id).await?;
        Ok(session.attendance_at(now))
    }
}
