//! Leave/makeup negotiation workflow.
//!
//! A student drafts a leave request, sends it to the coach as a makeup
//! request, and the coach later approves it with a concrete replacement
//! slot or declines it. Drafting is deliberately silent: no message goes
//! out until the student commits, so an abandoned draft never bothers the
//! coach. Outbound messaging and friend-graph calls happen after the state
//! transition commits; their failures surface as warnings, never as a
//! rollback.

use crate::clock::Clock;
use crate::error::{RebookError, Result};
use crate::model::{
    LeaveRequest, LeaveRequestId, LeaveStatus, Session, SessionId, SessionStatus, UserId,
};
use crate::ports::{MessagingGateway, OutboundMessage, SocialGraph};
use crate::registry::SessionRegistry;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// A collaborator intent that did not land. The workflow result it rides on
/// is still successful; the caller may surface or retry out of band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorWarning {
    pub gateway: &'static str,
    pub message: String,
}

/// Result of sending a makeup request: the updated leave request plus any
/// non-fatal collaborator warnings.
#[derive(Debug, Clone)]
pub struct MakeupDispatch {
    pub request: LeaveRequest,
    pub warnings: Vec<CollaboratorWarning>,
}

/// Operations on leave requests.
#[async_trait]
pub trait LeaveRequests: Send + Sync {
    /// Create a draft for `(student, session)`. Fails while an active request
    /// for the same pair exists, the reason is empty, or the session is not a
    /// confirmed, strictly-future one.
    async fn create_draft(
        &self,
        student_id: &UserId,
        original_session_id: &SessionId,
        reason: &str,
    ) -> Result<LeaveRequest>;

    /// Commit a draft: transition to `MessageSent` and dispatch the friend
    /// and message intents to the coach.
    async fn request_makeup(&self, request_id: &LeaveRequestId) -> Result<MakeupDispatch>;

    /// Coach approval with a concrete makeup slot. Valid only from
    /// `MessageSent`; links the replacement session one-to-one.
    async fn approve(
        &self,
        request_id: &LeaveRequestId,
        replacement_session_id: &SessionId,
    ) -> Result<LeaveRequest>;

    /// Coach decline. Valid only from `MessageSent`.
    async fn decline(&self, request_id: &LeaveRequestId, notes: &str) -> Result<LeaveRequest>;

    /// Load one request.
    async fn get(&self, request_id: &LeaveRequestId) -> Result<LeaveRequest>;
}

/// Requests plus the active-pair index, guarded by one lock so the
/// duplicate-active-request check and the insert are a single step.
#[derive(Default)]
struct LeaveStore {
    by_id: HashMap<LeaveRequestId, LeaveRequest>,
    active_pairs: HashSet<(UserId, SessionId)>,
}

/// In-memory leave request workflow.
pub struct LeaveRequestWorkflow {
    registry: Arc<dyn SessionRegistry>,
    messaging: Arc<dyn MessagingGateway>,
    social: Arc<dyn SocialGraph>,
    clock: Arc<dyn Clock>,
    store: RwLock<LeaveStore>,
}

impl LeaveRequestWorkflow {
    pub fn new(
        registry: Arc<dyn SessionRegistry>,
        messaging: Arc<dyn MessagingGateway>,
        social: Arc<dyn SocialGraph>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            messaging,
            social,
            clock,
            store: RwLock::new(LeaveStore::default()),
        }
    }

    /// Message sent to the coach when a makeup is requested.
    fn makeup_message(session: &Session, reason: &str) -> String {
        format!(
            "Leave request for \"{title}\" on {when} at {venue}.\n\
             Reason: {reason}\n\
             Please suggest an alternative slot for a makeup session.",
            title = session.title,
            when = session.start_time.format("%Y-%m-%d %H:%M UTC"),
            venue = session.venue,
            reason = reason,
        )
    }
}

#[async_trait]
impl LeaveRequests for LeaveRequestWorkflow {
    async fn create_draft(
        &self,
        student_id: &UserId,
        original_session_id: &SessionId,
        reason: &str,
    ) -> Result<LeaveRequest> {
        if reason.trim().is_empty() {
            return Err(RebookError::ReasonRequired {
                session_id: original_session_id.clone(),
            });
        }

        let session = self.registry.get(original_session_id).await?;
        if session.status != SessionStatus::Confirmed {
            return Err(RebookError::SessionNotEligible {
                session_id: original_session_id.clone(),
                detail: format!("status is {:?}", session.status),
            });
        }
        if session.start_time <= self.clock.now() {
            return Err(RebookError::SessionNotEligible {
                session_id: original_session_id.clone(),
                detail: "session is not in the future".to_string(),
            });
        }

        let mut store = self.store.write().await;
        let key = (student_id.clone(), original_session_id.clone());
        if store.active_pairs.contains(&key) {
            return Err(RebookError::DuplicateActiveRequest {
                student_id: student_id.clone(),
                session_id: original_session_id.clone(),
            });
        }

        let now = self.clock.now();
        let request = LeaveRequest {
            id: LeaveRequestId::new(),
            student_id: student_id.clone(),
            coach_id: session.coach_id.clone(),
            original_session_id: original_session_id.clone(),
            replacement_session_id: None,
            reason: reason.trim().to_string(),
            status: LeaveStatus::Draft,
            decline_notes: None,
            created_at: now,
            updated_at: now,
        };
        store.active_pairs.insert(key);
        store.by_id.insert(request.id.clone(), request.clone());
        info!(request = %request.id, session = %original_session_id, "leave draft created");
        Ok(request)
    }

    async fn request_makeup(&self, request_id: &LeaveRequestId) -> Result<MakeupDispatch> {
        // Commit the transition first; intents go out only for a request
        // that actually reached MessageSent.
        let request = {
            let mut store = self.store.write().await;
            let request = store.by_id.get_mut(request_id).ok_or_else(|| {
                RebookError::LeaveRequestNotFound {
                    request_id: request_id.clone(),
                }
            })?;
            if request.status != LeaveStatus::Draft {
                return Err(RebookError::InvalidState {
                    request_id: request_id.clone(),
                    current: request.status,
                    operation: "request_makeup",
                });
            }
            request.status = LeaveStatus::MessageSent;
            request.updated_at = self.clock.now();
            request.clone()
        };
        info!(request = %request.id, coach = %request.coach_id, "makeup requested");

        let session = self.registry.get(&request.original_session_id).await?;
        let mut warnings = Vec::new();

        if let Err(err) = self
            .social
            .ensure_friendship(&request.student_id, &request.coach_id)
            .await
        {
            warn!(request = %request.id, error = %err, "friend-graph intent failed");
            warnings.push(CollaboratorWarning {
                gateway: "social_graph",
                message: err.to_string(),
            });
        }

        let message = OutboundMessage {
            recipient_id: request.coach_id.clone(),
            body: Self::makeup_message(&session, &request.reason),
        };
        if let Err(err) = self.messaging.send_message(message).await {
            warn!(request = %request.id, error = %err, "message dispatch failed");
            warnings.push(CollaboratorWarning {
                gateway: "messaging",
                message: err.to_string(),
            });
        }

        Ok(MakeupDispatch { request, warnings })
    }

    async fn approve(
        &self,
        request_id: &LeaveRequestId,
        replacement_session_id: &SessionId,
    ) -> Result<LeaveRequest> {
        let mut store = self.store.write().await;
        let current = store.by_id.get(request_id).ok_or_else(|| {
            RebookError::LeaveRequestNotFound {
                request_id: request_id.clone(),
            }
        })?;
        if current.status != LeaveStatus::MessageSent {
            return Err(RebookError::InvalidState {
                request_id: request_id.clone(),
                current: current.status,
                operation: "approve",
            });
        }
        // The registry enforces the session side of the one-to-one invariant;
        // this guards the request side.
        if store
            .by_id
            .values()
            .any(|r| r.replacement_session_id.as_ref() == Some(replacement_session_id))
        {
            return Err(RebookError::ReplacementAlreadyLinked {
                session_id: replacement_session_id.clone(),
            });
        }

        let original_session_id = current.original_session_id.clone();
        self.registry
            .link_replacement(replacement_session_id, &original_session_id)
            .await?;

        let request = store
            .by_id
            .get_mut(request_id)
            .expect("request present under held lock");
        request.status = LeaveStatus::Approved;
        request.replacement_session_id = Some(replacement_session_id.clone());
        request.updated_at = self.clock.now();
        let request = request.clone();
        store.active_pairs.remove(&request.active_key());
        info!(
            request = %request.id,
            replacement = %replacement_session_id,
            "leave request approved"
        );
        Ok(request)
    }

    async fn decline(&self, request_id: &LeaveRequestId, notes: &str) -> Result<LeaveRequest> {
        let mut store = self.store.write().await;
        let request = store.by_id.get_mut(request_id).ok_or_else(|| {
            RebookError::LeaveRequestNotFound {
                request_id: request_id.clone(),
            }
        })?;
        if request.status != LeaveStatus::MessageSent {
            return Err(RebookError::InvalidState {
                request_id: request_id.clone(),
                current: request.status,
                operation: "decline",
            });
        }
        request.status = LeaveStatus::Declined;
        request.decline_notes = Some(notes.to_string());
        request.updated_at = self.clock.now();
        let request = request.clone();
        store.active_pairs.remove(&request.active_key());
        info!(request = %request.id, "leave request declined");
        Ok(request)
    }

    async fn get(&self, request_id: &LeaveRequestId) -> Result<LeaveRequest> {
        let store = self.store.read().await;
        store
            .by_id
            .get(request_id)
            .cloned()
            .ok_or_else(|| RebookError::LeaveRequestNotFound {
                request_id: request_id.clone(),
            })
    }
}
