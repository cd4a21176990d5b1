//! Leave/makeup negotiation: state machine transitions, uniqueness
//! invariants, and the outbound collaborator contract.

mod common;

use chrono::Duration;
use common::TestEngine;
use rebook::{LeaveRequests, LeaveStatus, RebookError, SessionId, SessionRegistry, SessionStatus};
use std::sync::atomic::Ordering;

#[tokio::test]
async fn draft_to_approval_links_the_makeup_session() {
    let engine = TestEngine::new().await;
    let original = engine.add_session("session-orig", Duration::hours(48)).await;
    let makeup = engine.add_session("session-makeup", Duration::days(7)).await;

    let draft = engine
        .workflow
        .create_draft(&common::student(), &original, "work trip")
        .await
        .unwrap();
    assert_eq!(draft.status, LeaveStatus::Draft);
    assert_eq!(draft.coach_id, common::coach());

    // Drafting is silent.
    assert!(engine.messenger.sent.lock().await.is_empty());

    let dispatch = engine.workflow.request_makeup(&draft.id).await.unwrap();
    assert_eq!(dispatch.request.status, LeaveStatus::MessageSent);
    assert!(dispatch.warnings.is_empty());

    let sent = engine.messenger.sent.lock().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient_id, common::coach());
    assert!(sent[0].body.contains("Intermediate badminton"));
    assert!(sent[0].body.contains("Court 3, Arena Sports Centre"));
    assert!(sent[0].body.contains("work trip"));
    drop(sent);

    let friendships = engine.social.friendships.lock().await;
    assert_eq!(*friendships, vec![(common::student(), common::coach())]);
    drop(friendships);

    let approved = engine.workflow.approve(&draft.id, &makeup).await.unwrap();
    assert_eq!(approved.status, LeaveStatus::Approved);
    assert_eq!(approved.replacement_session_id, Some(makeup.clone()));

    let makeup_session = engine.registry.get(&makeup).await.unwrap();
    assert_eq!(
        makeup_session.replacement_for_session_id,
        Some(original.clone())
    );

    // Terminal states are immutable.
    let err = engine.workflow.approve(&draft.id, &makeup).await.unwrap_err();
    assert!(matches!(err, RebookError::InvalidState { .. }));
}

#[tokio::test]
async fn one_active_request_per_student_session_pair() {
    let engine = TestEngine::new().await;
    let original = engine.add_session("session-orig", Duration::hours(48)).await;

    let first = engine
        .workflow
        .create_draft(&common::student(), &original, "exam week")
        .await
        .unwrap();

    let err = engine
        .workflow
        .create_draft(&common::student(), &original, "changed my mind")
        .await
        .unwrap_err();
    assert!(matches!(err, RebookError::DuplicateActiveRequest { .. }));

    // Still blocked while the request is out with the coach.
    engine.workflow.request_makeup(&first.id).await.unwrap();
    let err = engine
        .workflow
        .create_draft(&common::student(), &original, "again")
        .await
        .unwrap_err();
    assert!(matches!(err, RebookError::DuplicateActiveRequest { .. }));

    // A terminal outcome frees the pair.
    engine
        .workflow
        .decline(&first.id, "no slots this month")
        .await
        .unwrap();
    let second = engine
        .workflow
        .create_draft(&common::student(), &original, "retry")
        .await
        .unwrap();
    assert_eq!(second.status, LeaveStatus::Draft);
}

#[tokio::test]
async fn a_session_backs_at_most_one_leave_request() {
    let engine = TestEngine::new().await;
    let original_a = engine.add_session("session-a", Duration::hours(48)).await;
    let original_b = engine.add_session("session-b", Duration::hours(72)).await;
    let makeup = engine.add_session("session-makeup", Duration::days(7)).await;

    let lr1 = engine
        .workflow
        .create_draft(&common::student(), &original_a, "travel")
        .await
        .unwrap();
    engine.workflow.request_makeup(&lr1.id).await.unwrap();
    let lr2 = engine
        .workflow
        .create_draft(&common::student(), &original_b, "travel")
        .await
        .unwrap();
    engine.workflow.request_makeup(&lr2.id).await.unwrap();

    engine.workflow.approve(&lr1.id, &makeup).await.unwrap();
    let err = engine.workflow.approve(&lr2.id, &makeup).await.unwrap_err();
    assert!(matches!(err, RebookError::ReplacementAlreadyLinked { .. }));

    // The losing request is untouched and can still be resolved.
    let lr2 = engine.workflow.get(&lr2.id).await.unwrap();
    assert_eq!(lr2.status, LeaveStatus::MessageSent);
}

#[tokio::test]
async fn draft_validation_rejects_bad_input() {
    let engine = TestEngine::new().await;
    let upcoming = engine.add_session("session-up", Duration::hours(48)).await;
    let elapsed = engine.add_session("session-past", Duration::hours(-2)).await;

    let err = engine
        .workflow
        .create_draft(&common::student(), &upcoming, "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, RebookError::ReasonRequired { .. }));

    let err = engine
        .workflow
        .create_draft(&common::student(), &elapsed, "overslept")
        .await
        .unwrap_err();
    assert!(matches!(err, RebookError::SessionNotEligible { .. }));

    engine
        .registry
        .transition(&upcoming, SessionStatus::Cancelled)
        .await
        .unwrap();
    let err = engine
        .workflow
        .create_draft(&common::student(), &upcoming, "sick")
        .await
        .unwrap_err();
    assert!(matches!(err, RebookError::SessionNotEligible { .. }));

    let err = engine
        .workflow
        .create_draft(
            &common::student(),
            &SessionId::from_string("session-ghost"),
            "sick",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RebookError::SessionNotFound { .. }));
}

#[tokio::test]
async fn transitions_only_from_the_permitted_state() {
    let engine = TestEngine::new().await;
    let original = engine.add_session("session-orig", Duration::hours(48)).await;
    let makeup = engine.add_session("session-makeup", Duration::days(7)).await;

    let draft = engine
        .workflow
        .create_draft(&common::student(), &original, "clash")
        .await
        .unwrap();

    // Approve/decline require MessageSent.
    let err = engine.workflow.approve(&draft.id, &makeup).await.unwrap_err();
    assert!(matches!(err, RebookError::InvalidState { .. }));
    let err = engine.workflow.decline(&draft.id, "n/a").await.unwrap_err();
    assert!(matches!(err, RebookError::InvalidState { .. }));

    engine.workflow.request_makeup(&draft.id).await.unwrap();
    let err = engine.workflow.request_makeup(&draft.id).await.unwrap_err();
    assert!(matches!(err, RebookError::InvalidState { .. }));

    let declined = engine
        .workflow
        .decline(&draft.id, "fully booked")
        .await
        .unwrap();
    assert_eq!(declined.status, LeaveStatus::Declined);
    assert_eq!(declined.decline_notes.as_deref(), Some("fully booked"));
}

#[tokio::test]
async fn collaborator_failure_is_a_warning_not_a_rollback() {
    let engine = TestEngine::new().await;
    let original = engine.add_session("session-orig", Duration::hours(48)).await;

    let draft = engine
        .workflow
        .create_draft(&common::student(), &original, "injury")
        .await
        .unwrap();

    engine.messenger.fail.store(true, Ordering::SeqCst);
    let dispatch = engine.workflow.request_makeup(&draft.id).await.unwrap();

    // The transition committed even though the message did not land.
    assert_eq!(dispatch.request.status, LeaveStatus::MessageSent);
    assert_eq!(dispatch.warnings.len(), 1);
    assert_eq!(dispatch.warnings[0].gateway, "messaging");

    let stored = engine.workflow.get(&draft.id).await.unwrap();
    assert_eq!(stored.status, LeaveStatus::MessageSent);
}
