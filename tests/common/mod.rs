//! Shared harness for integration tests: in-memory engine wiring plus
//! recording doubles for the outbound ports.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rebook::{
    BookingCancellationService, CancellationPolicy, Clock, FixedClock, GroupId,
    InMemorySessionRegistry, InMemoryWalletLedger, LeaveRequestWorkflow, MessagingGateway,
    NewSession, OutboundMessage, PortError, Session, SessionId, SessionRegistry, SocialGraph,
    UserId, WalletAccountDirectory, WalletId, WalletLedger,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// The fixed instant every test starts from.
pub fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

pub fn student() -> UserId {
    UserId::from_string("student-1")
}

pub fn coach() -> UserId {
    UserId::from_string("coach-1")
}

pub fn wallet() -> WalletId {
    WalletId::from_string("wallet-1")
}

/// Records sent messages; can be told to fail the next send.
#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<OutboundMessage>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl MessagingGateway for RecordingMessenger {
    async fn send_message(&self, message: OutboundMessage) -> Result<(), PortError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::new("messaging service unavailable"));
        }
        self.sent.lock().await.push(message);
        Ok(())
    }
}

/// Records ensured friendships; can be told to fail.
#[derive(Default)]
pub struct RecordingSocialGraph {
    pub friendships: Mutex<Vec<(UserId, UserId)>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl SocialGraph for RecordingSocialGraph {
    async fn ensure_friendship(
        &self,
        user_id: &UserId,
        counterpart_id: &UserId,
    ) -> Result<(), PortError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::new("social graph unavailable"));
        }
        self.friendships
            .lock()
            .await
            .push((user_id.clone(), counterpart_id.clone()));
        Ok(())
    }
}

/// Fixed user-to-wallet mapping.
pub struct StaticWalletDirectory {
    pub map: HashMap<UserId, WalletId>,
}

#[async_trait]
impl WalletAccountDirectory for StaticWalletDirectory {
    async fn wallet_id_for(&self, user_id: &UserId) -> Result<WalletId, PortError> {
        self.map
            .get(user_id)
            .cloned()
            .ok_or_else(|| PortError::new(format!("no wallet for {user_id}")))
    }
}

/// Fully wired in-memory engine.
pub struct TestEngine {
    pub clock: Arc<FixedClock>,
    pub registry: Arc<InMemorySessionRegistry>,
    pub ledger: Arc<InMemoryWalletLedger>,
    pub messenger: Arc<RecordingMessenger>,
    pub social: Arc<RecordingSocialGraph>,
    pub service: Arc<BookingCancellationService>,
    pub workflow: LeaveRequestWorkflow,
}

impl TestEngine {
    pub async fn new() -> Self {
        let clock = Arc::new(FixedClock::new(anchor()));
        let registry = Arc::new(InMemorySessionRegistry::new());
        let ledger = Arc::new(InMemoryWalletLedger::new(clock.clone() as Arc<dyn Clock>));
        let messenger = Arc::new(RecordingMessenger::default());
        let social = Arc::new(RecordingSocialGraph::default());

        ledger.open(wallet()).await.expect("open wallet");

        let directory = Arc::new(StaticWalletDirectory {
            map: HashMap::from([(student(), wallet())]),
        });

        let service = Arc::new(BookingCancellationService::new(
            registry.clone(),
            ledger.clone(),
            directory,
            CancellationPolicy::default(),
            clock.clone(),
        ));
        let workflow = LeaveRequestWorkflow::new(
            registry.clone(),
            messenger.clone(),
            social.clone(),
            clock.clone(),
        );

        Self {
            clock,
            registry,
            ledger,
            messenger,
            social,
            service,
            workflow,
        }
    }

    /// Register a confirmed standalone session starting `lead` after the
    /// anchor instant, priced at RM50.00.
    pub async fn add_session(&self, id: &str, lead: Duration) -> SessionId {
        self.add_group_session(id, None, lead).await
    }

    pub async fn add_group_session(
        &self,
        id: &str,
        group: Option<&str>,
        lead: Duration,
    ) -> SessionId {
        let start = anchor() + lead;
        let session = Session::new(NewSession {
            id: SessionId::from_string(id),
            recurring_group_id: group.map(GroupId::from_string),
            coach_id: coach(),
            student_id: student(),
            title: "Intermediate badminton".to_string(),
            venue: "Court 3, Arena Sports Centre".to_string(),
            start_time: start,
            end_time: start + Duration::hours(1),
            price: dec!(50.00),
        })
        .expect("valid session");
        let id = session.id.clone();
        self.registry.insert(session).await.expect("insert session");
        id
    }

    pub async fn balance(&self) -> Decimal {
        self.ledger.balance(&wallet()).await.expect("balance")
    }
}
