//! Outbound ports required from external collaborators.
//!
//! The engine never performs network I/O itself; it hands intents to these
//! traits. Messaging and friend-graph calls are best-effort: a failure is
//! reported as a warning on the otherwise-successful result, never rolled
//! back into the state machine.

use crate::model::{UserId, WalletId};
use async_trait::async_trait;
use thiserror::Error;

/// Failure inside an external collaborator.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct PortError(pub String);

impl PortError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Message handed to the messaging collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub recipient_id: UserId,
    pub body: String,
}

/// Delivers user-to-user messages. Used when a leave request is sent to the
/// coach.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    async fn send_message(&self, message: OutboundMessage) -> std::result::Result<(), PortError>;
}

/// Social/friend relationship store. Messaging between two users requires a
/// friendship, so the workflow ensures one before dispatching.
#[async_trait]
pub trait SocialGraph: Send + Sync {
    async fn ensure_friendship(
        &self,
        user_id: &UserId,
        counterpart_id: &UserId,
    ) -> std::result::Result<(), PortError>;
}

/// Resolves the wallet backing a user's balance.
#[async_trait]
pub trait WalletAccountDirectory: Send + Sync {
    async fn wallet_id_for(&self, user_id: &UserId) -> std::result::Result<WalletId, PortError>;
}
