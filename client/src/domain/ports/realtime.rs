//! Realtime feed port trait
//!
//! A subscription is a handle plus a single-consumer queue of change events.
//! The queue closes once the subscription is released.

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::domain::entities::ChangeEvent;
use crate::error::RealtimeError;

/// Identifier of a live subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Events of one subscription, in the order the feed delivered them
#[derive(Debug)]
pub struct ChangeStream {
    pub id: SubscriptionId,
    pub events: mpsc::Receiver<ChangeEvent>,
}

/// Port trait for row change subscriptions
#[async_trait]
pub trait RealtimeFeed: Send + Sync {
    /// Subscribe to every change on `table`
    async fn subscribe(&self, table: &str) -> Result<ChangeStream, RealtimeError>;

    /// Release a subscription. Unknown ids are ignored.
    async fn unsubscribe(&self, id: &SubscriptionId) -> Result<(), RealtimeError>;
}
