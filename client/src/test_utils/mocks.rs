//! Mock implementations of port traits
//!
//! These are in-memory implementations that can be configured for testing.
//! They store data in memory and record calls so tests can verify behavior.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::domain::entities::{ChangeEvent, Post, Profile, Route, UserId};
use crate::domain::ports::{
    AuthGateway, ChangeStream, Device, Dialog, Navigator, PostRepository, ProfileRepository,
    RealtimeFeed, SubscriptionId,
};
use crate::error::{BackendError, RealtimeError};

// ============================================================================
// In-Memory Post Repository
// ============================================================================

/// Serves the newest `limit` posts from an in-memory table
#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: Arc<RwLock<Vec<Post>>>,
    requested_limits: Arc<RwLock<Vec<usize>>>,
    fail: Arc<AtomicBool>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with posts, newest first
    pub fn with_posts(self, posts: Vec<Post>) -> Self {
        *self.posts.write().unwrap() = posts;
        self
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Limits passed to `fetch_posts`, in call order
    pub fn requested_limits(&self) -> Vec<usize> {
        self.requested_limits.read().unwrap().clone()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn fetch_posts(&self, limit: usize) -> Result<Vec<Post>, BackendError> {
        self.requested_limits.write().unwrap().push(limit);
        if self.fail.load(Ordering::SeqCst) {
            return Err(BackendError::Api {
                status: 500,
                message: "fetch failed".to_string(),
            });
        }
        let posts = self.posts.read().unwrap();
        Ok(posts.iter().take(limit).cloned().collect())
    }
}

// ============================================================================
// In-Memory Profile Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: Arc<RwLock<HashMap<UserId, Profile>>>,
    delays: Arc<RwLock<HashMap<UserId, Duration>>>,
    lookups: Arc<AtomicUsize>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(self, user_id: UserId, profile: Profile) -> Self {
        self.profiles.write().unwrap().insert(user_id, profile);
        self
    }

    /// Make lookups for `user_id` take `delay` before answering
    pub fn with_delay(self, user_id: UserId, delay: Duration) -> Self {
        self.delays.write().unwrap().insert(user_id, delay);
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn get_user_data(&self, user_id: &UserId) -> Result<Profile, BackendError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let delay = self.delays.read().unwrap().get(user_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.profiles
            .read()
            .unwrap()
            .get(user_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("user {}", user_id)))
    }
}

// ============================================================================
// Mock Auth Gateway
// ============================================================================

#[derive(Default)]
pub struct MockAuthGateway {
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl MockAuthGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let gateway = Self::default();
        gateway.fail.store(true, Ordering::SeqCst);
        gateway
    }

    pub fn sign_out_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthGateway for MockAuthGateway {
    async fn sign_out(&self) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            Err(BackendError::Unauthorized)
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Mock Realtime Feed
// ============================================================================

/// Hands out channels and lets tests push events into them
#[derive(Default)]
pub struct MockRealtimeFeed {
    senders: Arc<RwLock<HashMap<SubscriptionId, mpsc::Sender<ChangeEvent>>>>,
    tables: Arc<RwLock<Vec<String>>>,
    unsubscribed: Arc<RwLock<Vec<SubscriptionId>>>,
    fail: AtomicBool,
}

impl MockRealtimeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let feed = Self::default();
        feed.fail.store(true, Ordering::SeqCst);
        feed
    }

    /// Deliver an event to every live subscription. Returns how many got it.
    pub async fn emit(&self, event: ChangeEvent) -> usize {
        let senders: Vec<_> = self.senders.read().unwrap().values().cloned().collect();
        let mut delivered = 0;
        for sender in senders {
            if sender.send(event.clone()).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    pub fn subscribed_tables(&self) -> Vec<String> {
        self.tables.read().unwrap().clone()
    }

    pub fn live_subscriptions(&self) -> usize {
        self.senders.read().unwrap().len()
    }

    pub fn unsubscribed(&self) -> Vec<SubscriptionId> {
        self.unsubscribed.read().unwrap().clone()
    }
}

#[async_trait]
impl RealtimeFeed for MockRealtimeFeed {
    async fn subscribe(&self, table: &str) -> Result<ChangeStream, RealtimeError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RealtimeError::JoinRejected("mock rejected join".to_string()));
        }
        let (tx, rx) = mpsc::channel(64);
        let id = SubscriptionId::new();
        self.senders.write().unwrap().insert(id, tx);
        self.tables.write().unwrap().push(table.to_string());
        Ok(ChangeStream { id, events: rx })
    }

    async fn unsubscribe(&self, id: &SubscriptionId) -> Result<(), RealtimeError> {
        self.senders.write().unwrap().remove(id);
        self.unsubscribed.write().unwrap().push(*id);
        Ok(())
    }
}

// ============================================================================
// Mock Device
// ============================================================================

/// Answers dialogs from a script and records what was shown
#[derive(Default)]
pub struct MockDevice {
    answers: Arc<RwLock<VecDeque<Option<String>>>>,
    presented: Arc<RwLock<Vec<Dialog>>>,
    exits: AtomicUsize,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the label of the next button to press
    pub fn press(self, label: &str) -> Self {
        self.answers
            .write()
            .unwrap()
            .push_back(Some(label.to_string()));
        self
    }

    /// Queue a dismissal for the next dialog
    pub fn dismiss(self) -> Self {
        self.answers.write().unwrap().push_back(None);
        self
    }

    pub fn presented(&self) -> Vec<Dialog> {
        self.presented.read().unwrap().clone()
    }

    pub fn exit_count(&self) -> usize {
        self.exits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Device for MockDevice {
    async fn present(&self, dialog: &Dialog) -> Option<usize> {
        self.presented.write().unwrap().push(dialog.clone());
        let answer = self.answers.write().unwrap().pop_front().flatten();
        // Unscripted dialogs press their first button, like an alert's OK
        match answer {
            Some(label) => dialog.button_index(&label),
            None if dialog.cancelable => None,
            None => Some(0),
        }
    }

    fn exit_app(&self) {
        self.exits.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Recording Navigator
// ============================================================================

#[derive(Default)]
pub struct RecordingNavigator {
    routes: RwLock<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes.read().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn push(&self, route: Route) {
        self.routes.write().unwrap().push(route);
    }
}
