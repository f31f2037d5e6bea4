//! Home screen service
//!
//! The feed screen: a list of posts kept current by a realtime subscription,
//! a growing page cursor, sign-out and the exit confirmation on back press.
//!
//! Lifecycle: `mount` subscribes to the posts feed, starts intercepting back
//! presses and issues the first fetch. Dropping or unmounting the returned
//! [`MountedScreen`] releases both.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::config::{Config, SignOutMode};
use crate::domain::cursor::{PageCursor, DEFAULT_PAGE_SIZE};
use crate::domain::entities::{AuthState, ChangeEvent, Post, PostId, Profile, Route, Session};
use crate::domain::ports::{
    AuthGateway, ButtonStyle, ChangeStream, Device, Dialog, DialogButton, Navigator,
    PostRepository, ProfileRepository, RealtimeFeed, SubscriptionId,
};
use crate::error::{AppError, DomainError};

pub const EXIT_DIALOG_TITLE: &str = "Salir de la aplicación";
pub const EXIT_DIALOG_MESSAGE: &str = "¿Estás seguro de que deseas salir?";
pub const EXIT_CANCEL_LABEL: &str = "Cancelar";
pub const EXIT_CONFIRM_LABEL: &str = "Salir";

pub const SIGN_OUT_ALERT_TITLE: &str = "Sign out";
pub const SIGN_OUT_ALERT_MESSAGE: &str = "Error signing out";

/// Screen settings taken from the configuration
#[derive(Debug, Clone)]
pub struct ScreenSettings {
    pub page_size: usize,
    pub posts_table: String,
    pub sign_out_mode: SignOutMode,
}

impl Default for ScreenSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            posts_table: "posts".to_string(),
            sign_out_mode: SignOutMode::default(),
        }
    }
}

impl From<&Config> for ScreenSettings {
    fn from(config: &Config) -> Self {
        Self {
            page_size: config.page_size,
            posts_table: config.posts_table.clone(),
            sign_out_mode: config.sign_out_mode,
        }
    }
}

/// What the platform should do with a back press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackPress {
    /// The screen consumed it; no other back navigation happens
    Handled,
    /// The screen is not intercepting
    NotHandled,
}

/// Everything needed to draw the screen
#[derive(Debug, Clone)]
pub struct HomeSnapshot {
    /// Header user, hidden while signed out or signing out
    pub user: Option<Profile>,
    pub posts: Vec<Post>,
    /// Rows requested by the last fetch
    pub limit: usize,
}

#[derive(Debug)]
struct FeedState {
    posts: Vec<Post>,
    cursor: PageCursor,
}

/// The home feed screen
pub struct HomeScreen<P, U, A, D, N>
where
    P: PostRepository,
    U: ProfileRepository,
    A: AuthGateway,
    D: Device,
    N: Navigator,
{
    posts: Arc<P>,
    profiles: Arc<U>,
    auth: Arc<A>,
    device: Arc<D>,
    navigator: Arc<N>,
    settings: ScreenSettings,
    feed: Arc<Mutex<FeedState>>,
    auth_state: Arc<Mutex<AuthState>>,
    intercept_back: Arc<AtomicBool>,
    mounted: Arc<AtomicBool>,
    version: Arc<watch::Sender<u64>>,
}

impl<P, U, A, D, N> Clone for HomeScreen<P, U, A, D, N>
where
    P: PostRepository,
    U: ProfileRepository,
    A: AuthGateway,
    D: Device,
    N: Navigator,
{
    fn clone(&self) -> Self {
        Self {
            posts: self.posts.clone(),
            profiles: self.profiles.clone(),
            auth: self.auth.clone(),
            device: self.device.clone(),
            navigator: self.navigator.clone(),
            settings: self.settings.clone(),
            feed: self.feed.clone(),
            auth_state: self.auth_state.clone(),
            intercept_back: self.intercept_back.clone(),
            mounted: self.mounted.clone(),
            version: self.version.clone(),
        }
    }
}

impl<P, U, A, D, N> HomeScreen<P, U, A, D, N>
where
    P: PostRepository,
    U: ProfileRepository,
    A: AuthGateway,
    D: Device,
    N: Navigator,
{
    pub fn new(
        posts: Arc<P>,
        profiles: Arc<U>,
        auth: Arc<A>,
        device: Arc<D>,
        navigator: Arc<N>,
        session: Option<Session>,
        settings: ScreenSettings,
    ) -> Self {
        let auth_state = match session {
            Some(session) => AuthState::SignedIn(session),
            None => AuthState::SignedOut,
        };
        let (version, _) = watch::channel(0);

        Self {
            posts,
            profiles,
            auth,
            device,
            navigator,
            feed: Arc::new(Mutex::new(FeedState {
                posts: Vec::new(),
                cursor: PageCursor::new(settings.page_size),
            })),
            settings,
            auth_state: Arc::new(Mutex::new(auth_state)),
            intercept_back: Arc::new(AtomicBool::new(false)),
            mounted: Arc::new(AtomicBool::new(false)),
            version: Arc::new(version),
        }
    }

    /// Receiver that ticks whenever something visible changed
    pub fn updates(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    fn notify(&self) {
        self.version.send_modify(|v| *v = v.wrapping_add(1));
    }

    #[cfg(test)]
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Current state for rendering
    pub async fn snapshot(&self) -> HomeSnapshot {
        let user = self.auth_state.lock().await.visible_user().cloned();
        let feed = self.feed.lock().await;
        HomeSnapshot {
            user,
            posts: feed.posts.clone(),
            limit: feed.cursor.limit(),
        }
    }

    #[cfg(test)]
    pub async fn auth_state(&self) -> AuthState {
        self.auth_state.lock().await.clone()
    }

    /// Grow the page and replace the whole list with the fetched page.
    ///
    /// A failed fetch leaves the list as it was. The cursor still advances.
    pub async fn load_more(&self) -> Result<usize, AppError> {
        let limit = self.feed.lock().await.cursor.advance();
        tracing::debug!(limit, "Fetching posts");

        match self.posts.fetch_posts(limit).await {
            Ok(page) => {
                let count = page.len();
                self.feed.lock().await.posts = page;
                self.notify();
                tracing::debug!(limit, count, "Feed replaced");
                Ok(count)
            }
            Err(e) => {
                tracing::warn!(limit, "Failed to fetch posts: {}", e);
                Err(e.into())
            }
        }
    }

    /// Apply one realtime change.
    ///
    /// Only inserts carrying an `id` are applied: the author is looked up
    /// (empty profile when the row has no author or the lookup fails) and
    /// the post goes to the top of the list.
    /// Returns the id of the prepended post.
    pub async fn on_realtime_change(&self, event: ChangeEvent) -> Option<PostId> {
        let post = match event.inserted_post() {
            Some(Ok(post)) => post,
            Some(Err(e)) => {
                tracing::warn!("Ignoring undecodable inserted row: {}", e);
                return None;
            }
            None => {
                tracing::trace!(event_type = %event.event_type, "Ignoring change");
                return None;
            }
        };

        let profile = match post.user_id {
            Some(user_id) => match self.profiles.get_user_data(&user_id).await {
                Ok(profile) => profile,
                Err(e) => {
                    tracing::warn!(%user_id, "Profile lookup failed: {}", e);
                    Profile::empty()
                }
            },
            None => {
                tracing::debug!(post_id = %post.id, "Inserted row has no author");
                Profile::empty()
            }
        };

        let post = post.with_author(profile);
        let id = post.id;
        self.feed.lock().await.posts.insert(0, post);
        self.notify();
        tracing::debug!(post_id = %id, "Prepended realtime post");

        Some(id)
    }

    /// Sign the current user out.
    ///
    /// In two-phase mode the local state stays provisional until the backend
    /// confirms and is restored on failure. In optimistic mode it is cleared
    /// up front and never restored. Either way a failure shows one alert.
    pub async fn sign_out(&self) -> Result<(), AppError> {
        let session = {
            let mut state = self.auth_state.lock().await;
            match std::mem::take(&mut *state) {
                AuthState::SignedIn(session) => {
                    *state = match self.settings.sign_out_mode {
                        SignOutMode::TwoPhase => AuthState::SigningOut(session.clone()),
                        SignOutMode::Optimistic => AuthState::SignedOut,
                    };
                    session
                }
                AuthState::SigningOut(session) => {
                    *state = AuthState::SigningOut(session);
                    return Err(DomainError::InvalidState(
                        "sign out already in progress".to_string(),
                    )
                    .into());
                }
                AuthState::SignedOut => return Err(DomainError::NotSignedIn.into()),
            }
        };
        self.notify();

        match self.auth.sign_out().await {
            Ok(()) => {
                *self.auth_state.lock().await = AuthState::SignedOut;
                self.notify();
                tracing::info!(user_id = ?session.user.id, "Signed out");
                Ok(())
            }
            Err(e) => {
                tracing::error!("Sign out failed: {}", e);
                if self.settings.sign_out_mode == SignOutMode::TwoPhase {
                    let mut state = self.auth_state.lock().await;
                    if matches!(*state, AuthState::SigningOut(_)) {
                        *state = AuthState::SignedIn(session);
                    }
                }
                self.notify();

                self.device
                    .present(&Dialog::alert(SIGN_OUT_ALERT_TITLE, SIGN_OUT_ALERT_MESSAGE))
                    .await;
                Err(AppError::SignOut(e.to_string()))
            }
        }
    }

    /// Handle the device back action
    pub async fn on_back_press(&self) -> BackPress {
        if !self.intercept_back.load(Ordering::SeqCst) {
            return BackPress::NotHandled;
        }

        let dialog = exit_dialog();
        let choice = self.device.present(&dialog).await;
        if choice.is_some() && choice == dialog.button_index(EXIT_CONFIRM_LABEL) {
            tracing::info!("Exiting application");
            self.device.exit_app();
        } else {
            tracing::debug!("Exit cancelled");
        }

        BackPress::Handled
    }

    /// Header navigation
    pub fn open(&self, route: Route) {
        tracing::debug!(route = %route, "Navigating");
        self.navigator.push(route);
    }
}

impl<P, U, A, D, N> HomeScreen<P, U, A, D, N>
where
    P: PostRepository + 'static,
    U: ProfileRepository + 'static,
    A: AuthGateway + 'static,
    D: Device + 'static,
    N: Navigator + 'static,
{
    /// Mount the screen: subscribe, intercept back presses, fetch the first page.
    ///
    /// A failing first fetch is not an error; the list just stays empty.
    pub async fn mount<R>(&self, realtime: Arc<R>) -> Result<MountedScreen<R>, AppError>
    where
        R: RealtimeFeed + 'static,
    {
        if self.mounted.swap(true, Ordering::SeqCst) {
            return Err(DomainError::InvalidState("screen already mounted".to_string()).into());
        }

        let stream = match realtime.subscribe(&self.settings.posts_table).await {
            Ok(stream) => stream,
            Err(e) => {
                self.mounted.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
        };
        let subscription = stream.id;
        let pump = self.spawn_pump(stream);

        self.intercept_back.store(true, Ordering::SeqCst);
        tracing::info!(table = %self.settings.posts_table, %subscription, "Home screen mounted");

        if let Err(e) = self.load_more().await {
            tracing::warn!("Initial fetch failed: {}", e);
        }

        Ok(MountedScreen {
            realtime,
            subscription,
            pump: Some(pump),
            intercept_back: self.intercept_back.clone(),
            mounted: self.mounted.clone(),
        })
    }

    /// Single consumer of the change queue; events apply in arrival order
    fn spawn_pump(&self, mut stream: ChangeStream) -> JoinHandle<()> {
        let screen = self.clone();
        tokio::spawn(async move {
            while let Some(event) = stream.events.recv().await {
                screen.on_realtime_change(event).await;
            }
            tracing::debug!(subscription = %stream.id, "Change stream closed");
        })
    }
}

/// Resources held while the screen is mounted
pub struct MountedScreen<R: RealtimeFeed + 'static> {
    realtime: Arc<R>,
    subscription: SubscriptionId,
    pump: Option<JoinHandle<()>>,
    intercept_back: Arc<AtomicBool>,
    mounted: Arc<AtomicBool>,
}

impl<R: RealtimeFeed + 'static> MountedScreen<R> {
    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    /// Release the subscription and stop intercepting back presses
    pub async fn unmount(mut self) {
        self.release_local();
        if let Err(e) = self.realtime.unsubscribe(&self.subscription).await {
            tracing::warn!(subscription = %self.subscription, "Unsubscribe failed: {}", e);
        }
        tracing::info!("Home screen unmounted");
    }

    /// Returns false when already released
    fn release_local(&mut self) -> bool {
        let Some(pump) = self.pump.take() else {
            return false;
        };
        pump.abort();
        self.intercept_back.store(false, Ordering::SeqCst);
        self.mounted.store(false, Ordering::SeqCst);
        true
    }
}

impl<R: RealtimeFeed + 'static> Drop for MountedScreen<R> {
    fn drop(&mut self) {
        if !self.release_local() {
            return;
        }
        // Dropped without unmount: finish the remote release in the background
        let realtime = self.realtime.clone();
        let subscription = self.subscription;
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = realtime.unsubscribe(&subscription).await {
                    tracing::warn!(%subscription, "Unsubscribe failed: {}", e);
                }
            });
        }
    }
}

/// The exit confirmation shown on back press
pub fn exit_dialog() -> Dialog {
    Dialog {
        title: EXIT_DIALOG_TITLE.to_string(),
        message: EXIT_DIALOG_MESSAGE.to_string(),
        buttons: vec![
            DialogButton::new(EXIT_CANCEL_LABEL, ButtonStyle::Cancel),
            DialogButton::new(EXIT_CONFIRM_LABEL, ButtonStyle::Default),
        ],
        cancelable: true,
    }
}
