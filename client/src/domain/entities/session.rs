//! Local auth state
//!
//! The screen never owns the backend session, only the local view of it.
//! Sign-out moves through a provisional state so it can be committed or
//! rolled back once the backend answers.

use super::profile::Profile;

/// A signed-in session as seen by the client
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: Profile,
    pub access_token: String,
}

/// Local auth state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    SignedIn(Session),
    /// Sign-out requested, waiting on the backend
    SigningOut(Session),
    #[default]
    SignedOut,
}

impl AuthState {
    /// The user shown in the header. Hidden while a sign-out is pending.
    pub fn visible_user(&self) -> Option<&Profile> {
        match self {
            AuthState::SignedIn(session) => Some(&session.user),
            AuthState::SigningOut(_) | AuthState::SignedOut => None,
        }
    }
}
