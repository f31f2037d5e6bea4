//! Backend port traits
//!
//! Row storage and auth live in the managed backend. These traits are the
//! only calls the home screen makes against it.

use async_trait::async_trait;

use crate::domain::entities::{Post, Profile, UserId};
use crate::error::BackendError;

/// Read access to the `posts` table
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Fetch up to `limit` most recent posts, newest first, with authors joined
    async fn fetch_posts(&self, limit: usize) -> Result<Vec<Post>, BackendError>;
}

/// Read access to the `users` table
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Get a single user's profile
    async fn get_user_data(&self, user_id: &UserId) -> Result<Profile, BackendError>;
}

/// Session management on the auth service
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// End the current session on the backend
    async fn sign_out(&self) -> Result<(), BackendError>;
}
