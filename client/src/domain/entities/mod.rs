//! Domain entities
//!
//! Pure domain models for the home feed.
//! Row shapes match the Supabase tables they are read from.

pub mod change_event;
pub mod post;
pub mod profile;
pub mod route;
pub mod session;

pub use change_event::{ChangeEvent, ChangeKind};
pub use post::{Post, PostId};
pub use profile::{Profile, UserId};
pub use route::Route;
pub use session::{AuthState, Session};
