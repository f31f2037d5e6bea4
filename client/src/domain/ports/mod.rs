//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod backend;
pub mod device;
pub mod realtime;

pub use backend::{AuthGateway, PostRepository, ProfileRepository};
pub use device::{ButtonStyle, Device, Dialog, DialogButton, Navigator};
pub use realtime::{ChangeStream, RealtimeFeed, SubscriptionId};
