//! Domain layer
//!
//! Contains pure feed logic with no external dependencies.
//! - `entities`: Domain models (posts, profiles, change events, auth state)
//! - `ports`: Trait definitions for the backend, realtime feed and device
//! - `cursor`: Page-size cursor owned by a screen instance

pub mod cursor;
pub mod entities;
pub mod ports;
