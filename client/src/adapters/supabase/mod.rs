//! Supabase adapters
//!
//! REST/auth client and realtime channel for a Supabase project.

pub mod realtime;
pub mod rest;

pub use realtime::SupabaseRealtime;
pub use rest::SupabaseClient;
