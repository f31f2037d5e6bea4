//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod supabase;
pub mod terminal;

pub use supabase::{SupabaseClient, SupabaseRealtime};
pub use terminal::{spawn_stdin_reader, InputLines, TerminalDevice, TerminalNavigator};
