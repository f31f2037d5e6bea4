//! Application layer
//!
//! Contains the home screen use cases and the terminal command parser.
//! The screen coordinates between domain entities, ports, and the platform.

pub mod command;
pub mod home_screen;

pub use command::{help_text, parse_command, Command};
pub use home_screen::{BackPress, HomeScreen, HomeSnapshot, ScreenSettings};
