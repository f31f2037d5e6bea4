//! Feed module
//!
//! Text rendering of the home screen.

pub mod renderer;

pub use renderer::render_home;
