//! Command parser for the terminal front end
//!
//! Maps typed lines like "more", "back" or "n" onto screen actions.

use crate::domain::entities::Route;
use crate::error::ParseError;

/// Actions a user can take on the home screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Fetch a bigger page
    LoadMore,

    /// Header icon tap
    Open(Route),

    /// Device back action
    Back,

    /// Sign the current user out
    SignOut,

    /// Redraw the screen
    Refresh,

    /// Get help on available commands
    Help,

    /// Leave the screen and stop the client
    Quit,
}

/// Parse a command from one line of input
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let input = input.trim();

    if input.is_empty() {
        return Err(ParseError::Empty);
    }

    // Only the first word matters
    let command = input
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();

    match command.as_str() {
        "more" | "m" | "load" | "next" => Ok(Command::LoadMore),

        "notifications" | "n" | "heart" => Ok(Command::Open(Route::Notifications)),

        "new" | "+" | "post" | "newpost" => Ok(Command::Open(Route::NewPost)),

        "profile" | "p" | "me" => Ok(Command::Open(Route::Profile)),

        "back" | "b" | "esc" => Ok(Command::Back),

        "logout" | "signout" | "sign-out" => Ok(Command::SignOut),

        "refresh" | "r" | "redraw" => Ok(Command::Refresh),

        "help" | "?" | "h" => Ok(Command::Help),

        "quit" | "q" | "exit" => Ok(Command::Quit),

        _ => Err(ParseError::UnknownCommand(command)),
    }
}

/// Generate help text for available commands
pub fn help_text() -> String {
    r#"Commands
  more       - Load more posts
  n          - Open notifications
  +          - Write a new post
  p          - Open your profile
  back       - Device back (asks before exiting)
  logout     - Sign out
  refresh    - Redraw the feed
  help       - Show this help message
  quit       - Leave the feed
"#
    .to_string()
}
