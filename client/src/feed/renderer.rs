//! Feed renderer
//!
//! Renders the home screen snapshot as plain text for the terminal.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::app::HomeSnapshot;
use crate::domain::entities::{Post, Profile};

pub const APP_TITLE: &str = "Hollow Mates";

/// Render the whole screen
pub fn render_home(snapshot: &HomeSnapshot, now: DateTime<Utc>) -> String {
    let mut buf = String::new();

    // Header
    buf.push_str(&render_header(snapshot.user.as_ref()));
    buf.push_str(&"=".repeat(40));
    buf.push_str("\n\n");

    for post in &snapshot.posts {
        buf.push_str(&render_post(post, now));
        buf.push('\n');
    }

    // Footer loader; more room when the list is empty
    if snapshot.posts.is_empty() {
        buf.push_str("\n\n");
    }
    buf.push_str("  ... loading ...\n");

    buf
}

fn render_header(user: Option<&Profile>) -> String {
    let avatar = match user {
        Some(profile) => format!("[@{}]", profile.display_name()),
        None => "[@ -]".to_string(),
    };
    format!("{}    [<3 n] [+ new] {} p\n", APP_TITLE, avatar)
}

fn render_post(post: &Post, now: DateTime<Utc>) -> String {
    let mut card = post.author_name().to_string();
    if let Some(created_at) = post.created_at {
        card.push_str(&format!("  · {}", relative_time(created_at, now)));
    }
    card.push('\n');

    if let Some(body) = post.body.as_deref() {
        let text = strip_html(body);
        if !text.is_empty() {
            for line in text.lines() {
                card.push_str(&format!("  {}\n", line));
            }
        }
    }

    if let Some(file) = post.file.as_deref() {
        card.push_str(&format!("  [attachment: {}]\n", file));
    }

    card
}

/// Short age of a post, e.g. "5m", "3h", "2d", or the date for older posts
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(at);
    if age.num_minutes() < 1 {
        "just now".to_string()
    } else if age.num_hours() < 1 {
        format!("{}m", age.num_minutes())
    } else if age.num_days() < 1 {
        format!("{}h", age.num_hours())
    } else if age.num_days() < 7 {
        format!("{}d", age.num_days())
    } else {
        at.format("%-d %b").to_string()
    }
}

fn tag_pattern() -> &'static Option<Regex> {
    static TAGS: OnceLock<Option<Regex>> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"<[^>]*>").ok())
}

/// Plain text of a rich text body
pub fn strip_html(body: &str) -> String {
    let with_breaks = body
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n")
        .replace("</p>", "\n")
        .replace("</div>", "\n");

    let text = match tag_pattern() {
        Some(re) => re.replace_all(&with_breaks, "").into_owned(),
        None => with_breaks,
    };

    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
