//! Post domain entity
//!
//! A row from the `posts` table plus the author's profile snapshot.
//!
//! Rows pushed by the realtime feed are raw table rows, so decoding is
//! lenient: only `id` is required. Columns of an unexpected shape decode
//! as `None` instead of failing the whole row.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::profile::{Profile, UserId};

/// Unique identifier for a post (bigint row id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PostId(pub i64);

// bigint columns may arrive as JSON strings
impl<'de> Deserialize<'de> for PostId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_i64()
                .map(PostId)
                .ok_or_else(|| serde::de::Error::custom(format!("post id out of range: {}", n))),
            Value::String(s) => s.trim().parse().map(PostId).map_err(serde::de::Error::custom),
            other => Err(serde::de::Error::custom(format!("invalid post id: {}", other))),
        }
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A post in the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    #[serde(rename = "userId", default, deserialize_with = "lenient_user_id")]
    pub user_id: Option<UserId>,
    /// Rich text body (HTML)
    #[serde(default, deserialize_with = "lenient_text")]
    pub body: Option<String>,
    /// Storage path of an attached image or video
    #[serde(default, deserialize_with = "lenient_text")]
    pub file: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    /// Author snapshot, joined by the fetch or looked up for realtime rows.
    /// Weak reference: the profile is not owned by the post.
    #[serde(default)]
    pub user: Option<Profile>,
}

impl Post {
    /// Attach the author's profile
    pub fn with_author(mut self, profile: Profile) -> Self {
        self.user = Some(profile);
        self
    }

    pub fn author_name(&self) -> &str {
        self.user
            .as_ref()
            .map(Profile::display_name)
            .unwrap_or("Unknown")
    }
}

fn lenient_user_id<'de, D>(deserializer: D) -> Result<Option<UserId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Accepts RFC 3339 as well as Postgres `timestamp` without a zone (read as UTC)
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(Value::String(raw)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    Ok(parse_timestamp(&raw))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    // Postgres text output uses a short offset ("+00") and a space separator
    for format in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(ts) = DateTime::parse_from_str(raw, format) {
            return Some(ts.with_timezone(&Utc));
        }
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}
