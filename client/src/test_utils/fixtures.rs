//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.

use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::entities::{Post, PostId, Profile, Session, UserId};

/// Create a fresh user id
pub fn test_user_id() -> UserId {
    UserId(Uuid::new_v4())
}

/// Create a profile for `user_id` with a name
pub fn test_profile(user_id: UserId, name: &str) -> Profile {
    Profile {
        id: Some(user_id),
        name: Some(name.to_string()),
        image: Some(format!("profiles/{}.png", name.to_lowercase())),
        ..Profile::default()
    }
}

/// Create a signed-in session
pub fn test_session() -> Session {
    Session {
        user: test_profile(test_user_id(), "Me"),
        access_token: "test-access-token".to_string(),
    }
}

/// Create a post with no author attached
pub fn test_post(id: i64, user_id: UserId) -> Post {
    Post {
        id: PostId(id),
        user_id: Some(user_id),
        body: Some(format!("<p>post {}</p>", id)),
        file: None,
        created_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(id)),
        user: None,
    }
}

/// Create `count` posts by one author, newest first, ids `count..=1`
pub fn test_posts(count: i64, author: &Profile) -> Vec<Post> {
    let user_id = author.id.unwrap_or_else(test_user_id);
    (1..=count)
        .rev()
        .map(|id| test_post(id, user_id).with_author(author.clone()))
        .collect()
}

/// A raw `posts` row as the realtime feed delivers it
pub fn test_post_row(id: i64, user_id: UserId) -> Value {
    json!({
        "id": id,
        "userId": user_id.to_string(),
        "body": format!("<p>live {}</p>", id),
        "file": null,
        "created_at": "2024-05-02T08:30:00+00:00"
    })
}
