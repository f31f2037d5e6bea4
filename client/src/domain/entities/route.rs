//! Named routes reachable from the home header

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Route {
    Notifications,
    NewPost,
    Profile,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Notifications => "notifications",
            Route::NewPost => "newPost",
            Route::Profile => "profile",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
