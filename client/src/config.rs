//! Client configuration from the environment (and `.env`)
//!
//! Sign-out defaults to the two-phase flow: the header user is hidden while
//! the backend call is pending and comes back if the call fails, so the
//! screen never shows a signed-out state the backend did not confirm.
//! `SIGN_OUT_MODE=optimistic` keeps the older flow that clears local state
//! up front and never restores it.

use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use uuid::Uuid;

use crate::domain::entities::UserId;

/// How the local auth state behaves while a remote sign-out is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignOutMode {
    /// Local state is provisional until the backend confirms; rolled back on failure
    #[default]
    TwoPhase,
    /// Local state is cleared up front and never restored
    Optimistic,
}

impl FromStr for SignOutMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "two-phase" | "two_phase" | "twophase" => Ok(SignOutMode::TwoPhase),
            "optimistic" => Ok(SignOutMode::Optimistic),
            other => Err(anyhow!("unknown SIGN_OUT_MODE: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub anon_key: String,
    /// Access token of the signed-in session
    pub access_token: String,
    pub user_id: UserId,
    /// Rows added to the request size on every fetch
    pub page_size: usize,
    pub posts_table: String,
    pub users_table: String,
    pub sign_out_mode: SignOutMode,
    pub heartbeat_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let user_id = env::var("SUPABASE_USER_ID").context("SUPABASE_USER_ID must be set")?;
        let user_id = Uuid::parse_str(user_id.trim())
            .context("SUPABASE_USER_ID must be a UUID")?
            .into();

        let sign_out_mode = match env::var("SIGN_OUT_MODE") {
            Ok(mode) => mode.parse()?,
            Err(_) => SignOutMode::default(),
        };

        Ok(Self {
            supabase_url: env::var("SUPABASE_URL").context("SUPABASE_URL must be set")?,
            anon_key: env::var("SUPABASE_ANON_KEY").context("SUPABASE_ANON_KEY must be set")?,
            access_token: env::var("SUPABASE_ACCESS_TOKEN")
                .context("SUPABASE_ACCESS_TOKEN must be set")?,
            user_id,
            page_size: parse_or("FEED_PAGE_SIZE", 10)?,
            posts_table: env::var("POSTS_TABLE").unwrap_or_else(|_| "posts".to_string()),
            users_table: env::var("USERS_TABLE").unwrap_or_else(|_| "users".to_string()),
            sign_out_mode,
            heartbeat_secs: non_zero(
                "REALTIME_HEARTBEAT_SECS",
                parse_or("REALTIME_HEARTBEAT_SECS", 25)?,
            )?,
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} is not a valid number", key)),
        Err(_) => Ok(default),
    }
}

fn non_zero(key: &str, value: u64) -> Result<u64> {
    if value == 0 {
        return Err(anyhow!("{} must be greater than zero", key));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_out_mode_parses_known_values() {
        assert_eq!(
            "two-phase".parse::<SignOutMode>().unwrap(),
            SignOutMode::TwoPhase
        );
        assert_eq!(
            "Optimistic".parse::<SignOutMode>().unwrap(),
            SignOutMode::Optimistic
        );
        assert!("eventually".parse::<SignOutMode>().is_err());
    }

    #[test]
    fn zero_heartbeat_is_rejected() {
        let err = non_zero("REALTIME_HEARTBEAT_SECS", 0).unwrap_err();
        assert!(err.to_string().contains("REALTIME_HEARTBEAT_SECS"));
        assert_eq!(non_zero("REALTIME_HEARTBEAT_SECS", 25).unwrap(), 25);
    }

    #[test]
    fn sign_out_mode_defaults_to_two_phase() {
        assert_eq!(SignOutMode::default(), SignOutMode::TwoPhase);
    }
}
