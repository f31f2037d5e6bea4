//! Hollow Mates feed client
//!
//! Terminal front end for the Hollow Mates home feed: a live list of posts
//! from a Supabase project, kept current over the realtime channel.
//! Uses hexagonal (ports & adapters) architecture for clean separation of concerns.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod config;
mod domain;
mod error;
mod feed;

#[cfg(test)]
mod test_utils;


use adapters::{
    spawn_stdin_reader, InputLines, SupabaseClient, SupabaseRealtime, TerminalDevice,
    TerminalNavigator,
};
use app::{help_text, parse_command, BackPress, Command, HomeScreen, ScreenSettings};
use config::Config;
use domain::entities::{Profile, Session};
use domain::ports::ProfileRepository;
use error::ParseError;

type TerminalHome =
    HomeScreen<SupabaseClient, SupabaseClient, SupabaseClient, TerminalDevice, TerminalNavigator>;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout is the screen
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hollow_mates=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Hollow Mates...");

    let config = Config::from_env()?;

    let backend = Arc::new(
        SupabaseClient::new(
            &config.supabase_url,
            &config.anon_key,
            &config.access_token,
            &config.posts_table,
            &config.users_table,
        )
        .context("Failed to build Supabase client")?,
    );

    // Signed-in user's profile for the header
    let user = match backend.get_user_data(&config.user_id).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(user_id = %config.user_id, "Could not load profile: {}", e);
            Profile {
                id: Some(config.user_id),
                ..Profile::default()
            }
        }
    };
    let session = Session {
        user,
        access_token: config.access_token.clone(),
    };

    let realtime = Arc::new(SupabaseRealtime::new(
        &config.supabase_url,
        &config.anon_key,
        &config.access_token,
        Duration::from_secs(config.heartbeat_secs),
    ));

    let input = spawn_stdin_reader();
    let device = Arc::new(TerminalDevice::new(input.clone()));

    let screen = HomeScreen::new(
        backend.clone(),
        backend.clone(),
        backend.clone(),
        device.clone(),
        Arc::new(TerminalNavigator),
        Some(session),
        ScreenSettings::from(&config),
    );

    let mounted = screen
        .mount(realtime)
        .await
        .context("Failed to mount home screen")?;
    tracing::debug!(subscription = %mounted.subscription(), "Listening for new posts");

    println!("{}", help_text());
    run(&screen, &device, &input).await;

    mounted.unmount().await;
    tracing::info!("Bye");
    Ok(())
}

/// Command loop: redraw on every change, act on every typed line
async fn run(screen: &TerminalHome, device: &TerminalDevice, input: &InputLines) {
    let mut updates = screen.updates();
    draw(screen).await;

    loop {
        tokio::select! {
            line = async { input.lock().await.recv().await } => {
                let Some(line) = line else {
                    break;
                };
                let command = match parse_command(&line) {
                    Ok(command) => command,
                    Err(ParseError::Empty) => continue,
                    Err(e) => {
                        println!("{} (type `help`)", e);
                        continue;
                    }
                };
                if !execute(screen, command).await || device.exit_requested() {
                    break;
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                draw(screen).await;
            }
        }
    }
}

/// Returns false when the client should stop
async fn execute(screen: &TerminalHome, command: Command) -> bool {
    match command {
        Command::LoadMore => {
            // A failed fetch keeps the current list; already logged
            let _ = screen.load_more().await;
        }
        Command::Open(route) => screen.open(route),
        Command::Back => {
            if screen.on_back_press().await == BackPress::NotHandled {
                println!("Nothing to go back to.");
            }
        }
        Command::SignOut => match screen.sign_out().await {
            Ok(()) => {
                println!("Signed out.");
                return false;
            }
            Err(e) if e.is_remote() => tracing::warn!("{}", e),
            Err(e) => println!("{}", e),
        },
        Command::Refresh => draw(screen).await,
        Command::Help => println!("{}", help_text()),
        Command::Quit => return false,
    }
    true
}

async fn draw(screen: &TerminalHome) {
    let snapshot = screen.snapshot().await;
    tracing::trace!(limit = snapshot.limit, posts = snapshot.posts.len(), "Redraw");
    println!("{}", feed::render_home(&snapshot, chrono::Utc::now()));
}
