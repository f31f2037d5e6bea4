//! Terminal platform adapter
//!
//! Dialogs are printed to stdout and answered on the shared input line
//! queue. Exiting only raises a flag; the front end unmounts and quits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};

use crate::domain::entities::Route;
use crate::domain::ports::{ButtonStyle, Device, Dialog, Navigator};

/// Lines typed by the user, shared by the command loop and dialogs
pub type InputLines = Arc<Mutex<mpsc::Receiver<String>>>;

/// Read stdin line by line on a background task
pub fn spawn_stdin_reader() -> InputLines {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    Arc::new(Mutex::new(rx))
}

pub struct TerminalDevice {
    input: InputLines,
    exit_requested: AtomicBool,
}

impl TerminalDevice {
    pub fn new(input: InputLines) -> Self {
        Self {
            input,
            exit_requested: AtomicBool::new(false),
        }
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Device for TerminalDevice {
    async fn present(&self, dialog: &Dialog) -> Option<usize> {
        println!("{}", render_dialog(dialog));

        let answer = self.input.lock().await.recv().await;
        match answer {
            Some(line) => resolve_choice(dialog, &line),
            None => default_choice(dialog),
        }
    }

    fn exit_app(&self) {
        self.exit_requested.store(true, Ordering::SeqCst);
    }
}

/// Routes lead to screens this client does not have; just announce them
#[derive(Default)]
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn push(&self, route: Route) {
        println!("-> {}", route);
    }
}

fn render_dialog(dialog: &Dialog) -> String {
    let mut buf = format!("\n[ {} ]\n{}\n", dialog.title, dialog.message);
    for (i, button) in dialog.buttons.iter().enumerate() {
        let marker = match button.style {
            ButtonStyle::Cancel => " (cancel)",
            ButtonStyle::Default => "",
        };
        buf.push_str(&format!("  {}) {}{}\n", i + 1, button.text, marker));
    }
    buf.push_str("> ");
    buf
}

fn default_choice(dialog: &Dialog) -> Option<usize> {
    if dialog.cancelable || dialog.buttons.is_empty() {
        None
    } else {
        Some(0)
    }
}

/// Map a typed answer onto a button: its number or its label
fn resolve_choice(dialog: &Dialog, input: &str) -> Option<usize> {
    let input = input.trim();
    if input.is_empty() {
        return default_choice(dialog);
    }
    if let Ok(n) = input.parse::<usize>() {
        if (1..=dialog.buttons.len()).contains(&n) {
            return Some(n - 1);
        }
    }
    dialog
        .buttons
        .iter()
        .position(|b| b.text.eq_ignore_ascii_case(input))
        .or_else(|| default_choice(dialog))
}
