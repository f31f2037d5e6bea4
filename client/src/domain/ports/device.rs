//! Device port traits
//!
//! Dialogs, process control and navigation provided by the platform.

use async_trait::async_trait;

use crate::domain::entities::Route;

/// Visual role of a dialog button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Default,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogButton {
    pub text: String,
    pub style: ButtonStyle,
}

impl DialogButton {
    pub fn new(text: &str, style: ButtonStyle) -> Self {
        Self {
            text: text.to_string(),
            style,
        }
    }
}

/// A blocking dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub title: String,
    pub message: String,
    pub buttons: Vec<DialogButton>,
    /// Whether the dialog can be dismissed without pressing a button
    pub cancelable: bool,
}

impl Dialog {
    /// A plain alert with a single OK button
    pub fn alert(title: &str, message: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            buttons: vec![DialogButton::new("OK", ButtonStyle::Default)],
            cancelable: false,
        }
    }

    /// Find a button by its label
    pub fn button_index(&self, text: &str) -> Option<usize> {
        self.buttons.iter().position(|b| b.text == text)
    }
}

/// Port trait for platform dialogs and process control
#[async_trait]
pub trait Device: Send + Sync {
    /// Show a dialog and wait for it to close.
    /// Returns the index of the pressed button, `None` when dismissed.
    async fn present(&self, dialog: &Dialog) -> Option<usize>;

    /// Terminate the application
    fn exit_app(&self);
}

/// Port trait for screen navigation
pub trait Navigator: Send + Sync {
    fn push(&self, route: Route);
}
