//! Spinner shown while a Drupal root is being scanned.
//!
//! Hidden when `DRUPALKIT_NO_PROGRESS` is set, when `--quiet` or
//! `--no-progress` is passed, or when stderr is not a terminal.

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

/// Environment variable disabling progress output.
pub const NO_PROGRESS_ENV: &str = "DRUPALKIT_NO_PROGRESS";

fn is_progress_disabled() -> bool {
    std::env::var_os(NO_PROGRESS_ENV).is_some() || !std::io::stderr().is_terminal()
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{prefix:.bold} {spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
}

/// A spinner that may be hidden.
#[derive(Clone)]
pub struct Spinner {
    inner: IndicatifBar,
}

impl Spinner {
    /// Start a spinner with `msg`, unless progress output is disabled.
    pub fn start(msg: impl Into<String>, enabled: bool) -> Self {
        let inner = if enabled && !is_progress_disabled() {
            let bar = IndicatifBar::new_spinner();
            bar.set_style(spinner_style());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            IndicatifBar::hidden()
        };
        inner.set_message(msg.into());
        Self {
            inner,
        }
    }

    /// Replace the spinner message.
    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    /// Whether the spinner draws nothing.
    pub fn is_hidden(&self) -> bool {
        self.inner.is_hidden()
    }

    /// Remove the spinner from the terminal.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}
