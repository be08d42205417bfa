//! Plumbing shared by the subcommands.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

use super::progress::Spinner;
use crate::config::ProjectConfig;
use crate::runtime::Runtime;

/// Output format of listing commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored when stdout is a terminal
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Global options every subcommand needs to locate and load the project.
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    /// Explicit configuration file
    pub config_path: Option<PathBuf>,
    /// Drupal root overriding the configured one
    pub root: Option<PathBuf>,
    /// Show a spinner while loading
    pub show_progress: bool,
}

impl CommandContext {
    /// Load the configuration and apply command-line overrides.
    pub async fn load_config(&self) -> Result<ProjectConfig> {
        let mut config = ProjectConfig::load_with_optional(self.config_path.clone()).await?;
        if let Some(root) = &self.root {
            debug!("Root overridden on the command line: {}", root.display());
            config.root = root.to_string_lossy().into_owned();
            config.base_dir = None;
        }
        Ok(config)
    }

    /// Load the configuration and discover the Drupal root.
    pub async fn load_runtime(&self) -> Result<Runtime> {
        let config = self.load_config().await?;
        self.load_runtime_with(config).await
    }

    /// Discover the Drupal root described by `config`.
    pub async fn load_runtime_with(&self, config: ProjectConfig) -> Result<Runtime> {
        let spinner = Spinner::start(format!("Scanning {}", config.root), self.show_progress);
        let result = Runtime::load(config).await;
        spinner.finish_and_clear();
        result
    }
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
