//! Command-line interface for drupalkit.
//!
//! Every subcommand lives in its own module and implements an `execute`
//! method. Global flags are turned into a [`CliConfig`] (logging and progress)
//! and a [`CommandContext`] (how to find and load the project).
//!
//! # Commands
//!
//! - `scan` - Summarize the files and extensions discovered below the root
//! - `list` - List modules, themes, theme engines, libraries, vendors and sites
//! - `deps` - Dependency closure or tree of a module
//! - `base-themes` - Base theme chain of a theme
//! - `suggest` - Theme suggestions for a base hook
//! - `render` - Run the render pipeline for a theme hook
//! - `drush` / `composer` - Run the PHP tools and print their JSON output
//!
//! # Global options
//!
//! - `--verbose` / `--quiet` - Log at debug level / errors only
//! - `--config <FILE>` - Use a specific `drupalkit.toml`
//! - `--root <DIR>` - Drupal root, overriding the configured one
//! - `--no-progress` - Never show the scan spinner

mod common;
mod deps;
mod list;
mod progress;
mod render;
mod scan;
mod suggest;
mod tools;


pub use common::{CommandContext, OutputFormat};
pub use progress::NO_PROGRESS_ENV;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Settings derived from the global flags that affect the whole process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter directive; `None` keeps `RUST_LOG` or the default
    pub log_level: Option<String>,
    /// Disable progress output
    pub no_progress: bool,
}

impl CliConfig {
    /// Configuration with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Drupal code base toolkit.
#[derive(Debug, Parser)]
#[command(
    name = "drupalkit",
    about = "Inspect Drupal code bases and render theme hooks",
    version,
    long_about = "drupalkit discovers the modules, themes and templates of a Drupal root, \
                  resolves dependencies and base themes, renders theme hooks with their \
                  preprocess hooks and template suggestions, and wraps drush and composer."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to drupalkit.toml
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Drupal root directory
    #[arg(short, long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Disable progress spinners
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scan the Drupal root
    Scan(scan::ScanCommand),
    /// List discovered extensions
    List(list::ListCommand),
    /// Show the dependency closure of a module
    Deps(deps::DepsCommand),
    /// Show the base theme chain of a theme
    BaseThemes(deps::BaseThemesCommand),
    /// Generate theme suggestions
    Suggest(suggest::SuggestCommand),
    /// Render a theme hook
    Render(render::RenderCommand),
    /// Run drush with JSON output
    Drush(tools::DrushCommand),
    /// Run composer with JSON output
    Composer(tools::ComposerCommand),
}

impl Cli {
    /// Settings for logging and progress output.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            no_progress: self.no_progress || self.quiet,
        }
    }

    /// How subcommands locate the project.
    #[must_use]
    pub fn command_context(&self) -> CommandContext {
        let config = self.build_config();
        CommandContext {
            config_path: self.config.clone(),
            root: self.root.clone(),
            show_progress: !config.no_progress,
        }
    }

    /// Run the selected subcommand.
    pub async fn execute(self) -> Result<()> {
        let ctx = self.command_context();
        match self.command {
            Commands::Scan(cmd) => cmd.execute(&ctx).await,
            Commands::List(cmd) => cmd.execute(&ctx).await,
            Commands::Deps(cmd) => cmd.execute(&ctx).await,
            Commands::BaseThemes(cmd) => cmd.execute(&ctx).await,
            Commands::Suggest(cmd) => cmd.execute(),
            Commands::Render(cmd) => cmd.execute(&ctx).await,
            Commands::Drush(cmd) => cmd.execute(&ctx).await,
            Commands::Composer(cmd) => cmd.execute(&ctx).await,
        }
    }
}
