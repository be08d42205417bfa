//! `drupalkit drush` and `drupalkit composer`: JSON passthrough to the PHP tools.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::{CommandContext, print_json};
use crate::tools::CommandOutput;

/// Run a drush command for the configured site and print its JSON output.
#[derive(Debug, Args)]
pub struct DrushCommand {
    /// Drush command and arguments, e.g. `pm:list --status=enabled`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl DrushCommand {
    /// Execute the command.
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let config = ctx.load_config().await?;
        let root = config.resolved_root()?;
        let drush = crate::tools::Drush::new(&config.drush_bin, &config.site_uri, root);
        let output = drush.run(&self.args.join(" ")).await?;
        print_output(&output)
    }
}

/// Run a composer command in the project and print its JSON output.
#[derive(Debug, Args)]
pub struct ComposerCommand {
    /// Composer command and arguments, e.g. `show --direct`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl ComposerCommand {
    /// Execute the command.
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let config = ctx.load_config().await?;
        let root = config.resolved_root()?;
        let composer = crate::tools::Composer::new(&config.composer_bin, root);
        let output = composer.run(&self.args.join(" ")).await?;
        print_output(&output)
    }
}

fn print_output(output: &CommandOutput) -> Result<()> {
    if !output.stderr.trim().is_empty() {
        eprintln!("{}", output.stderr.trim_end().dimmed());
    }
    print_json(&output.stdout)
}
