//! `drupalkit suggest`: theme suggestions for a base hook.

use anyhow::Result;
use clap::Args;

use super::common::{OutputFormat, print_json};
use crate::constants::SUGGESTION_DELIMITER;
use crate::render::suggestions;

/// Print the theme suggestions generated for a base hook.
#[derive(Debug, Args)]
pub struct SuggestCommand {
    /// Base hook name, e.g. `node`
    base: String,

    /// Qualifying arguments, e.g. `article` or a numeric id
    args: Vec<String>,

    /// Separator between suggestion segments
    #[arg(short, long, default_value = SUGGESTION_DELIMITER)]
    delimiter: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl SuggestCommand {
    /// Execute the command.
    pub fn execute(self) -> Result<()> {
        let suggestions = suggestions(&self.args, &self.base, &self.delimiter);
        match self.format {
            OutputFormat::Json => print_json(&suggestions),
            OutputFormat::Text => {
                for suggestion in &suggestions {
                    println!("{suggestion}");
                }
                Ok(())
            }
        }
    }
}
