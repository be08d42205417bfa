//! `drupalkit deps` and `drupalkit base-themes`: extension relations.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::json;

use super::common::{CommandContext, OutputFormat, print_json};
use crate::graph::{ExtensionGraph, Resolution};

/// Show the dependency closure of a module.
#[derive(Debug, Args)]
pub struct DepsCommand {
    /// Machine name of the module
    module: String,

    /// Draw the dependency tree instead of the flat closure
    #[arg(long, conflicts_with = "order")]
    tree: bool,

    /// Print the enable order, dependencies first
    #[arg(long)]
    order: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl DepsCommand {
    /// Execute the command.
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let runtime = ctx.load_runtime().await?;
        let resolution = runtime.dependency_closure(&self.module)?;

        if self.tree {
            let graph = ExtensionGraph::from_collection(runtime.modules());
            print!("{}", graph.to_tree_string(&self.module));
            print_diagnostics(&resolution);
            return Ok(());
        }

        if self.order {
            let graph = ExtensionGraph::from_collection(runtime.modules());
            let order = graph.enable_order(&self.module, &resolution.ids)?;
            match self.format {
                OutputFormat::Json => print_json(&json!({"name": self.module, "order": order}))?,
                OutputFormat::Text => {
                    println!("{}", format!("Enable order for {}", self.module).cyan().bold());
                    for (position, id) in order.iter().enumerate() {
                        println!("  {:>2}. {}", position + 1, id.green());
                    }
                }
            }
            print_diagnostics(&resolution);
            return Ok(());
        }

        match self.format {
            OutputFormat::Json => print_json(&resolution_json(&self.module, &resolution)),
            OutputFormat::Text => {
                print_resolution(
                    &format!("Dependencies of {}", self.module),
                    &resolution,
                    "no dependencies",
                );
                Ok(())
            }
        }
    }
}

/// Show the base theme chain of a theme.
#[derive(Debug, Args)]
pub struct BaseThemesCommand {
    /// Machine name of the theme
    theme: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl BaseThemesCommand {
    /// Execute the command.
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let runtime = ctx.load_runtime().await?;
        let resolution = runtime.base_chain(&self.theme)?;

        match self.format {
            OutputFormat::Json => print_json(&resolution_json(&self.theme, &resolution)),
            OutputFormat::Text => {
                print_resolution(
                    &format!("Base themes of {}", self.theme),
                    &resolution,
                    "no base theme",
                );
                Ok(())
            }
        }
    }
}

fn resolution_json(name: &str, resolution: &Resolution) -> serde_json::Value {
    json!({
        "name": name,
        "resolved": resolution.ids,
        "diagnostics": resolution.diagnostics.iter().map(ToString::to_string).collect::<Vec<_>>(),
    })
}

fn print_resolution(title: &str, resolution: &Resolution, empty: &str) {
    println!("{}", title.cyan().bold());
    if resolution.is_empty() {
        println!("  ({empty})");
    }
    for id in &resolution.ids {
        println!("  {}", id.green());
    }
    print_diagnostics(resolution);
}

fn print_diagnostics(resolution: &Resolution) {
    for diagnostic in &resolution.diagnostics {
        eprintln!("{}: {}", "warning".yellow().bold(), diagnostic);
    }
}
