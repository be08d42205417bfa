//! `drupalkit scan`: show what discovery finds below the root.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::json;

use super::common::{CommandContext, OutputFormat, print_json};
use crate::core::ExtensionKind;
use crate::discovery::{FileKind, search_pattern};
use crate::graph::ExtensionGraph;
use crate::runtime::Runtime;

/// Scan the Drupal root and summarize the discovered files and extensions.
#[derive(Debug, Args)]
pub struct ScanCommand {
    /// List every discovered file instead of counts only
    #[arg(long)]
    files: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl ScanCommand {
    /// Execute the command.
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let runtime = ctx.load_runtime().await?;
        match self.format {
            OutputFormat::Json => print_json(&self.to_json(&runtime)),
            OutputFormat::Text => {
                self.print_text(&runtime);
                Ok(())
            }
        }
    }

    fn to_json(&self, runtime: &Runtime) -> serde_json::Value {
        let extensions: serde_json::Map<String, serde_json::Value> = ExtensionKind::ALL
            .iter()
            .map(|kind| (kind.as_str().to_string(), json!(runtime.collection(*kind).len())))
            .collect();

        let graph = ExtensionGraph::from_collection(runtime.modules());
        let mut output = json!({
            "root": runtime.root(),
            "pattern": search_pattern(&runtime.config().site_uri),
            "extensions": extensions,
            "modules": {
                "missing": graph.missing(),
                "cycle": graph.find_cycle(),
            },
        });
        if self.files {
            output["files"] = json!(runtime.scanned());
        } else {
            output["files"] = FileKind::ALL
                .iter()
                .map(|kind| (kind.as_str().to_string(), json!(runtime.scanned().files(*kind).len())))
                .collect::<serde_json::Map<_, _>>()
                .into();
        }
        output
    }

    fn print_text(&self, runtime: &Runtime) {
        println!("{} {}", "Drupal root:".bold(), runtime.root().display());
        println!("{} {}", "Pattern:".bold(), search_pattern(&runtime.config().site_uri));
        println!();

        for kind in FileKind::ALL {
            let files = runtime.scanned().files(kind);
            println!("{:<12} {}", kind.as_str().cyan(), files.len());
            if self.files {
                for file in files {
                    println!("    {}", file.display());
                }
            }
        }
        println!();

        for kind in ExtensionKind::ALL {
            let count = runtime.collection(kind).len();
            if count > 0 {
                println!("{:<14} {}", kind.plural().green(), count);
            }
        }

        let graph = ExtensionGraph::from_collection(runtime.modules());
        let missing = graph.missing();
        if !missing.is_empty() {
            println!();
            println!("{} {}", "Missing modules:".yellow().bold(), missing.join(", "));
        }
        if let Some(cycle) = graph.find_cycle() {
            println!("{} {}", "Dependency cycle:".yellow().bold(), cycle.join(" → "));
        }
    }
}
