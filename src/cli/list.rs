//! `drupalkit list`: discovered extensions by kind.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::{Map, Value};

use super::common::{CommandContext, OutputFormat, print_json};
use crate::core::ExtensionKind;
use crate::entity::{Collection, Entity};
use crate::runtime::Runtime;

/// List discovered extensions.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only list one kind (module, theme, theme_engine, library, vendor, site)
    #[arg(short, long)]
    kind: Option<ExtensionKind>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl ListCommand {
    /// Execute the command.
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let runtime = ctx.load_runtime().await?;
        let kinds = self.kinds();

        match self.format {
            OutputFormat::Json => print_json(&to_json(&runtime, &kinds)),
            OutputFormat::Text => {
                print_text(&runtime, &kinds);
                Ok(())
            }
        }
    }

    fn kinds(&self) -> Vec<ExtensionKind> {
        match self.kind {
            Some(kind) => vec![kind],
            None => ExtensionKind::ALL.to_vec(),
        }
    }
}

fn to_json(runtime: &Runtime, kinds: &[ExtensionKind]) -> Value {
    if let [kind] = kinds {
        return Value::Array(runtime.collection(*kind).to_maps().into_iter().map(Value::Object).collect());
    }

    let grouped: Map<String, Value> = kinds
        .iter()
        .map(|kind| {
            let items =
                runtime.collection(*kind).to_maps().into_iter().map(Value::Object).collect();
            (kind.as_str().to_string(), Value::Array(items))
        })
        .collect();
    Value::Object(grouped)
}

fn print_text(runtime: &Runtime, kinds: &[ExtensionKind]) {
    let mut printed = false;
    for kind in kinds {
        let collection = runtime.collection(*kind);
        if collection.is_empty() && kinds.len() > 1 {
            continue;
        }
        if printed {
            println!();
        }
        print_collection(*kind, collection);
        printed = true;
    }

    if !printed {
        println!("No extensions found.");
    }
}

fn print_collection(kind: ExtensionKind, collection: &Collection) {
    let title = kind.plural();
    let mut chars = title.chars();
    let title: String =
        chars.next().map(|c| c.to_uppercase().chain(chars).collect()).unwrap_or_default();
    println!("{} ({})", title.cyan().bold(), collection.len());

    if collection.is_empty() {
        println!("  (none)");
        return;
    }

    let width = collection.ids().iter().map(|id| id.len()).max().unwrap_or(0);
    for entity in collection {
        println!("  {}", describe(entity, width));
    }
}

fn describe(entity: &Entity, width: usize) -> String {
    let id = entity.id().unwrap_or_default();
    let mut line = format!("{}{}", id.green(), " ".repeat(width.saturating_sub(id.len())));

    let label = entity.name().filter(|name| *name != id);
    if let Some(label) = label {
        line.push_str(&format!("  {label}"));
    }
    let location = entity.info_file().or_else(|| entity.get_str("path"));
    if let Some(location) = location {
        line.push_str(&format!("  {}", location.dimmed()));
    }
    line
}
