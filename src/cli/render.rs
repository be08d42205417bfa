//! `drupalkit render`: run the render pipeline for one theme hook.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::common::CommandContext;
use crate::core::DrupalKitError;
use crate::render::RenderOptions;

/// Render a theme hook with the templates of the active theme and modules.
#[derive(Debug, Args)]
pub struct RenderCommand {
    /// Theme hook name, e.g. `node`
    name: String,

    /// JSON or YAML file with the render variables
    #[arg(long, value_name = "FILE")]
    vars: Option<PathBuf>,

    /// Suggestion argument, may be repeated (`--arg article --arg full`)
    #[arg(long = "arg", value_name = "ARG")]
    args: Vec<String>,

    /// Wrap the output in THEME DEBUG comments
    #[arg(long)]
    debug: bool,

    /// Active theme, overriding the configured one
    #[arg(long)]
    theme: Option<String>,
}

impl RenderCommand {
    /// Execute the command.
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let mut config = ctx.load_config().await?;
        if let Some(theme) = &self.theme {
            config.theme = Some(theme.clone());
        }
        let debug = self.debug || config.debug;

        let mut variables = match &self.vars {
            Some(path) => read_variables(path).await?,
            None => Value::Object(Map::new()),
        };

        let runtime = ctx.load_runtime_with(config).await?;
        match runtime.config().theme.as_deref() {
            Some(theme) if runtime.theme().is_none() => {
                warn!("Theme '{theme}' was not discovered, rendering with modules only");
            }
            None => debug!("No active theme configured"),
            _ => {}
        }

        let options = RenderOptions::new().with_debug(debug).with_suggestion_args(self.args);
        println!("{}", runtime.render(&self.name, &mut variables, &options));
        Ok(())
    }
}

/// Read render variables from a JSON file, or YAML for `.yml` / `.yaml`.
pub async fn read_variables(path: &Path) -> Result<Value> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read variables from {}", path.display()))?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"));

    let value: Value = if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?
    };

    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        _ => Err(DrupalKitError::Other {
            message: format!("Variables in {} must be an object", path.display()),
        }
        .into()),
    }
}
