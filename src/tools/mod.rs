//! Drush and Composer invocation.
//!
//! Both tools are asked for JSON and their standard output is parsed:
//!
//! ```text
//! <drush_bin> --uri=<site_uri> <command...> --format=json
//! <composer_bin> --format=json <command...>
//! ```
//!
//! Commands run in the Drupal root. An empty standard output parses as `null`.
//! A binary given as a path (`./vendor/bin/drush`) is resolved against the
//! root; a bare name is looked up on `PATH`. Spawning is retried briefly when
//! the executable is momentarily busy, which happens right after Composer
//! rewrites `vendor/bin`.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, warn};

use crate::constants::{TOOL_RETRY_BASE_DELAY_MS, TOOL_RETRY_MAX_DELAY};
use crate::core::DrupalKitError;

/// Default time a tool may run before it is abandoned.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const SPAWN_ATTEMPTS: usize = 3;

/// External tool driven by drupalkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Drupal shell
    Drush,
    /// PHP dependency manager
    Composer,
}

impl Tool {
    /// Lowercase tool name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Tool::Drush => "drush",
            Tool::Composer => "composer",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed result of a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandOutput {
    /// Standard output parsed as JSON
    pub stdout: Value,
    /// Standard error, verbatim
    pub stderr: String,
}

/// Parse a tool's standard output; blank output is `null`.
pub fn parse_stdout(tool: Tool, stdout: &str) -> Result<Value, DrupalKitError> {
    if stdout.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(stdout).map_err(|e| DrupalKitError::ToolOutputInvalid {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

/// Builder for one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    tool: Tool,
    bin: String,
    args: Vec<String>,
    current_dir: PathBuf,
    timeout_duration: Option<Duration>,
}

impl ToolCommand {
    /// Invocation of `tool` through `bin`, run in `current_dir`.
    pub fn new(tool: Tool, bin: impl Into<String>, current_dir: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            bin: bin.into(),
            args: Vec::new(),
            current_dir: current_dir.into(),
            timeout_duration: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Abandon the command after `duration`; `None` waits forever.
    pub fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// The arguments passed to the binary.
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Command line for messages.
    pub fn command_line(&self) -> String {
        std::iter::once(self.bin.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Locate the executable.
    pub fn resolve_bin(&self) -> Result<PathBuf, DrupalKitError> {
        let not_found = || DrupalKitError::ToolNotFound {
            tool: self.tool.to_string(),
            bin: self.bin.clone(),
        };

        let as_path = Path::new(&self.bin);
        if as_path.components().count() > 1 || as_path.is_absolute() {
            let path = self.current_dir.join(as_path);
            return if path.is_file() {
                Ok(path)
            } else {
                Err(not_found())
            };
        }

        which::which(&self.bin).map_err(|_| not_found())
    }

    /// Run the command and parse its output.
    ///
    /// # Errors
    ///
    /// [`DrupalKitError::ToolNotFound`] when the binary is missing,
    /// [`DrupalKitError::ToolFailed`] on a failure status or timeout and
    /// [`DrupalKitError::ToolOutputInvalid`] when stdout is not JSON.
    pub async fn execute(self) -> Result<CommandOutput> {
        let bin = self.resolve_bin()?;
        let command_line = self.command_line();
        debug!(target: "tools", "Executing command: {}", command_line);

        let strategy = ExponentialBackoff::from_millis(TOOL_RETRY_BASE_DELAY_MS)
            .max_delay(TOOL_RETRY_MAX_DELAY)
            .take(SPAWN_ATTEMPTS);

        let run = || {
            let mut cmd = Command::new(&bin);
            cmd.args(&self.args)
                .current_dir(&self.current_dir)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);
            async move { cmd.output().await }
        };

        let output_future = RetryIf::spawn(strategy, run, |e: &io::Error| {
            let retry = matches!(
                e.kind(),
                io::ErrorKind::ExecutableFileBusy
                    | io::ErrorKind::ResourceBusy
                    | io::ErrorKind::Interrupted
            );
            if retry {
                debug!(target: "tools", "Retrying {} after: {}", self.tool, e);
            }
            retry
        });

        let output: Output = match self.timeout_duration {
            Some(duration) => match timeout(duration, output_future).await {
                Ok(result) => result.with_context(|| format!("Failed to execute {command_line}"))?,
                Err(_) => {
                    warn!(target: "tools", "Command timed out after {}s: {}", duration.as_secs(), command_line);
                    return Err(DrupalKitError::ToolFailed {
                        tool: self.tool.to_string(),
                        command: command_line,
                        stderr: format!("timed out after {} seconds", duration.as_secs()),
                    }
                    .into());
                }
            },
            None => output_future.await.with_context(|| format!("Failed to execute {command_line}"))?,
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            debug!(target: "tools", "Command failed with exit code: {:?}", output.status.code());
            return Err(DrupalKitError::ToolFailed {
                tool: self.tool.to_string(),
                command: command_line,
                stderr,
            }
            .into());
        }

        Ok(CommandOutput {
            stdout: parse_stdout(self.tool, &stdout)?,
            stderr,
        })
    }
}

/// Split a command string on whitespace.
fn words(cmd: &str) -> impl Iterator<Item = String> + '_ {
    cmd.split_whitespace().map(str::to_string)
}

/// Drush bound to one Drupal root and site.
#[derive(Debug, Clone)]
pub struct Drush {
    bin: String,
    site_uri: String,
    root: PathBuf,
}

impl Drush {
    /// Drush through `bin`, for `site_uri`, running in `root`.
    pub fn new(bin: impl Into<String>, site_uri: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            site_uri: site_uri.into(),
            root: root.into(),
        }
    }

    /// The invocation for `cmd` without running it.
    pub fn command(&self, cmd: &str) -> ToolCommand {
        ToolCommand::new(Tool::Drush, self.bin.clone(), self.root.clone())
            .arg(format!("--uri={}", self.site_uri))
            .args(words(cmd))
            .arg("--format=json")
    }

    /// Run `cmd`, e.g. `pm:list --status=enabled`.
    pub async fn run(&self, cmd: &str) -> Result<CommandOutput> {
        self.command(cmd).execute().await
    }
}

/// Composer bound to one project directory.
#[derive(Debug, Clone)]
pub struct Composer {
    bin: String,
    root: PathBuf,
}

impl Composer {
    /// Composer through `bin`, running in `root`.
    pub fn new(bin: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            root: root.into(),
        }
    }

    /// The invocation for `cmd` without running it.
    pub fn command(&self, cmd: &str) -> ToolCommand {
        ToolCommand::new(Tool::Composer, self.bin.clone(), self.root.clone())
            .arg("--format=json")
            .args(words(cmd))
    }

    /// Run `cmd`, e.g. `show --direct`.
    pub async fn run(&self, cmd: &str) -> Result<CommandOutput> {
        self.command(cmd).execute().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_command_lines() {
        let drush = Drush::new("./vendor/bin/drush", "example.loc", "/srv/site");
        assert_eq!(
            drush.command("pm:list --status=enabled").command_line(),
            "./vendor/bin/drush --uri=example.loc pm:list --status=enabled --format=json"
        );

        let composer = Composer::new("composer", "/srv/site");
        assert_eq!(composer.command("show").arguments(), &["--format=json", "show"]);
    }

    #[test]
    fn test_parse_stdout() {
        assert_eq!(parse_stdout(Tool::Drush, "  \n").unwrap(), Value::Null);
        assert_eq!(parse_stdout(Tool::Drush, "{\"a\": 1}").unwrap(), json!({"a": 1}));
        assert!(matches!(
            parse_stdout(Tool::Composer, "Loading composer repositories"),
            Err(DrupalKitError::ToolOutputInvalid { .. })
        ));
    }

    #[test]
    fn test_missing_relative_binary() {
        let temp = TempDir::new().unwrap();
        let err = Drush::new("./vendor/bin/drush", "default", temp.path())
            .command("status")
            .resolve_bin()
            .unwrap_err();
        assert!(matches!(err, DrupalKitError::ToolNotFound { .. }));
    }

    #[cfg(unix)]
    fn script(dir: &Path, name: &str, body: &str) {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_drush_output_is_parsed() {
        let temp = TempDir::new().unwrap();
        script(temp.path(), "drush", r#"printf '{"argc": %d, "first": "%s"}' "$#" "$1""#);

        let output = Drush::new("./drush", "example.loc", temp.path()).run("status").await.unwrap();
        assert_eq!(output.stdout, json!({"argc": 3, "first": "--uri=example.loc"}));
        assert!(output.stderr.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_empty_output_is_null() {
        let temp = TempDir::new().unwrap();
        script(temp.path(), "composer", "echo 'warning' >&2");

        let output = Composer::new("./composer", temp.path()).run("validate").await.unwrap();
        assert_eq!(output.stdout, Value::Null);
        assert_eq!(output.stderr.trim(), "warning");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failure_status() {
        let temp = TempDir::new().unwrap();
        script(temp.path(), "drush", "echo 'boom' >&2; exit 2");

        let err = Drush::new("./drush", "default", temp.path()).run("cr").await.unwrap_err();
        match err.downcast_ref::<DrupalKitError>() {
            Some(DrupalKitError::ToolFailed {
                stderr,
                ..
            }) => assert_eq!(stderr.trim(), "boom"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
