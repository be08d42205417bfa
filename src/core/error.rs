//! Error handling for drupalkit
//!
//! The core of drupalkit (collections, graph resolution, hook dispatch and
//! rendering) is tolerant: lookups return `None`, dangling relations
//! become diagnostics and a missing template becomes a placeholder string. The
//! errors in this module belong to the fallible edges around that core: configuration,
//! filesystem scanning, info parsing and external tools.
//!
//! Two types cooperate here:
//! - [`DrupalKitError`] - Enumerated error types for every failure mode
//! - [`ErrorContext`] - Wrapper adding a suggestion and details for CLI display
//!
//! Use [`user_friendly_error`] to turn any [`anyhow::Error`] into an
//! [`ErrorContext`] before printing it.
//!
//! # Examples
//!
//! ```rust,no_run
//! use drupalkit::core::{DrupalKitError, user_friendly_error};
//!
//! let error = DrupalKitError::RootNotDirectory {
//!     path: "/var/www/missing".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // colored output on stderr
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for drupalkit operations.
///
/// Variants carry enough context (paths, tool names, extension names) to build a
/// useful message without the caller re-attaching it.
#[derive(Error, Debug)]
pub enum DrupalKitError {
    /// The configured project root does not exist or is not a directory.
    #[error("\"{path}\" is not a directory.")]
    RootNotDirectory {
        /// The path that was expected to be a Drupal root
        path: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// Configuration file could not be parsed
    #[error("Invalid configuration file syntax in {file}")]
    ConfigParseError {
        /// Path to the configuration file
        file: String,
        /// Parser message
        reason: String,
    },

    /// An info descriptor could not be parsed as YAML
    #[error("Invalid info file {file}")]
    InfoParseError {
        /// Root-relative path of the info file
        file: String,
        /// Parser message
        reason: String,
    },

    /// Unknown extension kind requested
    #[error("Invalid extension kind: {kind}")]
    InvalidExtensionKind {
        /// The kind string that was not recognised
        kind: String,
    },

    /// Extension not present in its collection
    #[error("{kind} '{name}' not found")]
    ExtensionNotFound {
        /// Kind of the extension that was looked up
        kind: String,
        /// Machine name that was looked up
        name: String,
        /// Similar machine names, closest first
        similar: Vec<String>,
    },

    /// Glob pattern used for discovery is invalid
    #[error("Invalid glob pattern: {pattern}")]
    InvalidPattern {
        /// The pattern text
        pattern: String,
        /// Reason reported by the glob parser
        reason: String,
    },

    /// External tool binary is not available
    #[error("{tool} executable '{bin}' not found")]
    ToolNotFound {
        /// Logical tool name (drush, composer)
        tool: String,
        /// Binary that was looked up
        bin: String,
    },

    /// External tool exited with a failure status
    #[error("{tool} command failed: {command}")]
    ToolFailed {
        /// Logical tool name (drush, composer)
        tool: String,
        /// Full command line that was executed
        command: String,
        /// Error output of the command
        stderr: String,
    },

    /// External tool wrote something other than JSON to stdout
    #[error("{tool} returned invalid JSON: {reason}")]
    ToolOutputInvalid {
        /// Logical tool name (drush, composer)
        tool: String,
        /// Parser message
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error for cases not covered by specific variants
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl Clone for DrupalKitError {
    fn clone(&self) -> Self {
        match self {
            Self::RootNotDirectory {
                path,
            } => Self::RootNotDirectory {
                path: path.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            Self::ConfigParseError {
                file,
                reason,
            } => Self::ConfigParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::InfoParseError {
                file,
                reason,
            } => Self::InfoParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::InvalidExtensionKind {
                kind,
            } => Self::InvalidExtensionKind {
                kind: kind.clone(),
            },
            Self::ExtensionNotFound {
                kind,
                name,
                similar,
            } => Self::ExtensionNotFound {
                kind: kind.clone(),
                name: name.clone(),
                similar: similar.clone(),
            },
            Self::InvalidPattern {
                pattern,
                reason,
            } => Self::InvalidPattern {
                pattern: pattern.clone(),
                reason: reason.clone(),
            },
            Self::ToolNotFound {
                tool,
                bin,
            } => Self::ToolNotFound {
                tool: tool.clone(),
                bin: bin.clone(),
            },
            Self::ToolFailed {
                tool,
                command,
                stderr,
            } => Self::ToolFailed {
                tool: tool.clone(),
                command: command.clone(),
                stderr: stderr.clone(),
            },
            Self::ToolOutputInvalid {
                tool,
                reason,
            } => Self::ToolOutputInvalid {
                tool: tool.clone(),
                reason: reason.clone(),
            },
            // io::Error is not Clone; keep kind and message
            Self::IoError(e) => Self::IoError(std::io::Error::new(e.kind(), e.to_string())),
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error wrapper with a user-facing suggestion and details.
///
/// ```rust,no_run
/// use drupalkit::core::{DrupalKitError, ErrorContext};
///
/// let context = ErrorContext::new(DrupalKitError::ConfigError {
///     message: "theme is empty".to_string(),
/// })
/// .with_suggestion("Set `theme` in drupalkit.toml or pass --theme")
/// .with_details("The render command needs an active theme");
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: DrupalKitError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context without suggestion or details.
    #[must_use]
    pub const fn new(error: DrupalKitError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error (shown in green).
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error (shown in yellow).
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error context to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`].
///
/// [`DrupalKitError`] values get tailored suggestions, IO and TOML errors get
/// generic guidance, and anything else is reported with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(kit_error) = error.downcast_ref::<DrupalKitError>() {
        return create_error_context(kit_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(DrupalKitError::Other {
                    message: error.to_string(),
                })
                .with_suggestion("Check file ownership and permissions of the Drupal root");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(DrupalKitError::Other {
                    message: error.to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(DrupalKitError::ConfigParseError {
            file: crate::constants::CONFIG_FILE_NAME.to_string(),
            reason: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax in your drupalkit.toml file");
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(DrupalKitError::Other {
        message,
    })
}

fn create_error_context(error: DrupalKitError) -> ErrorContext {
    match &error {
        DrupalKitError::RootNotDirectory {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Pass --root or set `root` in drupalkit.toml to the Drupal docroot")
            .with_details("drupalkit scans modules/, themes/, core/ and sites/ below the root"),
        DrupalKitError::ConfigParseError {
            reason,
            ..
        } => {
            let reason = reason.clone();
            ErrorContext::new(error)
                .with_suggestion("Check the TOML syntax in your drupalkit.toml file")
                .with_details(reason)
        }
        DrupalKitError::InfoParseError {
            reason,
            ..
        } => {
            let reason = reason.clone();
            ErrorContext::new(error)
                .with_suggestion("Fix the YAML syntax of the info file")
                .with_details(reason)
        }
        DrupalKitError::InvalidExtensionKind {
            ..
        } => ErrorContext::new(error).with_suggestion(
            "Valid kinds are: module, theme, theme_engine, library, vendor, site",
        ),
        DrupalKitError::ExtensionNotFound {
            similar,
            ..
        } => {
            if similar.is_empty() {
                ErrorContext::new(error)
                    .with_suggestion("Run 'drupalkit list' to see discovered extensions")
            } else {
                let suggestion = format!("Did you mean: {}?", similar.join(", "));
                ErrorContext::new(error).with_suggestion(suggestion)
            }
        }
        DrupalKitError::ToolNotFound {
            tool,
            ..
        } => {
            let suggestion = format!("Install {tool} or point `{tool}_bin` in drupalkit.toml at it");
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        DrupalKitError::ToolFailed {
            stderr,
            ..
        } => {
            let stderr = stderr.clone();
            ErrorContext::new(error)
                .with_details(stderr)
                .with_suggestion("Run the command manually with --verbose to inspect its output")
        }
        _ => ErrorContext::new(error),
    }
}
