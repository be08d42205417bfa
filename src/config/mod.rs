//! Project configuration for drupalkit.
//!
//! A project is described by a `drupalkit.toml` file, usually next to the
//! Drupal root. Every field is optional:
//!
//! ```toml
//! # Drupal root, relative to this file (~ and $VARS are expanded)
//! root = "web"
//! # Site directory under sites/ used for scanning and drush --uri
//! site_uri = "default"
//! # Theme whose hooks and templates take part in rendering
//! theme = "olivero"
//! active_modules = ["node", "field"]
//! drush_bin = "./vendor/bin/drush"
//! composer_bin = "composer"
//! debug = false
//! ```
//!
//! # Lookup order
//!
//! 1. an explicit path (`--config`), which must exist;
//! 2. `drupalkit.toml` in the current directory;
//! 3. the user file (`~/.drupalkit/config.toml`, `%LOCALAPPDATA%\drupalkit\config.toml`
//!    on Windows);
//! 4. built-in defaults.
//!
//! # Examples
//!
//! ```rust,no_run
//! use drupalkit::config::ProjectConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut config = ProjectConfig::load_with_optional(None).await?;
//! config.theme = Some("olivero".to_string());
//! config.save_to(std::path::Path::new("drupalkit.toml")).await?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::constants::CONFIG_FILE_NAME;
use crate::core::DrupalKitError;

/// Settings of one Drupal project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Drupal root directory
    pub root: String,

    /// Site directory name under `sites/` and the `--uri` passed to drush
    pub site_uri: String,

    /// Active theme used by the render pipeline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    /// Modules considered enabled.
    ///
    /// Stored and saved, but not applied yet: hook dispatch and template
    /// lookup see every discovered module.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub active_modules: Vec<String>,

    /// Drush executable, relative paths resolve against the root
    pub drush_bin: String,

    /// Composer executable
    pub composer_bin: String,

    /// Wrap rendered output in theme debug comments
    pub debug: bool,

    /// Directory the configuration was loaded from, used to resolve `root`
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            site_uri: "default".to_string(),
            theme: None,
            active_modules: Vec::new(),
            drush_bin: "./vendor/bin/drush".to_string(),
            composer_bin: "composer".to_string(),
            debug: false,
            base_dir: None,
        }
    }
}

impl ProjectConfig {
    /// Configuration for a Drupal root, everything else at its default.
    pub fn for_root(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_string_lossy().into_owned(),
            ..Self::default()
        }
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not valid TOML for this schema.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let mut config: Self = toml::from_str(&content).map_err(|e| {
            DrupalKitError::ConfigParseError {
                file: path.display().to_string(),
                reason: e.message().to_string(),
            }
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf);

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from `path` when given, otherwise from the first existing default location.
    ///
    /// # Errors
    ///
    /// Fails when an explicit `path` does not exist, or when the selected file
    /// cannot be read or parsed.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(DrupalKitError::ConfigError {
                    message: format!("Config file {} does not exist", path.display()),
                }
                .into());
            }
            return Self::load_from(&path).await;
        }

        let project = PathBuf::from(CONFIG_FILE_NAME);
        if project.exists() {
            return Self::load_from(&project).await;
        }

        if let Ok(user) = Self::user_path()
            && user.exists()
        {
            return Self::load_from(&user).await;
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Write the configuration as TOML, creating parent directories.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Location of the per-user configuration file.
    pub fn user_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("drupalkit")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".drupalkit")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// The Drupal root with `~` and environment variables expanded.
    ///
    /// A relative root is resolved against the directory the configuration was
    /// loaded from.
    pub fn resolved_root(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.root)
            .with_context(|| format!("Failed to expand root path '{}'", self.root))?;
        let root = PathBuf::from(expanded.as_ref());

        Ok(match &self.base_dir {
            Some(base) if root.is_relative() && !base.as_os_str().is_empty() => base.join(root),
            _ => root,
        })
    }
}
