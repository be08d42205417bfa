//! Sites, front-end libraries and Composer packages.
//!
//! None of these have info files:
//!
//! - a **site** is a directory under `sites/` holding a `settings.php` (or the
//!   `default.settings.php` of a fresh install), identified by its `name`;
//! - a **library** is a directory under `libraries/`;
//! - a **vendor** package is an entry of Composer's `vendor/composer/installed.json`,
//!   looked up in the root and in its parent (the usual `web/` docroot layout).

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::constants::MACHINE_NAME_FIELD;
use crate::entity::Fields;

/// Field identifying a site.
pub const SITE_NAME_FIELD: &str = "name";

const SETTINGS_FILES: [&str; 2] = ["settings.php", "default.settings.php"];

async fn subdirectories(dir: &Path) -> Result<Vec<String>> {
    if !fs::try_exists(dir).await.unwrap_or(false) {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Site directories below `root/sites`, sorted by name.
pub async fn discover_sites(root: &Path) -> Result<Vec<Fields>> {
    let sites_dir = root.join("sites");
    let mut sites = Vec::new();

    for name in subdirectories(&sites_dir).await? {
        if name == "all" {
            continue;
        }

        let dir = sites_dir.join(&name);
        let mut settings = None;
        for file in SETTINGS_FILES {
            if fs::try_exists(dir.join(file)).await.unwrap_or(false) {
                settings = Some(file);
                break;
            }
        }
        let Some(settings) = settings else {
            continue;
        };

        let mut fields = Fields::new();
        fields.insert(SITE_NAME_FIELD.to_string(), Value::String(name.clone()));
        fields.insert("path".to_string(), Value::String(format!("sites/{name}")));
        fields.insert("settings".to_string(), Value::String(format!("sites/{name}/{settings}")));
        sites.push(fields);
    }

    debug!("Found {} sites", sites.len());
    Ok(sites)
}

/// Library directories below `root/libraries`, sorted by name.
pub async fn discover_libraries(root: &Path) -> Result<Vec<Fields>> {
    let libraries = subdirectories(&root.join("libraries"))
        .await?
        .into_iter()
        .map(|name| {
            let mut fields = Fields::new();
            fields.insert("path".to_string(), Value::String(format!("libraries/{name}")));
            fields.insert(MACHINE_NAME_FIELD.to_string(), Value::String(name));
            fields
        })
        .collect::<Vec<_>>();

    debug!("Found {} libraries", libraries.len());
    Ok(libraries)
}

/// Location of Composer's installed package list for a Drupal root, if any.
pub async fn installed_json(root: &Path) -> Option<PathBuf> {
    let relative = Path::new("vendor").join("composer").join("installed.json");
    let mut candidates = vec![root.join(&relative)];
    if let Some(parent) = root.parent() {
        candidates.push(parent.join(&relative));
    }

    for candidate in candidates {
        if fs::try_exists(&candidate).await.unwrap_or(false) {
            return Some(candidate);
        }
    }
    None
}

/// Packages listed in `installed.json`, in file order.
///
/// Both the Composer 2 layout (`{"packages": [...]}`) and the older bare array
/// are understood. Each package keeps all of its fields and gains a
/// `machine name` equal to the package name.
pub fn parse_installed(content: &str) -> Result<Vec<Fields>> {
    let value: Value = serde_json::from_str(content).context("Invalid installed.json")?;
    let packages = match value {
        Value::Object(mut map) => match map.remove("packages") {
            Some(Value::Array(packages)) => packages,
            _ => Vec::new(),
        },
        Value::Array(packages) => packages,
        _ => Vec::new(),
    };

    Ok(packages
        .into_iter()
        .filter_map(|package| match package {
            Value::Object(mut fields) => {
                let name = fields.get("name").and_then(Value::as_str)?.to_string();
                fields.insert(MACHINE_NAME_FIELD.to_string(), Value::String(name));
                Some(fields)
            }
            _ => None,
        })
        .collect())
}

/// Composer packages installed for a Drupal root.
pub async fn discover_vendors(root: &Path) -> Result<Vec<Fields>> {
    let Some(path) = installed_json(root).await else {
        debug!("No Composer installed.json found");
        return Ok(Vec::new());
    };

    let content = fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let vendors = parse_installed(&content).with_context(|| format!("In {}", path.display()))?;

    debug!("Found {} vendor packages", vendors.len());
    Ok(vendors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sites_need_settings() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for (dir, file) in [
            ("sites/default", Some("default.settings.php")),
            ("sites/example.loc", Some("settings.php")),
            ("sites/all", Some("settings.php")),
            ("sites/empty", None),
        ] {
            std::fs::create_dir_all(root.join(dir)).unwrap();
            if let Some(file) = file {
                std::fs::write(root.join(dir).join(file), "<?php").unwrap();
            }
        }

        let sites = discover_sites(root).await.unwrap();
        let names: Vec<&str> = sites.iter().filter_map(|s| s["name"].as_str()).collect();
        assert_eq!(names, vec!["default", "example.loc"]);
        assert_eq!(sites[1]["settings"], json!("sites/example.loc/settings.php"));
    }

    #[tokio::test]
    async fn test_libraries() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("libraries/dropzone")).unwrap();
        std::fs::create_dir_all(temp.path().join("libraries/chosen")).unwrap();
        std::fs::write(temp.path().join("libraries/README.txt"), "").unwrap();

        let libraries = discover_libraries(temp.path()).await.unwrap();
        let names: Vec<&str> =
            libraries.iter().filter_map(|l| l[MACHINE_NAME_FIELD].as_str()).collect();
        assert_eq!(names, vec!["chosen", "dropzone"]);
        assert!(discover_libraries(&temp.path().join("missing")).await.unwrap().is_empty());
    }

    #[test]
    fn test_parse_installed_layouts() {
        let v2 = parse_installed(r#"{"packages": [{"name": "drush/drush", "version": "12.4.3"}]}"#)
            .unwrap();
        assert_eq!(v2[0][MACHINE_NAME_FIELD], json!("drush/drush"));
        assert_eq!(v2[0]["version"], json!("12.4.3"));

        let v1 = parse_installed(r#"[{"name": "a/b"}, {"no_name": true}]"#).unwrap();
        assert_eq!(v1.len(), 1);

        assert!(parse_installed("not json").is_err());
    }

    #[tokio::test]
    async fn test_vendors_found_in_parent_of_docroot() {
        let temp = TempDir::new().unwrap();
        let composer = temp.path().join("vendor/composer");
        std::fs::create_dir_all(&composer).unwrap();
        std::fs::create_dir_all(temp.path().join("web")).unwrap();
        std::fs::write(composer.join("installed.json"), r#"{"packages": [{"name": "x/y"}]}"#)
            .unwrap();

        let vendors = discover_vendors(&temp.path().join("web")).await.unwrap();
        assert_eq!(vendors.len(), 1);
    }
}
