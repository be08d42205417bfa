//! On-disk Drupal roots for tests.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::ProjectConfig;

/// A temporary Drupal root, removed when dropped.
///
/// Builder methods consume and return the fixture so a tree can be described
/// in one expression. Contrib extensions land in `modules/` and `themes/`;
/// use [`DrupalFixture::file`] for anything else.
pub struct DrupalFixture {
    temp_dir: TempDir,
}

impl DrupalFixture {
    /// An empty root.
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new().context("Failed to create temp dir")?,
        })
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of a root-relative file.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Configuration pointing at this root.
    pub fn config(&self) -> ProjectConfig {
        ProjectConfig::for_root(self.root())
    }

    /// Write a file, creating parent directories.
    pub fn file(self, relative: &str, content: &str) -> Result<Self> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(self)
    }

    /// Add `modules/<name>/<name>.info.yml` with the given dependencies.
    pub fn module(self, name: &str, dependencies: &[&str]) -> Result<Self> {
        let mut info = format!("name: {}\ntype: module\ncore_version_requirement: ^10\n", title(name));
        if !dependencies.is_empty() {
            info.push_str("dependencies:\n");
            for dependency in dependencies {
                info.push_str(&format!("  - '{dependency}'\n"));
            }
        }
        self.file(&format!("modules/{name}/{name}.info.yml"), &info)
    }

    /// Add `themes/<name>/<name>.info.yml`, optionally with a base theme.
    pub fn theme(self, name: &str, base_theme: Option<&str>) -> Result<Self> {
        let base = base_theme.unwrap_or("false");
        let info = format!("name: {}\ntype: theme\nbase theme: {base}\n", title(name));
        self.file(&format!("themes/{name}/{name}.info.yml"), &info)
    }

    /// Add `<extension dir>/templates/<name>.html.twig`.
    pub fn template(self, extension_dir: &str, name: &str, source: &str) -> Result<Self> {
        self.file(&format!("{extension_dir}/templates/{name}.html.twig"), source)
    }

    /// Add `sites/<name>/settings.php`.
    pub fn site(self, name: &str) -> Result<Self> {
        self.file(&format!("sites/{name}/settings.php"), "<?php\n")
    }

    /// A small but complete site: core modules with dependencies, a three
    /// level theme chain with templates, a theme engine, a library, a site and
    /// a Composer package list.
    pub fn standard() -> Result<Self> {
        Self::new()?
            .file("core/modules/system/system.info.yml", "name: System\ntype: module\npackage: Core\n")?
            .file(
                "core/modules/field/field.info.yml",
                "name: Field\ntype: module\ndependencies:\n  - drupal:system\n",
            )?
            .file(
                "core/modules/node/node.info.yml",
                "name: Node\ntype: module\ndependencies:\n  - drupal:field\n  - drupal:text (>=10.1)\n",
            )?
            .file(
                "core/modules/text/text.info.yml",
                "name: Text\ntype: module\ndependencies:\n  - drupal:field\n",
            )?
            .file("core/modules/node/templates/node.html.twig", "<article>{{ label }}</article>")?
            .file("core/modules/node/tests/modules/node_test/node_test.info.yml", "name: Node test\ntype: module\n")?
            .file("core/themes/engines/twig/twig.info.yml", "name: Twig\ntype: theme_engine\n")?
            .file("core/themes/stable9/stable9.info.yml", "name: Stable 9\ntype: theme\nbase theme: false\n")?
            .file("core/themes/stable9/templates/page.html.twig", "<main>{{ content }}</main>")?
            .module("custom", &["drupal:node", "missing_module"])?
            .theme("base", Some("stable9"))?
            .template("themes/base", "node--article", "<article class=\"article\">{{ label }}</article>")?
            .theme("subtheme", Some("base"))?
            .template("themes/subtheme", "node", "<div class=\"node\">{{ label }}</div>")?
            .file("themes/subtheme/css/style.css", "body {}")?
            .file("themes/subtheme/js/script.js", "")?
            .file("libraries/dropzone/dropzone.js", "")?
            .site("default")?
            .file(
                "vendor/composer/installed.json",
                r#"{"packages": [{"name": "drush/drush", "version": "12.5.0"}]}"#,
            )
    }
}

fn title(machine_name: &str) -> String {
    machine_name
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map(|c| c.to_uppercase().chain(chars).collect::<String>()).unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(" ")
}
