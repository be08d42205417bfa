//! Filesystem discovery of Drupal extensions.
//!
//! Discovery walks a fixed layout below the Drupal root:
//!
//! ```text
//! {modules,themes,core/modules,core/themes,sites/{all,<site_uri>}}/**/*.<ext>
//! ```
//!
//! and sorts what it finds into four groups of root-relative paths:
//!
//! | Group       | Extensions                  |
//! |-------------|-----------------------------|
//! | `info`      | `info.yml`, `info.yaml`     |
//! | `styles`    | `css`, `scss`, `sass`, `less` |
//! | `scripts`   | `js`, `jsx`                 |
//! | `templates` | `html.twig`                 |
//!
//! Any path containing `test` is ignored, which keeps test fixtures out of the
//! collections. Each group is scanned on the blocking thread pool and the
//! groups are joined concurrently.
//!
//! The other submodules turn scan results into collection data:
//! [`info`] parses descriptors, [`templates`] attaches template files to their
//! owning extension and [`site`] finds sites, libraries and vendor packages.

pub mod info;
pub mod site;
pub mod templates;

use anyhow::{Context, Result};
use futures::future::try_join_all;
use glob::Pattern;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::constants::TEST_PATH_MARKER;
use crate::core::DrupalKitError;

/// A group of scanned files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Extension info descriptors
    Info,
    /// Stylesheets
    Styles,
    /// Scripts
    Scripts,
    /// Twig templates
    Templates,
}

impl FileKind {
    /// All groups, in scan order.
    pub const ALL: [FileKind; 4] =
        [FileKind::Info, FileKind::Styles, FileKind::Scripts, FileKind::Templates];

    /// File extensions (without the leading dot) belonging to this group.
    pub const fn extensions(self) -> &'static [&'static str] {
        match self {
            FileKind::Info => &["info.yml", "info.yaml"],
            FileKind::Styles => &["css", "scss", "sass", "less"],
            FileKind::Scripts => &["js", "jsx"],
            FileKind::Templates => &["html.twig"],
        }
    }

    /// Lowercase group name.
    pub const fn as_str(self) -> &'static str {
        match self {
            FileKind::Info => "info",
            FileKind::Styles => "styles",
            FileKind::Scripts => "scripts",
            FileKind::Templates => "templates",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root-relative paths found by [`scan`], sorted within each group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    /// Info descriptors
    pub info: Vec<PathBuf>,
    /// Stylesheets
    pub styles: Vec<PathBuf>,
    /// Scripts
    pub scripts: Vec<PathBuf>,
    /// Twig templates
    pub templates: Vec<PathBuf>,
}

impl ScanResult {
    /// Files of one group.
    pub fn files(&self, kind: FileKind) -> &[PathBuf] {
        match kind {
            FileKind::Info => &self.info,
            FileKind::Styles => &self.styles,
            FileKind::Scripts => &self.scripts,
            FileKind::Templates => &self.templates,
        }
    }

    fn set(&mut self, kind: FileKind, files: Vec<PathBuf>) {
        match kind {
            FileKind::Info => self.info = files,
            FileKind::Styles => self.styles = files,
            FileKind::Scripts => self.scripts = files,
            FileKind::Templates => self.templates = files,
        }
    }

    /// Number of files over all groups.
    pub fn total(&self) -> usize {
        FileKind::ALL.iter().map(|kind| self.files(*kind).len()).sum()
    }
}

/// Directories searched below the root, as a brace pattern.
pub fn search_pattern(site_uri: &str) -> String {
    format!("{{modules,themes,core/modules,core/themes,sites/{{all,{site_uri}}}}}")
}

/// Full brace pattern for one group.
pub fn file_pattern(site_uri: &str, kind: FileKind) -> String {
    format!("{}/**/*.{{{}}}", search_pattern(site_uri), kind.extensions().join(","))
}

/// Expand `{a,b}` alternatives, nested braces included.
///
/// ```rust
/// use drupalkit::discovery::expand_braces;
///
/// assert_eq!(
///     expand_braces("sites/{all,{default,example}}/*.js"),
///     vec!["sites/all/*.js", "sites/default/*.js", "sites/example/*.js"]
/// );
/// ```
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };

    let mut depth = 0;
    let mut close = None;
    let mut splits = Vec::new();
    for (offset, c) in pattern[open..].char_indices() {
        let index = open + offset;
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(index);
                    break;
                }
            }
            ',' if depth == 1 => splits.push(index),
            _ => {}
        }
    }

    // Unbalanced braces are taken literally
    let Some(close) = close else {
        return vec![pattern.to_string()];
    };

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];
    let mut bounds = vec![open];
    bounds.extend(splits);
    bounds.push(close);

    bounds
        .windows(2)
        .flat_map(|pair| {
            let alternative = &pattern[pair[0] + 1..pair[1]];
            expand_braces(&format!("{prefix}{alternative}{suffix}"))
        })
        .collect()
}

/// Scan the Drupal root for every file group.
///
/// # Errors
///
/// Fails when a pattern cannot be compiled or a scan task panics. Unreadable
/// directories are skipped.
pub async fn scan(root: &Path, site_uri: &str) -> Result<ScanResult> {
    debug!("Scanning {} for site '{}'", root.display(), site_uri);

    let tasks = FileKind::ALL.iter().map(|&kind| {
        let root = root.to_path_buf();
        let patterns = expand_braces(&file_pattern(site_uri, kind));
        tokio::task::spawn_blocking(move || scan_group(&root, &patterns).map(|files| (kind, files)))
    });

    let groups = try_join_all(tasks).await.context("Scan task failed")?;

    let mut result = ScanResult::default();
    for group in groups {
        let (kind, files) = group?;
        debug!("Found {} {} files", files.len(), kind);
        result.set(kind, files);
    }
    Ok(result)
}

fn scan_group(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let matchers = patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|e| DrupalKitError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.msg.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut bases: Vec<PathBuf> = patterns.iter().map(|p| literal_prefix(p)).collect();
    bases.sort();
    bases.dedup();

    let mut files = Vec::new();
    for base in bases {
        let dir = root.join(&base);
        if !dir.is_dir() {
            trace!("Skipping missing search directory {}", dir.display());
            continue;
        }

        for entry in WalkDir::new(&dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
        {
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let relative_str = to_slash(relative);
            if relative_str.contains(TEST_PATH_MARKER) {
                continue;
            }
            if matchers.iter().any(|matcher| matcher.matches(&relative_str)) {
                files.push(relative.to_path_buf());
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Leading path segments free of glob metacharacters.
fn literal_prefix(pattern: &str) -> PathBuf {
    pattern
        .split('/')
        .take_while(|segment| !segment.contains(['*', '?', '[']))
        .collect()
}

/// Path as a forward-slash string, whatever the platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
