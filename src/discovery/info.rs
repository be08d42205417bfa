//! Info descriptor loading.
//!
//! An info file (`node.info.yml`) is YAML. Loading adds two fields to what the
//! file declares: `info file`, the root-relative path it was read from, and
//! `machine name`, the file name without its info extension. Descriptors are
//! then grouped by their declared `type`; a descriptor without one is dropped.

use anyhow::{Context, Result};
use futures::future::join_all;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::to_slash;
use crate::constants::{INFO_EXTENSIONS, INFO_FILE_FIELD, MACHINE_NAME_FIELD, TYPE_FIELD};
use crate::core::DrupalKitError;
use crate::entity::Fields;

/// Parsed descriptors grouped by declared type, each group in scan order.
pub type InfoIndex = BTreeMap<String, Vec<Fields>>;

/// Machine name of an info file: its file name without `.info.yml` / `.info.yaml`.
///
/// ```rust
/// use drupalkit::discovery::info::machine_name;
/// use std::path::Path;
///
/// assert_eq!(machine_name(Path::new("core/modules/node/node.info.yml")), "node");
/// assert_eq!(machine_name(Path::new("themes/irata/irata.info.yaml")), "irata");
/// ```
pub fn machine_name(file: &Path) -> String {
    let name = file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    INFO_EXTENSIONS
        .iter()
        .fold(name, |name, ext| name.strip_suffix(ext).map(str::to_string).unwrap_or(name))
}

/// Parse one info file's text.
pub fn parse_info(content: &str, file: &Path) -> Result<Fields, DrupalKitError> {
    let value: Value =
        serde_yaml::from_str(content).map_err(|e| DrupalKitError::InfoParseError {
            file: to_slash(file),
            reason: e.to_string(),
        })?;

    let mut fields = match value {
        Value::Object(fields) => fields,
        Value::Null => Fields::new(),
        other => {
            return Err(DrupalKitError::InfoParseError {
                file: to_slash(file),
                reason: format!("expected a mapping, found {other}"),
            });
        }
    };

    fields.insert(INFO_FILE_FIELD.to_string(), Value::String(to_slash(file)));
    fields.insert(MACHINE_NAME_FIELD.to_string(), Value::String(machine_name(file)));
    Ok(fields)
}

/// Read and parse one info file below `root`.
pub async fn read_info_file(root: &Path, file: &Path) -> Result<Fields> {
    let path = root.join(file);
    let content = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read info file {}", path.display()))?;
    Ok(parse_info(&content, file)?)
}

/// Read every info file concurrently and group the results by type.
///
/// A file that cannot be read or parsed is logged and skipped.
pub async fn read_info(root: &Path, files: &[PathBuf]) -> InfoIndex {
    let reads = files.iter().map(|file| async move { (file, read_info_file(root, file).await) });

    let mut index = InfoIndex::new();
    for (file, result) in join_all(reads).await {
        match result {
            Ok(fields) => {
                let Some(kind) = fields.get(TYPE_FIELD).and_then(Value::as_str) else {
                    debug!("Ignoring {}: no type declared", file.display());
                    continue;
                };
                index.entry(kind.to_string()).or_default().push(fields);
            }
            Err(e) => warn!("Skipping {}: {:#}", file.display(), e),
        }
    }

    debug!(
        "Loaded info for {} extensions in {} types",
        index.values().map(Vec::len).sum::<usize>(),
        index.len()
    );
    index
}
