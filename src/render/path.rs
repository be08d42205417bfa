//! Structural path addressing over render trees.
//!
//! A path is a sequence of segments, written either as a dot-delimited string
//! (`"content.body.#markup"`) or as already split segments (`["content", "body"]`).
//! Object keys are matched literally; a segment addressing an array must be a
//! decimal index.
//!
//! | Operation | Absent intermediate           | Terminal                         |
//! |-----------|-------------------------------|----------------------------------|
//! | [`get`]   | [`PathError::MissingPath`]    | `Ok(None)` when absent           |
//! | [`set`]   | created as an empty object    | shallow merge into objects       |
//! | [`merge`] | created as an empty object    | deep merge into objects          |
//! | [`unset`] | silent no-op                  | removed, order of siblings kept  |
//!
//! [`keys`], [`each`] and [`map`] enumerate the child elements of a node, which
//! are the keys not starting with the reserved `#` prefix.

use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use tracing::trace;

use crate::constants::RESERVED_PREFIX;

/// Failure of a structural path operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// An intermediate segment is absent, or its parent is not a container
    #[error("Missing path '{path}': cannot read '{segment}'")]
    MissingPath {
        /// Full path being resolved
        path: String,
        /// Segment that could not be read
        segment: String,
    },

    /// A write had to descend through a scalar value
    #[error("Cannot write '{path}': value at '{segment}' is not an object or array")]
    NotAContainer {
        /// Full path being written
        path: String,
        /// Segment whose value is a scalar
        segment: String,
    },

    /// An array was addressed with something other than an index in `0..=len`
    #[error("Cannot write '{path}': '{segment}' is not a valid index")]
    InvalidIndex {
        /// Full path being written
        path: String,
        /// Offending segment
        segment: String,
    },
}

/// An ordered list of path segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StructPath {
    segments: Vec<String>,
}

impl StructPath {
    /// Split a dot-delimited path. The empty string addresses the root.
    pub fn parse(path: &str) -> Self {
        if path.is_empty() {
            return Self::default();
        }
        Self {
            segments: path.split('.').map(str::to_string).collect(),
        }
    }

    /// The segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the path addresses the root itself.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// This path extended by one segment.
    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self {
            segments,
        }
    }
}

impl fmt::Display for StructPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<&str> for StructPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<String> for StructPath {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

impl From<&String> for StructPath {
    fn from(path: &String) -> Self {
        Self::parse(path)
    }
}

impl From<Vec<String>> for StructPath {
    fn from(segments: Vec<String>) -> Self {
        Self {
            segments,
        }
    }
}

impl From<&[&str]> for StructPath {
    fn from(segments: &[&str]) -> Self {
        Self {
            segments: segments.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl<const N: usize> From<[&str; N]> for StructPath {
    fn from(segments: [&str; N]) -> Self {
        Self::from(&segments[..])
    }
}

impl From<&StructPath> for StructPath {
    fn from(path: &StructPath) -> Self {
        path.clone()
    }
}

/// Whether `key` names metadata rather than a child element.
pub fn is_reserved(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}

fn child<'v>(value: &'v Value, segment: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    }
}

fn is_container(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

/// Read the value at `path`.
///
/// Returns `Ok(None)` when only the terminal segment is absent and
/// [`PathError::MissingPath`] when the walk cannot reach the terminal's parent.
///
/// ```rust
/// use drupalkit::render::path;
/// use serde_json::json;
///
/// let tree = json!({"content": {"items": [{"#markup": "first"}]}});
/// assert_eq!(path::get(&tree, "content.items.0.#markup").unwrap(), Some(&json!("first")));
/// assert_eq!(path::get(&tree, "content.title").unwrap(), None);
/// assert!(path::get(&tree, "sidebar.title").is_err());
/// ```
pub fn get<'v>(root: &'v Value, path: impl Into<StructPath>) -> Result<Option<&'v Value>, PathError> {
    let path = path.into();
    let mut current = root;

    for (index, segment) in path.segments().iter().enumerate() {
        let is_terminal = index + 1 == path.len();
        match child(current, segment) {
            Some(next) => current = next,
            None if is_terminal && is_container(current) => return Ok(None),
            None => {
                return Err(PathError::MissingPath {
                    path: path.to_string(),
                    segment: segment.clone(),
                });
            }
        }
    }

    Ok(Some(current))
}

/// Mutable access to the value at `path`, with the same failure rules as [`get`].
pub fn get_mut<'v>(
    root: &'v mut Value,
    path: impl Into<StructPath>,
) -> Result<Option<&'v mut Value>, PathError> {
    let path = path.into();
    let len = path.len();
    let mut current = root;

    for (index, segment) in path.segments().iter().enumerate() {
        let is_terminal = index + 1 == len;
        let missing = || PathError::MissingPath {
            path: path.to_string(),
            segment: segment.clone(),
        };

        current = match current {
            Value::Object(map) => match map.get_mut(segment) {
                Some(next) => next,
                None if is_terminal => return Ok(None),
                None => return Err(missing()),
            },
            Value::Array(items) => {
                match segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                    Some(next) => next,
                    None if is_terminal => return Ok(None),
                    None => return Err(missing()),
                }
            }
            _ => return Err(missing()),
        };
    }

    Ok(Some(current))
}

/// Write `value` at `path`, creating missing intermediate objects.
///
/// When both the current terminal value and `value` are objects, the fields
/// of `value` are merged in and unrelated fields survive; otherwise `value`
/// replaces what was there.
///
/// ```rust
/// use drupalkit::render::path;
/// use serde_json::json;
///
/// let mut tree = json!({"attributes": {"class": ["block"], "id": "main"}});
/// path::set(&mut tree, "attributes", json!({"id": "sidebar"})).unwrap();
/// path::set(&mut tree, "content.body.#markup", json!("Hello")).unwrap();
///
/// assert_eq!(tree["attributes"], json!({"class": ["block"], "id": "sidebar"}));
/// assert_eq!(tree["content"]["body"]["#markup"], json!("Hello"));
/// ```
pub fn set(root: &mut Value, path: impl Into<StructPath>, value: Value) -> Result<(), PathError> {
    write(root, &path.into(), value, shallow_merge)
}

/// Deep-merge `value` into whatever is at `path`, creating missing intermediate objects.
pub fn merge(root: &mut Value, path: impl Into<StructPath>, value: Value) -> Result<(), PathError> {
    write(root, &path.into(), value, |existing, value| {
        *existing = deep_merge_json(std::mem::take(existing), &value);
    })
}

/// Remove the value at `path` and return it.
///
/// Nothing happens when any segment of the path is absent.
pub fn unset(root: &mut Value, path: impl Into<StructPath>) -> Option<Value> {
    let path = path.into();
    let Some((last, parents)) = path.segments().split_last() else {
        return None;
    };

    let mut current = root;
    for segment in parents {
        let next = match current {
            Value::Object(map) => map.get_mut(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
            _ => None,
        };
        let Some(next) = next else {
            trace!("Nothing to unset at '{path}'");
            return None;
        };
        current = next;
    }

    match current {
        Value::Object(map) => map.shift_remove(last),
        Value::Array(items) => {
            let index = last.parse::<usize>().ok()?;
            (index < items.len()).then(|| items.remove(index))
        }
        _ => None,
    }
}

fn write(
    root: &mut Value,
    path: &StructPath,
    value: Value,
    combine: impl FnOnce(&mut Value, Value),
) -> Result<(), PathError> {
    let Some((last, parents)) = path.segments().split_last() else {
        combine(root, value);
        return Ok(());
    };

    let parent = vivify(root, path, parents)?;
    match parent {
        Value::Object(map) => {
            if let Some(existing) = map.get_mut(last) {
                combine(existing, value);
            } else {
                map.insert(last.clone(), value);
            }
            Ok(())
        }
        Value::Array(items) => {
            let index = array_index(path, last, items.len())?;
            if index == items.len() {
                items.push(value);
            } else {
                combine(&mut items[index], value);
            }
            Ok(())
        }
        _ => Err(PathError::NotAContainer {
            path: path.to_string(),
            segment: last.clone(),
        }),
    }
}

fn vivify<'v>(
    root: &'v mut Value,
    path: &StructPath,
    segments: &[String],
) -> Result<&'v mut Value, PathError> {
    let mut current = root;

    for segment in segments {
        if current.is_null() {
            *current = Value::Object(Map::new());
        }

        current = match current {
            Value::Object(map) => map.entry(segment.clone()).or_insert(Value::Null),
            Value::Array(items) => {
                let index = array_index(path, segment, items.len())?;
                if index == items.len() {
                    items.push(Value::Null);
                }
                &mut items[index]
            }
            _ => {
                return Err(PathError::NotAContainer {
                    path: path.to_string(),
                    segment: segment.clone(),
                });
            }
        };
    }

    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    Ok(current)
}

fn array_index(path: &StructPath, segment: &str, len: usize) -> Result<usize, PathError> {
    segment.parse::<usize>().ok().filter(|index| *index <= len).ok_or_else(|| {
        PathError::InvalidIndex {
            path: path.to_string(),
            segment: segment.to_string(),
        }
    })
}

fn shallow_merge(existing: &mut Value, value: Value) {
    match (existing, value) {
        (Value::Object(current), Value::Object(fields)) => {
            for (key, field) in fields {
                current.insert(key, field);
            }
        }
        (existing, value) => *existing = value,
    }
}

/// Recursively merge `overrides` into `base`.
///
/// Nested objects are merged key by key; any other value in `overrides`
/// replaces the value in `base`.
///
/// ```rust
/// use drupalkit::render::path::deep_merge_json;
/// use serde_json::json;
///
/// let base = json!({"attributes": {"class": ["node"], "id": "n1"}});
/// let overrides = json!({"attributes": {"class": ["teaser"]}});
/// assert_eq!(
///     deep_merge_json(base, &overrides),
///     json!({"attributes": {"class": ["teaser"], "id": "n1"}})
/// );
/// ```
pub fn deep_merge_json(mut base: Value, overrides: &Value) -> Value {
    match (base.as_object_mut(), overrides.as_object()) {
        (Some(base_obj), Some(override_obj)) => {
            for (key, override_value) in override_obj {
                match base_obj.get_mut(key) {
                    Some(base_value) if base_value.is_object() && override_value.is_object() => {
                        let merged = deep_merge_json(std::mem::take(base_value), override_value);
                        *base_value = merged;
                    }
                    _ => {
                        base_obj.insert(key.clone(), override_value.clone());
                    }
                }
            }
            base
        }
        _ => overrides.clone(),
    }
}

/// Child element keys of a node, in enumeration order.
///
/// Anything that is not an object has no children.
pub fn keys(node: &Value) -> Vec<&str> {
    match node {
        Value::Object(map) => {
            map.keys().map(String::as_str).filter(|key| !is_reserved(key)).collect()
        }
        _ => Vec::new(),
    }
}

/// Call `f(child, key)` for every child element of `node`.
pub fn each(node: &Value, mut f: impl FnMut(&Value, &str)) {
    for key in keys(node) {
        if let Some(child) = node.get(key) {
            f(child, key);
        }
    }
}

/// Collect `f(child, key)` over every child element of `node`.
pub fn map<T>(node: &Value, mut f: impl FnMut(&Value, &str) -> T) -> Vec<T> {
    keys(node)
        .into_iter()
        .filter_map(|key| node.get(key).map(|child| f(child, key)))
        .collect()
}

/// Template file name of a theme hook: underscores become hyphens.
pub fn template_name_case(name: &str) -> String {
    name.replace('_', "-")
}
