//! A single discovered extension.

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use crate::constants::{
    BASE_THEME_FIELD, DEPENDENCIES_FIELD, INFO_FILE_FIELD, MACHINE_NAME_FIELD, TYPE_FIELD,
};
use crate::core::ExtensionKind;
use crate::hooks::Behavior;

/// Ordered, schema-free descriptor fields of an extension.
pub type Fields = Map<String, Value>;

/// Matches `project:machine_name (constraint)` and captures the machine name.
static DEPENDENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[\w-]+:)?(\w+)").expect("dependency pattern is a valid regex")
});

/// One discovered extension: a module, theme, theme engine, library, vendor or site.
///
/// An entity wraps the descriptor fields it was built from and exposes them
/// read-only. Its identity is the value of the field named by `id_field`
/// (the machine name for everything discovery produces). Templates and the
/// behavior object are runtime attachments; they never show up in
/// [`Entity::to_map`].
///
/// ```rust
/// use drupalkit::core::ExtensionKind;
/// use drupalkit::entity::Entity;
/// use serde_json::json;
///
/// let fields = json!({
///     "machine name": "field_ui",
///     "name": "Field UI",
///     "dependencies": ["drupal:field"],
/// });
/// let entity = Entity::new(ExtensionKind::Module, fields.as_object().unwrap().clone(), "machine name");
/// assert_eq!(entity.id(), Some("field_ui"));
/// assert_eq!(entity.dependencies(), vec!["field".to_string()]);
/// ```
#[derive(Clone)]
pub struct Entity {
    kind: ExtensionKind,
    id_field: String,
    fields: Fields,
    templates: BTreeMap<String, PathBuf>,
    behavior: Option<Arc<Behavior>>,
}

impl Entity {
    /// Build an entity from raw descriptor fields.
    ///
    /// No validation is performed; a missing identity field simply makes
    /// [`Entity::id`] return `None`.
    pub fn new(kind: ExtensionKind, fields: Fields, id_field: impl Into<String>) -> Self {
        Self {
            kind,
            id_field: id_field.into(),
            fields,
            templates: BTreeMap::new(),
            behavior: None,
        }
    }

    /// Build an entity keyed by machine name, the convention for discovered extensions.
    pub fn with_machine_name(kind: ExtensionKind, fields: Fields) -> Self {
        Self::new(kind, fields, MACHINE_NAME_FIELD)
    }

    /// The identity key: the string value of the identity field.
    pub fn id(&self) -> Option<&str> {
        self.fields.get(&self.id_field).and_then(Value::as_str)
    }

    /// Name of the field holding the identity key.
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Kind of this extension.
    pub fn kind(&self) -> ExtensionKind {
        self.kind
    }

    /// Read a descriptor field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Read a descriptor field as a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// All descriptor fields, in construction order.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// The descriptor fields as a plain map, without runtime attachments.
    pub fn to_map(&self) -> Fields {
        self.fields.clone()
    }

    /// Human readable name (`name` field).
    pub fn name(&self) -> Option<&str> {
        self.get_str("name")
    }

    /// Type declared by the info file (`type` field).
    pub fn declared_type(&self) -> Option<&str> {
        self.get_str(TYPE_FIELD)
    }

    /// Machine names of the modules this extension depends on.
    ///
    /// Entries written as `project:module (>=8.x)` are reduced to `module`.
    /// Non-string entries and a non-list field are ignored.
    pub fn dependencies(&self) -> Vec<String> {
        let Some(Value::Array(items)) = self.fields.get(DEPENDENCIES_FIELD) else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(normalize_dependency)
            .collect()
    }

    /// Machine name of the parent theme, if any.
    ///
    /// `base theme: false` and an empty string both mean "no base theme".
    pub fn base_theme(&self) -> Option<&str> {
        match self.fields.get(BASE_THEME_FIELD) {
            Some(Value::String(name)) if !name.trim().is_empty() => Some(name.trim()),
            _ => None,
        }
    }

    /// Root-relative path of the info file this extension was loaded from.
    pub fn info_file(&self) -> Option<&str> {
        self.get_str(INFO_FILE_FIELD)
    }

    /// Directory containing the info file.
    pub fn dir(&self) -> Option<PathBuf> {
        self.info_file()
            .and_then(|file| Path::new(file).parent())
            .map(Path::to_path_buf)
    }

    /// Template files attached to this extension, keyed by normalized template name.
    pub fn templates(&self) -> &BTreeMap<String, PathBuf> {
        &self.templates
    }

    /// Path of the template registered under `name`.
    pub fn template(&self, name: &str) -> Option<&Path> {
        self.templates.get(name).map(PathBuf::as_path)
    }

    /// Attach a template file under its normalized name.
    pub fn attach_template(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.templates.insert(name.into(), path.into());
    }

    /// Behavior object bound to this extension.
    pub fn behavior(&self) -> Option<&Arc<Behavior>> {
        self.behavior.as_ref()
    }

    /// Bind (or clear) the behavior object.
    pub fn set_behavior(&mut self, behavior: Option<Arc<Behavior>>) {
        self.behavior = behavior;
    }

    /// Whether the bound behavior implements `hook`.
    pub fn implements(&self, hook: &str) -> bool {
        self.behavior.as_ref().is_some_and(|behavior| behavior.implements(hook))
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("kind", &self.kind)
            .field("id", &self.id())
            .field("fields", &self.fields)
            .field("templates", &self.templates)
            .field("behavior", &self.behavior)
            .finish()
    }
}

fn normalize_dependency(raw: &str) -> Option<String> {
    DEPENDENCY_RE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_identity_from_named_field() {
        let entity = Entity::new(
            ExtensionKind::Site,
            fields(json!({"name": "example.loc", "path": "sites/example"})),
            "name",
        );
        assert_eq!(entity.id(), Some("example.loc"));
        assert_eq!(entity.id_field(), "name");
    }

    #[test]
    fn test_missing_identity() {
        let entity = Entity::with_machine_name(ExtensionKind::Module, fields(json!({"name": "x"})));
        assert_eq!(entity.id(), None);
    }

    #[test]
    fn test_to_map_preserves_order_and_excludes_attachments() {
        let mut entity = Entity::with_machine_name(
            ExtensionKind::Theme,
            fields(json!({"zeta": 1, "machine name": "olivero", "alpha": true})),
        );
        entity.attach_template("page", "core/themes/olivero/templates/page.html.twig");
        entity.set_behavior(Some(Arc::new(Behavior::new())));

        let map = entity.to_map();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "machine name", "alpha"]);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_dependencies_normalization() {
        let entity = Entity::with_machine_name(
            ExtensionKind::Module,
            fields(json!({
                "machine name": "field_ui",
                "dependencies": ["drupal:field", "views (>=8.x-3.0)", "node", 42],
            })),
        );
        assert_eq!(entity.dependencies(), vec!["field", "views", "node"]);
    }

    #[test]
    fn test_normalize_dependency_forms() {
        assert_eq!(normalize_dependency("drupal:field").as_deref(), Some("field"));
        assert_eq!(normalize_dependency("  ctools (>=8.x-3.0)").as_deref(), Some("ctools"));
        assert_eq!(normalize_dependency("search-api:search_api_db").as_deref(), Some("search_api_db"));
        assert_eq!(normalize_dependency("node").as_deref(), Some("node"));
        assert_eq!(normalize_dependency("(>=10)"), None);
    }

    #[test]
    fn test_dependencies_absent_or_wrong_type() {
        let entity = Entity::with_machine_name(
            ExtensionKind::Module,
            fields(json!({"machine name": "a", "dependencies": "b"})),
        );
        assert!(entity.dependencies().is_empty());
    }

    #[test]
    fn test_base_theme_variants() {
        let with_base = Entity::with_machine_name(
            ExtensionKind::Theme,
            fields(json!({"machine name": "child", "base theme": "classy"})),
        );
        assert_eq!(with_base.base_theme(), Some("classy"));

        let disabled = Entity::with_machine_name(
            ExtensionKind::Theme,
            fields(json!({"machine name": "stark", "base theme": false})),
        );
        assert_eq!(disabled.base_theme(), None);

        let empty = Entity::with_machine_name(
            ExtensionKind::Theme,
            fields(json!({"machine name": "x", "base theme": ""})),
        );
        assert_eq!(empty.base_theme(), None);
    }

    #[test]
    fn test_dir_from_info_file() {
        let entity = Entity::with_machine_name(
            ExtensionKind::Theme,
            fields(json!({"machine name": "classy", "info file": "core/themes/classy/classy.info.yml"})),
        );
        assert_eq!(entity.dir(), Some(PathBuf::from("core/themes/classy")));
    }
}
