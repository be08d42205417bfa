//! Identity-keyed collections of entities.

use serde_json::Value;
use strsim::levenshtein;
use tracing::trace;

use super::record::{Entity, Fields};
use crate::constants::MACHINE_NAME_FIELD;
use crate::core::ExtensionKind;

/// Maximum Levenshtein distance, as a percentage of the name length, for
/// [`Collection::similar_ids`] suggestions.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// An ordered collection of entities of one kind.
///
/// At most one entity exists per identity key: [`Collection::add`] replaces an
/// existing entity in place (same position) instead of appending a duplicate.
/// Lookups are linear and deterministic: the first match in insertion order
/// wins, and a miss is `None`, never an error.
///
/// ```rust
/// use drupalkit::core::ExtensionKind;
/// use drupalkit::entity::Collection;
/// use serde_json::json;
///
/// let mut modules = Collection::new(ExtensionKind::Module);
/// modules.add(json!({"machine name": "node", "name": "Node"}).as_object().unwrap().clone());
/// modules.add(json!({"machine name": "node", "name": "Content"}).as_object().unwrap().clone());
///
/// assert_eq!(modules.len(), 1);
/// assert_eq!(modules.get("node").and_then(|m| m.name()), Some("Content"));
/// ```
#[derive(Debug, Clone)]
pub struct Collection {
    kind: ExtensionKind,
    id_field: String,
    items: Vec<Entity>,
}

impl Collection {
    /// Create an empty collection keyed by machine name.
    pub fn new(kind: ExtensionKind) -> Self {
        Self::with_id_field(kind, MACHINE_NAME_FIELD)
    }

    /// Create an empty collection keyed by an arbitrary field.
    pub fn with_id_field(kind: ExtensionKind, id_field: impl Into<String>) -> Self {
        Self {
            kind,
            id_field: id_field.into(),
            items: Vec::new(),
        }
    }

    /// Create a collection keyed by machine name and fill it from raw field maps.
    pub fn from_data(kind: ExtensionKind, data: impl IntoIterator<Item = Fields>) -> Self {
        let mut collection = Self::new(kind);
        collection.reset(data);
        collection
    }

    /// Kind of every entity in this collection.
    pub fn kind(&self) -> ExtensionKind {
        self.kind
    }

    /// Name of the identity field used for upserts.
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Build an entity from `fields` and upsert it.
    pub fn add(&mut self, fields: Fields) -> &mut Entity {
        let entity = Entity::new(self.kind, fields, self.id_field.clone());
        self.insert(entity)
    }

    /// Upsert an already built entity.
    ///
    /// Entities without an identity are always appended.
    pub fn insert(&mut self, entity: Entity) -> &mut Entity {
        let position = entity
            .id()
            .and_then(|id| self.items.iter().position(|existing| existing.id() == Some(id)));

        match position {
            Some(index) => {
                trace!("Replacing {} '{}' in place", self.kind, entity.id().unwrap_or_default());
                self.items[index] = entity;
                &mut self.items[index]
            }
            None => {
                self.items.push(entity);
                let last = self.items.len() - 1;
                &mut self.items[last]
            }
        }
    }

    /// Replace the whole content with `data`.
    pub fn reset(&mut self, data: impl IntoIterator<Item = Fields>) -> &mut Self {
        self.items.clear();
        for fields in data {
            self.add(fields);
        }
        self
    }

    /// First entity matching `predicate`.
    pub fn find(&self, predicate: impl Fn(&Entity) -> bool) -> Option<&Entity> {
        self.items.iter().find(|entity| predicate(entity))
    }

    /// First entity whose `field` equals `value`.
    pub fn find_by_key(&self, field: &str, value: impl Into<Value>) -> Option<&Entity> {
        let value = value.into();
        self.find(|entity| entity.get(field) == Some(&value))
    }

    /// Entity with the given identity key.
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.find(|entity| entity.id() == Some(id))
    }

    /// Mutable access to the entity with the given identity key.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.items.iter_mut().find(|entity| entity.id() == Some(id))
    }

    /// Whether an entity with the given identity key exists.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// All entities matching `predicate`, in insertion order.
    pub fn filter(&self, predicate: impl Fn(&Entity) -> bool) -> Vec<&Entity> {
        self.items.iter().filter(|entity| predicate(entity)).collect()
    }

    /// Map every entity, in insertion order.
    pub fn map<T>(&self, f: impl FnMut(&Entity) -> T) -> Vec<T> {
        self.items.iter().map(f).collect()
    }

    /// Visit every entity, in insertion order.
    pub fn for_each(&self, f: impl FnMut(&Entity)) {
        self.items.iter().for_each(f);
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.items.iter()
    }

    /// Iterate mutably in insertion order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Entity> {
        self.items.iter_mut()
    }

    /// Identity keys, in insertion order.
    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().filter_map(Entity::id).collect()
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Plain field maps of every entity, in insertion order.
    pub fn to_maps(&self) -> Vec<Fields> {
        self.map(Entity::to_map)
    }

    /// Up to three identity keys close to `name`, closest first.
    pub fn similar_ids(&self, name: &str) -> Vec<String> {
        let mut scored: Vec<(&str, usize)> =
            self.ids().into_iter().map(|id| (id, levenshtein(name, id))).collect();
        scored.sort_by_key(|(_, distance)| *distance);

        scored
            .into_iter()
            .filter(|(_, distance)| *distance <= name.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
            .take(3)
            .map(|(id, _)| id.to_string())
            .collect()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    fn modules() -> Collection {
        Collection::from_data(
            ExtensionKind::Module,
            vec![
                fields(json!({"machine name": "node", "name": "Node", "package": "Core"})),
                fields(json!({"machine name": "field", "name": "Field", "package": "Core"})),
                fields(json!({"machine name": "devel", "name": "Devel", "package": "Development"})),
            ],
        )
    }

    #[test]
    fn test_add_replaces_in_place() {
        let mut collection = modules();
        collection.add(fields(json!({"machine name": "node", "name": "Content"})));

        assert_eq!(collection.len(), 3);
        assert_eq!(collection.ids(), vec!["node", "field", "devel"]);
        assert_eq!(collection.get("node").and_then(Entity::name), Some("Content"));
        // The replaced record reflects only the second call's data
        assert!(collection.get("node").unwrap().get("package").is_none());
    }

    #[test]
    fn test_entities_without_identity_are_appended() {
        let mut collection = Collection::new(ExtensionKind::Library);
        collection.add(fields(json!({"version": "1"})));
        collection.add(fields(json!({"version": "1"})));
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_find_first_match_wins() {
        let collection = modules();
        let found = collection.find_by_key("package", "Core").unwrap();
        assert_eq!(found.id(), Some("node"));
        assert!(collection.find_by_key("package", "Missing").is_none());
    }

    #[test]
    fn test_filter_preserves_order() {
        let collection = modules();
        let core: Vec<&str> = collection
            .filter(|entity| entity.get_str("package") == Some("Core"))
            .into_iter()
            .filter_map(Entity::id)
            .collect();
        assert_eq!(core, vec!["node", "field"]);
    }

    #[test]
    fn test_map_and_for_each_order() {
        let collection = modules();
        let names = collection.map(|entity| entity.name().unwrap_or_default().to_string());
        assert_eq!(names, vec!["Node", "Field", "Devel"]);

        let mut seen = Vec::new();
        collection.for_each(|entity| seen.push(entity.id().unwrap_or_default().to_string()));
        assert_eq!(seen, vec!["node", "field", "devel"]);
    }

    #[test]
    fn test_custom_identity_field() {
        let mut sites = Collection::with_id_field(ExtensionKind::Site, "name");
        sites.add(fields(json!({"name": "irata.loc"})));
        sites.add(fields(json!({"name": "irata.loc", "default": true})));
        assert_eq!(sites.len(), 1);
        assert_eq!(sites.get("irata.loc").unwrap().get("default"), Some(&json!(true)));
    }

    #[test]
    fn test_reset_and_to_maps() {
        let mut collection = modules();
        collection.reset(vec![fields(json!({"machine name": "views"}))]);
        assert_eq!(collection.to_maps(), vec![fields(json!({"machine name": "views"}))]);
    }

    #[test]
    fn test_similar_ids() {
        let collection = modules();
        assert_eq!(collection.similar_ids("feild"), vec!["field".to_string()]);
        assert!(collection.similar_ids("completely_different").is_empty());
    }
}
