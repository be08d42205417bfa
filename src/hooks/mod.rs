//! Hook dispatch across behavior-bearing extensions.
//!
//! Extensions do not carry code of their own. Instead the embedding program
//! registers a [`Behavior`] for an extension in a [`BehaviorRegistry`], keyed by
//! kind and machine name, and binds the registry onto the loaded collections once
//! at startup (see [`Runtime::bind_behaviors`]). An extension without a
//! registration simply has no behavior.
//!
//! A behavior is a set of named hook closures. [`invoke_hook`] walks an ordered
//! list of entities and calls the hook on every entity whose behavior implements
//! it; the others are skipped. Hooks mutate the variables they receive in place
//! and return nothing.
//!
//! # Dispatch order
//!
//! The render pipeline dispatches twice per hook name:
//!
//! 1. across all active modules, in collection order;
//! 2. across the active theme's ancestry, root ancestor first, followed by the
//!    theme itself ([`theme_dispatch_order`]), so a more specific theme sees and
//!    can override what its ancestors did.
//!
//! # Example
//!
//! ```rust
//! use drupalkit::hooks::Behavior;
//! use serde_json::{Value, json};
//!
//! let behavior = Behavior::new().with_hook("preprocess_block", |variables: &mut Value, _ctx| {
//!     variables["label"] = json!("Overridden");
//! });
//! assert!(behavior.implements("preprocess_block"));
//! assert!(!behavior.implements("preprocess_page"));
//! ```
//!
//! [`Runtime::bind_behaviors`]: crate::runtime::Runtime::bind_behaviors

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::core::ExtensionKind;
use crate::entity::{Collection, Entity};
use crate::graph::{Resolver, base_chain};
use crate::runtime::Runtime;

/// A hook implementation.
pub type HookFn = Arc<dyn Fn(&mut Value, &HookContext<'_>) + Send + Sync>;

/// What a hook gets to see besides the variables it mutates.
pub struct HookContext<'a> {
    /// Name of the hook being dispatched, e.g. `preprocess_block`
    pub hook: &'a str,
    /// The extension whose behavior is being invoked
    pub entity: &'a Entity,
    /// The runtime driving the render, when dispatch happens inside one
    pub runtime: Option<&'a Runtime>,
}

/// Named hook implementations of one extension.
#[derive(Clone, Default)]
pub struct Behavior {
    hooks: BTreeMap<String, HookFn>,
}

impl Behavior {
    /// Create a behavior without hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the implementation of `name`.
    pub fn with_hook<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&mut Value, &HookContext<'_>) + Send + Sync + 'static,
    {
        self.hooks.insert(name.into(), Arc::new(hook));
        self
    }

    /// Implementation of `name`, if any.
    pub fn hook(&self, name: &str) -> Option<&HookFn> {
        self.hooks.get(name)
    }

    /// Whether `name` is implemented.
    pub fn implements(&self, name: &str) -> bool {
        self.hooks.contains_key(name)
    }

    /// Names of all implemented hooks, sorted.
    pub fn hook_names(&self) -> Vec<&str> {
        self.hooks.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior").field("hooks", &self.hook_names()).finish()
    }
}

/// Behaviors registered by the embedding program, keyed by kind and machine name.
#[derive(Debug, Clone, Default)]
pub struct BehaviorRegistry {
    entries: BTreeMap<(ExtensionKind, String), Arc<Behavior>>,
}

impl BehaviorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the behavior of one extension, replacing any earlier registration.
    pub fn register(
        &mut self,
        kind: ExtensionKind,
        machine_name: impl Into<String>,
        behavior: Behavior,
    ) -> &mut Self {
        let machine_name = machine_name.into();
        debug!(
            "Registering {} behavior for '{}' ({} hooks)",
            kind,
            machine_name,
            behavior.hooks.len()
        );
        self.entries.insert((kind, machine_name), Arc::new(behavior));
        self
    }

    /// Behavior registered for an extension.
    pub fn get(&self, kind: ExtensionKind, machine_name: &str) -> Option<Arc<Behavior>> {
        self.entries.get(&(kind, machine_name.to_string())).cloned()
    }

    /// Whether a behavior is registered for an extension.
    pub fn contains(&self, kind: ExtensionKind, machine_name: &str) -> bool {
        self.entries.contains_key(&(kind, machine_name.to_string()))
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Attach registered behaviors to the entities of `collection`.
    ///
    /// Entities without a registration end up with no behavior. Returns the
    /// number of entities that received one.
    pub fn bind(&self, collection: &mut Collection) -> usize {
        let kind = collection.kind();
        let mut bound = 0;

        for entity in collection.iter_mut() {
            let behavior = entity.id().and_then(|id| self.get(kind, id));
            if behavior.is_some() {
                bound += 1;
            }
            entity.set_behavior(behavior);
        }

        debug!("Bound {bound} {} behaviors", kind);
        bound
    }
}

/// Call `hook` on every entity that implements it, in the given order.
pub fn invoke_hook<'a>(
    hook: &str,
    entities: impl IntoIterator<Item = &'a Entity>,
    variables: &mut Value,
    runtime: Option<&Runtime>,
) {
    for entity in entities {
        let Some(implementation) = entity.behavior().and_then(|behavior| behavior.hook(hook))
        else {
            continue;
        };

        trace!("Invoking {hook} on {} '{}'", entity.kind(), entity.id().unwrap_or_default());
        let context = HookContext {
            hook,
            entity,
            runtime,
        };
        implementation(variables, &context);
    }
}

/// A theme's ancestors, root first, followed by the theme itself.
pub fn theme_dispatch_order<'a>(theme: &'a Entity, themes: &'a Collection) -> Vec<&'a Entity> {
    let chain = base_chain(theme, themes);
    let mut order: Vec<&Entity> =
        chain.ids.iter().rev().filter_map(|id| themes.resolve(id)).collect();
    order.push(theme);
    order
}
