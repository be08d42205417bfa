//! Relationship resolution between extensions.
//!
//! Two relations matter for rendering:
//!
//! - **Module dependencies**: a module's `dependencies` list names other modules,
//!   which may have dependencies of their own. [`dependency_closure`] flattens the
//!   relation into an ordered, duplicate-free list of machine names.
//! - **Theme inheritance**: a theme's `base theme` names at most one parent.
//!   [`base_chain`] walks it upwards, nearest parent first and root last.
//!
//! Both resolvers look entities up through a [`Resolver`] passed by the caller
//! (usually the owning [`Collection`]) instead of a back-pointer stored on each
//! entity. Neither of them fails: a dangling reference is dropped and reported
//! as a [`Diagnostic`], and a cycle is cut at the first revisit.
//!
//! [`ExtensionGraph`] builds the whole module graph at once for cycle detection,
//! install ordering and tree display.

pub mod dependency_graph;

pub use dependency_graph::ExtensionGraph;

use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

use crate::entity::{Collection, Entity};

/// Lookup of entities by identity key.
pub trait Resolver {
    /// Entity with the given identity key, if known.
    fn resolve(&self, id: &str) -> Option<&Entity>;
}

impl Resolver for Collection {
    fn resolve(&self, id: &str) -> Option<&Entity> {
        self.get(id)
    }
}

/// Non-fatal problem found while resolving a relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A module lists a dependency that is not in the collection.
    MissingDependency {
        /// Module declaring the dependency
        module: String,
        /// Machine name that could not be resolved
        dependency: String,
    },
    /// Dependency expansion came back to a module already being expanded.
    DependencyCycle {
        /// Modules forming the cycle, first and last element equal
        path: Vec<String>,
    },
    /// A theme names a base theme that is not in the collection.
    UnresolvableBaseTheme {
        /// Theme declaring the base
        theme: String,
        /// Machine name that could not be resolved
        base: String,
    },
    /// The base theme relation loops back onto itself.
    BaseThemeCycle {
        /// Themes forming the cycle, first and last element equal
        path: Vec<String>,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingDependency {
                module,
                dependency,
            } => write!(f, "Module '{module}' depends on '{dependency}', which was not found"),
            Diagnostic::DependencyCycle {
                path,
            } => write!(f, "Circular module dependency: {}", path.join(" → ")),
            Diagnostic::UnresolvableBaseTheme {
                theme,
                base,
            } => write!(f, "Theme '{theme}' has base theme '{base}', which was not found"),
            Diagnostic::BaseThemeCycle {
                path,
            } => write!(f, "Circular base theme chain: {}", path.join(" → ")),
        }
    }
}

/// Result of a relation lookup: ordered identity keys plus diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Machine names, in resolution order, without duplicates
    pub ids: Vec<String>,
    /// Problems encountered along the way
    pub diagnostics: Vec<Diagnostic>,
}

impl Resolution {
    /// Whether no identity key was resolved.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of resolved identity keys.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        if !self.diagnostics.contains(&diagnostic) {
            warn!("{diagnostic}");
            self.diagnostics.push(diagnostic);
        }
    }
}

/// Transitive dependency closure of a module.
///
/// The module's resolvable direct dependencies come first, in declaration
/// order, followed by the closure of each of them (depth-first). Unknown
/// dependencies are dropped with a [`Diagnostic::MissingDependency`]. The
/// module's own key only appears when something in the graph depends on it,
/// directly (a self-dependency) or through a cycle, which is reported as
/// [`Diagnostic::DependencyCycle`] and not expanded further.
///
/// ```rust
/// use drupalkit::core::ExtensionKind;
/// use drupalkit::entity::Collection;
/// use drupalkit::graph::dependency_closure;
/// use serde_json::json;
///
/// let modules = Collection::from_data(ExtensionKind::Module, [
///     json!({"machine name": "field_ui", "dependencies": ["drupal:field"]}),
///     json!({"machine name": "field", "dependencies": ["system"]}),
///     json!({"machine name": "system"}),
/// ].into_iter().map(|v| v.as_object().unwrap().clone()));
///
/// let closure = dependency_closure(modules.get("field_ui").unwrap(), &modules);
/// assert_eq!(closure.ids, vec!["field", "system"]);
/// ```
pub fn dependency_closure(module: &Entity, resolver: &impl Resolver) -> Resolution {
    let mut resolution = Resolution::default();
    let mut stack = vec![module.id().unwrap_or_default().to_string()];
    let mut expanded = HashSet::new();
    let mut ids = Vec::new();

    expand_dependencies(module, resolver, &mut stack, &mut expanded, &mut ids, &mut resolution);

    let mut seen = HashSet::new();
    resolution.ids = ids.into_iter().filter(|id| seen.insert(id.clone())).collect();

    debug!(
        "Resolved {} dependencies for module '{}'",
        resolution.ids.len(),
        module.id().unwrap_or_default()
    );
    resolution
}

/// Append the closure of `module` to `ids`.
///
/// A module already in `expanded` contributed its whole closure earlier, so
/// only its own key is emitted again.
fn expand_dependencies<'a, R: Resolver>(
    module: &Entity,
    resolver: &'a R,
    stack: &mut Vec<String>,
    expanded: &mut HashSet<String>,
    ids: &mut Vec<String>,
    resolution: &mut Resolution,
) {
    let owner = module.id().unwrap_or_default();
    let mut direct: Vec<(String, &'a Entity)> = Vec::new();

    for dependency in module.dependencies() {
        match resolver.resolve(&dependency) {
            Some(entity) => direct.push((dependency, entity)),
            None => resolution.push_diagnostic(Diagnostic::MissingDependency {
                module: owner.to_string(),
                dependency,
            }),
        }
    }

    ids.extend(direct.iter().map(|(id, _)| id.clone()));

    for (id, entity) in direct {
        if let Some(start) = stack.iter().position(|on_stack| *on_stack == id) {
            let mut path = stack[start..].to_vec();
            path.push(id);
            resolution.push_diagnostic(Diagnostic::DependencyCycle {
                path,
            });
            continue;
        }
        if expanded.contains(&id) {
            continue;
        }

        stack.push(id);
        expand_dependencies(entity, resolver, stack, expanded, ids, resolution);
        if let Some(done) = stack.pop() {
            expanded.insert(done);
        }
    }
}

/// Ancestry of a theme, nearest parent first and root last.
///
/// The walk stops at a theme without a base, at a base theme that cannot be
/// resolved ([`Diagnostic::UnresolvableBaseTheme`]) or at the first theme seen
/// twice ([`Diagnostic::BaseThemeCycle`]).
///
/// ```rust
/// use drupalkit::core::ExtensionKind;
/// use drupalkit::entity::Collection;
/// use drupalkit::graph::base_chain;
/// use serde_json::json;
///
/// let themes = Collection::from_data(ExtensionKind::Theme, [
///     json!({"machine name": "stable"}),
///     json!({"machine name": "classy", "base theme": "stable"}),
///     json!({"machine name": "irata", "base theme": "classy"}),
/// ].into_iter().map(|v| v.as_object().unwrap().clone()));
///
/// let chain = base_chain(themes.get("irata").unwrap(), &themes);
/// assert_eq!(chain.ids, vec!["classy", "stable"]);
/// ```
pub fn base_chain(theme: &Entity, resolver: &impl Resolver) -> Resolution {
    let mut resolution = Resolution::default();
    let mut visited = vec![theme.id().unwrap_or_default().to_string()];
    let mut current = theme;

    while let Some(base) = current.base_theme() {
        if visited.iter().any(|seen| seen == base) {
            let mut path = visited.clone();
            path.push(base.to_string());
            resolution.push_diagnostic(Diagnostic::BaseThemeCycle {
                path,
            });
            break;
        }

        let Some(parent) = resolver.resolve(base) else {
            resolution.push_diagnostic(Diagnostic::UnresolvableBaseTheme {
                theme: current.id().unwrap_or_default().to_string(),
                base: base.to_string(),
            });
            break;
        };

        resolution.ids.push(base.to_string());
        visited.push(base.to_string());
        current = parent;
    }

    debug!(
        "Theme '{}' has base chain [{}]",
        theme.id().unwrap_or_default(),
        resolution.ids.join(", ")
    );
    resolution
}
