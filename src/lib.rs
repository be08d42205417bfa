//! drupalkit - extension discovery, hook dispatch and theme rendering for Drupal code bases
//!
//! drupalkit reads a Drupal root the way Drupal itself sees it: every
//! `*.info.yml` under `modules/`, `themes/`, `core/` and `sites/` becomes an
//! extension record, templates are attached to the extension that ships them,
//! and a render call walks the preprocess hooks of the enabled modules and the
//! active theme chain before picking the most specific template.
//!
//! # Architecture Overview
//!
//! ## Data model
//! - [`entity`] - Field records with an identity key and the collections holding them
//! - [`graph`] - Module dependency closure, base theme chains and the dependency graph
//! - [`core`] - Error types and extension kinds
//!
//! ## Rendering
//! - [`render`] - Structural paths into render trees, theme suggestions and the render pipeline
//! - [`hooks`] - Behaviors, the registry binding them to extensions, and hook dispatch
//! - [`runtime`] - One Drupal root: its collections, templates and render entry points
//!
//! ## Integration
//! - [`discovery`] - Scanning the root, info files, templates, sites, libraries and vendors
//! - [`tools`] - drush and composer with JSON output
//! - [`config`] - `drupalkit.toml`
//! - [`cli`] - The `drupalkit` command line
//!
//! # Example
//!
//! ```rust,no_run
//! use drupalkit::config::ProjectConfig;
//! use drupalkit::core::ExtensionKind;
//! use drupalkit::hooks::{Behavior, BehaviorRegistry};
//! use drupalkit::render::RenderOptions;
//! use drupalkit::runtime::Runtime;
//! use serde_json::json;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut config = ProjectConfig::for_root("web");
//! config.theme = Some("olivero".to_string());
//! let mut runtime = Runtime::load(config).await?;
//!
//! let mut registry = BehaviorRegistry::new();
//! registry.register(
//!     ExtensionKind::Theme,
//!     "olivero",
//!     Behavior::new().with_hook("preprocess_node", |variables: &mut serde_json::Value, _ctx| {
//!         variables["label"] = json!("Preprocessed");
//!     }),
//! );
//! runtime.bind_behaviors(&registry);
//!
//! let options = RenderOptions::new().with_suggestion_args(["article", "full"]);
//! let html = runtime.render("node", &mut json!({"label": "Hello"}), &options);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod discovery;
pub mod entity;
pub mod graph;
pub mod hooks;
pub mod render;
pub mod runtime;
pub mod tools;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
