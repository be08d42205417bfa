//! Integration test suite for drupalkit
//!
//! End-to-end tests against Drupal roots built on disk with
//! [`DrupalFixture`](drupalkit::test_utils::DrupalFixture).
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **discovery**: Scanning, info loading, template attachment, sites, libraries and vendors
//! - **relations**: Dependency closures, base theme chains and the dependency graph
//! - **render**: The render pipeline on a loaded root, with behaviors bound
//! - **cli**: The `drupalkit` binary
//! - **tools**: drush and composer wrappers against stand-in scripts

mod cli;
mod discovery;
mod relations;
mod render;
#[cfg(unix)]
mod tools;
