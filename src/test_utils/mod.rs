//! Test utilities for drupalkit.
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration suite.
//!
//! - [`init_test_logging`] installs a tracing subscriber once per process
//! - [`DrupalFixture`] builds a throwaway Drupal root on disk
//!
//! # Example
//!
//! ```rust,no_run
//! use drupalkit::test_utils::DrupalFixture;
//!
//! let fixture = DrupalFixture::new()
//!     .unwrap()
//!     .module("node", &["drupal:system"])
//!     .unwrap()
//!     .theme("olivero", None)
//!     .unwrap();
//! assert!(fixture.path("modules/node/node.info.yml").exists());
//! ```

pub mod fixture;

pub use fixture::DrupalFixture;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `level` the subscriber logs at
/// that level; without it `RUST_LOG` is used, and nothing is installed when
/// `RUST_LOG` is unset.
///
/// ```bash
/// RUST_LOG=drupalkit=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
