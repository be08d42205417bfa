//! Global constants used throughout the drupalkit codebase.
//!
//! Reserved render keys, template naming conventions, scan layout and
//! tool retry parameters live here so that magic strings are defined once.

use std::time::Duration;

/// Prefix marking a render-tree key as metadata rather than a child element.
pub const RESERVED_PREFIX: char = '#';

/// Reserved key the render pipeline tags with the originating hook name.
pub const THEME_HOOK_ORIGINAL_KEY: &str = "#theme_hook_original";

/// Reserved key naming the theme hook an element should be rendered with.
pub const THEME_KEY: &str = "#theme";

/// Reserved key caching the rendered markup of an element.
pub const CHILDREN_KEY: &str = "#children";

/// Reserved key holding literal markup of an element without a theme hook.
pub const MARKUP_KEY: &str = "#markup";

/// Delimiter placed between segments of a theme suggestion.
pub const SUGGESTION_DELIMITER: &str = "__";

/// Wildcard segment emitted before every numeric suggestion argument.
pub const SUGGESTION_WILDCARD: &str = "%";

/// Name of the hook every preprocess pass starts with.
pub const PREPROCESS_HOOK: &str = "preprocess";

/// Extension of template files attached to extensions.
pub const TEMPLATE_EXTENSION: &str = ".html.twig";

/// Info file extensions recognised by discovery.
pub const INFO_EXTENSIONS: [&str; 2] = [".info.yml", ".info.yaml"];

/// Field holding the machine name of an extension (its identity key).
pub const MACHINE_NAME_FIELD: &str = "machine name";

/// Field holding the root-relative path of the info file an extension came from.
pub const INFO_FILE_FIELD: &str = "info file";

/// Field holding the extension type declared in an info file.
pub const TYPE_FIELD: &str = "type";

/// Field listing module dependencies.
pub const DEPENDENCIES_FIELD: &str = "dependencies";

/// Field naming the parent theme.
pub const BASE_THEME_FIELD: &str = "base theme";

/// Project configuration file name searched in the project root.
pub const CONFIG_FILE_NAME: &str = "drupalkit.toml";

/// Path fragment that excludes a scanned file from discovery.
pub const TEST_PATH_MARKER: &str = "test";

/// Starting delay for tool retry backoff (50ms).
pub const TOOL_RETRY_BASE_DELAY_MS: u64 = 50;

/// Maximum delay between tool retries.
pub const TOOL_RETRY_MAX_DELAY: Duration = Duration::from_secs(2);
