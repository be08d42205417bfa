//! Extension kinds discovered in a Drupal code base.

use serde::{Deserialize, Serialize};

use super::DrupalKitError;

/// Kind of a discovered extension.
///
/// The kind decides which collection an info file lands in. Info files declare
/// it through their `type` field; libraries, vendors and sites are populated by
/// callers rather than by info files.
///
/// ```rust
/// use drupalkit::core::ExtensionKind;
///
/// let kind: ExtensionKind = "theme_engine".parse().unwrap();
/// assert_eq!(kind, ExtensionKind::ThemeEngine);
/// assert_eq!(kind.to_string(), "theme_engine");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionKind {
    /// Behavior-bearing modules with dependencies on other modules
    Module,
    /// Themes, optionally inheriting from a base theme
    Theme,
    /// Template engines used by themes
    ThemeEngine,
    /// Front-end libraries
    Library,
    /// Composer vendor packages
    Vendor,
    /// Multisite site directories
    Site,
}

impl ExtensionKind {
    /// All kinds, in the order collections are listed.
    pub const ALL: [ExtensionKind; 6] = [
        ExtensionKind::Module,
        ExtensionKind::Theme,
        ExtensionKind::ThemeEngine,
        ExtensionKind::Library,
        ExtensionKind::Vendor,
        ExtensionKind::Site,
    ];

    /// Machine-readable name, as used in info files and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ExtensionKind::Module => "module",
            ExtensionKind::Theme => "theme",
            ExtensionKind::ThemeEngine => "theme_engine",
            ExtensionKind::Library => "library",
            ExtensionKind::Vendor => "vendor",
            ExtensionKind::Site => "site",
        }
    }

    /// Plural label used in listings.
    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            ExtensionKind::Module => "modules",
            ExtensionKind::Theme => "themes",
            ExtensionKind::ThemeEngine => "theme engines",
            ExtensionKind::Library => "libraries",
            ExtensionKind::Vendor => "vendors",
            ExtensionKind::Site => "sites",
        }
    }
}

impl std::fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExtensionKind {
    type Err = DrupalKitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "module" | "modules" => Ok(ExtensionKind::Module),
            "theme" | "themes" => Ok(ExtensionKind::Theme),
            "theme_engine" | "theme_engines" | "engine" => Ok(ExtensionKind::ThemeEngine),
            "library" | "libraries" => Ok(ExtensionKind::Library),
            "vendor" | "vendors" => Ok(ExtensionKind::Vendor),
            "site" | "sites" => Ok(ExtensionKind::Site),
            _ => Err(DrupalKitError::InvalidExtensionKind {
                kind: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kinds() {
        assert_eq!("module".parse::<ExtensionKind>().unwrap(), ExtensionKind::Module);
        assert_eq!("Themes".parse::<ExtensionKind>().unwrap(), ExtensionKind::Theme);
        assert_eq!("theme-engine".parse::<ExtensionKind>().unwrap(), ExtensionKind::ThemeEngine);
        assert!("profile".parse::<ExtensionKind>().is_err());
    }

    #[test]
    fn test_display_round_trips_with_serde() {
        for kind in ExtensionKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }
}
