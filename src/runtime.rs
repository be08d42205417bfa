//! The site runtime: every collection of one Drupal root plus rendering.
//!
//! A [`Runtime`] is usually built by [`Runtime::load`], which validates the root,
//! scans it, parses the info files and fills the collections. It can also be
//! assembled in memory with [`Runtime::new`] and the `*_mut` accessors, which is
//! what the tests do.
//!
//! Once loaded, the runtime is read-only apart from behavior binding and
//! template registration; rendering takes `&self`, so a hook may render again
//! through [`HookContext::runtime`](crate::hooks::HookContext::runtime).
//!
//! ```rust,no_run
//! use drupalkit::config::ProjectConfig;
//! use drupalkit::render::RenderOptions;
//! use drupalkit::runtime::Runtime;
//! use serde_json::json;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut config = ProjectConfig::for_root("/var/www/drupal/web");
//! config.theme = Some("olivero".to_string());
//!
//! let runtime = Runtime::load(config).await?;
//! let mut variables = json!({"label": "Powered by Drupal"});
//! let html = runtime.render("block", &mut variables, &RenderOptions::default());
//! println!("{html}");
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::ProjectConfig;
use crate::core::{DrupalKitError, ExtensionKind};
use crate::discovery::info::{InfoIndex, read_info};
use crate::discovery::site::{SITE_NAME_FIELD, discover_libraries, discover_sites, discover_vendors};
use crate::discovery::templates::{attach_templates, load_sources};
use crate::discovery::{ScanResult, scan};
use crate::entity::{Collection, Entity, Fields};
use crate::graph::{Resolution, base_chain, dependency_closure};
use crate::hooks::{BehaviorRegistry, theme_dispatch_order};
use crate::render::pipeline;
use crate::render::RenderOptions;

/// A template found for a render candidate.
#[derive(Debug, Clone, Copy)]
pub struct TemplateMatch<'a> {
    /// Extension providing the template
    pub entity: &'a Entity,
    /// Normalized template name
    pub name: &'a str,
    /// Root-relative path of the template file
    pub path: &'a Path,
    /// Template source
    pub source: &'a str,
}

/// Everything known about one Drupal root.
#[derive(Debug, Clone)]
pub struct Runtime {
    config: ProjectConfig,
    root: PathBuf,
    scanned: ScanResult,
    info: InfoIndex,
    modules: Collection,
    themes: Collection,
    theme_engines: Collection,
    libraries: Collection,
    vendors: Collection,
    sites: Collection,
    template_sources: HashMap<PathBuf, String>,
}

impl Runtime {
    /// An empty runtime for `config`, without touching the filesystem.
    pub fn new(config: ProjectConfig) -> Self {
        let root = config.resolved_root().unwrap_or_else(|_| PathBuf::from(&config.root));
        Self {
            config,
            root,
            scanned: ScanResult::default(),
            info: InfoIndex::new(),
            modules: Collection::new(ExtensionKind::Module),
            themes: Collection::new(ExtensionKind::Theme),
            theme_engines: Collection::new(ExtensionKind::ThemeEngine),
            libraries: Collection::new(ExtensionKind::Library),
            vendors: Collection::new(ExtensionKind::Vendor),
            sites: Collection::with_id_field(ExtensionKind::Site, SITE_NAME_FIELD),
            template_sources: HashMap::new(),
        }
    }

    /// Discover everything below the configured root.
    ///
    /// # Errors
    ///
    /// Fails with [`DrupalKitError::RootNotDirectory`] when the root is not a
    /// directory, and when scanning or listing sites, libraries or vendors
    /// fails. Individual unreadable info files or templates are skipped.
    pub async fn load(config: ProjectConfig) -> Result<Self> {
        let root = config.resolved_root()?;
        let is_dir = tokio::fs::metadata(&root).await.map(|m| m.is_dir()).unwrap_or(false);
        if !is_dir {
            return Err(DrupalKitError::RootNotDirectory {
                path: root.display().to_string(),
            }
            .into());
        }

        if !config.active_modules.is_empty() {
            debug!(
                "Ignoring active_modules ({}): every discovered module takes part in rendering",
                config.active_modules.join(", ")
            );
        }

        let mut runtime = Self::new(config);
        runtime.root = root;
        runtime.rescan().await?;
        Ok(runtime)
    }

    /// Scan the root again and rebuild every collection.
    ///
    /// Bound behaviors are dropped; bind them again afterwards.
    pub async fn rescan(&mut self) -> Result<()> {
        let root = self.root.clone();
        let site_uri = self.config.site_uri.clone();

        self.scanned = scan(&root, &site_uri).await?;
        self.info = read_info(&root, &self.scanned.info).await;

        let modules = self.info_of(&["module", "profile"]);
        let themes = self.info_of(&["theme"]);
        let theme_engines = self.info_of(&["theme_engine"]);
        self.modules.reset(modules);
        self.themes.reset(themes);
        self.theme_engines.reset(theme_engines);

        let (sites, libraries, vendors) = tokio::try_join!(
            discover_sites(&root),
            discover_libraries(&root),
            discover_vendors(&root)
        )
        .context("Failed to discover sites, libraries and vendors")?;
        self.sites.reset(sites);
        self.libraries.reset(libraries);
        self.vendors.reset(vendors);

        attach_templates(
            &self.scanned.templates,
            &mut [&mut self.themes, &mut self.modules, &mut self.theme_engines],
        );
        self.template_sources = load_sources(&root, &self.scanned.templates).await;

        info!(
            "Loaded {} modules, {} themes, {} theme engines, {} libraries, {} vendors, {} sites",
            self.modules.len(),
            self.themes.len(),
            self.theme_engines.len(),
            self.libraries.len(),
            self.vendors.len(),
            self.sites.len()
        );
        Ok(())
    }

    fn info_of(&self, types: &[&str]) -> Vec<Fields> {
        types.iter().filter_map(|t| self.info.get(*t)).flatten().cloned().collect()
    }

    /// The configuration this runtime was built from.
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// The Drupal root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a root-relative file.
    pub fn abs_path(&self, file: impl AsRef<Path>) -> PathBuf {
        self.root.join(file)
    }

    /// Files found by the last scan.
    pub fn scanned(&self) -> &ScanResult {
        &self.scanned
    }

    /// Parsed info files grouped by declared type.
    pub fn info(&self) -> &InfoIndex {
        &self.info
    }

    /// Collection holding extensions of `kind`.
    pub fn collection(&self, kind: ExtensionKind) -> &Collection {
        match kind {
            ExtensionKind::Module => &self.modules,
            ExtensionKind::Theme => &self.themes,
            ExtensionKind::ThemeEngine => &self.theme_engines,
            ExtensionKind::Library => &self.libraries,
            ExtensionKind::Vendor => &self.vendors,
            ExtensionKind::Site => &self.sites,
        }
    }

    /// Mutable collection holding extensions of `kind`.
    pub fn collection_mut(&mut self, kind: ExtensionKind) -> &mut Collection {
        match kind {
            ExtensionKind::Module => &mut self.modules,
            ExtensionKind::Theme => &mut self.themes,
            ExtensionKind::ThemeEngine => &mut self.theme_engines,
            ExtensionKind::Library => &mut self.libraries,
            ExtensionKind::Vendor => &mut self.vendors,
            ExtensionKind::Site => &mut self.sites,
        }
    }

    /// All modules.
    pub fn modules(&self) -> &Collection {
        &self.modules
    }

    /// All themes.
    pub fn themes(&self) -> &Collection {
        &self.themes
    }

    /// The configured site, if it was discovered.
    pub fn site(&self) -> Option<&Entity> {
        self.sites.get(&self.config.site_uri)
    }

    /// The active theme, if one is configured and known.
    pub fn theme(&self) -> Option<&Entity> {
        self.config.theme.as_deref().and_then(|name| self.themes.get(name))
    }

    /// Make `name` the active theme.
    pub fn set_theme(&mut self, name: impl Into<String>) {
        self.config.theme = Some(name.into());
    }

    /// Modules taking part in hook dispatch and template lookup.
    ///
    /// Currently every module, in collection order.
    pub fn active_modules(&self) -> Vec<&Entity> {
        self.modules.iter().collect()
    }

    /// The active theme's ancestors, root first, then the theme itself.
    pub fn theme_dispatch_order(&self) -> Vec<&Entity> {
        self.theme().map(|theme| theme_dispatch_order(theme, &self.themes)).unwrap_or_default()
    }

    /// Extensions searched for templates: the active theme, its ancestors
    /// nearest first, then the active modules.
    pub fn template_lookup_order(&self) -> Vec<&Entity> {
        let mut order: Vec<&Entity> = self.theme_dispatch_order();
        order.reverse();
        order.extend(self.active_modules());
        order
    }

    /// First template named `name` (already normalized) in lookup order.
    pub fn find_template(&self, name: &str) -> Option<TemplateMatch<'_>> {
        self.template_lookup_order().into_iter().find_map(|entity| {
            let (name, path) = entity.templates().get_key_value(name)?;
            let source = self.template_sources.get(path)?;
            Some(TemplateMatch {
                entity,
                name: name.as_str(),
                path: path.as_path(),
                source: source.as_str(),
            })
        })
    }

    /// Attach an in-memory template to an extension.
    ///
    /// The template gets a virtual path below the extension's `templates/`
    /// directory. Returns `false` when the extension is unknown.
    pub fn register_template(
        &mut self,
        kind: ExtensionKind,
        machine_name: &str,
        template: &str,
        source: impl Into<String>,
    ) -> bool {
        let Some(entity) = self.collection_mut(kind).get_mut(machine_name) else {
            return false;
        };

        let dir = entity.dir().unwrap_or_else(|| PathBuf::from(machine_name));
        let path = dir.join("templates").join(format!("{template}.html.twig"));
        entity.attach_template(template, path.clone());
        self.template_sources.insert(path, source.into());
        true
    }

    /// Source of a loaded template.
    pub fn template_source(&self, path: &Path) -> Option<&str> {
        self.template_sources.get(path).map(String::as_str)
    }

    /// Bind registered behaviors onto modules, themes and theme engines.
    ///
    /// Returns the number of extensions that received a behavior.
    pub fn bind_behaviors(&mut self, registry: &BehaviorRegistry) -> usize {
        registry.bind(&mut self.modules)
            + registry.bind(&mut self.themes)
            + registry.bind(&mut self.theme_engines)
    }

    fn lookup(&self, kind: ExtensionKind, name: &str) -> Result<&Entity, DrupalKitError> {
        let collection = self.collection(kind);
        collection.get(name).ok_or_else(|| DrupalKitError::ExtensionNotFound {
            kind: kind.to_string(),
            name: name.to_string(),
            similar: collection.similar_ids(name),
        })
    }

    /// Root-relative info file of an extension.
    pub fn get_filename(&self, kind: ExtensionKind, name: &str) -> Result<&str> {
        let entity = self.lookup(kind, name)?;
        entity.info_file().ok_or_else(|| {
            DrupalKitError::Other {
                message: format!("{kind} '{name}' has no info file"),
            }
            .into()
        })
    }

    /// Root-relative directory of an extension.
    pub fn get_path(&self, kind: ExtensionKind, name: &str) -> Result<PathBuf> {
        let file = self.get_filename(kind, name)?;
        Ok(Path::new(file).parent().map(Path::to_path_buf).unwrap_or_default())
    }

    /// Dependency closure of a module.
    pub fn dependency_closure(&self, module: &str) -> Result<Resolution> {
        let entity = self.lookup(ExtensionKind::Module, module)?;
        Ok(dependency_closure(entity, &self.modules))
    }

    /// Base theme chain of a theme, nearest parent first.
    pub fn base_chain(&self, theme: &str) -> Result<Resolution> {
        let entity = self.lookup(ExtensionKind::Theme, theme)?;
        Ok(base_chain(entity, &self.themes))
    }

    /// Drush for this root and site.
    pub fn drush(&self) -> crate::tools::Drush {
        crate::tools::Drush::new(&self.config.drush_bin, &self.config.site_uri, &self.root)
    }

    /// Composer for this root.
    pub fn composer(&self) -> crate::tools::Composer {
        crate::tools::Composer::new(&self.config.composer_bin, &self.root)
    }

    /// Render theme hook `name`; see [`pipeline::render`].
    pub fn render(&self, name: &str, variables: &mut Value, options: &RenderOptions) -> String {
        debug!("Rendering '{name}'");
        pipeline::render(self, name, variables, options)
    }

    /// Render a render-tree element; see [`pipeline::render_element`].
    pub fn render_element(&self, element: &mut Value, options: &RenderOptions) -> String {
        pipeline::render_element(self, element, options)
    }
}
