//! Template association and loading.

use futures::future::join_all;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::constants::TEMPLATE_EXTENSION;
use crate::entity::Collection;

/// Normalized template name of a template file: the file name without `.html.twig`.
///
/// ```rust
/// use drupalkit::discovery::templates::template_name;
/// use std::path::Path;
///
/// assert_eq!(
///     template_name(Path::new("core/themes/olivero/templates/node--teaser.html.twig")).as_deref(),
///     Some("node--teaser")
/// );
/// assert_eq!(template_name(Path::new("README.md")), None);
/// ```
pub fn template_name(file: &Path) -> Option<String> {
    file.file_name()?
        .to_str()?
        .strip_suffix(TEMPLATE_EXTENSION)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Attach every template to the extension whose directory contains it.
///
/// When directories nest (a sub-module inside a module), the deepest
/// directory wins. Templates outside every extension are left unattached.
/// Returns the number of attached templates.
pub fn attach_templates(templates: &[PathBuf], collections: &mut [&mut Collection]) -> usize {
    let mut attached = 0;

    for template in templates {
        let Some(name) = template_name(template) else {
            continue;
        };

        let mut owner: Option<(usize, String, usize)> = None;
        for (index, collection) in collections.iter().enumerate() {
            for entity in collection.iter() {
                let (Some(id), Some(dir)) = (entity.id(), entity.dir()) else {
                    continue;
                };
                let depth = dir.components().count();
                let deeper = owner.as_ref().is_none_or(|(_, _, best)| depth > *best);
                if template.starts_with(&dir) && deeper {
                    owner = Some((index, id.to_string(), depth));
                }
            }
        }

        match owner {
            Some((index, id, _)) => {
                if let Some(entity) = collections[index].get_mut(&id) {
                    entity.attach_template(name, template.clone());
                    attached += 1;
                }
            }
            None => debug!("Template {} belongs to no extension", template.display()),
        }
    }

    debug!("Attached {attached} of {} templates", templates.len());
    attached
}

/// Read template sources concurrently, keyed by their root-relative path.
///
/// Unreadable templates are logged and left out.
pub async fn load_sources(root: &Path, templates: &[PathBuf]) -> HashMap<PathBuf, String> {
    let reads = templates.iter().map(|template| async move {
        (template, tokio::fs::read_to_string(root.join(template)).await)
    });

    let mut sources = HashMap::with_capacity(templates.len());
    for (template, result) in join_all(reads).await {
        match result {
            Ok(source) => {
                sources.insert(template.clone(), source);
            }
            Err(e) => warn!("Failed to read template {}: {}", template.display(), e),
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ExtensionKind;
    use serde_json::json;

    fn collection(kind: ExtensionKind, data: serde_json::Value) -> Collection {
        Collection::from_data(
            kind,
            data.as_array()
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .filter_map(|v| v.as_object().cloned()),
        )
    }

    #[test]
    fn test_deepest_directory_wins() {
        let mut modules = collection(
            ExtensionKind::Module,
            json!([
                {"machine name": "views", "info file": "modules/views/views.info.yml"},
                {"machine name": "views_ui", "info file": "modules/views/views_ui/views_ui.info.yml"},
            ]),
        );
        let mut themes = collection(
            ExtensionKind::Theme,
            json!([{"machine name": "irata", "info file": "themes/irata/irata.info.yml"}]),
        );

        let templates = vec![
            PathBuf::from("modules/views/templates/views-view.html.twig"),
            PathBuf::from("modules/views/views_ui/templates/views-ui-display.html.twig"),
            PathBuf::from("themes/irata/templates/page.html.twig"),
            PathBuf::from("orphans/lonely.html.twig"),
        ];

        let attached = attach_templates(&templates, &mut [&mut modules, &mut themes]);
        assert_eq!(attached, 3);

        assert!(modules.get("views").unwrap().template("views-view").is_some());
        assert!(modules.get("views_ui").unwrap().template("views-ui-display").is_some());
        assert!(modules.get("views").unwrap().template("views-ui-display").is_none());
        assert_eq!(
            themes.get("irata").unwrap().template("page"),
            Some(Path::new("themes/irata/templates/page.html.twig"))
        );
    }

    #[test]
    fn test_sibling_prefix_is_not_a_parent() {
        let mut modules = collection(
            ExtensionKind::Module,
            json!([{"machine name": "node", "info file": "modules/node/node.info.yml"}]),
        );
        let templates = vec![PathBuf::from("modules/node_extra/templates/x.html.twig")];
        assert_eq!(attach_templates(&templates, &mut [&mut modules]), 0);
    }
}
