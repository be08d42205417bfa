//! The render pipeline.
//!
//! One call to [`render`] goes through four steps:
//!
//! 1. the variables are tagged with the hook name under `#theme_hook_original`;
//! 2. `preprocess` and `preprocess_<name>` run across the active modules, then
//!    across the active theme's ancestry (root first) and the theme itself;
//! 3. the template is picked from `[name] + suggestions(args)`, most specific
//!    candidate first, searching the theme, its base themes and the modules;
//! 4. the template is rendered with Tera, optionally wrapped in debug comments.
//!
//! Rendering never fails. A missing template produces a placeholder string and
//! a template error produces a failure string plus an error event.

use serde_json::{Map, Value};
use tera::{Context as TeraContext, Tera};
use tracing::{debug, error, warn};

use super::path::{self, is_reserved, template_name_case};
use super::suggestions::suggestions;
use crate::constants::{
    CHILDREN_KEY, MARKUP_KEY, PREPROCESS_HOOK, SUGGESTION_DELIMITER, THEME_HOOK_ORIGINAL_KEY,
    THEME_KEY,
};
use crate::hooks::invoke_hook;
use crate::runtime::Runtime;

/// Options of a single render invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Wrap the output in `THEME DEBUG` comments naming the hook
    pub debug: bool,
    /// Qualifying arguments turned into template suggestions
    pub suggestion_args: Vec<String>,
}

impl RenderOptions {
    /// Default options: no debug output, no suggestions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable debug comments.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the suggestion arguments.
    pub fn with_suggestion_args<S: Into<String>>(mut self, args: impl IntoIterator<Item = S>) -> Self {
        self.suggestion_args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Output used when no template implements `name`.
pub fn missing_implementation(name: &str) -> String {
    format!("Missing theme implementation for \"{name}\".")
}

/// Output used when the template for `name` failed to render.
pub fn failed_implementation(name: &str) -> String {
    format!("Failed to render theme implementation for \"{name}\".")
}

/// Wrap `output` in debug comments naming the render invocation.
pub fn wrap_debug(name: &str, output: &str) -> String {
    format!(
        "<!-- THEME DEBUG: start \"{name}\" -->\n{output}\n<!-- THEME DEBUG: end \"{name}\" -->"
    )
}

/// Template candidates for `name`, most specific first.
pub fn template_candidates<S: AsRef<str>>(name: &str, args: &[S]) -> Vec<String> {
    let mut candidates = vec![name.to_string()];
    candidates.extend(suggestions(args, name, SUGGESTION_DELIMITER));
    candidates.reverse();
    candidates
}

/// Render the theme hook `name` with `variables`.
///
/// `variables` is mutated in place by the preprocess hooks and stays with the
/// caller afterwards.
pub fn render(runtime: &Runtime, name: &str, variables: &mut Value, options: &RenderOptions) -> String {
    tag_hook_original(variables, name);

    let hooks = [PREPROCESS_HOOK.to_string(), format!("{PREPROCESS_HOOK}_{name}")];
    let modules = runtime.active_modules();
    for hook in &hooks {
        invoke_hook(hook, modules.iter().copied(), variables, Some(runtime));
    }

    let themes = runtime.theme_dispatch_order();
    for hook in &hooks {
        invoke_hook(hook, themes.iter().copied(), variables, Some(runtime));
    }

    let candidates = template_candidates(name, &options.suggestion_args);
    let found = candidates
        .iter()
        .find_map(|candidate| runtime.find_template(&template_name_case(candidate)));

    let output = match found {
        Some(template) => {
            debug!(
                "Rendering '{}' with {} from {} '{}'",
                name,
                template.path.display(),
                template.entity.kind(),
                template.entity.id().unwrap_or_default()
            );
            match render_template(template.source, variables) {
                Ok(output) => output,
                Err(e) => {
                    error!(
                        "Template {} for '{}' failed: {}",
                        template.path.display(),
                        name,
                        format_tera_error(&e)
                    );
                    failed_implementation(name)
                }
            }
        }
        None => {
            debug!("No template for '{}' (tried: {})", name, candidates.join(", "));
            missing_implementation(name)
        }
    };

    if options.debug {
        wrap_debug(name, &output)
    } else {
        output
    }
}

/// Render a render-tree element and cache the markup under `#children`.
///
/// An element whose `#children` is already a non-empty string is not rendered
/// again. An element with `#theme` is rendered through [`render`]; any other
/// element renders as its `#markup` followed by its child elements.
pub fn render_element(runtime: &Runtime, element: &mut Value, options: &RenderOptions) -> String {
    if let Some(Value::String(cached)) = element.get(CHILDREN_KEY)
        && !cached.is_empty()
    {
        return cached.clone();
    }

    let theme = element.get(THEME_KEY).and_then(Value::as_str).map(str::to_string);
    let output = match theme {
        Some(theme) => render(runtime, &theme, element, options),
        None => {
            let mut output =
                element.get(MARKUP_KEY).and_then(Value::as_str).unwrap_or_default().to_string();

            let keys: Vec<String> = path::keys(element).into_iter().map(str::to_string).collect();
            for key in keys {
                if let Some(child) = element.get_mut(&key)
                    && child.is_object()
                {
                    output.push_str(&render_element(runtime, child, options));
                }
            }
            output
        }
    };

    if let Value::Object(map) = element {
        map.insert(CHILDREN_KEY.to_string(), Value::String(output.clone()));
    }
    output
}

fn tag_hook_original(variables: &mut Value, name: &str) {
    if variables.is_null() {
        *variables = Value::Object(Map::new());
    }

    match variables {
        Value::Object(map) => {
            map.insert(THEME_HOOK_ORIGINAL_KEY.to_string(), Value::String(name.to_string()));
        }
        other => warn!("Render variables for '{}' are not an object: {}", name, other),
    }
}

/// Render a template source with `variables`.
///
/// Reserved keys are exposed without their `#` prefix (`#children` becomes
/// `children`) unless a plain key of the same name exists.
pub fn render_template(source: &str, variables: &Value) -> Result<String, tera::Error> {
    let context = template_context(variables);
    let mut tera = Tera::default();
    tera.render_str(source, &context)
}

fn template_context(variables: &Value) -> TeraContext {
    let mut context = TeraContext::new();
    let Value::Object(map) = variables else {
        return context;
    };

    for (key, value) in map.iter().filter(|(key, _)| is_reserved(key)) {
        context.insert(key.trim_start_matches('#'), value);
    }
    for (key, value) in map.iter().filter(|(key, _)| !is_reserved(key)) {
        context.insert(key.as_str(), value);
    }
    context
}

/// Flatten a Tera error chain into one readable message.
pub fn format_tera_error(error: &tera::Error) -> String {
    use std::error::Error;

    let mut messages = Vec::new();
    let mut current: Option<&dyn Error> = Some(error);

    while let Some(err) = current {
        let cleaned = err
            .to_string()
            .replace("Failed to render '__tera_one_off'", "")
            .replace("Failed to parse '__tera_one_off'", "")
            .replace("'__tera_one_off'", "template")
            .trim()
            .to_string();
        if !cleaned.is_empty() {
            messages.push(cleaned);
        }
        current = err.source();
    }

    if messages.is_empty() {
        "template syntax error".to_string()
    } else {
        messages.join(" → ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_candidates_most_specific_first() {
        assert_eq!(
            template_candidates("node", &["2", "teaser"]),
            vec!["node__teaser", "node__2", "node__%", "node"]
        );
        let none: [&str; 0] = [];
        assert_eq!(template_candidates("block", &none), vec!["block"]);
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(missing_implementation("block"), "Missing theme implementation for \"block\".");
        let wrapped = wrap_debug("block", "x");
        assert!(wrapped.starts_with("<!-- THEME DEBUG: start \"block\" -->"));
        assert!(wrapped.ends_with("<!-- THEME DEBUG: end \"block\" -->"));
    }

    #[test]
    fn test_render_template_exposes_reserved_keys() {
        let variables = json!({
            "#theme_hook_original": "block",
            "label": "Powered by",
            "#children": "<p>content</p>",
        });
        let output =
            render_template("{{ theme_hook_original }}|{{ label }}|{{ children }}", &variables)
                .unwrap();
        assert_eq!(output, "block|Powered by|<p>content</p>");
    }

    #[test]
    fn test_plain_keys_win_over_reserved() {
        let variables = json!({"title": "plain", "#title": "reserved"});
        assert_eq!(render_template("{{ title }}", &variables).unwrap(), "plain");
    }

    #[test]
    fn test_render_template_error() {
        let err = render_template("{{ missing_variable }}", &json!({})).unwrap_err();
        assert!(format_tera_error(&err).contains("missing_variable"));
    }

    #[test]
    fn test_options_builder() {
        let options = RenderOptions::new().with_debug(true).with_suggestion_args(["article"]);
        assert!(options.debug);
        assert_eq!(options.suggestion_args, vec!["article".to_string()]);
    }
}
