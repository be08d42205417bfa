use drupalkit::core::ExtensionKind;
use drupalkit::hooks::{Behavior, BehaviorRegistry};
use drupalkit::render::{RenderOptions, StructPath, path};
use drupalkit::runtime::Runtime;
use drupalkit::test_utils::DrupalFixture;
use serde_json::{Value, json};

async fn runtime_with_theme(theme: Option<&str>) -> (DrupalFixture, Runtime) {
    let fixture = DrupalFixture::standard().unwrap();
    let mut config = fixture.config();
    config.theme = theme.map(str::to_string);
    let runtime = Runtime::load(config).await.unwrap();
    (fixture, runtime)
}

#[tokio::test]
async fn test_theme_template_beats_module_template() {
    let (_fixture, runtime) = runtime_with_theme(Some("subtheme")).await;
    let mut variables = json!({"label": "Hello"});

    let output = runtime.render("node", &mut variables, &RenderOptions::default());
    assert_eq!(output, "<div class=\"node\">Hello</div>");
    assert_eq!(variables["#theme_hook_original"], json!("node"));
}

#[tokio::test]
async fn test_suggestion_from_base_theme_wins() {
    let (_fixture, runtime) = runtime_with_theme(Some("subtheme")).await;
    let options = RenderOptions::new().with_suggestion_args(["article"]);

    let output = runtime.render("node", &mut json!({"label": "Hello"}), &options);
    assert_eq!(output, "<article class=\"article\">Hello</article>");

    // Unmatched suggestions fall back to the base hook
    let options = RenderOptions::new().with_suggestion_args(["page", "7"]);
    let output = runtime.render("node", &mut json!({"label": "Hello"}), &options);
    assert_eq!(output, "<div class=\"node\">Hello</div>");
}

#[tokio::test]
async fn test_modules_render_without_theme() {
    let (_fixture, runtime) = runtime_with_theme(None).await;

    let output = runtime.render("node", &mut json!({"label": "Hello"}), &RenderOptions::default());
    assert_eq!(output, "<article>Hello</article>");

    // Templates of themes outside the active chain are ignored
    let output = runtime.render("page", &mut json!({"content": "x"}), &RenderOptions::default());
    assert_eq!(output, "Missing theme implementation for \"page\".");
}

#[tokio::test]
async fn test_root_theme_template_is_inherited() {
    let (_fixture, runtime) = runtime_with_theme(Some("subtheme")).await;
    let options = RenderOptions::new().with_debug(true);

    let output = runtime.render("page", &mut json!({"content": "Body"}), &options);
    assert_eq!(
        output,
        "<!-- THEME DEBUG: start \"page\" -->\n<main>Body</main>\n<!-- THEME DEBUG: end \"page\" -->"
    );
}

#[tokio::test]
async fn test_preprocess_hooks_shape_variables() {
    let (_fixture, mut runtime) = runtime_with_theme(Some("subtheme")).await;

    let mut registry = BehaviorRegistry::new();
    registry
        .register(
            ExtensionKind::Module,
            "node",
            Behavior::new().with_hook("preprocess_node", |variables: &mut Value, _ctx| {
                let label = variables["title"].as_str().unwrap_or_default().to_string();
                path::set(variables, "label", json!(label)).unwrap();
            }),
        )
        .register(
            ExtensionKind::Theme,
            "stable9",
            Behavior::new().with_hook("preprocess", |variables: &mut Value, ctx| {
                path::set(variables, "trail", json!([ctx.entity.id()])).unwrap();
            }),
        )
        .register(
            ExtensionKind::Theme,
            "subtheme",
            Behavior::new().with_hook("preprocess_node", |variables: &mut Value, _ctx| {
                let label = variables["label"].as_str().unwrap_or_default().to_uppercase();
                variables["label"] = json!(label);
                if let Some(trail) = variables["trail"].as_array_mut() {
                    trail.push(json!("subtheme"));
                }
            }),
        );
    assert_eq!(runtime.bind_behaviors(&registry), 3);

    let mut variables = json!({"title": "Drupal"});
    let output = runtime.render("node", &mut variables, &RenderOptions::default());
    assert_eq!(output, "<div class=\"node\">DRUPAL</div>");
    assert_eq!(variables["trail"], json!(["stable9", "subtheme"]));
}

#[tokio::test]
async fn test_render_element_tree() {
    let (_fixture, runtime) = runtime_with_theme(Some("subtheme")).await;

    let mut tree = json!({
        "#markup": "<section>",
        "teaser": {"#theme": "node", "label": "First"},
        "missing": {"#theme": "nonexistent"},
        "footer": {"#markup": "</section>"},
    });
    let output = runtime.render_element(&mut tree, &RenderOptions::default());
    assert_eq!(
        output,
        "<section><div class=\"node\">First</div>Missing theme implementation for \"nonexistent\".</section>"
    );

    let cached = StructPath::parse("teaser.#children");
    assert_eq!(
        path::get(&tree, &cached).unwrap(),
        Some(&json!("<div class=\"node\">First</div>"))
    );
}
