use drupalkit::graph::{Diagnostic, ExtensionGraph};
use drupalkit::runtime::Runtime;
use drupalkit::test_utils::DrupalFixture;
use std::collections::BTreeSet;

#[tokio::test]
async fn test_closure_of_custom_module() {
    let fixture = DrupalFixture::standard().unwrap();
    let runtime = Runtime::load(fixture.config()).await.unwrap();

    let closure = runtime.dependency_closure("custom").unwrap();
    assert_eq!(closure.ids, vec!["node", "field", "text", "system"]);
    assert_eq!(
        closure.diagnostics,
        vec![Diagnostic::MissingDependency {
            module: "custom".to_string(),
            dependency: "missing_module".to_string(),
        }]
    );

    assert!(runtime.dependency_closure("system").unwrap().is_empty());
    assert!(runtime.dependency_closure("nonexistent").is_err());
}

#[tokio::test]
async fn test_closure_survives_cycles() {
    let fixture = DrupalFixture::new()
        .unwrap()
        .module("alpha", &["beta"])
        .unwrap()
        .module("beta", &["gamma"])
        .unwrap()
        .module("gamma", &["alpha"])
        .unwrap();
    let runtime = Runtime::load(fixture.config()).await.unwrap();

    let closure = runtime.dependency_closure("alpha").unwrap();
    let ids: BTreeSet<&str> = closure.ids.iter().map(String::as_str).collect();
    assert_eq!(ids, BTreeSet::from(["alpha", "beta", "gamma"]));
    assert!(
        closure.diagnostics.iter().any(|d| matches!(d, Diagnostic::DependencyCycle { .. }))
    );

    let graph = ExtensionGraph::from_collection(runtime.modules());
    assert_eq!(graph.find_cycle().map(|cycle| cycle.len()), Some(4));
    assert!(graph.topological_order().is_err());
}

#[tokio::test]
async fn test_base_theme_chain() {
    let fixture = DrupalFixture::standard().unwrap();
    let runtime = Runtime::load(fixture.config()).await.unwrap();

    assert_eq!(runtime.base_chain("subtheme").unwrap().ids, vec!["base", "stable9"]);
    assert!(runtime.base_chain("stable9").unwrap().is_empty());

    let ids: Vec<&str> = runtime
        .theme_dispatch_order()
        .iter()
        .filter_map(|theme| theme.id())
        .collect();
    assert!(ids.is_empty(), "no theme configured");
}

#[tokio::test]
async fn test_unknown_base_theme_is_reported() {
    let fixture = DrupalFixture::new().unwrap().theme("orphan", Some("ghost")).unwrap();
    let runtime = Runtime::load(fixture.config()).await.unwrap();

    let chain = runtime.base_chain("orphan").unwrap();
    assert!(chain.is_empty());
    assert_eq!(
        chain.diagnostics,
        vec![Diagnostic::UnresolvableBaseTheme {
            theme: "orphan".to_string(),
            base: "ghost".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_dependency_graph_of_loaded_modules() {
    let fixture = DrupalFixture::standard().unwrap();
    let runtime = Runtime::load(fixture.config()).await.unwrap();
    let graph = ExtensionGraph::from_collection(runtime.modules());

    assert!(graph.find_cycle().is_none());
    let order = graph.topological_order().unwrap();
    let position = |name: &str| order.iter().position(|n| n == name).unwrap();
    assert!(position("system") < position("field"));
    assert!(position("field") < position("node"));
    assert!(position("node") < position("custom"));

    let closure = runtime.dependency_closure("node").unwrap();
    assert_eq!(
        graph.enable_order("node", &closure.ids).unwrap(),
        vec!["system", "field", "text", "node"]
    );
    assert_eq!(graph.missing(), vec!["missing_module"]);

    let tree = graph.to_tree_string("custom");
    assert!(tree.starts_with("└── custom\n"));
    assert!(tree.contains("missing_module (missing)"));
}
