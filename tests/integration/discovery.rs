use drupalkit::core::ExtensionKind;
use drupalkit::discovery::{FileKind, scan};
use drupalkit::runtime::Runtime;
use drupalkit::test_utils::{DrupalFixture, init_test_logging};
use std::path::{Path, PathBuf};

#[tokio::test]
async fn test_scan_groups_files_and_skips_tests() {
    init_test_logging(None);
    let fixture = DrupalFixture::standard().unwrap();

    let result = scan(fixture.root(), "default").await.unwrap();

    assert_eq!(result.info.len(), 9);
    assert!(result.info.iter().all(|file| !file.to_string_lossy().contains("test")));
    assert_eq!(result.files(FileKind::Styles), &[PathBuf::from("themes/subtheme/css/style.css")]);
    assert_eq!(result.files(FileKind::Scripts), &[PathBuf::from("themes/subtheme/js/script.js")]);
    assert_eq!(result.templates.len(), 4);
    assert_eq!(result.total(), 15);
}

#[tokio::test]
async fn test_scan_only_reads_configured_site() {
    let fixture = DrupalFixture::new()
        .unwrap()
        .file("sites/default/modules/local/local.info.yml", "name: Local\ntype: module\n")
        .unwrap()
        .file("sites/other.loc/modules/remote/remote.info.yml", "name: Remote\ntype: module\n")
        .unwrap()
        .file("sites/all/modules/shared/shared.info.yml", "name: Shared\ntype: module\n")
        .unwrap();

    let default = scan(fixture.root(), "default").await.unwrap();
    assert_eq!(
        default.info,
        vec![
            PathBuf::from("sites/all/modules/shared/shared.info.yml"),
            PathBuf::from("sites/default/modules/local/local.info.yml"),
        ]
    );

    let other = scan(fixture.root(), "other.loc").await.unwrap();
    assert!(other.info.contains(&PathBuf::from("sites/other.loc/modules/remote/remote.info.yml")));
    assert_eq!(other.info.len(), 2);
}

#[tokio::test]
async fn test_load_builds_every_collection() {
    let fixture = DrupalFixture::standard().unwrap();
    let runtime = Runtime::load(fixture.config()).await.unwrap();

    assert_eq!(runtime.modules().ids(), vec!["field", "node", "system", "text", "custom"]);
    assert_eq!(runtime.themes().ids(), vec!["stable9", "base", "subtheme"]);
    assert_eq!(runtime.collection(ExtensionKind::ThemeEngine).ids(), vec!["twig"]);
    assert_eq!(runtime.collection(ExtensionKind::Library).ids(), vec!["dropzone"]);
    assert_eq!(runtime.collection(ExtensionKind::Vendor).ids(), vec!["drush/drush"]);
    assert_eq!(runtime.collection(ExtensionKind::Site).ids(), vec!["default"]);
    assert!(runtime.site().is_some());

    let node = runtime.modules().get("node").unwrap();
    assert_eq!(node.name(), Some("Node"));
    assert_eq!(node.dependencies(), vec!["field", "text"]);
    assert_eq!(node.template("node"), Some(Path::new("core/modules/node/templates/node.html.twig")));

    let stable9 = runtime.themes().get("stable9").unwrap();
    assert_eq!(stable9.base_theme(), None);
    assert!(stable9.template("page").is_some());

    let subtheme = runtime.themes().get("subtheme").unwrap();
    assert_eq!(subtheme.base_theme(), Some("base"));
    assert!(subtheme.template("node--article").is_none());
}

#[tokio::test]
async fn test_paths_and_filenames() {
    let fixture = DrupalFixture::standard().unwrap();
    let runtime = Runtime::load(fixture.config()).await.unwrap();

    assert_eq!(
        runtime.get_filename(ExtensionKind::Theme, "subtheme").unwrap(),
        "themes/subtheme/subtheme.info.yml"
    );
    assert_eq!(
        runtime.get_path(ExtensionKind::Module, "system").unwrap(),
        PathBuf::from("core/modules/system")
    );
    assert!(runtime.abs_path("core/modules/system").is_dir());
    assert!(runtime.get_path(ExtensionKind::Module, "subtheme").is_err());
}

#[tokio::test]
async fn test_broken_info_file_is_skipped() {
    let fixture = DrupalFixture::new()
        .unwrap()
        .module("good", &[])
        .unwrap()
        .file("modules/bad/bad.info.yml", "name: [oops\n")
        .unwrap();

    let runtime = Runtime::load(fixture.config()).await.unwrap();
    assert_eq!(runtime.modules().ids(), vec!["good"]);
}

#[tokio::test]
async fn test_load_rejects_missing_root() {
    let fixture = DrupalFixture::new().unwrap();
    let missing = fixture.path("nope");

    let err = Runtime::load(drupalkit::config::ProjectConfig::for_root(&missing)).await.unwrap_err();
    assert!(err.to_string().contains("is not a directory"));
}

#[tokio::test]
async fn test_rescan_picks_up_new_extensions() {
    let fixture = DrupalFixture::new().unwrap().module("first", &[]).unwrap();
    let mut runtime = Runtime::load(fixture.config()).await.unwrap();
    assert_eq!(runtime.modules().len(), 1);

    let fixture = fixture.module("second", &["first"]).unwrap();
    runtime.rescan().await.unwrap();
    assert_eq!(runtime.modules().ids(), vec!["first", "second"]);
    assert_eq!(fixture.root(), runtime.root());
}
