use assert_cmd::Command;
use drupalkit::core::DrupalKitError;
use drupalkit::runtime::Runtime;
use drupalkit::test_utils::DrupalFixture;
use predicates::prelude::*;
use serde_json::json;
use std::os::unix::fs::PermissionsExt;

/// A root with stand-in drush and composer scripts that echo their arguments as JSON.
fn fixture_with_tools() -> DrupalFixture {
    let script = "#!/bin/sh\nfirst=\"$1\"\nshift\nprintf '{\"first\": \"%s\", \"rest\": \"%s\"}' \"$first\" \"$*\"\n";
    let fixture = DrupalFixture::new()
        .unwrap()
        .file("vendor/bin/drush", script)
        .unwrap()
        .file("bin/composer", script)
        .unwrap();

    for tool in ["vendor/bin/drush", "bin/composer"] {
        let path = fixture.path(tool);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
    fixture
}

#[tokio::test]
async fn test_drush_through_runtime() {
    let fixture = fixture_with_tools();
    let mut config = fixture.config();
    config.site_uri = "example.loc".to_string();
    let runtime = Runtime::load(config).await.unwrap();

    let output = runtime.drush().run("pm:list --status=enabled").await.unwrap();
    assert_eq!(
        output.stdout,
        json!({"first": "--uri=example.loc", "rest": "pm:list --status=enabled --format=json"})
    );
}

#[tokio::test]
async fn test_composer_through_runtime() {
    let fixture = fixture_with_tools();
    let mut config = fixture.config();
    config.composer_bin = "./bin/composer".to_string();
    let runtime = Runtime::load(config).await.unwrap();

    let output = runtime.composer().run("show --direct").await.unwrap();
    assert_eq!(output.stdout, json!({"first": "--format=json", "rest": "show --direct"}));
}

#[tokio::test]
async fn test_missing_tool() {
    let fixture = DrupalFixture::new().unwrap();
    let runtime = Runtime::load(fixture.config()).await.unwrap();

    let err = runtime.drush().run("status").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DrupalKitError>(),
        Some(DrupalKitError::ToolNotFound { .. })
    ));
}

#[test]
fn test_drush_subcommand_prints_json() {
    let fixture = fixture_with_tools();
    Command::cargo_bin("drupalkit")
        .unwrap()
        .current_dir(fixture.root())
        .env("DRUPALKIT_NO_PROGRESS", "1")
        .arg("--root")
        .arg(fixture.root())
        .args(["-q", "drush", "cache:rebuild"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"first\": \"--uri=default\""))
        .stdout(predicate::str::contains("\"rest\": \"cache:rebuild --format=json\""));
}
