use assert_cmd::Command;
use drupalkit::test_utils::DrupalFixture;
use predicates::prelude::*;
use serde_json::Value;

fn drupalkit(fixture: &DrupalFixture) -> Command {
    let mut cmd = Command::cargo_bin("drupalkit").unwrap();
    cmd.current_dir(fixture.root())
        .env("DRUPALKIT_NO_PROGRESS", "1")
        .env_remove("RUST_LOG")
        .arg("--quiet")
        .arg("--root")
        .arg(fixture.root());
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_list_modules_as_json() {
    let fixture = DrupalFixture::standard().unwrap();
    let modules = stdout_json(drupalkit(&fixture).args(["list", "--kind", "module", "--format", "json"]));

    let names: Vec<&str> =
        modules.as_array().unwrap().iter().filter_map(|m| m["machine name"].as_str()).collect();
    assert_eq!(names, vec!["field", "node", "system", "text", "custom"]);
    assert_eq!(modules[1]["info file"], "core/modules/node/node.info.yml");
}

#[test]
fn test_list_everything_as_text() {
    let fixture = DrupalFixture::standard().unwrap();
    drupalkit(&fixture)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Modules (5)"))
        .stdout(predicate::str::contains("Themes (3)"))
        .stdout(predicate::str::contains("drush/drush"));
}

#[test]
fn test_scan_counts() {
    let fixture = DrupalFixture::standard().unwrap();
    let scan = stdout_json(drupalkit(&fixture).args(["scan", "--format", "json"]));

    assert_eq!(scan["files"]["info"], 9);
    assert_eq!(scan["files"]["templates"], 4);
    assert_eq!(scan["extensions"]["theme"], 3);
    assert_eq!(scan["modules"]["missing"], serde_json::json!(["missing_module"]));
    assert!(scan["modules"]["cycle"].is_null());
}

#[test]
fn test_deps_and_base_themes() {
    let fixture = DrupalFixture::standard().unwrap();

    drupalkit(&fixture)
        .args(["deps", "custom"])
        .assert()
        .success()
        .stdout(predicate::str::contains("node"))
        .stdout(predicate::str::contains("system"))
        .stderr(predicate::str::contains("missing_module"));

    drupalkit(&fixture)
        .args(["deps", "custom", "--tree"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("└── custom"))
        .stdout(predicate::str::contains("(missing)"));

    let order = stdout_json(drupalkit(&fixture).args(["deps", "custom", "--order", "-f", "json"]));
    assert_eq!(order["order"], serde_json::json!(["system", "field", "text", "node", "custom"]));

    let chain = stdout_json(drupalkit(&fixture).args(["base-themes", "subtheme", "-f", "json"]));
    assert_eq!(chain["resolved"], serde_json::json!(["base", "stable9"]));
}

#[test]
fn test_unknown_module_suggests_similar() {
    let fixture = DrupalFixture::standard().unwrap();
    drupalkit(&fixture)
        .args(["deps", "nod"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("module 'nod' not found"))
        .stderr(predicate::str::contains("Did you mean: node"));
}

#[test]
fn test_suggest() {
    let fixture = DrupalFixture::new().unwrap();
    drupalkit(&fixture)
        .args(["suggest", "node", "2", "teaser"])
        .assert()
        .success()
        .stdout("node__%\nnode__2\nnode__teaser\n");
}

#[test]
fn test_render_with_variables_file() {
    let fixture = DrupalFixture::standard()
        .unwrap()
        .file("vars.json", r#"{"label": "From file"}"#)
        .unwrap();

    drupalkit(&fixture)
        .args(["render", "node", "--theme", "subtheme", "--vars"])
        .arg(fixture.path("vars.json"))
        .assert()
        .success()
        .stdout("<div class=\"node\">From file</div>\n");

    drupalkit(&fixture)
        .args(["render", "node", "--theme", "subtheme", "--arg", "article", "--debug", "--vars"])
        .arg(fixture.path("vars.json"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<!-- THEME DEBUG: start \"node\" -->\n<article"));
}

#[test]
fn test_render_reads_theme_from_config() {
    let fixture = DrupalFixture::standard()
        .unwrap()
        .file("drupalkit.toml", "theme = \"subtheme\"\ndebug = true\n")
        .unwrap()
        .file("vars.yml", "content: Body\n")
        .unwrap();

    let mut cmd = Command::cargo_bin("drupalkit").unwrap();
    cmd.current_dir(fixture.root())
        .env("DRUPALKIT_NO_PROGRESS", "1")
        .args(["-q", "render", "page", "--vars", "vars.yml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\n<main>Body</main>\n"))
        .stdout(predicate::str::contains("<!-- THEME DEBUG: end \"page\" -->"));
}

#[test]
fn test_missing_root_fails() {
    let fixture = DrupalFixture::new().unwrap();
    let mut cmd = Command::cargo_bin("drupalkit").unwrap();
    cmd.current_dir(fixture.root())
        .args(["--root"])
        .arg(fixture.path("missing"))
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a directory"));
}
