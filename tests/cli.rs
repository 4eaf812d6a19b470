//! Command-line runs of `encore build`

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};

const CONFIG: &str = r#"
[output]
path = "public/build"
public_path = "/build/"

[entries]
style = ["styles"]

[integrity]
algorithms = ["sha384"]
"#;

fn stats() -> String {
    json!({
        "chunks": [
            { "id": 0, "name": "main", "files": ["main.js"], "auxiliaryFiles": ["main.js.map"], "initial": true },
            { "id": 1, "name": "styles", "files": ["styles.css", "styles.js"], "initial": true }
        ],
        "assets": [
            { "name": "images/logo.3f2a9c1d.png", "chunks": [] }
        ],
        "entrypoints": {
            "main": { "chunks": [0] },
            "styles": { "chunks": [1] }
        },
        "moduleAssets": {
            "images/logo.3f2a9c1d.png": "./assets/images/logo.png"
        }
    })
    .to_string()
}

#[test]
fn test_build_writes_both_documents() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("public/build");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("main.js"), "console.log('main')").unwrap();
    fs::write(out.join("styles.css"), "body{}").unwrap();
    fs::write(out.join("styles.js"), "/* runtime */").unwrap();
    fs::write(dir.path().join("encore.toml"), CONFIG).unwrap();
    fs::write(dir.path().join("stats.json"), stats()).unwrap();

    Command::cargo_bin("encore")
        .unwrap()
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .success()
        .stderr(predicate::str::contains("Emitted 4 manifest key(s)"));

    let manifest: Value =
        serde_json::from_str(&fs::read_to_string(out.join("manifest.json")).unwrap()).unwrap();
    assert_eq!(
        manifest,
        json!({
            "main.js": "/build/main.js",
            "main.js.map": "/build/main.js.map",
            "styles.css": "/build/styles.css",
            "images/logo.png": "/build/images/logo.3f2a9c1d.png"
        })
    );

    let entrypoints: Value =
        serde_json::from_str(&fs::read_to_string(out.join("entrypoints.json")).unwrap()).unwrap();
    assert_eq!(entrypoints["entrypoints"]["styles"], json!({ "css": ["/build/styles.css"] }));
    assert!(entrypoints["integrity"]["/build/main.js"]
        .as_str()
        .unwrap()
        .starts_with("sha384-"));
    assert!(!out.join("styles.js").exists());
}

#[test]
fn test_build_fails_without_stats() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("encore.toml"), CONFIG).unwrap();

    Command::cargo_bin("encore")
        .unwrap()
        .current_dir(dir.path())
        .args(["build", "--stats", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read stats file"));
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("encore.toml"),
        "[output]\nmanifest_file = \"../manifest.json\"\n",
    )
    .unwrap();
    fs::write(dir.path().join("stats.json"), stats()).unwrap();

    Command::cargo_bin("encore")
        .unwrap()
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be a relative file path"));
}
