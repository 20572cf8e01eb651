//! End-to-end tests for the `contextkit` binary.
//!
//! Every run gets a private HOME so no user config or cache leaks in.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn contextkit(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_contextkit"))
        .args(args)
        .env("HOME", home)
        .env("CONTEXTKIT_CACHE_DIR", home.join("cache"))
        .env_remove("CONTEXTKIT_NO_CACHE")
        .env_remove("CONTEXTKIT_MEMORY_PATH")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run contextkit")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_tools(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("tools.json");
    std::fs::write(
        &path,
        r#"[
            {"name": "read_file", "description": "Read the contents of a file",
             "parameters": {"type": "object", "properties": {"path": {"type": "string"}}, "required": ["path"]}},
            {"name": "grep", "description": "Search file contents for a pattern",
             "parameters": {"type": "object", "properties": {"pattern": {"type": "string"}}, "required": ["pattern"]}}
        ]"#,
    )
    .unwrap();
    path
}

#[test]
fn tools_prints_allowed_schemas_as_json() {
    let home = TempDir::new().unwrap();
    let tools = write_tools(home.path());

    let output = contextkit(
        home.path(),
        &["tools", "read the file", "--tools", tools.to_str().unwrap(), "--allow", "read_file"],
    );
    assert!(output.status.success());

    let schemas: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let names: Vec<&str> = schemas
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["name"].as_str())
        .collect();
    assert_eq!(names, vec!["read_file"]);
}

#[test]
fn context_renders_code_and_docs() {
    let home = TempDir::new().unwrap();
    let root = home.path().join("project");
    std::fs::create_dir_all(root.join("src")).unwrap();
    std::fs::create_dir_all(root.join("docs")).unwrap();
    std::fs::write(root.join("src/app.py"), "def foo():\n    return 1\n").unwrap();
    std::fs::write(root.join("docs/guide.md"), "# Setup\nRun foo once.\n").unwrap();

    let output = contextkit(
        home.path(),
        &[
            "context",
            "foo setup",
            "--root",
            root.to_str().unwrap(),
            "--note",
            "plan=call foo during setup",
        ],
    );
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("## Memory"));
    assert!(text.contains("### plan (score"));
    assert!(text.contains("### docs/guide.md#Setup (score"));
    assert!(text.contains("### src/app.py:1 (score"));
    assert!(text.find("## Memory").unwrap() < text.find("## Code").unwrap());
}

#[test]
fn context_rejects_malformed_note() {
    let home = TempDir::new().unwrap();
    let output = contextkit(home.path(), &["context", "anything", "--note", "missing-separator"]);
    assert!(!output.status.success());
}

#[test]
fn config_path_points_under_home() {
    let home = TempDir::new().unwrap();
    let output = contextkit(home.path(), &["config", "path"]);
    assert!(output.status.success());
    assert!(stdout(&output).trim().ends_with(".contextkit/config.toml"));
}

#[test]
fn cache_clear_after_context_removes_files() {
    let home = TempDir::new().unwrap();
    let root = home.path().join("project");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("notes.md"), "# Notes\nRemember the cache.\n").unwrap();

    let context = contextkit(home.path(), &["context", "cache notes", "--root", root.to_str().unwrap()]);
    assert!(context.status.success());
    assert!(home.path().join("cache").read_dir().unwrap().count() > 0);

    let clear = contextkit(home.path(), &["cache", "clear", "--root", root.to_str().unwrap()]);
    assert!(clear.status.success());
    assert_eq!(home.path().join("cache").read_dir().unwrap().count(), 0);
}
