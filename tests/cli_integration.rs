//! CLI integration tests for pipecheck
//!
//! Each test lays out a small project in a temporary directory and runs the
//! binary from its root, so the default `assets/...` paths apply unless a
//! test says otherwise.

use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PIPELINE: &str = "assets/resource/pipeline";

/// A temporary project directory with its own global config dir
struct Fixture {
    dir: TempDir,
    config_home: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            config_home: TempDir::new().unwrap(),
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, rel: &str, content: &str) -> &Self {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        self
    }

    fn pipeline(&self, name: &str, content: &str) -> &Self {
        self.write(&format!("{}/{}", PIPELINE, name), content)
    }

    fn interface(&self, content: &str) -> &Self {
        self.write("assets/interface.json", content)
    }

    /// A pipecheck command running from the project root
    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("pipecheck"));
        cmd.current_dir(self.root())
            .env("PIPECHECK_CONFIG_DIR", self.config_home.path())
            .env_remove("PIPECHECK_PIPELINE_DIR")
            .env_remove("PIPECHECK_IMAGE_DIR")
            .env_remove("PIPECHECK_INTERFACE");
        cmd
    }

    fn stdout(&self, args: &[&str]) -> String {
        let output = self.cmd().args(args).output().unwrap();
        String::from_utf8_lossy(&output.stdout).into_owned()
    }
}

// =============================================================================
// End-to-end
// =============================================================================

#[test]
fn test_cycle_across_files_is_clean() {
    let fx = Fixture::new();
    fx.pipeline("a.json", r#"{"Start": {"next": ["B"]}}"#)
        .pipeline("b.json", r#"{"B": {"next": ["Start"]}}"#)
        .interface(r#"{"task": [{"name": "Main", "entry": "Start"}]}"#);

    fx.cmd()
        .args(["check", "--strict"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains(
            "checked: files=2 nodes=2 anchors=0 disabled=0 errors=0 warnings=0 infos=0",
        ));
}

#[test]
fn test_realistic_project_passes() {
    let fx = Fixture::new();
    fx.pipeline(
        "main.json",
        r#"{
            "$schema": "../schema.json",
            "Start": {
                "recognition": {"type": "TemplateMatch", "param": {"template": "ui/start.png"}},
                "next": ["意外处理", "Start", {"name": "Battle"}, "[JumpBack]Idle"],
                "on_error": "意外处理"
            },
            "Battle": {"recognition": "OCR", "anchor": ["Fight"], "interrupt": [["[Anchor]Fight"]]},
            "Idle": {"recognition": "DirectHit", "enabled": false},
            "意外处理": {"recognition": "DirectHit"}
        }"#,
    )
    .write("assets/resource/image/ui/start.png", "png")
    .interface(
        "{\n  // shown in the task list\n  \"task\": [{\"entry\": \"Start\", \"pipeline_override\": {\"Battle\": {}}}]\n}",
    );

    fx.cmd()
        .args(["check", "--strict"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains(
            "checked: files=1 nodes=4 anchors=1 disabled=1 errors=0 warnings=0 infos=0",
        ));
}

// =============================================================================
// Fatal setup
// =============================================================================

#[test]
fn test_missing_pipeline_dir_exits_2() {
    let fx = Fixture::new();

    fx.cmd()
        .arg("check")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("[ERROR][PIPELINE_DIR_NOT_FOUND]"));
}

#[test]
fn test_empty_pipeline_dir_exits_2() {
    let fx = Fixture::new();
    fx.pipeline("notes.txt", "no json here");

    fx.cmd()
        .arg("check")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("[ERROR][PIPELINE_EMPTY]"))
        .stdout(predicate::str::contains("files=0 nodes=0"));
}

#[test]
fn test_priority_without_nodes_exits_2() {
    let fx = Fixture::new();
    fx.pipeline("meta.json", r#"{"$version": 1}"#);

    fx.cmd()
        .arg("priority")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("[ERROR][NO_NODES]"));
}

#[test]
fn test_malformed_config_exits_2() {
    let fx = Fixture::new();
    fx.pipeline("a.json", r#"{"A": {}}"#)
        .write("pipecheck.toml", "strict = [");

    fx.cmd()
        .arg("check")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("[ERROR][INTERNAL_ERROR]"))
        .stdout(predicate::str::contains("Failed to parse project config"));
}

#[test]
fn test_malformed_config_json_report() {
    let fx = Fixture::new();
    fx.pipeline("a.json", r#"{"A": {}}"#)
        .write("pipecheck.toml", "strict = [");

    let stdout = fx.stdout(&["--format", "json", "check"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(json["exit_code"], 2);
    assert_eq!(json["issues"].as_array().unwrap().len(), 1);
    assert_eq!(json["issues"][0]["code"], "INTERNAL_ERROR");
    assert!(json["issues"][0]["message"]
        .as_str()
        .unwrap()
        .contains("Failed to parse project config"));
}

#[test]
fn test_show_rules_ignores_malformed_config() {
    let fx = Fixture::new();
    fx.write("pipecheck.toml", "strict = [");

    fx.cmd()
        .args(["check", "--show-rules"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("exception handler"));
}

// =============================================================================
// Findings
// =============================================================================

#[test]
fn test_dangling_reference_reported_once() {
    let fx = Fixture::new();
    fx.pipeline("a.json", r#"{"A": {"next": ["Ghost"]}}"#);

    let assert = fx.cmd().arg("check").assert().code(1);
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();

    assert_eq!(stdout.matches("[DANGLING_NODE_REF]").count(), 1);
    assert!(stdout.contains("references unknown node: Ghost"));
    assert!(stdout.contains("node=A, field=next"));
}

#[test]
fn test_duplicate_node_lists_both_files() {
    let fx = Fixture::new();
    fx.pipeline("a.json", r#"{"X": {}}"#)
        .pipeline("b.json", r#"{"X": {"next": "Ghost"}}"#);

    let stdout = fx.stdout(&["check"]);
    let line = stdout
        .lines()
        .find(|l| l.contains("[DUPLICATE_NODE_NAME]"))
        .unwrap();
    assert!(line.contains("a.json"));
    assert!(line.contains("b.json"));
    assert!(line.contains("node=X"));
    // The first definition wins, so b.json's reference is not analyzed
    assert!(!stdout.contains("DANGLING_NODE_REF"));
}

#[test]
fn test_parse_failure_does_not_stop_analysis() {
    let fx = Fixture::new();
    fx.pipeline("a.json", "{\"A\": {\"next\": }")
        .pipeline("b.json", r#"{"B": {"next": "Ghost"}, "B": {}}"#);

    let stdout = fx.stdout(&["check"]);
    assert!(stdout.contains("[ERROR][PIPELINE_JSON_INVALID] JSON syntax error"));
    assert!(stdout.contains("[ERROR][DUPLICATE_JSON_KEY] repeated keys in file: B"));
    assert!(stdout.contains("files=2 nodes=1"));
}

#[test]
fn test_interface_entry_and_override_checks() {
    let fx = Fixture::new();
    fx.pipeline("a.json", r#"{"Start": {}}"#).interface(
        r#"{
            "task": [{"entry": "Start"}, {"entry": "Nowhere"}],
            "option": {"Mode": {"cases": [{"pipeline_override": {"Strat": {}}}]}}
        }"#,
    );

    fx.cmd()
        .arg("check")
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "[ERROR][TASK_ENTRY_MISSING] task entry points to unknown node: Nowhere",
        ))
        .stdout(predicate::str::contains(
            "[WARN][PIPELINE_OVERRIDE_UNKNOWN] pipeline_override targets unknown node: Strat",
        ));
}

#[test]
fn test_broken_interface_is_a_warning() {
    let fx = Fixture::new();
    fx.pipeline("a.json", r#"{"Start": {}}"#)
        .interface("{ \"task\": [ ");

    fx.cmd()
        .arg("check")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("[WARN][INTERFACE_PARSE_FAILED]"));
}

#[test]
fn test_missing_template_is_a_warning() {
    let fx = Fixture::new();
    fx.pipeline(
        "a.json",
        r#"{"A": {"recognition": {"type": "TemplateMatch", "param": {"template": ["here.png", "gone.png"]}}}}"#,
    )
    .write("img/here.png", "png");

    let stdout = fx.stdout(&["check", "--image-dir", "img"]);
    assert_eq!(stdout.matches("[MISSING_TEMPLATE]").count(), 1);
    assert!(stdout.contains("gone.png"));
    assert!(stdout.contains("field=recognition.param.template"));
}

// =============================================================================
// Reachability and strictness
// =============================================================================

fn orphan_fixture() -> Fixture {
    let fx = Fixture::new();
    fx.pipeline(
        "a.json",
        r#"{"Start": {"next": ["Mid"]}, "Mid": {"on_error": ["End"]}, "End": {}, "Orphan": {}}"#,
    )
    .interface(r#"{"task": [{"entry": "Start"}]}"#);
    fx
}

#[test]
fn test_unreachable_is_warning_unless_strict() {
    let fx = orphan_fixture();

    fx.cmd()
        .arg("check")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("[WARN][UNREACHABLE_NODE]"))
        .stdout(predicate::str::contains("node=Orphan"));

    fx.cmd().args(["check", "--strict"]).assert().code(1);
}

#[test]
fn test_no_unreachable_suppresses_check() {
    let fx = orphan_fixture();

    fx.cmd()
        .args(["check", "--strict", "--no-unreachable"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("UNREACHABLE_NODE").not());
}

#[test]
fn test_no_interface_skips_reachability() {
    let fx = orphan_fixture();

    fx.cmd()
        .args(["check", "--no-interface"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("[INFO][REACHABILITY_SKIPPED]"))
        .stdout(predicate::str::contains("UNREACHABLE_NODE").not());
}

// =============================================================================
// Priority
// =============================================================================

const PRIORITY_NODES: &str = r#"{
    "Sel": {"next": ["Uncond", "Cond"]},
    "Cond": {"recognition": {"type": "TemplateMatch"}},
    "Uncond": {"recognition": "DirectHit"}
}"#;

#[test]
fn test_priority_violation_suggests_order() {
    let fx = Fixture::new();
    fx.pipeline("nested/deeper/sel.json", PRIORITY_NODES);

    fx.cmd()
        .arg("priority")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("[WARN][PRIORITY_ORDER]"))
        .stdout(predicate::str::contains(
            "suggested: Cond(conditional node) -> Uncond(unconditional node)",
        ))
        .stdout(predicate::str::contains("node=Sel, field=next"));

    fx.cmd().args(["priority", "--strict"]).assert().code(1);
}

#[test]
fn test_check_runs_priority_unless_disabled() {
    let fx = Fixture::new();
    fx.pipeline("sel.json", PRIORITY_NODES);

    fx.cmd()
        .args(["check", "--no-interface"])
        .assert()
        .stdout(predicate::str::contains("[PRIORITY_ORDER]"));

    fx.cmd()
        .args(["check", "--no-interface", "--no-priority"])
        .assert()
        .stdout(predicate::str::contains("[PRIORITY_ORDER]").not());
}

#[test]
fn test_show_rules_lists_table() {
    let fx = Fixture::new();

    for command in ["check", "priority"] {
        fx.cmd()
            .args([command, "--show-rules"])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("exception handler"))
            .stdout(predicate::str::contains("unconditional node"))
            .stdout(predicate::str::contains("999"));
    }
}

// =============================================================================
// Output and configuration
// =============================================================================

#[test]
fn test_json_format() {
    let fx = Fixture::new();
    fx.pipeline("a.json", r#"{"A": {"next": ["Ghost"]}}"#);

    let stdout = fx.stdout(&["--format", "json", "check"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(json["exit_code"], 1);
    assert_eq!(json["summary"]["errors"], 1);
    assert_eq!(json["summary"]["nodes"], 1);

    let dangling: Vec<_> = json["issues"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|i| i["code"] == "DANGLING_NODE_REF")
        .collect();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0]["node"], "A");
    assert_eq!(dangling[0]["field"], "next");
}

#[cfg(unix)]
#[test]
fn test_json_format_with_non_utf8_file_name() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fx = Fixture::new();
    let dir = fx.root().join(PIPELINE);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join(OsStr::from_bytes(b"x\xff.json")),
        r#"{"A": {"next": "Ghost"}}"#,
    )
    .unwrap();

    let assert = fx
        .cmd()
        .args(["--format", "json", "check", "--no-interface"])
        .assert()
        .code(1);
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    let file = json["issues"][0]["file"].as_str().unwrap();
    assert!(file.ends_with("x\u{fffd}.json"));
    assert_eq!(json["issues"][0]["code"], "DANGLING_NODE_REF");
}

#[test]
fn test_global_default_format() {
    let fx = Fixture::new();
    fx.pipeline("a.json", r#"{"A": {}}"#);
    fs::write(fx.config_home.path().join("config.toml"), "default_format = \"json\"\n").unwrap();

    let stdout = fx.stdout(&["check"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["exit_code"], 0);

    // An explicit flag beats the global default
    assert!(fx.stdout(&["--format", "text", "check"]).starts_with("[INFO]"));
}

#[test]
fn test_project_config_paths_and_strict() {
    let fx = Fixture::new();
    fx.write("flows/a.json", r#"{"Start": {}, "Orphan": {}}"#)
        .write("tasks.json", r#"{"task": [{"entry": "Start"}]}"#)
        .write(
            "pipecheck.toml",
            "pipeline_dir = \"flows\"\ninterface = \"tasks.json\"\nstrict = true\n",
        );
    fs::create_dir_all(fx.root().join("sub")).unwrap();

    // Run from a subdirectory: the config is found by walking up
    fx.cmd()
        .current_dir(fx.root().join("sub"))
        .arg("check")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("node=Orphan"));
}

#[test]
fn test_explicit_config_file() {
    let fx = Fixture::new();
    fx.write("flows/a.json", r#"{"Start": {"next": ["意外处理"]}}"#)
        .write("conf/custom.toml", "pipeline_dir = \"../flows\"\nunreachable = false\n");

    fx.cmd()
        .args(["--config", "conf/custom.toml", "check"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("references unknown node: 意外处理"))
        .stdout(predicate::str::contains("REACHABILITY_SKIPPED").not());
}

#[test]
fn test_pipeline_dir_from_env() {
    let fx = Fixture::new();
    fx.write("other/a.json", r#"{"A": {"next": ["Ghost"]}}"#);

    fx.cmd()
        .env("PIPECHECK_PIPELINE_DIR", "other")
        .arg("check")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("DANGLING_NODE_REF"));
}

#[test]
fn test_verbose_traces_on_stderr() {
    let fx = Fixture::new();
    fx.pipeline("a.json", r#"{"A": {}}"#);

    fx.cmd()
        .args(["--verbose", "check"])
        .assert()
        .code(0)
        .stderr(predicate::str::contains("[verbose:load]"))
        .stdout(predicate::str::contains("[verbose").not());
}
