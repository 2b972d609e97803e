//! CLI tests for `documenter run` and `documenter init`.
//!
//! Spawns the documenter binary in a scratch directory and verifies written
//! files, stdout, and exit codes.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use documenter::core::request::{FileRequest, PortMessage};
use documenter::exit_codes;
use documenter::io::config::{ShimConfig, load_config};
use documenter::io::sink::SAVED_MESSAGE;
use documenter::test_support::TestWorkspace;

fn port_line(name: &str, content: &str) -> String {
    let message = PortMessage::create_file(&FileRequest::new(name, content)).expect("encode");
    serde_json::to_string(&message).expect("serialize message")
}

fn run_with_stdin(dir: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_documenter"))
        .current_dir(dir)
        .arg("run")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn documenter");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("documenter output")
}

#[test]
fn stdin_messages_are_written_under_src() {
    let workspace = TestWorkspace::new().expect("workspace");
    let input = format!("{}\n", port_line("Foo.js", "module.exports = {}"));

    let output = run_with_stdin(workspace.root(), &[], &input);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(workspace.read("Foo.js").expect("read"), "module.exports = {}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().collect::<Vec<_>>(), vec![SAVED_MESSAGE]);
}

#[test]
fn one_saved_line_per_write() {
    let workspace = TestWorkspace::new().expect("workspace");
    let input = format!(
        "{}\n{}\n{}\n",
        port_line("A.js", "1"),
        r#"{"port":"log","payload":null}"#,
        port_line("B.js", "2"),
    );

    let output = run_with_stdin(workspace.root(), &[], &input);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().filter(|l| *l == SAVED_MESSAGE).count(), 2);
    assert_eq!(workspace.read("A.js").expect("read"), "1");
    assert_eq!(workspace.read("B.js").expect("read"), "2");
}

#[test]
fn crlf_input_round_trips_multiline_unicode_content() {
    let workspace = TestWorkspace::new().expect("workspace");
    let content = "a\r\nb\n  \u{e9}\u{2603} \t";
    let input = format!("{}\r\n", port_line("Multi.txt", content));

    let output = run_with_stdin(workspace.root(), &[], &input);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let written = fs::read(workspace.base_dir().join("Multi.txt")).expect("read");
    assert_eq!(written, content.as_bytes());
}

#[test]
fn lone_surrogate_is_written_as_replacement_character() {
    let workspace = TestWorkspace::new().expect("workspace");
    let input = concat!(
        r#"{"port":"createFile","payload":{"name":"S.js","content":"x\ud800y"}}"#,
        "\n"
    );

    let output = run_with_stdin(workspace.root(), &[], input);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(workspace.read("S.js").expect("read"), "x\u{FFFD}y");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().collect::<Vec<_>>(), vec![SAVED_MESSAGE]);
}

#[test]
fn undecodable_create_file_payload_exits_invalid() {
    let workspace = TestWorkspace::new().expect("workspace");
    let input = format!(
        "{}\n{}\n",
        port_line("A.js", "1"),
        r#"{"port":"createFile","payload":{"name":"B.js","content":7}}"#,
    );

    let output = run_with_stdin(workspace.root(), &[], &input);

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert_eq!(workspace.read("A.js").expect("read"), "1");
    assert!(!workspace.base_dir().join("B.js").exists());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("decode createFile payload"));
}

#[test]
fn missing_base_dir_exits_with_write_failure() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = format!("{}\n", port_line("Foo.js", "x"));

    let output = run_with_stdin(temp.path(), &[], &input);

    assert_eq!(output.status.code(), Some(exit_codes::WRITE_FAILED));
    assert!(!temp.path().join("src").exists());
    assert!(output.stdout.is_empty());
}

#[test]
fn confine_flag_rejects_traversal() {
    let workspace = TestWorkspace::new().expect("workspace");
    let input = format!("{}\n", port_line("../evil", "x"));

    let output = run_with_stdin(workspace.root(), &["--confine"], &input);

    assert_eq!(output.status.code(), Some(exit_codes::WRITE_FAILED));
    assert!(!workspace.root().join("evil").exists());
}

#[test]
fn base_dir_flag_overrides_default() {
    let workspace = TestWorkspace::new().expect("workspace");
    fs::create_dir(workspace.root().join("gen")).expect("mkdir");
    let input = format!("{}\n", port_line("Foo.js", "x"));

    let output = run_with_stdin(workspace.root(), &["--base-dir", "gen/"], &input);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(
        fs::read_to_string(workspace.root().join("gen").join("Foo.js")).expect("read"),
        "x"
    );
    assert!(!workspace.base_dir().join("Foo.js").exists());
}

#[cfg(unix)]
#[test]
fn application_command_output_is_persisted() {
    let workspace = TestWorkspace::new().expect("workspace");
    let script = format!("printf '%s\\n' '{}'", port_line("Foo.js", "module.exports = {}"));

    let output = run_with_stdin(workspace.root(), &["--", "sh", "-c", &script], "");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(workspace.read("Foo.js").expect("read"), "module.exports = {}");
}

#[cfg(unix)]
#[test]
fn failing_application_exits_invalid_after_writing() {
    let workspace = TestWorkspace::new().expect("workspace");
    let script = format!("printf '%s\\n' '{}'; exit 4", port_line("A.js", "1"));

    let output = run_with_stdin(workspace.root(), &["--", "sh", "-c", &script], "");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert_eq!(workspace.read("A.js").expect("read"), "1");
}

#[test]
fn missing_application_program_exits_invalid() {
    let workspace = TestWorkspace::new().expect("workspace");

    let output = run_with_stdin(
        workspace.root(),
        &["--", "documenter-no-such-program"],
        "",
    );

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("spawn application"));
}

#[test]
fn init_writes_default_config() {
    let temp = tempfile::tempdir().expect("tempdir");

    let status = Command::new(env!("CARGO_BIN_EXE_documenter"))
        .current_dir(temp.path())
        .arg("init")
        .status()
        .expect("documenter init");

    assert_eq!(status.code(), Some(exit_codes::OK));
    let cfg = load_config(&temp.path().join("documenter.toml")).expect("load");
    assert_eq!(cfg, ShimConfig::default());
}
