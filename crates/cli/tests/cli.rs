//! Process-level coverage of the `capmatch` binary: exit codes, stdout
//! discipline, and the `list` discovery report.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    fs,
    io::Write,
    os::unix::fs::PermissionsExt,
    path::Path,
    process::{Command, Output, Stdio},
};

/// A project workspace plus an isolated (empty) user root, so the host's
/// real `~/.capmatch` never leaks into a test.
struct Harness {
    project: tempfile::TempDir,
    user: tempfile::TempDir,
}

impl Harness {
    fn new() -> Self {
        Self {
            project: tempfile::tempdir().unwrap(),
            user: tempfile::tempdir().unwrap(),
        }
    }

    fn root(&self) -> std::path::PathBuf {
        self.project.path().join(".capmatch")
    }

    fn run(&self, args: &[&str], stdin: &str) -> Output {
        let mut child = Command::new(env!("CARGO_BIN_EXE_capmatch"))
            .args(args)
            .current_dir(self.project.path())
            .env("CAPMATCH_HOME", self.user.path())
            .env_remove("CAPMATCH_TIMEOUT_SECS")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        // The fast path may exit without reading stdin at all.
        if let Err(e) = child.stdin.take().unwrap().write_all(stdin.as_bytes()) {
            assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe);
        }
        child.wait_with_output().unwrap()
    }

    fn payload(&self) -> String {
        format!(
            concat!(
                r#"{{"prompt":"set up docker","cwd":{cwd:?},"#,
                r#""session_id":"sess-cli","transcript_path":{t:?},"#,
                r#""permission_mode":"default","hook_event_name":"UserPromptSubmit"}}"#,
            ),
            cwd = self.project.path(),
            t = self.project.path().join("transcript.jsonl"),
        )
    }
}

fn write_capability_matcher(root: &Path, name: &str, body: &str) {
    let dir = root.join("capabilities").join(name).join(".capmatch");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("UserPromptSubmit.v2.matcher.sh");
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn write_sibling(root: &Path, dir: &str, name: &str, body: &str) {
    let dir = root.join(dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{name}.md")), "# def\n").unwrap();
    let path = dir.join(format!("{name}.v2.matcher.sh"));
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn reporting(count: u32) -> String {
    format!("#!/bin/sh\necho '{{\"version\":\"2.0\",\"matchCount\":{count}}}'\n")
}

// ── Hook mode ───────────────────────────────────────────────────────────────

#[test]
fn no_matchers_is_silent_success_without_touching_stdin() {
    let harness = Harness::new();
    // Even garbage stdin passes: the empty scan exits first.
    let output = harness.run(&[], "not json");
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn malformed_payload_exits_nonzero_with_no_reply() {
    let harness = Harness::new();
    write_capability_matcher(&harness.root(), "docker-helper", &reporting(3));

    let output = harness.run(&[], "not json");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    let output = harness.run(&[], r#"{"prompt":"hi"}"#);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn broken_matcher_still_exits_zero() {
    let harness = Harness::new();
    write_capability_matcher(&harness.root(), "broken", "#!/bin/sh\nexit 7\n");

    let output = harness.run(&[], &harness.payload());
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn nothing_relevant_exits_zero_with_no_reply() {
    let harness = Harness::new();
    write_capability_matcher(&harness.root(), "quiet", &reporting(0));

    let output = harness.run(&[], &harness.payload());
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn relevant_matcher_prints_reply_and_exits_zero() {
    let harness = Harness::new();
    write_capability_matcher(&harness.root(), "docker-helper", &reporting(3));

    let output = harness.run(&[], &harness.payload());
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("hookSpecificOutput"));
    assert!(stdout.contains("UserPromptSubmit"));
    assert!(stdout.contains("docker-helper"));
}

// ── List mode ───────────────────────────────────────────────────────────────

#[test]
fn list_round_trips_every_discovered_record() {
    let harness = Harness::new();
    let root = harness.root();
    write_capability_matcher(&root, "docker-helper", &reporting(1));
    write_sibling(&root, "delegates", "reviewer", &reporting(1));
    write_sibling(&root, "actions", "release", &reporting(1));

    let output = harness.run(&["list"], "");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();

    for (kind, name) in [
        ("capability", "docker-helper"),
        ("delegate", "reviewer"),
        ("action", "release"),
    ] {
        let mut lines = stdout.lines().filter(|l| l.contains(name));
        let line = lines.next().unwrap();
        assert_eq!(lines.next(), None, "{name} listed once");
        assert!(line.contains(kind), "{name} labeled {kind}: {line}");
        assert!(line.contains("project"));
    }
    assert_eq!(stdout.lines().count(), 3);
}

#[test]
fn list_reports_empty_roots() {
    let harness = Harness::new();
    let output = harness.run(&["list"], "");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim(), "no matchers discovered");
}
