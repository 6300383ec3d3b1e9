//! Integration tests for the `wu` CLI binary.
//!
//! These run the binary as a subprocess and check exit codes and output.
//! API commands run against a local mock server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::Path;
use std::process::Command;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Unsigned token for `{"sub":"w-1","name":"Kid Lightning","cognito:groups":["Wrestlers"]}`.
const WRESTLER_TOKEN: &str = "eyJhbGciOiJub25lIn0.eyJzdWIiOiJ3LTEiLCJuYW1lIjoiS2lkIExpZ2h0bmluZyIsImNvZ25pdG86Z3JvdXBzIjpbIldyZXN0bGVycyJdfQ.sig";

/// Helper: locate the `wu` binary built by `cargo test`.
fn wu_bin() -> String {
    let path = env!("CARGO_BIN_EXE_wu");
    assert!(Path::new(path).exists(), "wu binary not found at {path}");
    path.to_owned()
}

/// Helper: run wu with args and env, return (`exit_code`, stdout, stderr).
fn run_with(args: &[&str], env: &[(&str, &str)]) -> (i32, String, String) {
    let mut cmd = Command::new(wu_bin());
    cmd.args(args)
        .env("WU_API_BASE_URL", "http://127.0.0.1:19999")
        .env_remove("WU_ID_TOKEN")
        .env_remove("WU_STATE_FILE")
        .env_remove("WU_LOG_JSON")
        .env("RUST_LOG", "error");
    for (k, v) in env {
        cmd.env(k, v);
    }
    let output = cmd.output().expect("failed to execute wu");
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

fn run(args: &[&str]) -> (i32, String, String) {
    run_with(args, &[])
}

// ── Version & help ───────────────────────────────────────────────────

#[test]
fn test_help_lists_commands() {
    let (code, stdout, _) = run(&["--help"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("WU CLI"));
    for sub in ["render", "whoami", "state", "tryouts", "talent", "applications", "upload"] {
        assert!(stdout.contains(sub), "help should list '{sub}'");
    }
}

#[test]
fn test_version_flag() {
    let (code, stdout, _) = run(&["--version"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("wu"));
}

// ── whoami ───────────────────────────────────────────────────────────

#[test]
fn test_whoami_signed_out() {
    let (code, stdout, _) = run(&["whoami"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("no"));
}

#[test]
fn test_whoami_decodes_token() {
    let (code, stdout, _) = run_with(&["whoami"], &[("WU_ID_TOKEN", WRESTLER_TOKEN)]);
    assert_eq!(code, 0, "stdout: {stdout}");
    assert!(stdout.contains("w-1"));
    assert!(stdout.contains("Kid Lightning"));
    assert!(stdout.contains("Wrestlers"));
    assert!(stdout.contains("wrestler"));
}

// ── render ───────────────────────────────────────────────────────────

fn write_site(dir: &Path) {
    fs::create_dir_all(dir.join("partials")).unwrap();
    fs::write(
        dir.join("partials/header.html"),
        r##"<nav><a data-myprofile href="#">Me</a><a data-auth="out" href="/login.html">Log in</a></nav>"##,
    )
    .unwrap();
    fs::write(
        dir.join("about.html"),
        r#"<html><body><div data-include="/partials/header.html"></div><p>About us</p></body></html>"#,
    )
    .unwrap();
}

#[test]
fn test_render_resolves_partials_for_signed_out_visitor() {
    let dir = tempfile::tempdir().unwrap();
    write_site(dir.path());
    let file = dir.path().join("about.html");

    let (code, stdout, stderr) = run(&["render", file.to_str().unwrap()]);

    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stdout.contains("<nav>"));
    assert!(!stdout.contains("data-include"));
    assert!(stdout.contains(r#"href="/login.html">Me</a>"#));
    assert!(stdout.contains(r#"data-signed-in="false""#));
    assert!(stderr.contains("page:"));
    assert!(stderr.contains("about"));
}

#[test]
fn test_render_as_wrestler_persists_summary() {
    let dir = tempfile::tempdir().unwrap();
    write_site(dir.path());
    let file = dir.path().join("about.html");
    let state = dir.path().join("state.json");

    let (code, stdout, stderr) = run_with(
        &["render", file.to_str().unwrap(), "--state", state.to_str().unwrap()],
        &[("WU_ID_TOKEN", WRESTLER_TOKEN)],
    );

    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stdout.contains(r#"href="/profile_wrestler.html""#));
    assert!(stdout.contains(r#"data-role="wrestler""#));
    let saved = fs::read_to_string(&state).unwrap();
    assert!(saved.contains("wu:user-summary"));
}

#[test]
fn test_state_lists_saved_entries() {
    let dir = tempfile::tempdir().unwrap();
    write_site(dir.path());
    let file = dir.path().join("about.html");
    let state = dir.path().join("state.json");
    let state_arg = state.to_str().unwrap();

    let (code, stdout, _) = run(&["state", "--state", state_arg]);
    assert_eq!(code, 0);
    assert!(stdout.contains("empty"));

    let (code, _, stderr) = run_with(
        &["render", file.to_str().unwrap(), "--state", state_arg],
        &[("WU_ID_TOKEN", WRESTLER_TOKEN)],
    );
    assert_eq!(code, 0, "stderr: {stderr}");

    let (code, stdout, _) = run(&["state", "--state", state_arg]);
    assert_eq!(code, 0);
    assert!(stdout.contains("wu:user-summary"));
    assert!(stdout.contains("w-1"));
}

#[test]
fn test_state_requires_a_file() {
    let (code, _, stderr) = run(&["state"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no state file"));
}

#[test]
fn test_render_missing_file_fails() {
    let (code, _, stderr) = run(&["render", "/definitely/not/here.html"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("failed to read"));
}

// ── API commands ─────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_tryouts_lists_backend_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tryouts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 7, "orgName": "North Star", "city": "York", "status": "open", "slots": 10 }
        ])))
        .mount(&server)
        .await;
    let uri = server.uri();

    let (code, stdout, stderr) = tokio::task::spawn_blocking(move || {
        run_with(&["tryouts"], &[("WU_API_BASE_URL", uri.as_str())])
    })
    .await
    .unwrap();

    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stdout.contains("North Star"));
    assert!(stdout.contains("10 slots"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_api_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/profiles/wrestlers/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "no such wrestler" })))
        .mount(&server)
        .await;
    let uri = server.uri();

    let (code, _, stderr) = tokio::task::spawn_blocking(move || {
        run_with(&["wrestler", "ghost"], &[("WU_API_BASE_URL", uri.as_str())])
    })
    .await
    .unwrap();

    assert_eq!(code, 1);
    assert!(stderr.contains("API 404: no such wrestler"));
}

#[test]
fn test_unreachable_backend_fails() {
    let (code, _, stderr) = run(&["talent"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Error"));
}
