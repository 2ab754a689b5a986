//! Integration tests for the `sheetly` CLI binary.
//!
//! Argument parsing, help output, completions and error handling run
//! without a backend; config tests run against a temporary config
//! directory; the catalog and playlist tests point the binary at a
//! wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `sheetly` binary with env isolation.
///
/// Clears all `SHEETLY_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn sheetly_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("sheetly");
    cmd.env("HOME", "/tmp/sheetly-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/sheetly-cli-test-nonexistent")
        .env_remove("SHEETLY_PROFILE")
        .env_remove("SHEETLY_URL")
        .env_remove("SHEETLY_ANON_KEY")
        .env_remove("SHEETLY_EMAIL")
        .env_remove("SHEETLY_PASSWORD")
        .env_remove("SHEETLY_OUTPUT")
        .env_remove("SHEETLY_INSECURE")
        .env_remove("SHEETLY_TIMEOUT")
        .env_remove("SHEETLY_LIKE_PACING_MS")
        .env_remove("SHEETLY_DEFAULT_PROFILE")
        .env_remove("RUST_LOG");
    cmd
}

/// A `sheetly` command whose config directory is `dir`, seeded with `toml`.
fn sheetly_cmd_with_config(dir: &TempDir, toml: &str) -> assert_cmd::Command {
    let config_file = config_file(dir);
    std::fs::create_dir_all(config_file.parent().unwrap()).unwrap();
    std::fs::write(&config_file, toml).unwrap();

    let mut cmd = sheetly_cmd();
    cmd.env("HOME", dir.path()).env("XDG_CONFIG_HOME", dir.path());
    cmd
}

/// Where the binary looks for its config under a temporary home.
fn config_file(dir: &TempDir) -> std::path::PathBuf {
    if cfg!(target_os = "macos") {
        dir.path()
            .join("Library/Application Support/com.sheetly.sheetly/config.toml")
    } else {
        dir.path().join("sheetly/config.toml")
    }
}

const TWO_PROFILES: &str = r#"
default_profile = "home"

[profiles.home]
url = "https://abc.supabase.co"
anon_key = "anon-secret-123"
email = "ana@example.com"
password = "hunter2"

[profiles.studio]
url = "http://localhost:54321"
anon_key = "anon-local"
"#;

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary off the async runtime so wiremock keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = sheetly_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    sheetly_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("music sheets")
            .and(predicate::str::contains("likes"))
            .and(predicate::str::contains("sheets"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    sheetly_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sheetly"));
}

#[test]
fn test_likes_help_lists_subcommands() {
    sheetly_cmd().args(["likes", "--help"]).assert().success().stdout(
        predicate::str::contains("add")
            .and(predicate::str::contains("remove"))
            .and(predicate::str::contains("list")),
    );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    sheetly_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sheetly"));
}

#[test]
fn test_completions_invalid_shell() {
    sheetly_cmd()
        .args(["completions", "tcsh"])
        .assert()
        .failure();
}

// ── Argument validation ─────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = sheetly_cmd().arg("bookmarks").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_per_page_out_of_range() {
    let output = sheetly_cmd()
        .args(["sheets", "list", "--per-page", "0"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("per-page"));
}

#[test]
fn test_unknown_difficulty_rejected() {
    sheetly_cmd()
        .args(["sheets", "list", "--difficulty", "expert"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("beginner"));
}

#[test]
fn test_likes_add_requires_sheet_id() {
    let output = sheetly_cmd().args(["likes", "add"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn test_no_config_exits_with_usage_code() {
    let output = sheetly_cmd().args(["likes", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("config init"), "Expected setup hint:\n{text}");
}

#[test]
fn test_missing_anon_key_is_auth_error() {
    let output = sheetly_cmd()
        .args(["sheets", "list", "--url", "http://127.0.0.1:9"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("anon key"));
}

#[test]
fn test_likes_need_sign_in() {
    // Anonymous config: rejected before any request is made
    let output = sheetly_cmd()
        .args(["likes", "add", "sheet-1", "--url", "http://127.0.0.1:9", "--anon-key", "k"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("signed-in"));
}

#[test]
fn test_config_profiles_empty() {
    sheetly_cmd()
        .args(["config", "profiles"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No profiles configured"));
}

#[test]
fn test_config_use_unknown_profile() {
    let output = sheetly_cmd()
        .args(["config", "use", "studio"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
#[test]
fn test_config_show_masks_secrets() {
    let dir = tempfile::tempdir().unwrap();
    let output = sheetly_cmd_with_config(&dir, TWO_PROFILES)
        .args(["config", "show"])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("https://abc.supabase.co"), "{stdout}");
    assert!(stdout.contains("********"), "{stdout}");
    assert!(!stdout.contains("hunter2"), "{stdout}");
    assert!(!stdout.contains("anon-secret-123"), "{stdout}");
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
#[test]
fn test_config_profiles_marks_default() {
    let dir = tempfile::tempdir().unwrap();
    sheetly_cmd_with_config(&dir, TWO_PROFILES)
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout("home *\nstudio\n");
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
#[test]
fn test_config_use_and_set_persist() {
    let dir = tempfile::tempdir().unwrap();
    sheetly_cmd_with_config(&dir, TWO_PROFILES)
        .args(["config", "use", "studio"])
        .assert()
        .success()
        .stderr(predicate::str::contains("studio"));

    // `set` now targets the new default profile
    let mut cmd = sheetly_cmd();
    cmd.env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "set", "timeout", "45"])
        .assert()
        .success();

    let saved = std::fs::read_to_string(config_file(&dir)).unwrap();
    let saved: toml::Value = toml::from_str(&saved).unwrap();
    assert_eq!(saved["default_profile"].as_str(), Some("studio"));
    assert_eq!(saved["profiles"]["studio"]["timeout"].as_integer(), Some(45));
    assert_eq!(saved["profiles"]["home"].get("timeout"), None);
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
#[test]
fn test_profile_flag_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let output = sheetly_cmd_with_config(&dir, TWO_PROFILES)
        .args(["sheets", "list", "--profile", "office"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("home, studio"));
}

// ── Against a mock backend ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_sheets_list_json_anonymous() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/music_sheets"))
        .and(query_param("order", "downloads.desc.nullslast"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-range", "0-1/2")
                .set_body_json(json!([
                    { "id": "sheet-1", "title": "Ode to Joy", "downloads": 90 },
                    { "id": "sheet-2", "title": "Canon in D", "downloads": 40 }
                ])),
        )
        .mount(&server)
        .await;

    let mut cmd = sheetly_cmd();
    cmd.args(["sheets", "list", "--sort", "downloads", "-o", "json"])
        .args(["--url", &server.uri(), "--anon-key", "anon-key"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body[0]["id"], "sheet-1");
    assert_eq!(body[1]["title"], "Canon in D");
    assert_eq!(body[0]["liked"], false);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sheets_get_missing_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/music_sheets"))
        .and(query_param("id", "eq.sheet-404"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let mut cmd = sheetly_cmd();
    cmd.args(["sheets", "get", "sheet-404"])
        .args(["--url", &server.uri(), "--anon-key", "anon-key"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("sheet-404"));
}

async fn mount_sign_in(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "expires_in": 3600,
            "user": { "id": "user-1", "email": "ana@example.com" }
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

fn signed_in_cmd(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = sheetly_cmd();
    cmd.env("SHEETLY_PASSWORD", "hunter2").args([
        "--url",
        &server.uri(),
        "--anon-key",
        "anon-key",
        "--email",
        "ana@example.com",
    ]);
    cmd
}

#[tokio::test(flavor = "multi_thread")]
async fn test_playlists_list_json() {
    let server = MockServer::start().await;
    mount_sign_in(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/playlists"))
        .and(query_param("user_id", "eq.user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 7, "title": "Recital", "is_public": true, "item_count": [{ "count": 3 }] }
        ])))
        .mount(&server)
        .await;

    let mut cmd = signed_in_cmd(&server);
    cmd.args(["playlists", "list", "-o", "json"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body[0]["id"], 7);
    assert_eq!(body[0]["title"], "Recital");
    assert_eq!(body[0]["item_count"], 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_playlists_create_plain_prints_id() {
    let server = MockServer::start().await;
    mount_sign_in(&server).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/playlists"))
        .and(body_json(json!({
            "user_id": "user-1",
            "title": "Warmups",
            "description": "Scales first",
            "is_public": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 12, "title": "Warmups", "description": "Scales first", "is_public": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = signed_in_cmd(&server);
    cmd.args(["playlists", "create", "Warmups", "-d", "Scales first", "-o", "plain"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "12");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_playlists_add_to_missing_playlist() {
    let server = MockServer::start().await;
    mount_sign_in(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/playlists"))
        .and(query_param("id", "eq.99"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let mut cmd = signed_in_cmd(&server);
    cmd.args(["playlists", "add", "99", "sheet-1"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("playlists list"));
}

#[test]
fn test_playlists_need_sign_in() {
    let output = sheetly_cmd()
        .args(["playlists", "list", "--url", "http://127.0.0.1:9", "--anon-key", "k"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}
