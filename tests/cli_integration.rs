//! Integration tests that run the CLI binary.

use std::io::Write;
use std::net::TcpListener;
use std::process::{Output, Stdio};

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn bin(home: &std::path::Path) -> std::process::Command {
    let mut cmd = std::process::Command::new(env!("CARGO_BIN_EXE_healthchat"));
    // Keep stored credentials and logs out of the real home directory
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_CACHE_HOME", home.join("cache"))
        .env_remove("HEALTHCHAT_API_URL")
        .env_remove("HEALTHCHAT_SITE_URL")
        .env_remove("HEALTHCHAT_TIMEOUT_SECS")
        .current_dir(home);
    cmd
}

fn run_with_stdin(cmd: &mut std::process::Command, input: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("binary not found - run cargo build first");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn cli_help_succeeds_and_outputs_usage() {
    let tmp = tempfile::TempDir::new().expect("temp dir");
    let output = bin(tmp.path()).arg("--help").output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("healthchat"));
    assert!(out.contains("normalize"));
    assert!(out.contains("HEALTHCHAT_API_URL"));
}

#[test]
fn cli_version_succeeds() {
    let tmp = tempfile::TempDir::new().expect("temp dir");
    let output = bin(tmp.path()).arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn normalize_repairs_stdin() {
    let tmp = tempfile::TempDir::new().expect("temp dir");
    let output = run_with_stdin(
        bin(tmp.path()).arg("normalize"),
        "##Dosage\r\n* Adults take 1 tablet\n\n\n\n```print('x')```",
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.starts_with("## Dosage\n"), "{out}");
    assert!(out.contains("- Adults take 1 tablet"), "{out}");
    assert!(out.contains("```\nprint('x')\n```"), "{out}");
    assert!(!out.contains("\n\n\n"));
}

#[test]
fn render_prints_plain_text() {
    let tmp = tempfile::TempDir::new().expect("temp dir");
    let output = run_with_stdin(
        bin(tmp.path()).args(["render", "--width", "100"]),
        "# Care\n\nSee [the guide](https://other.example.org/guide).",
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Care\n===="), "{out}");
    assert!(out.contains("the guide <https://other.example.org/guide>"), "{out}");
}

#[test]
fn title_from_json_messages() {
    let tmp = tempfile::TempDir::new().expect("temp dir");
    let output = run_with_stdin(
        bin(tmp.path()).arg("title"),
        r#"[{"sender":"user","text":"Is ibuprofen safe"},{"sender":"bot","text":"Rest."}]"#,
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "Is ibuprofen safe?");
}

#[test]
fn title_rejects_invalid_json() {
    let tmp = tempfile::TempDir::new().expect("temp dir");
    let output = run_with_stdin(bin(tmp.path()).arg("title"), "not json");
    assert!(!output.status.success());
    assert!(stderr(&output).starts_with("Error:"));
}

#[test]
fn completions_for_bash() {
    let tmp = tempfile::TempDir::new().expect("temp dir");
    let output = bin(tmp.path()).args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("healthchat"));
}

#[tokio::test(flavor = "multi_thread")]
async fn prompt_prints_rendered_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_json(json!({ "message": "I have a cold" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "response": "##Rest\nDrink fluids." })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tmp = tempfile::TempDir::new().expect("temp dir");
    let mut cmd = bin(tmp.path());
    cmd.env("HEALTHCHAT_API_URL", format!("{}/api", server.uri()))
        .args(["-p", "I have a cold"]);
    let output = tokio::task::spawn_blocking(move || cmd.output())
        .await
        .unwrap()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Rest\n----"), "{out}");
    assert!(out.contains("Drink fluids."), "{out}");
}

#[tokio::test(flavor = "multi_thread")]
async fn prompt_with_expired_token_prints_login_hint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "Token expired" })))
        .mount(&server)
        .await;

    let tmp = tempfile::TempDir::new().expect("temp dir");
    let mut cmd = bin(tmp.path());
    cmd.env("HEALTHCHAT_API_URL", format!("{}/api", server.uri()))
        .args(["-p", "hello"]);
    let output = tokio::task::spawn_blocking(move || cmd.output())
        .await
        .unwrap()
        .unwrap();
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Error: Token expired"), "{err}");
    assert!(err.contains("healthchat login"), "{err}");
}

#[test]
fn prompt_without_backend_exits_with_error() {
    let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let tmp = tempfile::TempDir::new().expect("temp dir");
    let output = bin(tmp.path())
        .env("HEALTHCHAT_API_URL", format!("http://{}/api", addr))
        .args(["-p", "hello"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Error:"), "{err}");
    assert!(err.contains("try sending the message again"), "{err}");
}

#[test]
fn invalid_api_url_is_reported() {
    let tmp = tempfile::TempDir::new().expect("temp dir");
    let output = bin(tmp.path())
        .env("HEALTHCHAT_API_URL", "not a url")
        .args(["-p", "hello"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("HEALTHCHAT_API_URL"));
}

#[cfg(target_os = "linux")]
#[test]
fn login_then_logout() {
    let tmp = tempfile::TempDir::new().expect("temp dir");
    let output = bin(tmp.path())
        .args(["login", "--access", "abc"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let path = tmp.path().join("config/healthchat/credentials.json");
    let saved = std::fs::read_to_string(&path).unwrap();
    assert!(saved.contains("\"accessToken\""));
    assert!(saved.contains("abc"));

    let output = bin(tmp.path()).arg("logout").output().unwrap();
    assert!(output.status.success());
    assert!(!path.exists());
}
