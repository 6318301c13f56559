//! Integration tests for the stride CLI
//!
//! These tests run the binary end-to-end using assert_cmd, against a small
//! in-process HTTP server that plays the model provider.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use tempfile::TempDir;

const COMPONENTS: &str = r#"```json
{
  "components": [
    {"name": "Web App", "type": "Web Server", "provider": "AWS EC2", "description": "Serves the UI",
     "connections": [{"target": "Orders DB", "data_flow": "SQL over TLS"}]},
    {"name": "Orders DB", "type": "Database", "provider": "AWS RDS", "description": "Stores orders",
     "connections": []}
  ],
  "architecture_summary": "A two-tier web application."
}
```"#;

const THREATS: &str = r#"Here is the analysis:
{
  "stride_analysis": [
    {"component_name": "Web App", "component_type": "Web Server", "threats": [
      {"category": "Spoofing", "threat": "Forged session cookies", "severity": "High",
       "vulnerabilities": ["Unsigned cookies"], "countermeasures": ["Sign cookies", "Enforce MFA"]}]},
    {"component_name": "Orders DB", "component_type": "Database", "threats": [
      {"category": "Spoofing", "threat": "Shared service credentials", "severity": "Média",
       "vulnerabilities": [], "countermeasures": ["Per-service accounts"]}]}
  ],
  "overall_risk_level": "High",
  "executive_summary": "Authentication is the weakest area."
}"#;

/// A canned HTTP response from the stub provider
struct StubReply {
    status: u16,
    headers: Vec<(&'static str, String)>,
    body: String,
}

impl StubReply {
    fn completion(content: &str) -> Self {
        let body = json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
            ]
        });
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: json!({"error": {"message": "stub error"}}).to_string(),
        }
    }

    fn with_header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }
}

/// Serve `replies` in order, one connection each; the handle yields the raw requests
fn serve(replies: Vec<StubReply>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}/v1", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let mut requests = Vec::new();
        for reply in replies {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut head = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
                head.push_str(&line);
            }
            let mut body = vec![0; content_length];
            reader.read_exact(&mut body).unwrap();
            requests.push(format!("{head}\r\n{}", String::from_utf8_lossy(&body)));

            let reason = match reply.status {
                200 => "OK",
                401 => "Unauthorized",
                429 => "Too Many Requests",
                _ => "Error",
            };
            let mut response = format!(
                "HTTP/1.1 {} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
                reply.status,
                reply.body.len()
            );
            for (name, value) in &reply.headers {
                response.push_str(&format!("{name}: {value}\r\n"));
            }
            response.push_str("\r\n");
            response.push_str(&reply.body);

            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        }
        requests
    });

    (base, handle)
}

/// A temp working directory holding a diagram
fn setup_workspace() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let image = tmp.path().join("arch.png");
    fs::write(&image, [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]).unwrap();
    (tmp, image)
}

/// Helper to get a stride command isolated from the caller's environment
fn stride(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("stride").unwrap();
    cmd.current_dir(tmp.path())
        .env("STRIDE_CONFIG", tmp.path().join("no-config.yaml"))
        .env_remove("STRIDE_MODEL")
        .env_remove("OPENAI_BASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// Basic CLI
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    stride(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("STRIDE"))
        .stdout(predicate::str::contains("--image"))
        .stdout(predicate::str::contains("stride_report.md"));
}

#[test]
fn test_version_displays() {
    let tmp = TempDir::new().unwrap();
    stride(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("stride"));
}

#[test]
fn test_image_flag_required() {
    let tmp = TempDir::new().unwrap();
    stride(&tmp)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--image"));
}

// ============================================================================
// Input validation
// ============================================================================

#[test]
fn test_missing_image_fails() {
    let tmp = TempDir::new().unwrap();
    stride(&tmp)
        .env("OPENAI_API_KEY", "sk-test")
        .args(["--image", "missing.png"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not found"));

    assert!(!tmp.path().join("stride_report.md").exists());
}

#[test]
fn test_missing_credential_fails() {
    let (tmp, image) = setup_workspace();
    stride(&tmp)
        .env_remove("OPENAI_API_KEY")
        .arg("--image")
        .arg(&image)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("OPENAI_API_KEY"));

    assert!(!tmp.path().join("stride_report.md").exists());
}

#[test]
fn test_credential_from_dotenv_file() {
    let (tmp, image) = setup_workspace();
    fs::write(tmp.path().join(".env"), "OPENAI_API_KEY=sk-from-dotenv\n").unwrap();
    let (base, server) = serve(vec![
        StubReply::completion(COMPONENTS),
        StubReply::completion(THREATS),
    ]);

    stride(&tmp)
        .env_remove("OPENAI_API_KEY")
        .arg("--image")
        .arg(&image)
        .args(["--api-base", &base, "--quiet"])
        .assert()
        .success();

    let requests = server.join().unwrap();
    assert!(requests[0]
        .to_lowercase()
        .contains("authorization: bearer sk-from-dotenv"));
}

#[test]
fn test_invalid_config_file_fails() {
    let (tmp, image) = setup_workspace();
    let config = tmp.path().join("config.yaml");
    fs::write(&config, "model_nmae: gpt-4o\n").unwrap();

    stride(&tmp)
        .env("OPENAI_API_KEY", "sk-test")
        .env("STRIDE_CONFIG", &config)
        .arg("--image")
        .arg(&image)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid config file"));
}

// ============================================================================
// End-to-end runs
// ============================================================================

#[test]
fn test_full_run_writes_report() {
    let (tmp, image) = setup_workspace();
    let (base, server) = serve(vec![
        StubReply::completion(COMPONENTS),
        StubReply::completion(THREATS),
    ]);

    stride(&tmp)
        .env("OPENAI_API_KEY", "sk-test")
        .arg("--image")
        .arg(&image)
        .args(["--output", "model.md", "--api-base", &base])
        .assert()
        .success()
        .stdout(predicate::str::contains("[1/3]"))
        .stdout(predicate::str::contains("Report written to"))
        .stdout(predicate::str::contains("model.md"))
        .stdout(predicate::str::contains("Components:   2"))
        .stdout(predicate::str::contains("Threats:      2"))
        .stdout(predicate::str::contains("Overall risk: 🟠 High"));

    let report = fs::read_to_string(tmp.path().join("model.md")).unwrap();
    assert!(report.starts_with("# 🛡️ STRIDE Threat Modeling Report"));
    assert!(report.contains("**Overall Risk Level:** 🟠 **High**"));
    assert!(report.contains("A two-tier web application."));
    assert!(report.contains("### Web App\n- → **Orders DB**: SQL over TLS"));
    assert!(report.contains("### 🔹 Orders DB (Database)"));
    assert!(report.contains("Sign cookies; Enforce MFA"));
    assert!(report.contains("🟡 Média"));

    let requests = server.join().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].starts_with("POST /v1/chat/completions"));
    assert!(requests[0].to_lowercase().contains("authorization: bearer sk-test"));
    assert!(requests[0].contains("\"model\":\"gpt-4o\""));
    assert!(requests[0].contains("data:image/png;base64,iVBORw0KGgo="));
    assert!(!requests[1].contains("image_url"));
    assert!(requests[1].contains("Orders DB"));
}

#[test]
fn test_model_name_flag_is_sent() {
    let (tmp, image) = setup_workspace();
    let (base, server) = serve(vec![
        StubReply::completion(COMPONENTS),
        StubReply::completion(THREATS),
    ]);

    stride(&tmp)
        .env("OPENAI_API_KEY", "sk-test")
        .env("STRIDE_MODEL", "from-env")
        .arg("--image")
        .arg(&image)
        .args(["--api-base", &base, "--model-name", "gpt-4.1-mini", "-q"])
        .assert()
        .success();

    let requests = server.join().unwrap();
    assert!(requests
        .iter()
        .all(|r| r.contains("\"model\":\"gpt-4.1-mini\"")));
}

#[test]
fn test_api_base_from_environment() {
    let (tmp, image) = setup_workspace();
    let (base, server) = serve(vec![
        StubReply::completion(COMPONENTS),
        StubReply::completion(THREATS),
    ]);

    stride(&tmp)
        .env("OPENAI_API_KEY", "sk-test")
        .env("OPENAI_BASE_URL", &base)
        .arg("--image")
        .arg(&image)
        .args(["--api-base", "", "-q"])
        .assert()
        .success();

    assert_eq!(server.join().unwrap().len(), 2);
}

#[test]
fn test_rate_limit_is_retried() {
    let (tmp, image) = setup_workspace();
    let (base, server) = serve(vec![
        StubReply::status(429).with_header("retry-after-ms", "10"),
        StubReply::completion(COMPONENTS),
        StubReply::completion(THREATS),
    ]);

    stride(&tmp)
        .env("OPENAI_API_KEY", "sk-test")
        .arg("--image")
        .arg(&image)
        .args(["--api-base", &base, "-q"])
        .assert()
        .success();

    assert_eq!(server.join().unwrap().len(), 3);
    assert!(tmp.path().join("stride_report.md").exists());
}

#[test]
fn test_rate_limit_exhausted_fails() {
    let (tmp, image) = setup_workspace();
    let (base, _server) = serve(vec![StubReply::status(429).with_header("retry-after", "0")]);

    stride(&tmp)
        .env("OPENAI_API_KEY", "sk-test")
        .arg("--image")
        .arg(&image)
        .args(["--api-base", &base, "--max-retries", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Rate limited"));

    assert!(!tmp.path().join("stride_report.md").exists());
}

#[test]
fn test_unauthorized_is_not_retried() {
    let (tmp, image) = setup_workspace();
    let (base, server) = serve(vec![StubReply::status(401)]);

    stride(&tmp)
        .env("OPENAI_API_KEY", "sk-wrong")
        .arg("--image")
        .arg(&image)
        .args(["--api-base", &base])
        .assert()
        .failure()
        .stderr(predicate::str::contains("401"));

    assert_eq!(server.join().unwrap().len(), 1);
}

#[test]
fn test_unparsable_reply_writes_no_report() {
    let (tmp, image) = setup_workspace();
    let (base, _server) = serve(vec![
        StubReply::completion(COMPONENTS),
        StubReply::completion("I'm unable to produce a threat model for this diagram."),
    ]);

    stride(&tmp)
        .env("OPENAI_API_KEY", "sk-test")
        .arg("--image")
        .arg(&image)
        .args(["--api-base", &base])
        .assert()
        .failure()
        .stderr(predicate::str::contains("threat analysis"));

    assert!(!tmp.path().join("stride_report.md").exists());
}
