use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_conductbookd");
    let mut child = Command::new(exe)
        .args(["--argon2-memory-kib", "1024", "--argon2-iterations", "1"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn conductbookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> &str {
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false), "{}", value);
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

#[test]
fn register_then_login_returns_account_without_password() {
    let workspace = tempfile::tempdir().expect("temp dir");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.path().to_string_lossy() }),
    );
    let registered = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "auth.register",
        json!({
            "name": "Asha Rao",
            "email": "Asha.Rao@College.edu",
            "password": "secret123",
            "role": "TEACHER"
        }),
    );
    let user = &registered["user"];
    assert_eq!(user["email"], "asha.rao@college.edu");
    assert_eq!(user["role"], "TEACHER");
    assert!(user.get("password").is_none());
    assert!(user.get("passwordHash").is_none());

    let logged_in = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "auth.login",
        json!({ "email": "ASHA.RAO@college.edu", "password": "secret123" }),
    );
    assert_eq!(logged_in["user"]["id"], user["id"]);
    assert_eq!(logged_in["user"]["email"], user["email"]);
    assert_eq!(logged_in["user"]["role"], "TEACHER");
    assert!(logged_in["user"].get("password").is_none());

    let session = request_ok(&mut stdin, &mut reader, "4", "session.get", json!({}));
    assert_eq!(session["user"]["name"], "Asha Rao");
    drop(stdin);
    let _ = child.wait();
}

#[test]
fn duplicate_and_bad_credentials_are_reported() {
    let workspace = tempfile::tempdir().expect("temp dir");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.path().to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "auth.register",
        json!({ "name": "A", "email": "a@college.edu", "password": "pw1234", "role": "ADMIN" }),
    );

    let dup = request(
        &mut stdin,
        &mut reader,
        "3",
        "auth.register",
        json!({ "name": "B", "email": "A@COLLEGE.EDU", "password": "other1", "role": "STUDENT" }),
    );
    assert_eq!(error_code(&dup), "duplicate_account");

    let wrong = request(
        &mut stdin,
        &mut reader,
        "4",
        "auth.login",
        json!({ "email": "a@college.edu", "password": "nope" }),
    );
    assert_eq!(error_code(&wrong), "invalid_credentials");
    assert!(wrong.get("result").is_none());

    let session = request_ok(&mut stdin, &mut reader, "5", "session.get", json!({}));
    assert!(session["user"].is_null());

    let bad_role = request(
        &mut stdin,
        &mut reader,
        "6",
        "auth.register",
        json!({ "name": "C", "email": "c@college.edu", "password": "pw1234", "role": "DEAN" }),
    );
    assert_eq!(error_code(&bad_role), "bad_params");
    drop(stdin);
    let _ = child.wait();
}

#[test]
fn password_reset_is_a_stub_that_checks_the_email() {
    let workspace = tempfile::tempdir().expect("temp dir");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.path().to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "auth.register",
        json!({ "name": "A", "email": "a@college.edu", "password": "pw1234", "role": "TEACHER" }),
    );

    let sent = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "auth.resetPassword",
        json!({ "email": "a@college.edu" }),
    );
    assert_eq!(sent["delivered"], false);
    assert!(sent["message"].as_str().unwrap_or("").contains("reset link"));

    let unknown = request(
        &mut stdin,
        &mut reader,
        "4",
        "auth.resetPassword",
        json!({ "email": "ghost@college.edu" }),
    );
    assert_eq!(error_code(&unknown), "unknown_email");
    drop(stdin);
    let _ = child.wait();
}

#[test]
fn auth_requires_a_workspace() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "auth.login",
        json!({ "email": "a@college.edu", "password": "pw1234" }),
    );
    assert_eq!(error_code(&resp), "no_workspace");
    drop(stdin);
    let _ = child.wait();
}
