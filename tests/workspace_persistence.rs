use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_hangmand");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn hangmand");
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
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "expected ok response for {}, got {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn request_code(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> String {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "expected error response for {}, got {}",
        method,
        value
    );
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string()
}

fn spawn_unseeded() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_hangmand");
    let mut child = Command::new(exe)
        .env("HANGMAN_SEED_DEFAULTS", "false")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn hangmand");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

#[test]
fn committed_changes_survive_a_restart() {
    let workspace = temp_dir("hangman-persist");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "session.set",
        json!({ "id": 4, "role": "ADMIN" }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "words.create",
        json!({ "word": "orbit", "classId": 2, "mentorId": 1 }),
    );
    // Rejected; must not reach disk.
    request_code(
        &mut stdin,
        &mut reader,
        "4",
        "classes.delete",
        json!({ "classId": 1 }),
    );
    let before = request_ok(&mut stdin, &mut reader, "5", "snapshot.get", json!({}));
    drop(stdin);
    let _ = child.wait();

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(opened["counts"]["words"].as_u64(), Some(3));
    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "session.set",
        json!({ "id": 4, "role": "ADMIN" }),
    );
    let after = request_ok(&mut stdin, &mut reader, "3", "snapshot.get", json!({}));
    assert_eq!(before, after);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn unseeded_workspace_starts_empty() {
    let workspace = temp_dir("hangman-unseeded");
    let (mut child, mut stdin, mut reader) = spawn_unseeded();
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(opened["counts"]["users"].as_u64(), Some(0));
    assert_eq!(opened["counts"]["classes"].as_u64(), Some(0));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn stored_rows_are_repaired_on_load() {
    let workspace = temp_dir("hangman-repair");
    {
        let conn = rusqlite::Connection::open(workspace.join("hangman.sqlite3")).expect("open db");
        conn.execute(
            "CREATE TABLE snapshot_entries(key TEXT PRIMARY KEY, value TEXT NOT NULL, updated_at TEXT)",
            [],
        )
        .expect("create table");
        let rows = [
            ("classesData", json!([{ "id": 1, "name": "Class A" }]).to_string()),
            (
                "usersData",
                json!([
                    { "id": 1, "username": "teacher1", "role": "MANAGER", "password": "plain1" },
                    { "id": 2, "username": "admin", "role": "ADMIN", "password": "plain2" }
                ])
                .to_string(),
            ),
            ("teacherAssignments", json!([{ "teacherId": 1, "classId": 1 }]).to_string()),
            (
                "wordsData",
                json!([
                    { "id": 1, "word": "ADVENTURE", "classId": 1, "mentorId": 1 },
                    { "id": 2, "word": "ORPHAN", "classId": 7, "mentorId": 1 }
                ])
                .to_string(),
            ),
            ("studentAssignments", "{broken".to_string()),
        ];
        for (key, value) in rows {
            conn.execute(
                "INSERT INTO snapshot_entries(key, value) VALUES(?, ?)",
                (key, value),
            )
            .expect("insert row");
        }
    }

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(opened["counts"]["users"].as_u64(), Some(2));
    assert_eq!(opened["counts"]["words"].as_u64(), Some(1));

    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "session.set",
        json!({ "id": 2, "role": "ADMIN" }),
    );
    let snap = request_ok(&mut stdin, &mut reader, "3", "snapshot.get", json!({}));
    let users = snap["snapshot"]["usersData"].as_array().expect("users");
    for u in users {
        assert!(u.get("password").is_none());
        let hash = u["passwordHash"].as_str().expect("hash");
        assert!(hash.starts_with("$argon2"), "not hashed: {hash}");
        assert!(!hash.contains("plain"));
    }
    assert_eq!(snap["snapshot"]["studentAssignments"], json!([]));

    drop(stdin);
    let _ = child.wait();

    // The repaired form is what is stored now.
    let conn = rusqlite::Connection::open(workspace.join("hangman.sqlite3")).expect("reopen db");
    let stored: String = conn
        .query_row(
            "SELECT value FROM snapshot_entries WHERE key = 'usersData'",
            [],
            |r| r.get(0),
        )
        .expect("users row");
    assert!(!stored.contains("plain1"));
    drop(conn);
    let _ = std::fs::remove_dir_all(workspace);
}
