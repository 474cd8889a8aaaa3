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

#[test]
fn export_then_import_restores_the_dataset() {
    let workspace = temp_dir("hangman-backup");
    let bundle = workspace.join("out").join("snapshot.zip");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let code = request_code(
        &mut stdin,
        &mut reader,
        "0",
        "session.set",
        json!({ "id": 4, "role": "OWNER" }),
    );
    assert_eq!(code, "bad_params");
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "session.set",
        json!({ "id": 4, "role": "ADMIN" }),
    );
    // Without a workspace there is nowhere to import into.
    let code = request_code(
        &mut stdin,
        &mut reader,
        "2",
        "backup.import",
        json!({ "inPath": bundle.to_string_lossy() }),
    );
    assert_eq!(code, "no_workspace");

    request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "backup.export",
        json!({ "outPath": bundle.to_string_lossy() }),
    );
    assert_eq!(exported["bundleFormat"].as_str(), Some("hangman-snapshot-v1"));
    assert_eq!(exported["sha256"].as_str().map(str::len), Some(64));
    let before = request_ok(&mut stdin, &mut reader, "5", "snapshot.get", json!({}));

    request_ok(&mut stdin, &mut reader, "6", "words.delete", json!({ "wordId": 2 }));
    request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "classes.create",
        json!({ "name": "Scratch" }),
    );

    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "backup.import",
        json!({ "inPath": bundle.to_string_lossy() }),
    );
    assert_eq!(imported["bundleFormatDetected"].as_str(), Some("hangman-snapshot-v1"));
    assert_eq!(imported["droppedRows"].as_u64(), Some(0));
    let after = request_ok(&mut stdin, &mut reader, "9", "snapshot.get", json!({}));
    assert_eq!(before, after);

    let code = request_code(
        &mut stdin,
        &mut reader,
        "10",
        "backup.import",
        json!({ "inPath": workspace.join("missing.zip").to_string_lossy() }),
    );
    assert_eq!(code, "not_found");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn raw_json_dump_imports_and_drops_dangling_rows() {
    let workspace = temp_dir("hangman-raw-import");
    let dump = workspace.join("dump.json");
    std::fs::write(
        &dump,
        json!({
            "classesData": [{ "id": 1, "name": "Class A" }],
            "usersData": [
                { "id": 1, "username": "teacher1", "role": "MANAGER", "password": "pw" },
                { "id": 9, "username": "admin", "role": "ADMIN", "password": "pw" }
            ],
            "teacherAssignments": [
                { "teacherId": 1, "classId": 1 },
                { "teacherId": 1, "classId": 5 }
            ],
            "wordsData": [{ "id": 1, "word": "ADVENTURE", "classId": 1, "mentorId": 1 }],
            "studentAssignments": []
        })
        .to_string(),
    )
    .expect("write dump");

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
    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "backup.import",
        json!({ "inPath": dump.to_string_lossy() }),
    );
    assert_eq!(imported["bundleFormatDetected"].as_str(), Some("raw-json"));
    assert_eq!(imported["droppedRows"].as_u64(), Some(1));
    assert_eq!(imported["counts"]["users"].as_u64(), Some(2));

    let teachers = request_ok(&mut stdin, &mut reader, "4", "teachers.list", json!({}));
    assert_eq!(teachers["assignments"].as_array().map(|a| a.len()), Some(1));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn browser_storage_dump_with_string_values_imports() {
    let workspace = temp_dir("hangman-storage-dump");
    let dump = workspace.join("local-storage.json");
    // Each localStorage value is itself a JSON document.
    std::fs::write(
        &dump,
        json!({
            "classesData": json!([
                { "id": 1, "name": "Class A", "description": "Advanced Level" }
            ])
            .to_string(),
            "usersData": json!([
                { "id": 1, "username": "teacher1", "role": "MANAGER", "password": "pw" },
                { "id": 2, "username": "kid", "role": "USER", "password": "pw" }
            ])
            .to_string(),
            "teacherAssignments": json!([{ "teacherId": 1, "classId": 1 }]).to_string(),
            "studentAssignments": json!([{ "studentId": 2, "classId": 1, "teacherId": 1 }])
                .to_string(),
            "wordsData": json!([
                { "id": 1, "word": "ADVENTURE", "classId": 1, "mentorId": 1 }
            ])
            .to_string()
        })
        .to_string(),
    )
    .expect("write dump");

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
    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "backup.import",
        json!({ "inPath": dump.to_string_lossy() }),
    );
    assert_eq!(imported["bundleFormatDetected"].as_str(), Some("raw-json"));
    assert_eq!(imported["corruptKeys"], json!([]));
    assert_eq!(imported["droppedRows"].as_u64(), Some(0));
    assert_eq!(imported["counts"]["users"].as_u64(), Some(2));
    assert_eq!(imported["counts"]["classes"].as_u64(), Some(1));
    assert_eq!(imported["counts"]["words"].as_u64(), Some(1));

    let roster = request_ok(&mut stdin, &mut reader, "4", "students.list", json!({}));
    assert_eq!(roster["students"][0]["className"].as_str(), Some("Class A"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
