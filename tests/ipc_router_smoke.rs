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

fn spawn_sidecar(extra_args: &[&str]) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_attendd");
    let mut child = Command::new(exe)
        .args(["--bcrypt-cost", "4"])
        .args(extra_args)
        .env_remove("ATTENDD_WORKSPACE")
        .env_remove("ATTENDD_THEMES_DIR")
        .env_remove("ATTENDD_ADMIN_PASSWORD")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn attendd");
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
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

const METHODS: &[&str] = &[
    "health",
    "workspace.select",
    "session.login",
    "session.logout",
    "session.current",
    "dashboard.open",
    "users.list",
    "users.create",
    "users.update",
    "users.delete",
    "teachers.list",
    "teachers.get",
    "teachers.create",
    "teachers.update",
    "teachers.delete",
    "teachers.syncClassCounts",
    "classes.list",
    "classes.get",
    "classes.create",
    "classes.update",
    "classes.delete",
    "classes.classify",
    "classes.roster",
    "students.list",
    "students.get",
    "students.create",
    "students.update",
    "students.delete",
    "students.addSubject",
    "students.removeSubject",
    "students.setAdministrativeClass",
    "attendance.record",
    "attendance.bulkRecord",
    "attendance.listForStudent",
    "attendance.listForDate",
    "attendance.summary",
    "attendance.delete",
    "notifications.send",
    "notifications.broadcast",
    "notifications.inbox",
    "notifications.markRead",
    "notifications.unreadCount",
    "notifications.delete",
];

#[test]
fn every_method_is_routed() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);
    for (i, method) in METHODS.iter().enumerate() {
        // Without a workspace most calls fail, but never as unknown methods.
        let resp = request(&mut stdin, &mut reader, &format!("m{}", i), method, json!({}));
        assert_ne!(error_code(&resp), Some("not_implemented"), "{}", method);
    }
    let unknown = request(&mut stdin, &mut reader, "x", "grades.compute", json!({}));
    assert_eq!(error_code(&unknown), Some("not_implemented"));
    drop(stdin);
    let _ = child.wait();
}

#[test]
fn malformed_lines_get_an_error_and_the_loop_continues() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);
    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read error line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse error line");
    assert_eq!(value["ok"], false);
    assert_eq!(error_code(&value), Some("bad_json"));

    let health = request_ok(&mut stdin, &mut reader, "h", "health", json!({}));
    assert!(health["version"].is_string());
    assert!(health["session"].is_null());
    drop(stdin);
    let _ = child.wait();
}

#[test]
fn teacher_records_follow_their_classes() {
    let workspace = temp_dir("attendd-teachers");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "l1",
        "session.login",
        json!({ "username": "admin", "password": "admin" }),
    );

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "t1",
        "teachers.create",
        json!({ "firstName": "Ada", "middleName": "K", "lastName": "Reyes", "department": "Science" }),
    );
    let teacher = &created["teacher"];
    assert_eq!(teacher["fullName"], "Ada K Reyes");
    let teacher_id = teacher["id"].as_i64().expect("teacher id");

    let bad_link = request(
        &mut stdin,
        &mut reader,
        "t2",
        "teachers.update",
        json!({ "teacherId": teacher_id, "userId": 1 }),
    );
    assert_eq!(error_code(&bad_link), Some("bad_params"));

    for (i, name) in ["Chemistry", "Physics Lab"].iter().enumerate() {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("c{}", i),
            "classes.create",
            json!({ "className": name, "teacherId": teacher_id }),
        );
    }
    let synced = request_ok(&mut stdin, &mut reader, "s1", "teachers.syncClassCounts", json!({}));
    assert!(synced["updated"].as_i64().unwrap_or(0) >= 1);
    let fetched = request_ok(
        &mut stdin,
        &mut reader,
        "t3",
        "teachers.get",
        json!({ "teacherId": teacher_id }),
    );
    assert_eq!(fetched["teacher"]["classesAssigned"], 2);

    let taught = request_ok(
        &mut stdin,
        &mut reader,
        "c3",
        "classes.list",
        json!({ "teacherId": teacher_id }),
    );
    let taught = taught["classes"].as_array().cloned().unwrap_or_default();
    assert_eq!(taught.len(), 2);
    assert_eq!(taught[0]["teacherName"], "Ada K Reyes");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "t4",
        "teachers.delete",
        json!({ "teacherId": teacher_id }),
    );
    let orphaned = request_ok(&mut stdin, &mut reader, "c4", "classes.list", json!({}));
    let orphaned = orphaned["classes"].as_array().cloned().unwrap_or_default();
    assert!(orphaned.iter().all(|c| c["teacherId"].is_null()));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn an_account_links_to_one_profile_at_most() {
    let workspace = temp_dir("attendd-account-links");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "l1",
        "session.login",
        json!({ "username": "admin", "password": "admin" }),
    );

    let tutor = request_ok(
        &mut stdin,
        &mut reader,
        "u1",
        "users.create",
        json!({ "username": "tutor", "password": "pw", "role": "TEACHER", "name": "Tutor" }),
    );
    let tutor_id = tutor["user"]["id"].as_i64().expect("tutor id");
    let first = request_ok(
        &mut stdin,
        &mut reader,
        "t1",
        "teachers.create",
        json!({ "firstName": "Ola", "lastName": "Berg", "userId": tutor_id }),
    );
    let first_id = first["teacher"]["id"].as_i64().expect("teacher id");
    let second = request(
        &mut stdin,
        &mut reader,
        "t2",
        "teachers.create",
        json!({ "firstName": "Per", "lastName": "Lund", "userId": tutor_id }),
    );
    assert_eq!(error_code(&second), Some("conflict"));
    // Re-saving the same link is fine.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "t3",
        "teachers.update",
        json!({ "teacherId": first_id, "userId": tutor_id, "phone": "555-0100" }),
    );

    let pupil = request_ok(
        &mut stdin,
        &mut reader,
        "u2",
        "users.create",
        json!({ "username": "pupil", "password": "pw", "role": "STUDENT", "name": "Pupil" }),
    );
    let pupil_id = pupil["user"]["id"].as_i64().expect("pupil id");
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "s1",
        "students.create",
        json!({ "externalId": "P-1", "firstName": "Ida", "lastName": "Moe", "userId": pupil_id }),
    );
    let other = request_ok(
        &mut stdin,
        &mut reader,
        "s2",
        "students.create",
        json!({ "externalId": "P-2", "firstName": "Eli", "lastName": "Moe" }),
    );
    let relink = request(
        &mut stdin,
        &mut reader,
        "s3",
        "students.update",
        json!({ "studentId": other["student"]["id"], "userId": pupil_id }),
    );
    assert_eq!(error_code(&relink), Some("conflict"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
