use chrono::NaiveDate;
use rusqlite::Connection;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use super::respond;
use super::students::ensure_can_view;
use crate::ipc::error::{HandlerErr, HandlerResult};
use crate::ipc::params;
use crate::ipc::types::{AppState, Request};
use crate::model::{AttendanceStatus, Notification, NotificationType, Role, Student};
use crate::session::Session;
use crate::store::{attendance, classes, notifications, students};

/// Tells the student's linked account about an absence or late arrival.
/// Re-recording the status a day already had sends nothing. Returns
/// whether a notification was written.
fn send_alert(
    conn: &Connection,
    session: &Session,
    student: &Student,
    date: NaiveDate,
    status: AttendanceStatus,
    previous: Option<AttendanceStatus>,
) -> Result<bool, HandlerErr> {
    if !status.raises_alert() || previous == Some(status) {
        return Ok(false);
    }
    let Some(receiver) = student.user_id else {
        return Ok(false);
    };
    let n = Notification::new(
        session.user_id(),
        session.user.name.clone(),
        receiver,
        format!("Marked {} on {}", status.as_str().to_ascii_lowercase(), date),
        format!(
            "{} was recorded as {} on {}.",
            student.full_name(),
            status,
            date
        ),
        NotificationType::AttendanceAlert,
    );
    notifications::insert(conn, &n)?;
    debug!(student_id = student.id, receiver, %status, "attendance alert sent");
    Ok(true)
}

fn attendance_record(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, session) = state.authorize(&[Role::Admin, Role::Teacher])?;
    let student_id = params::required_id(params, "studentId")?;
    let date = params::required_date(params, "date")?;
    let status = params::required_tag::<AttendanceStatus>(params, "status")?;
    let remarks = params::optional_text(params, "remarks")?;

    let student = students::get(conn, student_id)?.ok_or_else(|| HandlerErr::not_found("student"))?;
    let tx = conn.unchecked_transaction()?;
    let previous = attendance::find(&tx, student_id, date)?.map(|a| a.status);
    let record = attendance::upsert(&tx, student_id, date, status, remarks.as_deref())?;
    let alert_sent = send_alert(&tx, session, &student, date, status, previous)?;
    tx.commit()?;
    Ok(json!({ "record": record, "alertSent": alert_sent }))
}

/// Stamps one status on many students for one day. Unknown ids are skipped.
fn attendance_bulk_record(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, session) = state.authorize(&[Role::Admin, Role::Teacher])?;
    let mut student_ids = params::id_list(params, "studentIds")?;
    let mut seen = HashSet::new();
    student_ids.retain(|id| seen.insert(*id));
    let date = params::required_date(params, "date")?;
    let status = params::required_tag::<AttendanceStatus>(params, "status")?;
    let remarks = params::optional_text(params, "remarks")?;

    let tx = conn.unchecked_transaction()?;
    let mut recorded = 0usize;
    let mut alerts = 0usize;
    let mut skipped = Vec::new();
    for sid in student_ids {
        let Some(student) = students::get(&tx, sid)? else {
            skipped.push(sid);
            continue;
        };
        let previous = attendance::find(&tx, sid, date)?.map(|a| a.status);
        attendance::upsert(&tx, sid, date, status, remarks.as_deref())?;
        recorded += 1;
        if send_alert(&tx, session, &student, date, status, previous)? {
            alerts += 1;
        }
    }
    tx.commit()?;
    info!(by = session.user_id(), %date, %status, recorded, skipped = skipped.len(), "bulk attendance recorded");
    Ok(json!({
        "recorded": recorded,
        "alertsSent": alerts,
        "skipped": skipped
    }))
}

fn attendance_list_for_student(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, session) = state.authorize(&[])?;
    let student_id = params::required_id(params, "studentId")?;
    ensure_can_view(conn, session, student_id)?;
    if !students::exists(conn, student_id)? {
        return Err(HandlerErr::not_found("student"));
    }
    let from = params::optional_date(params, "from")?;
    let to = params::optional_date(params, "to")?;
    let records = attendance::list_for_student(conn, student_id, from, to)?;
    Ok(json!({ "records": records }))
}

/// The class roster for a day with each student's record, or null when
/// nothing was recorded.
fn attendance_list_for_date(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, _) = state.authorize(&[Role::Admin, Role::Teacher])?;
    let class_id = params::required_id(params, "classId")?;
    let date = params::required_date(params, "date")?;
    let class = classes::get(conn, class_id)?.ok_or_else(|| HandlerErr::not_found("class"))?;
    let roster = students::roster(conn, &class)?;
    let ids: Vec<i64> = roster.iter().map(|s| s.id).collect();
    let mut by_student: HashMap<i64, _> = attendance::list_for_date(conn, date, &ids)?
        .into_iter()
        .map(|a| (a.student_id, a))
        .collect();
    let rows: Vec<_> = roster
        .iter()
        .map(|s| {
            json!({
                "studentId": s.id,
                "fullName": s.full_name(),
                "record": by_student.remove(&s.id),
            })
        })
        .collect();
    Ok(json!({
        "classId": class.id,
        "date": date,
        "rows": rows
    }))
}

fn attendance_summary(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, session) = state.authorize(&[])?;
    let student_id = params::required_id(params, "studentId")?;
    ensure_can_view(conn, session, student_id)?;
    if !students::exists(conn, student_id)? {
        return Err(HandlerErr::not_found("student"));
    }
    let counts = attendance::summary(conn, student_id)?;
    let total: i64 = counts.values().sum();
    Ok(json!({
        "studentId": student_id,
        "counts": counts,
        "total": total
    }))
}

fn attendance_delete(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, _) = state.authorize(&[Role::Admin, Role::Teacher])?;
    let id = params::required_id(params, "attendanceId")?;
    if attendance::get(conn, id)?.is_none() {
        return Err(HandlerErr::not_found("attendance record"));
    }
    attendance::delete(conn, id)?;
    Ok(json!({ "deleted": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "attendance.record" => attendance_record(state, &req.params),
        "attendance.bulkRecord" => attendance_bulk_record(state, &req.params),
        "attendance.listForStudent" => attendance_list_for_student(state, &req.params),
        "attendance.listForDate" => attendance_list_for_date(state, &req.params),
        "attendance.summary" => attendance_summary(state, &req.params),
        "attendance.delete" => attendance_delete(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
