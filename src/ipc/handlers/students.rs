use rusqlite::Connection;
use serde_json::json;
use tracing::{debug, info};

use super::respond;
use crate::ipc::error::{HandlerErr, HandlerResult};
use crate::ipc::params;
use crate::ipc::types::{AppState, Request};
use crate::ipc::views;
use crate::model::{ClassRef, ClassType, Role, Student};
use crate::session::Session;
use crate::store::{classes, students, users};

fn load(conn: &Connection, id: i64) -> Result<Student, HandlerErr> {
    students::get(conn, id)?.ok_or_else(|| HandlerErr::not_found("student"))
}

/// Students may only look at their own record.
pub(crate) fn ensure_can_view(
    conn: &Connection,
    session: &Session,
    student_id: i64,
) -> Result<(), HandlerErr> {
    if session.role() != Role::Student {
        return Ok(());
    }
    let own = students::find_by_user(conn, session.user_id())?;
    match own {
        Some(s) if s.id == student_id => Ok(()),
        _ => Err(HandlerErr::new(
            "forbidden",
            "students may only view their own record",
        )),
    }
}

fn administrative_class(conn: &Connection, class_id: i64) -> Result<ClassRef, HandlerErr> {
    let c = classes::get(conn, class_id)?.ok_or_else(|| HandlerErr::not_found("class"))?;
    if c.class_type() != ClassType::Administrative {
        return Err(HandlerErr::bad_params(format!(
            "{} is not an administrative class",
            c.class_name()
        )));
    }
    Ok(ClassRef {
        id: c.id,
        name: c.class_name().to_string(),
    })
}

fn apply_fields(
    conn: &Connection,
    s: &mut Student,
    params: &serde_json::Value,
) -> Result<(), HandlerErr> {
    if params::has(params, "externalId") {
        let external = params::required_text(params, "externalId")?;
        if students::student_id_taken(conn, &external, s.id)? {
            return Err(HandlerErr::conflict("student id already in use")
                .with_details(json!({ "externalId": external })));
        }
        s.student_id = external;
    }
    if params::has(params, "firstName") {
        s.first_name = params::required_text(params, "firstName")?;
    }
    if params::has(params, "middleName") {
        s.middle_name = params::optional_text(params, "middleName")?;
    }
    if params::has(params, "lastName") {
        s.last_name = params::required_text(params, "lastName")?;
    }
    if params::has(params, "email") {
        s.email = params::optional_text(params, "email")?;
    }
    if params::has(params, "department") {
        s.department = params::optional_text(params, "department")?;
    }
    if params::has(params, "userId") {
        let user_id = params::optional_id(params, "userId")?;
        if let Some(uid) = user_id {
            match users::get(conn, uid)? {
                Some(u) if u.role == Role::Student => {}
                Some(_) => return Err(HandlerErr::bad_params("linked user must have role STUDENT")),
                None => return Err(HandlerErr::not_found("user")),
            }
            if students::user_linked(conn, uid, s.id)? {
                return Err(HandlerErr::conflict("user already linked to another student")
                    .with_details(json!({ "userId": uid })));
            }
        }
        s.user_id = user_id;
    }
    if params::has(params, "administrativeClassId") {
        let class = params::optional_id(params, "administrativeClassId")?
            .map(|id| administrative_class(conn, id))
            .transpose()?;
        s.set_administrative_class(class);
    }
    Ok(())
}

fn students_list(state: &AppState) -> HandlerResult {
    let (conn, _) = state.authorize(&[Role::Admin, Role::Teacher])?;
    let list: Vec<_> = students::list(conn)?.iter().map(views::student).collect();
    Ok(json!({ "students": list }))
}

fn students_get(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, session) = state.authorize(&[])?;
    let id = params::required_id(params, "studentId")?;
    ensure_can_view(conn, session, id)?;
    Ok(json!({ "student": views::student(&load(conn, id)?) }))
}

fn students_create(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, session) = state.authorize(&[Role::Admin])?;
    params::required_text(params, "externalId")?;
    params::required_text(params, "firstName")?;
    params::required_text(params, "lastName")?;
    let mut s = Student::new(0);
    apply_fields(conn, &mut s, params)?;
    s.id = students::insert(conn, &s)?;
    info!(by = session.user_id(), student_id = s.id, "student created");
    Ok(json!({ "student": views::student(&s) }))
}

fn students_update(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, _) = state.authorize(&[Role::Admin])?;
    let mut s = load(conn, params::required_id(params, "studentId")?)?;
    apply_fields(conn, &mut s, params)?;
    students::update(conn, &s)?;
    Ok(json!({ "student": views::student(&s) }))
}

fn students_delete(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, session) = state.authorize(&[Role::Admin])?;
    let id = params::required_id(params, "studentId")?;
    if !students::delete(conn, id)? {
        return Err(HandlerErr::not_found("student"));
    }
    info!(by = session.user_id(), student_id = id, "student deleted");
    Ok(json!({ "deleted": true }))
}

fn students_add_subject(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, _) = state.authorize(&[Role::Admin, Role::Teacher])?;
    let mut s = load(conn, params::required_id(params, "studentId")?)?;
    let subject_id = params::required_id(params, "subjectId")?;
    let subject = classes::get(conn, subject_id)?.ok_or_else(|| HandlerErr::not_found("subject"))?;
    if subject.class_type() != ClassType::Subject {
        return Err(HandlerErr::bad_params(format!(
            "{} is not a subject class",
            subject.class_name()
        )));
    }

    let added = s.add_subject(subject.id, subject.class_name());
    if added {
        students::save_enrollments(conn, &s)?;
        debug!(student_id = s.id, subject_id, "subject added");
    }
    Ok(json!({ "added": added, "student": views::student(&s) }))
}

fn students_remove_subject(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, _) = state.authorize(&[Role::Admin, Role::Teacher])?;
    let mut s = load(conn, params::required_id(params, "studentId")?)?;
    let subject_id = params::required_id(params, "subjectId")?;

    let removed = s.remove_subject(subject_id);
    if removed {
        students::save_enrollments(conn, &s)?;
        debug!(student_id = s.id, subject_id, "subject removed");
    }
    Ok(json!({ "removed": removed, "student": views::student(&s) }))
}

fn students_set_administrative_class(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, _) = state.authorize(&[Role::Admin])?;
    let mut s = load(conn, params::required_id(params, "studentId")?)?;
    if !params::has(params, "classId") {
        return Err(HandlerErr::bad_params("missing classId"));
    }
    let class = params::optional_id(params, "classId")?
        .map(|id| administrative_class(conn, id))
        .transpose()?;
    s.set_administrative_class(class);
    students::update(conn, &s)?;
    Ok(json!({ "student": views::student(&s) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "students.list" => students_list(state),
        "students.get" => students_get(state, &req.params),
        "students.create" => students_create(state, &req.params),
        "students.update" => students_update(state, &req.params),
        "students.delete" => students_delete(state, &req.params),
        "students.addSubject" => students_add_subject(state, &req.params),
        "students.removeSubject" => students_remove_subject(state, &req.params),
        "students.setAdministrativeClass" => students_set_administrative_class(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
