use rusqlite::Connection;
use serde_json::json;
use tracing::info;

use super::respond;
use crate::ipc::error::{HandlerErr, HandlerResult};
use crate::ipc::params;
use crate::ipc::types::{AppState, Request};
use crate::ipc::views;
use crate::model::{Role, Teacher};
use crate::store::{teachers, users};

/// Linked accounts must exist, carry the teacher role and belong to no
/// other teacher.
fn check_user_link(conn: &Connection, t: &Teacher) -> Result<(), HandlerErr> {
    let Some(uid) = t.user_id else {
        return Ok(());
    };
    match users::get(conn, uid)? {
        Some(u) if u.role == Role::Teacher => {}
        Some(_) => return Err(HandlerErr::bad_params("linked user must have role TEACHER")),
        None => return Err(HandlerErr::not_found("user")),
    }
    if teachers::user_linked(conn, uid, t.id)? {
        return Err(HandlerErr::conflict("user already linked to another teacher")
            .with_details(json!({ "userId": uid })));
    }
    Ok(())
}

/// Copies the fields present in `params` onto `t`.
fn apply_fields(t: &mut Teacher, params: &serde_json::Value) -> Result<(), HandlerErr> {
    if params::has(params, "firstName") {
        t.first_name = params::required_text(params, "firstName")?;
    }
    if params::has(params, "middleName") {
        t.middle_name = params::optional_text(params, "middleName")?;
    }
    if params::has(params, "lastName") {
        t.last_name = params::required_text(params, "lastName")?;
    }
    if params::has(params, "email") {
        t.email = params::optional_text(params, "email")?;
    }
    if params::has(params, "department") {
        t.department = params::optional_text(params, "department")?;
    }
    if params::has(params, "phone") {
        t.phone = params::optional_text(params, "phone")?;
    }
    if params::has(params, "userId") {
        t.user_id = params::optional_id(params, "userId")?;
    }
    Ok(())
}

fn teachers_list(state: &AppState) -> HandlerResult {
    let (conn, _) = state.authorize(&[Role::Admin, Role::Teacher])?;
    let list: Vec<_> = teachers::list(conn)?.iter().map(views::teacher).collect();
    Ok(json!({ "teachers": list }))
}

fn teachers_get(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, _) = state.authorize(&[])?;
    let id = params::required_id(params, "teacherId")?;
    let t = teachers::get(conn, id)?.ok_or_else(|| HandlerErr::not_found("teacher"))?;
    Ok(json!({ "teacher": views::teacher(&t) }))
}

fn teachers_create(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, session) = state.authorize(&[Role::Admin])?;
    let mut t = Teacher {
        first_name: params::required_text(params, "firstName")?,
        last_name: params::required_text(params, "lastName")?,
        ..Default::default()
    };
    apply_fields(&mut t, params)?;
    check_user_link(conn, &t)?;
    t.id = teachers::insert(conn, &t)?;
    info!(by = session.user_id(), teacher_id = t.id, "teacher created");
    Ok(json!({ "teacher": views::teacher(&t) }))
}

fn teachers_update(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, _) = state.authorize(&[Role::Admin])?;
    let id = params::required_id(params, "teacherId")?;
    let mut t = teachers::get(conn, id)?.ok_or_else(|| HandlerErr::not_found("teacher"))?;
    apply_fields(&mut t, params)?;
    check_user_link(conn, &t)?;
    teachers::update(conn, &t)?;
    Ok(json!({ "teacher": views::teacher(&t) }))
}

fn teachers_delete(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, session) = state.authorize(&[Role::Admin])?;
    let id = params::required_id(params, "teacherId")?;
    if !teachers::delete(conn, id)? {
        return Err(HandlerErr::not_found("teacher"));
    }
    info!(by = session.user_id(), teacher_id = id, "teacher deleted");
    Ok(json!({ "deleted": true }))
}

fn teachers_sync_class_counts(state: &AppState) -> HandlerResult {
    let (conn, _) = state.authorize(&[Role::Admin])?;
    let updated = teachers::sync_class_counts(conn)?;
    Ok(json!({ "updated": updated }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "teachers.list" => teachers_list(state),
        "teachers.get" => teachers_get(state, &req.params),
        "teachers.create" => teachers_create(state, &req.params),
        "teachers.update" => teachers_update(state, &req.params),
        "teachers.delete" => teachers_delete(state, &req.params),
        "teachers.syncClassCounts" => teachers_sync_class_counts(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
