use rusqlite::Connection;
use serde_json::json;
use tracing::{debug, info};

use super::respond;
use crate::ipc::error::{HandlerErr, HandlerResult};
use crate::ipc::params;
use crate::ipc::types::{AppState, Request};
use crate::ipc::views;
use crate::model::{classify, Class, Role};
use crate::store::classes::{self, ClassFilter};
use crate::store::{students, teachers};

fn load(conn: &Connection, id: i64) -> Result<Class, HandlerErr> {
    classes::get(conn, id)?.ok_or_else(|| HandlerErr::not_found("class"))
}

/// Copies the fields present in `params` onto `c`. The subject code is
/// applied before the name so a rename sees the new code.
fn apply_fields(
    conn: &Connection,
    c: &mut Class,
    params: &serde_json::Value,
) -> Result<(), HandlerErr> {
    if params::has(params, "subjectCode") {
        c.set_subject_code(params::optional_text(params, "subjectCode")?);
    }
    if params::has(params, "className") {
        // Untrimmed, so the short-name rule sees what `classes.classify` sees.
        c.set_class_name(params::required_raw_text(params, "className")?);
    }
    if params::has(params, "roomNumber") {
        c.room_number = params::optional_text(params, "roomNumber")?;
    }
    if params::has(params, "schedule") {
        c.schedule = params::optional_text(params, "schedule")?;
    }
    if params::has(params, "teacherId") {
        let teacher_id = params::optional_id(params, "teacherId")?;
        if let Some(tid) = teacher_id {
            if teachers::get(conn, tid)?.is_none() {
                return Err(HandlerErr::not_found("teacher"));
            }
        }
        c.teacher_id = teacher_id;
    }
    Ok(())
}

fn classes_list(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, _) = state.authorize(&[])?;
    let filter = ClassFilter {
        class_type: params::optional_tag(params, "classType")?,
        teacher_id: params::optional_id(params, "teacherId")?,
    };
    let list: Vec<_> = classes::list(conn, filter)?.iter().map(views::class).collect();
    Ok(json!({ "classes": list }))
}

fn classes_get(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, _) = state.authorize(&[])?;
    let c = load(conn, params::required_id(params, "classId")?)?;
    Ok(json!({ "class": views::class(&c) }))
}

fn classes_create(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, session) = state.authorize(&[Role::Admin])?;
    // Require the name up front; apply_fields treats it as optional.
    params::required_text(params, "className")?;
    let mut c = Class::default();
    apply_fields(conn, &mut c, params)?;
    let id = classes::insert(conn, &c)?;
    let c = load(conn, id)?;
    info!(
        by = session.user_id(),
        class_id = id,
        class_type = %c.class_type(),
        "class created"
    );
    Ok(json!({ "class": views::class(&c) }))
}

fn classes_update(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, _) = state.authorize(&[Role::Admin])?;
    let id = params::required_id(params, "classId")?;
    let mut c = load(conn, id)?;
    let before = c.class_type();
    apply_fields(conn, &mut c, params)?;

    // Memberships are typed by the class; a retype would strand them.
    if c.class_type() != before {
        let members = classes::member_count(conn, id)?;
        if members > 0 {
            return Err(HandlerErr::conflict("class type would change while students are assigned")
                .with_details(json!({
                    "from": before,
                    "to": c.class_type(),
                    "members": members
                })));
        }
        debug!(class_id = id, from = %before, to = %c.class_type(), "class retyped");
    }

    classes::update(conn, &c)?;
    let c = load(conn, id)?;
    Ok(json!({ "class": views::class(&c) }))
}

fn classes_delete(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, session) = state.authorize(&[Role::Admin])?;
    let id = params::required_id(params, "classId")?;
    if !classes::delete(conn, id)? {
        return Err(HandlerErr::not_found("class"));
    }
    info!(by = session.user_id(), class_id = id, "class deleted");
    Ok(json!({ "deleted": true }))
}

/// Previews the type a name/code pair would get, without touching storage.
fn classes_classify(params: &serde_json::Value) -> HandlerResult {
    let name = match params.get("className") {
        None => None,
        Some(v) if v.is_null() => None,
        Some(v) => Some(
            v.as_str()
                .ok_or_else(|| HandlerErr::bad_params("className must be string or null"))?,
        ),
    };
    let code = params::optional_text(params, "subjectCode")?;
    Ok(json!({ "classType": classify(name, code.as_deref()) }))
}

fn classes_roster(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, _) = state.authorize(&[Role::Admin, Role::Teacher])?;
    let c = load(conn, params::required_id(params, "classId")?)?;
    let members: Vec<_> = students::roster(conn, &c)?
        .iter()
        .map(views::student)
        .collect();
    Ok(json!({
        "class": views::class(&c),
        "students": members
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "classes.list" => classes_list(state, &req.params),
        "classes.get" => classes_get(state, &req.params),
        "classes.create" => classes_create(state, &req.params),
        "classes.update" => classes_update(state, &req.params),
        "classes.delete" => classes_delete(state, &req.params),
        "classes.classify" => classes_classify(&req.params),
        "classes.roster" => classes_roster(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
