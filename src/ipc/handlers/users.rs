use serde_json::json;
use tracing::{debug, info};

use super::respond;
use crate::ipc::error::{HandlerErr, HandlerResult};
use crate::ipc::params;
use crate::ipc::types::{AppState, Request};
use crate::model::{Role, User};
use crate::store::users;

fn hash_password(state: &AppState, password: &str) -> Result<String, HandlerErr> {
    if password.is_empty() {
        return Err(HandlerErr::bad_params("password must not be empty"));
    }
    bcrypt::hash(password, state.config.bcrypt_cost)
        .map_err(|e| HandlerErr::new("hash_failed", e.to_string()))
}

fn users_list(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, _) = state.authorize(&[Role::Admin])?;
    let role = params::optional_tag::<Role>(params, "role")?;
    let list = users::list(conn, role)?;
    Ok(json!({ "users": list }))
}

fn users_create(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, session) = state.authorize(&[Role::Admin])?;
    let username = params::required_text(params, "username")?;
    let password = params::required_str(params, "password")?;
    let role = params::required_tag::<Role>(params, "role")?;
    let name = params::required_text(params, "name")?;
    let email = params::optional_text(params, "email")?;

    if users::username_taken(conn, &username, 0)? {
        return Err(HandlerErr::conflict("username already exists")
            .with_details(json!({ "username": username })));
    }
    let mut user = User {
        id: 0,
        username,
        password_hash: hash_password(state, &password)?,
        role,
        name,
        email,
    };
    user.id = users::insert(conn, &user)?;
    info!(by = session.user_id(), user_id = user.id, role = %user.role, "user created");
    Ok(json!({ "user": user }))
}

fn users_update(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, session) = state.authorize(&[Role::Admin])?;
    let user_id = params::required_id(params, "userId")?;
    let Some(mut user) = users::get(conn, user_id)? else {
        return Err(HandlerErr::not_found("user"));
    };

    if params::has(params, "username") {
        let username = params::required_text(params, "username")?;
        if users::username_taken(conn, &username, user.id)? {
            return Err(HandlerErr::conflict("username already exists")
                .with_details(json!({ "username": username })));
        }
        user.username = username;
    }
    if params::has(params, "password") {
        user.password_hash = hash_password(state, &params::required_str(params, "password")?)?;
    }
    if params::has(params, "role") {
        let role = params::required_tag::<Role>(params, "role")?;
        if user.role == Role::Admin && role != Role::Admin && users::count_admins(conn)? <= 1 {
            return Err(HandlerErr::conflict("cannot demote the last admin"));
        }
        user.role = role;
    }
    if params::has(params, "name") {
        user.name = params::required_text(params, "name")?;
    }
    if params::has(params, "email") {
        user.email = params::optional_text(params, "email")?;
    }

    users::update(conn, &user)?;
    info!(by = session.user_id(), user_id = user.id, "user updated");
    let own_account = user.id == session.user_id();

    // Role checks read the session copy, so it must follow the stored row.
    if own_account {
        if let Some(s) = state.session.as_mut() {
            s.user = user.clone();
            debug!(user_id = user.id, role = %user.role, "session user refreshed");
        }
    }
    Ok(json!({ "user": user }))
}

fn users_delete(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, session) = state.authorize(&[Role::Admin])?;
    let user_id = params::required_id(params, "userId")?;
    if user_id == session.user_id() {
        return Err(HandlerErr::conflict("cannot delete the signed-in user"));
    }
    let Some(user) = users::get(conn, user_id)? else {
        return Err(HandlerErr::not_found("user"));
    };
    if user.is_admin() && users::count_admins(conn)? <= 1 {
        return Err(HandlerErr::conflict("cannot delete the last admin"));
    }
    users::delete(conn, user_id)?;
    info!(by = session.user_id(), user_id, "user deleted");
    Ok(json!({ "deleted": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "users.list" => users_list(state, &req.params),
        "users.create" => users_create(state, &req.params),
        "users.update" => users_update(state, &req.params),
        "users.delete" => users_delete(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
