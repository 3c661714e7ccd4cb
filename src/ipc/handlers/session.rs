use serde_json::json;
use tracing::{info, warn};

use super::respond;
use crate::dashboard::DashboardView;
use crate::ipc::error::{HandlerErr, HandlerResult};
use crate::ipc::params;
use crate::ipc::types::{AppState, Request};
use crate::ipc::views;
use crate::model::Role;
use crate::session::{ActiveView, Session};
use crate::store::{notifications, students, teachers, users};

fn session_login(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let username = params::required_text(params, "username")?;
    let password = params::required_str(params, "password")?;
    let conn = state.conn()?;

    let user = users::find_by_username(conn, &username)?;
    let verified = user
        .as_ref()
        .map(|u| bcrypt::verify(&password, &u.password_hash).unwrap_or(false))
        .unwrap_or(false);
    let Some(user) = user.filter(|_| verified) else {
        warn!(username = %username, "login rejected");
        return Err(HandlerErr::new(
            "invalid_credentials",
            "unknown username or wrong password",
        ));
    };

    let session = Session::open(user);
    info!(session = %session.id, user_id = session.user_id(), role = %session.role(), "session opened");
    let result = json!({ "session": session });
    state.session = Some(session);
    Ok(result)
}

fn session_logout(state: &mut AppState) -> HandlerResult {
    let closed = state.session.take();
    if let Some(s) = &closed {
        info!(session = %s.id, user_id = s.user_id(), "session closed");
    }
    Ok(json!({ "closed": closed.is_some() }))
}

fn session_current(state: &AppState) -> HandlerResult {
    Ok(json!({ "session": state.session }))
}

/// Switches the session to the dashboard and returns everything the
/// role's dashboard needs to render.
fn dashboard_open(state: &mut AppState) -> HandlerResult {
    let conn = state
        .db
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))?;
    let session = state
        .session
        .as_mut()
        .ok_or_else(|| HandlerErr::new("no_session", "log in first"))?;
    session.active_view = ActiveView::Dashboard;

    let view = DashboardView::for_role(session.role(), state.config.themes_dir.as_deref());
    let unread = notifications::unread_count(conn, session.user_id())?;
    let profile = match session.role() {
        Role::Admin => serde_json::Value::Null,
        Role::Teacher => teachers::find_by_user(conn, session.user_id())?
            .map(|t| views::teacher(&t))
            .unwrap_or(serde_json::Value::Null),
        Role::Student => students::find_by_user(conn, session.user_id())?
            .map(|s| views::student(&s))
            .unwrap_or(serde_json::Value::Null),
    };

    Ok(json!({
        "session": session,
        "dashboard": view,
        "profile": profile,
        "unreadNotifications": unread,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "session.login" => session_login(state, &req.params),
        "session.logout" => session_logout(state),
        "session.current" => session_current(state),
        "dashboard.open" => dashboard_open(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
