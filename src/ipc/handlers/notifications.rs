use serde_json::json;
use tracing::info;

use super::respond;
use crate::ipc::error::{HandlerErr, HandlerResult};
use crate::ipc::params;
use crate::ipc::types::{AppState, Request};
use crate::model::{Notification, NotificationType, Role};
use crate::store::{notifications, users};

fn notification_type(params: &serde_json::Value) -> Result<NotificationType, HandlerErr> {
    Ok(params::optional_tag::<NotificationType>(params, "type")?.unwrap_or_default())
}

fn notifications_send(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, session) = state.authorize(&[])?;
    let receiver_id = params::required_id(params, "receiverId")?;
    let title = params::required_text(params, "title")?;
    let message = params::required_text(params, "message")?;
    let kind = notification_type(params)?;
    if users::get(conn, receiver_id)?.is_none() {
        return Err(HandlerErr::not_found("receiver"));
    }

    let mut n = Notification::new(
        session.user_id(),
        session.user.name.clone(),
        receiver_id,
        title,
        message,
        kind,
    );
    n.id = notifications::insert(conn, &n)?;
    Ok(json!({ "notification": n }))
}

/// Sends one copy to every user with the given role, except the sender.
fn notifications_broadcast(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, session) = state.authorize(&[Role::Admin, Role::Teacher])?;
    let role = params::required_tag::<Role>(params, "role")?;
    let title = params::required_text(params, "title")?;
    let message = params::required_text(params, "message")?;
    let kind = notification_type(params)?;

    let tx = conn.unchecked_transaction()?;
    let mut sent = 0usize;
    for receiver in users::list(&tx, Some(role))? {
        if receiver.id == session.user_id() {
            continue;
        }
        let n = Notification::new(
            session.user_id(),
            session.user.name.clone(),
            receiver.id,
            title.clone(),
            message.clone(),
            kind,
        );
        notifications::insert(&tx, &n)?;
        sent += 1;
    }
    tx.commit()?;
    info!(by = session.user_id(), %role, sent, "broadcast sent");
    Ok(json!({ "sent": sent }))
}

fn notifications_inbox(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, session) = state.authorize(&[])?;
    let unread_only = params::optional_bool(params, "unreadOnly")?.unwrap_or(false);
    let list = notifications::inbox(conn, session.user_id(), unread_only)?;
    Ok(json!({ "notifications": list }))
}

fn notifications_mark_read(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, session) = state.authorize(&[])?;
    if params::optional_bool(params, "all")?.unwrap_or(false) {
        let updated = notifications::mark_all_read(conn, session.user_id())?;
        return Ok(json!({ "updated": updated }));
    }
    let id = params::required_id(params, "notificationId")?;
    let Some(mut n) = notifications::get(conn, id)?.filter(|n| n.receiver_id == session.user_id())
    else {
        return Err(HandlerErr::not_found("notification"));
    };
    let mut updated = 0;
    if !n.is_read() && notifications::mark_read(conn, id, session.user_id())? {
        n.mark_read();
        updated = 1;
    }
    Ok(json!({ "updated": updated, "notification": n }))
}

fn notifications_unread_count(state: &AppState) -> HandlerResult {
    let (conn, session) = state.authorize(&[])?;
    let count = notifications::unread_count(conn, session.user_id())?;
    Ok(json!({ "count": count }))
}

fn notifications_delete(state: &AppState, params: &serde_json::Value) -> HandlerResult {
    let (conn, session) = state.authorize(&[])?;
    let id = params::required_id(params, "notificationId")?;
    if !notifications::delete(conn, id, session.user_id())? {
        return Err(HandlerErr::not_found("notification"));
    }
    Ok(json!({ "deleted": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "notifications.send" => notifications_send(state, &req.params),
        "notifications.broadcast" => notifications_broadcast(state, &req.params),
        "notifications.inbox" => notifications_inbox(state, &req.params),
        "notifications.markRead" => notifications_mark_read(state, &req.params),
        "notifications.unreadCount" => notifications_unread_count(state),
        "notifications.delete" => notifications_delete(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
