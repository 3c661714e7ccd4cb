use tracing::{debug, warn};

use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;

type TryHandle = fn(&mut AppState, &Request) -> Option<serde_json::Value>;

const FAMILIES: &[TryHandle] = &[
    handlers::core::try_handle,
    handlers::session::try_handle,
    handlers::users::try_handle,
    handlers::teachers::try_handle,
    handlers::classes::try_handle,
    handlers::students::try_handle,
    handlers::attendance::try_handle,
    handlers::notifications::try_handle,
];

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    let _span = tracing::debug_span!("request", id = %req.id, method = %req.method).entered();

    for try_handle in FAMILIES {
        if let Some(resp) = try_handle(state, &req) {
            log_outcome(&resp);
            return resp;
        }
    }

    warn!("unknown method");
    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}

fn log_outcome(resp: &serde_json::Value) {
    if resp.get("ok").and_then(|v| v.as_bool()) == Some(true) {
        debug!("ok");
        return;
    }
    let error = resp.get("error");
    let code = error
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(|v| v.as_str())
        .unwrap_or("");
    warn!(code, message, "request failed");
}
