use serde_json::json;
use std::path::PathBuf;
use tracing::{error, info};

use super::respond;
use crate::ipc::error::{HandlerErr, HandlerResult};
use crate::ipc::params;
use crate::ipc::types::{AppState, Request};

fn health(state: &AppState) -> HandlerResult {
    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
        "startupError": state.startup_error,
        "session": state.session.as_ref().map(|s| json!({
            "id": s.id,
            "userId": s.user_id(),
            "role": s.role(),
            "activeView": s.active_view,
        })),
    }))
}

fn workspace_select(state: &mut AppState, params: &serde_json::Value) -> HandlerResult {
    let path = PathBuf::from(params::required_str(params, "path")?);
    match state.open_workspace(&path) {
        Ok(()) => {
            info!(path = %path.display(), "workspace selected");
            Ok(json!({ "workspacePath": path.to_string_lossy() }))
        }
        Err(e) => {
            error!(path = %path.display(), error = %format!("{e:#}"), "workspace open failed");
            state.startup_error = Some(format!("{e:#}"));
            Err(HandlerErr::new("db_open_failed", format!("{e:#}")))
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "health" => health(state),
        "workspace.select" => workspace_select(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
