pub mod attendance;
pub mod classes;
pub mod core;
pub mod notifications;
pub mod session;
pub mod students;
pub mod teachers;
pub mod users;

use crate::ipc::error::{ok, HandlerResult};

fn respond(id: &str, result: HandlerResult) -> serde_json::Value {
    match result {
        Ok(value) => ok(id, value),
        Err(error) => error.response(id),
    }
}
