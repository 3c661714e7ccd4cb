use rusqlite::Connection;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::db;
use crate::ipc::error::HandlerErr;
use crate::model::Role;
use crate::session::Session;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything a handler may touch. Passed explicitly; nothing is global.
pub struct AppState {
    pub config: Config,
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub session: Option<Session>,
    pub startup_error: Option<String>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        AppState {
            config,
            workspace: None,
            db: None,
            session: None,
            startup_error: None,
        }
    }

    /// Opens (and bootstraps) the workspace database. Any previous session
    /// belongs to the old workspace and is dropped.
    pub fn open_workspace(&mut self, path: &Path) -> anyhow::Result<()> {
        let conn = db::open_db(path, &self.config.admin_seed())?;
        self.workspace = Some(path.to_path_buf());
        self.db = Some(conn);
        self.session = None;
        self.startup_error = None;
        Ok(())
    }

    pub fn conn(&self) -> Result<&Connection, HandlerErr> {
        self.db
            .as_ref()
            .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
    }

    /// Requires an open workspace and a session whose role is in `roles`
    /// (any role when empty).
    pub fn authorize(&self, roles: &[Role]) -> Result<(&Connection, &Session), HandlerErr> {
        let conn = self.conn()?;
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| HandlerErr::new("no_session", "log in first"))?;
        if !session.has_any_role(roles) {
            return Err(HandlerErr::new(
                "forbidden",
                format!("{} may not perform this action", session.role()),
            ));
        }
        Ok((conn, session))
    }
}
