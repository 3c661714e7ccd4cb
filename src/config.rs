use clap::Parser;
use std::path::PathBuf;

use crate::db::AdminSeed;

/// Attendance sidecar: JSON requests on stdin, JSON responses on stdout.
#[derive(Debug, Parser, Clone)]
#[command(name = "attendd", version)]
pub struct Config {
    /// Workspace directory to open at startup.
    #[arg(long, env = "ATTENDD_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Default tracing filter when RUST_LOG is unset.
    #[arg(long, env = "ATTENDD_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Directory holding `admin.css`, `teacher.css` and `student.css`.
    #[arg(long, env = "ATTENDD_THEMES_DIR")]
    pub themes_dir: Option<PathBuf>,

    /// Password for the admin account seeded into an empty database.
    #[arg(long, env = "ATTENDD_ADMIN_PASSWORD", default_value = "admin", hide_env_values = true)]
    pub admin_password: String,

    #[arg(long, env = "ATTENDD_BCRYPT_COST", default_value_t = 10)]
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn admin_seed(&self) -> AdminSeed {
        AdminSeed {
            password: self.admin_password.clone(),
            bcrypt_cost: self.bcrypt_cost,
        }
    }
}
