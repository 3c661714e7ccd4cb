mod config;
mod dashboard;
mod db;
mod ipc;
mod logging;
mod model;
mod session;
mod store;

use clap::Parser;
use std::io::{self, BufRead, Write};
use tracing::{error, info, warn};

fn main() {
    let config = config::Config::parse();
    logging::init(&config.log_level);

    let startup_workspace = config.workspace.clone();
    let mut state = ipc::AppState::new(config);

    // A broken workspace must not take the process down; the front end
    // learns about it from `health` and can pick another one.
    if let Some(path) = startup_workspace {
        if let Err(e) = state.open_workspace(&path) {
            error!(path = %path.display(), error = %format!("{e:#}"), "startup failed");
            state.startup_error = Some(format!("{e:#}"));
        }
    }
    info!(version = env!("CARGO_PKG_VERSION"), "attendd ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "stdin closed with error");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to echo back.
                warn!(error = %e, "unparseable request");
                let resp = ipc::err("", "bad_json", e.to_string(), None);
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(stdout, "{}", resp);
        let _ = stdout.flush();
    }
    info!("stdin closed; exiting");
}
