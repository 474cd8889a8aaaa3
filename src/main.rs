mod backup;
mod config;
mod credential;
mod db;
mod ipc;
mod store;

use clap::Parser;
use std::io::{self, BufRead, Write};

fn main() {
    let args = config::Args::parse();
    let config = match config::Config::load(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("hangmand: invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    // stdout carries the protocol; logs go to stderr.
    env_logger::Builder::new()
        .target(env_logger::Target::Stderr)
        .parse_filters(&config.log_level)
        .parse_env("RUST_LOG")
        .init();

    let mut state = match ipc::AppState::new(config) {
        Ok(s) => s,
        Err(e) => {
            log::error!("failed to initialize: {e:#}");
            std::process::exit(1);
        }
    };
    if let Some(ws) = state.config.workspace.clone() {
        if let Err(e) = state.open_workspace(&ws) {
            log::error!("failed to open workspace {}: {e:#}", ws.to_string_lossy());
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                log::warn!("dropping unparseable request: {e}");
                let _ = writeln!(
                    stdout,
                    "{}",
                    serde_json::json!({
                        "ok": false,
                        "error": { "code": "bad_json", "message": e.to_string() }
                    })
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    log::info!("stdin closed, exiting");
}
