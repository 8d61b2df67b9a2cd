mod config;
mod db;
mod error;
mod identity;
mod ipc;
mod records;
mod roster;
mod session;

use clap::Parser;
use std::io::{self, BufRead, Write};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, LogFormat};

/// stdout carries the protocol, so every log line goes to stderr.
fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(io::stderr))
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(io::stderr))
            .init(),
    }
}

fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_logging(&config);

    let hasher = identity::CredentialHasher::new(config.hash_cost())?;
    let mut state = ipc::AppState::new(hasher, Box::new(roster::SyntheticDirectory));

    if let Some(path) = config.workspace.as_deref() {
        // A bad startup workspace is logged; the UI can still select another.
        if let Err(e) = ipc::open_workspace(&mut state, path) {
            tracing::error!(workspace = %path.to_string_lossy(), error = %format!("{e:#}"), "startup workspace failed to open");
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
                tracing::warn!(error = %e, "unparseable request line");
                let resp = ipc::err("", "bad_json", e.to_string(), None);
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        tracing::debug!(id = %req.id, method = %req.method, "request");
        let resp = ipc::handle_request(&mut state, req);
        if writeln!(stdout, "{}", resp).and_then(|_| stdout.flush()).is_err() {
            break;
        }
    }

    tracing::info!("stdin closed; shutting down");
    Ok(())
}
