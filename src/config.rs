//! Command-line and environment configuration.

use crate::identity::HashCost;
use argon2::Params;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Discipline-record sidecar. Reads one JSON request per line on stdin and
/// answers one JSON line per request on stdout; logs go to stderr.
#[derive(Debug, Clone, Parser)]
#[command(name = "conductbookd", version)]
pub struct Config {
    /// Workspace directory to open at startup. The UI can also pick one later
    /// with `workspace.select`.
    #[arg(long, env = "CONDUCTBOOK_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    #[arg(long, env = "CONDUCTBOOK_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Argon2 memory cost in KiB.
    #[arg(long, env = "CONDUCTBOOK_ARGON2_MEMORY_KIB", default_value_t = Params::DEFAULT_M_COST)]
    pub argon2_memory_kib: u32,

    #[arg(long, env = "CONDUCTBOOK_ARGON2_ITERATIONS", default_value_t = Params::DEFAULT_T_COST)]
    pub argon2_iterations: u32,

    #[arg(long, env = "CONDUCTBOOK_ARGON2_PARALLELISM", default_value_t = Params::DEFAULT_P_COST)]
    pub argon2_parallelism: u32,
}

impl Config {
    pub fn hash_cost(&self) -> HashCost {
        HashCost {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_argon2_recommendations() {
        let cfg = Config::try_parse_from(["conductbookd"]).expect("parse");
        assert_eq!(cfg.hash_cost(), HashCost::default());
        assert_eq!(cfg.log_format, LogFormat::Text);
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = Config::try_parse_from([
            "conductbookd",
            "--workspace",
            "/tmp/ws",
            "--log-format",
            "json",
            "--argon2-memory-kib",
            "1024",
            "--argon2-iterations",
            "1",
        ])
        .expect("parse");
        assert_eq!(cfg.workspace, Some(PathBuf::from("/tmp/ws")));
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(cfg.hash_cost().memory_kib, 1024);
        assert_eq!(cfg.hash_cost().iterations, 1);
    }

    #[test]
    fn rejects_unknown_log_format() {
        assert!(Config::try_parse_from(["conductbookd", "--log-format", "xml"]).is_err());
    }
}
