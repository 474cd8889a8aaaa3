use clap::Parser;
use figment::providers::{Env, Format, Json, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Sidecar daemon for the hangman classroom panels. Speaks JSON lines on stdin/stdout.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    /// Optional JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Workspace to open at startup
    #[arg(long)]
    pub workspace: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub log_level: String,
    /// Start blank workspaces from the bootstrap dataset instead of empty.
    pub seed_defaults: bool,
    pub bootstrap_password: String,
    pub workspace: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            seed_defaults: true,
            bootstrap_password: "hangman".to_string(),
            workspace: None,
        }
    }
}

impl Config {
    /// Defaults, then the JSON file (if any), then `HANGMAN_*` variables, then CLI flags.
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = &args.config {
            figment = figment.merge(Json::file(path));
        }
        let mut config: Config = figment.merge(Env::prefixed("HANGMAN_")).extract()?;
        if let Some(ws) = &args.workspace {
            config.workspace = Some(ws.clone());
        }
        Ok(config)
    }
}
