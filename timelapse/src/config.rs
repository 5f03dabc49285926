//! Command-line arguments and the optional TOML config file.
//!
//! Precedence: CLI flag, then `config.toml`, then built-in default. A missing
//! or unreadable config file is never fatal.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use timelapse_core::hg::DEFAULT_REVISION_LIMIT;

/// Step through the Mercurial history of a file, line by line.
#[derive(Debug, Parser)]
#[command(name = "timelapse", version)]
pub struct Cli {
    /// File to inspect. Without it the viewer starts empty; press `o` to open one.
    pub file: Option<PathBuf>,

    /// Number of most recent revisions to load.
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Path to the `hg` executable.
    #[arg(long)]
    pub hg: Option<String>,

    /// Color theme: `dark` or `catppuccin-mocha`.
    #[arg(long)]
    pub theme: Option<String>,

    /// Config file to read instead of the XDG default.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Where to write the log file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: String,
    pub hg: String,
    pub revision_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "catppuccin-mocha".to_owned(),
            hg: "hg".to_owned(),
            revision_limit: DEFAULT_REVISION_LIMIT,
        }
    }
}

impl Config {
    /// Applies any flags given on the command line.
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(theme) = &cli.theme {
            self.theme = theme.clone();
        }
        if let Some(hg) = &cli.hg {
            self.hg = hg.clone();
        }
        if let Some(limit) = cli.limit {
            self.revision_limit = limit;
        }
        self.revision_limit = self.revision_limit.max(1);
        self
    }
}

/// `$XDG_CONFIG_HOME/timelapse/config.toml`, falling back to
/// `~/.config/timelapse/config.toml`.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("timelapse").join("config.toml")
}

/// Reads the config at `path`. Returns defaults if the file is absent or
/// does not parse; parse errors are reported on stderr and in the log.
pub fn load_config(path: &Path) -> Config {
    let raw = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => return Config::default(),
    };
    match parse_config(&raw) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("timelapse: config parse error in {:?}: {}", path, e);
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config");
            Config::default()
        }
    }
}

pub fn parse_config(raw: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(raw)
}
