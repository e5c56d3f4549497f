//! `conspire`: work on conspiracy boards from the terminal.
//!
//! # Usage
//!
//! ```
//! conspire list
//! conspire --board 6f1c… upload evidence.png
//! conspire export --out board.zip
//! conspire --config ~/.config/conspire/config.toml import board.zip
//! ```

mod commands;
mod mime;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use commands::Command;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "conspire", about = "Conspiracy board editor")]
struct Args {
  /// Path to a TOML config file (store, board).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// SQLite database file (default: ~/.local/share/conspire/conspire.db).
  #[arg(long, env = "CONSPIRE_STORE")]
  store: Option<PathBuf>,

  /// Board to work on. Defaults to the most recent one.
  #[arg(long, env = "CONSPIRE_BOARD")]
  board: Option<Uuid>,

  #[command(subcommand)]
  command: Command,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug, PartialEq)]
struct ConfigFile {
  #[serde(default)]
  store: Option<PathBuf>,
  #[serde(default)]
  board: Option<Uuid>,
}

/// Effective settings once flags, file and defaults are merged.
#[derive(Debug, PartialEq)]
struct Settings {
  store: PathBuf,
  board: Option<Uuid>,
}

const DEFAULT_STORE: &str = "~/.local/share/conspire/conspire.db";

impl Settings {
  /// CLI flags override the config file, which overrides defaults.
  fn merge(store: Option<PathBuf>, board: Option<Uuid>, file: ConfigFile) -> Self {
    Self {
      store: store
        .or(file.store)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE)),
      board: board.or(file.board),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let settings = Settings::merge(args.store, args.board, file_cfg);
  let store_path = expand_tilde(&settings.store);
  if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("creating {}", parent.display()))?;
  }

  let persistence = commands::open(&store_path).await?;
  commands::run(&persistence, settings.board, args.command).await
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flags_beat_file_beat_defaults() {
    let board = Uuid::new_v4();
    let file = ConfigFile { store: Some("file.db".into()), board: Some(Uuid::new_v4()) };

    let s = Settings::merge(Some("flag.db".into()), Some(board), file);
    assert_eq!(s, Settings { store: "flag.db".into(), board: Some(board) });

    let s = Settings::merge(None, None, ConfigFile { store: Some("file.db".into()), board: None });
    assert_eq!(s.store, PathBuf::from("file.db"));
    assert_eq!(s.board, None);

    let s = Settings::merge(None, None, ConfigFile::default());
    assert_eq!(s.store, PathBuf::from(DEFAULT_STORE));
  }

  #[test]
  fn config_file_parses() {
    let id = Uuid::new_v4();
    let cfg: ConfigFile = toml::from_str(&format!("store = \"/tmp/c.db\"\nboard = \"{id}\"\n")).unwrap();
    assert_eq!(cfg.store, Some(PathBuf::from("/tmp/c.db")));
    assert_eq!(cfg.board, Some(id));

    let empty: ConfigFile = toml::from_str("").unwrap();
    assert_eq!(empty, ConfigFile::default());
  }

  #[test]
  fn subcommands_parse() {
    let args = Args::try_parse_from(["conspire", "crop", "00000000-0000-0000-0000-000000000000",
      "--x0", "1", "--y0", "2", "--width", "3", "--height", "4"]).unwrap();
    assert!(matches!(args.command, Command::Crop { .. }));
  }
}
