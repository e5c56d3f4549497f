//! Subcommands and their execution against a local store.

use std::{path::{Path, PathBuf}, sync::Arc};

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use conspire_core::{
  conspiracy::Conspiracy,
  graph::{Crop, NodeKind},
  session::Session,
};
use conspire_persist::Persistence;
use conspire_store_sqlite::SqliteStore;
use uuid::Uuid;

use crate::mime;

pub type Local = Persistence<SqliteStore>;

#[derive(Subcommand, Debug)]
pub enum Command {
  /// List all boards, oldest first.
  List,
  /// Show which board would be opened, creating one if none exist.
  Open,
  /// Create a new, empty board.
  New {
    #[arg(default_value = conspire_core::conspiracy::DEFAULT_NAME)]
    name: String,
  },
  /// Rename the current board.
  Rename { name: String },
  /// List the current board's nodes.
  Show {
    /// Print the whole graph as JSON instead.
    #[arg(long)]
    json: bool,
  },
  /// Add an image file to the current board.
  Upload {
    path: PathBuf,
    /// Override the MIME type guessed from the extension.
    #[arg(long)]
    mime: Option<String>,
  },
  /// Add an entity node.
  Entity {
    name: String,
    #[arg(long = "type", default_value = "")]
    tag:  String,
  },
  /// Add a web reference node.
  Web {
    url: String,
    #[arg(long, default_value = "text/html")]
    mime: String,
  },
  /// Connect two nodes with an edge.
  Link { source: Uuid, target: Uuid },
  /// Cut a region out of an image node as a new node.
  Crop {
    node:   Uuid,
    #[arg(long)]
    x0:     f64,
    #[arg(long)]
    y0:     f64,
    #[arg(long)]
    width:  f64,
    #[arg(long)]
    height: f64,
  },
  /// Write the current board to a zip archive.
  Export {
    /// Output file (default: `<board name>.zip`).
    #[arg(long)]
    out: Option<PathBuf>,
  },
  /// Load a board from a zip archive, replacing any board with the same id.
  Import { path: PathBuf },
}

pub async fn open(path: &Path) -> Result<Local> {
  let store = SqliteStore::open(path)
    .await
    .with_context(|| format!("opening store at {}", path.display()))?;
  Ok(Persistence::new(Arc::new(store)))
}

/// Resolve the board to work on, warning when the requested one is gone.
async fn session(p: &Local, board: Option<Uuid>) -> Result<Session> {
  let resolution = p.resolve_session(board).await?;
  if board.is_some() && resolution.is_redirect() {
    tracing::warn!(
      fallback = %resolution.conspiracy().id,
      "requested board not found; using most recent"
    );
  }
  Ok(resolution.session())
}

fn print_board(c: &Conspiracy) {
  println!("{}\t{}\t{}", c.id, c.name, c.last_modified.to_rfc3339());
}

pub async fn run(p: &Local, board: Option<Uuid>, command: Command) -> Result<()> {
  match command {
    Command::List => {
      for c in p.list_conspiracies().await? {
        print_board(&c);
      }
    }
    Command::Open => {
      let s = session(p, board).await?;
      print_board(&p.get_conspiracy(s.conspiracy_id).await?);
    }
    Command::New { name } => print_board(&p.create_conspiracy(&name).await?),
    Command::Rename { name } => {
      let s = session(p, board).await?;
      print_board(&p.rename(s, &name).await?);
    }
    Command::Show { json } => {
      let s = session(p, board).await?;
      let graph = p.get_graph(s).await?;
      if json {
        println!("{}", serde_json::to_string_pretty(&graph)?);
      } else {
        for node in &graph.nodes {
          println!("{}\t{}", node.id, describe(&node.kind));
        }
        println!("{} nodes, {} edges", graph.nodes.len(), graph.edges.len());
      }
    }
    Command::Upload { path, mime: forced } => {
      let s = session(p, board).await?;
      let data = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
      let mime = forced.unwrap_or_else(|| mime::guess(&path).to_owned());
      if !mime.starts_with("image/") {
        bail!("{} is not an image ({mime})", path.display());
      }
      let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
      let node = p.upload(s, name, &mime, data).await?;
      println!("{}", node.id);
    }
    Command::Entity { name, tag } => {
      let s = session(p, board).await?;
      println!("{}", p.add_entity(s, &name, &tag).await?.id);
    }
    Command::Web { url, mime } => {
      let s = session(p, board).await?;
      println!("{}", p.add_web_reference(s, &url, &mime).await?.id);
    }
    Command::Link { source, target } => {
      let s = session(p, board).await?;
      p.update_graph(s, |g| g.add_edge(source, target)).await?;
    }
    Command::Crop { node, x0, y0, width, height } => {
      let s = session(p, board).await?;
      let crop = Crop { x0, y0, width, height };
      let child = p.update_graph(s, |g| g.extract_crop(node, crop)).await?;
      println!("{child}");
    }
    Command::Export { out } => {
      let s = session(p, board).await?;
      let export = p.export(s).await?;
      let out = out.unwrap_or_else(|| PathBuf::from(&export.file_name));
      std::fs::write(&out, &export.bytes)
        .with_context(|| format!("writing {}", out.display()))?;
      for id in &export.missing {
        eprintln!("warning: asset {id} is referenced but missing");
      }
      println!("{} ({} assets)", out.display(), export.assets.len());
    }
    Command::Import { path } => {
      let bytes = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
      let c = p.import(&bytes).await?;
      print_board(&c);
    }
  }
  Ok(())
}

fn describe(kind: &NodeKind) -> String {
  let label = match kind {
    NodeKind::Entity(e) => e.name.clone(),
    NodeKind::WebReference(w) => w.url.clone(),
    NodeKind::Image(i) => i.source_id.to_string(),
  };
  format!("{} {label}", kind.discriminant())
}
