//! Zip archive codec for exported boards.
//!
//! Converts between an archive file and [`conspire_core`] domain types. Pure
//! synchronous; no HTTP or database dependencies.
//!
//! # Layout
//!
//! | Entry | Contents |
//! |-------|----------|
//! | `conspiracy.json` | the [`Conspiracy`] record |
//! | `graph.json` | the board's [`GraphData`] (`{nodes, edges, combos}`) |
//! | `<asset id>.json` | [`AssetMeta`](conspire_core::asset::AssetMeta) for one referenced asset |
//! | `<asset id>` | that asset's raw payload |

pub mod error;
mod read;
mod write;

pub use error::{Error, Result};
pub use read::{read_archive, read_archive_with_limit};
pub use write::ArchiveWriter;

use conspire_core::{asset::Asset, conspiracy::Conspiracy, graph::GraphData};

/// Fixed name of the conspiracy document.
pub const CONSPIRACY_ENTRY: &str = "conspiracy.json";
/// Fixed name of the graph document.
pub const GRAPH_ENTRY: &str = "graph.json";
/// Suffix of per-asset metadata documents.
pub const META_SUFFIX: &str = ".json";
/// Largest decompressed entry [`read_archive`] accepts.
pub const MAX_ENTRY_BYTES: u64 = 64 * 1024 * 1024;

/// A fully-decoded archive.
#[derive(Debug, Clone)]
pub struct Archive {
  pub conspiracy: Conspiracy,
  pub graph:      GraphData,
  /// Assets whose metadata and payload were both present, in entry order.
  pub assets:     Vec<Asset>,
  /// Metadata entries skipped because their payload entry was missing.
  pub skipped:    Vec<String>,
}

/// Name of the metadata entry for an asset payload entry.
pub fn meta_entry_name(payload_entry: &str) -> String {
  format!("{payload_entry}{META_SUFFIX}")
}

#[cfg(test)]
mod tests;
