//! Error types for the archive codec.
//!
//! Every variant means the archive is malformed or unreadable; none of them
//! is raised after a store write.

use conspire_core::asset::AssetId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("archive is missing required entry {0:?}")]
  MissingEntry(&'static str),

  #[error("invalid {entry}: {source}")]
  InvalidDocument {
    entry:  String,
    #[source]
    source: serde_json::Error,
  },

  #[error("entry {entry:?} exceeds {limit} bytes")]
  EntryTooLarge { entry: String, limit: u64 },

  #[error("asset payload does not hash to its id {0}")]
  DigestMismatch(AssetId),

  #[error("zip error: {0}")]
  Zip(#[from] zip::result::ZipError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
