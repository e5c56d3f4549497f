//! Error types for `conspire-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("conspiracy not found: {0}")]
  ConspiracyNotFound(Uuid),

  #[error("node not found: {0}")]
  NodeNotFound(Uuid),

  #[error("node {0} is not an image")]
  NotAnImage(Uuid),

  #[error("crop must have a positive width and height")]
  InvalidCrop,

  #[error("invalid asset id: {0:?}")]
  InvalidAssetId(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
