//! Error type for the persistence facade.

use conspire_core::asset::AssetId;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("conspiracy not found: {0}")]
  ConspiracyNotFound(Uuid),

  #[error("no graph stored for conspiracy {0}")]
  GraphNotFound(Uuid),

  #[error("asset not found: {0}")]
  AssetNotFound(AssetId),

  /// The archive handed to import is unusable. Nothing was written.
  #[error("malformed archive: {0}")]
  MalformedArchive(#[source] conspire_archive::Error),

  /// Building an export archive failed.
  #[error("archive error: {0}")]
  Archive(#[source] conspire_archive::Error),

  #[error(transparent)]
  Core(#[from] conspire_core::Error),

  /// The storage engine reported an error. Not retried.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::ConspiracyNotFound(_) | Self::GraphNotFound(_) | Self::AssetNotFound(_)
    )
  }
}

pub(crate) fn store_err<E>(e: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  Error::Store(Box::new(e))
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
