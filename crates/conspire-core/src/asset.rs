//! Assets: immutable, content-addressed binary blobs (typically images).
//!
//! An asset's id is the SHA-256 digest of its payload, hex encoded. Storing
//! identical bytes twice therefore yields a single record. The digest is
//! computed by whoever reads the source file ([`Asset::from_upload`]);
//! storage backends never hash.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

// ─── Id ──────────────────────────────────────────────────────────────────────

/// Hex-encoded SHA-256 digest of an asset payload.
///
/// Only strings that `digest` could have produced are accepted, which also
/// keeps ids safe to use as archive entry names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetId(String);

impl AssetId {
  /// Length of a hex-encoded SHA-256 digest.
  pub const LEN: usize = 64;

  /// Derive the id for `data`.
  pub fn digest(data: &[u8]) -> Self { Self(hex::encode(Sha256::digest(data))) }

  pub fn parse(s: &str) -> Result<Self> {
    let well_formed = s.len() == Self::LEN
      && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if well_formed {
      Ok(Self(s.to_owned()))
    } else {
      Err(Error::InvalidAssetId(s.to_owned()))
    }
  }

  /// True if `data` hashes to this id.
  pub fn matches(&self, data: &[u8]) -> bool { *self == Self::digest(data) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for AssetId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl FromStr for AssetId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl TryFrom<String> for AssetId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::parse(&s) }
}

impl From<AssetId> for String {
  fn from(id: AssetId) -> Self { id.0 }
}

// ─── Asset ───────────────────────────────────────────────────────────────────

/// A stored blob together with its descriptive metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
  pub id:        AssetId,
  /// Original file name, if one was known at upload time.
  pub name:      Option<String>,
  pub mime_type: String,
  pub data:      Vec<u8>,
}

impl Asset {
  /// Build an asset from freshly-read file contents, deriving its id.
  pub fn from_upload(
    name: Option<String>,
    mime_type: impl Into<String>,
    data: Vec<u8>,
  ) -> Self {
    Self {
      id: AssetId::digest(&data),
      name,
      mime_type: mime_type.into(),
      data,
    }
  }

  pub fn meta(&self) -> AssetMeta {
    AssetMeta {
      id:        self.id.clone(),
      name:      self.name.clone().unwrap_or_default(),
      mime_type: self.mime_type.clone(),
    }
  }
}

/// The JSON metadata document written next to an asset payload in an
/// archive: `{"id": ..., "name": ..., "type": ...}`.
///
/// An absent name is written as the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMeta {
  pub id:        AssetId,
  #[serde(default)]
  pub name:      String,
  #[serde(rename = "type")]
  pub mime_type: String,
}

impl AssetMeta {
  /// Join this metadata with its payload.
  pub fn into_asset(self, data: Vec<u8>) -> Asset {
    Asset {
      id: self.id,
      name: (!self.name.is_empty()).then_some(self.name),
      mime_type: self.mime_type,
      data,
    }
  }
}
