//! Archive parsing.
//!
//! The two fixed documents are required. Asset entries are discovered by
//! scanning for `.json` metadata documents other than the fixed ones; a
//! metadata document whose payload entry is absent is skipped.

use std::io::{Cursor, Read as _};

use conspire_core::asset::AssetMeta;
use serde::de::DeserializeOwned;
use zip::{ZipArchive, result::ZipError};

use crate::{
  Archive, CONSPIRACY_ENTRY, Error, GRAPH_ENTRY, MAX_ENTRY_BYTES, META_SUFFIX, Result,
};

type Reader<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Decode an archive. Nothing is written anywhere; a returned [`Archive`] is
/// fully validated, including that each asset payload hashes to its id.
pub fn read_archive(bytes: &[u8]) -> Result<Archive> {
  read_archive_with_limit(bytes, MAX_ENTRY_BYTES)
}

/// [`read_archive`] with a custom cap on each entry's decompressed size.
pub fn read_archive_with_limit(bytes: &[u8], limit: u64) -> Result<Archive> {
  let mut zip = ZipArchive::new(Cursor::new(bytes))?;

  let conspiracy = required_document(&mut zip, CONSPIRACY_ENTRY, limit)?;
  let graph = required_document(&mut zip, GRAPH_ENTRY, limit)?;

  let meta_entries: Vec<String> = zip
    .file_names()
    .filter(|name| name.ends_with(META_SUFFIX))
    .filter(|name| *name != CONSPIRACY_ENTRY && *name != GRAPH_ENTRY)
    .map(str::to_owned)
    .collect();

  let mut assets = Vec::with_capacity(meta_entries.len());
  let mut skipped = Vec::new();

  for entry in meta_entries {
    let raw = read_entry(&mut zip, &entry, limit)?.ok_or(Error::Zip(ZipError::FileNotFound))?;
    let meta: AssetMeta = parse_document(&entry, &raw)?;

    let Some(data) = read_entry(&mut zip, meta.id.as_str(), limit)? else {
      tracing::warn!(entry = %entry, asset = %meta.id, "asset payload missing from archive; skipping");
      skipped.push(entry);
      continue;
    };

    if !meta.id.matches(&data) {
      return Err(Error::DigestMismatch(meta.id));
    }
    assets.push(meta.into_asset(data));
  }

  Ok(Archive { conspiracy, graph, assets, skipped })
}

fn required_document<T: DeserializeOwned>(
  zip: &mut Reader<'_>,
  name: &'static str,
  limit: u64,
) -> Result<T> {
  let raw = read_entry(zip, name, limit)?.ok_or(Error::MissingEntry(name))?;
  parse_document(name, &raw)
}

fn parse_document<T: DeserializeOwned>(entry: &str, raw: &[u8]) -> Result<T> {
  serde_json::from_slice(raw).map_err(|source| Error::InvalidDocument {
    entry: entry.to_owned(),
    source,
  })
}

/// Read a whole entry, or `None` if the archive has no entry by that name.
///
/// The size an entry claims is not trusted; at most `limit` bytes are
/// decompressed.
fn read_entry(zip: &mut Reader<'_>, name: &str, limit: u64) -> Result<Option<Vec<u8>>> {
  let file = match zip.by_name(name) {
    Ok(file) => file,
    Err(ZipError::FileNotFound) => return Ok(None),
    Err(e) => return Err(e.into()),
  };
  let mut buf = Vec::new();
  file.take(limit.saturating_add(1)).read_to_end(&mut buf)?;
  if buf.len() as u64 > limit {
    return Err(Error::EntryTooLarge { entry: name.to_owned(), limit });
  }
  Ok(Some(buf))
}
