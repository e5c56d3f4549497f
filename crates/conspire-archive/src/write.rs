//! Archive serialisation.

use std::io::{Cursor, Write as _};

use conspire_core::{asset::Asset, conspiracy::Conspiracy, graph::GraphData};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::{CONSPIRACY_ENTRY, GRAPH_ENTRY, Result, meta_entry_name};

/// Incrementally builds an archive in memory.
///
/// The two fixed documents are written on construction; assets are appended
/// one at a time so a caller can stream them out of a store scan.
pub struct ArchiveWriter {
  zip:    ZipWriter<Cursor<Vec<u8>>>,
  assets: usize,
}

impl ArchiveWriter {
  pub fn new(conspiracy: &Conspiracy, graph: &GraphData) -> Result<Self> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    zip.start_file(CONSPIRACY_ENTRY, json_options())?;
    zip.write_all(&serde_json::to_vec(conspiracy)?)?;

    zip.start_file(GRAPH_ENTRY, json_options())?;
    zip.write_all(&serde_json::to_vec(graph)?)?;

    Ok(Self { zip, assets: 0 })
  }

  /// Append an asset as a metadata document plus its raw payload.
  pub fn add_asset(&mut self, asset: &Asset) -> Result<()> {
    let payload_entry = asset.id.as_str();

    self.zip.start_file(meta_entry_name(payload_entry), json_options())?;
    self.zip.write_all(&serde_json::to_vec(&asset.meta())?)?;

    // Image payloads are already compressed.
    self.zip.start_file(payload_entry, blob_options())?;
    self.zip.write_all(&asset.data)?;

    self.assets += 1;
    Ok(())
  }

  /// Number of assets appended so far.
  pub fn asset_count(&self) -> usize { self.assets }

  /// Finalise the central directory and return the archive bytes.
  pub fn finish(self) -> Result<Vec<u8>> { Ok(self.zip.finish()?.into_inner()) }
}

fn json_options() -> SimpleFileOptions {
  SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

fn blob_options() -> SimpleFileOptions {
  SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
}
