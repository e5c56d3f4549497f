//! Archive export and import on top of [`Persistence`].
//!
//! Export packs one board, its graph and exactly the assets that graph
//! references. Import parses and validates the whole archive before handing
//! a single [`ImportBundle`] to the store.

use std::collections::BTreeSet;

use conspire_archive::{ArchiveWriter, read_archive};
use conspire_core::{
  asset::{Asset, AssetId},
  conspiracy::Conspiracy,
  session::Session,
  store::{BoardStore, ImportBundle},
};

use uuid::Uuid;

use crate::{Error, Persistence, Result, error::store_err};

/// Assets fetched per store round trip while scanning.
const SCAN_PAGE: usize = 32;

/// A finished export.
#[derive(Debug, Clone)]
pub struct Export {
  /// Suggested download name: `<board name>.zip`, reduced to a single safe
  /// path component.
  pub file_name: String,
  pub bytes:     Vec<u8>,
  /// Ids of the assets packed into the archive.
  pub assets:    Vec<AssetId>,
  /// Referenced by the graph but absent from the store; omitted.
  pub missing:   Vec<AssetId>,
}

/// `<name>.zip` with separators and control characters replaced and leading
/// dots stripped. Falls back to `<id>.zip` when nothing usable is left.
pub(crate) fn archive_file_name(name: &str, id: Uuid) -> String {
  let cleaned: String = name
    .chars()
    .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
    .collect();
  let cleaned = cleaned.trim().trim_start_matches('.').trim();

  if cleaned.is_empty() {
    format!("{id}.zip")
  } else {
    format!("{cleaned}.zip")
  }
}

impl<S: BoardStore> Persistence<S> {
  /// Export a board as a zip archive.
  ///
  /// Dangling asset references do not fail the export; they are reported in
  /// [`Export::missing`].
  pub async fn export(&self, session: Session) -> Result<Export> {
    let graph = self.get_graph(session).await?;
    let conspiracy = self.get_conspiracy(session.conspiracy_id).await?;

    let live = graph.asset_refs();
    let packed = self.collect_assets(&live).await?;

    let mut writer = ArchiveWriter::new(&conspiracy, &graph).map_err(Error::Archive)?;
    for asset in &packed {
      writer.add_asset(asset).map_err(Error::Archive)?;
    }
    let bytes = writer.finish().map_err(Error::Archive)?;

    let found: BTreeSet<&AssetId> = packed.iter().map(|a| &a.id).collect();
    let missing: Vec<AssetId> = live.iter().filter(|id| !found.contains(id)).cloned().collect();
    for id in &missing {
      tracing::warn!(board = %conspiracy.id, asset = %id, "referenced asset not in store; omitted from export");
    }

    tracing::info!(
      board = %conspiracy.id,
      assets = packed.len(),
      bytes = bytes.len(),
      "exported conspiracy"
    );

    Ok(Export {
      file_name: archive_file_name(&conspiracy.name, conspiracy.id),
      bytes,
      assets: packed.into_iter().map(|a| a.id).collect(),
      missing,
    })
  }

  /// Scan every stored asset, keeping those in `wanted`.
  async fn collect_assets(&self, wanted: &BTreeSet<AssetId>) -> Result<Vec<Asset>> {
    let mut kept = Vec::new();
    if wanted.is_empty() {
      return Ok(kept);
    }

    let mut cursor = None;
    loop {
      let page = self
        .store()
        .scan_assets(cursor, SCAN_PAGE)
        .await
        .map_err(store_err)?;
      kept.extend(page.assets.into_iter().filter(|a| wanted.contains(&a.id)));

      match page.next {
        Some(next) => cursor = Some(next),
        None => break,
      }
    }
    Ok(kept)
  }

  /// Import a zip archive, creating or overwriting the board it contains.
  ///
  /// Returns the imported conspiracy; callers switch to its id. A malformed
  /// archive fails before anything is written.
  pub async fn import(&self, bytes: &[u8]) -> Result<Conspiracy> {
    let archive = read_archive(bytes).map_err(Error::MalformedArchive)?;
    let skipped = archive.skipped.len();

    let bundle = ImportBundle {
      conspiracy: archive.conspiracy,
      graph:      archive.graph,
      assets:     archive.assets,
    };
    {
      let _guard = self.lock_board(bundle.conspiracy.id).await;
      self.store().import_bundle(&bundle).await.map_err(store_err)?;
    }

    tracing::info!(
      board = %bundle.conspiracy.id,
      name = %bundle.conspiracy.name,
      assets = bundle.assets.len(),
      skipped,
      "imported conspiracy"
    );
    Ok(bundle.conspiracy)
  }
}
