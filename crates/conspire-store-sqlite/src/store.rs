//! [`SqliteStore`]: the SQLite implementation of [`BoardStore`].

use std::path::Path;

use conspire_core::{
  asset::{Asset, AssetId},
  conspiracy::{self, Conspiracy},
  graph::{GraphData, GraphSnapshot},
  store::{AssetCursor, AssetPage, BoardStore, ImportBundle},
};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use crate::{
  Result,
  encode::{RawAsset, RawConspiracy, decode_graph, encode_dt, encode_graph, encode_uuid},
  schema::SCHEMA,
};

// ─── SQL ─────────────────────────────────────────────────────────────────────

const SELECT_CONSPIRACY: &str = "SELECT id, name, created, last_modified FROM conspiracies";

/// Whole-record overwrite that keeps `last_modified` from moving backwards.
const UPSERT_CONSPIRACY_STAMPED: &str =
  "INSERT INTO conspiracies (id, name, created, last_modified) VALUES (?1, ?2, ?3, ?4)
   ON CONFLICT(id) DO UPDATE SET
     name          = excluded.name,
     created       = excluded.created,
     last_modified = MAX(excluded.last_modified, conspiracies.last_modified)";

/// Whole-record overwrite, stored exactly as given.
const UPSERT_CONSPIRACY_RAW: &str =
  "INSERT INTO conspiracies (id, name, created, last_modified) VALUES (?1, ?2, ?3, ?4)
   ON CONFLICT(id) DO UPDATE SET
     name          = excluded.name,
     created       = excluded.created,
     last_modified = excluded.last_modified";

/// Timestamp-only stamp; `last_modified` never moves backwards.
const TOUCH_CONSPIRACY: &str =
  "UPDATE conspiracies SET last_modified = MAX(?2, last_modified) WHERE id = ?1";

const UPSERT_GRAPH: &str = "INSERT INTO graphs (id, data) VALUES (?1, ?2)
   ON CONFLICT(id) DO UPDATE SET data = excluded.data";

const UPSERT_ASSET: &str = "INSERT INTO assets (id, name, type, data) VALUES (?1, ?2, ?3, ?4)
   ON CONFLICT(id) DO UPDATE SET
     name = excluded.name,
     type = excluded.type,
     data = excluded.data";

fn insert_conspiracy(
  conn: &rusqlite::Connection,
  sql: &str,
  raw: &RawConspiracy,
) -> rusqlite::Result<usize> {
  conn.execute(
    sql,
    rusqlite::params![raw.id, raw.name, raw.created, raw.last_modified],
  )
}

fn insert_asset(conn: &rusqlite::Connection, asset: &Asset) -> rusqlite::Result<usize> {
  conn.execute(
    UPSERT_ASSET,
    rusqlite::params![asset.id.as_str(), asset.name, asset.mime_type, asset.data],
  )
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A board store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of stored assets. Assets are never deleted, so this only grows.
  pub async fn asset_count(&self) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM assets", [], |r| r.get(0))?))
      .await?;
    Ok(n as u64)
  }
}

// ─── BoardStore impl ─────────────────────────────────────────────────────────

impl BoardStore for SqliteStore {
  type Error = crate::Error;

  // ── Conspiracy registry ───────────────────────────────────────────────────

  async fn list_conspiracies(&self) -> Result<Vec<Conspiracy>> {
    let raws: Vec<RawConspiracy> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("{SELECT_CONSPIRACY} ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], RawConspiracy::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawConspiracy::into_conspiracy).collect()
  }

  async fn get_conspiracy(&self, id: Uuid) -> Result<Option<Conspiracy>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawConspiracy> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("{SELECT_CONSPIRACY} WHERE id = ?1"),
              rusqlite::params![id_str],
              RawConspiracy::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawConspiracy::into_conspiracy).transpose()
  }

  async fn most_recent_or_create(&self) -> Result<Conspiracy> {
    let fresh = RawConspiracy::from_conspiracy(&Conspiracy::default());
    let empty_graph = encode_graph(&GraphData::default())?;

    let (raw, created): (RawConspiracy, bool) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let last = tx
          .query_row(
            &format!("{SELECT_CONSPIRACY} ORDER BY rowid DESC LIMIT 1"),
            [],
            RawConspiracy::from_row,
          )
          .optional()?;

        if let Some(last) = last {
          tx.commit()?;
          return Ok((last, false));
        }

        insert_conspiracy(&tx, UPSERT_CONSPIRACY_RAW, &fresh)?;
        tx.execute(UPSERT_GRAPH, rusqlite::params![fresh.id, empty_graph])?;
        tx.commit()?;
        Ok((fresh, true))
      })
      .await?;

    let conspiracy = raw.into_conspiracy()?;
    if created {
      tracing::info!(id = %conspiracy.id, "registry empty; created default conspiracy");
    }
    Ok(conspiracy)
  }

  async fn save_conspiracy(&self, conspiracy: &Conspiracy) -> Result<Conspiracy> {
    let mut raw = RawConspiracy::from_conspiracy(conspiracy);
    raw.last_modified = encode_dt(conspiracy::now());

    let stored: RawConspiracy = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_conspiracy(&tx, UPSERT_CONSPIRACY_STAMPED, &raw)?;
        let stored = tx.query_row(
          &format!("{SELECT_CONSPIRACY} WHERE id = ?1"),
          rusqlite::params![raw.id],
          RawConspiracy::from_row,
        )?;
        tx.commit()?;
        Ok(stored)
      })
      .await?;

    tracing::debug!(id = %conspiracy.id, last_modified = %stored.last_modified, "saved conspiracy");
    stored.into_conspiracy()
  }

  async fn touch_conspiracy(&self, id: Uuid) -> Result<Option<Conspiracy>> {
    let id_str = encode_uuid(id);
    let at = encode_dt(conspiracy::now());

    let stored: Option<RawConspiracy> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if tx.execute(TOUCH_CONSPIRACY, rusqlite::params![id_str, at])? == 0 {
          return Ok(None);
        }
        let stored = tx.query_row(
          &format!("{SELECT_CONSPIRACY} WHERE id = ?1"),
          rusqlite::params![id_str],
          RawConspiracy::from_row,
        )?;
        tx.commit()?;
        Ok(Some(stored))
      })
      .await?;

    if let Some(raw) = &stored {
      tracing::debug!(%id, last_modified = %raw.last_modified, "touched conspiracy");
    }
    stored.map(RawConspiracy::into_conspiracy).transpose()
  }

  // ── Graph snapshots ───────────────────────────────────────────────────────

  async fn get_graph(&self, conspiracy_id: Uuid) -> Result<Option<GraphSnapshot>> {
    let id_str = encode_uuid(conspiracy_id);

    let data: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT data FROM graphs WHERE id = ?1",
              rusqlite::params![id_str],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    data
      .map(|s| decode_graph(&s).map(|data| GraphSnapshot { id: conspiracy_id, data }))
      .transpose()
  }

  async fn put_graph(&self, conspiracy_id: Uuid, data: &GraphData) -> Result<()> {
    let id_str = encode_uuid(conspiracy_id);
    let json = encode_graph(data)?;
    let bytes = json.len();

    self
      .conn
      .call(move |conn| {
        conn.execute(UPSERT_GRAPH, rusqlite::params![id_str, json])?;
        Ok(())
      })
      .await?;

    tracing::debug!(id = %conspiracy_id, bytes, "saved graph snapshot");
    Ok(())
  }

  // ── Assets ────────────────────────────────────────────────────────────────

  async fn put_asset(&self, asset: &Asset) -> Result<()> {
    let owned = asset.clone();

    self
      .conn
      .call(move |conn| {
        insert_asset(conn, &owned)?;
        Ok(())
      })
      .await?;

    tracing::debug!(id = %asset.id, bytes = asset.data.len(), "saved asset");
    Ok(())
  }

  async fn get_asset(&self, id: &AssetId) -> Result<Option<Asset>> {
    let id_str = id.as_str().to_owned();

    let raw: Option<RawAsset> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT rowid, id, name, type, data FROM assets WHERE id = ?1",
              rusqlite::params![id_str],
              RawAsset::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAsset::into_asset).transpose()
  }

  async fn scan_assets(&self, after: Option<AssetCursor>, limit: usize) -> Result<AssetPage> {
    let after_rowid = after.map_or(i64::MIN, AssetCursor::position);
    let limit = limit.max(1);
    let limit_val = limit as i64;

    let raws: Vec<RawAsset> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT rowid, id, name, type, data FROM assets
           WHERE rowid > ?1
           ORDER BY rowid
           LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![after_rowid, limit_val], RawAsset::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let next = if raws.len() == limit {
      raws.last().map(|r| AssetCursor::new(r.rowid))
    } else {
      None
    };
    let assets = raws.into_iter().map(RawAsset::into_asset).collect::<Result<_>>()?;

    Ok(AssetPage { assets, next })
  }

  // ── Import ────────────────────────────────────────────────────────────────

  async fn import_bundle(&self, bundle: &ImportBundle) -> Result<()> {
    let raw = RawConspiracy::from_conspiracy(&bundle.conspiracy);
    let graph = encode_graph(&bundle.graph)?;
    let assets = bundle.assets.clone();
    let asset_count = assets.len();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        insert_conspiracy(&tx, UPSERT_CONSPIRACY_RAW, &raw)?;
        tx.execute(UPSERT_GRAPH, rusqlite::params![raw.id, graph])?;
        for asset in &assets {
          insert_asset(&tx, asset)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(id = %bundle.conspiracy.id, assets = asset_count, "committed import bundle");
    Ok(())
  }
}
