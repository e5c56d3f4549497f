//! The `BoardStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g.
//! `conspire-store-sqlite`). Higher layers depend on this abstraction, not on
//! any concrete backend.
//!
//! A backend holds three logical stores: conspiracies (the registry),
//! graphs (one snapshot per conspiracy) and assets (content-addressed
//! blobs). Every write is a whole-record replace.

use std::future::Future;

use uuid::Uuid;

use crate::{
  asset::{Asset, AssetId},
  conspiracy::Conspiracy,
  graph::{GraphData, GraphSnapshot},
};

// ─── Scan types ──────────────────────────────────────────────────────────────

/// Opaque position in an asset scan. Pass the cursor from one
/// [`AssetPage`] to the next [`BoardStore::scan_assets`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetCursor(i64);

impl AssetCursor {
  /// Backend-side constructor from a storage position.
  pub fn new(position: i64) -> Self { Self(position) }

  pub fn position(self) -> i64 { self.0 }
}

/// One page of a full asset scan, in storage order.
#[derive(Debug, Clone, Default)]
pub struct AssetPage {
  pub assets: Vec<Asset>,
  /// `None` once the scan is exhausted.
  pub next:   Option<AssetCursor>,
}

// ─── Import ──────────────────────────────────────────────────────────────────

/// Everything an archive import writes, fully parsed and validated.
#[derive(Debug, Clone)]
pub struct ImportBundle {
  pub conspiracy: Conspiracy,
  pub graph:      GraphData,
  pub assets:     Vec<Asset>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a board storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait BoardStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Conspiracy registry ───────────────────────────────────────────────

  /// All conspiracies in storage insertion order.
  fn list_conspiracies(
    &self,
  ) -> impl Future<Output = Result<Vec<Conspiracy>, Self::Error>> + Send + '_;

  /// Retrieve a conspiracy by id. Returns `None` if not found.
  fn get_conspiracy(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Conspiracy>, Self::Error>> + Send + '_;

  /// The most recently inserted conspiracy, creating a default one (with an
  /// empty graph) when the registry is empty. Creation and the lookup happen
  /// in one transaction.
  fn most_recent_or_create(
    &self,
  ) -> impl Future<Output = Result<Conspiracy, Self::Error>> + Send + '_;

  /// Overwrite (or insert) a conspiracy, stamping `last_modified` with the
  /// current time. `last_modified` never moves backwards. Returns the
  /// record as stored.
  fn save_conspiracy<'a>(
    &'a self,
    conspiracy: &'a Conspiracy,
  ) -> impl Future<Output = Result<Conspiracy, Self::Error>> + Send + 'a;

  /// Stamp `last_modified` with the current time, leaving every other field
  /// alone. Returns `None` if the conspiracy does not exist.
  fn touch_conspiracy(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Conspiracy>, Self::Error>> + Send + '_;

  // ── Graph snapshots ───────────────────────────────────────────────────

  fn get_graph(
    &self,
    conspiracy_id: Uuid,
  ) -> impl Future<Output = Result<Option<GraphSnapshot>, Self::Error>> + Send + '_;

  /// Overwrite the snapshot for `conspiracy_id` wholesale.
  fn put_graph<'a>(
    &'a self,
    conspiracy_id: Uuid,
    data: &'a GraphData,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Assets ────────────────────────────────────────────────────────────

  /// Insert or overwrite an asset by id. The caller supplies the id; the
  /// store does not verify it against the payload.
  fn put_asset<'a>(
    &'a self,
    asset: &'a Asset,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_asset<'a>(
    &'a self,
    id: &'a AssetId,
  ) -> impl Future<Output = Result<Option<Asset>, Self::Error>> + Send + 'a;

  /// Fetch the next page of a full scan over every stored asset. Start with
  /// `after = None`.
  fn scan_assets(
    &self,
    after: Option<AssetCursor>,
    limit: usize,
  ) -> impl Future<Output = Result<AssetPage, Self::Error>> + Send + '_;

  // ── Import ────────────────────────────────────────────────────────────

  /// Write an imported conspiracy, its graph and its assets as one unit.
  /// The conspiracy record is stored exactly as given (no timestamp stamp).
  fn import_bundle<'a>(
    &'a self,
    bundle: &'a ImportBundle,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
