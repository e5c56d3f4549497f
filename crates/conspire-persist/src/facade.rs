//! [`Persistence`]: registry, graph and asset operations.

use std::{collections::HashMap, sync::Arc};

use conspire_core::{
  asset::{Asset, AssetId},
  conspiracy::Conspiracy,
  graph::{GraphData, Node},
  session::Session,
  store::BoardStore,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{Error, Result, error::store_err};

// ─── Session resolution ──────────────────────────────────────────────────────

/// Outcome of resolving the board a client asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
  /// The requested board exists; open it.
  Existing(Conspiracy),
  /// No (valid) board was requested; the client should be redirected to
  /// this one's address.
  Redirect(Conspiracy),
}

impl Resolution {
  pub fn conspiracy(&self) -> &Conspiracy {
    match self {
      Self::Existing(c) | Self::Redirect(c) => c,
    }
  }

  pub fn session(&self) -> Session { Session::from(self.conspiracy()) }

  pub fn is_redirect(&self) -> bool { matches!(self, Self::Redirect(_)) }
}

// ─── Facade ──────────────────────────────────────────────────────────────────

/// Async facade over a [`BoardStore`].
///
/// Steps that depend on each other are awaited in order. Graph writes to one
/// board are serialised through a per-board lock shared by every clone, so
/// concurrent edits never overwrite each other. Cloning is cheap.
pub struct Persistence<S> {
  store: Arc<S>,
  locks: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl<S> Clone for Persistence<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      locks: Arc::clone(&self.locks),
    }
  }
}

impl<S: BoardStore> Persistence<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store, locks: Arc::default() }
  }

  pub fn store(&self) -> &S { &self.store }

  /// Exclusive access to one board's graph until the guard is dropped.
  pub(crate) async fn lock_board(&self, id: Uuid) -> OwnedMutexGuard<()> {
    let board = Arc::clone(self.locks.lock().await.entry(id).or_default());
    board.lock_owned().await
  }

  // ── Registry ──────────────────────────────────────────────────────────────

  pub async fn list_conspiracies(&self) -> Result<Vec<Conspiracy>> {
    self.store.list_conspiracies().await.map_err(store_err)
  }

  pub async fn get_conspiracy(&self, id: Uuid) -> Result<Conspiracy> {
    self
      .store
      .get_conspiracy(id)
      .await
      .map_err(store_err)?
      .ok_or(Error::ConspiracyNotFound(id))
  }

  /// Overwrite a conspiracy record. `last_modified` is stamped by the store.
  pub async fn put_conspiracy(&self, conspiracy: &Conspiracy) -> Result<Conspiracy> {
    self.store.save_conspiracy(conspiracy).await.map_err(store_err)
  }

  /// Create a new board together with its empty graph.
  pub async fn create_conspiracy(&self, name: &str) -> Result<Conspiracy> {
    let conspiracy = self.put_conspiracy(&Conspiracy::new(name)).await?;
    self
      .store
      .put_graph(conspiracy.id, &GraphData::default())
      .await
      .map_err(store_err)?;
    tracing::info!(id = %conspiracy.id, name, "created conspiracy");
    Ok(conspiracy)
  }

  pub async fn rename(&self, session: Session, name: &str) -> Result<Conspiracy> {
    let mut conspiracy = self.get_conspiracy(session.conspiracy_id).await?;
    conspiracy.name = name.to_owned();
    self.put_conspiracy(&conspiracy).await
  }

  /// Decide which board a client works on.
  ///
  /// A requested id that exists is opened as is. Anything else falls back to
  /// the most recent board (created if the registry is empty) and asks the
  /// caller to redirect to it.
  pub async fn resolve_session(&self, requested: Option<Uuid>) -> Result<Resolution> {
    if let Some(id) = requested {
      if let Some(c) = self.store.get_conspiracy(id).await.map_err(store_err)? {
        return Ok(Resolution::Existing(c));
      }
      tracing::warn!(%id, "requested conspiracy does not exist; falling back");
    }

    let c = self.store.most_recent_or_create().await.map_err(store_err)?;
    Ok(Resolution::Redirect(c))
  }

  // ── Graphs ────────────────────────────────────────────────────────────────

  pub async fn get_graph(&self, session: Session) -> Result<GraphData> {
    let id = session.conspiracy_id;
    self
      .store
      .get_graph(id)
      .await
      .map_err(store_err)?
      .map(|snapshot| snapshot.data)
      .ok_or(Error::GraphNotFound(id))
  }

  /// Save a board's graph wholesale, then stamp the board's
  /// `last_modified`. Returns the stamped conspiracy.
  ///
  /// Edges pointing at missing nodes are saved anyway and logged.
  pub async fn put_graph(&self, session: Session, data: &GraphData) -> Result<Conspiracy> {
    let _guard = self.lock_board(session.conspiracy_id).await;
    self.save_graph(session, data).await
  }

  /// Load, edit and save a board's graph as one step. Other edits to the
  /// same board wait until this one is saved.
  pub async fn update_graph<T, F>(&self, session: Session, edit: F) -> Result<T>
  where
    F: FnOnce(&mut GraphData) -> conspire_core::Result<T> + Send,
    T: Send,
  {
    let _guard = self.lock_board(session.conspiracy_id).await;
    let mut graph = self.get_graph(session).await?;
    let out = edit(&mut graph)?;
    self.save_graph(session, &graph).await?;
    Ok(out)
  }

  /// [`put_graph`](Self::put_graph) for callers already holding the board
  /// lock.
  async fn save_graph(&self, session: Session, data: &GraphData) -> Result<Conspiracy> {
    let id = session.conspiracy_id;
    if self.store.get_conspiracy(id).await.map_err(store_err)?.is_none() {
      return Err(Error::ConspiracyNotFound(id));
    }

    let dangling = data.dangling_edges();
    if !dangling.is_empty() {
      tracing::warn!(
        %id,
        count = dangling.len(),
        "saving graph with edges to missing nodes"
      );
    }

    self.store.put_graph(id, data).await.map_err(store_err)?;
    self
      .store
      .touch_conspiracy(id)
      .await
      .map_err(store_err)?
      .ok_or(Error::ConspiracyNotFound(id))
  }

  // ── Assets ────────────────────────────────────────────────────────────────

  pub async fn get_asset(&self, id: &AssetId) -> Result<Asset> {
    self
      .store
      .get_asset(id)
      .await
      .map_err(store_err)?
      .ok_or_else(|| Error::AssetNotFound(id.clone()))
  }

  pub async fn put_asset(&self, asset: &Asset) -> Result<()> {
    self.store.put_asset(asset).await.map_err(store_err)
  }

  // ── Ingest ────────────────────────────────────────────────────────────────

  /// Store an uploaded image and place it on the board.
  ///
  /// The asset id is derived from `data` here, so uploading the same bytes
  /// twice reuses one asset while producing two distinct nodes.
  pub async fn upload(
    &self,
    session: Session,
    file_name: Option<String>,
    mime_type: &str,
    data: Vec<u8>,
  ) -> Result<Node> {
    // Fail before writing the asset if the board does not exist.
    self.get_conspiracy(session.conspiracy_id).await?;

    let asset = Asset::from_upload(file_name, mime_type, data);
    self.put_asset(&asset).await?;

    let node = Node::image(asset.id.clone(), asset.name.clone(), &asset.mime_type);
    let placed = node.clone();
    self
      .update_graph(session, move |g| {
        g.upsert_node(placed);
        Ok(())
      })
      .await?;

    tracing::info!(board = %session.conspiracy_id, asset = %asset.id, node = %node.id, "uploaded image");
    Ok(node)
  }

  /// Place an arbitrary node on the board.
  pub async fn add_node(&self, session: Session, node: Node) -> Result<Node> {
    let placed = node.clone();
    self
      .update_graph(session, move |g| {
        g.upsert_node(placed);
        Ok(())
      })
      .await?;
    Ok(node)
  }

  pub async fn add_entity(&self, session: Session, name: &str, tag: &str) -> Result<Node> {
    self.add_node(session, Node::entity(name, tag)).await
  }

  /// Reference a remote resource by URL. Nothing is fetched or stored.
  pub async fn add_web_reference(
    &self,
    session: Session,
    url: &str,
    mimetype: &str,
  ) -> Result<Node> {
    self.add_node(session, Node::web_reference(url, mimetype)).await
  }
}
