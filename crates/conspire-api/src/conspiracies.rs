//! Handlers for `/conspiracies` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/conspiracies` | Registry in insertion order |
//! | `GET`  | `/conspiracies/:id` | 404 if not found |
//! | `PUT`  | `/conspiracies/:id/name` | Body: `{"name":"..."}` |
//! | `GET`  | `/conspiracies/:id/graph` | The saved [`GraphData`] |
//! | `PUT`  | `/conspiracies/:id/graph` | Whole-snapshot save; returns the stamped conspiracy |

use axum::{
  Json,
  extract::{Path, State},
};
use conspire_core::{
  conspiracy::Conspiracy,
  graph::GraphData,
  session::Session,
  store::BoardStore,
};
use conspire_persist::Persistence;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── Registry ─────────────────────────────────────────────────────────────────

/// `GET /conspiracies`
pub async fn list<S>(
  State(persistence): State<Persistence<S>>,
) -> Result<Json<Vec<Conspiracy>>, ApiError>
where
  S: BoardStore,
{
  Ok(Json(persistence.list_conspiracies().await?))
}

/// `GET /conspiracies/:id`
pub async fn get_one<S>(
  State(persistence): State<Persistence<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Conspiracy>, ApiError>
where
  S: BoardStore,
{
  Ok(Json(persistence.get_conspiracy(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct RenameBody {
  pub name: String,
}

/// `PUT /conspiracies/:id/name`
pub async fn rename<S>(
  State(persistence): State<Persistence<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RenameBody>,
) -> Result<Json<Conspiracy>, ApiError>
where
  S: BoardStore,
{
  let name = body.name.trim();
  if name.is_empty() {
    return Err(ApiError::BadRequest("name must not be empty".into()));
  }
  Ok(Json(persistence.rename(Session::new(id), name).await?))
}

// ─── Graph ────────────────────────────────────────────────────────────────────

/// `GET /conspiracies/:id/graph`
pub async fn get_graph<S>(
  State(persistence): State<Persistence<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<GraphData>, ApiError>
where
  S: BoardStore,
{
  Ok(Json(persistence.get_graph(Session::new(id)).await?))
}

/// `PUT /conspiracies/:id/graph`: replaces the stored snapshot.
pub async fn put_graph<S>(
  State(persistence): State<Persistence<S>>,
  Path(id): Path<Uuid>,
  Json(graph): Json<GraphData>,
) -> Result<Json<Conspiracy>, ApiError>
where
  S: BoardStore,
{
  Ok(Json(persistence.put_graph(Session::new(id), &graph).await?))
}
