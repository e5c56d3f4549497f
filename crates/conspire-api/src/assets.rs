//! Asset upload and download.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use bytes::Bytes;
use conspire_core::{asset::AssetId, session::Session, store::BoardStore};
use conspire_persist::Persistence;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Debug, Deserialize)]
pub struct UploadParams {
  /// Original file name, kept on the asset and the node.
  pub name: Option<String>,
}

/// `POST /conspiracies/:id/assets[?name=<file name>]`
///
/// The raw request body is the payload and `Content-Type` its MIME type.
/// Returns 201 + the image node placed on the board.
pub async fn upload<S>(
  State(persistence): State<Persistence<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<UploadParams>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  S: BoardStore,
{
  if body.is_empty() {
    return Err(ApiError::BadRequest("empty upload".into()));
  }
  let mime = headers
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .unwrap_or(FALLBACK_MIME)
    .to_owned();

  let node = persistence
    .upload(Session::new(id), params.name, &mime, body.to_vec())
    .await?;
  Ok((StatusCode::CREATED, Json(node)))
}

/// `GET /assets/:id`: raw payload with its stored MIME type.
pub async fn get_one<S>(
  State(persistence): State<Persistence<S>>,
  Path(id): Path<String>,
) -> Result<Response, ApiError>
where
  S: BoardStore,
{
  let id = AssetId::parse(&id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
  let asset = persistence.get_asset(&id).await?;

  let content_type = HeaderValue::from_str(&asset.mime_type)
    .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_MIME));
  Ok(([(header::CONTENT_TYPE, content_type)], asset.data).into_response())
}
