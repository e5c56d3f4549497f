//! Archive download and upload.

use axum::{
  extract::{Path, State},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use bytes::Bytes;
use conspire_core::{session::Session, store::BoardStore};
use conspire_persist::Persistence;
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /conspiracies/:id/archive`: `application/zip` attachment named
/// after the board.
pub async fn export<S>(
  State(persistence): State<Persistence<S>>,
  Path(id): Path<Uuid>,
) -> Result<Response, ApiError>
where
  S: BoardStore,
{
  let export = persistence.export(Session::new(id)).await?;

  let file_name = export.file_name.replace(['"', '\\', '\r', '\n'], "_");
  let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

  Ok(
    (
      [
        (header::CONTENT_TYPE, HeaderValue::from_static("application/zip")),
        (header::CONTENT_DISPOSITION, disposition),
      ],
      export.bytes,
    )
      .into_response(),
  )
}

/// `POST /archives`: body is a zip produced by export.
///
/// Redirects (303) to the session address of the imported board.
pub async fn import<S>(
  State(persistence): State<Persistence<S>>,
  body: Bytes,
) -> Result<Response, ApiError>
where
  S: BoardStore,
{
  let conspiracy = persistence.import(&body).await?;
  let location = format!("session{}", Session::from(&conspiracy).query());
  Ok((StatusCode::SEE_OTHER, [(header::LOCATION, location)]).into_response())
}
