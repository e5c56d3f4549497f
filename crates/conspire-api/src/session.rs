//! `GET /session?<id>`: decide which board the client works on.
//!
//! The board id is the first key of the query string. An existing board is
//! returned with `200`; otherwise the client is sent to the most recent
//! board (created when none exist) with `303 See Other`.

use axum::{
  Json,
  extract::{RawQuery, State},
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use conspire_core::{session::requested_board, store::BoardStore};
use conspire_persist::{Persistence, Resolution};

use crate::error::ApiError;

pub async fn resolve<S>(
  State(persistence): State<Persistence<S>>,
  RawQuery(query): RawQuery,
) -> Result<Response, ApiError>
where
  S: BoardStore,
{
  let requested = query.as_deref().and_then(requested_board);

  let response = match persistence.resolve_session(requested).await? {
    Resolution::Existing(c) => Json(c).into_response(),
    redirect @ Resolution::Redirect(_) => {
      // Relative to the current path, so nesting the router keeps working.
      let location = redirect.session().query();
      (
        StatusCode::SEE_OTHER,
        [(header::LOCATION, location)],
        Json(redirect.conspiracy().clone()),
      )
        .into_response()
    }
  };
  Ok(response)
}
