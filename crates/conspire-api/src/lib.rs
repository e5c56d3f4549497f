//! JSON/HTTP API for conspiracy boards.
//!
//! Exposes an axum [`Router`] backed by a [`Persistence`] facade over any
//! [`conspire_core::store::BoardStore`]. TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", conspire_api::api_router(persistence.clone()))
//! ```

pub mod archives;
pub mod assets;
pub mod conspiracies;
pub mod error;
pub mod session;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post, put},
};
use conspire_core::store::BoardStore;
use conspire_persist::Persistence;

pub use error::ApiError;

/// Largest request body accepted (uploads and archive imports).
pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Build a fully-materialised API router for `persistence`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(persistence: Persistence<S>) -> Router<()>
where
  S: BoardStore + 'static,
{
  Router::new()
    .route("/session", get(session::resolve::<S>))
    // Registry
    .route("/conspiracies", get(conspiracies::list::<S>))
    .route("/conspiracies/{id}", get(conspiracies::get_one::<S>))
    .route("/conspiracies/{id}/name", put(conspiracies::rename::<S>))
    // Graph
    .route(
      "/conspiracies/{id}/graph",
      get(conspiracies::get_graph::<S>).put(conspiracies::put_graph::<S>),
    )
    // Assets
    .route("/conspiracies/{id}/assets", post(assets::upload::<S>))
    .route("/assets/{id}", get(assets::get_one::<S>))
    // Archives
    .route("/conspiracies/{id}/archive", get(archives::export::<S>))
    .route("/archives", post(archives::import::<S>))
    .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
    .with_state(persistence)
}
