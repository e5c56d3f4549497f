//! The persistence facade for conspiracy boards.
//!
//! [`Persistence`] wraps any [`BoardStore`](conspire_core::store::BoardStore)
//! and is the only way the outer layers (HTTP API, CLI) touch stored boards.
//! It adds the operations that span stores: stamping a board when its graph
//! changes, resolving the active [`Session`](conspire_core::session::Session),
//! ingesting uploaded files, and archive export/import.

pub mod error;
mod archive;
mod facade;

pub use archive::Export;
pub use error::{Error, Result};
pub use facade::{Persistence, Resolution};

#[cfg(test)]
mod tests;
