//! Core types and trait definitions for the conspiracy board store.
//!
//! This crate is deliberately free of HTTP, archive and database
//! dependencies. Every other crate depends on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod asset;
pub mod conspiracy;
pub mod error;
pub mod graph;
pub mod session;
pub mod store;

pub use error::{Error, Result};
