//! rcrebuild - recent changes feed reconciliation.
//!
//! Core library exposing the rebuild passes, their storage layer and the
//! collaborators they consume (permission lookup, object cache).

// Model types use `from_str` methods that return Option<Self>,
// not Result<Self, Error> as std::str::FromStr requires.
#![allow(clippy::should_implement_trait)]

pub mod cache;
pub mod cli;
pub mod config;
pub mod models;
pub mod permissions;
pub mod rebuild;
pub mod repository;
pub mod schema;
