//! Multi-tenant metadata discovery: asset indexing, search and autocomplete
//! over Elasticsearch, isolated per namespace.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod namespace;
pub mod search;

pub use error::{AppError, Result};
