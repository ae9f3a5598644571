//! Core types for feedstore
//!
//! This crate contains domain types shared across all other crates:
//! items, sources, tags, query options, sync request/response shapes,
//! and the store configuration.

mod config;
mod error;
mod item;
mod query;
mod source;
mod stats;
mod sync;
mod tag;

pub use config::*;
pub use error::*;
pub use item::*;
pub use query::*;
pub use source::*;
pub use stats::*;
pub use sync::*;
pub use tag::*;
