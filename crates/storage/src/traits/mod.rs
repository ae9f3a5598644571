//! Store trait surface.
//!
//! One async trait per domain concern. Every operation the rest of the
//! system needs is listed here, so an engine that misses one fails to
//! compile instead of failing a runtime lookup.

mod items;
mod sources;
mod stats;
mod tags;

pub use items::ItemStore;
pub use sources::SourceStore;
pub use stats::StatsStore;
pub use tags::TagStore;

use crate::error::StorageError;
use async_trait::async_trait;

/// Schema-level introspection, used by startup checks and tests.
#[async_trait]
pub trait SchemaStore: Send + Sync {
    /// Highest applied migration version.
    async fn schema_version(&self) -> Result<i32, StorageError>;
}
