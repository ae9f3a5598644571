//! Business layer over the feedstore persistence core.
//!
//! [`ItemService`] validates and answers item queries and mutations,
//! [`SyncService`] coordinates delta synchronization with offline
//! clients, and [`MaintenanceService`] runs retention cleanup. All three
//! share one [`feedstore_storage::StorageBackend`].

mod error;
mod item_service;
mod maintenance;
mod sync_service;


pub use error::ServiceError;
pub use item_service::{EntriesPage, ItemService};
pub use maintenance::{CleanupReport, MaintenanceService};
pub use sync_service::SyncService;
