//! Catalog sync orchestration, batch dispatch and progress tracking.
//!
//! The orchestrator and the tracker only see the trait seams in [`ports`].
//! [`adapters`] binds those seams to Postgres and the catalog HTTP client.

pub mod adapters;
pub mod batch;
pub mod error;
pub mod orchestrator;
pub mod ports;
pub mod tracker;

pub use adapters::PgStore;
pub use batch::{BatchDispatcher, DispatchedBatch};
pub use error::SyncError;
pub use orchestrator::{SyncOrchestrator, SyncReport, SyncRequest, SyncResult};
pub use ports::{
    AttributeCatalog, CatalogGateway, JobStore, ProductStore, ProgressObserver, StatusSource,
};
pub use tracker::{LogObserver, ProgressTracker, TrackerConfig, TrackerHandle};
