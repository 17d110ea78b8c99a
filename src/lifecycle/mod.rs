//! Version lifecycle engine.
//!
//! Everything here works on plain [`PackageArtifact`](crate::store::PackageArtifact)
//! snapshots; only [`monitor`] talks to the store, through the
//! [`PackageStore`](crate::store::PackageStore) trait.

pub mod catalog;
pub mod detect;
pub mod minor;
pub mod monitor;
pub mod retention;

pub use catalog::{Catalog, VersionAggregate};
pub use detect::check_for_new_versions;
pub use minor::{last_minor_patches, latest_minor};
pub use monitor::{ArtifactReport, MonitorReport, SyncMonitor, SyncOutcome, SyncPolicy};
pub use retention::{RetentionDecision, RetentionOrder, decide_retention, filter_for_deletion};
