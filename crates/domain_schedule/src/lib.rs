//! Fee Schedule Administration Domain
//!
//! Supports reverting live fee configuration to a previously saved
//! snapshot without dropping and recreating every row:
//!
//! - [`FeeScheduleSnapshot`]: the JSON shape of a full fee configuration
//!   (classifications, aircraft types, fee rules, overrides, waiver
//!   tiers, per-FBO aircraft configs)
//! - [`diff_configurations`]: computes per-collection create/update/
//!   delete changesets between the current configuration and a stored
//!   snapshot, ignoring timestamps and serialization noise
//! - [`ScheduleConfigService`]: captures versions and applies a restore
//!   changeset atomically in foreign-key dependency order

pub mod diff;
pub mod error;
pub mod restore;
pub mod snapshot;

pub use diff::{diff_configurations, CollectionChanges, ScheduleDiff};
pub use error::ScheduleError;
pub use restore::{
    CollectionCounts, RestoreSummary, ScheduleConfigService, ScheduleStore, VersionRepository,
};
pub use snapshot::{FeeScheduleSnapshot, FeeScheduleVersion};
