//! Versioned backup and diff-and-apply restore
//!
//! Restoring never drops and recreates the whole configuration: the
//! service diffs the live state against the stored snapshot and applies
//! only the resulting changeset, preserving timestamps and foreign keys
//! on untouched rows. The store applies a changeset inside one
//! transaction, deleting children before parents and creating parents
//! before children; any failure rolls the whole restore back.
//!
//! Consistency caveat: calculation requests running concurrently with a
//! restore observe pre- or post-restore rows thanks to transaction
//! atomicity, but under read-committed isolation nothing stops a read
//! from starting mid-window. That is a documented limitation, not a
//! guarantee.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use core_kernel::{DomainPort, FboId, PortError, ScheduleVersionId, UserId};

use crate::diff::{diff_configurations, ScheduleDiff};
use crate::error::ScheduleError;
use crate::snapshot::{FeeScheduleSnapshot, FeeScheduleVersion};

/// Live fee-configuration state, snapshot and bulk-apply
#[async_trait]
pub trait ScheduleStore: DomainPort {
    /// Serializes the current configuration of one FBO
    async fn current_snapshot(&self, fbo: FboId) -> Result<FeeScheduleSnapshot, PortError>;

    /// Applies a changeset atomically, honoring the diff's dependency
    /// ordering; implementations must roll back fully on any failure
    async fn apply_diff(&self, fbo: FboId, diff: &ScheduleDiff) -> Result<(), PortError>;
}

/// Stored restore points
#[async_trait]
pub trait VersionRepository: DomainPort {
    async fn insert(&self, version: &FeeScheduleVersion) -> Result<(), PortError>;

    async fn find(&self, id: ScheduleVersionId)
        -> Result<Option<FeeScheduleVersion>, PortError>;

    async fn list(&self, fbo: FboId) -> Result<Vec<FeeScheduleVersion>, PortError>;
}

/// Per-collection change counts reported after a restore
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct CollectionCounts {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

/// What a restore changed, per collection
#[derive(Debug, Clone, serde::Serialize)]
pub struct RestoreSummary {
    pub version_id: ScheduleVersionId,
    pub collections: BTreeMap<String, CollectionCounts>,
}

impl RestoreSummary {
    fn from_diff(version_id: ScheduleVersionId, diff: &ScheduleDiff) -> Self {
        let collections = diff
            .create_order()
            .iter()
            .map(|(name, changes)| {
                (
                    name.to_string(),
                    CollectionCounts {
                        created: changes.create.len(),
                        updated: changes.update.len(),
                        deleted: changes.delete.len(),
                    },
                )
            })
            .collect();
        Self {
            version_id,
            collections,
        }
    }

    pub fn total_changes(&self) -> usize {
        self.collections
            .values()
            .map(|c| c.created + c.updated + c.deleted)
            .sum()
    }
}

/// Admin fee configuration service: versioning and restore
#[derive(Clone)]
pub struct ScheduleConfigService {
    store: Arc<dyn ScheduleStore>,
    versions: Arc<dyn VersionRepository>,
}

impl ScheduleConfigService {
    pub fn new(store: Arc<dyn ScheduleStore>, versions: Arc<dyn VersionRepository>) -> Self {
        Self { store, versions }
    }

    /// Captures the current configuration as a new immutable version
    pub async fn create_version(
        &self,
        fbo: FboId,
        name: impl Into<String>,
        description: Option<String>,
        created_by: UserId,
    ) -> Result<FeeScheduleVersion, ScheduleError> {
        let snapshot = self.store.current_snapshot(fbo).await?;
        let version = FeeScheduleVersion::new(fbo, name, description, created_by, snapshot);
        self.versions.insert(&version).await?;
        info!(version_id = %version.id, name = %version.name, "fee schedule version saved");
        Ok(version)
    }

    pub async fn list_versions(&self, fbo: FboId) -> Result<Vec<FeeScheduleVersion>, ScheduleError> {
        Ok(self.versions.list(fbo).await?)
    }

    /// Reverts the live configuration to a stored version
    ///
    /// Diffs the current state against the version's snapshot and applies
    /// the changeset in one transaction; a no-op diff skips the write
    /// entirely.
    pub async fn restore_from_version(
        &self,
        version_id: ScheduleVersionId,
    ) -> Result<RestoreSummary, ScheduleError> {
        let version = self
            .versions
            .find(version_id)
            .await?
            .ok_or(ScheduleError::VersionNotFound(version_id))?;

        let current = self.store.current_snapshot(version.fbo_location_id).await?;
        let diff = diff_configurations(&current, &version.configuration_data);
        let summary = RestoreSummary::from_diff(version_id, &diff);

        if diff.is_empty() {
            info!(version_id = %version_id, "restore is a no-op; configuration already matches");
            return Ok(summary);
        }

        self.store.apply_diff(version.fbo_location_id, &diff).await?;
        info!(
            version_id = %version_id,
            changes = summary.total_changes(),
            "fee schedule restored"
        );
        Ok(summary)
    }
}

impl std::fmt::Debug for ScheduleConfigService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleConfigService").finish_non_exhaustive()
    }
}
