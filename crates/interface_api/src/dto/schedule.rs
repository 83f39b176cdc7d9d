//! Fee schedule administration DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

use domain_schedule::{CollectionCounts, FeeScheduleVersion, RestoreSummary};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVersionRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub fbo_location_id: Uuid,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ListVersionsQuery {
    pub fbo_location_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub id: Uuid,
    pub fbo_location_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<&FeeScheduleVersion> for VersionResponse {
    fn from(version: &FeeScheduleVersion) -> Self {
        Self {
            id: *version.id.as_uuid(),
            fbo_location_id: *version.fbo_location_id.as_uuid(),
            name: version.name.clone(),
            description: version.description.clone(),
            created_by: *version.created_by.as_uuid(),
            created_at: version.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RestoreResponse {
    pub version_id: Uuid,
    pub total_changes: usize,
    pub collections: BTreeMap<String, CollectionCounts>,
}

impl From<RestoreSummary> for RestoreResponse {
    fn from(summary: RestoreSummary) -> Self {
        Self {
            version_id: *summary.version_id.as_uuid(),
            total_changes: summary.total_changes(),
            collections: summary.collections,
        }
    }
}
