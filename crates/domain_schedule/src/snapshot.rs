//! Fee schedule snapshots and versions
//!
//! A snapshot is the full fee configuration for one FBO as flat JSON
//! records, the same shape the admin export produces: each collection is
//! a list of field-maps carrying `id`, the business fields, and ISO-8601
//! `created_at`/`updated_at` stamps. Collections missing from a stored
//! document deserialize as empty lists rather than errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use core_kernel::{FboId, ScheduleVersionId, UserId};

/// The full fee configuration for one FBO location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeScheduleSnapshot {
    #[serde(default)]
    pub classifications: Vec<Value>,
    #[serde(default)]
    pub aircraft_types: Vec<Value>,
    #[serde(default)]
    pub fee_rules: Vec<Value>,
    #[serde(default)]
    pub overrides: Vec<Value>,
    #[serde(default)]
    pub waiver_tiers: Vec<Value>,
    #[serde(default)]
    pub aircraft_type_configs: Vec<Value>,
}

impl FeeScheduleSnapshot {
    pub fn is_empty(&self) -> bool {
        self.classifications.is_empty()
            && self.aircraft_types.is_empty()
            && self.fee_rules.is_empty()
            && self.overrides.is_empty()
            && self.waiver_tiers.is_empty()
            && self.aircraft_type_configs.is_empty()
    }
}

/// An immutable restore point: a named snapshot plus metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeScheduleVersion {
    pub id: ScheduleVersionId,
    pub fbo_location_id: FboId,
    pub name: String,
    pub description: Option<String>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub configuration_data: FeeScheduleSnapshot,
}

impl FeeScheduleVersion {
    pub fn new(
        fbo_location_id: FboId,
        name: impl Into<String>,
        description: Option<String>,
        created_by: UserId,
        configuration_data: FeeScheduleSnapshot,
    ) -> Self {
        Self {
            id: ScheduleVersionId::new_v7(),
            fbo_location_id,
            name: name.into(),
            description,
            created_by,
            created_at: Utc::now(),
            configuration_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_collections_deserialize_as_empty_lists() {
        let snapshot: FeeScheduleSnapshot =
            serde_json::from_value(json!({ "fee_rules": [{"id": "a", "amount": 75.0}] })).unwrap();

        assert_eq!(snapshot.fee_rules.len(), 1);
        assert!(snapshot.classifications.is_empty());
        assert!(snapshot.aircraft_type_configs.is_empty());
    }
}
