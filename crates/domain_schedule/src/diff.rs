//! Configuration diffing
//!
//! Computes the changeset that turns the current fee configuration into
//! a stored snapshot, per entity collection independently:
//!
//! - ids only in the backup become creates (timestamps stripped)
//! - ids only in the current state become deletes (id only)
//! - ids in both are field-compared ignoring `created_at`/`updated_at`,
//!   with numeric tolerance for serialization round-trips and
//!   order-insensitive array equality; differing records become updates
//!   carrying the backup's version
//!
//! `null` and `0`/`0.0` are distinct states, never considered equal.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::snapshot::FeeScheduleSnapshot;

/// Fields excluded from record comparison and from create payloads
const TIMESTAMP_FIELDS: [&str; 2] = ["created_at", "updated_at"];

/// Tolerance for numbers that round-tripped through floating point
const NUMERIC_TOLERANCE: f64 = 1e-6;

/// Changeset for one entity collection
#[derive(Debug, Clone, Default)]
pub struct CollectionChanges {
    pub create: Vec<Value>,
    pub update: Vec<Value>,
    /// The ids of the records to remove
    pub delete: Vec<Value>,
}

impl CollectionChanges {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

/// The full changeset across every collection
#[derive(Debug, Clone, Default)]
pub struct ScheduleDiff {
    pub classifications: CollectionChanges,
    pub aircraft_types: CollectionChanges,
    pub fee_rules: CollectionChanges,
    pub overrides: CollectionChanges,
    pub waiver_tiers: CollectionChanges,
    pub aircraft_type_configs: CollectionChanges,
}

impl ScheduleDiff {
    pub fn is_empty(&self) -> bool {
        self.create_order().iter().all(|(_, c)| c.is_empty())
    }

    /// Collections in create order: parents before children, so foreign
    /// keys resolve as rows are inserted
    pub fn create_order(&self) -> [(&'static str, &CollectionChanges); 6] {
        [
            ("classifications", &self.classifications),
            ("aircraft_types", &self.aircraft_types),
            ("fee_rules", &self.fee_rules),
            ("overrides", &self.overrides),
            ("waiver_tiers", &self.waiver_tiers),
            ("aircraft_type_configs", &self.aircraft_type_configs),
        ]
    }

    /// Collections in delete order: children before parents
    pub fn delete_order(&self) -> [(&'static str, &CollectionChanges); 6] {
        [
            ("aircraft_type_configs", &self.aircraft_type_configs),
            ("waiver_tiers", &self.waiver_tiers),
            ("overrides", &self.overrides),
            ("fee_rules", &self.fee_rules),
            ("aircraft_types", &self.aircraft_types),
            ("classifications", &self.classifications),
        ]
    }
}

/// Diffs two snapshots, collection by collection
pub fn diff_configurations(
    current: &FeeScheduleSnapshot,
    backup: &FeeScheduleSnapshot,
) -> ScheduleDiff {
    ScheduleDiff {
        classifications: diff_collection(&current.classifications, &backup.classifications),
        aircraft_types: diff_collection(&current.aircraft_types, &backup.aircraft_types),
        fee_rules: diff_collection(&current.fee_rules, &backup.fee_rules),
        overrides: diff_collection(&current.overrides, &backup.overrides),
        waiver_tiers: diff_collection(&current.waiver_tiers, &backup.waiver_tiers),
        aircraft_type_configs: diff_collection(
            &current.aircraft_type_configs,
            &backup.aircraft_type_configs,
        ),
    }
}

fn diff_collection(current: &[Value], backup: &[Value]) -> CollectionChanges {
    let current_by_id = index_by_id(current);
    let backup_by_id = index_by_id(backup);
    let mut changes = CollectionChanges::default();

    for (id, backup_record) in &backup_by_id {
        match current_by_id.get(id) {
            None => changes.create.push(strip_timestamps(backup_record)),
            Some(current_record) => {
                if !records_equal(current_record, backup_record) {
                    changes.update.push((*backup_record).clone());
                }
            }
        }
    }

    for (id, current_record) in &current_by_id {
        if !backup_by_id.contains_key(id) {
            if let Some(id_value) = current_record.get("id") {
                changes.delete.push(id_value.clone());
            }
        }
    }

    changes
}

/// Keys records by the canonical string form of their `id` field;
/// records without an id cannot be correlated and are ignored
fn index_by_id(records: &[Value]) -> BTreeMap<String, &Value> {
    records
        .iter()
        .filter_map(|record| record_id(record).map(|id| (id, record)))
        .collect()
}

fn record_id(record: &Value) -> Option<String> {
    match record.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn strip_timestamps(record: &Value) -> Value {
    match record {
        Value::Object(map) => {
            let stripped: Map<String, Value> = map
                .iter()
                .filter(|(key, _)| !TIMESTAMP_FIELDS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            Value::Object(stripped)
        }
        other => other.clone(),
    }
}

/// Field-wise comparison over the union of keys, timestamps excluded
fn records_equal(a: &Value, b: &Value) -> bool {
    let (Value::Object(a_map), Value::Object(b_map)) = (a, b) else {
        return values_equivalent(a, b);
    };

    let keys: std::collections::BTreeSet<&String> = a_map
        .keys()
        .chain(b_map.keys())
        .filter(|key| !TIMESTAMP_FIELDS.contains(&key.as_str()))
        .collect();

    keys.into_iter().all(|key| {
        values_equivalent(
            a_map.get(key).unwrap_or(&Value::Null),
            b_map.get(key).unwrap_or(&Value::Null),
        )
    })
}

fn values_equivalent(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => (x - y).abs() <= NUMERIC_TOLERANCE,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => arrays_equivalent_unordered(xs, ys),
        (Value::Object(_), Value::Object(_)) => records_equal(a, b),
        _ => a == b,
    }
}

/// Multiset equality: every element of one array matches a distinct
/// element of the other, regardless of order
fn arrays_equivalent_unordered(xs: &[Value], ys: &[Value]) -> bool {
    if xs.len() != ys.len() {
        return false;
    }

    let mut unmatched: Vec<&Value> = ys.iter().collect();
    for x in xs {
        match unmatched.iter().position(|y| values_equivalent(x, y)) {
            Some(index) => {
                unmatched.swap_remove(index);
            }
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_and_zero_are_distinct() {
        assert!(!values_equivalent(&Value::Null, &json!(0)));
        assert!(!values_equivalent(&Value::Null, &json!(0.0)));
        assert!(values_equivalent(&json!(0), &json!(0.0)));
    }

    #[test]
    fn numeric_tolerance_absorbs_round_trip_noise() {
        assert!(values_equivalent(&json!(75.0), &json!(75.0000000001)));
        assert!(!values_equivalent(&json!(75.0), &json!(75.01)));
    }

    #[test]
    fn arrays_compare_as_multisets() {
        assert!(arrays_equivalent_unordered(
            &[json!("RAMP"), json!("GPU")],
            &[json!("GPU"), json!("RAMP")]
        ));
        assert!(!arrays_equivalent_unordered(
            &[json!("RAMP"), json!("RAMP")],
            &[json!("RAMP"), json!("GPU")]
        ));
    }
}
