//! Fee schedule store and version repository
//!
//! The store serializes the live configuration with `row_to_json` (the
//! same flat shape the snapshot format specifies) and applies restore
//! changesets inside one transaction, deleting children before parents
//! and creating parents before children so foreign keys hold at every
//! step. Any failure rolls the whole restore back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use core_kernel::{DomainPort, FboId, PortError, ScheduleVersionId};
use domain_schedule::{
    CollectionChanges, FeeScheduleSnapshot, FeeScheduleVersion, ScheduleDiff, ScheduleStore,
    VersionRepository,
};

use crate::error::map_sqlx;

/// Live configuration adapter for snapshot and restore
#[derive(Debug, Clone)]
pub struct PostgresScheduleStore {
    pool: PgPool,
}

fn table_for(collection: &str) -> Result<&'static str, PortError> {
    match collection {
        "classifications" => Ok("aircraft_classifications"),
        "aircraft_types" => Ok("aircraft_types"),
        "fee_rules" => Ok("fee_rules"),
        "overrides" => Ok("fee_rule_overrides"),
        "waiver_tiers" => Ok("waiver_tiers"),
        "aircraft_type_configs" => Ok("fbo_aircraft_type_configs"),
        other => Err(PortError::internal(format!("unknown collection '{other}'"))),
    }
}

/// Per-table UPDATE applying a backup record by id; `created_at` is left
/// untouched so unchanged history survives a restore.
fn update_sql_for(collection: &str) -> Result<&'static str, PortError> {
    match collection {
        "classifications" => Ok("UPDATE aircraft_classifications AS t SET \
             fbo_location_id = r.fbo_location_id, name = r.name, updated_at = now() \
             FROM jsonb_populate_record(NULL::aircraft_classifications, $1) AS r \
             WHERE t.id = r.id"),
        "aircraft_types" => Ok("UPDATE aircraft_types AS t SET \
             name = r.name, \
             base_min_fuel_gallons_for_waiver = r.base_min_fuel_gallons_for_waiver, \
             default_classification_id = r.default_classification_id, \
             default_max_gross_weight_lbs = r.default_max_gross_weight_lbs, \
             updated_at = now() \
             FROM jsonb_populate_record(NULL::aircraft_types, $1) AS r \
             WHERE t.id = r.id"),
        "fee_rules" => Ok("UPDATE fee_rules AS t SET \
             fbo_location_id = r.fbo_location_id, fee_code = r.fee_code, \
             fee_name = r.fee_name, amount = r.amount, currency = r.currency, \
             is_taxable = r.is_taxable, \
             is_potentially_waivable_by_fuel_uplift = r.is_potentially_waivable_by_fuel_uplift, \
             is_manually_waivable = r.is_manually_waivable, \
             calculation_basis = r.calculation_basis, waiver_strategy = r.waiver_strategy, \
             simple_waiver_multiplier = r.simple_waiver_multiplier, \
             has_caa_override = r.has_caa_override, \
             caa_override_amount = r.caa_override_amount, \
             caa_waiver_strategy_override = r.caa_waiver_strategy_override, \
             caa_simple_waiver_multiplier_override = r.caa_simple_waiver_multiplier_override, \
             applies_to_classification_id = r.applies_to_classification_id, \
             updated_at = now() \
             FROM jsonb_populate_record(NULL::fee_rules, $1) AS r \
             WHERE t.id = r.id"),
        "overrides" => Ok("UPDATE fee_rule_overrides AS t SET \
             fee_rule_id = r.fee_rule_id, classification_id = r.classification_id, \
             aircraft_type_id = r.aircraft_type_id, override_amount = r.override_amount, \
             override_caa_amount = r.override_caa_amount, updated_at = now() \
             FROM jsonb_populate_record(NULL::fee_rule_overrides, $1) AS r \
             WHERE t.id = r.id"),
        "waiver_tiers" => Ok("UPDATE waiver_tiers AS t SET \
             fbo_location_id = r.fbo_location_id, name = r.name, \
             fuel_uplift_multiplier = r.fuel_uplift_multiplier, \
             fees_waived_codes = r.fees_waived_codes, tier_priority = r.tier_priority, \
             is_caa_specific_tier = r.is_caa_specific_tier, updated_at = now() \
             FROM jsonb_populate_record(NULL::waiver_tiers, $1) AS r \
             WHERE t.id = r.id"),
        "aircraft_type_configs" => Ok("UPDATE fbo_aircraft_type_configs AS t SET \
             fbo_location_id = r.fbo_location_id, aircraft_type_id = r.aircraft_type_id, \
             base_min_fuel_gallons_for_waiver = r.base_min_fuel_gallons_for_waiver, \
             updated_at = now() \
             FROM jsonb_populate_record(NULL::fbo_aircraft_type_configs, $1) AS r \
             WHERE t.id = r.id"),
        other => Err(PortError::internal(format!("unknown collection '{other}'"))),
    }
}

fn delete_ids(changes: &CollectionChanges) -> Result<Vec<Uuid>, PortError> {
    changes
        .delete
        .iter()
        .map(|id| match id {
            Value::String(s) => Uuid::parse_str(s)
                .map_err(|e| PortError::internal(format!("bad id in changeset: {e}"))),
            other => Err(PortError::internal(format!(
                "non-string id in changeset: {other}"
            ))),
        })
        .collect()
}

/// Stamps fresh timestamps onto a create payload; the diff strips them,
/// and `INSERT ... SELECT` bypasses the column defaults.
fn with_fresh_timestamps(record: &Value) -> Value {
    let mut record = record.clone();
    if let Value::Object(map) = &mut record {
        let now = Value::String(Utc::now().to_rfc3339());
        map.insert("created_at".to_string(), now.clone());
        map.insert("updated_at".to_string(), now);
    }
    record
}

impl PostgresScheduleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn collection_snapshot(
        &self,
        fbo: FboId,
        collection: &str,
    ) -> Result<Vec<Value>, PortError> {
        // Aircraft types are a global roster; every other collection is
        // FBO-scoped and takes the location as $1.
        let (sql, fbo_scoped) = match collection {
            "classifications" => (
                "SELECT row_to_json(t) FROM aircraft_classifications t \
                 WHERE fbo_location_id = $1 ORDER BY t.id",
                true,
            ),
            "aircraft_types" => (
                "SELECT row_to_json(t) FROM aircraft_types t ORDER BY t.id",
                false,
            ),
            "fee_rules" => (
                "SELECT row_to_json(t) FROM fee_rules t \
                 WHERE fbo_location_id = $1 ORDER BY t.id",
                true,
            ),
            "overrides" => (
                "SELECT row_to_json(o) FROM fee_rule_overrides o \
                 JOIN fee_rules r ON r.id = o.fee_rule_id \
                 WHERE r.fbo_location_id = $1 ORDER BY o.id",
                true,
            ),
            "waiver_tiers" => (
                "SELECT row_to_json(t) FROM waiver_tiers t \
                 WHERE fbo_location_id = $1 ORDER BY t.id",
                true,
            ),
            "aircraft_type_configs" => (
                "SELECT row_to_json(t) FROM fbo_aircraft_type_configs t \
                 WHERE fbo_location_id = $1 ORDER BY t.id",
                true,
            ),
            other => {
                return Err(PortError::internal(format!(
                    "unknown collection '{other}'"
                )))
            }
        };

        let mut query = sqlx::query_scalar::<_, Value>(sql);
        if fbo_scoped {
            query = query.bind(*fbo.as_uuid());
        }
        query.fetch_all(&self.pool).await.map_err(map_sqlx)
    }

    async fn apply_collection(
        tx: &mut Transaction<'_, Postgres>,
        collection: &str,
        changes: &CollectionChanges,
    ) -> Result<(), PortError> {
        let table = table_for(collection)?;

        for record in &changes.update {
            sqlx::query(update_sql_for(collection)?)
                .bind(record)
                .execute(&mut **tx)
                .await
                .map_err(map_sqlx)?;
        }

        for record in &changes.create {
            let sql = format!(
                "INSERT INTO {table} SELECT * FROM jsonb_populate_record(NULL::{table}, $1)"
            );
            sqlx::query(&sql)
                .bind(with_fresh_timestamps(record))
                .execute(&mut **tx)
                .await
                .map_err(map_sqlx)?;
        }

        Ok(())
    }
}

impl DomainPort for PostgresScheduleStore {}

#[async_trait]
impl ScheduleStore for PostgresScheduleStore {
    async fn current_snapshot(&self, fbo: FboId) -> Result<FeeScheduleSnapshot, PortError> {
        Ok(FeeScheduleSnapshot {
            classifications: self.collection_snapshot(fbo, "classifications").await?,
            aircraft_types: self.collection_snapshot(fbo, "aircraft_types").await?,
            fee_rules: self.collection_snapshot(fbo, "fee_rules").await?,
            overrides: self.collection_snapshot(fbo, "overrides").await?,
            waiver_tiers: self.collection_snapshot(fbo, "waiver_tiers").await?,
            aircraft_type_configs: self
                .collection_snapshot(fbo, "aircraft_type_configs")
                .await?,
        })
    }

    async fn apply_diff(&self, _fbo: FboId, diff: &ScheduleDiff) -> Result<(), PortError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        // Children first, so parent rows are free of references by the
        // time their deletes run
        for (collection, changes) in diff.delete_order() {
            if changes.delete.is_empty() {
                continue;
            }
            let table = table_for(collection)?;
            let ids = delete_ids(changes)?;
            let sql = format!("DELETE FROM {table} WHERE id = ANY($1)");
            sqlx::query(&sql)
                .bind(&ids)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx)?;
        }

        // Parents first for creates and updates
        for (collection, changes) in diff.create_order() {
            if changes.create.is_empty() && changes.update.is_empty() {
                continue;
            }
            Self::apply_collection(&mut tx, collection, changes).await?;
        }

        tx.commit().await.map_err(map_sqlx)
    }
}

/// Stored fee schedule versions
#[derive(Debug, Clone)]
pub struct PostgresVersionRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct VersionRow {
    id: Uuid,
    fbo_location_id: Uuid,
    name: String,
    description: Option<String>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    configuration_data: Value,
}

impl PostgresVersionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn to_domain(row: VersionRow) -> Result<FeeScheduleVersion, PortError> {
        let configuration_data = serde_json::from_value(row.configuration_data)
            .map_err(|e| PortError::internal(format!("bad configuration_data payload: {e}")))?;
        Ok(FeeScheduleVersion {
            id: row.id.into(),
            fbo_location_id: row.fbo_location_id.into(),
            name: row.name,
            description: row.description,
            created_by: row.created_by.into(),
            created_at: row.created_at,
            configuration_data,
        })
    }
}

impl DomainPort for PostgresVersionRepository {}

#[async_trait]
impl VersionRepository for PostgresVersionRepository {
    async fn insert(&self, version: &FeeScheduleVersion) -> Result<(), PortError> {
        let configuration_data = serde_json::to_value(&version.configuration_data)
            .map_err(|e| PortError::internal(e.to_string()))?;

        sqlx::query(
            "INSERT INTO fee_schedule_versions \
             (id, fbo_location_id, name, description, created_by, created_at, \
              configuration_data) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(*version.id.as_uuid())
        .bind(*version.fbo_location_id.as_uuid())
        .bind(&version.name)
        .bind(&version.description)
        .bind(*version.created_by.as_uuid())
        .bind(version.created_at)
        .bind(configuration_data)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn find(
        &self,
        id: ScheduleVersionId,
    ) -> Result<Option<FeeScheduleVersion>, PortError> {
        let row = sqlx::query_as::<_, VersionRow>(
            "SELECT id, fbo_location_id, name, description, created_by, created_at, \
             configuration_data \
             FROM fee_schedule_versions WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(Self::to_domain).transpose()
    }

    async fn list(&self, fbo: FboId) -> Result<Vec<FeeScheduleVersion>, PortError> {
        sqlx::query_as::<_, VersionRow>(
            "SELECT id, fbo_location_id, name, description, created_by, created_at, \
             configuration_data \
             FROM fee_schedule_versions WHERE fbo_location_id = $1 \
             ORDER BY created_at DESC",
        )
        .bind(*fbo.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?
        .into_iter()
        .map(Self::to_domain)
        .collect()
    }
}
