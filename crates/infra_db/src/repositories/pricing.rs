//! Pricing catalog adapter
//!
//! Assembles the `PricingCatalog` the fee calculation engine consumes:
//! the customer's CAA standing, the aircraft's classification and waiver
//! minimum (with the FBO-specific override), and the FBO's fee rules,
//! overrides, and waiver tiers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::{AircraftTypeId, CustomerId, DomainPort, FboId, Money, PortError};
use domain_pricing::{
    AircraftType, FeeRule, FeeRuleOverride, OverrideScope, PricingCatalog, WaiverTier,
};
use domain_receipts::PricingCatalogSource;

use crate::error::map_sqlx;
use crate::repositories::mapping::{
    parse_calculation_basis, parse_currency, parse_waiver_strategy,
};

/// Read-side adapter over the fee configuration tables
#[derive(Debug, Clone)]
pub struct PostgresPricingCatalogSource {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct AircraftTypeRow {
    id: Uuid,
    name: String,
    base_min_fuel_gallons_for_waiver: Decimal,
    default_classification_id: Uuid,
    default_max_gross_weight_lbs: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct FeeRuleRow {
    id: Uuid,
    fbo_location_id: Uuid,
    fee_code: String,
    fee_name: String,
    amount: Decimal,
    currency: String,
    is_taxable: bool,
    is_potentially_waivable_by_fuel_uplift: bool,
    is_manually_waivable: bool,
    calculation_basis: String,
    waiver_strategy: String,
    simple_waiver_multiplier: Decimal,
    has_caa_override: bool,
    caa_override_amount: Option<Decimal>,
    caa_waiver_strategy_override: Option<String>,
    caa_simple_waiver_multiplier_override: Option<Decimal>,
    applies_to_classification_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OverrideRow {
    id: Uuid,
    fee_rule_id: Uuid,
    classification_id: Option<Uuid>,
    aircraft_type_id: Option<Uuid>,
    override_amount: Option<Decimal>,
    override_caa_amount: Option<Decimal>,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct WaiverTierRow {
    id: Uuid,
    fbo_location_id: Uuid,
    name: String,
    fuel_uplift_multiplier: Decimal,
    fees_waived_codes: serde_json::Value,
    tier_priority: i32,
    is_caa_specific_tier: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const FEE_RULE_COLUMNS: &str = "id, fbo_location_id, fee_code, fee_name, amount, currency, \
     is_taxable, is_potentially_waivable_by_fuel_uplift, is_manually_waivable, \
     calculation_basis, waiver_strategy, simple_waiver_multiplier, has_caa_override, \
     caa_override_amount, caa_waiver_strategy_override, \
     caa_simple_waiver_multiplier_override, applies_to_classification_id, \
     created_at, updated_at";

impl PostgresPricingCatalogSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn rule_to_domain(row: FeeRuleRow) -> Result<FeeRule, PortError> {
        let currency = parse_currency(&row.currency)?;
        Ok(FeeRule {
            id: row.id.into(),
            fbo_location_id: row.fbo_location_id.into(),
            fee_code: row.fee_code,
            fee_name: row.fee_name,
            amount: Money::new(row.amount, currency),
            is_taxable: row.is_taxable,
            is_potentially_waivable_by_fuel_uplift: row.is_potentially_waivable_by_fuel_uplift,
            is_manually_waivable: row.is_manually_waivable,
            calculation_basis: parse_calculation_basis(&row.calculation_basis)?,
            waiver_strategy: parse_waiver_strategy(&row.waiver_strategy)?,
            simple_waiver_multiplier: row.simple_waiver_multiplier,
            has_caa_override: row.has_caa_override,
            caa_override_amount: row.caa_override_amount.map(|a| Money::new(a, currency)),
            caa_waiver_strategy_override: row
                .caa_waiver_strategy_override
                .as_deref()
                .map(parse_waiver_strategy)
                .transpose()?,
            caa_simple_waiver_multiplier_override: row.caa_simple_waiver_multiplier_override,
            applies_to_classification_id: row.applies_to_classification_id.map(Into::into),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    fn override_to_domain(row: OverrideRow) -> Result<FeeRuleOverride, PortError> {
        let currency = parse_currency(&row.currency)?;
        let scope = match (row.classification_id, row.aircraft_type_id) {
            (Some(classification), None) => OverrideScope::Classification(classification.into()),
            (None, Some(aircraft)) => OverrideScope::AircraftType(aircraft.into()),
            _ => {
                return Err(PortError::internal(format!(
                    "fee rule override {} has an invalid scope",
                    row.id
                )))
            }
        };
        Ok(FeeRuleOverride {
            id: row.id.into(),
            fee_rule_id: row.fee_rule_id.into(),
            scope,
            override_amount: row.override_amount.map(|a| Money::new(a, currency)),
            override_caa_amount: row.override_caa_amount.map(|a| Money::new(a, currency)),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    fn tier_to_domain(row: WaiverTierRow) -> Result<WaiverTier, PortError> {
        let fees_waived_codes = serde_json::from_value(row.fees_waived_codes)
            .map_err(|e| PortError::internal(format!("bad fees_waived_codes payload: {e}")))?;
        Ok(WaiverTier {
            id: row.id.into(),
            fbo_location_id: row.fbo_location_id.into(),
            name: row.name,
            fuel_uplift_multiplier: row.fuel_uplift_multiplier,
            fees_waived_codes,
            tier_priority: row.tier_priority,
            is_caa_specific_tier: row.is_caa_specific_tier,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    async fn aircraft_row(
        &self,
        id: AircraftTypeId,
    ) -> Result<Option<AircraftTypeRow>, PortError> {
        sqlx::query_as::<_, AircraftTypeRow>(
            "SELECT id, name, base_min_fuel_gallons_for_waiver, default_classification_id, \
             default_max_gross_weight_lbs, created_at, updated_at \
             FROM aircraft_types WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)
    }
}

impl DomainPort for PostgresPricingCatalogSource {}

#[async_trait]
impl PricingCatalogSource for PostgresPricingCatalogSource {
    async fn load_catalog(
        &self,
        fbo: FboId,
        aircraft_type_id: AircraftTypeId,
        customer_id: CustomerId,
    ) -> Result<PricingCatalog, PortError> {
        let is_caa_member: bool =
            sqlx::query_scalar("SELECT is_caa_member FROM customers WHERE id = $1")
                .bind(*customer_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?
                .ok_or_else(|| PortError::not_found("Customer", customer_id))?;

        let aircraft = self
            .aircraft_row(aircraft_type_id)
            .await?
            .ok_or_else(|| PortError::not_found("AircraftType", aircraft_type_id))?;

        let fbo_min_fuel_override: Option<Decimal> = sqlx::query_scalar(
            "SELECT base_min_fuel_gallons_for_waiver FROM fbo_aircraft_type_configs \
             WHERE fbo_location_id = $1 AND aircraft_type_id = $2",
        )
        .bind(*fbo.as_uuid())
        .bind(*aircraft_type_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        let fee_rules = sqlx::query_as::<_, FeeRuleRow>(&format!(
            "SELECT {FEE_RULE_COLUMNS} FROM fee_rules WHERE fbo_location_id = $1 \
             ORDER BY fee_code"
        ))
        .bind(*fbo.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?
        .into_iter()
        .map(Self::rule_to_domain)
        .collect::<Result<Vec<_>, _>>()?;

        let overrides = sqlx::query_as::<_, OverrideRow>(
            "SELECT o.id, o.fee_rule_id, o.classification_id, o.aircraft_type_id, \
             o.override_amount, o.override_caa_amount, r.currency, o.created_at, o.updated_at \
             FROM fee_rule_overrides o \
             JOIN fee_rules r ON r.id = o.fee_rule_id \
             WHERE r.fbo_location_id = $1",
        )
        .bind(*fbo.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?
        .into_iter()
        .map(Self::override_to_domain)
        .collect::<Result<Vec<_>, _>>()?;

        let waiver_tiers = sqlx::query_as::<_, WaiverTierRow>(
            "SELECT id, fbo_location_id, name, fuel_uplift_multiplier, fees_waived_codes, \
             tier_priority, is_caa_specific_tier, created_at, updated_at \
             FROM waiver_tiers WHERE fbo_location_id = $1 \
             ORDER BY tier_priority",
        )
        .bind(*fbo.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?
        .into_iter()
        .map(Self::tier_to_domain)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(PricingCatalog {
            classification_id: aircraft.default_classification_id.into(),
            base_min_fuel_gallons_for_waiver: aircraft.base_min_fuel_gallons_for_waiver,
            fbo_min_fuel_override,
            fee_rules,
            overrides,
            waiver_tiers,
            is_caa_member,
        })
    }

    async fn aircraft_type(
        &self,
        id: AircraftTypeId,
    ) -> Result<Option<AircraftType>, PortError> {
        Ok(self.aircraft_row(id).await?.map(|row| AircraftType {
            id: row.id.into(),
            name: row.name,
            base_min_fuel_gallons_for_waiver: row.base_min_fuel_gallons_for_waiver,
            default_classification_id: row.default_classification_id.into(),
            default_max_gross_weight_lbs: row.default_max_gross_weight_lbs,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }

    async fn fee_rule_by_code(
        &self,
        fbo: FboId,
        fee_code: &str,
    ) -> Result<Option<FeeRule>, PortError> {
        let row = sqlx::query_as::<_, FeeRuleRow>(&format!(
            "SELECT {FEE_RULE_COLUMNS} FROM fee_rules \
             WHERE fbo_location_id = $1 AND fee_code = $2"
        ))
        .bind(*fbo.as_uuid())
        .bind(fee_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(Self::rule_to_domain).transpose()
    }
}
