//! Fee catalog model
//!
//! The configuration rows that drive fee calculation for one FBO
//! location: aircraft types and their classifications, fee rules with
//! optional CAA-member pricing, targeted overrides, and fuel-uplift
//! waiver tiers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{
    AircraftTypeId, ClassificationId, FboId, FeeRuleId, FeeRuleOverrideId, Money, WaiverTierId,
};

/// How a fee amount is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalculationBasis {
    /// A fixed price per unit of service
    FixedPrice,
    /// The rule carries no chargeable amount of its own
    NotApplicable,
}

/// Waiver mechanism attached to a fee rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaiverStrategy {
    /// The fee is never waived by fuel uplift
    None,
    /// Waived when uplift reaches `min_fuel * simple_waiver_multiplier`
    SimpleMultiplier,
    /// Waived when a configured waiver tier listing this fee qualifies
    TieredMultiplier,
}

impl WaiverStrategy {
    /// Human-readable label used in waiver line-item descriptions
    pub fn label(&self) -> &'static str {
        match self {
            WaiverStrategy::None => "None",
            WaiverStrategy::SimpleMultiplier => "Simple Multiplier",
            WaiverStrategy::TieredMultiplier => "Tiered Multiplier",
        }
    }
}

/// An aircraft type in the catalog
///
/// Once referenced by historical receipts the row itself stays put; only
/// fee configuration changes, never receipt snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AircraftType {
    pub id: AircraftTypeId,
    pub name: String,
    /// Global default minimum uplift for waiver eligibility, in gallons.
    /// Zero disables fuel-based waivers for this type entirely.
    pub base_min_fuel_gallons_for_waiver: Decimal,
    pub default_classification_id: ClassificationId,
    pub default_max_gross_weight_lbs: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A fee category grouping aircraft types, scoped to one FBO location
///
/// Name is unique per FBO. For fee resolution this is a flat grouping
/// key; any permission-group hierarchy lives outside this domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AircraftClassification {
    pub id: ClassificationId,
    pub fbo_location_id: FboId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A fee rule: the global base price and waiver behavior for one fee code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeRule {
    pub id: FeeRuleId,
    pub fbo_location_id: FboId,
    /// Unique per FBO (e.g. "RAMP", "GPU")
    pub fee_code: String,
    pub fee_name: String,
    pub amount: Money,
    pub is_taxable: bool,
    /// Gates whether fuel-uplift waiver logic runs for this fee at all
    pub is_potentially_waivable_by_fuel_uplift: bool,
    /// Gates the CSR-facing manual waiver toggle on draft receipts
    pub is_manually_waivable: bool,
    pub calculation_basis: CalculationBasis,
    pub waiver_strategy: WaiverStrategy,
    pub simple_waiver_multiplier: Decimal,
    /// When false, every CAA field below is ignored at calculation time
    /// regardless of what is stored.
    pub has_caa_override: bool,
    pub caa_override_amount: Option<Money>,
    pub caa_waiver_strategy_override: Option<WaiverStrategy>,
    pub caa_simple_waiver_multiplier_override: Option<Decimal>,
    /// When set, this rule is a category default for that classification;
    /// when None the fee is only ever charged as an ad-hoc service.
    pub applies_to_classification_id: Option<ClassificationId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeeRule {
    /// CAA amount honored only when the override flag is set
    pub fn effective_caa_amount(&self) -> Option<Money> {
        if self.has_caa_override {
            self.caa_override_amount
        } else {
            None
        }
    }

    /// CAA waiver strategy honored only when the override flag is set
    pub fn effective_caa_waiver_strategy(&self) -> Option<WaiverStrategy> {
        if self.has_caa_override {
            self.caa_waiver_strategy_override
        } else {
            None
        }
    }

    /// CAA simple-waiver multiplier honored only when the override flag is set
    pub fn effective_caa_simple_multiplier(&self) -> Option<Decimal> {
        if self.has_caa_override {
            self.caa_simple_waiver_multiplier_override
        } else {
            None
        }
    }
}

/// Target of a fee rule override: exactly one of classification or
/// aircraft type, enforced by construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope_type", content = "scope_id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverrideScope {
    Classification(ClassificationId),
    AircraftType(AircraftTypeId),
}

/// A targeted price override for one fee rule
///
/// A row with a null `override_amount` still applies: it can carry a
/// CAA-amount-only override while the standard amount falls through to
/// the next tier of the hierarchy. Resolution is per-field, not per-row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeRuleOverride {
    pub id: FeeRuleOverrideId,
    pub fee_rule_id: FeeRuleId,
    pub scope: OverrideScope,
    pub override_amount: Option<Money>,
    pub override_caa_amount: Option<Money>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A fuel-uplift waiver tier for one FBO location
///
/// A tier qualifies when `uplift >= min_fuel * fuel_uplift_multiplier`;
/// every fee code listed by every qualifying tier is waived (tiers are
/// an inclusive union, not a pick-highest ladder).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaiverTier {
    pub id: WaiverTierId,
    pub fbo_location_id: FboId,
    pub name: String,
    pub fuel_uplift_multiplier: Decimal,
    /// Order-irrelevant set of fee codes, stored as a list
    pub fees_waived_codes: Vec<String>,
    /// Pairs CAA tiers with the standard tier they replace
    pub tier_priority: i32,
    pub is_caa_specific_tier: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-FBO override of an aircraft type's waiver minimum
///
/// When present, this minimum takes priority over the aircraft type's
/// global `base_min_fuel_gallons_for_waiver`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FboAircraftTypeConfig {
    pub fbo_location_id: FboId,
    pub aircraft_type_id: AircraftTypeId,
    pub base_min_fuel_gallons_for_waiver: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn rule_with_caa(has_flag: bool) -> FeeRule {
        let now = Utc::now();
        FeeRule {
            id: FeeRuleId::new(),
            fbo_location_id: FboId::new(),
            fee_code: "RAMP".to_string(),
            fee_name: "Ramp Fee".to_string(),
            amount: Money::new(dec!(75), Currency::USD),
            is_taxable: true,
            is_potentially_waivable_by_fuel_uplift: true,
            is_manually_waivable: true,
            calculation_basis: CalculationBasis::FixedPrice,
            waiver_strategy: WaiverStrategy::TieredMultiplier,
            simple_waiver_multiplier: dec!(1),
            has_caa_override: has_flag,
            caa_override_amount: Some(Money::new(dec!(60), Currency::USD)),
            caa_waiver_strategy_override: Some(WaiverStrategy::SimpleMultiplier),
            caa_simple_waiver_multiplier_override: Some(dec!(0.5)),
            applies_to_classification_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn caa_fields_ignored_without_flag() {
        let rule = rule_with_caa(false);
        assert_eq!(rule.effective_caa_amount(), None);
        assert_eq!(rule.effective_caa_waiver_strategy(), None);
        assert_eq!(rule.effective_caa_simple_multiplier(), None);
    }

    #[test]
    fn caa_fields_honored_with_flag() {
        let rule = rule_with_caa(true);
        assert_eq!(
            rule.effective_caa_amount(),
            Some(Money::new(dec!(60), Currency::USD))
        );
        assert_eq!(
            rule.effective_caa_waiver_strategy(),
            Some(WaiverStrategy::SimpleMultiplier)
        );
        assert_eq!(rule.effective_caa_simple_multiplier(), Some(dec!(0.5)));
    }

    #[test]
    fn waiver_strategy_serializes_screaming_snake() {
        let json = serde_json::to_string(&WaiverStrategy::SimpleMultiplier).unwrap();
        assert_eq!(json, "\"SIMPLE_MULTIPLIER\"");
        let back: WaiverStrategy = serde_json::from_str("\"TIERED_MULTIPLIER\"").unwrap();
        assert_eq!(back, WaiverStrategy::TieredMultiplier);
    }
}
