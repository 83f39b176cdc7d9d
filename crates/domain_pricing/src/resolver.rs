//! Fee rule resolution
//!
//! Resolves the effective price and waiver behavior for one fee code by
//! walking the override hierarchy, highest priority first:
//!
//! 1. An override scoped to the aircraft type
//! 2. An override scoped to the aircraft's classification
//! 3. The fee rule's own global amount
//!
//! Resolution is per-field: an override row whose `override_amount` is
//! null still wins its tier for the fields it does carry (typically a
//! CAA-amount-only override), and only the null sub-fields fall through
//! to the next tier.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{AircraftTypeId, ClassificationId, Money};

use crate::catalog::{FeeRule, FeeRuleOverride, OverrideScope, WaiverStrategy};

/// Which tier of the hierarchy supplied the resolved standard amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmountTier {
    AircraftOverride,
    ClassificationOverride,
    GlobalRule,
}

/// The effective pricing for one fee code after hierarchy resolution
#[derive(Debug, Clone)]
pub struct ResolvedFee {
    pub fee_code: String,
    pub fee_name: String,
    pub amount: Money,
    /// CAA-member price, when one is configured at any tier
    pub caa_amount: Option<Money>,
    pub waiver_strategy: WaiverStrategy,
    pub simple_waiver_multiplier: Decimal,
    pub caa_waiver_strategy: Option<WaiverStrategy>,
    pub caa_simple_waiver_multiplier: Option<Decimal>,
    /// True when any CAA-specific pricing exists for this fee
    pub has_caa_override: bool,
    pub is_taxable: bool,
    pub is_potentially_waivable_by_fuel_uplift: bool,
    pub is_manually_waivable: bool,
    pub amount_source: AmountTier,
}

impl ResolvedFee {
    /// The amount a given customer actually pays
    pub fn amount_for(&self, is_caa_member: bool) -> Money {
        if is_caa_member {
            self.caa_amount.unwrap_or(self.amount)
        } else {
            self.amount
        }
    }

    /// The waiver strategy in force for a given customer
    pub fn strategy_for(&self, is_caa_member: bool) -> WaiverStrategy {
        if is_caa_member {
            self.caa_waiver_strategy.unwrap_or(self.waiver_strategy)
        } else {
            self.waiver_strategy
        }
    }

    /// The simple-waiver multiplier in force for a given customer
    pub fn simple_multiplier_for(&self, is_caa_member: bool) -> Decimal {
        if is_caa_member {
            self.caa_simple_waiver_multiplier
                .unwrap_or(self.simple_waiver_multiplier)
        } else {
            self.simple_waiver_multiplier
        }
    }
}

/// Resolves one fee rule against the override set for an aircraft
///
/// Each fee code resolves independently; there is no cross-fee
/// interaction at this stage.
pub fn resolve_fee(
    rule: &FeeRule,
    aircraft_type_id: AircraftTypeId,
    classification_id: ClassificationId,
    overrides: &[FeeRuleOverride],
) -> ResolvedFee {
    let aircraft_row = overrides.iter().find(|o| {
        o.fee_rule_id == rule.id && o.scope == OverrideScope::AircraftType(aircraft_type_id)
    });
    let classification_row = overrides.iter().find(|o| {
        o.fee_rule_id == rule.id && o.scope == OverrideScope::Classification(classification_id)
    });

    let (amount, amount_source) = match (
        aircraft_row.and_then(|o| o.override_amount),
        classification_row.and_then(|o| o.override_amount),
    ) {
        (Some(amount), _) => (amount, AmountTier::AircraftOverride),
        (None, Some(amount)) => (amount, AmountTier::ClassificationOverride),
        (None, None) => (rule.amount, AmountTier::GlobalRule),
    };

    let caa_amount = aircraft_row
        .and_then(|o| o.override_caa_amount)
        .or_else(|| classification_row.and_then(|o| o.override_caa_amount))
        .or_else(|| rule.effective_caa_amount());

    ResolvedFee {
        fee_code: rule.fee_code.clone(),
        fee_name: rule.fee_name.clone(),
        amount,
        caa_amount,
        waiver_strategy: rule.waiver_strategy,
        simple_waiver_multiplier: rule.simple_waiver_multiplier,
        caa_waiver_strategy: rule.effective_caa_waiver_strategy(),
        caa_simple_waiver_multiplier: rule.effective_caa_simple_multiplier(),
        has_caa_override: rule.has_caa_override || caa_amount.is_some(),
        is_taxable: rule.is_taxable,
        is_potentially_waivable_by_fuel_uplift: rule.is_potentially_waivable_by_fuel_uplift,
        is_manually_waivable: rule.is_manually_waivable,
        amount_source,
    }
}
