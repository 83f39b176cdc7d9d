//! Fuel-uplift waiver evaluation
//!
//! Two independent mechanisms decide which fee codes an uplift earns a
//! waiver for, and both may fire for different fees in the same
//! transaction:
//!
//! - SIMPLE_MULTIPLIER: per fee rule, waived when
//!   `uplift >= min_fuel * multiplier`
//! - TIERED_MULTIPLIER: per waiver tier, every fee code listed by every
//!   qualifying tier is waived (inclusive union across tiers)
//!
//! Threshold comparisons are `>=` - exact equality qualifies - with a
//! small slack absorbing round-off when multipliers were sourced from
//! floating-point input.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeSet;

use crate::catalog::{WaiverStrategy, WaiverTier};
use crate::resolver::ResolvedFee;

/// Tolerance for thresholds that round-tripped through floating point
const THRESHOLD_SLACK: Decimal = dec!(0.000001);

/// Inputs for one waiver evaluation pass
#[derive(Debug, Clone)]
pub struct WaiverContext<'a> {
    pub fuel_uplift_gallons: Decimal,
    /// Effective minimum for this aircraft at this FBO (the FBO-specific
    /// config row already takes priority over the type's global default).
    /// Zero disables fuel-based waivers entirely.
    pub min_fuel_gallons_for_waiver: Decimal,
    pub tiers: &'a [WaiverTier],
    pub is_caa_member: bool,
}

/// Returns the set of fee codes waived for this uplift
pub fn evaluate_waivers(ctx: &WaiverContext<'_>, fees: &[ResolvedFee]) -> BTreeSet<String> {
    let mut waived = BTreeSet::new();

    if ctx.min_fuel_gallons_for_waiver.is_zero() {
        return waived;
    }

    let tier_codes = qualifying_tier_codes(ctx);

    for fee in fees {
        if !fee.is_potentially_waivable_by_fuel_uplift {
            continue;
        }

        match fee.strategy_for(ctx.is_caa_member) {
            WaiverStrategy::None => {}
            WaiverStrategy::SimpleMultiplier => {
                let multiplier = fee.simple_multiplier_for(ctx.is_caa_member);
                let threshold = ctx.min_fuel_gallons_for_waiver * multiplier;
                if meets_threshold(ctx.fuel_uplift_gallons, threshold) {
                    waived.insert(fee.fee_code.clone());
                }
            }
            WaiverStrategy::TieredMultiplier => {
                if tier_codes.contains(&fee.fee_code) {
                    waived.insert(fee.fee_code.clone());
                }
            }
        }
    }

    waived
}

/// Union of fee codes across every qualifying tier
///
/// CAA-specific tiers replace the standard tier sharing their
/// `tier_priority` for CAA members; non-members never see them.
fn qualifying_tier_codes(ctx: &WaiverContext<'_>) -> BTreeSet<String> {
    let mut codes = BTreeSet::new();

    for tier in candidate_tiers(ctx.tiers, ctx.is_caa_member) {
        let threshold = ctx.min_fuel_gallons_for_waiver * tier.fuel_uplift_multiplier;
        if meets_threshold(ctx.fuel_uplift_gallons, threshold) {
            codes.extend(tier.fees_waived_codes.iter().cloned());
        }
    }

    codes
}

fn candidate_tiers(tiers: &[WaiverTier], is_caa_member: bool) -> Vec<&WaiverTier> {
    if !is_caa_member {
        return tiers.iter().filter(|t| !t.is_caa_specific_tier).collect();
    }

    tiers
        .iter()
        .filter(|t| {
            if t.is_caa_specific_tier {
                true
            } else {
                // Standard tier is shadowed by a CAA tier at the same priority
                !tiers
                    .iter()
                    .any(|c| c.is_caa_specific_tier && c.tier_priority == t.tier_priority)
            }
        })
        .collect()
}

fn meets_threshold(uplift: Decimal, threshold: Decimal) -> bool {
    uplift + THRESHOLD_SLACK >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_threshold_qualifies() {
        assert!(meets_threshold(dec!(150), dec!(150)));
        assert!(!meets_threshold(dec!(149), dec!(150)));
    }

    #[test]
    fn slack_absorbs_float_round_off() {
        assert!(meets_threshold(dec!(149.9999995), dec!(150)));
        assert!(!meets_threshold(dec!(149.99), dec!(150)));
    }
}
