//! Waiver evaluation tests
//!
//! Threshold exactness, tier-union inclusivity, CAA multiplier and tier
//! handling, and the gates that keep a fee from ever being waived.

mod common;

use common::Fixture;
use domain_pricing::{evaluate_waivers, resolve_fee, WaiverContext, WaiverStrategy};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn resolved(fx: &Fixture) -> Vec<domain_pricing::ResolvedFee> {
    fx.standard_rules()
        .iter()
        .map(|r| resolve_fee(r, fx.aircraft, fx.classification, &[]))
        .collect()
}

fn waived_at(fx: &Fixture, uplift: Decimal, is_caa: bool) -> Vec<String> {
    let tiers = fx.standard_tiers();
    let ctx = WaiverContext {
        fuel_uplift_gallons: uplift,
        min_fuel_gallons_for_waiver: dec!(150),
        tiers: &tiers,
        is_caa_member: is_caa,
    };
    evaluate_waivers(&ctx, &resolved(fx)).into_iter().collect()
}

#[test]
fn uplift_at_exact_threshold_waives() {
    let fx = Fixture::new();
    // 150 gallons == 150 * 1.0: both the 1.0x tier (RAMP) and the
    // lavatory simple multiplier qualify on exact equality.
    let waived = waived_at(&fx, dec!(150), false);
    assert_eq!(waived, vec!["LAV".to_string(), "RAMP".to_string()]);
}

#[test]
fn uplift_below_threshold_does_not_waive() {
    let fx = Fixture::new();
    let waived = waived_at(&fx, dec!(140), false);
    assert!(waived.is_empty());
}

#[test]
fn qualifying_tiers_union_their_fee_lists() {
    let fx = Fixture::new();
    // At 2.0x both tiers qualify, so both tiers' fees waive - the tiers
    // are inclusive, not a pick-highest ladder.
    let waived = waived_at(&fx, dec!(300), false);
    assert_eq!(
        waived,
        vec!["GPU".to_string(), "LAV".to_string(), "RAMP".to_string()]
    );
}

#[test]
fn strategy_none_is_never_waived() {
    let fx = Fixture::new();
    let waived = waived_at(&fx, dec!(10000), false);
    assert!(!waived.contains(&"WATER".to_string()));
}

#[test]
fn unwaivable_flag_gates_all_waiver_logic() {
    let fx = Fixture::new();
    let mut rules = fx.standard_rules();
    for rule in &mut rules {
        rule.is_potentially_waivable_by_fuel_uplift = false;
    }
    let fees: Vec<_> = rules
        .iter()
        .map(|r| resolve_fee(r, fx.aircraft, fx.classification, &[]))
        .collect();
    let tiers = fx.standard_tiers();
    let ctx = WaiverContext {
        fuel_uplift_gallons: dec!(1000),
        min_fuel_gallons_for_waiver: dec!(150),
        tiers: &tiers,
        is_caa_member: false,
    };

    assert!(evaluate_waivers(&ctx, &fees).is_empty());
}

#[test]
fn zero_minimum_disables_waivers_entirely() {
    let fx = Fixture::new();
    let tiers = fx.standard_tiers();
    let ctx = WaiverContext {
        fuel_uplift_gallons: dec!(1000),
        min_fuel_gallons_for_waiver: Decimal::ZERO,
        tiers: &tiers,
        is_caa_member: false,
    };

    assert!(evaluate_waivers(&ctx, &resolved(&fx)).is_empty());
}

#[test]
fn caa_simple_multiplier_lowers_the_threshold() {
    let fx = Fixture::new();
    let mut rules = fx.standard_rules();
    let lav = rules.iter_mut().find(|r| r.fee_code == "LAV").unwrap();
    lav.has_caa_override = true;
    lav.caa_simple_waiver_multiplier_override = Some(dec!(0.5));

    let fees: Vec<_> = rules
        .iter()
        .map(|r| resolve_fee(r, fx.aircraft, fx.classification, &[]))
        .collect();
    let tiers = fx.standard_tiers();

    // 75 gallons meets 150 * 0.5 for members but not the standard 1.0x
    let member = WaiverContext {
        fuel_uplift_gallons: dec!(75),
        min_fuel_gallons_for_waiver: dec!(150),
        tiers: &tiers,
        is_caa_member: true,
    };
    let standard = WaiverContext {
        is_caa_member: false,
        ..member.clone()
    };

    assert!(evaluate_waivers(&member, &fees).contains("LAV"));
    assert!(!evaluate_waivers(&standard, &fees).contains("LAV"));
}

#[test]
fn caa_tier_replaces_standard_tier_at_same_priority() {
    let fx = Fixture::new();
    let mut tiers = fx.standard_tiers();
    let mut caa_tier = fx.tier("CAA Tier 1", dec!(0.5), &["RAMP", "GPU"], 1);
    caa_tier.is_caa_specific_tier = true;
    tiers.push(caa_tier);

    let fees = resolved(&fx);

    // Members reach the 0.5x CAA tier at 75 gallons
    let member = WaiverContext {
        fuel_uplift_gallons: dec!(75),
        min_fuel_gallons_for_waiver: dec!(150),
        tiers: &tiers,
        is_caa_member: true,
    };
    let member_waived = evaluate_waivers(&member, &fees);
    assert!(member_waived.contains("RAMP"));
    assert!(member_waived.contains("GPU"));

    // Non-members never see CAA tiers; at 150 only the standard 1.0x fires
    let standard = WaiverContext {
        fuel_uplift_gallons: dec!(150),
        is_caa_member: false,
        ..member
    };
    let standard_waived = evaluate_waivers(&standard, &fees);
    assert!(standard_waived.contains("RAMP"));
    assert!(!standard_waived.contains("GPU"));
}
