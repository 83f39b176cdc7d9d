//! Rule resolution hierarchy tests
//!
//! Covers the three-tier priority (aircraft override > classification
//! override > global rule), per-field fallthrough for CAA-amount-only
//! override rows, and CAA field gating on the rule itself.

mod common;

use common::{usd, Fixture};
use domain_pricing::{resolve_fee, AmountTier, OverrideScope, WaiverStrategy};
use rust_decimal_macros::dec;

#[test]
fn global_rule_amount_when_no_overrides_exist() {
    let fx = Fixture::new();
    let rule = fx.rule("RAMP", "Ramp Fee", dec!(75));

    let resolved = resolve_fee(&rule, fx.aircraft, fx.classification, &[]);

    assert_eq!(resolved.amount, usd(dec!(75)));
    assert_eq!(resolved.amount_source, AmountTier::GlobalRule);
    assert_eq!(resolved.caa_amount, None);
}

#[test]
fn classification_override_beats_global_rule() {
    let fx = Fixture::new();
    let rule = fx.rule("RAMP", "Ramp Fee", dec!(75));
    let overrides = vec![fx.override_row(
        &rule,
        OverrideScope::Classification(fx.classification),
        Some(dec!(65)),
        None,
    )];

    let resolved = resolve_fee(&rule, fx.aircraft, fx.classification, &overrides);

    assert_eq!(resolved.amount, usd(dec!(65)));
    assert_eq!(resolved.amount_source, AmountTier::ClassificationOverride);
}

#[test]
fn aircraft_override_beats_classification_override() {
    let fx = Fixture::new();
    let rule = fx.rule("RAMP", "Ramp Fee", dec!(75));
    let overrides = vec![
        fx.override_row(
            &rule,
            OverrideScope::Classification(fx.classification),
            Some(dec!(65)),
            None,
        ),
        fx.override_row(
            &rule,
            OverrideScope::AircraftType(fx.aircraft),
            Some(dec!(55)),
            None,
        ),
    ];

    let resolved = resolve_fee(&rule, fx.aircraft, fx.classification, &overrides);

    assert_eq!(resolved.amount, usd(dec!(55)));
    assert_eq!(resolved.amount_source, AmountTier::AircraftOverride);
}

#[test]
fn overrides_for_other_aircraft_do_not_apply() {
    let fx = Fixture::new();
    let other = Fixture::new();
    let rule = fx.rule("RAMP", "Ramp Fee", dec!(75));
    let overrides = vec![fx.override_row(
        &rule,
        OverrideScope::AircraftType(other.aircraft),
        Some(dec!(10)),
        None,
    )];

    let resolved = resolve_fee(&rule, fx.aircraft, fx.classification, &overrides);

    assert_eq!(resolved.amount, usd(dec!(75)));
    assert_eq!(resolved.amount_source, AmountTier::GlobalRule);
}

#[test]
fn two_fee_codes_resolve_independently() {
    let fx = Fixture::new();
    let ramp = fx.rule("RAMP", "Ramp Fee", dec!(75));
    let gpu = fx.rule("GPU", "GPU Service", dec!(50));
    let overrides = vec![
        fx.override_row(
            &ramp,
            OverrideScope::AircraftType(fx.aircraft),
            Some(dec!(55)),
            None,
        ),
        fx.override_row(
            &gpu,
            OverrideScope::Classification(fx.classification),
            Some(dec!(45)),
            None,
        ),
    ];

    let ramp_resolved = resolve_fee(&ramp, fx.aircraft, fx.classification, &overrides);
    let gpu_resolved = resolve_fee(&gpu, fx.aircraft, fx.classification, &overrides);

    assert_eq!(ramp_resolved.amount, usd(dec!(55)));
    assert_eq!(ramp_resolved.amount_source, AmountTier::AircraftOverride);
    assert_eq!(gpu_resolved.amount, usd(dec!(45)));
    assert_eq!(gpu_resolved.amount_source, AmountTier::ClassificationOverride);
}

#[test]
fn null_amount_override_row_falls_through_per_field() {
    // An aircraft-level row carrying only a CAA amount: the standard
    // amount keeps walking the hierarchy while the CAA amount is pinned
    // at the aircraft tier.
    let fx = Fixture::new();
    let rule = fx.rule("RAMP", "Ramp Fee", dec!(75));
    let overrides = vec![
        fx.override_row(
            &rule,
            OverrideScope::AircraftType(fx.aircraft),
            None,
            Some(dec!(40)),
        ),
        fx.override_row(
            &rule,
            OverrideScope::Classification(fx.classification),
            Some(dec!(65)),
            Some(dec!(50)),
        ),
    ];

    let resolved = resolve_fee(&rule, fx.aircraft, fx.classification, &overrides);

    assert_eq!(resolved.amount, usd(dec!(65)));
    assert_eq!(resolved.amount_source, AmountTier::ClassificationOverride);
    assert_eq!(resolved.caa_amount, Some(usd(dec!(40))));
    assert!(resolved.has_caa_override);
}

#[test]
fn caa_override_fields_require_the_rule_flag() {
    let fx = Fixture::new();
    let mut rule = fx.rule("RAMP", "Ramp Fee", dec!(75));
    rule.caa_override_amount = Some(usd(dec!(60)));
    rule.caa_simple_waiver_multiplier_override = Some(dec!(0.5));
    rule.has_caa_override = false;

    let resolved = resolve_fee(&rule, fx.aircraft, fx.classification, &[]);

    assert_eq!(resolved.caa_amount, None);
    assert_eq!(resolved.caa_simple_waiver_multiplier, None);
    assert!(!resolved.has_caa_override);
    assert_eq!(resolved.amount_for(true), usd(dec!(75)));
}

#[test]
fn caa_member_pricing_applies_when_flagged() {
    let fx = Fixture::new();
    let mut rule = fx.rule("RAMP", "Ramp Fee", dec!(75));
    rule.has_caa_override = true;
    rule.caa_override_amount = Some(usd(dec!(60)));
    rule.caa_waiver_strategy_override = Some(WaiverStrategy::SimpleMultiplier);
    rule.caa_simple_waiver_multiplier_override = Some(dec!(0.5));

    let resolved = resolve_fee(&rule, fx.aircraft, fx.classification, &[]);

    assert_eq!(resolved.amount_for(true), usd(dec!(60)));
    assert_eq!(resolved.amount_for(false), usd(dec!(75)));
    assert_eq!(resolved.strategy_for(true), WaiverStrategy::SimpleMultiplier);
    assert_eq!(resolved.strategy_for(false), WaiverStrategy::None);
    assert_eq!(resolved.simple_multiplier_for(true), dec!(0.5));
    assert_eq!(resolved.simple_multiplier_for(false), dec!(1));
}
