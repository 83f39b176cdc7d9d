//! Fee calculation engine tests
//!
//! The worked light-jet example: 150 gallons at $5.00 produces $750.00
//! fuel, $185.00 in category fees, $110.00 of waivers (ramp via the 1.0x
//! tier, lavatory via its own 1.0x simple multiplier), 8% tax on the
//! gross $935.00 base, and an $899.80 grand total.

mod common;

use common::{usd, Fixture};
use core_kernel::{Currency, CustomerId, Money};
use domain_pricing::{
    FeeCalculationEngine, LineItemKind, OverrideScope, ServiceRequest, TransactionContext,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn context(fx: &Fixture, gallons: Decimal, price: Decimal) -> TransactionContext {
    TransactionContext {
        fbo_location_id: fx.fbo,
        aircraft_type_id: fx.aircraft,
        customer_id: CustomerId::new(),
        fuel_uplift_gallons: gallons,
        fuel_price_per_gallon: usd(price),
        fuel_type_name: "Jet A".to_string(),
        additional_services: Vec::new(),
    }
}

#[test]
fn worked_example_totals() {
    let fx = Fixture::new();
    let engine = FeeCalculationEngine::default();
    let outcome = engine
        .calculate(&context(&fx, dec!(150), dec!(5.00)), &fx.catalog(false))
        .unwrap();

    assert_eq!(outcome.fuel_subtotal, usd(dec!(750.00)));
    assert_eq!(outcome.total_fees_amount, usd(dec!(185.00)));
    assert_eq!(outcome.total_waivers_amount, usd(dec!(110.00)));
    assert_eq!(outcome.tax_amount, usd(dec!(74.80)));
    assert_eq!(outcome.grand_total_amount, usd(dec!(899.80)));
    assert!(!outcome.is_caa_applied);
}

#[test]
fn line_items_are_ordered_fuel_fees_waivers_tax() {
    let fx = Fixture::new();
    let engine = FeeCalculationEngine::default();
    let outcome = engine
        .calculate(&context(&fx, dec!(150), dec!(5.00)), &fx.catalog(false))
        .unwrap();

    let kinds: Vec<LineItemKind> = outcome.line_items.iter().map(|l| l.kind).collect();
    assert_eq!(
        kinds,
        vec![
            LineItemKind::Fuel,
            LineItemKind::Fee,
            LineItemKind::Fee,
            LineItemKind::Fee,
            LineItemKind::Fee,
            LineItemKind::Waiver,
            LineItemKind::Waiver,
            LineItemKind::Tax,
        ]
    );

    let fuel = &outcome.line_items[0];
    assert_eq!(fuel.description, "Fuel (Jet A)");
    assert_eq!(fuel.amount, usd(dec!(750.00)));
}

#[test]
fn every_waiver_exactly_negates_its_fee() {
    let fx = Fixture::new();
    let engine = FeeCalculationEngine::default();
    let outcome = engine
        .calculate(&context(&fx, dec!(300), dec!(5.00)), &fx.catalog(false))
        .unwrap();

    let waivers: Vec<_> = outcome
        .line_items
        .iter()
        .filter(|l| l.kind == LineItemKind::Waiver)
        .collect();
    assert!(!waivers.is_empty());

    for waiver in waivers {
        let code = waiver.fee_code.as_ref().unwrap();
        let fee = outcome
            .line_items
            .iter()
            .find(|l| l.kind == LineItemKind::Fee && l.fee_code.as_deref() == Some(code))
            .unwrap();
        assert_eq!(waiver.amount, -fee.amount);
    }
}

#[test]
fn waiver_descriptions_carry_strategy_and_fee_name() {
    let fx = Fixture::new();
    let engine = FeeCalculationEngine::default();
    let outcome = engine
        .calculate(&context(&fx, dec!(150), dec!(5.00)), &fx.catalog(false))
        .unwrap();

    let descriptions: Vec<&str> = outcome
        .line_items
        .iter()
        .filter(|l| l.kind == LineItemKind::Waiver)
        .map(|l| l.description.as_str())
        .collect();

    assert!(descriptions.contains(&"Tiered Multiplier Waiver (Ramp Fee)"));
    assert!(descriptions.contains(&"Simple Multiplier Waiver (Lavatory Service)"));
}

#[test]
fn tax_is_computed_on_gross_fees_before_waivers() {
    let fx = Fixture::new();
    let engine = FeeCalculationEngine::default();

    // 300 gallons waives RAMP, GPU, and LAV ($160), yet the taxable base
    // stays fuel + gross fees.
    let outcome = engine
        .calculate(&context(&fx, dec!(300), dec!(5.00)), &fx.catalog(false))
        .unwrap();

    assert_eq!(outcome.total_waivers_amount, usd(dec!(160.00)));
    // 8% of (1500 + 185)
    assert_eq!(outcome.tax_amount, usd(dec!(134.80)));
}

#[test]
fn non_taxable_fees_are_excluded_from_the_base() {
    let fx = Fixture::new();
    let mut catalog = fx.catalog(false);
    for rule in &mut catalog.fee_rules {
        if rule.fee_code == "WATER" {
            rule.is_taxable = false;
        }
    }

    let engine = FeeCalculationEngine::default();
    let outcome = engine
        .calculate(&context(&fx, dec!(150), dec!(5.00)), &catalog)
        .unwrap();

    // 8% of (750 + 160)
    assert_eq!(outcome.tax_amount, usd(dec!(72.80)));
}

#[test]
fn additional_service_adds_an_ad_hoc_fee_with_quantity() {
    let fx = Fixture::new();
    let mut ctx = context(&fx, dec!(150), dec!(5.00));
    ctx.additional_services = vec![ServiceRequest::new("CAT").with_quantity(dec!(2))];

    let engine = FeeCalculationEngine::default();
    let outcome = engine.calculate(&ctx, &fx.catalog(false)).unwrap();

    let catering = outcome
        .line_items
        .iter()
        .find(|l| l.fee_code.as_deref() == Some("CAT"))
        .unwrap();
    assert_eq!(catering.quantity, dec!(2));
    assert_eq!(catering.amount, usd(dec!(80.00)));
    assert_eq!(outcome.total_fees_amount, usd(dec!(265.00)));
}

#[test]
fn unknown_service_codes_are_omitted_not_errors() {
    let fx = Fixture::new();
    let mut ctx = context(&fx, dec!(150), dec!(5.00));
    ctx.additional_services = vec![ServiceRequest::new("NO_SUCH_FEE")];

    let engine = FeeCalculationEngine::default();
    let outcome = engine.calculate(&ctx, &fx.catalog(false)).unwrap();

    assert!(outcome
        .line_items
        .iter()
        .all(|l| l.fee_code.as_deref() != Some("NO_SUCH_FEE")));
    assert_eq!(outcome.total_fees_amount, usd(dec!(185.00)));
}

#[test]
fn non_positive_service_quantity_is_rejected() {
    let fx = Fixture::new();
    let mut ctx = context(&fx, dec!(150), dec!(5.00));
    ctx.additional_services = vec![ServiceRequest::new("CAT").with_quantity(Decimal::ZERO)];

    let engine = FeeCalculationEngine::default();
    assert!(engine.calculate(&ctx, &fx.catalog(false)).is_err());
}

#[test]
fn caa_member_receives_overridden_amounts() {
    let fx = Fixture::new();
    let mut catalog = fx.catalog(true);
    for rule in &mut catalog.fee_rules {
        if rule.fee_code == "RAMP" {
            rule.has_caa_override = true;
            rule.caa_override_amount = Some(usd(dec!(60)));
        }
    }

    let engine = FeeCalculationEngine::default();
    // Stay below every waiver threshold so the fee lines are visible
    let outcome = engine
        .calculate(&context(&fx, dec!(100), dec!(5.00)), &catalog)
        .unwrap();

    let ramp = outcome
        .line_items
        .iter()
        .find(|l| l.fee_code.as_deref() == Some("RAMP"))
        .unwrap();
    assert_eq!(ramp.amount, usd(dec!(60.00)));
    assert!(outcome.is_caa_applied);
}

#[test]
fn non_member_ignores_populated_caa_fields() {
    let fx = Fixture::new();
    let mut catalog = fx.catalog(false);
    for rule in &mut catalog.fee_rules {
        if rule.fee_code == "RAMP" {
            rule.has_caa_override = true;
            rule.caa_override_amount = Some(usd(dec!(60)));
        }
    }

    let engine = FeeCalculationEngine::default();
    let outcome = engine
        .calculate(&context(&fx, dec!(100), dec!(5.00)), &catalog)
        .unwrap();

    let ramp = outcome
        .line_items
        .iter()
        .find(|l| l.fee_code.as_deref() == Some("RAMP"))
        .unwrap();
    assert_eq!(ramp.amount, usd(dec!(75.00)));
    assert!(!outcome.is_caa_applied);
}

#[test]
fn aircraft_override_flows_into_the_fee_line() {
    let fx = Fixture::new();
    let mut catalog = fx.catalog(false);
    let ramp_rule = catalog
        .fee_rules
        .iter()
        .find(|r| r.fee_code == "RAMP")
        .unwrap()
        .clone();
    catalog.overrides.push(fx.override_row(
        &ramp_rule,
        OverrideScope::AircraftType(fx.aircraft),
        Some(dec!(55)),
        None,
    ));

    let engine = FeeCalculationEngine::default();
    let outcome = engine
        .calculate(&context(&fx, dec!(100), dec!(5.00)), &catalog)
        .unwrap();

    let ramp = outcome
        .line_items
        .iter()
        .find(|l| l.fee_code.as_deref() == Some("RAMP"))
        .unwrap();
    assert_eq!(ramp.amount, usd(dec!(55.00)));
}

#[test]
fn fbo_minimum_override_takes_priority() {
    let fx = Fixture::new();
    let mut catalog = fx.catalog(false);
    catalog.fbo_min_fuel_override = Some(dec!(100));

    let engine = FeeCalculationEngine::default();
    // 100 gallons meets the FBO-specific minimum even though the global
    // default is 150.
    let outcome = engine
        .calculate(&context(&fx, dec!(100), dec!(5.00)), &catalog)
        .unwrap();

    assert!(outcome
        .line_items
        .iter()
        .any(|l| l.kind == LineItemKind::Waiver && l.fee_code.as_deref() == Some("RAMP")));
}

#[test]
fn zero_uplift_charges_fees_without_waivers() {
    let fx = Fixture::new();
    let engine = FeeCalculationEngine::default();
    let outcome = engine
        .calculate(&context(&fx, Decimal::ZERO, dec!(5.00)), &fx.catalog(false))
        .unwrap();

    assert!(outcome.fuel_subtotal.is_zero());
    assert_eq!(outcome.total_fees_amount, usd(dec!(185.00)));
    assert!(outcome.total_waivers_amount.is_zero());
    // 8% of the fees alone
    assert_eq!(outcome.tax_amount, usd(dec!(14.80)));
}

#[test]
fn recalculation_with_identical_inputs_is_identical() {
    let fx = Fixture::new();
    let engine = FeeCalculationEngine::default();
    let ctx = context(&fx, dec!(150), dec!(5.00));
    let catalog = fx.catalog(false);

    let first = engine.calculate(&ctx, &catalog).unwrap();
    let second = engine.calculate(&ctx, &catalog).unwrap();

    assert_eq!(first.line_items.len(), second.line_items.len());
    assert_eq!(first.grand_total_amount, second.grand_total_amount);
    assert_eq!(first.tax_amount, second.tax_amount);
}

proptest! {
    #[test]
    fn grand_total_identity_holds(
        gallons in 0u32..2000u32,
        price_cents in 100u32..1500u32,
    ) {
        let fx = Fixture::new();
        let engine = FeeCalculationEngine::default();
        let ctx = context(
            &fx,
            Decimal::from(gallons),
            Decimal::new(price_cents as i64, 2),
        );

        let outcome = engine.calculate(&ctx, &fx.catalog(false)).unwrap();

        let expected = outcome.fuel_subtotal + outcome.total_fees_amount
            - outcome.total_waivers_amount
            + outcome.tax_amount;
        prop_assert_eq!(outcome.grand_total_amount, expected);

        let line_sum = outcome
            .line_items
            .iter()
            .fold(Money::zero(Currency::USD), |acc, l| acc + l.amount);
        prop_assert_eq!(line_sum, outcome.grand_total_amount);
    }
}
