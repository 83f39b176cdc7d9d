//! Money and Rate behavior tests
//!
//! Exercises the decimal-exact monetary arithmetic the fee engine relies
//! on: exact negation for waiver offsets, currency guarding, and tax-rate
//! application.

use core_kernel::{Currency, Money, MoneyError, Rate};
use rust_decimal_macros::dec;

#[test]
fn addition_and_subtraction_are_exact() {
    let fuel = Money::new(dec!(750.00), Currency::USD);
    let fees = Money::new(dec!(185.00), Currency::USD);
    let waivers = Money::new(dec!(110.00), Currency::USD);

    let net = fuel + fees - waivers;
    assert_eq!(net.amount(), dec!(825.00));
}

#[test]
fn waiver_offset_nets_to_zero() {
    let fee = Money::new(dec!(35.00), Currency::USD);
    let waiver = -fee;

    assert_eq!(waiver.amount(), dec!(-35.00));
    assert!(fee.checked_add(&waiver).unwrap().is_zero());
}

#[test]
fn scalar_multiplication_keeps_currency() {
    let unit_price = Money::new(dec!(5.75), Currency::USD);
    let total = unit_price * dec!(200);

    assert_eq!(total.amount(), dec!(1150.00));
    assert_eq!(total.currency(), Currency::USD);
}

#[test]
fn cross_currency_operations_are_rejected() {
    let usd = Money::new(dec!(10), Currency::USD);
    let eur = Money::new(dec!(10), Currency::EUR);

    assert!(matches!(
        usd.checked_sub(&eur),
        Err(MoneyError::CurrencyMismatch(_, _))
    ));
}

#[test]
fn tax_rate_of_eight_percent() {
    let rate = Rate::from_percentage(dec!(8));
    assert_eq!(rate.as_decimal(), dec!(0.08));

    let taxable_base = Money::new(dec!(935.00), Currency::USD);
    let tax = rate.apply(&taxable_base).round_to_currency();
    assert_eq!(tax.amount(), dec!(74.80));
}

#[test]
fn rate_display_normalizes_trailing_zeros() {
    let rate = Rate::from_percentage(dec!(8.00));
    assert_eq!(rate.to_string(), "8%");
}

#[test]
fn rounding_to_currency_precision() {
    let m = Money::new(dec!(74.7999), Currency::USD);
    assert_eq!(m.round_to_currency().amount(), dec!(74.80));
}
