//! Cross-domain integration scenarios
//!
//! Verifies the seams between pricing, receipts, and schedule
//! administration: receipt snapshots are immune to later catalog
//! changes, drafts pick up catalog changes only through explicit
//! recalculation, and a schedule restore round-trips the configuration
//! it captured.

use rust_decimal_macros::dec;
use serde_json::json;

use core_kernel::{Currency, Money, UserId};
use domain_receipts::{FuelType, ReceiptStatus};
use test_utils::TestHarness;

fn usd(amount: rust_decimal::Decimal) -> Money {
    Money::new(amount, Currency::USD)
}

#[tokio::test]
async fn generated_receipts_are_immune_to_catalog_changes() {
    let harness = TestHarness::new();
    harness
        .fuel_prices
        .set_price(harness.fbo, FuelType::JetA, usd(dec!(5.00)));
    let order = harness.seed_order(|b| b.with_gallons_dispensed(Some(dec!(150))));

    let draft = harness
        .service
        .create_draft_from_fuel_order(order.id, UserId::new())
        .await
        .unwrap();
    harness
        .service
        .calculate_and_update_draft(draft.id, None)
        .await
        .unwrap();
    let generated = harness.service.generate_receipt(draft.id).await.unwrap();
    let frozen_total = generated.grand_total_amount;

    // Reprice every fee and the fuel after generation
    harness.catalog.with_data(|data| {
        for rule in &mut data.fee_rules {
            rule.amount = usd(dec!(999));
        }
    });
    harness
        .fuel_prices
        .set_price(harness.fbo, FuelType::JetA, usd(dec!(9.99)));

    let stored = harness.service.get_receipt(draft.id).await.unwrap();
    assert_eq!(stored.status, ReceiptStatus::Generated);
    assert_eq!(stored.grand_total_amount, frozen_total);
    assert_eq!(stored.fuel_unit_price_at_receipt_time, usd(dec!(5.00)));
}

#[tokio::test]
async fn drafts_pick_up_catalog_changes_only_on_recalculation() {
    let harness = TestHarness::new();
    let order = harness.seed_order(|b| b.with_gallons_dispensed(Some(dec!(100))));

    let draft = harness
        .service
        .create_draft_from_fuel_order(order.id, UserId::new())
        .await
        .unwrap();
    let before = harness
        .service
        .calculate_and_update_draft(draft.id, None)
        .await
        .unwrap();

    harness.catalog.with_data(|data| {
        for rule in &mut data.fee_rules {
            if rule.fee_code == "RAMP" {
                rule.amount = usd(dec!(85));
            }
        }
    });

    // Untouched until the next explicit calculation
    let stored = harness.service.get_receipt(draft.id).await.unwrap();
    assert_eq!(stored.total_fees_amount, before.total_fees_amount);

    let after = harness
        .service
        .calculate_and_update_draft(draft.id, None)
        .await
        .unwrap();
    assert_eq!(
        after.total_fees_amount,
        before.total_fees_amount + usd(dec!(10.00))
    );
}

#[tokio::test]
async fn schedule_version_round_trips_through_restore() {
    let harness = TestHarness::new();
    harness.schedule_store.set(
        serde_json::from_value(json!({
            "fee_rules": [
                {"id": "fee-1", "fee_code": "RAMP", "amount": 75.0},
                {"id": "fee-2", "fee_code": "GPU", "amount": 50.0}
            ],
            "waiver_tiers": [
                {"id": "tier-1", "fuel_uplift_multiplier": 1.0, "fees_waived_codes": ["RAMP"]}
            ]
        }))
        .unwrap(),
    );

    let version = harness
        .schedule
        .create_version(harness.fbo, "baseline", None, UserId::new())
        .await
        .unwrap();

    // Drift the live configuration
    let mut drifted = harness.schedule_store.current();
    drifted.fee_rules[0]["amount"] = json!(95.0);
    drifted.waiver_tiers.clear();
    harness.schedule_store.set(drifted);

    let summary = harness
        .schedule
        .restore_from_version(version.id)
        .await
        .unwrap();
    assert!(summary.total_changes() > 0);

    let restored = harness.schedule_store.current();
    assert_eq!(restored, version.configuration_data);

    // A second restore is a no-op
    let second = harness
        .schedule
        .restore_from_version(version.id)
        .await
        .unwrap();
    assert_eq!(second.total_changes(), 0);
}
