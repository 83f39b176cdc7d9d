//! Shared catalog fixtures for the pricing test suites
//!
//! Models a light-jet FBO configuration: four category-default fees
//! (ramp, GPU, water cart, lavatory), one ad-hoc catering fee, and two
//! waiver tiers at 1.0x and 2.0x of the aircraft's 150-gallon minimum.
#![allow(dead_code)]

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{
    AircraftTypeId, ClassificationId, Currency, FboId, FeeRuleId, FeeRuleOverrideId, Money,
    WaiverTierId,
};
use domain_pricing::{
    CalculationBasis, FeeRule, FeeRuleOverride, OverrideScope, PricingCatalog, WaiverStrategy,
    WaiverTier,
};

pub struct Fixture {
    pub fbo: FboId,
    pub classification: ClassificationId,
    pub aircraft: AircraftTypeId,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            fbo: FboId::new(),
            classification: ClassificationId::new(),
            aircraft: AircraftTypeId::new(),
        }
    }

    pub fn rule(&self, code: &str, name: &str, amount: Decimal) -> FeeRule {
        let now = Utc::now();
        FeeRule {
            id: FeeRuleId::new(),
            fbo_location_id: self.fbo,
            fee_code: code.to_string(),
            fee_name: name.to_string(),
            amount: Money::new(amount, Currency::USD),
            is_taxable: true,
            is_potentially_waivable_by_fuel_uplift: true,
            is_manually_waivable: false,
            calculation_basis: CalculationBasis::FixedPrice,
            waiver_strategy: WaiverStrategy::None,
            simple_waiver_multiplier: dec!(1),
            has_caa_override: false,
            caa_override_amount: None,
            caa_waiver_strategy_override: None,
            caa_simple_waiver_multiplier_override: None,
            applies_to_classification_id: Some(self.classification),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn tier(&self, name: &str, multiplier: Decimal, codes: &[&str], priority: i32) -> WaiverTier {
        let now = Utc::now();
        WaiverTier {
            id: WaiverTierId::new(),
            fbo_location_id: self.fbo,
            name: name.to_string(),
            fuel_uplift_multiplier: multiplier,
            fees_waived_codes: codes.iter().map(|c| c.to_string()).collect(),
            tier_priority: priority,
            is_caa_specific_tier: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn override_row(
        &self,
        rule: &FeeRule,
        scope: OverrideScope,
        amount: Option<Decimal>,
        caa_amount: Option<Decimal>,
    ) -> FeeRuleOverride {
        let now = Utc::now();
        FeeRuleOverride {
            id: FeeRuleOverrideId::new(),
            fee_rule_id: rule.id,
            scope,
            override_amount: amount.map(|a| Money::new(a, Currency::USD)),
            override_caa_amount: caa_amount.map(|a| Money::new(a, Currency::USD)),
            created_at: now,
            updated_at: now,
        }
    }

    /// The standard light-jet fee schedule used across the suites
    pub fn standard_rules(&self) -> Vec<FeeRule> {
        let mut ramp = self.rule("RAMP", "Ramp Fee", dec!(75));
        ramp.waiver_strategy = WaiverStrategy::TieredMultiplier;
        ramp.is_manually_waivable = true;

        let mut gpu = self.rule("GPU", "GPU Service", dec!(50));
        gpu.waiver_strategy = WaiverStrategy::TieredMultiplier;

        let water = self.rule("WATER", "Water Cart", dec!(25));

        let mut lav = self.rule("LAV", "Lavatory Service", dec!(35));
        lav.waiver_strategy = WaiverStrategy::SimpleMultiplier;
        lav.simple_waiver_multiplier = dec!(1.0);

        let mut catering = self.rule("CAT", "Catering Coordination", dec!(40));
        catering.applies_to_classification_id = None;

        vec![ramp, gpu, water, lav, catering]
    }

    /// 1.0x tier waives the ramp fee, 2.0x tier waives GPU service
    pub fn standard_tiers(&self) -> Vec<WaiverTier> {
        vec![
            self.tier("Tier 1", dec!(1.0), &["RAMP"], 1),
            self.tier("Tier 2", dec!(2.0), &["GPU"], 2),
        ]
    }

    pub fn catalog(&self, is_caa_member: bool) -> PricingCatalog {
        PricingCatalog {
            classification_id: self.classification,
            base_min_fuel_gallons_for_waiver: dec!(150),
            fbo_min_fuel_override: None,
            fee_rules: self.standard_rules(),
            overrides: Vec::new(),
            waiver_tiers: self.standard_tiers(),
            is_caa_member,
        }
    }
}

pub fn usd(amount: Decimal) -> Money {
    Money::new(amount, Currency::USD)
}
