//! Standard catalog fixture
//!
//! One light-jet FBO configuration shared by the scenario suites:
//! a Citation CJ3 with a 150-gallon waiver minimum, four category
//! defaults (ramp $75, GPU $50, water cart $25, lavatory $35), an
//! ad-hoc catering fee, and waiver tiers at 1.0x (ramp) and 2.0x (GPU).

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{
    AircraftTypeId, ClassificationId, Currency, FboId, FeeRuleId, Money, WaiverTierId,
};
use domain_pricing::{
    AircraftClassification, AircraftType, CalculationBasis, FeeRule, WaiverStrategy, WaiverTier,
};

/// The standard light-jet fee configuration
pub struct StandardCatalog {
    pub fbo: FboId,
    pub classification: AircraftClassification,
    pub aircraft: AircraftType,
    pub fee_rules: Vec<FeeRule>,
    pub waiver_tiers: Vec<WaiverTier>,
}

impl StandardCatalog {
    pub fn new() -> Self {
        let now = Utc::now();
        let fbo = FboId::new();
        let classification_id = ClassificationId::new();

        let classification = AircraftClassification {
            id: classification_id,
            fbo_location_id: fbo,
            name: "Light Jet".to_string(),
            created_at: now,
            updated_at: now,
        };

        let aircraft = AircraftType {
            id: AircraftTypeId::new(),
            name: "Citation CJ3".to_string(),
            base_min_fuel_gallons_for_waiver: dec!(150),
            default_classification_id: classification_id,
            default_max_gross_weight_lbs: Some(dec!(13870)),
            created_at: now,
            updated_at: now,
        };

        let rule = |code: &str, name: &str, amount: Decimal| FeeRule {
            id: FeeRuleId::new(),
            fbo_location_id: fbo,
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
            applies_to_classification_id: Some(classification_id),
            created_at: now,
            updated_at: now,
        };

        let mut ramp = rule("RAMP", "Ramp Fee", dec!(75));
        ramp.waiver_strategy = WaiverStrategy::TieredMultiplier;
        ramp.is_manually_waivable = true;

        let mut gpu = rule("GPU", "GPU Service", dec!(50));
        gpu.waiver_strategy = WaiverStrategy::TieredMultiplier;

        let water = rule("WATER", "Water Cart", dec!(25));

        let mut lav = rule("LAV", "Lavatory Service", dec!(35));
        lav.waiver_strategy = WaiverStrategy::SimpleMultiplier;
        lav.simple_waiver_multiplier = dec!(1.0);

        let mut catering = rule("CAT", "Catering Coordination", dec!(40));
        catering.applies_to_classification_id = None;

        let tier = |name: &str, multiplier: Decimal, codes: &[&str], priority: i32| WaiverTier {
            id: WaiverTierId::new(),
            fbo_location_id: fbo,
            name: name.to_string(),
            fuel_uplift_multiplier: multiplier,
            fees_waived_codes: codes.iter().map(|c| c.to_string()).collect(),
            tier_priority: priority,
            is_caa_specific_tier: false,
            created_at: now,
            updated_at: now,
        };

        Self {
            fbo,
            classification,
            aircraft,
            fee_rules: vec![ramp, gpu, water, lav, catering],
            waiver_tiers: vec![
                tier("Tier 1", dec!(1.0), &["RAMP"], 1),
                tier("Tier 2", dec!(2.0), &["GPU"], 2),
            ],
        }
    }

    /// Mutable access to one fee rule by code
    pub fn rule_mut(&mut self, code: &str) -> &mut FeeRule {
        self.fee_rules
            .iter_mut()
            .find(|r| r.fee_code == code)
            .unwrap_or_else(|| panic!("no fee rule '{code}' in the standard catalog"))
    }
}

impl Default for StandardCatalog {
    fn default() -> Self {
        Self::new()
    }
}
