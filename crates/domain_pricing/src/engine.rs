//! Fee calculation engine
//!
//! Produces the complete, itemized monetary result for one fueling
//! transaction: fuel cost, resolved fees, earned waivers, tax, and the
//! grand total. The engine is a pure function over a
//! [`TransactionContext`] and a pre-fetched [`PricingCatalog`]; it never
//! mutates persisted state, which keeps recalculation idempotent and the
//! whole pricing surface testable with in-memory data.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::{AircraftTypeId, ClassificationId, CustomerId, FboId, Money, Rate};

use crate::catalog::{FeeRule, FeeRuleOverride, WaiverTier};
use crate::error::PricingError;
use crate::resolver::{resolve_fee, ResolvedFee};
use crate::waiver::{evaluate_waivers, WaiverContext};

/// Kind of line item on a calculation result or receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineItemKind {
    Fuel,
    Fee,
    Waiver,
    Tax,
}

impl LineItemKind {
    /// Wire string used at the API and storage boundaries
    pub fn as_str(&self) -> &'static str {
        match self {
            LineItemKind::Fuel => "FUEL",
            LineItemKind::Fee => "FEE",
            LineItemKind::Waiver => "WAIVER",
            LineItemKind::Tax => "TAX",
        }
    }
}

/// An ad-hoc service requested on top of the category defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub fee_code: String,
    pub quantity: Decimal,
}

impl ServiceRequest {
    pub fn new(fee_code: impl Into<String>) -> Self {
        Self {
            fee_code: fee_code.into(),
            quantity: Decimal::ONE,
        }
    }

    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = quantity;
        self
    }
}

/// Everything the engine needs to know about one transaction
#[derive(Debug, Clone)]
pub struct TransactionContext {
    pub fbo_location_id: FboId,
    pub aircraft_type_id: AircraftTypeId,
    pub customer_id: CustomerId,
    pub fuel_uplift_gallons: Decimal,
    pub fuel_price_per_gallon: Money,
    /// Display name of the dispensed fuel, e.g. "Jet A"
    pub fuel_type_name: String,
    pub additional_services: Vec<ServiceRequest>,
}

/// The fee configuration fetched for one transaction
///
/// Assembled by a `PricingCatalogSource` port implementation; the engine
/// itself never performs I/O.
#[derive(Debug, Clone)]
pub struct PricingCatalog {
    pub classification_id: ClassificationId,
    /// The aircraft type's global waiver minimum, in gallons
    pub base_min_fuel_gallons_for_waiver: Decimal,
    /// FBO-specific minimum, taking priority over the global default
    pub fbo_min_fuel_override: Option<Decimal>,
    pub fee_rules: Vec<FeeRule>,
    pub overrides: Vec<FeeRuleOverride>,
    pub waiver_tiers: Vec<WaiverTier>,
    pub is_caa_member: bool,
}

impl PricingCatalog {
    /// Effective waiver minimum for this aircraft at this FBO
    pub fn effective_min_fuel_gallons(&self) -> Decimal {
        self.fbo_min_fuel_override
            .unwrap_or(self.base_min_fuel_gallons_for_waiver)
    }
}

/// Engine configuration points
#[derive(Debug, Clone, Copy)]
pub struct FeeCalculationConfig {
    /// Flat sales tax applied to the taxable base
    pub tax_rate: Rate,
}

impl Default for FeeCalculationConfig {
    fn default() -> Self {
        Self {
            tax_rate: Rate::from_percentage(dec!(8)),
        }
    }
}

/// One computed line of a transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatedLineItem {
    pub kind: LineItemKind,
    /// Fee code for FEE lines and for the WAIVER lines that offset them
    pub fee_code: Option<String>,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Money,
    pub amount: Money,
}

/// The itemized result of one calculation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationOutcome {
    pub line_items: Vec<CalculatedLineItem>,
    pub fuel_subtotal: Money,
    pub total_fees_amount: Money,
    /// Stored as a positive magnitude; the line items carry the negation
    pub total_waivers_amount: Money,
    pub tax_amount: Money,
    pub grand_total_amount: Money,
    pub is_caa_applied: bool,
}

/// The fee calculation engine
#[derive(Debug, Clone, Default)]
pub struct FeeCalculationEngine {
    config: FeeCalculationConfig,
}

impl FeeCalculationEngine {
    pub fn new(config: FeeCalculationConfig) -> Self {
        Self { config }
    }

    /// Computes the full itemized outcome for one transaction
    ///
    /// # Errors
    ///
    /// Returns an error for non-positive service quantities, a negative
    /// uplift, or mixed currencies in the catalog.
    pub fn calculate(
        &self,
        ctx: &TransactionContext,
        catalog: &PricingCatalog,
    ) -> Result<CalculationOutcome, PricingError> {
        if ctx.fuel_uplift_gallons.is_sign_negative() {
            return Err(PricingError::Validation(
                "fuel uplift cannot be negative".to_string(),
            ));
        }

        let currency = ctx.fuel_price_per_gallon.currency();
        let mut line_items = Vec::new();

        // Fuel: always charged, never waived, always taxable
        let fuel_subtotal = ctx
            .fuel_price_per_gallon
            .multiply(ctx.fuel_uplift_gallons)
            .round_to_currency();
        line_items.push(CalculatedLineItem {
            kind: LineItemKind::Fuel,
            fee_code: None,
            description: format!("Fuel ({})", ctx.fuel_type_name),
            quantity: ctx.fuel_uplift_gallons,
            unit_price: ctx.fuel_price_per_gallon,
            amount: fuel_subtotal,
        });

        let charged = self.applicable_fees(ctx, catalog)?;

        let is_caa_applied =
            catalog.is_caa_member && charged.iter().any(|(fee, _)| fee.has_caa_override);

        let mut fee_lines = Vec::new();
        for (fee, quantity) in &charged {
            let unit_price = fee.amount_for(catalog.is_caa_member);
            let amount = unit_price.multiply(*quantity).round_to_currency();
            fee_lines.push((
                fee.clone(),
                CalculatedLineItem {
                    kind: LineItemKind::Fee,
                    fee_code: Some(fee.fee_code.clone()),
                    description: fee.fee_name.clone(),
                    quantity: *quantity,
                    unit_price,
                    amount,
                },
            ));
        }

        let waived_codes = evaluate_waivers(
            &WaiverContext {
                fuel_uplift_gallons: ctx.fuel_uplift_gallons,
                min_fuel_gallons_for_waiver: catalog.effective_min_fuel_gallons(),
                tiers: &catalog.waiver_tiers,
                is_caa_member: catalog.is_caa_member,
            },
            &charged.iter().map(|(fee, _)| fee.clone()).collect::<Vec<_>>(),
        );

        let mut waiver_lines = Vec::new();
        for (fee, line) in &fee_lines {
            if waived_codes.contains(&fee.fee_code) {
                let strategy = fee.strategy_for(catalog.is_caa_member);
                waiver_lines.push(CalculatedLineItem {
                    kind: LineItemKind::Waiver,
                    fee_code: Some(fee.fee_code.clone()),
                    description: format!("{} Waiver ({})", strategy.label(), fee.fee_name),
                    quantity: Decimal::ONE,
                    unit_price: -line.amount,
                    amount: -line.amount,
                });
            }
        }

        // Tax applies to gross fees: waivers reduce the grand total, not
        // the taxable base.
        let mut taxable_base = fuel_subtotal;
        let mut total_fees_amount = Money::zero(currency);
        for (fee, line) in &fee_lines {
            total_fees_amount = total_fees_amount.checked_add(&line.amount)?;
            if fee.is_taxable {
                taxable_base = taxable_base.checked_add(&line.amount)?;
            }
        }

        let tax_amount = if taxable_base.is_positive() {
            self.config.tax_rate.apply(&taxable_base).round_to_currency()
        } else {
            Money::zero(currency)
        };

        let mut total_waivers_amount = Money::zero(currency);
        for line in &waiver_lines {
            total_waivers_amount = total_waivers_amount.checked_add(&line.amount.abs())?;
        }

        let grand_total_amount = fuel_subtotal
            .checked_add(&total_fees_amount)?
            .checked_sub(&total_waivers_amount)?
            .checked_add(&tax_amount)?;

        line_items.extend(fee_lines.into_iter().map(|(_, line)| line));
        line_items.extend(waiver_lines);
        line_items.push(CalculatedLineItem {
            kind: LineItemKind::Tax,
            fee_code: None,
            description: format!("Sales Tax ({})", self.config.tax_rate),
            quantity: Decimal::ONE,
            unit_price: tax_amount,
            amount: tax_amount,
        });

        Ok(CalculationOutcome {
            line_items,
            fuel_subtotal,
            total_fees_amount,
            total_waivers_amount,
            tax_amount,
            grand_total_amount,
            is_caa_applied,
        })
    }

    /// The fee rules charged for this transaction, with quantities
    ///
    /// Category defaults for the aircraft's classification come first
    /// (at quantity one), followed by ad-hoc services in request order.
    /// An ad-hoc request for a code already charged as a category default
    /// adjusts that fee's quantity instead of duplicating the line. A
    /// request naming an unknown fee code is skipped, not an error.
    fn applicable_fees(
        &self,
        ctx: &TransactionContext,
        catalog: &PricingCatalog,
    ) -> Result<Vec<(ResolvedFee, Decimal)>, PricingError> {
        let mut charged: Vec<(ResolvedFee, Decimal)> = Vec::new();

        let mut defaults: Vec<&FeeRule> = catalog
            .fee_rules
            .iter()
            .filter(|r| r.applies_to_classification_id == Some(catalog.classification_id))
            .collect();
        defaults.sort_by(|a, b| a.fee_code.cmp(&b.fee_code));

        for rule in defaults {
            charged.push((
                resolve_fee(
                    rule,
                    ctx.aircraft_type_id,
                    catalog.classification_id,
                    &catalog.overrides,
                ),
                Decimal::ONE,
            ));
        }

        for service in &ctx.additional_services {
            if service.quantity <= Decimal::ZERO {
                return Err(PricingError::Validation(format!(
                    "quantity for service '{}' must be positive",
                    service.fee_code
                )));
            }

            let Some(rule) = catalog
                .fee_rules
                .iter()
                .find(|r| r.fee_code == service.fee_code)
            else {
                debug!(fee_code = %service.fee_code, "requested service has no fee rule; skipping");
                continue;
            };

            if let Some(existing) = charged
                .iter_mut()
                .find(|(fee, _)| fee.fee_code == service.fee_code)
            {
                existing.1 = service.quantity;
            } else {
                charged.push((
                    resolve_fee(
                        rule,
                        ctx.aircraft_type_id,
                        catalog.classification_id,
                        &catalog.overrides,
                    ),
                    service.quantity,
                ));
            }
        }

        Ok(charged)
    }
}
