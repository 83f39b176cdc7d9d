//! Fee Pricing Domain
//!
//! This crate implements the pricing side of the fuel-service core:
//!
//! - The fee catalog model: aircraft types, classifications, fee rules,
//!   per-aircraft/per-classification overrides, and waiver tiers
//! - The rule resolver, which walks the three-tier override hierarchy
//!   (aircraft -> classification -> global rule) per fee code
//! - The waiver evaluator, which decides which fee codes a fuel uplift
//!   earns a waiver for (simple-multiplier and tiered-multiplier)
//! - The fee calculation engine, a pure function from a transaction
//!   context plus a fetched catalog to an itemized monetary outcome
//!
//! The engine never touches persistence; callers fetch a
//! [`PricingCatalog`] through a port and hand it in. That keeps every
//! pricing rule unit-testable with plain in-memory data.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod resolver;
pub mod waiver;

pub use catalog::{
    AircraftClassification, AircraftType, CalculationBasis, FboAircraftTypeConfig, FeeRule,
    FeeRuleOverride, OverrideScope, WaiverStrategy, WaiverTier,
};
pub use engine::{
    CalculatedLineItem, CalculationOutcome, FeeCalculationConfig, FeeCalculationEngine,
    LineItemKind, PricingCatalog, ServiceRequest, TransactionContext,
};
pub use error::PricingError;
pub use resolver::{resolve_fee, AmountTier, ResolvedFee};
pub use waiver::{evaluate_waivers, WaiverContext};
