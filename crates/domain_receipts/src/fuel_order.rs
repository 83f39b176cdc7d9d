//! Fuel orders
//!
//! A fuel order moves DISPATCHED -> ACKNOWLEDGED -> EN_ROUTE -> FUELING
//! -> COMPLETED -> REVIEWED (or CANCELLED). Completed orders carry the
//! gallons dispensed and meter readings that seed a receipt. Orders are
//! guarded by a `change_version` counter: every mutating update bumps
//! it, and actions taken against a stale version are rejected until the
//! caller acknowledges the newer state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use core_kernel::{AircraftTypeId, Currency, CustomerId, FboId, FuelOrderId, Money};

use crate::error::ReceiptError;

/// Fuel grades dispensed by the line crew
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelType {
    #[serde(rename = "JET_A")]
    JetA,
    #[serde(rename = "AVGAS_100LL")]
    Avgas100Ll,
    #[serde(rename = "SAF_JET_A")]
    SafJetA,
}

/// Raised when a fuel-type string cannot be normalized to a known grade
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown fuel type: {0}")]
pub struct UnknownFuelType(pub String);

impl FuelType {
    pub fn code(&self) -> &'static str {
        match self {
            FuelType::JetA => "JET_A",
            FuelType::Avgas100Ll => "AVGAS_100LL",
            FuelType::SafJetA => "SAF_JET_A",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FuelType::JetA => "Jet A",
            FuelType::Avgas100Ll => "Avgas 100LL",
            FuelType::SafJetA => "SAF Jet A",
        }
    }

    /// Hardcoded fallback used when no price record exists for an FBO
    pub fn default_price_per_gallon(&self) -> Money {
        let amount = match self {
            FuelType::JetA => dec!(5.75),
            FuelType::Avgas100Ll => dec!(7.25),
            FuelType::SafJetA => dec!(8.10),
        };
        Money::new(amount, Currency::USD)
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for FuelType {
    type Err = UnknownFuelType;

    /// Lenient parse covering the common variants seen at the API
    /// boundary: "jet_a", "JET-A", "jet a", "Jet A", etc.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_uppercase()
            .replace(['-', ' '], "_")
            .split('_')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("_");

        match normalized.as_str() {
            "JET_A" | "JETA" => Ok(FuelType::JetA),
            "AVGAS_100LL" | "AVGAS100LL" | "AVGAS" | "100LL" => Ok(FuelType::Avgas100Ll),
            "SAF_JET_A" | "SAF_JETA" | "SAFJETA" | "SAF" => Ok(FuelType::SafJetA),
            _ => Err(UnknownFuelType(s.to_string())),
        }
    }
}

/// Fuel order lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FuelOrderStatus {
    Dispatched,
    Acknowledged,
    EnRoute,
    Fueling,
    Completed,
    Reviewed,
    Cancelled,
}

impl fmt::Display for FuelOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FuelOrderStatus::Dispatched => "DISPATCHED",
            FuelOrderStatus::Acknowledged => "ACKNOWLEDGED",
            FuelOrderStatus::EnRoute => "EN_ROUTE",
            FuelOrderStatus::Fueling => "FUELING",
            FuelOrderStatus::Completed => "COMPLETED",
            FuelOrderStatus::Reviewed => "REVIEWED",
            FuelOrderStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", label)
    }
}

/// A fueling job dispatched to the line crew
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuelOrder {
    pub id: FuelOrderId,
    pub fbo_location_id: FboId,
    pub tail_number: String,
    /// None for walk-in traffic; a placeholder customer is synthesized
    /// at receipt time.
    pub customer_id: Option<CustomerId>,
    pub aircraft_type_id: AircraftTypeId,
    pub fuel_type: FuelType,
    pub requested_gallons: Option<Decimal>,
    pub gallons_dispensed: Option<Decimal>,
    pub start_meter_reading: Option<Decimal>,
    pub end_meter_reading: Option<Decimal>,
    pub status: FuelOrderStatus,
    /// Bumped on every mutating update; stale writers are rejected
    pub change_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FuelOrder {
    /// Gallons actually delivered, falling back to the meter delta when
    /// the dispensed figure was not recorded directly
    pub fn dispensed_gallons(&self) -> Option<Decimal> {
        self.gallons_dispensed.or_else(|| {
            match (self.start_meter_reading, self.end_meter_reading) {
                (Some(start), Some(end)) if end >= start => Some(end - start),
                _ => None,
            }
        })
    }

    /// Records a mutating update by advancing the change counter
    pub fn bump_change_version(&mut self) {
        self.change_version += 1;
        self.updated_at = Utc::now();
    }

    /// Rejects actions taken against a stale view of this order
    pub fn ensure_version(&self, expected: i32) -> Result<(), ReceiptError> {
        if self.change_version != expected {
            return Err(ReceiptError::StaleOrderVersion {
                expected,
                actual: self.change_version,
            });
        }
        Ok(())
    }
}
