//! Row-to-domain mapping helpers shared by the repositories
//!
//! Enum-typed fields travel as their wire strings (SCREAMING_SNAKE);
//! stored values that fail to parse indicate corrupted data and surface
//! as internal errors rather than panics.

use std::str::FromStr;

use core_kernel::{Currency, PortError};
use domain_pricing::{CalculationBasis, LineItemKind, WaiverStrategy};
use domain_receipts::{FuelOrderStatus, FuelType, ReceiptStatus};

pub(crate) fn parse_currency(code: &str) -> Result<Currency, PortError> {
    match code {
        "USD" => Ok(Currency::USD),
        "CAD" => Ok(Currency::CAD),
        "EUR" => Ok(Currency::EUR),
        other => Err(PortError::internal(format!("unknown currency '{other}'"))),
    }
}

pub(crate) fn parse_receipt_status(status: &str) -> Result<ReceiptStatus, PortError> {
    match status {
        "DRAFT" => Ok(ReceiptStatus::Draft),
        "GENERATED" => Ok(ReceiptStatus::Generated),
        "PAID" => Ok(ReceiptStatus::Paid),
        "VOID" => Ok(ReceiptStatus::Void),
        other => Err(PortError::internal(format!(
            "unknown receipt status '{other}'"
        ))),
    }
}

pub(crate) fn parse_order_status(status: &str) -> Result<FuelOrderStatus, PortError> {
    match status {
        "DISPATCHED" => Ok(FuelOrderStatus::Dispatched),
        "ACKNOWLEDGED" => Ok(FuelOrderStatus::Acknowledged),
        "EN_ROUTE" => Ok(FuelOrderStatus::EnRoute),
        "FUELING" => Ok(FuelOrderStatus::Fueling),
        "COMPLETED" => Ok(FuelOrderStatus::Completed),
        "REVIEWED" => Ok(FuelOrderStatus::Reviewed),
        "CANCELLED" => Ok(FuelOrderStatus::Cancelled),
        other => Err(PortError::internal(format!(
            "unknown fuel order status '{other}'"
        ))),
    }
}

pub(crate) fn order_status_code(status: FuelOrderStatus) -> String {
    status.to_string()
}

pub(crate) fn parse_fuel_type(value: &str) -> Result<FuelType, PortError> {
    FuelType::from_str(value).map_err(|e| PortError::internal(e.to_string()))
}

pub(crate) fn parse_waiver_strategy(value: &str) -> Result<WaiverStrategy, PortError> {
    match value {
        "NONE" => Ok(WaiverStrategy::None),
        "SIMPLE_MULTIPLIER" => Ok(WaiverStrategy::SimpleMultiplier),
        "TIERED_MULTIPLIER" => Ok(WaiverStrategy::TieredMultiplier),
        other => Err(PortError::internal(format!(
            "unknown waiver strategy '{other}'"
        ))),
    }
}

pub(crate) fn waiver_strategy_code(strategy: WaiverStrategy) -> &'static str {
    match strategy {
        WaiverStrategy::None => "NONE",
        WaiverStrategy::SimpleMultiplier => "SIMPLE_MULTIPLIER",
        WaiverStrategy::TieredMultiplier => "TIERED_MULTIPLIER",
    }
}

pub(crate) fn parse_line_kind(value: &str) -> Result<LineItemKind, PortError> {
    match value {
        "FUEL" => Ok(LineItemKind::Fuel),
        "FEE" => Ok(LineItemKind::Fee),
        "WAIVER" => Ok(LineItemKind::Waiver),
        "TAX" => Ok(LineItemKind::Tax),
        other => Err(PortError::internal(format!(
            "unknown line item type '{other}'"
        ))),
    }
}

pub(crate) fn line_kind_code(kind: LineItemKind) -> &'static str {
    kind.as_str()
}

pub(crate) fn parse_calculation_basis(value: &str) -> Result<CalculationBasis, PortError> {
    match value {
        "FIXED_PRICE" => Ok(CalculationBasis::FixedPrice),
        "NOT_APPLICABLE" => Ok(CalculationBasis::NotApplicable),
        other => Err(PortError::internal(format!(
            "unknown calculation basis '{other}'"
        ))),
    }
}
