//! Receipt domain errors
//!
//! Each precondition failure gets its own variant so callers can tell a
//! validation problem from a state problem from a conflict, per the
//! recovery they need to apply.

use thiserror::Error;

use core_kernel::{
    AircraftTypeId, CustomerId, FuelOrderId, LineItemId, PortError, ReceiptId,
};
use domain_pricing::PricingError;

use crate::fuel_order::FuelOrderStatus;
use crate::receipt::ReceiptStatus;

/// Errors raised by the receipt lifecycle
#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("Fuel order not found: {0}")]
    FuelOrderNotFound(FuelOrderId),

    #[error("Receipt not found: {0}")]
    ReceiptNotFound(ReceiptId),

    #[error("Line item not found: {0}")]
    LineItemNotFound(LineItemId),

    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    /// Draft creation requires a completed fuel order
    #[error("Cannot create a receipt for a fuel order in status {0}")]
    InvalidOrderStatus(FuelOrderStatus),

    /// A non-voided receipt already exists for this fuel order
    #[error("Fuel order {0} already has a receipt")]
    OrderAlreadyHasReceipt(FuelOrderId),

    /// The order is immutable while an active receipt references it
    #[error("Fuel order {fuel_order_id} is locked by active receipt {receipt_id}")]
    OrderLocked {
        fuel_order_id: FuelOrderId,
        receipt_id: ReceiptId,
    },

    /// The fuel order references an aircraft type that no longer exists;
    /// the aircraft snapshot is mandatory, so this is a data-integrity
    /// failure rather than a user error.
    #[error("Aircraft type record missing for {0}")]
    MissingAircraftRecord(AircraftTypeId),

    /// Operation only permitted while the receipt is a draft
    #[error("Receipt is {0}; operation requires a DRAFT receipt")]
    DraftRequired(ReceiptStatus),

    #[error("Invalid receipt state transition from {from} to {to}")]
    InvalidStateTransition { from: ReceiptStatus, to: &'static str },

    /// Generation requires at least one calculated line item
    #[error("Receipt has uncalculated fees; calculate before generating")]
    UncalculatedFees,

    #[error("Receipt has no fuel quantity to calculate against")]
    MissingFuelQuantity,

    #[error("Receipt has no aircraft type snapshot")]
    MissingAircraftTypeSnapshot,

    #[error("Fee '{0}' is not manually waivable")]
    FeeNotManuallyWaivable(String),

    #[error("Line item {0} is not a fee line")]
    NotAFeeLine(LineItemId),

    /// The caller acted on a stale view of the fuel order
    #[error("Fuel order changed: expected version {expected}, found {actual}")]
    StaleOrderVersion { expected: i32, actual: i32 },

    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Port(#[from] PortError),
}

impl ReceiptError {
    /// True for errors callers resolve by re-reading state and retrying
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ReceiptError::OrderAlreadyHasReceipt(_)
                | ReceiptError::OrderLocked { .. }
                | ReceiptError::StaleOrderVersion { .. }
        )
    }

    /// True when the underlying entity simply does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ReceiptError::FuelOrderNotFound(_)
                | ReceiptError::ReceiptNotFound(_)
                | ReceiptError::LineItemNotFound(_)
                | ReceiptError::CustomerNotFound(_)
        )
    }
}
