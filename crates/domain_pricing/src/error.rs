//! Pricing domain errors

use core_kernel::MoneyError;
use thiserror::Error;

/// Errors that can occur during fee resolution and calculation
#[derive(Debug, Error)]
pub enum PricingError {
    /// Monetary arithmetic failed (currency mismatch)
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// Invalid calculation input
    #[error("Validation error: {0}")]
    Validation(String),
}
