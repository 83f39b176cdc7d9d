//! Core Kernel - Foundational types and utilities for the FBO fuel-service system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed entity identifiers
//! - Port infrastructure for the hexagonal architecture

pub mod identifiers;
pub mod money;
pub mod ports;

pub use identifiers::{
    AircraftTypeId, ClassificationId, CustomerId, FboId, FeeRuleId, FeeRuleOverrideId,
    FuelOrderId, LineItemId, ReceiptId, ScheduleVersionId, UserId, WaiverTierId,
};
pub use money::{Currency, Money, MoneyError, Rate};
pub use ports::{DomainPort, PortError};
