//! Receipt Domain
//!
//! This crate owns the receipt lifecycle for completed fuel orders:
//!
//! - The [`Receipt`] aggregate and its one-way state machine
//!   (DRAFT -> GENERATED -> PAID, with GENERATED/PAID -> VOID)
//! - Draft creation from a completed [`FuelOrder`], including placeholder
//!   [`Customer`] synthesis and fuel-price snapshotting
//! - Idempotent fee recalculation delegated to the pricing engine
//! - Receipt numbering, payment marking, voiding with audit records, and
//!   the manual per-line waiver toggle
//!
//! Persistence and configuration lookups happen behind the port traits in
//! [`ports`], so the whole lifecycle runs against in-memory fakes in
//! tests and PostgreSQL adapters in production.

pub mod customer;
pub mod error;
pub mod events;
pub mod fuel_order;
pub mod lifecycle;
pub mod ports;
pub mod receipt;

pub use customer::Customer;
pub use error::ReceiptError;
pub use events::ReceiptEvent;
pub use fuel_order::{FuelOrder, FuelOrderStatus, FuelType, UnknownFuelType};
pub use lifecycle::{OrderLockStatus, ReceiptLifecycleService};
pub use ports::{
    AuditRecord, AuditSink, CustomerRepository, FuelOrderRepository, FuelPriceSource,
    PageRequest, PricingCatalogSource, ReceiptFilter, ReceiptPage, ReceiptRepository,
};
pub use receipt::{
    DraftUpdate, NewDraftReceipt, Receipt, ReceiptLineItem, ReceiptStatus, StoredReceipt,
};
