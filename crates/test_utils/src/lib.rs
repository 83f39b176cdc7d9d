//! Shared test utilities for the fuel-service workspace
//!
//! Provides the in-memory adapters for every domain port (so services
//! run in tests exactly as in production, minus the database), the
//! standard light-jet catalog fixture, data builders, and a wired-up
//! [`TestHarness`] for lifecycle and API scenarios.

pub mod builders;
pub mod fixtures;
pub mod harness;
pub mod memory;

pub use builders::{CustomerBuilder, FuelOrderBuilder};
pub use fixtures::StandardCatalog;
pub use harness::TestHarness;
pub use memory::{
    InMemoryCustomerRepository, InMemoryFuelOrderRepository, InMemoryFuelPriceSource,
    InMemoryPricingCatalogSource, InMemoryReceiptRepository, InMemoryScheduleStore,
    InMemoryVersionRepository, RecordingAuditSink,
};
