//! Infrastructure Database Layer
//!
//! PostgreSQL adapters for the domain ports, built on SQLx. The crate
//! follows the repository pattern: each adapter implements a port trait
//! from a domain crate, hiding SQL and row mapping from the services.
//!
//! The at-most-one-active-receipt-per-fuel-order invariant lives here as
//! a partial unique index; a concurrent second writer hits the
//! constraint and surfaces as a conflict rather than succeeding.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, PostgresReceiptRepository};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/fbo")).await?;
//! let receipts = PostgresReceiptRepository::new(pool.clone());
//! ```

pub mod error;
pub mod pool;
pub mod repositories;

pub use error::DatabaseError;
pub use pool::{create_pool, create_pool_from_url, run_migrations, DatabaseConfig, DatabasePool};
pub use repositories::operations::{
    PostgresAuditSink, PostgresCustomerRepository, PostgresFuelOrderRepository,
    PostgresFuelPriceSource,
};
pub use repositories::pricing::PostgresPricingCatalogSource;
pub use repositories::receipts::PostgresReceiptRepository;
pub use repositories::schedule::{PostgresScheduleStore, PostgresVersionRepository};
