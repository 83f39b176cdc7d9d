//! Receipt domain ports
//!
//! Injectable collaborator interfaces for the lifecycle service. Each
//! port gets a PostgreSQL adapter in infra_db and an in-memory fake in
//! test_utils, so tests substitute real implementations instead of
//! patching attributes at runtime.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{
    AircraftTypeId, CustomerId, DomainPort, FboId, FuelOrderId, Money, PortError, ReceiptId,
    UserId,
};
use domain_pricing::{AircraftType, FeeRule, PricingCatalog};

use crate::customer::Customer;
use crate::fuel_order::{FuelOrder, FuelType};
use crate::receipt::{Receipt, ReceiptStatus};

/// Filter for receipt listings
#[derive(Debug, Clone, Default)]
pub struct ReceiptFilter {
    pub fbo_location_id: Option<FboId>,
    pub status: Option<ReceiptStatus>,
    pub customer_id: Option<CustomerId>,
}

/// Pagination parameters, 1-indexed
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl PageRequest {
    /// Clamps to sane bounds (page >= 1, 1 <= per_page <= 100)
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, 100),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page.max(1) as u64 - 1) * self.per_page as u64
    }
}

/// One page of receipts with pagination metadata
#[derive(Debug, Clone)]
pub struct ReceiptPage {
    pub receipts: Vec<Receipt>,
    pub total_count: u64,
    pub page: u32,
    pub per_page: u32,
}

impl ReceiptPage {
    pub fn total_pages(&self) -> u32 {
        if self.total_count == 0 {
            0
        } else {
            ((self.total_count + self.per_page as u64 - 1) / self.per_page as u64) as u32
        }
    }
}

/// An audit-trail entry for sensitive receipt actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub receipt_id: ReceiptId,
    pub actor: UserId,
    pub action: String,
    pub previous_status: Option<ReceiptStatus>,
    pub reason: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Receipt persistence
///
/// Implementations must enforce at most one non-voided receipt per fuel
/// order (a partial unique constraint in PostgreSQL) and surface the
/// second concurrent writer as a `PortError::Conflict`.
#[async_trait]
pub trait ReceiptRepository: DomainPort {
    async fn insert(&self, receipt: &Receipt) -> Result<(), PortError>;

    async fn update(&self, receipt: &Receipt) -> Result<(), PortError>;

    async fn find(&self, id: ReceiptId) -> Result<Option<Receipt>, PortError>;

    /// The first receipt for this order whose status is not VOID
    async fn find_active_by_fuel_order(
        &self,
        fuel_order_id: FuelOrderId,
    ) -> Result<Option<Receipt>, PortError>;

    async fn list(
        &self,
        filter: &ReceiptFilter,
        page: PageRequest,
    ) -> Result<ReceiptPage, PortError>;

    /// Next receipt-number sequence for an FBO on a given UTC day,
    /// starting at 1
    async fn next_receipt_sequence(&self, fbo: FboId, day: NaiveDate) -> Result<u32, PortError>;
}

/// Fuel order lookups
#[async_trait]
pub trait FuelOrderRepository: DomainPort {
    async fn find(&self, id: FuelOrderId) -> Result<Option<FuelOrder>, PortError>;

    async fn update(&self, order: &FuelOrder) -> Result<(), PortError>;
}

/// Customer lookups and placeholder creation
#[async_trait]
pub trait CustomerRepository: DomainPort {
    async fn find(&self, id: CustomerId) -> Result<Option<Customer>, PortError>;

    async fn insert(&self, customer: &Customer) -> Result<(), PortError>;
}

/// Current fuel pricing per FBO and grade
#[async_trait]
pub trait FuelPriceSource: DomainPort {
    /// None when no price record exists; callers fall back to the
    /// grade's hardcoded default
    async fn current_price(
        &self,
        fbo: FboId,
        fuel_type: FuelType,
    ) -> Result<Option<Money>, PortError>;
}

/// Assembles the fee configuration the calculation engine consumes
#[async_trait]
pub trait PricingCatalogSource: DomainPort {
    async fn load_catalog(
        &self,
        fbo: FboId,
        aircraft_type_id: AircraftTypeId,
        customer_id: CustomerId,
    ) -> Result<PricingCatalog, PortError>;

    async fn aircraft_type(&self, id: AircraftTypeId)
        -> Result<Option<AircraftType>, PortError>;

    async fn fee_rule_by_code(
        &self,
        fbo: FboId,
        fee_code: &str,
    ) -> Result<Option<FeeRule>, PortError>;
}

/// Destination for audit-trail records
#[async_trait]
pub trait AuditSink: DomainPort {
    async fn record(&self, record: AuditRecord) -> Result<(), PortError>;
}
