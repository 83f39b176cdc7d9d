//! In-memory port adapters
//!
//! Mutex-guarded fakes implementing the domain ports, substituting for
//! the PostgreSQL adapters in tests. The receipt store enforces the same
//! one-active-receipt-per-fuel-order invariant the partial unique index
//! provides, so conflict paths behave identically.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use core_kernel::{
    AircraftTypeId, CustomerId, DomainPort, FboId, FuelOrderId, Money, PortError, ReceiptId,
    ScheduleVersionId,
};
use domain_pricing::{
    AircraftType, FboAircraftTypeConfig, FeeRule, FeeRuleOverride, PricingCatalog, WaiverTier,
};
use domain_receipts::{
    AuditRecord, AuditSink, Customer, CustomerRepository, FuelOrder, FuelOrderRepository,
    FuelPriceSource, FuelType, PageRequest, PricingCatalogSource, Receipt, ReceiptFilter,
    ReceiptPage, ReceiptRepository, ReceiptStatus,
};
use domain_schedule::{
    FeeScheduleSnapshot, FeeScheduleVersion, ScheduleDiff, ScheduleStore, VersionRepository,
};

/// In-memory receipt store
#[derive(Default)]
pub struct InMemoryReceiptRepository {
    receipts: Mutex<HashMap<ReceiptId, Receipt>>,
}

impl InMemoryReceiptRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.receipts.lock().unwrap().len()
    }
}

impl DomainPort for InMemoryReceiptRepository {}

#[async_trait]
impl ReceiptRepository for InMemoryReceiptRepository {
    async fn insert(&self, receipt: &Receipt) -> Result<(), PortError> {
        let mut receipts = self.receipts.lock().unwrap();

        // Same guarantee as the partial unique index in PostgreSQL
        let conflicting = receipts.values().any(|existing| {
            existing.fuel_order_id == receipt.fuel_order_id
                && existing.status != ReceiptStatus::Void
        });
        if conflicting && receipt.status != ReceiptStatus::Void {
            return Err(PortError::conflict(format!(
                "fuel order {} already has an active receipt",
                receipt.fuel_order_id
            )));
        }

        receipts.insert(receipt.id, receipt.clone());
        Ok(())
    }

    async fn update(&self, receipt: &Receipt) -> Result<(), PortError> {
        let mut receipts = self.receipts.lock().unwrap();
        if !receipts.contains_key(&receipt.id) {
            return Err(PortError::not_found("Receipt", receipt.id));
        }
        receipts.insert(receipt.id, receipt.clone());
        Ok(())
    }

    async fn find(&self, id: ReceiptId) -> Result<Option<Receipt>, PortError> {
        Ok(self.receipts.lock().unwrap().get(&id).cloned())
    }

    async fn find_active_by_fuel_order(
        &self,
        fuel_order_id: FuelOrderId,
    ) -> Result<Option<Receipt>, PortError> {
        let receipts = self.receipts.lock().unwrap();
        Ok(receipts
            .values()
            .filter(|r| r.fuel_order_id == fuel_order_id && r.status != ReceiptStatus::Void)
            .min_by_key(|r| r.created_at)
            .cloned())
    }

    async fn list(
        &self,
        filter: &ReceiptFilter,
        page: PageRequest,
    ) -> Result<ReceiptPage, PortError> {
        let receipts = self.receipts.lock().unwrap();
        let mut matching: Vec<Receipt> = receipts
            .values()
            .filter(|r| {
                filter
                    .fbo_location_id
                    .map(|fbo| r.fbo_location_id == fbo)
                    .unwrap_or(true)
                    && filter.status.map(|s| r.status == s).unwrap_or(true)
                    && filter
                        .customer_id
                        .map(|c| r.customer_id == c)
                        .unwrap_or(true)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total_count = matching.len() as u64;
        let start = page.offset() as usize;
        let receipts_page = matching
            .into_iter()
            .skip(start)
            .take(page.per_page as usize)
            .collect();

        Ok(ReceiptPage {
            receipts: receipts_page,
            total_count,
            page: page.page,
            per_page: page.per_page,
        })
    }

    async fn next_receipt_sequence(&self, fbo: FboId, day: NaiveDate) -> Result<u32, PortError> {
        let prefix = format!("R-{}-", day.format("%Y%m%d"));
        let receipts = self.receipts.lock().unwrap();
        let highest = receipts
            .values()
            .filter(|r| r.fbo_location_id == fbo)
            .filter_map(|r| r.receipt_number.as_deref())
            .filter(|number| number.starts_with(&prefix))
            .filter_map(|number| number.rsplit('-').next()?.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        Ok(highest + 1)
    }
}

/// In-memory fuel order store
#[derive(Default)]
pub struct InMemoryFuelOrderRepository {
    orders: Mutex<HashMap<FuelOrderId, FuelOrder>>,
}

impl InMemoryFuelOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, order: FuelOrder) {
        self.orders.lock().unwrap().insert(order.id, order);
    }
}

impl DomainPort for InMemoryFuelOrderRepository {}

#[async_trait]
impl FuelOrderRepository for InMemoryFuelOrderRepository {
    async fn find(&self, id: FuelOrderId) -> Result<Option<FuelOrder>, PortError> {
        Ok(self.orders.lock().unwrap().get(&id).cloned())
    }

    async fn update(&self, order: &FuelOrder) -> Result<(), PortError> {
        let mut orders = self.orders.lock().unwrap();
        if !orders.contains_key(&order.id) {
            return Err(PortError::not_found("FuelOrder", order.id));
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }
}

/// In-memory customer store
#[derive(Default)]
pub struct InMemoryCustomerRepository {
    customers: Mutex<HashMap<CustomerId, Customer>>,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, customer: Customer) {
        self.customers.lock().unwrap().insert(customer.id, customer);
    }

    pub fn get(&self, id: CustomerId) -> Option<Customer> {
        self.customers.lock().unwrap().get(&id).cloned()
    }

    pub fn placeholders(&self) -> Vec<Customer> {
        self.customers
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.is_placeholder)
            .cloned()
            .collect()
    }
}

impl DomainPort for InMemoryCustomerRepository {}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn find(&self, id: CustomerId) -> Result<Option<Customer>, PortError> {
        Ok(self.get(id))
    }

    async fn insert(&self, customer: &Customer) -> Result<(), PortError> {
        self.put(customer.clone());
        Ok(())
    }
}

/// In-memory fuel price board
#[derive(Default)]
pub struct InMemoryFuelPriceSource {
    prices: Mutex<HashMap<(FboId, FuelType), Money>>,
}

impl InMemoryFuelPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&self, fbo: FboId, fuel_type: FuelType, price: Money) {
        self.prices.lock().unwrap().insert((fbo, fuel_type), price);
    }
}

impl DomainPort for InMemoryFuelPriceSource {}

#[async_trait]
impl FuelPriceSource for InMemoryFuelPriceSource {
    async fn current_price(
        &self,
        fbo: FboId,
        fuel_type: FuelType,
    ) -> Result<Option<Money>, PortError> {
        Ok(self.prices.lock().unwrap().get(&(fbo, fuel_type)).copied())
    }
}

/// Catalog data behind the in-memory pricing source
#[derive(Default)]
pub struct CatalogData {
    pub aircraft_types: Vec<AircraftType>,
    pub fee_rules: Vec<FeeRule>,
    pub overrides: Vec<FeeRuleOverride>,
    pub waiver_tiers: Vec<WaiverTier>,
    pub fbo_configs: Vec<FboAircraftTypeConfig>,
}

/// In-memory pricing catalog source
pub struct InMemoryPricingCatalogSource {
    data: Mutex<CatalogData>,
    customers: Arc<InMemoryCustomerRepository>,
}

impl InMemoryPricingCatalogSource {
    pub fn new(data: CatalogData, customers: Arc<InMemoryCustomerRepository>) -> Self {
        Self {
            data: Mutex::new(data),
            customers,
        }
    }

    pub fn with_data<R>(&self, f: impl FnOnce(&mut CatalogData) -> R) -> R {
        f(&mut self.data.lock().unwrap())
    }
}

impl DomainPort for InMemoryPricingCatalogSource {}

#[async_trait]
impl PricingCatalogSource for InMemoryPricingCatalogSource {
    async fn load_catalog(
        &self,
        fbo: FboId,
        aircraft_type_id: AircraftTypeId,
        customer_id: CustomerId,
    ) -> Result<PricingCatalog, PortError> {
        let is_caa_member = self
            .customers
            .get(customer_id)
            .ok_or_else(|| PortError::not_found("Customer", customer_id))?
            .is_caa_member;

        let data = self.data.lock().unwrap();
        let aircraft = data
            .aircraft_types
            .iter()
            .find(|a| a.id == aircraft_type_id)
            .ok_or_else(|| PortError::not_found("AircraftType", aircraft_type_id))?;

        let fbo_min_fuel_override = data
            .fbo_configs
            .iter()
            .find(|c| c.fbo_location_id == fbo && c.aircraft_type_id == aircraft_type_id)
            .map(|c| c.base_min_fuel_gallons_for_waiver);

        Ok(PricingCatalog {
            classification_id: aircraft.default_classification_id,
            base_min_fuel_gallons_for_waiver: aircraft.base_min_fuel_gallons_for_waiver,
            fbo_min_fuel_override,
            fee_rules: data
                .fee_rules
                .iter()
                .filter(|r| r.fbo_location_id == fbo)
                .cloned()
                .collect(),
            overrides: data.overrides.clone(),
            waiver_tiers: data
                .waiver_tiers
                .iter()
                .filter(|t| t.fbo_location_id == fbo)
                .cloned()
                .collect(),
            is_caa_member,
        })
    }

    async fn aircraft_type(
        &self,
        id: AircraftTypeId,
    ) -> Result<Option<AircraftType>, PortError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .aircraft_types
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn fee_rule_by_code(
        &self,
        fbo: FboId,
        fee_code: &str,
    ) -> Result<Option<FeeRule>, PortError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .fee_rules
            .iter()
            .find(|r| r.fbo_location_id == fbo && r.fee_code == fee_code)
            .cloned())
    }
}

/// Audit sink that records entries for assertions
#[derive(Default)]
pub struct RecordingAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl DomainPort for RecordingAuditSink {}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), PortError> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}

/// In-memory schedule store applying diffs to a held snapshot
///
/// A poison switch makes the next apply fail without touching state,
/// mirroring the all-or-nothing contract of a transactional store.
#[derive(Default)]
pub struct InMemoryScheduleStore {
    snapshot: Mutex<FeeScheduleSnapshot>,
    fail_next_apply: AtomicBool,
}

impl InMemoryScheduleStore {
    pub fn with_snapshot(snapshot: FeeScheduleSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            fail_next_apply: AtomicBool::new(false),
        }
    }

    pub fn poison(&self) {
        self.fail_next_apply.store(true, Ordering::SeqCst);
    }

    pub fn current(&self) -> FeeScheduleSnapshot {
        self.snapshot.lock().unwrap().clone()
    }

    pub fn set(&self, snapshot: FeeScheduleSnapshot) {
        *self.snapshot.lock().unwrap() = snapshot;
    }

    fn collection_mut<'a>(
        snapshot: &'a mut FeeScheduleSnapshot,
        name: &str,
    ) -> &'a mut Vec<serde_json::Value> {
        match name {
            "classifications" => &mut snapshot.classifications,
            "aircraft_types" => &mut snapshot.aircraft_types,
            "fee_rules" => &mut snapshot.fee_rules,
            "overrides" => &mut snapshot.overrides,
            "waiver_tiers" => &mut snapshot.waiver_tiers,
            "aircraft_type_configs" => &mut snapshot.aircraft_type_configs,
            other => panic!("unknown collection {other}"),
        }
    }
}

impl DomainPort for InMemoryScheduleStore {}

#[async_trait]
impl ScheduleStore for InMemoryScheduleStore {
    async fn current_snapshot(&self, _fbo: FboId) -> Result<FeeScheduleSnapshot, PortError> {
        Ok(self.current())
    }

    async fn apply_diff(&self, _fbo: FboId, diff: &ScheduleDiff) -> Result<(), PortError> {
        if self.fail_next_apply.swap(false, Ordering::SeqCst) {
            return Err(PortError::internal("simulated constraint failure"));
        }

        let mut snapshot = self.snapshot.lock().unwrap();
        for (name, changes) in diff.delete_order() {
            let collection = Self::collection_mut(&mut snapshot, name);
            collection.retain(|record| {
                record
                    .get("id")
                    .map(|id| !changes.delete.contains(id))
                    .unwrap_or(true)
            });
        }
        for (name, changes) in diff.create_order() {
            let collection = Self::collection_mut(&mut snapshot, name);
            for record in &changes.update {
                let id = record.get("id").cloned();
                if let Some(existing) =
                    collection.iter_mut().find(|r| r.get("id").cloned() == id)
                {
                    *existing = record.clone();
                }
            }
            collection.extend(changes.create.iter().cloned());
        }
        Ok(())
    }
}

/// In-memory fee schedule version store
#[derive(Default)]
pub struct InMemoryVersionRepository {
    versions: Mutex<Vec<FeeScheduleVersion>>,
}

impl InMemoryVersionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DomainPort for InMemoryVersionRepository {}

#[async_trait]
impl VersionRepository for InMemoryVersionRepository {
    async fn insert(&self, version: &FeeScheduleVersion) -> Result<(), PortError> {
        self.versions.lock().unwrap().push(version.clone());
        Ok(())
    }

    async fn find(
        &self,
        id: ScheduleVersionId,
    ) -> Result<Option<FeeScheduleVersion>, PortError> {
        Ok(self
            .versions
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.id == id)
            .cloned())
    }

    async fn list(&self, fbo: FboId) -> Result<Vec<FeeScheduleVersion>, PortError> {
        let mut versions: Vec<FeeScheduleVersion> = self
            .versions
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.fbo_location_id == fbo)
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(versions)
    }
}
