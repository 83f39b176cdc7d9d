//! Wired-up test harness
//!
//! Builds the full receipt lifecycle service over in-memory adapters
//! seeded with the standard catalog, plus the schedule service, so
//! scenario and API tests construct one object and go.

use once_cell::sync::Lazy;
use std::sync::Arc;

use core_kernel::{AircraftTypeId, FboId};
use domain_pricing::FeeCalculationEngine;
use domain_receipts::{FuelOrder, ReceiptLifecycleService};
use domain_schedule::ScheduleConfigService;

use crate::builders::FuelOrderBuilder;
use crate::fixtures::StandardCatalog;
use crate::memory::{
    CatalogData, InMemoryCustomerRepository, InMemoryFuelOrderRepository,
    InMemoryFuelPriceSource, InMemoryPricingCatalogSource, InMemoryReceiptRepository,
    InMemoryScheduleStore, InMemoryVersionRepository, RecordingAuditSink,
};

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
});

/// Everything a lifecycle scenario needs, wired over in-memory adapters
pub struct TestHarness {
    pub fbo: FboId,
    pub aircraft_type_id: AircraftTypeId,
    pub receipts: Arc<InMemoryReceiptRepository>,
    pub fuel_orders: Arc<InMemoryFuelOrderRepository>,
    pub customers: Arc<InMemoryCustomerRepository>,
    pub fuel_prices: Arc<InMemoryFuelPriceSource>,
    pub catalog: Arc<InMemoryPricingCatalogSource>,
    pub audit: Arc<RecordingAuditSink>,
    pub schedule_store: Arc<InMemoryScheduleStore>,
    pub versions: Arc<InMemoryVersionRepository>,
    pub service: ReceiptLifecycleService,
    pub schedule: ScheduleConfigService,
}

impl TestHarness {
    /// Builds a harness seeded with the standard light-jet catalog and
    /// the default 8% tax engine
    pub fn new() -> Self {
        Self::with_catalog(StandardCatalog::new())
    }

    pub fn with_catalog(catalog_fixture: StandardCatalog) -> Self {
        Lazy::force(&TRACING);

        let fbo = catalog_fixture.fbo;
        let aircraft_type_id = catalog_fixture.aircraft.id;

        let receipts = Arc::new(InMemoryReceiptRepository::new());
        let fuel_orders = Arc::new(InMemoryFuelOrderRepository::new());
        let customers = Arc::new(InMemoryCustomerRepository::new());
        let fuel_prices = Arc::new(InMemoryFuelPriceSource::new());
        let audit = Arc::new(RecordingAuditSink::new());

        let catalog = Arc::new(InMemoryPricingCatalogSource::new(
            CatalogData {
                aircraft_types: vec![catalog_fixture.aircraft],
                fee_rules: catalog_fixture.fee_rules,
                overrides: Vec::new(),
                waiver_tiers: catalog_fixture.waiver_tiers,
                fbo_configs: Vec::new(),
            },
            customers.clone(),
        ));

        let service = ReceiptLifecycleService::new(
            receipts.clone(),
            fuel_orders.clone(),
            customers.clone(),
            fuel_prices.clone(),
            catalog.clone(),
            audit.clone(),
            FeeCalculationEngine::default(),
        );

        let schedule_store = Arc::new(InMemoryScheduleStore::default());
        let versions = Arc::new(InMemoryVersionRepository::new());
        let schedule = ScheduleConfigService::new(schedule_store.clone(), versions.clone());

        Self {
            fbo,
            aircraft_type_id,
            receipts,
            fuel_orders,
            customers,
            fuel_prices,
            catalog,
            audit,
            schedule_store,
            versions,
            service,
            schedule,
        }
    }

    /// Seeds and returns a completed fuel order built with the given
    /// customization
    pub fn seed_order(&self, build: impl FnOnce(FuelOrderBuilder) -> FuelOrderBuilder) -> FuelOrder {
        let order = build(FuelOrderBuilder::new(self.fbo, self.aircraft_type_id)).build();
        self.fuel_orders.put(order.clone());
        order
    }

    /// Seeds a default completed 200-gallon Jet A order
    pub fn seed_completed_order(&self) -> FuelOrder {
        self.seed_order(|builder| builder)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
