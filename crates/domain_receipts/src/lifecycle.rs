//! Receipt lifecycle service
//!
//! Orchestrates the receipt state machine over the domain ports: draft
//! creation from completed fuel orders, draft mutation, fee calculation
//! delegation, generation (number assignment), payment marking, voiding
//! with audit records, and the manual waiver toggle.

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use core_kernel::{FuelOrderId, LineItemId, ReceiptId, UserId};
use domain_pricing::{FeeCalculationEngine, ServiceRequest, TransactionContext};

use crate::customer::Customer;
use crate::error::ReceiptError;
use crate::fuel_order::FuelOrderStatus;
use crate::ports::{
    AuditRecord, AuditSink, CustomerRepository, FuelOrderRepository, FuelPriceSource,
    PageRequest, PricingCatalogSource, ReceiptFilter, ReceiptPage, ReceiptRepository,
};
use crate::receipt::{DraftUpdate, NewDraftReceipt, Receipt};

/// Whether a fuel order is locked by an active (non-void) receipt
#[derive(Debug, Clone, Copy)]
pub struct OrderLockStatus {
    pub locked: bool,
    /// The first non-voided receipt for the order, when one exists
    pub receipt_id: Option<ReceiptId>,
}

/// The receipt lifecycle service
///
/// All collaborators are injected ports; construct it over PostgreSQL
/// adapters in production and in-memory fakes in tests.
#[derive(Clone)]
pub struct ReceiptLifecycleService {
    receipts: Arc<dyn ReceiptRepository>,
    fuel_orders: Arc<dyn FuelOrderRepository>,
    customers: Arc<dyn CustomerRepository>,
    fuel_prices: Arc<dyn FuelPriceSource>,
    catalog: Arc<dyn PricingCatalogSource>,
    audit: Arc<dyn AuditSink>,
    engine: FeeCalculationEngine,
}

impl ReceiptLifecycleService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        receipts: Arc<dyn ReceiptRepository>,
        fuel_orders: Arc<dyn FuelOrderRepository>,
        customers: Arc<dyn CustomerRepository>,
        fuel_prices: Arc<dyn FuelPriceSource>,
        catalog: Arc<dyn PricingCatalogSource>,
        audit: Arc<dyn AuditSink>,
        engine: FeeCalculationEngine,
    ) -> Self {
        Self {
            receipts,
            fuel_orders,
            customers,
            fuel_prices,
            catalog,
            audit,
            engine,
        }
    }

    /// Creates a DRAFT receipt from a completed fuel order
    ///
    /// Requires the order to be COMPLETED and to have no non-voided
    /// receipt (a prior VOID does not block creation, supporting
    /// void-and-recreate). Auto-creates a placeholder customer for
    /// unlinked orders and snapshots the aircraft type, fuel type,
    /// quantity, and current unit price.
    pub async fn create_draft_from_fuel_order(
        &self,
        fuel_order_id: FuelOrderId,
        user_id: UserId,
    ) -> Result<Receipt, ReceiptError> {
        let order = self
            .fuel_orders
            .find(fuel_order_id)
            .await?
            .ok_or(ReceiptError::FuelOrderNotFound(fuel_order_id))?;

        if order.status != FuelOrderStatus::Completed {
            return Err(ReceiptError::InvalidOrderStatus(order.status));
        }

        if self
            .receipts
            .find_active_by_fuel_order(fuel_order_id)
            .await?
            .is_some()
        {
            return Err(ReceiptError::OrderAlreadyHasReceipt(fuel_order_id));
        }

        let aircraft = self
            .catalog
            .aircraft_type(order.aircraft_type_id)
            .await?
            .ok_or_else(|| {
                error!(
                    fuel_order_id = %fuel_order_id,
                    aircraft_type_id = %order.aircraft_type_id,
                    "fuel order references a missing aircraft type record"
                );
                ReceiptError::MissingAircraftRecord(order.aircraft_type_id)
            })?;

        let customer_id = match order.customer_id {
            Some(id) => id,
            None => {
                let placeholder = Customer::placeholder_for_tail(&order.tail_number);
                info!(
                    tail_number = %order.tail_number,
                    customer_id = %placeholder.id,
                    "creating placeholder customer for unlinked fuel order"
                );
                self.customers.insert(&placeholder).await?;
                placeholder.id
            }
        };

        let fuel_unit_price = match self
            .fuel_prices
            .current_price(order.fbo_location_id, order.fuel_type)
            .await?
        {
            Some(price) => price,
            None => {
                let fallback = order.fuel_type.default_price_per_gallon();
                warn!(
                    fbo = %order.fbo_location_id,
                    fuel_type = %order.fuel_type,
                    %fallback,
                    "no fuel price record; using default"
                );
                fallback
            }
        };

        let receipt = Receipt::create_draft(NewDraftReceipt {
            fbo_location_id: order.fbo_location_id,
            fuel_order_id,
            customer_id,
            aircraft_type_name: aircraft.name,
            fuel_type: order.fuel_type,
            fuel_quantity_gallons: order.dispensed_gallons(),
            fuel_unit_price,
            created_by: user_id,
        });

        // A concurrent creator loses the race at the database constraint
        self.receipts.insert(&receipt).await.map_err(|e| {
            if e.is_conflict() {
                ReceiptError::OrderAlreadyHasReceipt(fuel_order_id)
            } else {
                ReceiptError::Port(e)
            }
        })?;

        info!(receipt_id = %receipt.id, fuel_order_id = %fuel_order_id, "draft receipt created");
        Ok(receipt)
    }

    /// Updates editable draft fields without recomputing fees
    pub async fn update_draft(
        &self,
        receipt_id: ReceiptId,
        update: DraftUpdate,
        _user_id: UserId,
    ) -> Result<Receipt, ReceiptError> {
        let mut receipt = self.load(receipt_id).await?;

        if let Some(customer_id) = update.customer_id {
            self.customers
                .find(customer_id)
                .await?
                .ok_or(ReceiptError::CustomerNotFound(customer_id))?;
        }

        receipt.update_draft_fields(update)?;
        self.receipts.update(&receipt).await?;
        Ok(receipt)
    }

    /// Runs the fee calculation engine and replaces the draft's line
    /// items and totals with the result
    ///
    /// Idempotent: repeated calls with identical inputs converge on the
    /// same stored state.
    pub async fn calculate_and_update_draft(
        &self,
        receipt_id: ReceiptId,
        additional_services: Option<Vec<ServiceRequest>>,
    ) -> Result<Receipt, ReceiptError> {
        let mut receipt = self.load(receipt_id).await?;

        if !receipt.is_draft() {
            return Err(ReceiptError::DraftRequired(receipt.status));
        }

        let order = self
            .fuel_orders
            .find(receipt.fuel_order_id)
            .await?
            .ok_or(ReceiptError::FuelOrderNotFound(receipt.fuel_order_id))?;

        let fuel_quantity = receipt
            .fuel_quantity_gallons_at_receipt_time
            .ok_or(ReceiptError::MissingFuelQuantity)?;

        if receipt.aircraft_type_at_receipt_time.trim().is_empty() {
            return Err(ReceiptError::MissingAircraftTypeSnapshot);
        }

        if let Some(services) = additional_services {
            receipt.additional_services = services;
        }

        let catalog = self
            .catalog
            .load_catalog(
                receipt.fbo_location_id,
                order.aircraft_type_id,
                receipt.customer_id,
            )
            .await?;

        let ctx = TransactionContext {
            fbo_location_id: receipt.fbo_location_id,
            aircraft_type_id: order.aircraft_type_id,
            customer_id: receipt.customer_id,
            fuel_uplift_gallons: fuel_quantity,
            fuel_price_per_gallon: receipt.fuel_unit_price_at_receipt_time,
            fuel_type_name: receipt.fuel_type_at_receipt_time.display_name().to_string(),
            additional_services: receipt.additional_services.clone(),
        };

        let outcome = self.engine.calculate(&ctx, &catalog)?;
        receipt.apply_calculation(&outcome)?;
        self.receipts.update(&receipt).await?;

        info!(
            receipt_id = %receipt.id,
            grand_total = %receipt.grand_total_amount,
            "fees calculated"
        );
        Ok(receipt)
    }

    /// Finalizes a draft: assigns the next `R-YYYYMMDD-NNNN` number for
    /// this FBO and transitions to GENERATED
    pub async fn generate_receipt(&self, receipt_id: ReceiptId) -> Result<Receipt, ReceiptError> {
        let mut receipt = self.load(receipt_id).await?;

        if !receipt.is_draft() {
            return Err(ReceiptError::InvalidStateTransition {
                from: receipt.status,
                to: "GENERATED",
            });
        }
        if receipt.line_items.is_empty() {
            return Err(ReceiptError::UncalculatedFees);
        }

        let today = Utc::now().date_naive();
        let sequence = self
            .receipts
            .next_receipt_sequence(receipt.fbo_location_id, today)
            .await?;
        let receipt_number = format!("R-{}-{:04}", today.format("%Y%m%d"), sequence);

        receipt.generate(receipt_number.clone())?;
        self.receipts.update(&receipt).await?;

        info!(receipt_id = %receipt.id, receipt_number = %receipt_number, "receipt generated");
        Ok(receipt)
    }

    /// Transitions a generated receipt to PAID
    pub async fn mark_as_paid(&self, receipt_id: ReceiptId) -> Result<Receipt, ReceiptError> {
        let mut receipt = self.load(receipt_id).await?;
        receipt.mark_paid()?;
        self.receipts.update(&receipt).await?;
        info!(receipt_id = %receipt.id, "receipt marked paid");
        Ok(receipt)
    }

    /// Voids a generated or paid receipt, writing an audit record with
    /// the previous status, reason, and actor
    pub async fn void_receipt(
        &self,
        receipt_id: ReceiptId,
        user_id: UserId,
        reason: Option<String>,
    ) -> Result<Receipt, ReceiptError> {
        let mut receipt = self.load(receipt_id).await?;
        let previous_status = receipt.status;

        receipt.void(user_id, reason.clone())?;
        self.receipts.update(&receipt).await?;

        self.audit
            .record(AuditRecord {
                receipt_id: receipt.id,
                actor: user_id,
                action: "receipt_voided".to_string(),
                previous_status: Some(previous_status),
                reason,
                recorded_at: Utc::now(),
            })
            .await?;

        info!(
            receipt_id = %receipt.id,
            previous_status = %previous_status,
            "receipt voided"
        );
        Ok(receipt)
    }

    /// Toggles a manual waiver on one FEE line of a draft receipt
    ///
    /// The underlying fee rule must allow manual waiving; totals are
    /// recomputed from the resulting line items rather than by re-running
    /// the calculation engine.
    pub async fn toggle_line_item_waiver(
        &self,
        receipt_id: ReceiptId,
        line_item_id: LineItemId,
        _user_id: UserId,
    ) -> Result<Receipt, ReceiptError> {
        let mut receipt = self.load(receipt_id).await?;

        let fee_code = receipt
            .line_items
            .iter()
            .find(|l| l.id == line_item_id)
            .ok_or(ReceiptError::LineItemNotFound(line_item_id))?
            .fee_code
            .clone();

        let is_manually_waivable = match fee_code {
            Some(ref code) => self
                .catalog
                .fee_rule_by_code(receipt.fbo_location_id, code)
                .await?
                .map(|rule| rule.is_manually_waivable)
                .unwrap_or(false),
            None => false,
        };

        receipt.toggle_manual_waiver(line_item_id, is_manually_waivable)?;
        self.receipts.update(&receipt).await?;
        Ok(receipt)
    }

    pub async fn get_receipt(&self, receipt_id: ReceiptId) -> Result<Receipt, ReceiptError> {
        self.load(receipt_id).await
    }

    pub async fn list_receipts(
        &self,
        filter: ReceiptFilter,
        page: PageRequest,
    ) -> Result<ReceiptPage, ReceiptError> {
        Ok(self.receipts.list(&filter, page.normalized()).await?)
    }

    /// Reports whether an order is locked by an active receipt; the
    /// exposed receipt id is the first non-voided receipt or None
    pub async fn order_lock(&self, fuel_order_id: FuelOrderId) -> Result<OrderLockStatus, ReceiptError> {
        let active = self.receipts.find_active_by_fuel_order(fuel_order_id).await?;
        Ok(OrderLockStatus {
            locked: active.is_some(),
            receipt_id: active.map(|r| r.id),
        })
    }

    /// Guard for manual fuel-order status edits: fails while any
    /// non-voided receipt references the order
    pub async fn ensure_order_mutable(&self, fuel_order_id: FuelOrderId) -> Result<(), ReceiptError> {
        match self.receipts.find_active_by_fuel_order(fuel_order_id).await? {
            Some(receipt) => Err(ReceiptError::OrderLocked {
                fuel_order_id,
                receipt_id: receipt.id,
            }),
            None => Ok(()),
        }
    }

    async fn load(&self, receipt_id: ReceiptId) -> Result<Receipt, ReceiptError> {
        self.receipts
            .find(receipt_id)
            .await?
            .ok_or(ReceiptError::ReceiptNotFound(receipt_id))
    }
}

impl std::fmt::Debug for ReceiptLifecycleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiptLifecycleService").finish_non_exhaustive()
    }
}
