//! The Receipt aggregate
//!
//! A receipt is born DRAFT from a completed fuel order, snapshotting the
//! aircraft type, fuel type, quantity, and unit price at that moment so
//! later catalog changes never rewrite history. Only drafts are mutable;
//! fee calculation replaces the full line-item set each time it runs.
//!
//! # State Machine
//!
//! Valid transitions:
//! - Draft -> Generated (via generate, requires calculated line items)
//! - Generated -> Paid (via mark_paid)
//! - Generated -> Void (via void)
//! - Paid -> Void (via void, per business policy)
//!
//! No transition leads back into Draft.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{
    Currency, CustomerId, FboId, FuelOrderId, LineItemId, Money, ReceiptId, UserId,
};
use domain_pricing::{CalculatedLineItem, CalculationOutcome, LineItemKind, ServiceRequest};

use crate::error::ReceiptError;
use crate::events::ReceiptEvent;
use crate::fuel_order::FuelType;

/// Receipt lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptStatus {
    Draft,
    Generated,
    Paid,
    Void,
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReceiptStatus::Draft => "DRAFT",
            ReceiptStatus::Generated => "GENERATED",
            ReceiptStatus::Paid => "PAID",
            ReceiptStatus::Void => "VOID",
        };
        write!(f, "{}", label)
    }
}

/// One line on a receipt
///
/// Waiver lines carry the fee code they offset and an amount that is the
/// exact negation of the corresponding fee line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptLineItem {
    pub id: LineItemId,
    pub kind: LineItemKind,
    pub fee_code: Option<String>,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Money,
    pub amount: Money,
}

impl ReceiptLineItem {
    fn from_calculated(line: &CalculatedLineItem) -> Self {
        Self {
            id: LineItemId::new_v7(),
            kind: line.kind,
            fee_code: line.fee_code.clone(),
            description: line.description.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            amount: line.amount,
        }
    }
}

/// Inputs for creating a draft receipt from a completed fuel order
#[derive(Debug, Clone)]
pub struct NewDraftReceipt {
    pub fbo_location_id: FboId,
    pub fuel_order_id: FuelOrderId,
    pub customer_id: CustomerId,
    pub aircraft_type_name: String,
    pub fuel_type: FuelType,
    pub fuel_quantity_gallons: Option<Decimal>,
    pub fuel_unit_price: Money,
    pub created_by: UserId,
}

/// Draft-only field updates; recalculation is a separate explicit step
#[derive(Debug, Clone, Default)]
pub struct DraftUpdate {
    pub customer_id: Option<CustomerId>,
    pub aircraft_type_name: Option<String>,
    pub notes: Option<String>,
    pub additional_services: Option<Vec<ServiceRequest>>,
}

/// The Receipt aggregate root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,
    pub fbo_location_id: FboId,
    pub fuel_order_id: FuelOrderId,
    pub customer_id: CustomerId,
    /// Assigned only at generation, `R-YYYYMMDD-NNNN`
    pub receipt_number: Option<String>,
    pub status: ReceiptStatus,
    pub currency: Currency,
    pub aircraft_type_at_receipt_time: String,
    pub fuel_type_at_receipt_time: FuelType,
    pub fuel_quantity_gallons_at_receipt_time: Option<Decimal>,
    pub fuel_unit_price_at_receipt_time: Money,
    pub fuel_subtotal: Money,
    pub total_fees_amount: Money,
    /// Positive magnitude; the waiver lines carry the negation
    pub total_waivers_amount: Money,
    pub tax_amount: Money,
    pub grand_total_amount: Money,
    pub is_caa_applied: bool,
    /// Ad-hoc services requested for the next calculation pass
    pub additional_services: Vec<ServiceRequest>,
    pub notes: Option<String>,
    pub created_by_user_id: UserId,
    pub generated_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub voided_at: Option<DateTime<Utc>>,
    pub line_items: Vec<ReceiptLineItem>,
    /// Domain events to be drained by the service layer
    #[serde(skip)]
    events: Vec<ReceiptEvent>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Receipt {
    /// Creates a draft with its snapshot fields and an initial fuel line
    pub fn create_draft(input: NewDraftReceipt) -> Self {
        let now = Utc::now();
        let id = ReceiptId::new_v7();
        let currency = input.fuel_unit_price.currency();

        let fuel_subtotal = input
            .fuel_quantity_gallons
            .map(|gallons| input.fuel_unit_price.multiply(gallons).round_to_currency())
            .unwrap_or_else(|| Money::zero(currency));

        let line_items = input
            .fuel_quantity_gallons
            .map(|gallons| {
                vec![ReceiptLineItem {
                    id: LineItemId::new_v7(),
                    kind: LineItemKind::Fuel,
                    fee_code: None,
                    description: format!("Fuel ({})", input.fuel_type.display_name()),
                    quantity: gallons,
                    unit_price: input.fuel_unit_price,
                    amount: fuel_subtotal,
                }]
            })
            .unwrap_or_default();

        Self {
            id,
            fbo_location_id: input.fbo_location_id,
            fuel_order_id: input.fuel_order_id,
            customer_id: input.customer_id,
            receipt_number: None,
            status: ReceiptStatus::Draft,
            currency,
            aircraft_type_at_receipt_time: input.aircraft_type_name,
            fuel_type_at_receipt_time: input.fuel_type,
            fuel_quantity_gallons_at_receipt_time: input.fuel_quantity_gallons,
            fuel_unit_price_at_receipt_time: input.fuel_unit_price,
            fuel_subtotal,
            total_fees_amount: Money::zero(currency),
            total_waivers_amount: Money::zero(currency),
            tax_amount: Money::zero(currency),
            grand_total_amount: fuel_subtotal,
            is_caa_applied: false,
            additional_services: Vec::new(),
            notes: None,
            created_by_user_id: input.created_by,
            generated_at: None,
            paid_at: None,
            voided_at: None,
            line_items,
            events: vec![ReceiptEvent::DraftCreated {
                receipt_id: id,
                fuel_order_id: input.fuel_order_id,
                timestamp: now,
            }],
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns accumulated domain events and clears them
    pub fn take_events(&mut self) -> Vec<ReceiptEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_draft(&self) -> bool {
        self.status == ReceiptStatus::Draft
    }

    pub fn is_voidable(&self) -> bool {
        matches!(self.status, ReceiptStatus::Generated | ReceiptStatus::Paid)
    }

    fn require_draft(&self) -> Result<(), ReceiptError> {
        if self.is_draft() {
            Ok(())
        } else {
            Err(ReceiptError::DraftRequired(self.status))
        }
    }

    /// Applies editable draft fields without recomputation
    pub fn update_draft_fields(&mut self, update: DraftUpdate) -> Result<(), ReceiptError> {
        self.require_draft()?;

        if let Some(customer_id) = update.customer_id {
            self.customer_id = customer_id;
        }
        if let Some(name) = update.aircraft_type_name {
            self.aircraft_type_at_receipt_time = name;
        }
        if let Some(notes) = update.notes {
            self.notes = Some(notes);
        }
        if let Some(services) = update.additional_services {
            self.additional_services = services;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Replaces all line items and totals with a fresh calculation
    ///
    /// Idempotent: running the engine twice with identical inputs leaves
    /// the receipt byte-for-byte equivalent, never with duplicated lines.
    pub fn apply_calculation(&mut self, outcome: &CalculationOutcome) -> Result<(), ReceiptError> {
        self.require_draft()?;

        self.line_items = outcome
            .line_items
            .iter()
            .map(ReceiptLineItem::from_calculated)
            .collect();
        self.fuel_subtotal = outcome.fuel_subtotal;
        self.total_fees_amount = outcome.total_fees_amount;
        self.total_waivers_amount = outcome.total_waivers_amount;
        self.tax_amount = outcome.tax_amount;
        self.grand_total_amount = outcome.grand_total_amount;
        self.is_caa_applied = outcome.is_caa_applied;

        let now = Utc::now();
        self.updated_at = now;
        self.events.push(ReceiptEvent::FeesCalculated {
            receipt_id: self.id,
            grand_total: self.grand_total_amount,
            line_item_count: self.line_items.len(),
            timestamp: now,
        });
        Ok(())
    }

    /// Finalizes the draft: assigns its number and locks the line items
    pub fn generate(&mut self, receipt_number: String) -> Result<(), ReceiptError> {
        match self.status {
            ReceiptStatus::Draft => {
                if self.line_items.is_empty() {
                    return Err(ReceiptError::UncalculatedFees);
                }
                let now = Utc::now();
                self.receipt_number = Some(receipt_number.clone());
                self.status = ReceiptStatus::Generated;
                self.generated_at = Some(now);
                self.updated_at = now;
                self.events.push(ReceiptEvent::ReceiptGenerated {
                    receipt_id: self.id,
                    receipt_number,
                    timestamp: now,
                });
                Ok(())
            }
            _ => Err(ReceiptError::InvalidStateTransition {
                from: self.status,
                to: "GENERATED",
            }),
        }
    }

    /// Marks a generated receipt as paid
    pub fn mark_paid(&mut self) -> Result<(), ReceiptError> {
        match self.status {
            ReceiptStatus::Generated => {
                let now = Utc::now();
                self.status = ReceiptStatus::Paid;
                self.paid_at = Some(now);
                self.updated_at = now;
                self.events.push(ReceiptEvent::ReceiptPaid {
                    receipt_id: self.id,
                    timestamp: now,
                });
                Ok(())
            }
            _ => Err(ReceiptError::InvalidStateTransition {
                from: self.status,
                to: "PAID",
            }),
        }
    }

    /// Voids a generated or paid receipt; drafts are simply deleted and
    /// never voided
    pub fn void(&mut self, voided_by: UserId, reason: Option<String>) -> Result<(), ReceiptError> {
        if !self.is_voidable() {
            return Err(ReceiptError::InvalidStateTransition {
                from: self.status,
                to: "VOID",
            });
        }

        let previous_status = self.status;
        let now = Utc::now();
        self.status = ReceiptStatus::Void;
        self.voided_at = Some(now);
        self.updated_at = now;
        self.events.push(ReceiptEvent::ReceiptVoided {
            receipt_id: self.id,
            previous_status,
            reason,
            voided_by,
            timestamp: now,
        });
        Ok(())
    }

    /// Toggles a manual waiver on one fee line
    ///
    /// Distinct from the automatic fuel-uplift waivers: a CSR can offset
    /// any fee whose rule allows manual waiving while the receipt is
    /// still a draft. Creates the offsetting waiver line if absent,
    /// removes it if present, then recomputes totals from the remaining
    /// lines. Returns whether the waiver is applied after the toggle.
    pub fn toggle_manual_waiver(
        &mut self,
        line_item_id: LineItemId,
        is_manually_waivable: bool,
    ) -> Result<bool, ReceiptError> {
        self.require_draft()?;

        let fee_line = self
            .line_items
            .iter()
            .find(|l| l.id == line_item_id)
            .ok_or(ReceiptError::LineItemNotFound(line_item_id))?;
        if fee_line.kind != LineItemKind::Fee {
            return Err(ReceiptError::NotAFeeLine(line_item_id));
        }
        let fee_code = fee_line
            .fee_code
            .clone()
            .ok_or(ReceiptError::NotAFeeLine(line_item_id))?;
        if !is_manually_waivable {
            return Err(ReceiptError::FeeNotManuallyWaivable(fee_code));
        }

        let fee_amount = fee_line.amount;
        let fee_description = fee_line.description.clone();

        let existing = self
            .line_items
            .iter()
            .position(|l| {
                l.kind == LineItemKind::Waiver && l.fee_code.as_deref() == Some(fee_code.as_str())
            });

        let applied = match existing {
            Some(index) => {
                self.line_items.remove(index);
                false
            }
            None => {
                self.line_items.push(ReceiptLineItem {
                    id: LineItemId::new_v7(),
                    kind: LineItemKind::Waiver,
                    fee_code: Some(fee_code.clone()),
                    description: format!("Manual Waiver ({})", fee_description),
                    quantity: Decimal::ONE,
                    unit_price: -fee_amount,
                    amount: -fee_amount,
                });
                true
            }
        };

        self.recompute_totals_from_line_items();

        let now = Utc::now();
        self.updated_at = now;
        self.events.push(ReceiptEvent::ManualWaiverToggled {
            receipt_id: self.id,
            line_item_id,
            fee_code,
            applied,
            timestamp: now,
        });
        Ok(applied)
    }

    /// Rehydrates an aggregate from its storage form without emitting
    /// any domain events
    pub fn from_stored(stored: StoredReceipt) -> Self {
        Self {
            id: stored.id,
            fbo_location_id: stored.fbo_location_id,
            fuel_order_id: stored.fuel_order_id,
            customer_id: stored.customer_id,
            receipt_number: stored.receipt_number,
            status: stored.status,
            currency: stored.currency,
            aircraft_type_at_receipt_time: stored.aircraft_type_at_receipt_time,
            fuel_type_at_receipt_time: stored.fuel_type_at_receipt_time,
            fuel_quantity_gallons_at_receipt_time: stored.fuel_quantity_gallons_at_receipt_time,
            fuel_unit_price_at_receipt_time: stored.fuel_unit_price_at_receipt_time,
            fuel_subtotal: stored.fuel_subtotal,
            total_fees_amount: stored.total_fees_amount,
            total_waivers_amount: stored.total_waivers_amount,
            tax_amount: stored.tax_amount,
            grand_total_amount: stored.grand_total_amount,
            is_caa_applied: stored.is_caa_applied,
            additional_services: stored.additional_services,
            notes: stored.notes,
            created_by_user_id: stored.created_by_user_id,
            generated_at: stored.generated_at,
            paid_at: stored.paid_at,
            voided_at: stored.voided_at,
            line_items: stored.line_items,
            events: Vec::new(),
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }

    /// Re-derives the aggregate totals by summing the current line items
    /// by kind, without re-running the calculation engine
    fn recompute_totals_from_line_items(&mut self) {
        let mut fuel = Money::zero(self.currency);
        let mut fees = Money::zero(self.currency);
        let mut waivers = Money::zero(self.currency);
        let mut tax = Money::zero(self.currency);

        for line in &self.line_items {
            match line.kind {
                LineItemKind::Fuel => fuel = fuel + line.amount,
                LineItemKind::Fee => fees = fees + line.amount,
                LineItemKind::Waiver => waivers = waivers + line.amount.abs(),
                LineItemKind::Tax => tax = tax + line.amount,
            }
        }

        self.fuel_subtotal = fuel;
        self.total_fees_amount = fees;
        self.total_waivers_amount = waivers;
        self.tax_amount = tax;
        self.grand_total_amount = fuel + fees - waivers + tax;
    }
}

/// Flat storage form of a receipt, used by persistence adapters to move
/// the aggregate in and out of row representations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReceipt {
    pub id: ReceiptId,
    pub fbo_location_id: FboId,
    pub fuel_order_id: FuelOrderId,
    pub customer_id: CustomerId,
    pub receipt_number: Option<String>,
    pub status: ReceiptStatus,
    pub currency: Currency,
    pub aircraft_type_at_receipt_time: String,
    pub fuel_type_at_receipt_time: FuelType,
    pub fuel_quantity_gallons_at_receipt_time: Option<Decimal>,
    pub fuel_unit_price_at_receipt_time: Money,
    pub fuel_subtotal: Money,
    pub total_fees_amount: Money,
    pub total_waivers_amount: Money,
    pub tax_amount: Money,
    pub grand_total_amount: Money,
    pub is_caa_applied: bool,
    pub additional_services: Vec<ServiceRequest>,
    pub notes: Option<String>,
    pub created_by_user_id: UserId,
    pub generated_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub voided_at: Option<DateTime<Utc>>,
    pub line_items: Vec<ReceiptLineItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Receipt> for StoredReceipt {
    fn from(receipt: &Receipt) -> Self {
        Self {
            id: receipt.id,
            fbo_location_id: receipt.fbo_location_id,
            fuel_order_id: receipt.fuel_order_id,
            customer_id: receipt.customer_id,
            receipt_number: receipt.receipt_number.clone(),
            status: receipt.status,
            currency: receipt.currency,
            aircraft_type_at_receipt_time: receipt.aircraft_type_at_receipt_time.clone(),
            fuel_type_at_receipt_time: receipt.fuel_type_at_receipt_time,
            fuel_quantity_gallons_at_receipt_time: receipt.fuel_quantity_gallons_at_receipt_time,
            fuel_unit_price_at_receipt_time: receipt.fuel_unit_price_at_receipt_time,
            fuel_subtotal: receipt.fuel_subtotal,
            total_fees_amount: receipt.total_fees_amount,
            total_waivers_amount: receipt.total_waivers_amount,
            tax_amount: receipt.tax_amount,
            grand_total_amount: receipt.grand_total_amount,
            is_caa_applied: receipt.is_caa_applied,
            additional_services: receipt.additional_services.clone(),
            notes: receipt.notes.clone(),
            created_by_user_id: receipt.created_by_user_id,
            generated_at: receipt.generated_at,
            paid_at: receipt.paid_at,
            voided_at: receipt.voided_at,
            line_items: receipt.line_items.clone(),
            created_at: receipt.created_at,
            updated_at: receipt.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn draft() -> Receipt {
        Receipt::create_draft(NewDraftReceipt {
            fbo_location_id: FboId::new(),
            fuel_order_id: FuelOrderId::new(),
            customer_id: CustomerId::new(),
            aircraft_type_name: "Citation CJ3".to_string(),
            fuel_type: FuelType::JetA,
            fuel_quantity_gallons: Some(dec!(200)),
            fuel_unit_price: Money::new(dec!(5.75), Currency::USD),
            created_by: UserId::new(),
        })
    }

    #[test]
    fn draft_starts_with_a_fuel_line_and_fuel_only_totals() {
        let receipt = draft();

        assert_eq!(receipt.status, ReceiptStatus::Draft);
        assert_eq!(receipt.line_items.len(), 1);
        assert_eq!(receipt.fuel_subtotal.amount(), dec!(1150.00));
        assert_eq!(receipt.grand_total_amount.amount(), dec!(1150.00));
        assert!(receipt.receipt_number.is_none());
    }

    #[test]
    fn paid_receipt_cannot_be_regenerated() {
        let mut receipt = draft();
        receipt.generate("R-20240101-0001".to_string()).unwrap();
        receipt.mark_paid().unwrap();

        let result = receipt.generate("R-20240101-0002".to_string());
        assert!(matches!(
            result,
            Err(ReceiptError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn void_records_previous_status_in_its_event() {
        let mut receipt = draft();
        receipt.generate("R-20240101-0001".to_string()).unwrap();
        receipt.mark_paid().unwrap();
        receipt.take_events();

        receipt.void(UserId::new(), Some("billing dispute".to_string())).unwrap();

        let events = receipt.take_events();
        assert!(matches!(
            events.as_slice(),
            [ReceiptEvent::ReceiptVoided {
                previous_status: ReceiptStatus::Paid,
                ..
            }]
        ));
    }
}
