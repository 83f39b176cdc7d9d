//! Receipt domain events
//!
//! Accumulated on the aggregate during transitions and drained by the
//! service layer with `take_events()`; the void event doubles as the
//! source for the audit record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{FuelOrderId, LineItemId, Money, ReceiptId, UserId};

use crate::receipt::ReceiptStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReceiptEvent {
    DraftCreated {
        receipt_id: ReceiptId,
        fuel_order_id: FuelOrderId,
        timestamp: DateTime<Utc>,
    },
    FeesCalculated {
        receipt_id: ReceiptId,
        grand_total: Money,
        line_item_count: usize,
        timestamp: DateTime<Utc>,
    },
    ReceiptGenerated {
        receipt_id: ReceiptId,
        receipt_number: String,
        timestamp: DateTime<Utc>,
    },
    ReceiptPaid {
        receipt_id: ReceiptId,
        timestamp: DateTime<Utc>,
    },
    ReceiptVoided {
        receipt_id: ReceiptId,
        previous_status: ReceiptStatus,
        reason: Option<String>,
        voided_by: UserId,
        timestamp: DateTime<Utc>,
    },
    ManualWaiverToggled {
        receipt_id: ReceiptId,
        line_item_id: LineItemId,
        fee_code: String,
        applied: bool,
        timestamp: DateTime<Utc>,
    },
}
