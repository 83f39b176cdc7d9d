//! Receipt DTOs
//!
//! Status and fuel-type enums travel as their wire strings; monetary
//! amounts serialize as decimal numbers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_pricing::ServiceRequest;
use domain_receipts::{Receipt, ReceiptLineItem, ReceiptPage};

use crate::error::ApiError;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDraftRequest {
    pub fuel_order_id: Uuid,
    /// Actor recorded on the draft; supplied by the gateway in deployed
    /// environments
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ServiceRequestDto {
    #[validate(length(min = 1, max = 64))]
    pub fee_code: String,
    pub quantity: Option<Decimal>,
}

impl From<ServiceRequestDto> for ServiceRequest {
    fn from(dto: ServiceRequestDto) -> Self {
        ServiceRequest {
            fee_code: dto.fee_code,
            quantity: dto.quantity.unwrap_or(Decimal::ONE),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDraftRequest {
    pub customer_id: Option<Uuid>,
    #[validate(length(min = 1, max = 128))]
    pub aircraft_type: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[validate(nested)]
    pub additional_services: Option<Vec<ServiceRequestDto>>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CalculateFeesRequest {
    #[validate(nested)]
    pub additional_services: Option<Vec<ServiceRequestDto>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VoidReceiptRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleWaiverRequest {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ListReceiptsQuery {
    pub status: Option<String>,
    pub customer_id: Option<Uuid>,
    pub fbo_location_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct LineItemResponse {
    pub id: Uuid,
    pub line_item_type: String,
    pub fee_code_applied: Option<String>,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
}

impl From<&ReceiptLineItem> for LineItemResponse {
    fn from(line: &ReceiptLineItem) -> Self {
        Self {
            id: *line.id.as_uuid(),
            line_item_type: line.kind.as_str().to_string(),
            fee_code_applied: line.fee_code.clone(),
            description: line.description.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price.amount(),
            amount: line.amount.amount(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    pub id: Uuid,
    pub fuel_order_id: Uuid,
    pub customer_id: Uuid,
    pub receipt_number: Option<String>,
    pub status: String,
    pub currency: String,
    pub aircraft_type: String,
    pub fuel_type: String,
    pub fuel_quantity_gallons: Option<Decimal>,
    pub fuel_unit_price: Decimal,
    pub fuel_subtotal: Decimal,
    pub total_fees_amount: Decimal,
    pub total_waivers_amount: Decimal,
    pub tax_amount: Decimal,
    pub grand_total_amount: Decimal,
    pub is_caa_applied: bool,
    pub notes: Option<String>,
    pub generated_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub line_items: Vec<LineItemResponse>,
}

impl From<&Receipt> for ReceiptResponse {
    fn from(receipt: &Receipt) -> Self {
        Self {
            id: *receipt.id.as_uuid(),
            fuel_order_id: *receipt.fuel_order_id.as_uuid(),
            customer_id: *receipt.customer_id.as_uuid(),
            receipt_number: receipt.receipt_number.clone(),
            status: receipt.status.to_string(),
            currency: receipt.currency.code().to_string(),
            aircraft_type: receipt.aircraft_type_at_receipt_time.clone(),
            fuel_type: receipt.fuel_type_at_receipt_time.code().to_string(),
            fuel_quantity_gallons: receipt.fuel_quantity_gallons_at_receipt_time,
            fuel_unit_price: receipt.fuel_unit_price_at_receipt_time.amount(),
            fuel_subtotal: receipt.fuel_subtotal.amount(),
            total_fees_amount: receipt.total_fees_amount.amount(),
            total_waivers_amount: receipt.total_waivers_amount.amount(),
            tax_amount: receipt.tax_amount.amount(),
            grand_total_amount: receipt.grand_total_amount.amount(),
            is_caa_applied: receipt.is_caa_applied,
            notes: receipt.notes.clone(),
            generated_at: receipt.generated_at,
            paid_at: receipt.paid_at,
            created_at: receipt.created_at,
            updated_at: receipt.updated_at,
            line_items: receipt.line_items.iter().map(LineItemResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_count: u64,
    pub total_pages: u32,
}

#[derive(Debug, Serialize)]
pub struct ReceiptListResponse {
    pub receipts: Vec<ReceiptResponse>,
    pub pagination: PaginationMeta,
}

impl From<&ReceiptPage> for ReceiptListResponse {
    fn from(page: &ReceiptPage) -> Self {
        Self {
            receipts: page.receipts.iter().map(ReceiptResponse::from).collect(),
            pagination: PaginationMeta {
                page: page.page,
                per_page: page.per_page,
                total_count: page.total_count,
                total_pages: page.total_pages(),
            },
        }
    }
}

/// Parses the status query parameter into a receipt status
pub fn parse_status_param(status: &str) -> Result<domain_receipts::ReceiptStatus, ApiError> {
    serde_json::from_value(serde_json::Value::String(status.to_uppercase()))
        .map_err(|_| ApiError::BadRequest(format!("unknown receipt status '{status}'")))
}
