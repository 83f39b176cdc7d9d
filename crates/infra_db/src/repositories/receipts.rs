//! Receipt repository implementation
//!
//! Persists receipts relationally (receipt row + ordered line-item rows)
//! and enforces the one-active-receipt-per-fuel-order invariant through
//! the `one_active_receipt_per_fuel_order` partial unique index; the
//! losing concurrent writer surfaces as a conflict.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use core_kernel::{DomainPort, FboId, FuelOrderId, Money, PortError, ReceiptId};
use domain_receipts::{
    PageRequest, Receipt, ReceiptFilter, ReceiptLineItem, ReceiptPage, ReceiptRepository,
    StoredReceipt,
};

use crate::error::map_sqlx;
use crate::repositories::mapping::{
    line_kind_code, parse_currency, parse_fuel_type, parse_line_kind, parse_receipt_status,
};

/// Repository for receipt aggregates
#[derive(Debug, Clone)]
pub struct PostgresReceiptRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct ReceiptRow {
    id: Uuid,
    fbo_location_id: Uuid,
    fuel_order_id: Uuid,
    customer_id: Uuid,
    receipt_number: Option<String>,
    status: String,
    currency: String,
    aircraft_type_at_receipt_time: String,
    fuel_type_at_receipt_time: String,
    fuel_quantity_gallons: Option<Decimal>,
    fuel_unit_price: Decimal,
    fuel_subtotal: Decimal,
    total_fees_amount: Decimal,
    total_waivers_amount: Decimal,
    tax_amount: Decimal,
    grand_total_amount: Decimal,
    is_caa_applied: bool,
    additional_services: serde_json::Value,
    notes: Option<String>,
    created_by_user_id: Uuid,
    generated_at: Option<DateTime<Utc>>,
    paid_at: Option<DateTime<Utc>>,
    voided_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct LineItemRow {
    id: Uuid,
    receipt_id: Uuid,
    line_item_type: String,
    fee_code: Option<String>,
    description: String,
    quantity: Decimal,
    unit_price: Decimal,
    amount: Decimal,
}

const RECEIPT_COLUMNS: &str = "id, fbo_location_id, fuel_order_id, customer_id, receipt_number, \
     status, currency, aircraft_type_at_receipt_time, fuel_type_at_receipt_time, \
     fuel_quantity_gallons, fuel_unit_price, fuel_subtotal, total_fees_amount, \
     total_waivers_amount, tax_amount, grand_total_amount, is_caa_applied, \
     additional_services, notes, created_by_user_id, generated_at, paid_at, voided_at, \
     created_at, updated_at";

impl PostgresReceiptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn to_domain(
        row: ReceiptRow,
        lines: Vec<LineItemRow>,
    ) -> Result<Receipt, PortError> {
        let currency = parse_currency(&row.currency)?;

        let line_items = lines
            .into_iter()
            .map(|line| {
                Ok(ReceiptLineItem {
                    id: line.id.into(),
                    kind: parse_line_kind(&line.line_item_type)?,
                    fee_code: line.fee_code,
                    description: line.description,
                    quantity: line.quantity,
                    unit_price: Money::new(line.unit_price, currency),
                    amount: Money::new(line.amount, currency),
                })
            })
            .collect::<Result<Vec<_>, PortError>>()?;

        let additional_services = serde_json::from_value(row.additional_services)
            .map_err(|e| PortError::internal(format!("bad additional_services payload: {e}")))?;

        Ok(Receipt::from_stored(StoredReceipt {
            id: row.id.into(),
            fbo_location_id: row.fbo_location_id.into(),
            fuel_order_id: row.fuel_order_id.into(),
            customer_id: row.customer_id.into(),
            receipt_number: row.receipt_number,
            status: parse_receipt_status(&row.status)?,
            currency,
            aircraft_type_at_receipt_time: row.aircraft_type_at_receipt_time,
            fuel_type_at_receipt_time: parse_fuel_type(&row.fuel_type_at_receipt_time)?,
            fuel_quantity_gallons_at_receipt_time: row.fuel_quantity_gallons,
            fuel_unit_price_at_receipt_time: Money::new(row.fuel_unit_price, currency),
            fuel_subtotal: Money::new(row.fuel_subtotal, currency),
            total_fees_amount: Money::new(row.total_fees_amount, currency),
            total_waivers_amount: Money::new(row.total_waivers_amount, currency),
            tax_amount: Money::new(row.tax_amount, currency),
            grand_total_amount: Money::new(row.grand_total_amount, currency),
            is_caa_applied: row.is_caa_applied,
            additional_services,
            notes: row.notes,
            created_by_user_id: row.created_by_user_id.into(),
            generated_at: row.generated_at,
            paid_at: row.paid_at,
            voided_at: row.voided_at,
            line_items,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }

    async fn load_lines(&self, receipt_ids: &[Uuid]) -> Result<Vec<LineItemRow>, PortError> {
        sqlx::query_as::<_, LineItemRow>(
            "SELECT id, receipt_id, line_item_type, fee_code, description, quantity, \
             unit_price, amount \
             FROM receipt_line_items WHERE receipt_id = ANY($1) ORDER BY position",
        )
        .bind(receipt_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn insert_lines(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        receipt_id: ReceiptId,
        lines: &[ReceiptLineItem],
    ) -> Result<(), sqlx::Error> {
        for (position, line) in lines.iter().enumerate() {
            sqlx::query(
                "INSERT INTO receipt_line_items \
                 (id, receipt_id, position, line_item_type, fee_code, description, \
                  quantity, unit_price, amount) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(*line.id.as_uuid())
            .bind(*receipt_id.as_uuid())
            .bind(position as i32)
            .bind(line_kind_code(line.kind))
            .bind(&line.fee_code)
            .bind(&line.description)
            .bind(line.quantity)
            .bind(line.unit_price.amount())
            .bind(line.amount.amount())
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    fn bind_receipt_values<'a>(
        query: sqlx::query::Query<'a, Postgres, sqlx::postgres::PgArguments>,
        receipt: &'a Receipt,
        services: serde_json::Value,
    ) -> sqlx::query::Query<'a, Postgres, sqlx::postgres::PgArguments> {
        query
            .bind(*receipt.id.as_uuid())
            .bind(*receipt.fbo_location_id.as_uuid())
            .bind(*receipt.fuel_order_id.as_uuid())
            .bind(*receipt.customer_id.as_uuid())
            .bind(&receipt.receipt_number)
            .bind(receipt.status.to_string())
            .bind(receipt.currency.code())
            .bind(&receipt.aircraft_type_at_receipt_time)
            .bind(receipt.fuel_type_at_receipt_time.code())
            .bind(receipt.fuel_quantity_gallons_at_receipt_time)
            .bind(receipt.fuel_unit_price_at_receipt_time.amount())
            .bind(receipt.fuel_subtotal.amount())
            .bind(receipt.total_fees_amount.amount())
            .bind(receipt.total_waivers_amount.amount())
            .bind(receipt.tax_amount.amount())
            .bind(receipt.grand_total_amount.amount())
            .bind(receipt.is_caa_applied)
            .bind(services)
            .bind(&receipt.notes)
            .bind(*receipt.created_by_user_id.as_uuid())
            .bind(receipt.generated_at)
            .bind(receipt.paid_at)
            .bind(receipt.voided_at)
            .bind(receipt.created_at)
            .bind(receipt.updated_at)
    }
}

impl DomainPort for PostgresReceiptRepository {}

#[async_trait]
impl ReceiptRepository for PostgresReceiptRepository {
    async fn insert(&self, receipt: &Receipt) -> Result<(), PortError> {
        let services = serde_json::to_value(&receipt.additional_services)
            .map_err(|e| PortError::internal(e.to_string()))?;

        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let insert = sqlx::query(
            "INSERT INTO receipts (id, fbo_location_id, fuel_order_id, customer_id, \
             receipt_number, status, currency, aircraft_type_at_receipt_time, \
             fuel_type_at_receipt_time, fuel_quantity_gallons, fuel_unit_price, \
             fuel_subtotal, total_fees_amount, total_waivers_amount, tax_amount, \
             grand_total_amount, is_caa_applied, additional_services, notes, \
             created_by_user_id, generated_at, paid_at, voided_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
             $16, $17, $18, $19, $20, $21, $22, $23, $24, $25)",
        );
        Self::bind_receipt_values(insert, receipt, services)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        Self::insert_lines(&mut tx, receipt.id, &receipt.line_items)
            .await
            .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)
    }

    async fn update(&self, receipt: &Receipt) -> Result<(), PortError> {
        let services = serde_json::to_value(&receipt.additional_services)
            .map_err(|e| PortError::internal(e.to_string()))?;

        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let update = sqlx::query(
            "UPDATE receipts SET fbo_location_id = $2, fuel_order_id = $3, \
             customer_id = $4, receipt_number = $5, status = $6, currency = $7, \
             aircraft_type_at_receipt_time = $8, fuel_type_at_receipt_time = $9, \
             fuel_quantity_gallons = $10, fuel_unit_price = $11, fuel_subtotal = $12, \
             total_fees_amount = $13, total_waivers_amount = $14, tax_amount = $15, \
             grand_total_amount = $16, is_caa_applied = $17, additional_services = $18, \
             notes = $19, created_by_user_id = $20, generated_at = $21, paid_at = $22, \
             voided_at = $23, created_at = $24, updated_at = $25 \
             WHERE id = $1",
        );
        let result = Self::bind_receipt_values(update, receipt, services)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Receipt", receipt.id));
        }

        // Full replacement keeps recalculation idempotent at the storage
        // level: no stale lines can survive a calculate pass.
        sqlx::query("DELETE FROM receipt_line_items WHERE receipt_id = $1")
            .bind(*receipt.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        Self::insert_lines(&mut tx, receipt.id, &receipt.line_items)
            .await
            .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)
    }

    async fn find(&self, id: ReceiptId) -> Result<Option<Receipt>, PortError> {
        let row = sqlx::query_as::<_, ReceiptRow>(&format!(
            "SELECT {RECEIPT_COLUMNS} FROM receipts WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        match row {
            None => Ok(None),
            Some(row) => {
                let lines = self.load_lines(&[row.id]).await?;
                Ok(Some(Self::to_domain(row, lines)?))
            }
        }
    }

    async fn find_active_by_fuel_order(
        &self,
        fuel_order_id: FuelOrderId,
    ) -> Result<Option<Receipt>, PortError> {
        let row = sqlx::query_as::<_, ReceiptRow>(&format!(
            "SELECT {RECEIPT_COLUMNS} FROM receipts \
             WHERE fuel_order_id = $1 AND status <> 'VOID' \
             ORDER BY created_at LIMIT 1"
        ))
        .bind(*fuel_order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        match row {
            None => Ok(None),
            Some(row) => {
                let lines = self.load_lines(&[row.id]).await?;
                Ok(Some(Self::to_domain(row, lines)?))
            }
        }
    }

    async fn list(
        &self,
        filter: &ReceiptFilter,
        page: PageRequest,
    ) -> Result<ReceiptPage, PortError> {
        fn apply_filter<'a>(
            builder: &mut QueryBuilder<'a, Postgres>,
            filter: &'a ReceiptFilter,
        ) {
            if let Some(fbo) = &filter.fbo_location_id {
                builder.push(" AND fbo_location_id = ").push_bind(*fbo.as_uuid());
            }
            if let Some(status) = &filter.status {
                builder.push(" AND status = ").push_bind(status.to_string());
            }
            if let Some(customer) = &filter.customer_id {
                builder.push(" AND customer_id = ").push_bind(*customer.as_uuid());
            }
        }

        let mut count_builder =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM receipts WHERE 1=1");
        apply_filter(&mut count_builder, filter);
        let total_count: i64 = count_builder
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?
            .get(0);

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {RECEIPT_COLUMNS} FROM receipts WHERE 1=1"
        ));
        apply_filter(&mut builder, filter);
        builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.per_page as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let rows: Vec<ReceiptRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut lines_by_receipt: std::collections::HashMap<Uuid, Vec<LineItemRow>> =
            std::collections::HashMap::new();
        for line in self.load_lines(&ids).await? {
            lines_by_receipt.entry(line.receipt_id).or_default().push(line);
        }

        let receipts = rows
            .into_iter()
            .map(|row| {
                let lines = lines_by_receipt.remove(&row.id).unwrap_or_default();
                Self::to_domain(row, lines)
            })
            .collect::<Result<Vec<_>, PortError>>()?;

        Ok(ReceiptPage {
            receipts,
            total_count: total_count as u64,
            page: page.page,
            per_page: page.per_page,
        })
    }

    async fn next_receipt_sequence(&self, fbo: FboId, day: NaiveDate) -> Result<u32, PortError> {
        let prefix = format!("R-{}-%", day.format("%Y%m%d"));
        let highest: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(CAST(RIGHT(receipt_number, 4) AS INTEGER)), 0) \
             FROM receipts \
             WHERE fbo_location_id = $1 AND receipt_number LIKE $2",
        )
        .bind(*fbo.as_uuid())
        .bind(prefix)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(highest as u32 + 1)
    }
}
