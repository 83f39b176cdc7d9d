//! Operational adapters: fuel orders, customers, fuel prices, and the
//! receipt audit log

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::{CustomerId, DomainPort, FboId, FuelOrderId, Money, PortError};
use domain_receipts::{
    AuditRecord, AuditSink, Customer, CustomerRepository, FuelOrder, FuelOrderRepository,
    FuelPriceSource, FuelType,
};

use crate::error::map_sqlx;
use crate::repositories::mapping::{
    order_status_code, parse_currency, parse_fuel_type, parse_order_status,
};

/// Repository for fuel orders
#[derive(Debug, Clone)]
pub struct PostgresFuelOrderRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct FuelOrderRow {
    id: Uuid,
    fbo_location_id: Uuid,
    tail_number: String,
    customer_id: Option<Uuid>,
    aircraft_type_id: Uuid,
    fuel_type: String,
    requested_gallons: Option<Decimal>,
    gallons_dispensed: Option<Decimal>,
    start_meter_reading: Option<Decimal>,
    end_meter_reading: Option<Decimal>,
    status: String,
    change_version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostgresFuelOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn to_domain(row: FuelOrderRow) -> Result<FuelOrder, PortError> {
        Ok(FuelOrder {
            id: row.id.into(),
            fbo_location_id: row.fbo_location_id.into(),
            tail_number: row.tail_number,
            customer_id: row.customer_id.map(Into::into),
            aircraft_type_id: row.aircraft_type_id.into(),
            fuel_type: parse_fuel_type(&row.fuel_type)?,
            requested_gallons: row.requested_gallons,
            gallons_dispensed: row.gallons_dispensed,
            start_meter_reading: row.start_meter_reading,
            end_meter_reading: row.end_meter_reading,
            status: parse_order_status(&row.status)?,
            change_version: row.change_version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl DomainPort for PostgresFuelOrderRepository {}

#[async_trait]
impl FuelOrderRepository for PostgresFuelOrderRepository {
    async fn find(&self, id: FuelOrderId) -> Result<Option<FuelOrder>, PortError> {
        let row = sqlx::query_as::<_, FuelOrderRow>(
            "SELECT id, fbo_location_id, tail_number, customer_id, aircraft_type_id, \
             fuel_type, requested_gallons, gallons_dispensed, start_meter_reading, \
             end_meter_reading, status, change_version, created_at, updated_at \
             FROM fuel_orders WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(Self::to_domain).transpose()
    }

    async fn update(&self, order: &FuelOrder) -> Result<(), PortError> {
        let result = sqlx::query(
            "UPDATE fuel_orders SET tail_number = $2, customer_id = $3, \
             aircraft_type_id = $4, fuel_type = $5, requested_gallons = $6, \
             gallons_dispensed = $7, start_meter_reading = $8, end_meter_reading = $9, \
             status = $10, change_version = $11, updated_at = $12 \
             WHERE id = $1",
        )
        .bind(*order.id.as_uuid())
        .bind(&order.tail_number)
        .bind(order.customer_id.map(|id| *id.as_uuid()))
        .bind(*order.aircraft_type_id.as_uuid())
        .bind(order.fuel_type.code())
        .bind(order.requested_gallons)
        .bind(order.gallons_dispensed)
        .bind(order.start_meter_reading)
        .bind(order.end_meter_reading)
        .bind(order_status_code(order.status))
        .bind(order.change_version)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("FuelOrder", order.id));
        }
        Ok(())
    }
}

/// Repository for customers
#[derive(Debug, Clone)]
pub struct PostgresCustomerRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    name: String,
    email: String,
    is_placeholder: bool,
    is_caa_member: bool,
    caa_member_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostgresCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresCustomerRepository {}

#[async_trait]
impl CustomerRepository for PostgresCustomerRepository {
    async fn find(&self, id: CustomerId) -> Result<Option<Customer>, PortError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, name, email, is_placeholder, is_caa_member, caa_member_id, \
             created_at, updated_at \
             FROM customers WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(row.map(|row| Customer {
            id: row.id.into(),
            name: row.name,
            email: row.email,
            is_placeholder: row.is_placeholder,
            is_caa_member: row.is_caa_member,
            caa_member_id: row.caa_member_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }

    async fn insert(&self, customer: &Customer) -> Result<(), PortError> {
        sqlx::query(
            "INSERT INTO customers (id, name, email, is_placeholder, is_caa_member, \
             caa_member_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(*customer.id.as_uuid())
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(customer.is_placeholder)
        .bind(customer.is_caa_member)
        .bind(&customer.caa_member_id)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }
}

/// Current fuel prices per FBO and grade
#[derive(Debug, Clone)]
pub struct PostgresFuelPriceSource {
    pool: PgPool,
}

impl PostgresFuelPriceSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresFuelPriceSource {}

#[async_trait]
impl FuelPriceSource for PostgresFuelPriceSource {
    async fn current_price(
        &self,
        fbo: FboId,
        fuel_type: FuelType,
    ) -> Result<Option<Money>, PortError> {
        let row: Option<(Decimal, String)> = sqlx::query_as(
            "SELECT price_per_gallon, currency FROM fuel_prices \
             WHERE fbo_location_id = $1 AND fuel_type = $2",
        )
        .bind(*fbo.as_uuid())
        .bind(fuel_type.code())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(|(amount, currency)| Ok(Money::new(amount, parse_currency(&currency)?)))
            .transpose()
    }
}

/// Receipt audit-trail writer
#[derive(Debug, Clone)]
pub struct PostgresAuditSink {
    pool: PgPool,
}

impl PostgresAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresAuditSink {}

#[async_trait]
impl AuditSink for PostgresAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), PortError> {
        sqlx::query(
            "INSERT INTO receipt_audit_log (receipt_id, actor, action, previous_status, \
             reason, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(*record.receipt_id.as_uuid())
        .bind(*record.actor.as_uuid())
        .bind(&record.action)
        .bind(record.previous_status.map(|s| s.to_string()))
        .bind(&record.reason)
        .bind(record.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }
}
