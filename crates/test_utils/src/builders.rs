//! Test data builders
//!
//! Builder patterns for constructing test data with sensible defaults;
//! tests specify only the fields they care about.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{AircraftTypeId, CustomerId, FboId, FuelOrderId};
use domain_receipts::{Customer, FuelOrder, FuelOrderStatus, FuelType};

/// Builder for fuel orders; defaults to a completed 200-gallon Jet A
/// delivery for an unlinked tail
pub struct FuelOrderBuilder {
    fbo_location_id: FboId,
    tail_number: String,
    customer_id: Option<CustomerId>,
    aircraft_type_id: AircraftTypeId,
    fuel_type: FuelType,
    gallons_dispensed: Option<Decimal>,
    start_meter_reading: Option<Decimal>,
    end_meter_reading: Option<Decimal>,
    status: FuelOrderStatus,
}

impl FuelOrderBuilder {
    pub fn new(fbo_location_id: FboId, aircraft_type_id: AircraftTypeId) -> Self {
        Self {
            fbo_location_id,
            tail_number: "N123AB".to_string(),
            customer_id: None,
            aircraft_type_id,
            fuel_type: FuelType::JetA,
            gallons_dispensed: Some(dec!(200)),
            start_meter_reading: None,
            end_meter_reading: None,
            status: FuelOrderStatus::Completed,
        }
    }

    pub fn with_tail_number(mut self, tail: impl Into<String>) -> Self {
        self.tail_number = tail.into();
        self
    }

    pub fn with_customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_fuel_type(mut self, fuel_type: FuelType) -> Self {
        self.fuel_type = fuel_type;
        self
    }

    pub fn with_gallons_dispensed(mut self, gallons: Option<Decimal>) -> Self {
        self.gallons_dispensed = gallons;
        self
    }

    pub fn with_meter_readings(mut self, start: Decimal, end: Decimal) -> Self {
        self.start_meter_reading = Some(start);
        self.end_meter_reading = Some(end);
        self
    }

    pub fn with_status(mut self, status: FuelOrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn build(self) -> FuelOrder {
        let now = Utc::now();
        FuelOrder {
            id: FuelOrderId::new_v7(),
            fbo_location_id: self.fbo_location_id,
            tail_number: self.tail_number,
            customer_id: self.customer_id,
            aircraft_type_id: self.aircraft_type_id,
            fuel_type: self.fuel_type,
            requested_gallons: self.gallons_dispensed,
            gallons_dispensed: self.gallons_dispensed,
            start_meter_reading: self.start_meter_reading,
            end_meter_reading: self.end_meter_reading,
            status: self.status,
            change_version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Builder for customers
pub struct CustomerBuilder {
    name: String,
    email: String,
    is_caa_member: bool,
    caa_member_id: Option<String>,
}

impl CustomerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let email = format!(
            "{}@example.test",
            name.to_lowercase().replace(' ', ".")
        );
        Self {
            name,
            email,
            is_caa_member: false,
            caa_member_id: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn caa_member(mut self, member_id: impl Into<String>) -> Self {
        self.is_caa_member = true;
        self.caa_member_id = Some(member_id.into());
        self
    }

    pub fn build(self) -> Customer {
        let mut customer = Customer::new(self.name, self.email);
        customer.is_caa_member = self.is_caa_member;
        customer.caa_member_id = self.caa_member_id;
        customer
    }
}
