//! Request/response data transfer objects

pub mod receipts;
pub mod schedule;
