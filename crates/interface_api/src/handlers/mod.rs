//! Request handlers

pub mod health;
pub mod receipts;
pub mod schedule;
