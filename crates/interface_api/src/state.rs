//! Application state
//!
//! The state carries the constructed domain services rather than a raw
//! connection pool: handlers stay storage-agnostic, and tests build the
//! same state over in-memory adapters.

use std::sync::Arc;

use domain_receipts::ReceiptLifecycleService;
use domain_schedule::ScheduleConfigService;

use crate::config::ApiConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub receipts: Arc<ReceiptLifecycleService>,
    pub schedule: Arc<ScheduleConfigService>,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(
        receipts: Arc<ReceiptLifecycleService>,
        schedule: Arc<ScheduleConfigService>,
        config: ApiConfig,
    ) -> Self {
        Self {
            receipts,
            schedule,
            config,
        }
    }
}
