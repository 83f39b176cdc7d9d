//! Schedule administration errors

use thiserror::Error;

use core_kernel::{PortError, ScheduleVersionId};

/// Errors raised by fee schedule versioning and restore
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Fee schedule version not found: {0}")]
    VersionNotFound(ScheduleVersionId),

    #[error(transparent)]
    Port(#[from] PortError),
}
