use rota_core::types::ScheduleId;
use thiserror::Error;

/// Errors raised while building shifts or loading schedules.
///
/// Resolution itself never fails: an instant nobody covers is an empty set.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid shift: {0}")]
    InvalidShift(String),

    #[error("Unknown schedule: {0}")]
    UnknownSchedule(ScheduleId),

    #[error("Schedule document error: {0}")]
    ScheduleDocument(#[from] serde_json::Error),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
