use thiserror::Error;

/// Calendar export errors
#[derive(Error, Debug)]
pub enum IcalError {
    #[error("Unrepresentable rule: {0}")]
    Unrepresentable(String),

    #[error("RRule validation error: {0}")]
    RRuleValidationError(#[from] rrule::RRuleError),
}

pub type IcalResult<T> = std::result::Result<T, IcalError>;
