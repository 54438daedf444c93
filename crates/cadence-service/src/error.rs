use thiserror::Error;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    RfcError(#[from] cadence_rfc::error::RfcError),

    #[error(transparent)]
    CoreError(#[from] cadence_core::error::CoreError),

    #[error("Invalid override: {0}")]
    InvalidOverride(String),

    #[error("Ambiguous comparison between floating and absolute time: {0}")]
    AmbiguousComparison(String),

    #[error("Invalid query window: {0}")]
    InvalidWindow(String),

    #[error("Recurrence rule error: {0}")]
    RuleError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<cadence_rfc::rfc::ical::expand::ZoneError> for ServiceError {
    fn from(err: cadence_rfc::rfc::ical::expand::ZoneError) -> Self {
        Self::RfcError(err.into())
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
