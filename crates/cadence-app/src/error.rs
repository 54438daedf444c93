use thiserror::Error;

/// Application-level errors (document ingestion and command line)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] cadence_service::error::ServiceError),

    #[error(transparent)]
    RfcError(#[from] cadence_rfc::error::RfcError),

    #[error(transparent)]
    CoreError(#[from] cadence_core::error::CoreError),

    #[error("Malformed series document: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type AppResult<T> = std::result::Result<T, AppError>;
