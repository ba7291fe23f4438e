use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgroPlanError {
    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Invalid crop: {0}")]
    InvalidCrop(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid planning horizon: {0}")]
    InvalidHorizon(String),
}

pub type Result<T> = std::result::Result<T, AgroPlanError>;
