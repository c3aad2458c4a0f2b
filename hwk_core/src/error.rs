use crate::method::MethodNotExist;
use crate::params::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    MethodNotExist(#[from] MethodNotExist),

    #[error("Not a valid path: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Bip32(#[from] bitcoin::bip32::Error),

    #[error("Parameter \"{0}\" is not a valid unsigned integer")]
    InvalidInteger(String),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}
