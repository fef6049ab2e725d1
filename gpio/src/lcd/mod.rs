//! Character LCD drivers.

pub mod hd44780;

use crate::GpioError;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum LcdError {
    /// A line of the bus couldn't be driven. The bus may be left mid-transfer, so the only safe
    /// recovery is running `init` again.
    #[error("pin unavailable: {0}")]
    PinUnavailable(#[from] GpioError),
    #[error("the display controller has not been initialized")]
    NotInitialized,
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
}

pub type LcdResult<T> = Result<T, LcdError>;
