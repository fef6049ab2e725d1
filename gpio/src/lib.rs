pub mod delay;
pub mod gpiod;
pub mod lcd;
pub mod raw;

use std::fmt::Debug;
use thiserror::Error;

pub use delay::StdDelay;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("GPIO line {0} is not available on this platform")]
    Unavailable(usize),
    #[error("GPIO line {0} is not configured as an output")]
    NotOutput(usize),
    #[error("GPIO line {0} is not configured as an input")]
    NotInput(usize),
    #[error("invalid argument")]
    InvalidArgument,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

/// Direction of a single GPIO line.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum PinDirection {
    #[default] Input,
    Output,
}

/// Specifies the bias of the GPIO pin.
///
/// Inputs are pulled down by the backends that support it, so a floating bus reads as zeroes.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GpioBias {
    #[default] None,
    PullUp,
    PullDown,
}

/// Individually addressable digital lines, identified by their platform line number.
///
/// This is the only hardware capability the LCD driver consumes. Every line can be switched between
/// input and output at any time, which is what the optional HD44780 read path needs.
pub trait PinController: Debug {
    /// Drives the line high (`true`) or low (`false`).
    ///
    /// # Errors
    /// - `GpioError::Unavailable` if `pin` is not a line on this platform.
    /// - `GpioError::NotOutput` if the line was not switched to output first.
    fn set_level(&mut self, pin: usize, high: bool) -> GpioResult<()>;

    /// Switches the line to input or output.
    ///
    /// # Errors
    /// - `GpioError::Unavailable` if `pin` is not a line on this platform.
    fn set_direction(&mut self, pin: usize, direction: PinDirection) -> GpioResult<()>;

    /// Samples the level of the line.
    ///
    /// # Errors
    /// - `GpioError::Unavailable` if `pin` is not a line on this platform.
    fn read_level(&mut self, pin: usize) -> GpioResult<bool>;
}

impl<T: PinController + ?Sized> PinController for &mut T {
    fn set_level(&mut self, pin: usize, high: bool) -> GpioResult<()> {
        (**self).set_level(pin, high)
    }

    fn set_direction(&mut self, pin: usize, direction: PinDirection) -> GpioResult<()> {
        (**self).set_direction(pin, direction)
    }

    fn read_level(&mut self, pin: usize) -> GpioResult<bool> {
        (**self).read_level(pin)
    }
}

impl<T: PinController + ?Sized> PinController for Box<T> {
    fn set_level(&mut self, pin: usize, high: bool) -> GpioResult<()> {
        (**self).set_level(pin, high)
    }

    fn set_direction(&mut self, pin: usize, direction: PinDirection) -> GpioResult<()> {
        (**self).set_direction(pin, direction)
    }

    fn read_level(&mut self, pin: usize) -> GpioResult<bool> {
        (**self).read_level(pin)
    }
}
