//! HD44780 LCD module.
//!
//! Drives an HD44780 (or compatible) character display over a parallel bus made of plain GPIO lines.
//! Four wirings are supported: 4-bit or 8-bit data bus, each with or without the R/W line.
//!
//! The layers, bottom-up:
//! - [GpioHD44780Bus] moves one `(RS, byte)` pair to the controller as one 8-bit or two 4-bit
//!   enable pulses, then waits for the command to complete.
//! - [HD44780Driver] encodes the instruction set (see [instruction]) over four raw transfers.
//! - [GpioHD44780Driver] implements it on the bus, runs the power-on synchronization sequence and
//!   tracks what it believes the controller's configuration is.
//! - The line operations ([GpioHD44780Driver::put_line], [GpioHD44780Driver::push_line]) keep a
//!   [DisplayBuffer] mirror of every row, because the displayed text is never read back.
//!
//! # Busy flag
//!
//! The busy flag is never polled. Every transfer waits for the worst-case execution time of the
//! instruction from the datasheet instead (see [timing]). That's the only option when R/W is tied
//! to GND, and the driver uses it for the other wirings too. The read path exists and performs the
//! bus turnaround, but it doesn't interpret what it samples and reports [LcdError::Unsupported].
//!
//! # Sources
//!
//! - Hitachi, [“HD44780U (LCD-II) Dot Matrix Liquid Crystal Display Controller/Driver,”](https://www.sparkfun.com/datasheets/LCD/HD44780.pdf)
//!   Rev. 0.0, 1999.
//!
//! [LcdError::Unsupported]: crate::lcd::LcdError::Unsupported

mod config;
pub mod driver;
pub mod instruction;
mod lines;

pub use config::*;
pub use driver::*;
pub use lines::DisplayBuffer;

/// Fixed waits of the bus protocol, in the units their names say.
pub mod timing {
    /// Wait after power-on before the first synchronization pulse.
    pub const POWER_ON_US: u32 = 15_000;
    /// Address and data setup before E rises.
    pub const SETUP_US: u32 = 1;
    /// E high pulse width.
    pub const PULSE_WIDTH_US: u32 = 1;
    /// Data hold and enable cycle gap after E falls.
    pub const HOLD_US: u32 = 1;
    /// Execution time of every instruction except clear and home, and of data writes.
    pub const SHORT_EXECUTION_US: u32 = 37;
    /// Execution time of clear display and return home.
    pub const LONG_EXECUTION_US: u32 = 1520;
    /// Wait after the first synchronization function set.
    pub const SYNC_FIRST_US: u32 = 4100;
    /// Wait after the remaining synchronization function sets.
    pub const SYNC_US: u32 = 100;
    /// Per-character pacing of the typing effect.
    pub const TYPING_MS: u32 = 110;
    /// Pause after an animated pushed line.
    pub const LINE_PAUSE_MS: u32 = 100;
    /// Half period of [super::GpioHD44780Driver::flash].
    pub const FLASH_MS: u32 = 500;
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing/reading data.
    Left,
    /// Moves the cursor to the right after writing/reading data.
    #[default]
    Right,
}

/// Character font, selected by the function set instruction.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Font {
    #[default]
    Font5x8,
    /// Only available on single-line displays.
    Font5x10,
}
