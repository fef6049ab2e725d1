//! Encoding of the HD44780 instruction set.
//!
//! Every instruction is a single byte sent with RS = 0. The position of its highest set bit selects
//! the instruction, the bits below it are its flags.

use super::timing::{LONG_EXECUTION_US, SHORT_EXECUTION_US};
use super::{BusWidth, CursorDirection, Font};
use crate::lcd::{LcdError, LcdResult};

/// Clears the display and sets the cursor to the home position.
///
/// Command: `00000001`.
pub const CLEAR_DISPLAY: u8 = 0b00000001;

/// Sets the cursor and the display shift to the home position.
///
/// Command: `0000001?`.
pub const RETURN_HOME: u8 = 0b00000010;

/// Command: `000001IS`.
/// `I` is `1` for right cursor direction, `0` for left cursor direction.
/// `S` is `1` for display shift, `0` for no display shift.
pub fn entry_mode_set(cursor_direction: CursorDirection, shift: bool) -> u8 {
    let mut command = 0b00000100;
    if cursor_direction == CursorDirection::Right {
        command |= 0b00000010;
    }
    if shift {
        command |= 0b00000001;
    }
    command
}

/// Command: `00001DCB`.
/// `D` is `1` for display on, `C` for cursor on, `B` for cursor blinking.
pub fn display_control(display_on: bool, cursor_on: bool, blink_on: bool) -> u8 {
    let mut command = 0b00001000;
    if display_on {
        command |= 0b00000100;
    }
    if cursor_on {
        command |= 0b00000010;
    }
    if blink_on {
        command |= 0b00000001;
    }
    command
}

/// Command: `0001DR??`.
/// `D` is `1` for display shift, `0` for cursor move.
/// `R` is `1` for right shift, `0` for left shift.
pub fn cursor_shift(display_shift: bool, direction: CursorDirection) -> u8 {
    let mut command = 0b00010000;
    if display_shift {
        command |= 0b00001000;
    }
    if direction == CursorDirection::Right {
        command |= 0b00000100;
    }
    command
}

/// Command: `001LNF??`.
/// `L` is `1` for 8-bit interface, `0` for 4-bit.
/// `N` is `1` for two display lines (also used by four-line displays), `0` for one.
/// `F` is `1` for the 5x10 font, `0` for 5x8.
pub fn function_set(width: BusWidth, two_lines: bool, font: Font) -> u8 {
    let mut command = 0b00100000;
    if width == BusWidth::Eight {
        command |= 0b00010000;
    }
    if two_lines {
        command |= 0b00001000;
    }
    if font == Font::Font5x10 {
        command |= 0b00000100;
    }
    command
}

/// Command: `01AAAAAA`.
pub fn set_cgram_address(address: u8) -> LcdResult<u8> {
    if address > 0b00111111 {
        return Err(LcdError::InvalidConfiguration(format!(
            "CGRAM address {:#04x} out of range",
            address
        )));
    }
    Ok(0b01000000 | address)
}

/// Command: `1AAAAAAA`.
pub fn set_ddram_address(address: u8) -> LcdResult<u8> {
    if address > 0b01111111 {
        return Err(LcdError::InvalidConfiguration(format!(
            "DDRAM address {:#04x} out of range",
            address
        )));
    }
    Ok(0b10000000 | address)
}

/// The high nibble of a function set selecting the 8-bit interface. Sent alone while the controller
/// is still synchronizing.
pub const SYNC_NIBBLE: u8 = 0b0011;

/// The high nibble of a function set selecting the 4-bit interface.
pub const FOUR_BIT_NIBBLE: u8 = 0b0010;

/// Worst-case execution time of an instruction, in microseconds.
///
/// Clear display and return home are the only instructions with bits 7..2 all zero.
pub fn execution_time_us(command: u8) -> u32 {
    if command & 0b11111100 == 0 {
        LONG_EXECUTION_US
    } else {
        SHORT_EXECUTION_US
    }
}

/// DDRAM address of the first cell of `row`.
///
/// Rows 2 and 3 of four-line displays continue where rows 0 and 1 end.
pub fn row_address(row: usize, columns: usize) -> u8 {
    let base = if row % 2 == 0 { 0x00 } else { 0x40 };
    let offset = if row >= 2 { columns } else { 0 };
    (base + offset) as u8
}
