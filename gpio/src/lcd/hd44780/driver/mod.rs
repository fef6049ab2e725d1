//! HD44780 driver: instruction set, initialization and controller state.

mod gpio;

use super::instruction::{self, FOUR_BIT_NIBBLE, SYNC_NIBBLE};
use super::lines::DisplayBuffer;
use super::timing::{FLASH_MS, POWER_ON_US, SHORT_EXECUTION_US, SYNC_FIRST_US, SYNC_US};
use super::{BusConfig, BusWidth, CursorDirection, Font, LcdConfig};
use crate::lcd::{LcdError, LcdResult};
use crate::PinController;
use embedded_hal::delay::DelayNs;
use log::{debug, warn};
use std::fmt::Debug;
pub use gpio::*;

/// Position of the controller in the initialization sequence.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum InitState {
    #[default]
    Uninitialized,
    /// The synchronization sequence is running. A failure here falls back to `Uninitialized`.
    Synchronizing,
    /// The controller is in a known configuration and accepts every operation.
    Ready,
}

/// Flags of the last display control instruction sent.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct DisplayControl {
    pub display_on: bool,
    pub cursor_on: bool,
    pub blink_on: bool,
}

/// Flags of the last entry mode set instruction sent.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct EntryMode {
    pub cursor_direction: CursorDirection,
    pub shift: bool,
}

/// What the driver believes the controller is configured to. There's no reading it back without
/// R/W, so this is only updated by the instructions the driver itself sends.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ControllerState {
    pub init: InitState,
    pub display: DisplayControl,
    pub entry: EntryMode,
}

impl ControllerState {
    /// Updates the tracked flags from an instruction about to be sent.
    fn track(&mut self, command: u8) {
        if command & 0b11111000 == 0b00001000 {
            self.display = DisplayControl {
                display_on: command & 0b00000100 != 0,
                cursor_on: command & 0b00000010 != 0,
                blink_on: command & 0b00000001 != 0,
            };
        } else if command & 0b11111100 == 0b00000100 {
            self.entry = EntryMode {
                cursor_direction: if command & 0b00000010 != 0 {
                    CursorDirection::Right
                } else {
                    CursorDirection::Left
                },
                shift: command & 0b00000001 != 0,
            };
        }
    }
}

/// The HD44780 instruction set, on top of a transport that moves single instruction and data bytes.
///
/// Implementors only provide the four raw transfers, every instruction is encoded here.
pub trait HD44780Driver: Debug {
    /// Clears the display and sets the cursor to the home position.
    fn clear_display(&mut self) -> LcdResult<()> {
        self.send_command(instruction::CLEAR_DISPLAY)
    }

    /// Sets the cursor to the home position and undoes any display shift.
    fn return_home(&mut self) -> LcdResult<()> {
        self.send_command(instruction::RETURN_HOME)
    }

    /// Sets the cursor direction after each write, and whether the display shifts along.
    fn set_entry_mode(&mut self, cursor_direction: CursorDirection, shift: bool) -> LcdResult<()> {
        self.send_command(instruction::entry_mode_set(cursor_direction, shift))
    }

    /// Sets the display on/off, cursor on/off, and blinking on/off.
    fn set_display_control(
        &mut self,
        display_on: bool,
        cursor_on: bool,
        blink_on: bool,
    ) -> LcdResult<()> {
        self.send_command(instruction::display_control(display_on, cursor_on, blink_on))
    }

    /// Moves the cursor or shifts the display by one cell.
    fn cursor_shift(&mut self, display_shift: bool, direction: CursorDirection) -> LcdResult<()> {
        self.send_command(instruction::cursor_shift(display_shift, direction))
    }

    fn set_cgram_address(&mut self, address: u8) -> LcdResult<()> {
        let command = instruction::set_cgram_address(address)?;
        self.send_command(command)
    }

    fn set_ddram_address(&mut self, address: u8) -> LcdResult<()> {
        let command = instruction::set_ddram_address(address)?;
        self.send_command(command)
    }

    /// Writes a character at the cursor. Characters missing from the character ROM are written as `?`.
    ///
    /// `'\u{0}'` to `'\u{7}'` show the custom characters stored in CGRAM.
    fn write_char(&mut self, c: char) -> LcdResult<()> {
        self.send_data(encode_char(c))
    }

    /// Writes the characters of `text` starting at the cursor.
    fn print(&mut self, text: &str) -> LcdResult<()> {
        for c in text.chars() {
            self.write_char(c)?;
        }
        Ok(())
    }

    /// Reads the busy flag and the address counter.
    fn read_busy_flag_and_address(&mut self) -> LcdResult<(bool, u8)> {
        let value = self.read_command()?;
        let busy_flag = value & 0b10000000 != 0;
        let address = value & 0b01111111;
        Ok((busy_flag, address))
    }

    /// Reads the character at the cursor.
    fn read_char(&mut self) -> LcdResult<u8> {
        self.read_data()
    }

    // Raw transfers, provided by the transport-specific driver.

    /// Sends an instruction byte (RS = 0) and waits until it is executed.
    fn send_command(&mut self, command: u8) -> LcdResult<()>;

    /// Sends a data byte (RS = 1) and waits until it is written.
    fn send_data(&mut self, data: u8) -> LcdResult<()>;

    /// Reads the busy flag and address counter, packed the way the controller returns them (RS = 0).
    fn read_command(&mut self) -> LcdResult<u8>;

    /// Reads a data byte (RS = 1).
    fn read_data(&mut self) -> LcdResult<u8>;
}

/// Driver for an HD44780 controller wired to plain GPIO lines.
///
/// All operations block until the controller is done with them. Calling anything but [Self::init]
/// before it succeeds fails with [LcdError::NotInitialized] without touching the bus.
///
/// The driver takes `&mut self` for every operation. When sharing it between threads, lock around
/// whole operations: `init` and the two pulses of a 4-bit transfer must not be interleaved with
/// anything else.
#[derive(Debug)]
pub struct GpioHD44780Driver<P, D> {
    bus: GpioHD44780Bus<P, D>,
    rows: usize,
    columns: usize,
    font: Font,
    default_cursor: bool,
    default_blink: bool,
    state: ControllerState,
    pub(super) buffer: DisplayBuffer,
}

impl<P: PinController, D: DelayNs + Debug> GpioHD44780Driver<P, D> {
    /// Creates the driver. No line is touched until [Self::init].
    ///
    /// # Errors
    /// - `LcdError::InvalidConfiguration` if the display geometry or font is not possible.
    pub fn new(config: LcdConfig, pins: P, delay: D) -> LcdResult<Self> {
        config.validate()?;

        Ok(GpioHD44780Driver {
            bus: GpioHD44780Bus::new(config.bus, pins, delay),
            rows: config.rows,
            columns: config.columns,
            font: config.font,
            default_cursor: config.cursor,
            default_blink: config.blink,
            state: ControllerState::default(),
            buffer: DisplayBuffer::new(config.rows, config.columns),
        })
    }

    pub fn bus_config(&self) -> &BusConfig {
        self.bus.config()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state.init == InitState::Ready
    }

    pub fn display_control(&self) -> DisplayControl {
        self.state.display
    }

    pub fn entry_mode(&self) -> EntryMode {
        self.state.entry
    }

    /// Initializes the controller, whatever state it was left in.
    ///
    /// First, it synchronizes the interface. After the power-on wait it sends the `0011` function set
    /// nibble three times, waiting 4.1 ms after the first and 100 us after the others. That forces
    /// the controller into 8-bit mode no matter what it was doing. For a 4-bit bus it then sends
    /// `0010` alone, switching to 4-bit mode, and from then on every byte goes as two nibbles.
    ///
    /// Then it brings the controller to a known default state:
    /// - function set with the bus width, line count and font,
    /// - display on, cursor and blinking per the configuration,
    /// - clear display,
    /// - entry mode: increment, no shift.
    ///
    /// Also the recovery path after any [LcdError::PinUnavailable].
    pub fn init(&mut self) -> LcdResult<()> {
        debug!("Initializing HD44780 on {:?}", self.bus.config());
        self.state = ControllerState {
            init: InitState::Synchronizing,
            ..ControllerState::default()
        };

        match self.synchronize().and_then(|_| self.configure()) {
            Ok(()) => {
                self.state.init = InitState::Ready;
                debug!("HD44780 ready");
                Ok(())
            }
            Err(e) => {
                self.state.init = InitState::Uninitialized;
                Err(e)
            }
        }
    }

    fn synchronize(&mut self) -> LcdResult<()> {
        self.bus.setup()?;
        self.bus.wait_us(POWER_ON_US);

        self.bus.write_nibble(SYNC_NIBBLE, SYNC_FIRST_US)?;
        self.bus.write_nibble(SYNC_NIBBLE, SYNC_US)?;
        self.bus.write_nibble(SYNC_NIBBLE, SYNC_US)?;

        if self.bus.config().width() == BusWidth::Four {
            self.bus.write_nibble(FOUR_BIT_NIBBLE, SYNC_US)?;
        }
        debug!("HD44780 synchronized to {:?}-bit bus", self.bus.config().width());
        Ok(())
    }

    fn configure(&mut self) -> LcdResult<()> {
        self.instruction(instruction::function_set(
            self.bus.config().width(),
            self.rows > 1,
            self.font,
        ))?;
        self.instruction(instruction::display_control(
            true,
            self.default_cursor,
            self.default_blink,
        ))?;
        self.instruction(instruction::CLEAR_DISPLAY)?;
        self.instruction(instruction::entry_mode_set(CursorDirection::Right, false))
    }

    pub(super) fn ensure_ready(&self) -> LcdResult<()> {
        if self.state.init != InitState::Ready {
            return Err(LcdError::NotInitialized);
        }
        Ok(())
    }

    /// Sends an instruction regardless of the init state, keeping the tracked state in step.
    fn instruction(&mut self, command: u8) -> LcdResult<()> {
        self.bus
            .write_byte(false, command, instruction::execution_time_us(command))?;
        self.state.track(command);
        if command == instruction::CLEAR_DISPLAY {
            self.buffer.clear();
        }
        Ok(())
    }

    /// Clears the display and sets the cursor to the home position. Blanks the line mirror too.
    pub fn clear(&mut self) -> LcdResult<()> {
        self.clear_display()
    }

    /// Sets the cursor to the home position and undoes any display shift.
    pub fn home(&mut self) -> LcdResult<()> {
        self.return_home()
    }

    /// Turns the display on and brings the cursor home.
    pub fn start(&mut self) -> LcdResult<()> {
        self.set_display_on(true)?;
        self.home()
    }

    pub fn set_display_on(&mut self, on: bool) -> LcdResult<()> {
        let display = self.state.display;
        self.set_display_control(on, display.cursor_on, display.blink_on)
    }

    pub fn set_cursor(&mut self, cursor_on: bool, blink_on: bool) -> LcdResult<()> {
        self.set_display_control(self.state.display.display_on, cursor_on, blink_on)
    }

    /// Shifts the whole display by one cell. DDRAM content is unchanged.
    pub fn shift(&mut self, direction: CursorDirection) -> LcdResult<()> {
        self.cursor_shift(true, direction)
    }

    /// Moves the cursor by one cell without writing.
    pub fn move_cursor(&mut self, direction: CursorDirection) -> LcdResult<()> {
        self.cursor_shift(false, direction)
    }

    /// Moves the cursor to the given cell.
    pub fn set_cursor_position(&mut self, row: usize, column: usize) -> LcdResult<()> {
        self.ensure_ready()?;
        self.check_row(row)?;
        if column >= self.columns {
            return Err(LcdError::InvalidConfiguration(format!(
                "column {} out of range, the display has {}",
                column, self.columns
            )));
        }
        self.set_ddram_address(instruction::row_address(row, self.columns) + column as u8)
    }

    pub(super) fn check_row(&self, row: usize) -> LcdResult<()> {
        if row >= self.rows {
            return Err(LcdError::InvalidConfiguration(format!(
                "row {} out of range, the display has {}",
                row, self.rows
            )));
        }
        Ok(())
    }

    /// Stores a 5x8 custom character in one of the 8 CGRAM slots. Only the low 5 bits of each row
    /// are used. Leaves the cursor at the home cell.
    pub fn define_char(&mut self, slot: u8, pattern: [u8; 8]) -> LcdResult<()> {
        self.ensure_ready()?;
        if slot > 7 {
            return Err(LcdError::InvalidConfiguration(format!(
                "custom character slot {} out of range",
                slot
            )));
        }
        self.set_cgram_address(slot << 3)?;
        for row in pattern {
            self.send_data(row & 0b00011111)?;
        }
        self.set_ddram_address(0)
    }

    /// Blinks the whole display `count` times, leaving it on.
    pub fn flash(&mut self, count: usize) -> LcdResult<()> {
        self.ensure_ready()?;
        for _ in 0..count {
            self.set_display_on(false)?;
            self.bus.wait_ms(FLASH_MS);
            self.set_display_on(true)?;
            self.bus.wait_ms(FLASH_MS);
        }
        Ok(())
    }

    /// Cosmetic wait, not part of the bus timing.
    pub(super) fn pace(&mut self, ms: u32) {
        self.bus.wait_ms(ms);
    }
}

impl<P: PinController, D: DelayNs + Debug> HD44780Driver for GpioHD44780Driver<P, D> {
    fn send_command(&mut self, command: u8) -> LcdResult<()> {
        self.ensure_ready()?;
        self.instruction(command)
    }

    fn send_data(&mut self, data: u8) -> LcdResult<()> {
        self.ensure_ready()?;
        self.bus.write_byte(true, data, SHORT_EXECUTION_US)
    }

    /// Performs the read cycle when R/W is wired, but the sampled bits are not interpreted yet.
    ///
    /// # Errors
    /// - `LcdError::Unsupported`, always. Without R/W, before touching the bus.
    fn read_command(&mut self) -> LcdResult<u8> {
        self.ensure_ready()?;
        self.bus.read_cycle(false)?;
        warn!("Busy flag and address counter sampled, but not interpreted");
        Err(LcdError::Unsupported("interpreting the busy flag and address counter"))
    }

    /// Same limitations as [Self::read_command].
    fn read_data(&mut self) -> LcdResult<u8> {
        self.ensure_ready()?;
        self.bus.read_cycle(true)?;
        warn!("Character sampled, but not interpreted");
        Err(LcdError::Unsupported("interpreting read-back characters"))
    }
}

/// Maps a character onto the A00 character ROM.
pub(super) fn encode_char(c: char) -> u8 {
    match c {
        '\u{0}'..='\u{7}' => c as u8,
        ' '..='~' => c as u8,
        _ => {
            warn!("Unsupported character: {:?}", c);
            b'?'
        }
    }
}

#[cfg(test)]
mod tests {
    use super::encode_char;

    #[test]
    fn encodes_printable_ascii_and_custom_slots() {
        assert_eq!(encode_char('A'), 0x41);
        assert_eq!(encode_char(' '), 0x20);
        assert_eq!(encode_char('~'), 0x7E);
        assert_eq!(encode_char('\u{3}'), 0x03);
    }

    #[test]
    fn substitutes_unknown_characters() {
        assert_eq!(encode_char('ą'), b'?');
        assert_eq!(encode_char('\n'), b'?');
        assert_eq!(encode_char('\u{7f}'), b'?');
    }
}
