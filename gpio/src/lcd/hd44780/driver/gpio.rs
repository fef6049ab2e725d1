use crate::lcd::hd44780::timing::{HOLD_US, PULSE_WIDTH_US, SETUP_US};
use crate::lcd::hd44780::{BusConfig, BusWidth};
use crate::lcd::{LcdError, LcdResult};
use crate::{PinController, PinDirection};
use embedded_hal::delay::DelayNs;
use log::{debug, trace};

/// Transport moving `(RS, byte)` pairs over the GPIO lines described by a [BusConfig].
///
/// Each transfer sets RS, puts the bits on the data lines, waits [SETUP_US], holds E high for
/// [PULSE_WIDTH_US] and waits [HOLD_US] after the falling edge, which latches the bits. A 4-bit bus
/// does this twice, high nibble first. The execution time passed by the caller is waited out
/// afterward, in place of polling the busy flag.
#[derive(Debug)]
pub struct GpioHD44780Bus<P, D> {
    config: BusConfig,
    pins: P,
    delay: D,
    /// `None` until [Self::setup] runs.
    data_direction: Option<PinDirection>,
}

impl<P: PinController, D: DelayNs> GpioHD44780Bus<P, D> {
    /// Doesn't touch any line until [Self::setup].
    pub fn new(config: BusConfig, pins: P, delay: D) -> Self {
        GpioHD44780Bus {
            config,
            pins,
            delay,
            data_direction: None,
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Switches every line to output and drives it low.
    pub fn setup(&mut self) -> LcdResult<()> {
        debug!("Setting up HD44780 bus {:?}", self.config);

        let control_lines = [self.config.enable_line(), self.config.rs_line()]
            .into_iter()
            .chain(self.config.rw_line());
        for line in control_lines {
            self.pins.set_direction(line, PinDirection::Output)?;
            self.pins.set_level(line, false)?;
        }

        for i in 0..self.config.data_lines().len() {
            let line = self.config.data_lines()[i];
            self.pins.set_direction(line, PinDirection::Output)?;
            self.pins.set_level(line, false)?;
        }
        self.data_direction = Some(PinDirection::Output);

        Ok(())
    }

    /// Turns the data lines around. R/W is changed on the side that avoids both ends driving the
    /// bus at once: after releasing the lines when reading, before taking them when writing.
    fn set_data_direction(&mut self, direction: PinDirection) -> LcdResult<()> {
        if self.data_direction == Some(direction) {
            return Ok(());
        }
        debug!("Switching HD44780 data lines to {:?}", direction);

        if direction == PinDirection::Output {
            if let Some(rw) = self.config.rw_line() {
                self.pins.set_level(rw, false)?;
            }
        }

        // Forget the direction until every line has switched
        self.data_direction = None;
        for i in 0..self.config.data_lines().len() {
            let line = self.config.data_lines()[i];
            self.pins.set_direction(line, direction)?;
        }
        self.data_direction = Some(direction);

        if direction == PinDirection::Input {
            if let Some(rw) = self.config.rw_line() {
                self.pins.set_level(rw, true)?;
            }
        }

        Ok(())
    }

    /// Puts the lowest `data_lines().len()` bits of `value` on the data lines, LSb first.
    fn put_data(&mut self, value: u8) -> LcdResult<()> {
        for i in 0..self.config.data_lines().len() {
            let line = self.config.data_lines()[i];
            self.pins.set_level(line, value & (1 << i) != 0)?;
        }
        Ok(())
    }

    fn pulse_e(&mut self) -> LcdResult<()> {
        let e = self.config.enable_line();
        self.delay.delay_us(SETUP_US);
        self.pins.set_level(e, true)?;
        self.delay.delay_us(PULSE_WIDTH_US);
        self.pins.set_level(e, false)?;
        self.delay.delay_us(HOLD_US);
        Ok(())
    }

    fn begin_write(&mut self, rs: bool) -> LcdResult<()> {
        if self.data_direction != Some(PinDirection::Output) {
            self.set_data_direction(PinDirection::Output)?;
        }

        // Set RS pin
        self.pins.set_level(self.config.rs_line(), rs)?;

        // Set RW pin to write
        if let Some(rw) = self.config.rw_line() {
            self.pins.set_level(rw, false)?;
        }
        Ok(())
    }

    /// Sends one byte with the given RS level, then blocks for `execution_us`.
    pub fn write_byte(&mut self, rs: bool, value: u8, execution_us: u32) -> LcdResult<()> {
        trace!("Sending data: {:08b}, RS: {}", value, rs);

        self.begin_write(rs)?;

        match self.config.width() {
            BusWidth::Eight => {
                self.put_data(value)?;
                self.pulse_e()?;
            }
            BusWidth::Four => {
                let high_nibble = (value >> 4) & 0x0F;
                let low_nibble = value & 0x0F;

                trace!("Writing HN: {:04b}", high_nibble);
                self.put_data(high_nibble)?;
                self.pulse_e()?;

                trace!("Writing LN: {:04b}", low_nibble);
                self.put_data(low_nibble)?;
                self.pulse_e()?;
            }
        }

        self.delay.delay_us(execution_us);
        Ok(())
    }

    /// Sends a single instruction nibble as one pulse, then blocks for `execution_us`.
    ///
    /// Only meaningful while synchronizing, when the controller still latches 8 bits per pulse and
    /// D0..D3 are ignored. On an 8-bit bus the nibble goes to D4..D7 with D0..D3 low.
    pub fn write_nibble(&mut self, nibble: u8, execution_us: u32) -> LcdResult<()> {
        trace!("Sending nibble: {:04b}", nibble);

        self.begin_write(false)?;

        match self.config.width() {
            BusWidth::Eight => self.put_data((nibble & 0x0F) << 4)?,
            BusWidth::Four => self.put_data(nibble & 0x0F)?,
        }
        self.pulse_e()?;

        self.delay.delay_us(execution_us);
        Ok(())
    }

    /// Performs a read cycle: releases the data lines, sets R/W to read and strobes E once per
    /// nibble, sampling the bus while E is high.
    ///
    /// The sampled bits are only traced, interpreting them is up to a future busy flag
    /// implementation. The data lines stay inputs until the next write.
    ///
    /// # Errors
    /// - `LcdError::Unsupported` if the R/W line is not wired. No line is touched then.
    pub fn read_cycle(&mut self, rs: bool) -> LcdResult<()> {
        if !self.config.rw_connected() {
            return Err(LcdError::Unsupported("reading requires the R/W line"));
        }

        self.set_data_direction(PinDirection::Input)?;
        self.pins.set_level(self.config.rs_line(), rs)?;

        let pulses = match self.config.width() {
            BusWidth::Eight => 1,
            BusWidth::Four => 2,
        };
        let e = self.config.enable_line();
        for _ in 0..pulses {
            self.delay.delay_us(SETUP_US);
            self.pins.set_level(e, true)?;
            self.delay.delay_us(PULSE_WIDTH_US);

            let mut sampled = 0u8;
            for i in 0..self.config.data_lines().len() {
                let line = self.config.data_lines()[i];
                if self.pins.read_level(line)? {
                    sampled |= 1 << i;
                }
            }
            trace!("Sampled: {:08b}, RS: {}", sampled, rs);

            self.pins.set_level(e, false)?;
            self.delay.delay_us(HOLD_US);
        }

        Ok(())
    }

    /// Waits without touching the bus.
    pub fn wait_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    /// Waits without touching the bus. Used for cosmetic pacing.
    pub fn wait_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
