//! GpiodDriver implementation for driving GPIO lines through the Linux GPIO character device.
//!
//! Every direction change re-requests the line from the kernel, which takes a while. The LCD driver
//! only switches directions around the read path, so this stays off the hot write path.
use crate::{GpioBias, GpioError, GpioResult, PinController, PinDirection};
use log::debug;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

enum GpiodLine {
    Input(gpiod::Lines<gpiod::Input>),
    Output(gpiod::Lines<gpiod::Output>),
}

/// GpiodDriver is a GPIO driver that uses the gpiod library to manage GPIO lines.
pub struct GpiodDriver {
    chip: gpiod::Chip,
    lines: HashMap<usize, GpiodLine>,
}

impl GpiodDriver {
    pub fn new(chip: gpiod::Chip) -> Self {
        Self {
            chip,
            lines: HashMap::new(),
        }
    }

    /// Opens the chip at the given path, e.g. `/dev/gpiochip0`.
    pub fn open(path: &str) -> GpioResult<Self> {
        Ok(Self::new(gpiod::Chip::new(path)?))
    }

    fn check_pin(&self, pin: usize) -> GpioResult<()> {
        if pin >= self.chip.num_lines() as usize {
            return Err(GpioError::Unavailable(pin));
        }
        Ok(())
    }
}

impl Debug for GpiodDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodDriver({})", self.chip.name())
    }
}

impl From<GpioBias> for gpiod::Bias {
    fn from(bias: GpioBias) -> Self {
        match bias {
            GpioBias::None => gpiod::Bias::Disable,
            GpioBias::PullUp => gpiod::Bias::PullUp,
            GpioBias::PullDown => gpiod::Bias::PullDown,
        }
    }
}

impl PinController for GpiodDriver {
    fn set_level(&mut self, pin: usize, high: bool) -> GpioResult<()> {
        self.check_pin(pin)?;
        match self.lines.get(&pin) {
            Some(GpiodLine::Output(line)) => {
                line.set_values([high])?;
                Ok(())
            }
            _ => Err(GpioError::NotOutput(pin)),
        }
    }

    fn set_direction(&mut self, pin: usize, direction: PinDirection) -> GpioResult<()> {
        self.check_pin(pin)?;

        // The kernel refuses a second request while the old one is alive
        self.lines.remove(&pin);

        let line = match direction {
            PinDirection::Input => GpiodLine::Input(self.chip.request_lines(
                gpiod::Options::input([pin as u32])
                    .consumer(env!("CARGO_PKG_NAME"))
                    .bias(GpioBias::PullDown.into()),
            )?),
            PinDirection::Output => GpiodLine::Output(self.chip.request_lines(
                gpiod::Options::output([pin as u32])
                    .consumer(env!("CARGO_PKG_NAME"))
                    .bias(GpioBias::None.into()),
            )?),
        };
        debug!("{:?}[{}] requested as {:?}", self, pin, direction);
        self.lines.insert(pin, line);
        Ok(())
    }

    fn read_level(&mut self, pin: usize) -> GpioResult<bool> {
        self.check_pin(pin)?;
        match self.lines.get(&pin) {
            Some(GpiodLine::Input(line)) => {
                let values = line.get_values([false])?;
                Ok(values[0])
            }
            _ => Err(GpioError::NotInput(pin)),
        }
    }
}
