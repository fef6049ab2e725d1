use crate::{GpioBias, GpioError, GpioResult, PinController, PinDirection};
use bitvec::vec::BitVec;
use log::{debug, warn};
use memmap2::{MmapOptions, MmapRaw};
use std::fmt::{Debug, Formatter};
use std::fs::OpenOptions;
use std::thread::sleep;
use std::time::Duration;

/// Broadcom SoC the GPIO block belongs to. They differ in where the block sits in physical memory
/// and in how the pull resistors are set.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Soc {
    /// Pi 1 and Zero.
    Bcm2835,
    /// Pi 2, 3 and Zero 2. Also covers the BCM2836, which has the same peripheral layout.
    Bcm2837,
    /// Pi 4 and 400.
    Bcm2711,
}

impl Soc {
    /// Physical address of the GPIO block.
    pub fn gpio_base(self) -> u64 {
        match self {
            Soc::Bcm2835 => 0x20200000,
            Soc::Bcm2837 => 0x3F200000,
            Soc::Bcm2711 => 0xFE200000,
        }
    }

    /// Picks the SoC out of a NUL-separated device tree `compatible` list.
    pub fn from_compatible(compatible: &[u8]) -> Option<Soc> {
        compatible
            .split(|&b| b == 0)
            .find_map(|entry| match entry {
                b"brcm,bcm2835" => Some(Soc::Bcm2835),
                b"brcm,bcm2836" | b"brcm,bcm2837" => Some(Soc::Bcm2837),
                b"brcm,bcm2711" => Some(Soc::Bcm2711),
                _ => None,
            })
    }

    /// Reads `/proc/device-tree/compatible`. Assumes BCM2837 if that doesn't name a known SoC.
    pub fn detect() -> Soc {
        let compatible = std::fs::read("/proc/device-tree/compatible").unwrap_or_default();
        match Soc::from_compatible(&compatible) {
            Some(soc) => {
                debug!("Detected {:?}", soc);
                soc
            }
            None => {
                warn!("Unknown SoC, assuming BCM2837");
                Soc::Bcm2837
            }
        }
    }
}

/// GPIO driver poking the BCM283x/BCM2711 GPIO registers directly through a memory map.
///
/// Fast enough for microsecond-scale bit banging, unlike the character device.
pub struct RawGpioDriver {
    mmap: MmapRaw,
    soc: Soc,
    outputs: BitVec,
}

impl RawGpioDriver {
    const PIN_COUNT: usize = 58;

    fn create(path: &str, offset: u64, soc: Soc) -> GpioResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)?;

        let mmap = MmapOptions::new()
                .offset(offset)
                .len(4096)
                .map_raw(&file)?;

        debug!("Mapped {:?} GPIO registers from {} at offset {:#x}", soc, path, offset);

        Ok(RawGpioDriver {
            mmap,
            soc,
            outputs: BitVec::repeat(false, Self::PIN_COUNT),
        })
    }

    /// Maps `/dev/gpiomem`, which exposes only the GPIO block and doesn't require root.
    pub fn new_gpiomem() -> GpioResult<Self> {
        Self::create("/dev/gpiomem", 0, Soc::detect())
    }

    /// Maps the GPIO block out of `/dev/mem`. Requires root.
    pub fn new_mem() -> GpioResult<Self> {
        let soc = Soc::detect();
        Self::create("/dev/mem", soc.gpio_base(), soc)
    }

    pub fn soc(&self) -> Soc {
        self.soc
    }

    fn check_pin(pin_index: usize) -> GpioResult<()> {
        if pin_index >= Self::PIN_COUNT {
            return Err(GpioError::Unavailable(pin_index));
        }
        Ok(())
    }

    pub fn raw_set_pin_function(&self, pin_index: usize, function: u8) -> GpioResult<()> {
        if function > 0b111 {
            return Err(GpioError::InvalidArgument);
        }
        Self::check_pin(pin_index)?;

        let mmap = self.mmap.as_mut_ptr() as *mut u32;
        // GPFSELn register
        let register_ptr = unsafe { mmap.add(pin_index / 10) };
        let shift = (pin_index % 10) * 3;

        let mut register_value = unsafe { register_ptr.read_volatile() };
        register_value &= !(0b111 << shift); // Clear the bits for this pin
        register_value |= (function as u32) << shift;
        unsafe { register_ptr.write_volatile(register_value) };

        Ok(())
    }

    pub(crate) fn raw_set_pin_output(&self, pin_index: usize, high: bool) -> GpioResult<()> {
        Self::check_pin(pin_index)?;

        let mmap = self.mmap.as_mut_ptr() as *mut u32;
        // GPSETn/GPCLRn register
        let register_ptr = unsafe { mmap.add(if high { 0x1c / 4 } else { 0x28 / 4 } + pin_index / 32) };
        let shift = pin_index % 32;

        unsafe { register_ptr.write_volatile(1 << shift) };

        Ok(())
    }

    pub(crate) fn raw_get_pin_level(&self, pin_index: usize) -> GpioResult<bool> {
        Self::check_pin(pin_index)?;

        let mmap = self.mmap.as_ptr() as *const u32;
        // GPLEVn register
        let register_ptr = unsafe { mmap.add((0x34 / 4) + pin_index / 32) };
        let shift = pin_index % 32;

        let register_value = unsafe { register_ptr.read_volatile() };
        let level = (register_value >> shift) & 1;
        Ok(level != 0)
    }

    pub(crate) fn raw_set_bias(&self, pin_index: usize, bias: GpioBias) -> GpioResult<()> {
        Self::check_pin(pin_index)?;

        match self.soc {
            Soc::Bcm2711 => self.raw_set_bias_2711(pin_index, bias),
            Soc::Bcm2835 | Soc::Bcm2837 => self.raw_set_bias_283x(pin_index, bias),
        }
        Ok(())
    }

    fn raw_set_bias_2711(&self, pin_index: usize, bias: GpioBias) {
        let bias_value = match bias {
            GpioBias::None => 0b00,
            GpioBias::PullUp => 0b01,
            GpioBias::PullDown => 0b10,
        };

        let mmap = self.mmap.as_mut_ptr() as *mut u32;
        // GPIO_PUP_PDN_CNTRL_REGn register (yes that is a long name)
        let register_ptr = unsafe { mmap.add(0xE4 / 4 + pin_index / 16) };
        let shift = (pin_index % 16) * 2;
        let mut register_value = unsafe { register_ptr.read_volatile() };
        register_value &= !(0b11 << shift); // Clear the bits for this pin
        register_value |= bias_value << shift;

        unsafe { register_ptr.write_volatile(register_value) };
    }

    /// The GPPUD/GPPUDCLK dance: set the control signal, clock it into the pin, then remove both.
    /// Each step has to be held for 150 core clock cycles.
    fn raw_set_bias_283x(&self, pin_index: usize, bias: GpioBias) {
        let bias_value: u32 = match bias {
            GpioBias::None => 0b00,
            GpioBias::PullDown => 0b01,
            GpioBias::PullUp => 0b10,
        };

        let mmap = self.mmap.as_mut_ptr() as *mut u32;
        // GPPUD and GPPUDCLKn registers
        let control_ptr = unsafe { mmap.add(0x94 / 4) };
        let clock_ptr = unsafe { mmap.add(0x98 / 4 + pin_index / 32) };

        unsafe { control_ptr.write_volatile(bias_value) };
        sleep(Duration::from_micros(1));
        unsafe { clock_ptr.write_volatile(1 << (pin_index % 32)) };
        sleep(Duration::from_micros(1));
        unsafe {
            control_ptr.write_volatile(0);
            clock_ptr.write_volatile(0);
        }
    }
}

impl Debug for RawGpioDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawGpioDriver({:?}, {:?})", self.soc, self.mmap.as_ptr().addr())
    }
}

impl PinController for RawGpioDriver {
    fn set_level(&mut self, pin: usize, high: bool) -> GpioResult<()> {
        Self::check_pin(pin)?;
        if !self.outputs[pin] {
            return Err(GpioError::NotOutput(pin));
        }
        self.raw_set_pin_output(pin, high)
    }

    fn set_direction(&mut self, pin: usize, direction: PinDirection) -> GpioResult<()> {
        match direction {
            PinDirection::Input => {
                self.raw_set_pin_function(pin, 0b000)?;
                self.raw_set_bias(pin, GpioBias::PullDown)?;
            }
            PinDirection::Output => {
                self.raw_set_bias(pin, GpioBias::None)?;
                self.raw_set_pin_function(pin, 0b001)?;
            }
        }
        self.outputs.set(pin, direction == PinDirection::Output);
        Ok(())
    }

    fn read_level(&mut self, pin: usize) -> GpioResult<bool> {
        self.raw_get_pin_level(pin)
    }
}
