use embedded_hal::delay::DelayNs;
use std::thread::sleep;
use std::time::Duration;

/// [DelayNs] backed by [std::thread::sleep]. The OS may oversleep, never undersleep.
#[derive(Debug, Default, Copy, Clone)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        sleep(Duration::from_nanos(ns as u64));
    }

    fn delay_us(&mut self, us: u32) {
        sleep(Duration::from_micros(us as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        sleep(Duration::from_millis(ms as u64));
    }
}
