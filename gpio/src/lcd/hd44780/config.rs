use super::Font;
use crate::lcd::{LcdError, LcdResult};
use std::collections::HashSet;

/// Width of the data bus between the host and the controller.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BusWidth {
    /// D4..D7 wired, every byte goes as two nibbles.
    Four,
    /// D0..D7 wired.
    Eight,
}

/// Wiring of the parallel bus. Immutable once constructed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BusConfig {
    data_lines: Vec<usize>,
    enable_line: usize,
    rs_line: usize,
    rw_line: Option<usize>,
    width: BusWidth,
}

impl BusConfig {
    /// Describes the bus wiring.
    ///
    /// # Parameters
    ///
    /// - `data_lines`: GPIO lines of the data bus, lowest bit first. 8 lines are D0..D7,
    ///   4 lines are D4..D7.
    /// - `enable_line`: the E line.
    /// - `rs_line`: the register select line.
    /// - `rw_line`: the R/W line. If not provided, the display's R/W pin must be tied to GND and the
    ///   driver will only write.
    ///
    /// # Errors
    /// - `LcdError::InvalidConfiguration` if there are not exactly 4 or 8 data lines, or any line is
    ///   used twice.
    pub fn new(
        data_lines: &[usize],
        enable_line: usize,
        rs_line: usize,
        rw_line: Option<usize>,
    ) -> LcdResult<Self> {
        let width = match data_lines.len() {
            4 => BusWidth::Four,
            8 => BusWidth::Eight,
            n => {
                return Err(LcdError::InvalidConfiguration(format!(
                    "expected 4 or 8 data lines, got {}",
                    n
                )));
            }
        };

        let mut seen = HashSet::new();
        let all_lines = data_lines
            .iter()
            .copied()
            .chain([enable_line, rs_line])
            .chain(rw_line);
        for line in all_lines {
            if !seen.insert(line) {
                return Err(LcdError::InvalidConfiguration(format!(
                    "GPIO line {} is assigned more than once",
                    line
                )));
            }
        }

        Ok(BusConfig {
            data_lines: data_lines.to_vec(),
            enable_line,
            rs_line,
            rw_line,
            width,
        })
    }

    pub fn data_lines(&self) -> &[usize] {
        &self.data_lines
    }

    pub fn enable_line(&self) -> usize {
        self.enable_line
    }

    pub fn rs_line(&self) -> usize {
        self.rs_line
    }

    pub fn rw_line(&self) -> Option<usize> {
        self.rw_line
    }

    pub fn width(&self) -> BusWidth {
        self.width
    }

    /// Whether the R/W line is wired, i.e. whether the bus can be turned around for reading.
    pub fn rw_connected(&self) -> bool {
        self.rw_line.is_some()
    }
}

/// Everything the driver needs to know about the display.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LcdConfig {
    pub bus: BusConfig,
    pub rows: usize,
    pub columns: usize,
    pub font: Font,
    /// Cursor shown after `init`.
    pub cursor: bool,
    /// Cursor blinking after `init`.
    pub blink: bool,
}

impl LcdConfig {
    pub fn new(bus: BusConfig, rows: usize, columns: usize) -> Self {
        LcdConfig {
            bus,
            rows,
            columns,
            font: Font::default(),
            cursor: false,
            blink: false,
        }
    }

    pub fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    pub fn with_cursor(mut self, cursor: bool, blink: bool) -> Self {
        self.cursor = cursor;
        self.blink = blink;
        self
    }

    /// Checks the geometry against the 80 cells of DDRAM.
    pub fn validate(&self) -> LcdResult<()> {
        if !(1..=4).contains(&self.rows) {
            return Err(LcdError::InvalidConfiguration(format!(
                "expected 1 to 4 rows, got {}",
                self.rows
            )));
        }
        let max_columns = if self.rows > 2 { 20 } else { 40 };
        if !(1..=max_columns).contains(&self.columns) {
            return Err(LcdError::InvalidConfiguration(format!(
                "expected 1 to {} columns for {} rows, got {}",
                max_columns, self.rows, self.columns
            )));
        }
        if self.font == Font::Font5x10 && self.rows > 1 {
            return Err(LcdError::InvalidConfiguration(
                "the 5x10 font is only available on single-line displays".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_follows_data_line_count() {
        let four = BusConfig::new(&[10, 11, 12, 13], 14, 15, None).unwrap();
        assert_eq!(four.width(), BusWidth::Four);
        assert!(!four.rw_connected());

        let eight = BusConfig::new(&[0, 1, 2, 3, 4, 5, 6, 7], 8, 9, Some(10)).unwrap();
        assert_eq!(eight.width(), BusWidth::Eight);
        assert!(eight.rw_connected());
    }

    #[test]
    fn rejects_odd_data_line_counts() {
        for lines in [&[][..], &[1, 2, 3][..], &[1, 2, 3, 4, 5][..], &[1, 2, 3, 4, 5, 6, 7, 8, 9][..]] {
            assert!(matches!(
                BusConfig::new(lines, 20, 21, None),
                Err(LcdError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn rejects_shared_lines() {
        assert!(BusConfig::new(&[1, 2, 3, 3], 4, 5, None).is_err());
        assert!(BusConfig::new(&[1, 2, 3, 4], 4, 5, None).is_err());
        assert!(BusConfig::new(&[1, 2, 3, 4], 5, 5, None).is_err());
        assert!(BusConfig::new(&[1, 2, 3, 4], 5, 6, Some(1)).is_err());
    }

    #[test]
    fn validates_geometry() {
        let bus = BusConfig::new(&[1, 2, 3, 4], 5, 6, None).unwrap();
        assert!(LcdConfig::new(bus.clone(), 2, 16).validate().is_ok());
        assert!(LcdConfig::new(bus.clone(), 4, 20).validate().is_ok());
        assert!(LcdConfig::new(bus.clone(), 2, 40).validate().is_ok());
        assert!(LcdConfig::new(bus.clone(), 0, 16).validate().is_err());
        assert!(LcdConfig::new(bus.clone(), 5, 16).validate().is_err());
        assert!(LcdConfig::new(bus.clone(), 4, 21).validate().is_err());
        assert!(LcdConfig::new(bus.clone(), 2, 0).validate().is_err());
        assert!(LcdConfig::new(bus.clone(), 1, 16).with_font(Font::Font5x10).validate().is_ok());
        assert!(LcdConfig::new(bus, 2, 16).with_font(Font::Font5x10).validate().is_err());
    }
}
