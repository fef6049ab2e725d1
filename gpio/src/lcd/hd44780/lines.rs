//! Line-oriented text on top of the character writes.

use super::driver::encode_char;
use super::instruction;
use super::timing::{LINE_PAUSE_MS, TYPING_MS};
use super::{GpioHD44780Driver, HD44780Driver};
use crate::lcd::LcdResult;
use crate::PinController;
use embedded_hal::delay::DelayNs;
use std::fmt::Debug;

/// In-memory copy of the text shown on every row.
///
/// Rows are always exactly `columns` characters long, padded with spaces.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DisplayBuffer {
    columns: usize,
    lines: Vec<String>,
}

impl DisplayBuffer {
    pub fn new(rows: usize, columns: usize) -> Self {
        DisplayBuffer {
            columns,
            lines: vec![" ".repeat(columns); rows],
        }
    }

    /// Truncates or pads `text` to the row width.
    pub fn fit(&self, text: &str) -> String {
        let mut fitted: String = text.chars().take(self.columns).collect();
        let len = fitted.chars().count();
        fitted.extend(std::iter::repeat_n(' ', self.columns - len));
        fitted
    }

    /// Replaces a row. Returns `None` if the row doesn't exist.
    pub fn set_line(&mut self, row: usize, text: &str) -> Option<&str> {
        let fitted = self.fit(text);
        let line = self.lines.get_mut(row)?;
        *line = fitted;
        Some(line)
    }

    /// Drops the first row, moves every other row up by one and appends `text` as the last row.
    pub fn push_line(&mut self, text: &str) {
        if self.lines.is_empty() {
            return;
        }
        let fitted = self.fit(text);
        self.lines.remove(0);
        self.lines.push(fitted);
    }

    pub fn clear(&mut self) {
        let blank = " ".repeat(self.columns);
        for line in &mut self.lines {
            line.clone_from(&blank);
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, row: usize) -> Option<&str> {
        self.lines.get(row).map(String::as_str)
    }
}

impl<P: PinController, D: DelayNs + Debug> GpioHD44780Driver<P, D> {
    /// Writes `text` over the whole of `row`, truncated or padded with spaces to the row width.
    ///
    /// With `effect`, the characters of `text` appear one by one as if typed. The pacing happens
    /// between complete transfers and doesn't change the bus timing.
    ///
    /// The mirror holds what the controller was sent, so characters written as `?` read back as `?`.
    pub fn put_line(&mut self, row: usize, text: &str, effect: bool) -> LcdResult<()> {
        self.ensure_ready()?;
        self.check_row(row)?;

        let typed = text.chars().count().min(self.columns());
        let encoded: Vec<u8> = self.buffer.fit(text).chars().map(encode_char).collect();
        let shown: String = encoded.iter().map(|&b| b as char).collect();
        self.buffer.set_line(row, &shown);

        self.set_ddram_address(instruction::row_address(row, self.columns()))?;
        for (i, &b) in encoded.iter().enumerate() {
            self.send_data(b)?;
            if effect && i < typed {
                self.pace(TYPING_MS);
            }
        }
        Ok(())
    }

    /// Blanks `row`.
    pub fn clear_line(&mut self, row: usize) -> LcdResult<()> {
        self.put_line(row, "", false)
    }

    /// Scrolls every row up by one, dropping the first, and writes `text` to the freed last row.
    pub fn push_line(&mut self, text: &str) -> LcdResult<()> {
        self.push_line_paced(text, false)
    }

    /// [Self::push_line] with the typing effect on the new row and a short pause after it.
    pub fn push_line_animated(&mut self, text: &str) -> LcdResult<()> {
        self.push_line_paced(text, true)?;
        self.pace(LINE_PAUSE_MS);
        Ok(())
    }

    fn push_line_paced(&mut self, text: &str, effect: bool) -> LcdResult<()> {
        self.ensure_ready()?;

        self.buffer.push_line(text);
        let lines = self.buffer.lines().to_vec();
        let last = lines.len() - 1;
        for (row, line) in lines[..last].iter().enumerate() {
            self.put_line(row, line, false)?;
        }
        self.put_line(last, text, effect)
    }

    /// The text currently shown on every row, as written by this driver.
    pub fn lines(&self) -> &[String] {
        self.buffer.lines()
    }

    pub fn line(&self, row: usize) -> Option<&str> {
        self.buffer.line(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_truncates_and_pads() {
        let buffer = DisplayBuffer::new(2, 4);
        assert_eq!(buffer.fit(""), "    ");
        assert_eq!(buffer.fit("ab"), "ab  ");
        assert_eq!(buffer.fit("abcd"), "abcd");
        assert_eq!(buffer.fit("abcdef"), "abcd");
        assert_eq!(buffer.fit("żółw!"), "żółw");
    }

    #[test]
    fn set_line_replaces_whole_row() {
        let mut buffer = DisplayBuffer::new(2, 5);
        buffer.set_line(1, "hello");
        buffer.set_line(1, "hi");
        assert_eq!(buffer.line(1), Some("hi   "));
        assert_eq!(buffer.line(0), Some("     "));
        assert_eq!(buffer.set_line(2, "nope"), None);
    }

    #[test]
    fn push_line_scrolls_rows_up() {
        let mut buffer = DisplayBuffer::new(3, 3);
        buffer.set_line(0, "a");
        buffer.set_line(1, "b");
        buffer.set_line(2, "c");
        buffer.push_line("dddd");
        assert_eq!(buffer.lines(), ["b  ", "c  ", "ddd"]);
    }

    #[test]
    fn push_line_on_single_row_replaces_it() {
        let mut buffer = DisplayBuffer::new(1, 3);
        buffer.set_line(0, "a");
        buffer.push_line("b");
        assert_eq!(buffer.lines(), ["b  "]);
    }

    #[test]
    fn clear_blanks_every_row() {
        let mut buffer = DisplayBuffer::new(2, 2);
        buffer.set_line(0, "ab");
        buffer.push_line("cd");
        buffer.clear();
        assert_eq!(buffer.lines(), ["  ", "  "]);
    }
}
