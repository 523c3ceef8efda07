//! Line splitter for TTY containers, whose output is not framed.

#[derive(Debug)]
pub struct RawLineDecoder {
    line: Vec<u8>,
    add_carriage_return: bool,
}

impl Default for RawLineDecoder {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RawLineDecoder {
    pub fn new(add_carriage_return: bool) -> Self {
        Self {
            line: Vec::new(),
            add_carriage_return,
        }
    }

    /// Appends bytes and returns the lines they complete.
    pub fn append(&mut self, data: &[u8]) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();

        for &byte in data {
            if byte == b'\n' {
                if self.add_carriage_return {
                    self.line.push(b'\r');
                }
                self.line.push(byte);
                lines.push(std::mem::take(&mut self.line));
            } else {
                self.line.push(byte);
            }
        }

        lines
    }

    /// Returns the trailing partial line, if any.
    pub fn flush(&mut self) -> Vec<Vec<u8>> {
        if self.line.is_empty() {
            return Vec::new();
        }
        vec![std::mem::take(&mut self.line)]
    }
}
