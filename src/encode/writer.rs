use crate::header::Endian;
use crate::num;

/// Output buffer with cached indentation strings.
pub(crate) struct Writer {
    buffer: Vec<u8>,
    indent_unit: String,
    indent_cache: Vec<String>,
}

impl Writer {
    pub fn new(indent: usize) -> Self {
        Self::with_capacity(indent, 0)
    }

    pub fn with_capacity(indent: usize, capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            indent_unit: " ".repeat(indent),
            indent_cache: vec![String::new()],
        }
    }

    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn write_str(&mut self, s: &str) {
        self.buffer.extend_from_slice(s.as_bytes());
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.buffer.push(byte);
    }

    pub fn write_newline(&mut self) {
        self.buffer.push(b'\n');
    }

    pub fn write_indent(&mut self, depth: usize) {
        if depth == 0 || self.indent_unit.is_empty() {
            return;
        }
        if depth >= self.indent_cache.len() {
            self.extend_indent_cache(depth);
        }
        self.buffer
            .extend_from_slice(self.indent_cache[depth].as_bytes());
    }

    /// Text between the quotes is written as stored, escapes included.
    pub fn write_quoted(&mut self, text: &str) {
        self.buffer.push(b'"');
        self.buffer.extend_from_slice(text.as_bytes());
        self.buffer.push(b'"');
    }

    pub fn write_f64(&mut self, value: f64) {
        num::write_f64(&mut self.buffer, value);
    }

    pub fn write_i64(&mut self, value: i64) {
        num::write_i64(&mut self.buffer, value);
    }

    pub fn write_usize(&mut self, value: usize) {
        num::write_usize(&mut self.buffer, value);
    }

    /// Whole exponents print without a fraction, as in `[0 2 -1 0 0 0 0]`.
    pub fn write_exponent(&mut self, value: f64) {
        if value.fract() == 0.0 && value.abs() < 1e15 {
            self.write_i64(value as i64);
        } else {
            self.write_f64(value);
        }
    }

    pub fn write_raw_f64(&mut self, value: f64, width: usize, endian: Endian) {
        match (width, endian) {
            (4, Endian::Little) => self.write_bytes(&(value as f32).to_le_bytes()),
            (4, Endian::Big) => self.write_bytes(&(value as f32).to_be_bytes()),
            (_, Endian::Little) => self.write_bytes(&value.to_le_bytes()),
            (_, Endian::Big) => self.write_bytes(&value.to_be_bytes()),
        }
    }

    /// Callers check that `value` fits in `width` bytes.
    pub fn write_raw_i64(&mut self, value: i64, width: usize, endian: Endian) {
        match (width, endian) {
            (4, Endian::Little) => self.write_bytes(&(value as i32).to_le_bytes()),
            (4, Endian::Big) => self.write_bytes(&(value as i32).to_be_bytes()),
            (_, Endian::Little) => self.write_bytes(&value.to_le_bytes()),
            (_, Endian::Big) => self.write_bytes(&value.to_be_bytes()),
        }
    }

    fn extend_indent_cache(&mut self, depth: usize) {
        while self.indent_cache.len() <= depth {
            let next = match self.indent_cache.last() {
                Some(prev) => {
                    let mut s = String::with_capacity(prev.len() + self.indent_unit.len());
                    s.push_str(prev);
                    s.push_str(&self.indent_unit);
                    s
                }
                None => String::new(),
            };
            self.indent_cache.push(next);
        }
    }
}
