// Copyright (C) 2024-2026 The Meridian Project.
//
// binary_writer.rs file belongs to the meridian project and is free
// software distributed under the MIT software license, see the
// accompanying file LICENSE in the main directory of the
// repository or http://www.opensource.org/licenses/mit-license.php
// for more details.
//
// Redistribution and use in source and binary forms with or without
// modifications are permitted.

//! Little-endian binary writer for Meridian wire objects.

/// A binary writer that appends primitive values to an owned byte buffer.
///
/// All multi-byte integers are written little-endian. Variable-length
/// quantities use the compact var-int ladder (`0xFD`/`0xFFFF`/`0xFFFFFFFF`).
#[derive(Debug, Default)]
pub struct BinaryWriter {
    inner: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self { inner: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
        }
    }

    /// Consumes the writer, returning the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.inner
    }

    /// The number of bytes written so far.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn write_bool(&mut self, value: bool) {
        self.inner.push(value as u8);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.inner.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.inner.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.inner.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.inner.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.inner.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.inner.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bytes(&mut self, buffer: &[u8]) {
        self.inner.extend_from_slice(buffer);
    }

    /// Writes a compact variable-length integer.
    pub fn write_var_int(&mut self, value: u64) {
        if value < 0xFD {
            self.inner.push(value as u8);
        } else if value <= 0xFFFF {
            self.inner.push(0xFD);
            self.write_u16(value as u16);
        } else if value <= 0xFFFF_FFFF {
            self.inner.push(0xFE);
            self.write_u32(value as u32);
        } else {
            self.inner.push(0xFF);
            self.write_u64(value);
        }
    }

    /// Writes a length-prefixed byte slice.
    pub fn write_var_bytes(&mut self, buffer: &[u8]) {
        self.write_var_int(buffer.len() as u64);
        self.inner.extend_from_slice(buffer);
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn write_var_string(&mut self, value: &str) {
        self.write_var_bytes(value.as_bytes());
    }
}
