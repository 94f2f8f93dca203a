// Copyright (C) 2024-2026 The Meridian Project.
//
// memory_reader.rs file belongs to the meridian project and is free
// software distributed under the MIT software license, see the
// accompanying file LICENSE in the main directory of the
// repository or http://www.opensource.org/licenses/mit-license.php
// for more details.
//
// Redistribution and use in source and binary forms with or without
// modifications are permitted.

//! Bounds-checked reader over an in-memory byte slice.

use std::mem::size_of;

use byteorder::{ByteOrder, LittleEndian};

/// Errors produced while decoding wire bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IoError {
    /// The input ended before the requested value could be read.
    #[error("unexpected end of data at position {position}")]
    UnexpectedEof { position: usize },
    /// The bytes decoded to a structurally invalid value.
    #[error("invalid data: {0}")]
    InvalidData(String),
    /// A length prefix exceeded the caller-supplied maximum.
    #[error("length {length} exceeds maximum {max}")]
    LengthExceeded { length: u64, max: u64 },
}

pub type IoResult<T> = Result<T, IoError>;

/// Sequential reader over a borrowed byte slice.
///
/// Every read is bounds-checked; running past the end yields
/// [`IoError::UnexpectedEof`] rather than panicking.
pub struct MemoryReader<'a> {
    memory: &'a [u8],
    pos: usize,
}

impl<'a> MemoryReader<'a> {
    pub fn new(memory: &'a [u8]) -> Self {
        Self { memory, pos: 0 }
    }

    #[inline(always)]
    fn ensure_position(&self, move_by: usize) -> IoResult<()> {
        if self.pos + move_by > self.memory.len() {
            Err(IoError::UnexpectedEof { position: self.pos })
        } else {
            Ok(())
        }
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes remaining past the current position.
    pub fn remaining(&self) -> usize {
        self.memory.len() - self.pos
    }

    pub fn read_bool(&mut self) -> IoResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(IoError::InvalidData(format!(
                "invalid boolean value {other}"
            ))),
        }
    }

    #[inline(always)]
    pub fn read_u8(&mut self) -> IoResult<u8> {
        self.ensure_position(1)?;
        let value = self.memory[self.pos];
        self.pos += 1;
        Ok(value)
    }

    #[inline(always)]
    pub fn read_u16(&mut self) -> IoResult<u16> {
        self.ensure_position(size_of::<u16>())?;
        let value = LittleEndian::read_u16(&self.memory[self.pos..]);
        self.pos += size_of::<u16>();
        Ok(value)
    }

    #[inline(always)]
    pub fn read_u32(&mut self) -> IoResult<u32> {
        self.ensure_position(size_of::<u32>())?;
        let value = LittleEndian::read_u32(&self.memory[self.pos..]);
        self.pos += size_of::<u32>();
        Ok(value)
    }

    #[inline(always)]
    pub fn read_i32(&mut self) -> IoResult<i32> {
        self.ensure_position(size_of::<i32>())?;
        let value = LittleEndian::read_i32(&self.memory[self.pos..]);
        self.pos += size_of::<i32>();
        Ok(value)
    }

    #[inline(always)]
    pub fn read_u64(&mut self) -> IoResult<u64> {
        self.ensure_position(size_of::<u64>())?;
        let value = LittleEndian::read_u64(&self.memory[self.pos..]);
        self.pos += size_of::<u64>();
        Ok(value)
    }

    #[inline(always)]
    pub fn read_i64(&mut self) -> IoResult<i64> {
        self.ensure_position(size_of::<i64>())?;
        let value = LittleEndian::read_i64(&self.memory[self.pos..]);
        self.pos += size_of::<i64>();
        Ok(value)
    }

    pub fn read_bytes(&mut self, count: usize) -> IoResult<&'a [u8]> {
        self.ensure_position(count)?;
        let value = &self.memory[self.pos..self.pos + count];
        self.pos += count;
        Ok(value)
    }

    /// Reads a compact variable-length integer, rejecting values above `max`.
    pub fn read_var_int(&mut self, max: u64) -> IoResult<u64> {
        let prefix = self.read_u8()?;
        let value = match prefix {
            0xFD => self.read_u16()? as u64,
            0xFE => self.read_u32()? as u64,
            0xFF => self.read_u64()?,
            byte => byte as u64,
        };

        if value > max {
            return Err(IoError::LengthExceeded { length: value, max });
        }

        Ok(value)
    }

    /// Reads a length-prefixed byte slice of at most `max` bytes.
    pub fn read_var_bytes(&mut self, max: usize) -> IoResult<&'a [u8]> {
        let length = self.read_var_int(max as u64)? as usize;
        self.read_bytes(length)
    }

    /// Reads a length-prefixed UTF-8 string of at most `max` bytes.
    pub fn read_var_string(&mut self, max: usize) -> IoResult<String> {
        let bytes = self.read_var_bytes(max)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| IoError::InvalidData(format!("invalid utf-8 string: {e}")))
    }
}
