// Copyright (C) 2024-2026 The Meridian Project.
//
// timestamp.rs file belongs to the meridian project and is free
// software distributed under the MIT software license, see the
// accompanying file LICENSE in the main directory of the
// repository or http://www.opensource.org/licenses/mit-license.php
// for more details.
//
// Redistribution and use in source and binary forms with or without
// modifications are permitted.

//! Wall-clock instants with nanosecond resolution.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::io::{BinaryWriter, IoResult, MemoryReader, Serializable};
use crate::Error;

pub const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// An instant in time since the unix epoch, `seconds` plus `nanos`.
///
/// Invariant: `nanos < NANOS_PER_SECOND`. Renders as `"seconds.nanos"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    pub seconds: u64,
    pub nanos: u32,
}

impl Timestamp {
    pub const fn new(seconds: u64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);

        Self {
            seconds: since_epoch.as_secs(),
            nanos: since_epoch.subsec_nanos(),
        }
    }

    /// This instant moved `nanos` nanoseconds forward, carrying into seconds.
    pub fn plus_nanos(self, nanos: u64) -> Self {
        let total = self.nanos as u64 + nanos;
        Self {
            seconds: self.seconds + total / NANOS_PER_SECOND as u64,
            nanos: (total % NANOS_PER_SECOND as u64) as u32,
        }
    }

    /// This instant moved `duration` backward, saturating at the epoch.
    pub fn minus(self, duration: Duration) -> Self {
        let this = Duration::new(self.seconds, self.nanos);
        let moved = this.saturating_sub(duration);
        Self {
            seconds: moved.as_secs(),
            nanos: moved.subsec_nanos(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

impl FromStr for Timestamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (seconds, nanos) = s
            .split_once('.')
            .ok_or_else(|| Error::Validation(format!("invalid timestamp `{s}`")))?;

        let seconds = seconds
            .parse::<u64>()
            .map_err(|_| Error::Validation(format!("invalid timestamp `{s}`")))?;
        let nanos = nanos
            .parse::<u32>()
            .map_err(|_| Error::Validation(format!("invalid timestamp `{s}`")))?;

        if nanos >= NANOS_PER_SECOND {
            return Err(Error::Validation(format!("invalid timestamp `{s}`")));
        }

        Ok(Self { seconds, nanos })
    }
}

impl Serializable for Timestamp {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u64(self.seconds);
        writer.write_u32(self.nanos);
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        let seconds = reader.read_u64()?;
        let nanos = reader.read_u32()?;
        if nanos >= NANOS_PER_SECOND {
            return Err(crate::io::IoError::InvalidData(format!(
                "timestamp nanos {nanos} out of range"
            )));
        }
        Ok(Self { seconds, nanos })
    }
}
