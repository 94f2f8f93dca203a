// Copyright (C) 2024-2026 The Meridian Project.
//
// mod.rs file belongs to the meridian project and is free
// software distributed under the MIT software license, see the
// accompanying file LICENSE in the main directory of the
// repository or http://www.opensource.org/licenses/mit-license.php
// for more details.
//
// Redistribution and use in source and binary forms with or without
// modifications are permitted.

//! Binary io layer: writer, reader, and the [`Serializable`] trait.

mod binary_writer;
mod memory_reader;
mod serializable;

pub use binary_writer::BinaryWriter;
pub use memory_reader::{IoError, IoResult, MemoryReader};
pub use serializable::{helper, Serializable, SerializableExt};
