// Copyright (C) 2024-2026 The Meridian Project.
//
// serializable.rs file belongs to the meridian project and is free
// software distributed under the MIT software license, see the
// accompanying file LICENSE in the main directory of the
// repository or http://www.opensource.org/licenses/mit-license.php
// for more details.
//
// Redistribution and use in source and binary forms with or without
// modifications are permitted.

//! Serialization traits for Meridian wire objects.

use crate::io::{BinaryWriter, IoResult, MemoryReader};

/// Represents Meridian objects that can be serialized to wire bytes.
pub trait Serializable {
    /// Serializes the object using the specified writer.
    fn serialize(&self, writer: &mut BinaryWriter);

    /// Deserializes the object using the specified reader.
    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self>
    where
        Self: Sized;
}

/// Extension methods for serializable objects.
pub trait SerializableExt: Serializable {
    /// Converts the object to a byte array.
    fn to_array(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        self.serialize(&mut writer);
        writer.into_bytes()
    }

    /// Creates an object from a byte array, requiring all input consumed.
    fn from_array(data: &[u8]) -> IoResult<Self>
    where
        Self: Sized,
    {
        let mut reader = MemoryReader::new(data);
        let value = Self::deserialize(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(crate::io::IoError::InvalidData(format!(
                "{} trailing bytes after object",
                reader.remaining()
            )));
        }
        Ok(value)
    }
}

impl<T: Serializable> SerializableExt for T {}

/// Helper functions for serializing collections.
pub mod helper {
    use super::Serializable;
    use crate::io::{BinaryWriter, IoResult, MemoryReader};

    /// Serializes a collection of serializable objects.
    pub fn serialize_array<T: Serializable>(items: &[T], writer: &mut BinaryWriter) {
        writer.write_var_int(items.len() as u64);
        for item in items {
            item.serialize(writer);
        }
    }

    /// Deserializes a collection of at most `max` serializable objects.
    pub fn deserialize_array<T: Serializable>(
        reader: &mut MemoryReader,
        max: usize,
    ) -> IoResult<Vec<T>> {
        let count = reader.read_var_int(max as u64)? as usize;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(T::deserialize(reader)?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{BinaryWriter, IoError, IoResult, MemoryReader};

    #[derive(Debug, PartialEq)]
    struct TestStruct {
        value: u32,
    }

    impl Serializable for TestStruct {
        fn serialize(&self, writer: &mut BinaryWriter) {
            writer.write_u32(self.value);
        }

        fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
            Ok(TestStruct {
                value: reader.read_u32()?,
            })
        }
    }

    #[test]
    fn test_serializable_roundtrip() {
        let original = TestStruct { value: 0x12345678 };
        let bytes = original.to_array();
        let deserialized = TestStruct::from_array(&bytes).unwrap();
        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_from_array_rejects_trailing_bytes() {
        let mut bytes = TestStruct { value: 1 }.to_array();
        bytes.push(0);
        assert!(matches!(
            TestStruct::from_array(&bytes),
            Err(IoError::InvalidData(_))
        ));
    }

    #[test]
    fn test_serialize_array_roundtrip() {
        let items = vec![
            TestStruct { value: 1 },
            TestStruct { value: 2 },
            TestStruct { value: 3 },
        ];

        let mut writer = BinaryWriter::new();
        helper::serialize_array(&items, &mut writer);
        let bytes = writer.into_bytes();

        let mut reader = MemoryReader::new(&bytes);
        let decoded: Vec<TestStruct> = helper::deserialize_array(&mut reader, 16).unwrap();
        assert_eq!(decoded, items);
    }

    #[test]
    fn test_deserialize_array_respects_max() {
        let items: Vec<TestStruct> = (0..5).map(|value| TestStruct { value }).collect();
        let mut writer = BinaryWriter::new();
        helper::serialize_array(&items, &mut writer);
        let bytes = writer.into_bytes();

        let mut reader = MemoryReader::new(&bytes);
        let result: IoResult<Vec<TestStruct>> = helper::deserialize_array(&mut reader, 2);
        assert!(result.is_err());
    }
}
