// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! PLAIN encoding of column values.
//!
//! Numeric values are stored little-endian at their natural width; booleans
//! are bit-packed LSB first.

use byteorder::{ByteOrder, LittleEndian};

use crate::basic::Type;
use crate::errors::{ParquetError, Result};

/// Values of one column, used when writing and returned when reading.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnValues {
    /// BOOLEAN column values
    Boolean(Vec<bool>),
    /// INT32 column values
    Int32(Vec<i32>),
    /// INT64 column values
    Int64(Vec<i64>),
    /// FLOAT column values
    Float(Vec<f32>),
    /// DOUBLE column values
    Double(Vec<f64>),
}

impl ColumnValues {
    /// Physical type of the contained values.
    pub fn physical_type(&self) -> Type {
        match self {
            ColumnValues::Boolean(_) => Type::BOOLEAN,
            ColumnValues::Int32(_) => Type::INT32,
            ColumnValues::Int64(_) => Type::INT64,
            ColumnValues::Float(_) => Type::FLOAT,
            ColumnValues::Double(_) => Type::DOUBLE,
        }
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Boolean(v) => v.len(),
            ColumnValues::Int32(v) => v.len(),
            ColumnValues::Int64(v) => v.len(),
            ColumnValues::Float(v) => v.len(),
            ColumnValues::Double(v) => v.len(),
        }
    }

    /// Returns true if there are no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// An empty batch of the given type.
    pub(crate) fn empty(physical_type: Type) -> ColumnValues {
        match physical_type {
            Type::BOOLEAN => ColumnValues::Boolean(Vec::new()),
            Type::INT32 => ColumnValues::Int32(Vec::new()),
            Type::INT64 => ColumnValues::Int64(Vec::new()),
            Type::FLOAT => ColumnValues::Float(Vec::new()),
            Type::DOUBLE => ColumnValues::Double(Vec::new()),
        }
    }

    /// Returns a sub-range of the values, used to split a column into pages.
    pub(crate) fn slice(&self, start: usize, len: usize) -> ColumnValues {
        match self {
            ColumnValues::Boolean(v) => ColumnValues::Boolean(v[start..start + len].to_vec()),
            ColumnValues::Int32(v) => ColumnValues::Int32(v[start..start + len].to_vec()),
            ColumnValues::Int64(v) => ColumnValues::Int64(v[start..start + len].to_vec()),
            ColumnValues::Float(v) => ColumnValues::Float(v[start..start + len].to_vec()),
            ColumnValues::Double(v) => ColumnValues::Double(v[start..start + len].to_vec()),
        }
    }

    /// Appends another batch of the same type, used to assemble a column from
    /// its pages.
    pub(crate) fn extend(&mut self, other: ColumnValues) -> Result<()> {
        match (self, other) {
            (ColumnValues::Boolean(v), ColumnValues::Boolean(o)) => v.extend(o),
            (ColumnValues::Int32(v), ColumnValues::Int32(o)) => v.extend(o),
            (ColumnValues::Int64(v), ColumnValues::Int64(o)) => v.extend(o),
            (ColumnValues::Float(v), ColumnValues::Float(o)) => v.extend(o),
            (ColumnValues::Double(v), ColumnValues::Double(o)) => v.extend(o),
            _ => return Err(general_err!("mismatched value types between pages")),
        }
        Ok(())
    }
}

/// Encodes a batch of values with PLAIN encoding.
pub(crate) fn encode_plain(values: &ColumnValues) -> Vec<u8> {
    match values {
        ColumnValues::Boolean(v) => {
            let mut buf = vec![0u8; v.len().div_ceil(8)];
            for (i, value) in v.iter().enumerate() {
                if *value {
                    buf[i / 8] |= 1 << (i % 8);
                }
            }
            buf
        }
        ColumnValues::Int32(v) => {
            let mut buf = vec![0u8; v.len() * 4];
            LittleEndian::write_i32_into(v, &mut buf);
            buf
        }
        ColumnValues::Int64(v) => {
            let mut buf = vec![0u8; v.len() * 8];
            LittleEndian::write_i64_into(v, &mut buf);
            buf
        }
        ColumnValues::Float(v) => {
            let mut buf = vec![0u8; v.len() * 4];
            LittleEndian::write_f32_into(v, &mut buf);
            buf
        }
        ColumnValues::Double(v) => {
            let mut buf = vec![0u8; v.len() * 8];
            LittleEndian::write_f64_into(v, &mut buf);
            buf
        }
    }
}

/// Decodes `num_values` PLAIN-encoded values of the given type.
pub(crate) fn decode_plain(physical_type: Type, buf: &[u8], num_values: usize) -> Result<ColumnValues> {
    let check_len = |width: usize| -> Result<()> {
        if buf.len() < num_values * width {
            return Err(eof_err!(
                "page too short: {} bytes for {} values",
                buf.len(),
                num_values
            ));
        }
        Ok(())
    };
    match physical_type {
        Type::BOOLEAN => {
            if buf.len() < num_values.div_ceil(8) {
                return Err(eof_err!(
                    "page too short: {} bytes for {} boolean values",
                    buf.len(),
                    num_values
                ));
            }
            let values = (0..num_values)
                .map(|i| buf[i / 8] & (1 << (i % 8)) != 0)
                .collect();
            Ok(ColumnValues::Boolean(values))
        }
        Type::INT32 => {
            check_len(4)?;
            let mut values = vec![0i32; num_values];
            LittleEndian::read_i32_into(&buf[..num_values * 4], &mut values);
            Ok(ColumnValues::Int32(values))
        }
        Type::INT64 => {
            check_len(8)?;
            let mut values = vec![0i64; num_values];
            LittleEndian::read_i64_into(&buf[..num_values * 8], &mut values);
            Ok(ColumnValues::Int64(values))
        }
        Type::FLOAT => {
            check_len(4)?;
            let mut values = vec![0f32; num_values];
            LittleEndian::read_f32_into(&buf[..num_values * 4], &mut values);
            Ok(ColumnValues::Float(values))
        }
        Type::DOUBLE => {
            check_len(8)?;
            let mut values = vec![0f64; num_values];
            LittleEndian::read_f64_into(&buf[..num_values * 8], &mut values);
            Ok(ColumnValues::Double(values))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_bit_packing() {
        let values = ColumnValues::Boolean(vec![true, false, true, true, false, false, true, false, true]);
        let buf = encode_plain(&values);
        assert_eq!(buf.len(), 2);
        assert_eq!(buf[0], 0b0100_1101);
        assert_eq!(buf[1], 0b0000_0001);
        assert_eq!(decode_plain(Type::BOOLEAN, &buf, 9).unwrap(), values);
    }

    #[test]
    fn test_numeric_round_trip() {
        let cases = [
            ColumnValues::Int32(vec![i32::MIN, -1, 0, 1, i32::MAX]),
            ColumnValues::Int64(vec![i64::MIN, -1, 0, 1, i64::MAX]),
            ColumnValues::Float(vec![0.0, -1.5, 3.25, f32::MAX]),
            ColumnValues::Double(vec![0.0, -1.5, 3.25, f64::MAX]),
        ];
        for values in cases {
            let buf = encode_plain(&values);
            assert_eq!(
                decode_plain(values.physical_type(), &buf, values.len()).unwrap(),
                values
            );
        }
    }

    #[test]
    fn test_decode_short_buffer() {
        let buf = encode_plain(&ColumnValues::Int32(vec![1, 2]));
        assert!(decode_plain(Type::INT32, &buf, 3).is_err());
    }
}
