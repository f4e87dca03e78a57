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

//! Rust mappings for the enums of the on-disk format: physical types, page
//! types, encodings and the file-level cipher.

use crate::errors::{ParquetError, Result};

// ----------------------------------------------------------------------
// Physical type of a leaf column

/// Types supported by this crate's columnar format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Type {
    /// A boolean value, bit-packed on disk.
    BOOLEAN,
    /// A 32-bit signed integer, little-endian on disk.
    INT32,
    /// A 64-bit signed integer, little-endian on disk.
    INT64,
    /// A 32-bit IEEE 754 float, little-endian on disk.
    FLOAT,
    /// A 64-bit IEEE 754 double, little-endian on disk.
    DOUBLE,
}

impl Type {
    pub(crate) fn as_i32(&self) -> i32 {
        match self {
            Type::BOOLEAN => 0,
            Type::INT32 => 1,
            Type::INT64 => 2,
            Type::FLOAT => 4,
            Type::DOUBLE => 5,
        }
    }
}

impl TryFrom<i32> for Type {
    type Error = ParquetError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Type::BOOLEAN),
            1 => Ok(Type::INT32),
            2 => Ok(Type::INT64),
            4 => Ok(Type::FLOAT),
            5 => Ok(Type::DOUBLE),
            _ => Err(meta_err!("unexpected physical type {}", value)),
        }
    }
}

// ----------------------------------------------------------------------
// Page types

/// Types of pages within a column chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum PageType {
    /// A page of column values.
    DATA_PAGE,
    /// A page holding the chunk's dictionary. At most one per column chunk,
    /// stored before the data pages.
    DICTIONARY_PAGE,
}

impl PageType {
    pub(crate) fn as_i32(&self) -> i32 {
        match self {
            PageType::DATA_PAGE => 0,
            PageType::DICTIONARY_PAGE => 2,
        }
    }
}

impl TryFrom<i32> for PageType {
    type Error = ParquetError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(PageType::DATA_PAGE),
            2 => Ok(PageType::DICTIONARY_PAGE),
            _ => Err(meta_err!("unexpected page type {}", value)),
        }
    }
}

// ----------------------------------------------------------------------
// Encodings

/// Encoding of values within a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Encoding {
    /// Fixed-width little-endian values; booleans bit-packed LSB first.
    PLAIN,
}

impl Encoding {
    pub(crate) fn as_i32(&self) -> i32 {
        match self {
            Encoding::PLAIN => 0,
        }
    }
}

impl TryFrom<i32> for Encoding {
    type Error = ParquetError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Encoding::PLAIN),
            _ => Err(meta_err!("unexpected encoding {}", value)),
        }
    }
}

// ----------------------------------------------------------------------
// File-level cipher

/// Supported block ciphers for modular encryption.
///
/// With [`Cipher::AES_GCM_CTR_V1`], metadata modules (footer, column metadata,
/// page headers, index structures) are still encrypted with GCM; only page
/// bodies use unauthenticated CTR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Cipher {
    /// AES in Galois/Counter mode for every module.
    #[default]
    AES_GCM_V1,
    /// AES-GCM for metadata modules, AES-CTR for page bodies.
    AES_GCM_CTR_V1,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_i32_round_trip() {
        for t in [
            Type::BOOLEAN,
            Type::INT32,
            Type::INT64,
            Type::FLOAT,
            Type::DOUBLE,
        ] {
            assert_eq!(Type::try_from(t.as_i32()).unwrap(), t);
        }
        assert!(Type::try_from(3).is_err());
    }

    #[test]
    fn test_page_type_i32_round_trip() {
        for t in [PageType::DATA_PAGE, PageType::DICTIONARY_PAGE] {
            assert_eq!(PageType::try_from(t.as_i32()).unwrap(), t);
        }
        assert!(PageType::try_from(1).is_err());
    }

    #[test]
    fn test_default_cipher() {
        assert_eq!(Cipher::default(), Cipher::AES_GCM_V1);
    }
}
