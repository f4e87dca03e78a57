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

//! Common errors and macros.

use std::error::Error;
use std::{io, result, str};

/// Parquet error enumeration.
///
/// Every failure of the crypto layer and the file reader/writer surfaces as one
/// of these variants; nothing is retried or downgraded internally.
#[derive(Debug)]
pub enum ParquetError {
    /// General error.
    /// Returned when code violates normal workflow of working with encrypted files.
    General(String),
    /// Returned when IO related failures occur, e.g. when there are not enough bytes to
    /// decode.
    EOF(String),
    /// The file trailer is damaged: bad magic bytes, a length that overflows the
    /// file, or a truncated read.
    CorruptFooter(String),
    /// The file is encrypted but no decryption properties were supplied.
    NoDecryptionProperties,
    /// A footer or column key could not be obtained by any configured route.
    /// Carries the column path when the failure is column-specific.
    KeyUnavailable(Option<String>),
    /// A key was supplied whose length is not 16, 24 or 32 bytes.
    KeyLengthInvalid(usize),
    /// A cipher instance was invoked with a key of a different length than it
    /// was constructed for.
    KeyLengthMismatch {
        /// Length the cipher was constructed for
        expected: usize,
        /// Length of the key passed to the call
        actual: usize,
    },
    /// GCM tag verification failed or an encrypted buffer is malformed.
    AeadFailure(String),
    /// The AAD prefix stored in the file differs from the caller-supplied one.
    AadPrefixMismatch,
    /// The file requires the reader to supply the AAD prefix, but none was given.
    AadPrefixMissing,
    /// The nonce-and-tag trailer of a plaintext footer did not verify.
    FooterSignatureInvalid,
    /// A builder invariant was violated.
    Config(String),
    /// The metadata parser failed on a (possibly decrypted) buffer.
    MetadataParse(String),
    /// An external error variant
    External(Box<dyn Error + Send + Sync>),
}

impl std::fmt::Display for ParquetError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self {
            ParquetError::General(message) => {
                write!(fmt, "Parquet error: {message}")
            }
            ParquetError::EOF(message) => write!(fmt, "EOF: {message}"),
            ParquetError::CorruptFooter(message) => {
                write!(fmt, "Corrupt footer: {message}")
            }
            ParquetError::NoDecryptionProperties => {
                write!(
                    fmt,
                    "Parquet error: file is encrypted but no decryption properties were provided"
                )
            }
            ParquetError::KeyUnavailable(path) => match path {
                Some(path) => write!(fmt, "Key unavailable for column '{path}'"),
                None => write!(fmt, "Footer key unavailable"),
            },
            ParquetError::KeyLengthInvalid(len) => {
                write!(fmt, "Invalid key length {len}, must be 16, 24 or 32 bytes")
            }
            ParquetError::KeyLengthMismatch { expected, actual } => {
                write!(
                    fmt,
                    "Wrong key length {actual}, cipher was created for {expected} byte keys"
                )
            }
            ParquetError::AeadFailure(message) => {
                write!(fmt, "AEAD failure: {message}")
            }
            ParquetError::AadPrefixMismatch => {
                write!(
                    fmt,
                    "AAD prefix in file and in decryption properties is not the same"
                )
            }
            ParquetError::AadPrefixMissing => {
                write!(
                    fmt,
                    "AAD prefix used for file encryption, but not stored in file and \
                     not supplied in decryption properties"
                )
            }
            ParquetError::FooterSignatureInvalid => {
                write!(fmt, "Plaintext footer signature verification failed")
            }
            ParquetError::Config(message) => write!(fmt, "Configuration error: {message}"),
            ParquetError::MetadataParse(message) => {
                write!(fmt, "Metadata parse error: {message}")
            }
            ParquetError::External(e) => write!(fmt, "External: {e}"),
        }
    }
}

impl Error for ParquetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ParquetError::External(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for ParquetError {
    fn from(e: io::Error) -> ParquetError {
        ParquetError::External(Box::new(e))
    }
}

impl From<str::Utf8Error> for ParquetError {
    fn from(e: str::Utf8Error) -> ParquetError {
        ParquetError::External(Box::new(e))
    }
}

/// A specialized `Result` for errors of this crate.
pub type Result<T, E = ParquetError> = result::Result<T, E>;

// ----------------------------------------------------------------------
// Conversion from `ParquetError` to other types of `Error`s

impl From<ParquetError> for io::Error {
    fn from(e: ParquetError) -> Self {
        io::Error::new(io::ErrorKind::Other, e)
    }
}

// ----------------------------------------------------------------------
// Convenient macros for different errors

macro_rules! general_err {
    ($fmt:expr) => (ParquetError::General($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (ParquetError::General(format!($fmt, $($args),*)));
}

macro_rules! eof_err {
    ($fmt:expr) => (ParquetError::EOF($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (ParquetError::EOF(format!($fmt, $($args),*)));
}

macro_rules! corrupt_footer_err {
    ($fmt:expr) => (ParquetError::CorruptFooter($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (ParquetError::CorruptFooter(format!($fmt, $($args),*)));
}

macro_rules! config_err {
    ($fmt:expr) => (ParquetError::Config($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (ParquetError::Config(format!($fmt, $($args),*)));
}

macro_rules! aead_err {
    ($fmt:expr) => (ParquetError::AeadFailure($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (ParquetError::AeadFailure(format!($fmt, $($args),*)));
}

macro_rules! meta_err {
    ($fmt:expr) => (ParquetError::MetadataParse($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (ParquetError::MetadataParse(format!($fmt, $($args),*)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            ParquetError::KeyLengthInvalid(15).to_string(),
            "Invalid key length 15, must be 16, 24 or 32 bytes"
        );
        assert_eq!(
            ParquetError::KeyUnavailable(Some("double_field".to_owned())).to_string(),
            "Key unavailable for column 'double_field'"
        );
        assert_eq!(
            general_err!("unexpected {}", "thing").to_string(),
            "Parquet error: unexpected thing"
        );
    }
}
