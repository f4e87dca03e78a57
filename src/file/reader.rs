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

//! Random-access byte sources for file reading.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use bytes::Bytes;

use crate::errors::{ParquetError, Result};

/// Length of an in-memory or on-disk byte source.
pub trait Length {
    /// Returns the amount of available bytes.
    fn len(&self) -> u64;
}

/// A random-access byte source the file reader pulls ranges from.
///
/// Blocking I/O happens inside implementations; the reader itself never
/// suspends.
pub trait ChunkReader: Length + Send + Sync {
    /// Reads `length` bytes starting at `start`, failing on short reads.
    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes>;
}

impl Length for File {
    fn len(&self) -> u64 {
        self.metadata().map(|m| m.len()).unwrap_or(0)
    }
}

impl ChunkReader for File {
    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes> {
        let mut file = self.try_clone()?;
        file.seek(SeekFrom::Start(start))?;
        let mut buffer = vec![0u8; length];
        file.read_exact(&mut buffer)
            .map_err(|_| eof_err!("failed to read {} bytes at offset {}", length, start))?;
        Ok(buffer.into())
    }
}

impl Length for Bytes {
    fn len(&self) -> u64 {
        self.as_ref().len() as u64
    }
}

impl ChunkReader for Bytes {
    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes> {
        let start = usize::try_from(start)
            .map_err(|_| eof_err!("offset {} out of range", start))?;
        if start > self.as_ref().len() || length > self.as_ref().len() - start {
            return Err(eof_err!(
                "failed to read {} bytes at offset {}",
                length,
                start
            ));
        }
        Ok(self.slice(start..start + length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_chunk_reader() {
        let bytes = Bytes::from_static(b"0123456789");
        assert_eq!(Length::len(&bytes), 10);
        assert_eq!(bytes.get_bytes(2, 3).unwrap().as_ref(), b"234");
        assert!(bytes.get_bytes(8, 3).is_err());
    }
}
