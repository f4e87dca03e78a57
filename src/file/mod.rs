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

//! File-level APIs: metadata model, footer parsing, and the serialized
//! reader and writer.
//!
//! # File layout
//!
//! A file is a sequence of column chunk pages followed by a footer. The
//! trailing 8 bytes are a little-endian `u32` length and a 4-byte magic:
//! [`PARQUET_MAGIC`] for plaintext (or plaintext-footer encrypted) files,
//! [`PARQUET_MAGIC_ENCRYPTED_FOOTER`] for files whose footer is encrypted.
//! The same magic also opens the file.

pub mod footer;
pub mod metadata;
pub mod properties;
pub mod reader;
pub mod serialized_reader;
pub mod writer;

/// Number of bytes of the file trailer: length plus magic.
pub const FOOTER_SIZE: usize = 8;

/// Magic of plaintext and plaintext-footer files.
pub const PARQUET_MAGIC: [u8; 4] = [b'P', b'A', b'R', b'1'];

/// Magic of files with an encrypted footer.
pub const PARQUET_MAGIC_ENCRYPTED_FOOTER: [u8; 4] = [b'P', b'A', b'R', b'E'];
