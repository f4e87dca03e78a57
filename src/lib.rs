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

//! Parquet-style modular encryption over a minimal columnar file format.
//!
//! Files are encrypted module by module — footer, column metadata, page
//! headers, page bodies — so that unencrypted columns stay directly readable
//! and encrypted columns are selectively readable by holders of the right
//! keys. Each module is an AEAD blob authenticated against a deterministic
//! per-module AAD derived from the file AAD and the module's position.
//!
//! The building blocks:
//!
//! * [`encryption::encrypt`] / [`encryption::decrypt`] — declarative
//!   encryption and decryption properties, key retrieval, and the per-file
//!   encryptor/decryptor factories.
//! * [`encryption::ciphers`] — AES-GCM and AES-CTR primitives with the
//!   on-disk framing.
//! * [`encryption::modules`] — module AAD construction.
//! * [`file::writer`] / [`file::serialized_reader`] — a small columnar
//!   writer and reader exercising the crypto layer end to end, including
//!   both the encrypted-footer and the signed plaintext-footer layouts.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use parquet_encryption::basic::Type;
//! use parquet_encryption::encodings::ColumnValues;
//! use parquet_encryption::encryption::decrypt::FileDecryptionProperties;
//! use parquet_encryption::encryption::encrypt::FileEncryptionProperties;
//! use parquet_encryption::file::properties::WriterProperties;
//! use parquet_encryption::file::serialized_reader::SerializedFileReader;
//! use parquet_encryption::file::writer::SerializedFileWriter;
//! use parquet_encryption::schema::types::{ColumnDescriptor, SchemaDescriptor};
//!
//! let key = b"0123456789012345".to_vec();
//! let schema = SchemaDescriptor::new(vec![
//!     ColumnDescriptor::new("int32_field", Type::INT32),
//! ])?;
//!
//! // write a uniformly encrypted file into memory
//! let encryption = FileEncryptionProperties::builder(key.clone()).build()?;
//! let properties = WriterProperties::builder()
//!     .with_file_encryption_properties(encryption)
//!     .build();
//! let mut out = Vec::new();
//! let mut writer = SerializedFileWriter::new(&mut out, schema, properties)?;
//! let mut row_group = writer.next_row_group()?;
//! row_group.append_column(&ColumnValues::Int32((0..100).collect()))?;
//! row_group.close()?;
//! writer.close()?;
//!
//! // read it back
//! let decryption = FileDecryptionProperties::builder()
//!     .with_footer_key(key)
//!     .build()?;
//! let reader =
//!     SerializedFileReader::new_with_decryption_properties(Bytes::from(out), decryption)?;
//! let values = reader.get_row_group(0)?.read_column(0)?;
//! assert_eq!(values, ColumnValues::Int32((0..100).collect()));
//! # Ok::<(), parquet_encryption::errors::ParquetError>(())
//! ```

#![warn(missing_docs)]

#[macro_use]
pub mod errors;
pub mod basic;
pub mod encodings;
pub mod encryption;
pub mod file;
pub mod schema;
pub(crate) mod thrift;
