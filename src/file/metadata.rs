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

//! Metadata structures stored in the file, with their compact-protocol
//! serialization, including the crypto metadata of encrypted footers and
//! column chunks.

use std::io::Write;
use std::sync::Arc;

use crate::basic::{Cipher, Encoding, PageType, Type};
use crate::encryption::decrypt::FileDecryptor;
use crate::encryption::modules::{create_module_aad, ModuleType};
use crate::errors::{ParquetError, Result};
use crate::schema::types::ColumnPath;
use crate::thrift::{FieldType, ThriftCompactOutputProtocol, ThriftSliceInputProtocol};

// ----------------------------------------------------------------------
// Encryption algorithm descriptors

/// Parameters of the AES_GCM_V1 algorithm as stored in the file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AesGcmV1 {
    /// AAD prefix, stored only when the writer chose to
    pub aad_prefix: Option<Vec<u8>>,
    /// Unique file identifier part of the AAD suffix
    pub aad_file_unique: Option<Vec<u8>>,
    /// In files encrypted with an AAD prefix without storing it,
    /// readers must supply the prefix
    pub supply_aad_prefix: Option<bool>,
}

/// Parameters of the AES_GCM_CTR_V1 algorithm as stored in the file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AesGcmCtrV1 {
    /// AAD prefix, stored only when the writer chose to
    pub aad_prefix: Option<Vec<u8>>,
    /// Unique file identifier part of the AAD suffix
    pub aad_file_unique: Option<Vec<u8>>,
    /// In files encrypted with an AAD prefix without storing it,
    /// readers must supply the prefix
    pub supply_aad_prefix: Option<bool>,
}

/// Encryption algorithm descriptor: the cipher plus its AAD parameters.
#[derive(Clone, Debug, PartialEq)]
#[allow(non_camel_case_types)]
pub enum EncryptionAlgorithm {
    /// AES-GCM for all modules
    AES_GCM_V1(AesGcmV1),
    /// AES-GCM for metadata modules, AES-CTR for page bodies
    AES_GCM_CTR_V1(AesGcmCtrV1),
}

impl EncryptionAlgorithm {
    /// The cipher this descriptor selects.
    pub fn cipher(&self) -> Cipher {
        match self {
            Self::AES_GCM_V1(_) => Cipher::AES_GCM_V1,
            Self::AES_GCM_CTR_V1(_) => Cipher::AES_GCM_CTR_V1,
        }
    }

    /// The stored AAD prefix, if any.
    pub fn aad_prefix(&self) -> Option<&[u8]> {
        match self {
            Self::AES_GCM_V1(a) => a.aad_prefix.as_deref(),
            Self::AES_GCM_CTR_V1(a) => a.aad_prefix.as_deref(),
        }
    }

    /// The stored unique file identifier.
    pub fn aad_file_unique(&self) -> Option<&[u8]> {
        match self {
            Self::AES_GCM_V1(a) => a.aad_file_unique.as_deref(),
            Self::AES_GCM_CTR_V1(a) => a.aad_file_unique.as_deref(),
        }
    }

    /// Whether the reader must supply the AAD prefix.
    pub fn supply_aad_prefix(&self) -> bool {
        match self {
            Self::AES_GCM_V1(a) => a.supply_aad_prefix.unwrap_or(false),
            Self::AES_GCM_CTR_V1(a) => a.supply_aad_prefix.unwrap_or(false),
        }
    }

    fn write_fields<W: Write>(
        aad_prefix: &Option<Vec<u8>>,
        aad_file_unique: &Option<Vec<u8>>,
        supply_aad_prefix: &Option<bool>,
        prot: &mut ThriftCompactOutputProtocol<W>,
    ) -> Result<()> {
        prot.write_struct_begin()?;
        if let Some(prefix) = aad_prefix {
            prot.write_binary_field(1, prefix)?;
        }
        if let Some(unique) = aad_file_unique {
            prot.write_binary_field(2, unique)?;
        }
        if let Some(supply) = supply_aad_prefix {
            prot.write_bool_field(3, *supply)?;
        }
        prot.write_struct_end()
    }

    fn read_fields(prot: &mut ThriftSliceInputProtocol) -> Result<AesGcmV1> {
        let mut algorithm = AesGcmV1::default();
        let mut last_field_id = 0i16;
        loop {
            let field = prot.read_field_begin(last_field_id)?;
            match field.field_type {
                FieldType::Stop => break,
                _ => match field.id {
                    1 => algorithm.aad_prefix = Some(prot.read_binary()?.to_vec()),
                    2 => algorithm.aad_file_unique = Some(prot.read_binary()?.to_vec()),
                    3 => algorithm.supply_aad_prefix = Some(prot.read_bool(field.field_type)?),
                    _ => prot.skip(field.field_type)?,
                },
            }
            last_field_id = field.id;
        }
        Ok(algorithm)
    }

    pub(crate) fn write<W: Write>(&self, prot: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        prot.write_struct_begin()?;
        match self {
            Self::AES_GCM_V1(a) => {
                prot.write_struct_field_header(1)?;
                Self::write_fields(&a.aad_prefix, &a.aad_file_unique, &a.supply_aad_prefix, prot)?;
            }
            Self::AES_GCM_CTR_V1(a) => {
                prot.write_struct_field_header(2)?;
                Self::write_fields(&a.aad_prefix, &a.aad_file_unique, &a.supply_aad_prefix, prot)?;
            }
        }
        prot.write_struct_end()
    }

    pub(crate) fn read(prot: &mut ThriftSliceInputProtocol) -> Result<Self> {
        let field = prot.read_field_begin(0)?;
        if field.field_type == FieldType::Stop {
            return Err(meta_err!("received empty union for EncryptionAlgorithm"));
        }
        let algorithm = match field.id {
            1 => {
                let a = Self::read_fields(prot)?;
                Self::AES_GCM_V1(a)
            }
            2 => {
                let a = Self::read_fields(prot)?;
                Self::AES_GCM_CTR_V1(AesGcmCtrV1 {
                    aad_prefix: a.aad_prefix,
                    aad_file_unique: a.aad_file_unique,
                    supply_aad_prefix: a.supply_aad_prefix,
                })
            }
            _ => {
                return Err(meta_err!(
                    "unexpected EncryptionAlgorithm variant {}",
                    field.id
                ));
            }
        };
        let field = prot.read_field_begin(field.id)?;
        if field.field_type != FieldType::Stop {
            return Err(meta_err!("received multiple fields for union"));
        }
        Ok(algorithm)
    }
}

// ----------------------------------------------------------------------
// Column crypto metadata

/// Encryption metadata for a column chunk encrypted with a column-specific key.
#[derive(Clone, Debug, PartialEq)]
pub struct EncryptionWithColumnKey {
    /// Path to the column in the schema
    pub path_in_schema: Vec<String>,
    /// Retrieval metadata of the column key
    pub key_metadata: Option<Vec<u8>>,
}

/// Crypto metadata of an encrypted column chunk.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnCryptoMetaData {
    /// The column is encrypted with the footer key
    EncryptionWithFooterKey,
    /// The column is encrypted with a column-specific key
    EncryptionWithColumnKey(EncryptionWithColumnKey),
}

impl ColumnCryptoMetaData {
    pub(crate) fn write<W: Write>(&self, prot: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        prot.write_struct_begin()?;
        match self {
            Self::EncryptionWithFooterKey => {
                prot.write_struct_field_header(1)?;
                prot.write_struct_begin()?;
                prot.write_struct_end()?;
            }
            Self::EncryptionWithColumnKey(column_key) => {
                prot.write_struct_field_header(2)?;
                prot.write_struct_begin()?;
                prot.write_list_field_header(1, FieldType::Binary, column_key.path_in_schema.len())?;
                for part in &column_key.path_in_schema {
                    prot.write_string(part)?;
                }
                if let Some(key_metadata) = &column_key.key_metadata {
                    prot.write_binary_field(2, key_metadata)?;
                }
                prot.write_struct_end()?;
            }
        }
        prot.write_struct_end()
    }

    pub(crate) fn read(prot: &mut ThriftSliceInputProtocol) -> Result<Self> {
        let field = prot.read_field_begin(0)?;
        if field.field_type == FieldType::Stop {
            return Err(meta_err!("received empty union for ColumnCryptoMetaData"));
        }
        let crypto_metadata = match field.id {
            1 => {
                // empty struct
                prot.skip(FieldType::Struct)?;
                Self::EncryptionWithFooterKey
            }
            2 => {
                let mut path_in_schema = None;
                let mut key_metadata = None;
                let mut last_field_id = 0i16;
                loop {
                    let field = prot.read_field_begin(last_field_id)?;
                    match field.field_type {
                        FieldType::Stop => break,
                        _ => match field.id {
                            1 => {
                                let (_, len) = prot.read_list_begin()?;
                                let mut parts = Vec::with_capacity(len);
                                for _ in 0..len {
                                    parts.push(prot.read_string()?.to_owned());
                                }
                                path_in_schema = Some(parts);
                            }
                            2 => key_metadata = Some(prot.read_binary()?.to_vec()),
                            _ => prot.skip(field.field_type)?,
                        },
                    }
                    last_field_id = field.id;
                }
                let Some(path_in_schema) = path_in_schema else {
                    return Err(meta_err!("required field path_in_schema is missing"));
                };
                Self::EncryptionWithColumnKey(EncryptionWithColumnKey {
                    path_in_schema,
                    key_metadata,
                })
            }
            _ => {
                return Err(meta_err!(
                    "unexpected ColumnCryptoMetaData variant {}",
                    field.id
                ));
            }
        };
        let field = prot.read_field_begin(field.id)?;
        if field.field_type != FieldType::Stop {
            return Err(meta_err!("received multiple fields for union"));
        }
        Ok(crypto_metadata)
    }
}

// ----------------------------------------------------------------------
// File crypto metadata (encrypted footer variant)

/// Crypto metadata stored before the encrypted footer in files with an
/// encrypted footer. Files with a plaintext footer store the algorithm inside
/// the footer instead.
#[derive(Clone, Debug, PartialEq)]
pub struct FileCryptoMetaData {
    /// Encryption algorithm and its AAD parameters
    pub encryption_algorithm: EncryptionAlgorithm,
    /// Retrieval metadata of the key used for encryption of footer and
    /// (possibly) columns
    pub key_metadata: Option<Vec<u8>>,
}

impl FileCryptoMetaData {
    pub(crate) fn write<W: Write>(&self, prot: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        prot.write_struct_begin()?;
        prot.write_struct_field_header(1)?;
        self.encryption_algorithm.write(prot)?;
        if let Some(key_metadata) = &self.key_metadata {
            prot.write_binary_field(2, key_metadata)?;
        }
        prot.write_struct_end()
    }

    pub(crate) fn read(prot: &mut ThriftSliceInputProtocol) -> Result<Self> {
        let mut encryption_algorithm = None;
        let mut key_metadata = None;
        let mut last_field_id = 0i16;
        loop {
            let field = prot.read_field_begin(last_field_id)?;
            match field.field_type {
                FieldType::Stop => break,
                _ => match field.id {
                    1 => encryption_algorithm = Some(EncryptionAlgorithm::read(prot)?),
                    2 => key_metadata = Some(prot.read_binary()?.to_vec()),
                    _ => prot.skip(field.field_type)?,
                },
            }
            last_field_id = field.id;
        }
        let Some(encryption_algorithm) = encryption_algorithm else {
            return Err(meta_err!("required field encryption_algorithm is missing"));
        };
        Ok(FileCryptoMetaData {
            encryption_algorithm,
            key_metadata,
        })
    }
}

// ----------------------------------------------------------------------
// Column chunk metadata

/// Metadata of one column chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnMetaData {
    /// Physical type of the column values
    pub physical_type: Type,
    /// Path to the column in the schema
    pub path_in_schema: Vec<String>,
    /// Number of values in the chunk
    pub num_values: i64,
    /// Total byte size of all pages of the chunk as stored, including page
    /// headers and any encryption framing
    pub total_compressed_size: i64,
    /// Offset of the first data page
    pub data_page_offset: i64,
    /// Offset of the dictionary page, when the chunk has one
    pub dictionary_page_offset: Option<i64>,
}

impl ColumnMetaData {
    pub(crate) fn write<W: Write>(&self, prot: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        prot.write_struct_begin()?;
        prot.write_i32_field(1, self.physical_type.as_i32())?;
        prot.write_list_field_header(2, FieldType::Binary, self.path_in_schema.len())?;
        for part in &self.path_in_schema {
            prot.write_string(part)?;
        }
        prot.write_i64_field(3, self.num_values)?;
        prot.write_i64_field(4, self.total_compressed_size)?;
        prot.write_i64_field(5, self.data_page_offset)?;
        if let Some(offset) = self.dictionary_page_offset {
            prot.write_i64_field(6, offset)?;
        }
        prot.write_struct_end()
    }

    pub(crate) fn read(prot: &mut ThriftSliceInputProtocol) -> Result<Self> {
        let mut physical_type = None;
        let mut path_in_schema = None;
        let mut num_values = None;
        let mut total_compressed_size = None;
        let mut data_page_offset = None;
        let mut dictionary_page_offset = None;
        let mut last_field_id = 0i16;
        loop {
            let field = prot.read_field_begin(last_field_id)?;
            match field.field_type {
                FieldType::Stop => break,
                _ => match field.id {
                    1 => physical_type = Some(Type::try_from(prot.read_i32()?)?),
                    2 => {
                        let (_, len) = prot.read_list_begin()?;
                        let mut parts = Vec::with_capacity(len);
                        for _ in 0..len {
                            parts.push(prot.read_string()?.to_owned());
                        }
                        path_in_schema = Some(parts);
                    }
                    3 => num_values = Some(prot.read_i64()?),
                    4 => total_compressed_size = Some(prot.read_i64()?),
                    5 => data_page_offset = Some(prot.read_i64()?),
                    6 => dictionary_page_offset = Some(prot.read_i64()?),
                    _ => prot.skip(field.field_type)?,
                },
            }
            last_field_id = field.id;
        }
        let Some(physical_type) = physical_type else {
            return Err(meta_err!("required field type is missing"));
        };
        let Some(path_in_schema) = path_in_schema else {
            return Err(meta_err!("required field path_in_schema is missing"));
        };
        let Some(num_values) = num_values else {
            return Err(meta_err!("required field num_values is missing"));
        };
        let Some(total_compressed_size) = total_compressed_size else {
            return Err(meta_err!("required field total_compressed_size is missing"));
        };
        let Some(data_page_offset) = data_page_offset else {
            return Err(meta_err!("required field data_page_offset is missing"));
        };
        Ok(ColumnMetaData {
            physical_type,
            path_in_schema,
            num_values,
            total_compressed_size,
            data_page_offset,
            dictionary_page_offset,
        })
    }
}

/// One column chunk of a row group.
///
/// For encrypted columns whose metadata is hidden, `meta_data` is absent and
/// `encrypted_column_metadata` carries the serialized [`ColumnMetaData`],
/// encrypted with the column's metadata key under the `ColumnMetaData` module
/// AAD.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnChunk {
    /// Plaintext column metadata, absent when hidden
    pub meta_data: Option<ColumnMetaData>,
    /// How the chunk is encrypted, absent for plaintext columns
    pub crypto_metadata: Option<ColumnCryptoMetaData>,
    /// Encrypted serialized [`ColumnMetaData`]
    pub encrypted_column_metadata: Option<Vec<u8>>,
}

impl ColumnChunk {
    pub(crate) fn write<W: Write>(&self, prot: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        prot.write_struct_begin()?;
        if let Some(meta_data) = &self.meta_data {
            prot.write_struct_field_header(1)?;
            meta_data.write(prot)?;
        }
        if let Some(crypto_metadata) = &self.crypto_metadata {
            prot.write_struct_field_header(2)?;
            crypto_metadata.write(prot)?;
        }
        if let Some(encrypted) = &self.encrypted_column_metadata {
            prot.write_binary_field(3, encrypted)?;
        }
        prot.write_struct_end()
    }

    pub(crate) fn read(prot: &mut ThriftSliceInputProtocol) -> Result<Self> {
        let mut meta_data = None;
        let mut crypto_metadata = None;
        let mut encrypted_column_metadata = None;
        let mut last_field_id = 0i16;
        loop {
            let field = prot.read_field_begin(last_field_id)?;
            match field.field_type {
                FieldType::Stop => break,
                _ => match field.id {
                    1 => meta_data = Some(ColumnMetaData::read(prot)?),
                    2 => crypto_metadata = Some(ColumnCryptoMetaData::read(prot)?),
                    3 => encrypted_column_metadata = Some(prot.read_binary()?.to_vec()),
                    _ => prot.skip(field.field_type)?,
                },
            }
            last_field_id = field.id;
        }
        Ok(ColumnChunk {
            meta_data,
            crypto_metadata,
            encrypted_column_metadata,
        })
    }

    /// Path of the column, from the plaintext metadata or the crypto
    /// metadata.
    pub fn column_path(&self) -> Option<ColumnPath> {
        if let Some(meta_data) = &self.meta_data {
            return Some(ColumnPath::new(meta_data.path_in_schema.clone()));
        }
        match &self.crypto_metadata {
            Some(ColumnCryptoMetaData::EncryptionWithColumnKey(column_key)) => {
                Some(ColumnPath::new(column_key.path_in_schema.clone()))
            }
            _ => None,
        }
    }
}

// ----------------------------------------------------------------------
// Row groups and file metadata

/// Metadata of one row group.
#[derive(Clone, Debug, PartialEq)]
pub struct RowGroup {
    /// Column chunks, in schema order
    pub columns: Vec<ColumnChunk>,
    /// Total byte size of the row group's chunks as stored
    pub total_byte_size: i64,
    /// Number of rows
    pub num_rows: i64,
    /// Ordinal of the row group within the file
    pub ordinal: i16,
}

impl RowGroup {
    pub(crate) fn write<W: Write>(&self, prot: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        prot.write_struct_begin()?;
        prot.write_list_field_header(1, FieldType::Struct, self.columns.len())?;
        for column in &self.columns {
            column.write(prot)?;
        }
        prot.write_i64_field(2, self.total_byte_size)?;
        prot.write_i64_field(3, self.num_rows)?;
        prot.write_i16_field(4, self.ordinal)?;
        prot.write_struct_end()
    }

    pub(crate) fn read(prot: &mut ThriftSliceInputProtocol) -> Result<Self> {
        let mut columns = None;
        let mut total_byte_size = None;
        let mut num_rows = None;
        let mut ordinal = None;
        let mut last_field_id = 0i16;
        loop {
            let field = prot.read_field_begin(last_field_id)?;
            match field.field_type {
                FieldType::Stop => break,
                _ => match field.id {
                    1 => {
                        let (_, len) = prot.read_list_begin()?;
                        let mut chunks = Vec::with_capacity(len);
                        for _ in 0..len {
                            chunks.push(ColumnChunk::read(prot)?);
                        }
                        columns = Some(chunks);
                    }
                    2 => total_byte_size = Some(prot.read_i64()?),
                    3 => num_rows = Some(prot.read_i64()?),
                    4 => ordinal = Some(prot.read_i16()?),
                    _ => prot.skip(field.field_type)?,
                },
            }
            last_field_id = field.id;
        }
        let Some(columns) = columns else {
            return Err(meta_err!("required field columns is missing"));
        };
        let Some(total_byte_size) = total_byte_size else {
            return Err(meta_err!("required field total_byte_size is missing"));
        };
        let Some(num_rows) = num_rows else {
            return Err(meta_err!("required field num_rows is missing"));
        };
        let Some(ordinal) = ordinal else {
            return Err(meta_err!("required field ordinal is missing"));
        };
        Ok(RowGroup {
            columns,
            total_byte_size,
            num_rows,
            ordinal,
        })
    }
}

/// One element of the flat schema list.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaElement {
    /// Column name
    pub name: String,
    /// Physical type
    pub physical_type: Type,
}

/// File-level metadata stored in the footer.
#[derive(Clone, Debug, PartialEq)]
pub struct FileMetaData {
    /// Format version
    pub version: i32,
    /// Flat schema of leaf columns
    pub schema: Vec<SchemaElement>,
    /// Total number of rows
    pub num_rows: i64,
    /// Row groups
    pub row_groups: Vec<RowGroup>,
    /// Set for files with a plaintext footer and encrypted columns; files
    /// with an encrypted footer store the algorithm in
    /// [`FileCryptoMetaData`] instead
    pub encryption_algorithm: Option<EncryptionAlgorithm>,
    /// Retrieval metadata of the key used to sign the plaintext footer
    pub footer_signing_key_metadata: Option<Vec<u8>>,
}

impl FileMetaData {
    pub(crate) fn write<W: Write>(&self, prot: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        prot.write_struct_begin()?;
        prot.write_i32_field(1, self.version)?;
        prot.write_list_field_header(2, FieldType::Struct, self.schema.len())?;
        for element in &self.schema {
            prot.write_struct_begin()?;
            prot.write_string_field(1, &element.name)?;
            prot.write_i32_field(2, element.physical_type.as_i32())?;
            prot.write_struct_end()?;
        }
        prot.write_i64_field(3, self.num_rows)?;
        prot.write_list_field_header(4, FieldType::Struct, self.row_groups.len())?;
        for row_group in &self.row_groups {
            row_group.write(prot)?;
        }
        if let Some(algorithm) = &self.encryption_algorithm {
            prot.write_struct_field_header(5)?;
            algorithm.write(prot)?;
        }
        if let Some(key_metadata) = &self.footer_signing_key_metadata {
            prot.write_binary_field(6, key_metadata)?;
        }
        prot.write_struct_end()
    }

    /// Serializes this metadata to bytes.
    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut prot = ThriftCompactOutputProtocol::new(&mut buffer);
        self.write(&mut prot)?;
        Ok(buffer)
    }

    fn read_schema_element(prot: &mut ThriftSliceInputProtocol) -> Result<SchemaElement> {
        let mut name = None;
        let mut physical_type = None;
        let mut last_field_id = 0i16;
        loop {
            let field = prot.read_field_begin(last_field_id)?;
            match field.field_type {
                FieldType::Stop => break,
                _ => match field.id {
                    1 => name = Some(prot.read_string()?.to_owned()),
                    2 => physical_type = Some(Type::try_from(prot.read_i32()?)?),
                    _ => prot.skip(field.field_type)?,
                },
            }
            last_field_id = field.id;
        }
        let Some(name) = name else {
            return Err(meta_err!("required field name is missing"));
        };
        let Some(physical_type) = physical_type else {
            return Err(meta_err!("required field type is missing"));
        };
        Ok(SchemaElement {
            name,
            physical_type,
        })
    }

    pub(crate) fn read(prot: &mut ThriftSliceInputProtocol) -> Result<Self> {
        let mut version = None;
        let mut schema = None;
        let mut num_rows = None;
        let mut row_groups = None;
        let mut encryption_algorithm = None;
        let mut footer_signing_key_metadata = None;
        let mut last_field_id = 0i16;
        loop {
            let field = prot.read_field_begin(last_field_id)?;
            match field.field_type {
                FieldType::Stop => break,
                _ => match field.id {
                    1 => version = Some(prot.read_i32()?),
                    2 => {
                        let (_, len) = prot.read_list_begin()?;
                        let mut elements = Vec::with_capacity(len);
                        for _ in 0..len {
                            elements.push(Self::read_schema_element(prot)?);
                        }
                        schema = Some(elements);
                    }
                    3 => num_rows = Some(prot.read_i64()?),
                    4 => {
                        let (_, len) = prot.read_list_begin()?;
                        let mut groups = Vec::with_capacity(len);
                        for _ in 0..len {
                            groups.push(RowGroup::read(prot)?);
                        }
                        row_groups = Some(groups);
                    }
                    5 => encryption_algorithm = Some(EncryptionAlgorithm::read(prot)?),
                    6 => footer_signing_key_metadata = Some(prot.read_binary()?.to_vec()),
                    _ => prot.skip(field.field_type)?,
                },
            }
            last_field_id = field.id;
        }
        let Some(version) = version else {
            return Err(meta_err!("required field version is missing"));
        };
        let Some(schema) = schema else {
            return Err(meta_err!("required field schema is missing"));
        };
        let Some(num_rows) = num_rows else {
            return Err(meta_err!("required field num_rows is missing"));
        };
        let Some(row_groups) = row_groups else {
            return Err(meta_err!("required field row_groups is missing"));
        };
        Ok(FileMetaData {
            version,
            schema,
            num_rows,
            row_groups,
            encryption_algorithm,
            footer_signing_key_metadata,
        })
    }
}

// ----------------------------------------------------------------------
// Page headers

/// Header of a data page.
#[derive(Clone, Debug, PartialEq)]
pub struct DataPageHeader {
    /// Number of values in the page
    pub num_values: i32,
    /// Encoding of the values
    pub encoding: Encoding,
}

/// Header of a dictionary page.
#[derive(Clone, Debug, PartialEq)]
pub struct DictionaryPageHeader {
    /// Number of dictionary entries
    pub num_values: i32,
    /// Encoding of the entries
    pub encoding: Encoding,
}

/// Header stored before every page.
///
/// `compressed_page_size` is the on-disk byte size of the page body; for an
/// encrypted column this includes the encryption framing.
#[derive(Clone, Debug, PartialEq)]
pub struct PageHeader {
    /// Page type
    pub page_type: PageType,
    /// Byte size of the page body before encryption framing
    pub uncompressed_page_size: i32,
    /// On-disk byte size of the page body
    pub compressed_page_size: i32,
    /// Set for data pages
    pub data_page_header: Option<DataPageHeader>,
    /// Set for dictionary pages
    pub dictionary_page_header: Option<DictionaryPageHeader>,
}

impl PageHeader {
    pub(crate) fn write<W: Write>(&self, prot: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        prot.write_struct_begin()?;
        prot.write_i32_field(1, self.page_type.as_i32())?;
        prot.write_i32_field(2, self.uncompressed_page_size)?;
        prot.write_i32_field(3, self.compressed_page_size)?;
        if let Some(header) = &self.data_page_header {
            prot.write_struct_field_header(4)?;
            prot.write_struct_begin()?;
            prot.write_i32_field(1, header.num_values)?;
            prot.write_i32_field(2, header.encoding.as_i32())?;
            prot.write_struct_end()?;
        }
        if let Some(header) = &self.dictionary_page_header {
            prot.write_struct_field_header(5)?;
            prot.write_struct_begin()?;
            prot.write_i32_field(1, header.num_values)?;
            prot.write_i32_field(2, header.encoding.as_i32())?;
            prot.write_struct_end()?;
        }
        prot.write_struct_end()
    }

    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut prot = ThriftCompactOutputProtocol::new(&mut buffer);
        self.write(&mut prot)?;
        Ok(buffer)
    }

    fn read_num_values_and_encoding(
        prot: &mut ThriftSliceInputProtocol,
    ) -> Result<(i32, Encoding)> {
        let mut num_values = None;
        let mut encoding = None;
        let mut last_field_id = 0i16;
        loop {
            let field = prot.read_field_begin(last_field_id)?;
            match field.field_type {
                FieldType::Stop => break,
                _ => match field.id {
                    1 => num_values = Some(prot.read_i32()?),
                    2 => encoding = Some(Encoding::try_from(prot.read_i32()?)?),
                    _ => prot.skip(field.field_type)?,
                },
            }
            last_field_id = field.id;
        }
        let Some(num_values) = num_values else {
            return Err(meta_err!("required field num_values is missing"));
        };
        let Some(encoding) = encoding else {
            return Err(meta_err!("required field encoding is missing"));
        };
        Ok((num_values, encoding))
    }

    pub(crate) fn read(prot: &mut ThriftSliceInputProtocol) -> Result<Self> {
        let mut page_type = None;
        let mut uncompressed_page_size = None;
        let mut compressed_page_size = None;
        let mut data_page_header = None;
        let mut dictionary_page_header = None;
        let mut last_field_id = 0i16;
        loop {
            let field = prot.read_field_begin(last_field_id)?;
            match field.field_type {
                FieldType::Stop => break,
                _ => match field.id {
                    1 => page_type = Some(PageType::try_from(prot.read_i32()?)?),
                    2 => uncompressed_page_size = Some(prot.read_i32()?),
                    3 => compressed_page_size = Some(prot.read_i32()?),
                    4 => {
                        let (num_values, encoding) = Self::read_num_values_and_encoding(prot)?;
                        data_page_header = Some(DataPageHeader {
                            num_values,
                            encoding,
                        });
                    }
                    5 => {
                        let (num_values, encoding) = Self::read_num_values_and_encoding(prot)?;
                        dictionary_page_header = Some(DictionaryPageHeader {
                            num_values,
                            encoding,
                        });
                    }
                    _ => prot.skip(field.field_type)?,
                },
            }
            last_field_id = field.id;
        }
        let Some(page_type) = page_type else {
            return Err(meta_err!("required field type is missing"));
        };
        let Some(uncompressed_page_size) = uncompressed_page_size else {
            return Err(meta_err!("required field uncompressed_page_size is missing"));
        };
        let Some(compressed_page_size) = compressed_page_size else {
            return Err(meta_err!("required field compressed_page_size is missing"));
        };
        Ok(PageHeader {
            page_type,
            uncompressed_page_size,
            compressed_page_size,
            data_page_header,
            dictionary_page_header,
        })
    }
}

// ----------------------------------------------------------------------
// Parsed file metadata with decryption state

/// Parsed file metadata plus the file decryptor established while parsing,
/// when the file is encrypted.
#[derive(Debug)]
pub struct ParquetMetaData {
    file_metadata: FileMetaData,
    file_decryptor: Option<Arc<FileDecryptor>>,
}

impl ParquetMetaData {
    pub(crate) fn new(
        file_metadata: FileMetaData,
        file_decryptor: Option<Arc<FileDecryptor>>,
    ) -> Self {
        Self {
            file_metadata,
            file_decryptor,
        }
    }

    /// The parsed file metadata.
    pub fn file_metadata(&self) -> &FileMetaData {
        &self.file_metadata
    }

    /// The decryptor established from the file's crypto metadata, when the
    /// file is encrypted.
    pub fn file_decryptor(&self) -> Option<&Arc<FileDecryptor>> {
        self.file_decryptor.as_ref()
    }
}

/// Decrypts the hidden column metadata of every column chunk that carries
/// `encrypted_column_metadata`.
///
/// Chunks whose key cannot be resolved are left opaque; the failure surfaces
/// when the column itself is read. Decrypted metadata replaces the chunk's
/// `meta_data` field.
pub(crate) fn decrypt_column_metadata(
    file_metadata: &mut FileMetaData,
    file_decryptor: &FileDecryptor,
) -> Result<()> {
    for row_group in &mut file_metadata.row_groups {
        let row_group_ordinal = row_group.ordinal as usize;
        for (column_ordinal, column) in row_group.columns.iter_mut().enumerate() {
            let Some(encrypted) = column.encrypted_column_metadata.as_deref() else {
                continue;
            };
            let mut decryptor = match &column.crypto_metadata {
                None => {
                    return Err(meta_err!(
                        "column {} has encrypted metadata but no crypto metadata",
                        column_ordinal
                    ));
                }
                Some(ColumnCryptoMetaData::EncryptionWithFooterKey) => {
                    file_decryptor.get_footer_decryptor_for_column_meta()?
                }
                Some(ColumnCryptoMetaData::EncryptionWithColumnKey(column_key)) => {
                    let column_path = ColumnPath::new(column_key.path_in_schema.clone());
                    match file_decryptor
                        .get_column_meta_decryptor(&column_path, column_key.key_metadata.as_deref())
                    {
                        Ok(decryptor) => decryptor,
                        Err(ParquetError::KeyUnavailable(_)) => {
                            // key not resolvable; leave the chunk opaque and
                            // fail only if this column is actually read
                            tracing::debug!(
                                column = %column_path,
                                "column metadata key unavailable, leaving chunk opaque"
                            );
                            continue;
                        }
                        Err(e) => return Err(e),
                    }
                }
            };

            let aad = create_module_aad(
                file_decryptor.file_aad(),
                ModuleType::ColumnMetaData,
                row_group_ordinal,
                column_ordinal,
                None,
            )?;
            decryptor.set_aad(aad);
            let decrypted = decryptor.decrypt(encrypted).map_err(|_| {
                general_err!(
                    "unable to decrypt metadata of column {}, perhaps the key is wrong?",
                    column_ordinal
                )
            })?;

            let mut prot = ThriftSliceInputProtocol::new(&decrypted);
            column.meta_data = Some(ColumnMetaData::read(&mut prot)?);
            column.encrypted_column_metadata = None;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metadata() -> FileMetaData {
        FileMetaData {
            version: 1,
            schema: vec![
                SchemaElement {
                    name: "bool_field".to_owned(),
                    physical_type: Type::BOOLEAN,
                },
                SchemaElement {
                    name: "double_field".to_owned(),
                    physical_type: Type::DOUBLE,
                },
            ],
            num_rows: 500,
            row_groups: vec![RowGroup {
                columns: vec![
                    ColumnChunk {
                        meta_data: Some(ColumnMetaData {
                            physical_type: Type::BOOLEAN,
                            path_in_schema: vec!["bool_field".to_owned()],
                            num_values: 500,
                            total_compressed_size: 123,
                            data_page_offset: 4,
                            dictionary_page_offset: None,
                        }),
                        crypto_metadata: Some(ColumnCryptoMetaData::EncryptionWithFooterKey),
                        encrypted_column_metadata: None,
                    },
                    ColumnChunk {
                        meta_data: None,
                        crypto_metadata: Some(ColumnCryptoMetaData::EncryptionWithColumnKey(
                            EncryptionWithColumnKey {
                                path_in_schema: vec!["double_field".to_owned()],
                                key_metadata: Some(b"kc1".to_vec()),
                            },
                        )),
                        encrypted_column_metadata: Some(vec![1, 2, 3]),
                    },
                ],
                total_byte_size: 456,
                num_rows: 500,
                ordinal: 0,
            }],
            encryption_algorithm: Some(EncryptionAlgorithm::AES_GCM_V1(AesGcmV1 {
                aad_prefix: Some(b"tester".to_vec()),
                aad_file_unique: Some(vec![0, 1, 2, 3, 4, 5, 6, 7]),
                supply_aad_prefix: Some(false),
            })),
            footer_signing_key_metadata: Some(b"kf".to_vec()),
        }
    }

    #[test]
    fn test_file_metadata_round_trip() {
        let metadata = sample_metadata();
        let bytes = metadata.to_bytes().unwrap();
        let mut prot = ThriftSliceInputProtocol::new(&bytes);
        let read_back = FileMetaData::read(&mut prot).unwrap();
        assert_eq!(read_back, metadata);
        assert!(prot.as_slice().is_empty());
    }

    #[test]
    fn test_file_metadata_parse_consumes_exactly_struct_bytes() {
        let metadata = sample_metadata();
        let mut bytes = metadata.to_bytes().unwrap();
        // trailing bytes, like the 28-byte signing trailer, must be left over
        bytes.extend_from_slice(&[0xAB; 28]);
        let mut prot = ThriftSliceInputProtocol::new(&bytes);
        FileMetaData::read(&mut prot).unwrap();
        assert_eq!(prot.as_slice().len(), 28);
    }

    #[test]
    fn test_file_crypto_metadata_round_trip() {
        let crypto = FileCryptoMetaData {
            encryption_algorithm: EncryptionAlgorithm::AES_GCM_CTR_V1(AesGcmCtrV1 {
                aad_prefix: None,
                aad_file_unique: Some(vec![9; 8]),
                supply_aad_prefix: Some(true),
            }),
            key_metadata: Some(b"kf".to_vec()),
        };
        let mut bytes = Vec::new();
        let mut prot = ThriftCompactOutputProtocol::new(&mut bytes);
        crypto.write(&mut prot).unwrap();

        let mut prot = ThriftSliceInputProtocol::new(&bytes);
        assert_eq!(FileCryptoMetaData::read(&mut prot).unwrap(), crypto);
    }

    #[test]
    fn test_column_crypto_metadata_round_trip() {
        for crypto in [
            ColumnCryptoMetaData::EncryptionWithFooterKey,
            ColumnCryptoMetaData::EncryptionWithColumnKey(EncryptionWithColumnKey {
                path_in_schema: vec!["a".to_owned(), "b".to_owned()],
                key_metadata: Some(vec![0, 1, 2, 3, 4, 5]),
            }),
        ] {
            let mut bytes = Vec::new();
            let mut prot = ThriftCompactOutputProtocol::new(&mut bytes);
            crypto.write(&mut prot).unwrap();
            let mut prot = ThriftSliceInputProtocol::new(&bytes);
            assert_eq!(ColumnCryptoMetaData::read(&mut prot).unwrap(), crypto);
        }
    }

    #[test]
    fn test_page_header_round_trip() {
        let header = PageHeader {
            page_type: PageType::DATA_PAGE,
            uncompressed_page_size: 1000,
            compressed_page_size: 1028,
            data_page_header: Some(DataPageHeader {
                num_values: 250,
                encoding: Encoding::PLAIN,
            }),
            dictionary_page_header: None,
        };
        let bytes = header.to_bytes().unwrap();
        let mut prot = ThriftSliceInputProtocol::new(&bytes);
        assert_eq!(PageHeader::read(&mut prot).unwrap(), header);
    }

    #[test]
    fn test_truncated_metadata_fails() {
        let metadata = sample_metadata();
        let bytes = metadata.to_bytes().unwrap();
        let mut prot = ThriftSliceInputProtocol::new(&bytes[..bytes.len() / 2]);
        assert!(FileMetaData::read(&mut prot).is_err());
    }
}
