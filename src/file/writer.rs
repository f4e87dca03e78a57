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

//! File writer: row groups, PLAIN-encoded pages, module encryption, and both
//! footer variants.

use std::io::Write;
use std::sync::Arc;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::basic::{Encoding, PageType};
use crate::encodings::{encode_plain, ColumnValues};
use crate::encryption::ciphers::{NONCE_LEN, TAG_LEN};
use crate::encryption::encrypt::{FileEncryptionProperties, FileEncryptor};
use crate::encryption::modules::{create_module_aad, ModuleType};
use crate::encryption::page_encryptor::PageEncryptor;
use crate::errors::{ParquetError, Result};
use crate::file::metadata::{
    AesGcmCtrV1, AesGcmV1, ColumnChunk, ColumnCryptoMetaData, ColumnMetaData, DataPageHeader,
    EncryptionAlgorithm, EncryptionWithColumnKey, FileCryptoMetaData, FileMetaData, PageHeader,
    RowGroup, SchemaElement,
};
use crate::file::properties::WriterProperties;
use crate::file::{PARQUET_MAGIC, PARQUET_MAGIC_ENCRYPTED_FOOTER};
use crate::basic::Cipher;
use crate::schema::types::{ColumnPath, SchemaDescriptor};
use crate::thrift::ThriftCompactOutputProtocol;

/// A wrapper around a [`Write`] that keeps track of the number of bytes that
/// have been written.
pub struct TrackedWrite<W> {
    inner: W,
    bytes_written: usize,
}

impl<W: Write> TrackedWrite<W> {
    /// Create a new [`TrackedWrite`] from a [`Write`].
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            bytes_written: 0,
        }
    }

    /// Returns the number of bytes written to this instance.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for TrackedWrite<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let bytes = self.inner.write(buf)?;
        self.bytes_written += bytes;
        Ok(bytes)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

fn encryption_algorithm_for_file(
    properties: &FileEncryptionProperties,
) -> EncryptionAlgorithm {
    let aad_prefix = if properties.store_aad_prefix_in_file() {
        properties.aad_prefix().map(|p| p.to_vec())
    } else {
        None
    };
    // readers must supply the prefix when it was used but not stored
    let supply_aad_prefix = match (properties.aad_prefix(), aad_prefix.is_some()) {
        (Some(_), false) => Some(true),
        _ => None,
    };
    let aad_file_unique = Some(properties.aad_file_unique().to_vec());
    match properties.cipher() {
        Cipher::AES_GCM_V1 => EncryptionAlgorithm::AES_GCM_V1(AesGcmV1 {
            aad_prefix,
            aad_file_unique,
            supply_aad_prefix,
        }),
        Cipher::AES_GCM_CTR_V1 => EncryptionAlgorithm::AES_GCM_CTR_V1(AesGcmCtrV1 {
            aad_prefix,
            aad_file_unique,
            supply_aad_prefix,
        }),
    }
}

/// Writes a complete file: leading magic, column chunk pages, and the footer.
///
/// ```no_run
/// # use std::fs::File;
/// # use parquet_encryption::basic::Type;
/// # use parquet_encryption::encodings::ColumnValues;
/// # use parquet_encryption::file::properties::WriterProperties;
/// # use parquet_encryption::file::writer::SerializedFileWriter;
/// # use parquet_encryption::schema::types::{ColumnDescriptor, SchemaDescriptor};
/// let schema = SchemaDescriptor::new(vec![
///     ColumnDescriptor::new("int32_field", Type::INT32),
/// ])?;
/// let file = File::create("example.parquet")?;
/// let mut writer =
///     SerializedFileWriter::new(file, schema, WriterProperties::default())?;
/// let mut row_group = writer.next_row_group()?;
/// row_group.append_column(&ColumnValues::Int32((0..500).collect()))?;
/// row_group.close()?;
/// writer.close()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SerializedFileWriter<W: Write> {
    buf: TrackedWrite<W>,
    schema: SchemaDescriptor,
    properties: WriterProperties,
    file_encryptor: Option<Arc<FileEncryptor>>,
    row_groups: Vec<RowGroup>,
}

impl<W: Write> SerializedFileWriter<W> {
    /// Creates a writer over `buf` and writes the leading magic.
    pub fn new(buf: W, schema: SchemaDescriptor, properties: WriterProperties) -> Result<Self> {
        let file_encryptor = properties
            .file_encryption_properties()
            .map(|p| Arc::new(FileEncryptor::new(Arc::clone(p))));
        let mut buf = TrackedWrite::new(buf);
        Self::start_file(&mut buf, file_encryptor.as_deref())?;
        Ok(Self {
            buf,
            schema,
            properties,
            file_encryptor,
            row_groups: Vec::new(),
        })
    }

    /// Writes the leading magic: `PARE` for encrypted-footer files, `PAR1`
    /// otherwise.
    fn start_file(buf: &mut TrackedWrite<W>, file_encryptor: Option<&FileEncryptor>) -> Result<()> {
        let magic = match file_encryptor {
            Some(encryptor) if encryptor.properties().encrypt_footer() => {
                &PARQUET_MAGIC_ENCRYPTED_FOOTER
            }
            _ => &PARQUET_MAGIC,
        };
        buf.write_all(magic)?;
        Ok(())
    }

    /// Starts the next row group. The previous row group writer must have
    /// been closed.
    pub fn next_row_group(&mut self) -> Result<SerializedRowGroupWriter<'_, W>> {
        let ordinal = self.row_groups.len();
        if ordinal > i16::MAX as usize {
            return Err(general_err!("too many row groups"));
        }
        Ok(SerializedRowGroupWriter {
            writer: self,
            ordinal,
            columns: Vec::new(),
            num_rows: None,
            total_byte_size: 0,
        })
    }

    /// Finishes the file: writes the footer in the configured variant and
    /// returns the file metadata.
    pub fn close(mut self) -> Result<FileMetaData> {
        let num_rows = self.row_groups.iter().map(|rg| rg.num_rows).sum();
        let mut metadata = FileMetaData {
            version: 1,
            schema: self
                .schema
                .columns()
                .iter()
                .map(|c| SchemaElement {
                    name: c.path().string(),
                    physical_type: c.physical_type(),
                })
                .collect(),
            num_rows,
            row_groups: std::mem::take(&mut self.row_groups),
            encryption_algorithm: None,
            footer_signing_key_metadata: None,
        };

        match self.file_encryptor.as_ref() {
            None => {
                let footer = metadata.to_bytes()?;
                self.buf.write_all(&footer)?;
                self.buf.write_all(&(footer.len() as u32).to_le_bytes())?;
                self.buf.write_all(&PARQUET_MAGIC)?;
            }
            Some(file_encryptor) if file_encryptor.properties().encrypt_footer() => {
                let properties = file_encryptor.properties();
                let crypto_metadata = FileCryptoMetaData {
                    encryption_algorithm: encryption_algorithm_for_file(properties),
                    key_metadata: properties.footer_key_metadata().map(|m| m.to_vec()),
                };
                let mut crypto_bytes = Vec::new();
                let mut prot = ThriftCompactOutputProtocol::new(&mut crypto_bytes);
                crypto_metadata.write(&mut prot)?;

                let footer = metadata.to_bytes()?;
                let footer_encryptor = file_encryptor.get_footer_encryptor()?;
                let encrypted_footer = footer_encryptor.encrypt(&footer)?;

                let combined_len = crypto_bytes.len() + encrypted_footer.len();
                self.buf.write_all(&crypto_bytes)?;
                self.buf.write_all(&encrypted_footer)?;
                self.buf.write_all(&(combined_len as u32).to_le_bytes())?;
                self.buf.write_all(&PARQUET_MAGIC_ENCRYPTED_FOOTER)?;
            }
            Some(file_encryptor) => {
                // plaintext footer: the metadata declares the algorithm and is
                // followed by a nonce-and-tag trailer signing it
                let properties = file_encryptor.properties();
                metadata.encryption_algorithm = Some(encryption_algorithm_for_file(properties));
                metadata.footer_signing_key_metadata =
                    properties.footer_key_metadata().map(|m| m.to_vec());

                let footer = metadata.to_bytes()?;
                let mut nonce = [0u8; NONCE_LEN];
                OsRng
                    .try_fill_bytes(&mut nonce)
                    .map_err(|e| general_err!("no secure random source available: {}", e))?;
                let signing_encryptor = file_encryptor.get_footer_signing_encryptor()?;
                let signed = signing_encryptor.signed_footer_encrypt(&footer, &nonce)?;
                let tag = &signed[signed.len() - TAG_LEN..];

                let footer_len = footer.len() + NONCE_LEN + tag.len();
                self.buf.write_all(&footer)?;
                self.buf.write_all(&nonce)?;
                self.buf.write_all(tag)?;
                self.buf.write_all(&(footer_len as u32).to_le_bytes())?;
                self.buf.write_all(&PARQUET_MAGIC)?;
            }
        }

        self.buf.flush()?;
        let _ = self.buf.into_inner();
        Ok(metadata)
    }
}

/// Writes the column chunks of one row group, in schema order.
pub struct SerializedRowGroupWriter<'a, W: Write> {
    writer: &'a mut SerializedFileWriter<W>,
    ordinal: usize,
    columns: Vec<ColumnChunk>,
    num_rows: Option<i64>,
    total_byte_size: i64,
}

impl<W: Write> SerializedRowGroupWriter<'_, W> {
    /// Appends the next column of the row group. Columns must be appended in
    /// schema order and hold the same number of rows.
    pub fn append_column(&mut self, values: &ColumnValues) -> Result<()> {
        let column_ordinal = self.columns.len();
        if column_ordinal >= self.writer.schema.num_columns() {
            return Err(general_err!(
                "schema has {} columns, cannot append another",
                self.writer.schema.num_columns()
            ));
        }
        let descriptor = self.writer.schema.column(column_ordinal).clone();
        if descriptor.physical_type() != values.physical_type() {
            return Err(general_err!(
                "column '{}' expects {:?} values, got {:?}",
                descriptor.path(),
                descriptor.physical_type(),
                values.physical_type()
            ));
        }
        match self.num_rows {
            None => self.num_rows = Some(values.len() as i64),
            Some(num_rows) => {
                if num_rows != values.len() as i64 {
                    return Err(general_err!(
                        "column '{}' has {} rows, expected {}",
                        descriptor.path(),
                        values.len(),
                        num_rows
                    ));
                }
            }
        }

        let column_path = descriptor.path();
        let mut page_encryptor = match self.writer.file_encryptor.as_ref() {
            None => None,
            Some(file_encryptor) => {
                let meta = file_encryptor.get_column_meta_encryptor(column_path)?;
                let data = file_encryptor.get_column_data_encryptor(column_path)?;
                match (meta, data) {
                    (Some(meta), Some(data)) => Some(PageEncryptor::new(
                        meta,
                        data,
                        self.ordinal,
                        column_ordinal,
                    )),
                    _ => None,
                }
            }
        };

        let start_offset = self.writer.buf.bytes_written();
        let limit = self.writer.properties.data_page_row_count_limit();
        let mut written = 0;
        loop {
            let page_len = limit.min(values.len() - written);
            let page_values = values.slice(written, page_len);
            let body = encode_plain(&page_values);
            let uncompressed_page_size = body.len() as i32;

            let body = match page_encryptor.as_mut() {
                None => body,
                Some(encryptor) => encryptor.encrypt_page(&body, false)?,
            };
            let header = PageHeader {
                page_type: PageType::DATA_PAGE,
                uncompressed_page_size,
                compressed_page_size: body.len() as i32,
                data_page_header: Some(DataPageHeader {
                    num_values: page_len as i32,
                    encoding: Encoding::PLAIN,
                }),
                dictionary_page_header: None,
            };
            let header_bytes = header.to_bytes()?;
            let header_bytes = match page_encryptor.as_mut() {
                None => header_bytes,
                Some(encryptor) => encryptor.encrypt_page_header(&header_bytes, false)?,
            };

            self.writer.buf.write_all(&header_bytes)?;
            self.writer.buf.write_all(&body)?;
            self.total_byte_size += (header_bytes.len() + uncompressed_page_size as usize) as i64;

            if let Some(encryptor) = page_encryptor.as_mut() {
                encryptor.increment_page();
            }
            written += page_len;
            if written >= values.len() {
                break;
            }
        }

        let total_compressed_size = (self.writer.buf.bytes_written() - start_offset) as i64;
        let meta_data = ColumnMetaData {
            physical_type: descriptor.physical_type(),
            path_in_schema: descriptor.path().parts().to_vec(),
            num_values: values.len() as i64,
            total_compressed_size,
            data_page_offset: start_offset as i64,
            dictionary_page_offset: None,
        };

        let chunk = self.build_column_chunk(meta_data, column_ordinal)?;
        self.columns.push(chunk);
        Ok(())
    }

    /// Attaches crypto metadata and hides the column metadata when required.
    fn build_column_chunk(
        &mut self,
        meta_data: ColumnMetaData,
        column_ordinal: usize,
    ) -> Result<ColumnChunk> {
        let Some(file_encryptor) = self.writer.file_encryptor.as_ref() else {
            return Ok(ColumnChunk {
                meta_data: Some(meta_data),
                crypto_metadata: None,
                encrypted_column_metadata: None,
            });
        };
        let properties = file_encryptor.properties();
        let path = ColumnPath::new(meta_data.path_in_schema.clone());

        if !properties.is_column_encrypted(&path) {
            return Ok(ColumnChunk {
                meta_data: Some(meta_data),
                crypto_metadata: None,
                encrypted_column_metadata: None,
            });
        }

        let column_properties = properties.column_properties().get(&path);
        let footer_key_encrypted = column_properties
            .map(|c| c.is_encrypted_with_footer_key())
            .unwrap_or(true);
        let crypto_metadata = if footer_key_encrypted {
            ColumnCryptoMetaData::EncryptionWithFooterKey
        } else {
            ColumnCryptoMetaData::EncryptionWithColumnKey(EncryptionWithColumnKey {
                path_in_schema: path.parts().to_vec(),
                key_metadata: column_properties
                    .and_then(|c| c.key_metadata())
                    .map(|m| m.to_vec()),
            })
        };

        // metadata of a column with its own key is hidden; with a plaintext
        // footer every encrypted column hides it
        let hide_metadata = !footer_key_encrypted || !properties.encrypt_footer();
        if !hide_metadata {
            return Ok(ColumnChunk {
                meta_data: Some(meta_data),
                crypto_metadata: Some(crypto_metadata),
                encrypted_column_metadata: None,
            });
        }

        let mut meta_encryptor = file_encryptor
            .get_column_meta_encryptor(&path)?
            .ok_or_else(|| general_err!("no metadata encryptor for encrypted column"))?;
        let aad = create_module_aad(
            file_encryptor.file_aad(),
            ModuleType::ColumnMetaData,
            self.ordinal,
            column_ordinal,
            None,
        )?;
        meta_encryptor.set_aad(aad);

        let mut serialized = Vec::new();
        let mut prot = ThriftCompactOutputProtocol::new(&mut serialized);
        meta_data.write(&mut prot)?;
        let encrypted_column_metadata = meta_encryptor.encrypt(&serialized)?;

        Ok(ColumnChunk {
            meta_data: None,
            crypto_metadata: Some(crypto_metadata),
            encrypted_column_metadata: Some(encrypted_column_metadata),
        })
    }

    /// Finishes the row group and records its metadata in the file writer.
    pub fn close(self) -> Result<()> {
        if self.columns.len() != self.writer.schema.num_columns() {
            return Err(general_err!(
                "row group has {} columns, schema expects {}",
                self.columns.len(),
                self.writer.schema.num_columns()
            ));
        }
        self.writer.row_groups.push(RowGroup {
            columns: self.columns,
            total_byte_size: self.total_byte_size,
            num_rows: self.num_rows.unwrap_or(0),
            ordinal: self.ordinal as i16,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::Type;
    use crate::schema::types::ColumnDescriptor;

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new(vec![
            ColumnDescriptor::new("a", Type::INT32),
            ColumnDescriptor::new("b", Type::DOUBLE),
        ])
        .unwrap()
    }

    #[test]
    fn test_plain_file_layout() {
        let mut out = Vec::new();
        let writer =
            SerializedFileWriter::new(&mut out, schema(), WriterProperties::default()).unwrap();
        writer.close().unwrap();
        assert_eq!(&out[..4], b"PAR1");
        assert_eq!(&out[out.len() - 4..], b"PAR1");
        let mut len = [0u8; 4];
        len.copy_from_slice(&out[out.len() - 8..out.len() - 4]);
        assert_eq!(u32::from_le_bytes(len) as usize, out.len() - 4 - 8);
    }

    #[test]
    fn test_row_group_requires_all_columns() {
        let mut out = Vec::new();
        let mut writer =
            SerializedFileWriter::new(&mut out, schema(), WriterProperties::default()).unwrap();
        let mut row_group = writer.next_row_group().unwrap();
        row_group
            .append_column(&ColumnValues::Int32(vec![1, 2, 3]))
            .unwrap();
        assert!(row_group.close().is_err());
    }

    #[test]
    fn test_mismatched_row_counts() {
        let mut out = Vec::new();
        let mut writer =
            SerializedFileWriter::new(&mut out, schema(), WriterProperties::default()).unwrap();
        let mut row_group = writer.next_row_group().unwrap();
        row_group
            .append_column(&ColumnValues::Int32(vec![1, 2, 3]))
            .unwrap();
        let result = row_group.append_column(&ColumnValues::Double(vec![1.0]));
        assert!(result.is_err());
    }

    #[test]
    fn test_mismatched_column_type() {
        let mut out = Vec::new();
        let mut writer =
            SerializedFileWriter::new(&mut out, schema(), WriterProperties::default()).unwrap();
        let mut row_group = writer.next_row_group().unwrap();
        let result = row_group.append_column(&ColumnValues::Double(vec![1.0]));
        assert!(result.is_err());
    }

    #[test]
    fn test_encrypted_footer_file_magic() {
        let properties = FileEncryptionProperties::builder(b"0123456789012345".to_vec())
            .build()
            .unwrap();
        let writer_properties = WriterProperties::builder()
            .with_file_encryption_properties(properties)
            .build();
        let mut out = Vec::new();
        let writer = SerializedFileWriter::new(&mut out, schema(), writer_properties).unwrap();
        writer.close().unwrap();
        assert_eq!(&out[..4], b"PARE");
        assert_eq!(&out[out.len() - 4..], b"PARE");
    }
}
