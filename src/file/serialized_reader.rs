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

//! File reader: footer-driven row group access and page reading with
//! per-column decryption.

use std::sync::Arc;

use bytes::Bytes;

use crate::basic::{Encoding, PageType};
use crate::encodings::{decode_plain, ColumnValues};
use crate::encryption::decrypt::{CryptoContext, FileDecryptionProperties, FileDecryptor};
use crate::errors::{ParquetError, Result};
use crate::file::footer;
use crate::file::metadata::{ColumnChunk, ParquetMetaData, PageHeader, RowGroup};
use crate::file::reader::ChunkReader;
use crate::schema::types::{ColumnDescriptor, SchemaDescriptor};
use crate::thrift::ThriftSliceInputProtocol;

/// A page read back from a column chunk, decrypted but still PLAIN-encoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    /// A data page
    Data {
        /// Decrypted page body
        buf: Vec<u8>,
        /// Number of values in the page
        num_values: u32,
        /// Value encoding
        encoding: Encoding,
    },
    /// A dictionary page
    Dictionary {
        /// Decrypted page body
        buf: Vec<u8>,
        /// Number of dictionary entries
        num_values: u32,
        /// Entry encoding
        encoding: Encoding,
    },
}

/// Reads a file through a [`ChunkReader`], parsing the footer eagerly.
pub struct SerializedFileReader<R: ChunkReader> {
    chunk_reader: R,
    metadata: ParquetMetaData,
    schema: SchemaDescriptor,
}

impl<R: ChunkReader> SerializedFileReader<R> {
    /// Opens an unencrypted file. Fails with
    /// [`ParquetError::NoDecryptionProperties`] if the file turns out to be
    /// encrypted.
    pub fn new(chunk_reader: R) -> Result<Self> {
        Self::new_impl(chunk_reader, None)
    }

    /// Opens a possibly encrypted file with the given decryption properties.
    pub fn new_with_decryption_properties(
        chunk_reader: R,
        decryption_properties: Arc<FileDecryptionProperties>,
    ) -> Result<Self> {
        Self::new_impl(chunk_reader, Some(decryption_properties))
    }

    fn new_impl(
        chunk_reader: R,
        decryption_properties: Option<Arc<FileDecryptionProperties>>,
    ) -> Result<Self> {
        let metadata = footer::parse_metadata(&chunk_reader, decryption_properties.as_ref())?;
        let schema = SchemaDescriptor::new(
            metadata
                .file_metadata()
                .schema
                .iter()
                .map(|element| {
                    ColumnDescriptor::new(element.name.as_str(), element.physical_type)
                })
                .collect(),
        )?;
        Ok(Self {
            chunk_reader,
            metadata,
            schema,
        })
    }

    /// The parsed file metadata.
    pub fn metadata(&self) -> &ParquetMetaData {
        &self.metadata
    }

    /// The schema reconstructed from the footer.
    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    /// Number of row groups in the file.
    pub fn num_row_groups(&self) -> usize {
        self.metadata.file_metadata().row_groups.len()
    }

    /// Returns a reader for row group `i`.
    pub fn get_row_group(&self, i: usize) -> Result<RowGroupReader<'_, R>> {
        let row_groups = &self.metadata.file_metadata().row_groups;
        if i >= row_groups.len() {
            return Err(general_err!(
                "row group index {} out of range, file has {}",
                i,
                row_groups.len()
            ));
        }
        Ok(RowGroupReader {
            chunk_reader: &self.chunk_reader,
            row_group: &row_groups[i],
            schema: &self.schema,
            file_decryptor: self.metadata.file_decryptor(),
        })
    }
}

/// Reads the column chunks of one row group.
pub struct RowGroupReader<'a, R: ChunkReader> {
    chunk_reader: &'a R,
    row_group: &'a RowGroup,
    schema: &'a SchemaDescriptor,
    file_decryptor: Option<&'a Arc<FileDecryptor>>,
}

impl<R: ChunkReader> RowGroupReader<'_, R> {
    /// Number of columns in the row group.
    pub fn num_columns(&self) -> usize {
        self.row_group.columns.len()
    }

    /// Number of rows in the row group.
    pub fn num_rows(&self) -> i64 {
        self.row_group.num_rows
    }

    /// Metadata of the row group.
    pub fn metadata(&self) -> &RowGroup {
        self.row_group
    }

    fn column_chunk(&self, i: usize) -> Result<&ColumnChunk> {
        self.row_group
            .columns
            .get(i)
            .ok_or_else(|| general_err!("column index {} out of range", i))
    }

    /// Returns a page reader for column `i`, with the column's decryptors
    /// attached when the column is encrypted.
    pub fn get_column_page_reader(&self, i: usize) -> Result<SerializedPageReader> {
        let column = self.column_chunk(i)?;

        // resolve the column's decryptors first so a missing key surfaces as
        // such rather than as missing metadata
        let crypto_context = match &column.crypto_metadata {
            None => None,
            Some(crypto_metadata) => {
                let file_decryptor =
                    self.file_decryptor.ok_or(ParquetError::NoDecryptionProperties)?;
                Some(CryptoContext::for_column(
                    file_decryptor,
                    crypto_metadata,
                    self.row_group.ordinal as usize,
                    i,
                )?)
            }
        };

        let Some(meta_data) = column.meta_data.as_ref() else {
            return Err(general_err!(
                "column {} has no readable metadata",
                i
            ));
        };

        let data_offset = meta_data.data_page_offset;
        let start = match meta_data.dictionary_page_offset {
            Some(dictionary_offset) if dictionary_offset < data_offset => dictionary_offset,
            _ => data_offset,
        };
        let length = usize::try_from(meta_data.total_compressed_size)
            .map_err(|_| general_err!("invalid column chunk size"))?;
        let buf = self.chunk_reader.get_bytes(start as u64, length)?;

        Ok(SerializedPageReader::new(
            buf,
            meta_data.num_values,
            meta_data.dictionary_page_offset.is_some(),
            crypto_context,
        ))
    }

    /// Reads all values of column `i`.
    pub fn read_column(&self, i: usize) -> Result<ColumnValues> {
        let column = self.column_chunk(i)?;
        let mut page_reader = self.get_column_page_reader(i)?;
        let physical_type = self.schema.column(i).physical_type();
        let num_values = column
            .meta_data
            .as_ref()
            .map(|m| m.num_values)
            .unwrap_or_default();

        let mut values = ColumnValues::empty(physical_type);
        while let Some(page) = page_reader.get_next_page()? {
            match page {
                Page::Data {
                    buf, num_values, ..
                } => {
                    values.extend(decode_plain(physical_type, &buf, num_values as usize)?)?;
                }
                Page::Dictionary { .. } => {
                    return Err(general_err!(
                        "dictionary-encoded columns are not supported by this reader"
                    ));
                }
            }
        }
        if values.len() as i64 != num_values {
            return Err(general_err!(
                "column {} holds {} values, metadata promises {}",
                i,
                values.len(),
                num_values
            ));
        }
        Ok(values)
    }
}

/// Reads the pages of one column chunk sequentially, decrypting page headers
/// and bodies when the chunk is encrypted.
///
/// Data page ordinals reset to zero at the start of every column chunk. The
/// dictionary page, when present, is the first page of the chunk and does not
/// consume a data page ordinal; at most one is permitted.
pub struct SerializedPageReader {
    buf: Bytes,
    offset: usize,
    total_num_values: i64,
    seen_num_values: i64,
    expect_dictionary: bool,
    page_ordinal: usize,
    crypto_context: Option<CryptoContext>,
}

impl SerializedPageReader {
    pub(crate) fn new(
        buf: Bytes,
        total_num_values: i64,
        has_dictionary: bool,
        crypto_context: Option<CryptoContext>,
    ) -> Self {
        Self {
            buf,
            offset: 0,
            total_num_values,
            seen_num_values: 0,
            expect_dictionary: has_dictionary,
            page_ordinal: 0,
            crypto_context,
        }
    }

    /// Parses the next page header, decrypting it when the chunk is
    /// encrypted.
    fn read_page_header(&mut self, dictionary: bool) -> Result<PageHeader> {
        let Some(context) = self.crypto_context.as_mut() else {
            let mut prot = ThriftSliceInputProtocol::new(&self.buf[self.offset..]);
            let header = PageHeader::read(&mut prot)?;
            self.offset = self.buf.len() - prot.as_slice().len();
            return Ok(header);
        };

        let aad = if dictionary {
            context.dictionary_page_header_aad()?
        } else {
            context.set_page_ordinal(self.page_ordinal)?;
            context.page_header_aad().to_vec()
        };

        if self.offset + 4 > self.buf.len() {
            return Err(eof_err!("unexpected end of column chunk"));
        }
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&self.buf[self.offset..self.offset + 4]);
        let frame_len = 4 + u32::from_le_bytes(len_bytes) as usize;
        if self.offset + frame_len > self.buf.len() {
            return Err(eof_err!("unexpected end of column chunk"));
        }
        let frame = &self.buf[self.offset..self.offset + frame_len];

        let decryptor = context.metadata_decryptor();
        decryptor.set_aad(aad);
        let header_bytes = decryptor.decrypt(frame)?;
        self.offset += frame_len;

        let mut prot = ThriftSliceInputProtocol::new(&header_bytes);
        PageHeader::read(&mut prot)
    }

    /// Reads and decrypts the page body described by `header`.
    fn read_page_body(&mut self, header: &PageHeader, dictionary: bool) -> Result<Vec<u8>> {
        let body_len = usize::try_from(header.compressed_page_size)
            .map_err(|_| general_err!("invalid page size"))?;
        if self.offset + body_len > self.buf.len() {
            return Err(eof_err!("unexpected end of column chunk"));
        }
        let body = &self.buf[self.offset..self.offset + body_len];
        self.offset += body_len;

        match self.crypto_context.as_mut() {
            None => Ok(body.to_vec()),
            Some(context) => {
                let aad = if dictionary {
                    context.dictionary_page_aad()?
                } else {
                    context.page_aad().to_vec()
                };
                let decryptor = context.data_decryptor();
                decryptor.set_aad(aad);
                decryptor.decrypt(body)
            }
        }
    }

    /// Returns the next page of the chunk, or `None` when all values have
    /// been read.
    pub fn get_next_page(&mut self) -> Result<Option<Page>> {
        if self.seen_num_values >= self.total_num_values || self.offset >= self.buf.len() {
            return Ok(None);
        }

        let dictionary = self.expect_dictionary;
        let header = self.read_page_header(dictionary)?;

        match header.page_type {
            PageType::DICTIONARY_PAGE => {
                if !dictionary {
                    return Err(general_err!(
                        "only one dictionary page is permitted per column chunk"
                    ));
                }
                let Some(dictionary_header) = header.dictionary_page_header.clone() else {
                    return Err(meta_err!("dictionary page without dictionary page header"));
                };
                let buf = self.read_page_body(&header, true)?;
                self.expect_dictionary = false;
                Ok(Some(Page::Dictionary {
                    buf,
                    num_values: dictionary_header.num_values as u32,
                    encoding: dictionary_header.encoding,
                }))
            }
            PageType::DATA_PAGE => {
                if dictionary {
                    return Err(meta_err!(
                        "column chunk promises a dictionary page but starts with a data page"
                    ));
                }
                let Some(data_header) = header.data_page_header.clone() else {
                    return Err(meta_err!("data page without data page header"));
                };
                let buf = self.read_page_body(&header, false)?;
                self.page_ordinal += 1;
                self.seen_num_values += data_header.num_values as i64;
                Ok(Some(Page::Data {
                    buf,
                    num_values: data_header.num_values as u32,
                    encoding: data_header.encoding,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::Cipher;
    use crate::encryption::decrypt::{FileDecryptionProperties, FileDecryptor};
    use crate::encryption::encrypt::{FileEncryptionProperties, FileEncryptor};
    use crate::encryption::page_encryptor::PageEncryptor;
    use crate::file::metadata::{ColumnCryptoMetaData, DataPageHeader, DictionaryPageHeader};
    use crate::schema::types::ColumnPath;

    /// Builds an encrypted column chunk holding a dictionary page followed by
    /// a data page, then reads it back through the page reader.
    #[test]
    fn test_dictionary_page_round_trip() {
        let footer_key = b"0123456789012345".to_vec();
        let properties = FileEncryptionProperties::builder(footer_key.clone())
            .build()
            .unwrap();
        let aad_file_unique = properties.aad_file_unique().to_vec();
        let file_encryptor = FileEncryptor::new(properties);

        let path = ColumnPath::from("x");
        let meta = file_encryptor
            .get_column_meta_encryptor(&path)
            .unwrap()
            .unwrap();
        let data = file_encryptor
            .get_column_data_encryptor(&path)
            .unwrap()
            .unwrap();
        let mut page_encryptor = PageEncryptor::new(meta, data, 0, 0);

        let mut chunk = Vec::new();

        let dictionary_body = page_encryptor.encrypt_page(b"dictionary!", true).unwrap();
        let dictionary_header = PageHeader {
            page_type: PageType::DICTIONARY_PAGE,
            uncompressed_page_size: 11,
            compressed_page_size: dictionary_body.len() as i32,
            data_page_header: None,
            dictionary_page_header: Some(DictionaryPageHeader {
                num_values: 3,
                encoding: Encoding::PLAIN,
            }),
        };
        let header_bytes = dictionary_header.to_bytes().unwrap();
        chunk.extend_from_slice(&page_encryptor.encrypt_page_header(&header_bytes, true).unwrap());
        chunk.extend_from_slice(&dictionary_body);

        let data_body = page_encryptor.encrypt_page(b"data page 0", false).unwrap();
        let data_header = PageHeader {
            page_type: PageType::DATA_PAGE,
            uncompressed_page_size: 11,
            compressed_page_size: data_body.len() as i32,
            data_page_header: Some(DataPageHeader {
                num_values: 7,
                encoding: Encoding::PLAIN,
            }),
            dictionary_page_header: None,
        };
        let header_bytes = data_header.to_bytes().unwrap();
        chunk.extend_from_slice(&page_encryptor.encrypt_page_header(&header_bytes, false).unwrap());
        chunk.extend_from_slice(&data_body);

        let decryption_properties = FileDecryptionProperties::builder()
            .with_footer_key(footer_key)
            .build()
            .unwrap();
        let file_decryptor = FileDecryptor::new(
            &decryption_properties,
            Cipher::AES_GCM_V1,
            None,
            aad_file_unique,
            vec![],
        )
        .unwrap();
        let context = CryptoContext::for_column(
            &file_decryptor,
            &ColumnCryptoMetaData::EncryptionWithFooterKey,
            0,
            0,
        )
        .unwrap();

        let mut reader = SerializedPageReader::new(Bytes::from(chunk), 7, true, Some(context));
        let page = reader.get_next_page().unwrap().unwrap();
        assert_eq!(
            page,
            Page::Dictionary {
                buf: b"dictionary!".to_vec(),
                num_values: 3,
                encoding: Encoding::PLAIN,
            }
        );
        let page = reader.get_next_page().unwrap().unwrap();
        assert_eq!(
            page,
            Page::Data {
                buf: b"data page 0".to_vec(),
                num_values: 7,
                encoding: Encoding::PLAIN,
            }
        );
        assert!(reader.get_next_page().unwrap().is_none());
    }
}
