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

//! Footer parsing with encryption dispatch.
//!
//! The trailing magic selects one of two layouts:
//!
//! * `PAR1` — the footer metadata is stored in plaintext. If it declares an
//!   encryption algorithm the file is *plaintext-footer encrypted*: column
//!   data is encrypted and the footer carries a 28-byte `nonce || tag`
//!   trailer signing the metadata bytes.
//! * `PARE` — the footer itself is encrypted: a plaintext
//!   [`FileCryptoMetaData`] is followed by the AEAD-framed footer.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::encryption::ciphers::{NONCE_LEN, TAG_LEN};
use crate::encryption::decrypt::{FileDecryptionProperties, FileDecryptor};
use crate::errors::{ParquetError, Result};
use crate::file::metadata::{
    decrypt_column_metadata, EncryptionAlgorithm, FileCryptoMetaData, FileMetaData,
    ParquetMetaData,
};
use crate::file::reader::ChunkReader;
use crate::file::{FOOTER_SIZE, PARQUET_MAGIC, PARQUET_MAGIC_ENCRYPTED_FOOTER};
use crate::thrift::ThriftSliceInputProtocol;

/// Read this much of the file tail in one request, to usually cover the whole
/// footer without a second read.
const DEFAULT_FOOTER_READ_SIZE: u64 = 64 * 1024;

/// Length of the signing trailer of a plaintext footer.
const SIGNING_TRAILER_LEN: usize = NONCE_LEN + TAG_LEN;

/// Reads and parses the footer of a file, establishing decryption state when
/// the file is encrypted.
///
/// `decryption_properties` may be `None` for unencrypted files; opening an
/// encrypted file without properties fails with
/// [`ParquetError::NoDecryptionProperties`].
pub fn parse_metadata<R: ChunkReader>(
    chunk_reader: &R,
    decryption_properties: Option<&Arc<FileDecryptionProperties>>,
) -> Result<ParquetMetaData> {
    let file_size = chunk_reader.len();
    if file_size < FOOTER_SIZE as u64 {
        return Err(corrupt_footer_err!(
            "file of {} bytes is smaller than the file footer",
            file_size
        ));
    }

    let footer_read_size = file_size.min(DEFAULT_FOOTER_READ_SIZE);
    let tail = chunk_reader.get_bytes(file_size - footer_read_size, footer_read_size as usize)?;
    let magic = &tail[tail.len() - 4..];
    if magic != PARQUET_MAGIC && magic != PARQUET_MAGIC_ENCRYPTED_FOOTER {
        return Err(corrupt_footer_err!("invalid magic {:?}", magic));
    }

    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&tail[tail.len() - FOOTER_SIZE..tail.len() - 4]);
    let metadata_len = u32::from_le_bytes(len_bytes) as u64;

    if metadata_len + FOOTER_SIZE as u64 > file_size {
        return Err(corrupt_footer_err!(
            "metadata length of {} bytes overflows a file of {} bytes",
            metadata_len,
            file_size
        ));
    }

    // slice the metadata out of the tail when it is fully covered, otherwise
    // issue a fresh read
    let metadata_len = metadata_len as usize;
    let metadata_bytes = if footer_read_size as usize >= metadata_len + FOOTER_SIZE {
        let end = tail.len() - FOOTER_SIZE;
        tail.slice(end - metadata_len..end)
    } else {
        chunk_reader.get_bytes(file_size - FOOTER_SIZE as u64 - metadata_len as u64, metadata_len)?
    };

    if magic == PARQUET_MAGIC {
        parse_plaintext_footer(&metadata_bytes, decryption_properties)
    } else {
        parse_encrypted_footer(&metadata_bytes, decryption_properties)
    }
}

/// Reconciles the AAD prefix stored in the file with the caller-supplied one
/// and returns the final prefix.
fn resolve_aad_prefix(
    algorithm: &EncryptionAlgorithm,
    properties: &FileDecryptionProperties,
) -> Result<Vec<u8>> {
    let mut aad_prefix = properties.aad_prefix().map(|p| p.to_vec());

    if let Some(file_prefix) = algorithm.aad_prefix() {
        if let Some(supplied) = aad_prefix.as_deref() {
            if supplied != file_prefix {
                return Err(ParquetError::AadPrefixMismatch);
            }
        }
        aad_prefix = Some(file_prefix.to_vec());
    }
    if algorithm.supply_aad_prefix() && aad_prefix.is_none() {
        return Err(ParquetError::AadPrefixMissing);
    }

    let aad_prefix = aad_prefix.unwrap_or_default();
    if !aad_prefix.is_empty() {
        if let Some(verifier) = properties.aad_prefix_verifier() {
            verifier.check(&aad_prefix)?;
        }
    }
    Ok(aad_prefix)
}

fn get_file_decryptor(
    algorithm: &EncryptionAlgorithm,
    footer_key_metadata: Option<&[u8]>,
    properties: &Arc<FileDecryptionProperties>,
) -> Result<FileDecryptor> {
    let aad_prefix = resolve_aad_prefix(algorithm, properties)?;
    let aad_file_unique = algorithm
        .aad_file_unique()
        .ok_or_else(|| meta_err!("AAD unique file identifier is not set"))?
        .to_vec();
    FileDecryptor::new(
        properties,
        algorithm.cipher(),
        footer_key_metadata,
        aad_file_unique,
        aad_prefix,
    )
}

fn parse_plaintext_footer(
    metadata_bytes: &Bytes,
    decryption_properties: Option<&Arc<FileDecryptionProperties>>,
) -> Result<ParquetMetaData> {
    let mut prot = ThriftSliceInputProtocol::new(metadata_bytes);
    let mut file_metadata = FileMetaData::read(&mut prot)?;
    let consumed_len = metadata_bytes.len() - prot.as_slice().len();

    let Some(algorithm) = file_metadata.encryption_algorithm.clone() else {
        // file is not encrypted at all
        return Ok(ParquetMetaData::new(file_metadata, None));
    };
    debug!("file has a plaintext footer with encrypted columns");

    let Some(properties) = decryption_properties else {
        return Err(ParquetError::NoDecryptionProperties);
    };

    let file_decryptor = get_file_decryptor(
        &algorithm,
        file_metadata.footer_signing_key_metadata.as_deref(),
        properties,
    )?;

    let trailer_len = metadata_bytes.len() - consumed_len;
    if properties.check_plaintext_footer_integrity() {
        if trailer_len != SIGNING_TRAILER_LEN {
            return Err(ParquetError::FooterSignatureInvalid);
        }
        file_decryptor.verify_plaintext_footer_signature(metadata_bytes)?;
    } else if trailer_len != SIGNING_TRAILER_LEN {
        warn!(
            trailer_len,
            "plaintext footer carries no signing trailer; integrity not verified"
        );
    }

    decrypt_column_metadata(&mut file_metadata, &file_decryptor)?;
    Ok(ParquetMetaData::new(
        file_metadata,
        Some(Arc::new(file_decryptor)),
    ))
}

fn parse_encrypted_footer(
    footer_bytes: &Bytes,
    decryption_properties: Option<&Arc<FileDecryptionProperties>>,
) -> Result<ParquetMetaData> {
    debug!("file has an encrypted footer");
    let Some(properties) = decryption_properties else {
        return Err(ParquetError::NoDecryptionProperties);
    };

    let mut prot = ThriftSliceInputProtocol::new(footer_bytes);
    let file_crypto_metadata = FileCryptoMetaData::read(&mut prot)?;

    let file_decryptor = get_file_decryptor(
        &file_crypto_metadata.encryption_algorithm,
        file_crypto_metadata.key_metadata.as_deref(),
        properties,
    )?;

    // the encrypted footer frame follows the crypto metadata
    let footer_decryptor = file_decryptor.get_footer_decryptor()?;
    let decrypted = footer_decryptor
        .decrypt(prot.as_slice())
        .map_err(|_| aead_err!("provided footer key and AAD were unable to decrypt the footer"))?;

    let mut prot = ThriftSliceInputProtocol::new(&decrypted);
    let mut file_metadata = FileMetaData::read(&mut prot)?;

    decrypt_column_metadata(&mut file_metadata, &file_decryptor)?;
    Ok(ParquetMetaData::new(
        file_metadata,
        Some(Arc::new(file_decryptor)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_small_file() {
        let bytes = Bytes::from_static(b"PAR1");
        let result = parse_metadata(&bytes, None);
        assert!(matches!(result, Err(ParquetError::CorruptFooter(_))));
    }

    #[test]
    fn test_bad_magic() {
        let bytes = Bytes::from_static(b"somethingPARX");
        let result = parse_metadata(&bytes, None);
        assert!(matches!(result, Err(ParquetError::CorruptFooter(_))));
    }

    #[test]
    fn test_metadata_length_overflow() {
        let mut data = Vec::new();
        data.extend_from_slice(&100u32.to_le_bytes());
        data.extend_from_slice(&PARQUET_MAGIC);
        let result = parse_metadata(&Bytes::from(data), None);
        assert!(matches!(result, Err(ParquetError::CorruptFooter(_))));
    }

    #[test]
    fn test_garbage_metadata() {
        let mut data = vec![0xFFu8; 32];
        data.extend_from_slice(&32u32.to_le_bytes());
        data.extend_from_slice(&PARQUET_MAGIC);
        let result = parse_metadata(&Bytes::from(data), None);
        assert!(result.is_err());
    }
}
