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

//! Configuration and utilities for writing encrypted files.

use std::collections::BTreeMap;
use std::fmt::Formatter;
use std::sync::{Arc, OnceLock};

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::basic::Cipher;
use crate::encryption::ciphers::{AesEncryptor, NONCE_LEN};
use crate::encryption::modules::create_footer_aad;
use crate::errors::{ParquetError, Result};
use crate::schema::types::ColumnPath;

/// Length of the random per-file AAD component generated at write time.
pub const AAD_FILE_UNIQUE_LENGTH: usize = 8;

fn check_key_len(key: &[u8]) -> Result<()> {
    match key.len() {
        16 | 24 | 32 => Ok(()),
        len => Err(ParquetError::KeyLengthInvalid(len)),
    }
}

/// Encryption settings for a single column.
///
/// A column with properties but no explicit key is *encrypted with the footer
/// key*.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnEncryptionProperties {
    column_path: ColumnPath,
    encrypted: bool,
    key: Option<Vec<u8>>,
    key_metadata: Option<Vec<u8>>,
}

impl ColumnEncryptionProperties {
    /// Returns a builder for properties of the column at `path`.
    pub fn builder(path: impl Into<ColumnPath>) -> ColumnEncryptionPropertiesBuilder {
        ColumnEncryptionPropertiesBuilder::new(path.into())
    }

    /// Path of the column these properties apply to.
    pub fn column_path(&self) -> &ColumnPath {
        &self.column_path
    }

    /// Whether the column is encrypted at all.
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Whether the column is encrypted with the footer key rather than a
    /// column-specific one.
    pub fn is_encrypted_with_footer_key(&self) -> bool {
        self.encrypted && self.key.is_none()
    }

    /// The column-specific key, if one was configured.
    pub fn key(&self) -> Option<&[u8]> {
        self.key.as_deref()
    }

    /// Key retrieval metadata stored in the file for this column.
    pub fn key_metadata(&self) -> Option<&[u8]> {
        self.key_metadata.as_deref()
    }
}

/// Builder for [`ColumnEncryptionProperties`].
pub struct ColumnEncryptionPropertiesBuilder {
    column_path: ColumnPath,
    key: Option<Vec<u8>>,
    key_metadata: Option<Vec<u8>>,
    key_id: Option<String>,
}

impl ColumnEncryptionPropertiesBuilder {
    /// Creates a builder for an encrypted column.
    pub fn new(column_path: ColumnPath) -> Self {
        Self {
            column_path,
            key: None,
            key_metadata: None,
            key_id: None,
        }
    }

    /// Sets a column-specific key. Without one the column is encrypted with
    /// the footer key. An empty key is treated as not set.
    pub fn with_key(mut self, key: Vec<u8>) -> Self {
        if !key.is_empty() {
            self.key = Some(key);
        }
        self
    }

    /// Sets key retrieval metadata. Use either this or [`Self::with_key_id`],
    /// not both.
    pub fn with_key_metadata(mut self, key_metadata: Vec<u8>) -> Self {
        if !key_metadata.is_empty() {
            self.key_metadata = Some(key_metadata);
        }
        self
    }

    /// Sets key retrieval metadata from a string identifier (stored as its
    /// UTF-8 bytes). Use either this or [`Self::with_key_metadata`], not both.
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        let key_id = key_id.into();
        if !key_id.is_empty() {
            self.key_id = Some(key_id);
        }
        self
    }

    /// Finalizes and validates the properties.
    pub fn build(self) -> Result<ColumnEncryptionProperties> {
        if let Some(key) = self.key.as_deref() {
            check_key_len(key)?;
        }
        if self.key_metadata.is_some() && self.key_id.is_some() {
            return Err(config_err!(
                "column '{}' sets both key metadata and key id",
                self.column_path
            ));
        }
        if self.key.is_none() && (self.key_metadata.is_some() || self.key_id.is_some()) {
            return Err(config_err!(
                "column '{}' sets key metadata but no key",
                self.column_path
            ));
        }
        let key_metadata = self
            .key_metadata
            .or_else(|| self.key_id.map(|id| id.into_bytes()));
        Ok(ColumnEncryptionProperties {
            column_path: self.column_path,
            encrypted: true,
            key: self.key,
            key_metadata,
        })
    }
}

/// File-level encryption settings.
///
/// Built once per file: building generates the random `aad_file_unique`, so a
/// properties instance must not be shared between files (spec: two files
/// written with the same configuration still get distinct file AADs).
///
/// # Example
///
/// ```
/// # use parquet_encryption::encryption::encrypt::{
/// #     ColumnEncryptionProperties, FileEncryptionProperties,
/// # };
/// let properties = FileEncryptionProperties::builder(b"0123456789012345".to_vec())
///     .with_footer_key_id("kf")
///     .with_column_properties(vec![
///         ColumnEncryptionProperties::builder("double_field")
///             .with_key(b"1234567890123450".to_vec())
///             .with_key_id("kc1")
///             .build()?,
///     ])?
///     .build()?;
/// # Ok::<(), parquet_encryption::errors::ParquetError>(())
/// ```
#[derive(Clone, PartialEq)]
pub struct FileEncryptionProperties {
    cipher: Cipher,
    footer_key: Vec<u8>,
    footer_key_metadata: Option<Vec<u8>>,
    encrypted_footer: bool,
    aad_prefix: Option<Vec<u8>>,
    store_aad_prefix: bool,
    aad_file_unique: Vec<u8>,
    file_aad: Vec<u8>,
    column_properties: BTreeMap<ColumnPath, ColumnEncryptionProperties>,
}

impl std::fmt::Debug for FileEncryptionProperties {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "FileEncryptionProperties {{ }}")
    }
}

impl FileEncryptionProperties {
    /// Returns a builder using `footer_key` to encrypt (or sign) the footer.
    pub fn builder(footer_key: Vec<u8>) -> EncryptionPropertiesBuilder {
        EncryptionPropertiesBuilder::new(footer_key)
    }

    /// The file-level cipher.
    pub fn cipher(&self) -> Cipher {
        self.cipher
    }

    /// Whether the footer is encrypted (as opposed to plaintext-with-trailer).
    pub fn encrypt_footer(&self) -> bool {
        self.encrypted_footer
    }

    pub(crate) fn footer_key(&self) -> &[u8] {
        &self.footer_key
    }

    /// Key retrieval metadata stored for the footer key.
    pub fn footer_key_metadata(&self) -> Option<&[u8]> {
        self.footer_key_metadata.as_deref()
    }

    /// The configured AAD prefix, if any.
    pub fn aad_prefix(&self) -> Option<&[u8]> {
        self.aad_prefix.as_deref()
    }

    /// Whether the AAD prefix is written into the file.
    pub fn store_aad_prefix_in_file(&self) -> bool {
        self.store_aad_prefix
    }

    /// The random per-file AAD component generated when the properties were
    /// built.
    pub fn aad_file_unique(&self) -> &[u8] {
        &self.aad_file_unique
    }

    /// The complete file AAD: `aad_prefix || aad_file_unique`.
    pub fn file_aad(&self) -> &[u8] {
        &self.file_aad
    }

    /// Per-column encryption properties, if any were configured. An empty map
    /// means uniform encryption: every column is encrypted with the footer
    /// key.
    pub fn column_properties(&self) -> &BTreeMap<ColumnPath, ColumnEncryptionProperties> {
        &self.column_properties
    }

    /// Whether the column at `path` is encrypted under this configuration.
    pub fn is_column_encrypted(&self, path: &ColumnPath) -> bool {
        if self.column_properties.is_empty() {
            return true;
        }
        self.column_properties.contains_key(path)
    }
}

/// Builder for [`FileEncryptionProperties`].
pub struct EncryptionPropertiesBuilder {
    cipher: Cipher,
    footer_key: Vec<u8>,
    footer_key_metadata: Option<Vec<u8>>,
    footer_key_id: Option<String>,
    encrypted_footer: bool,
    aad_prefix: Option<Vec<u8>>,
    disable_aad_prefix_storage: bool,
    column_properties: BTreeMap<ColumnPath, ColumnEncryptionProperties>,
}

impl EncryptionPropertiesBuilder {
    /// Creates a builder with the default cipher and an encrypted footer.
    pub fn new(footer_key: Vec<u8>) -> Self {
        Self {
            cipher: Cipher::default(),
            footer_key,
            footer_key_metadata: None,
            footer_key_id: None,
            encrypted_footer: true,
            aad_prefix: None,
            disable_aad_prefix_storage: false,
            column_properties: BTreeMap::new(),
        }
    }

    /// Selects the file cipher. Defaults to [`Cipher::AES_GCM_V1`].
    pub fn with_algorithm(mut self, cipher: Cipher) -> Self {
        self.cipher = cipher;
        self
    }

    /// Writes the footer in plaintext with a signing trailer instead of
    /// encrypting it, so legacy readers can still list the file.
    pub fn with_plaintext_footer(mut self) -> Self {
        self.encrypted_footer = false;
        self
    }

    /// Sets key retrieval metadata for the footer key. Use either this or
    /// [`Self::with_footer_key_id`], not both.
    pub fn with_footer_key_metadata(mut self, metadata: Vec<u8>) -> Self {
        if !metadata.is_empty() {
            self.footer_key_metadata = Some(metadata);
        }
        self
    }

    /// Sets footer key retrieval metadata from a string identifier. Use
    /// either this or [`Self::with_footer_key_metadata`], not both.
    pub fn with_footer_key_id(mut self, key_id: impl Into<String>) -> Self {
        let key_id = key_id.into();
        if !key_id.is_empty() {
            self.footer_key_id = Some(key_id);
        }
        self
    }

    /// Mixes extra identity bytes into the file AAD. An empty prefix is
    /// treated as not set. The prefix is stored in the file unless
    /// [`Self::with_disabled_aad_prefix_storage`] is also called.
    pub fn with_aad_prefix(mut self, aad_prefix: Vec<u8>) -> Self {
        if !aad_prefix.is_empty() {
            self.aad_prefix = Some(aad_prefix);
        }
        self
    }

    /// Skips storing the AAD prefix in the file, forcing readers to supply
    /// it. Requires an AAD prefix to have been set.
    pub fn with_disabled_aad_prefix_storage(mut self) -> Self {
        self.disable_aad_prefix_storage = true;
        self
    }

    /// Sets the list of encrypted columns and their properties. May only be
    /// called once. When set, columns not in the list are written in
    /// plaintext; when never called, every column is encrypted with the
    /// footer key.
    pub fn with_column_properties(
        mut self,
        columns: Vec<ColumnEncryptionProperties>,
    ) -> Result<Self> {
        if !self.column_properties.is_empty() {
            return Err(config_err!("column properties already set"));
        }
        for column in columns {
            let path = column.column_path().clone();
            if self.column_properties.insert(path.clone(), column).is_some() {
                return Err(config_err!("duplicate column properties for '{}'", path));
            }
        }
        Ok(self)
    }

    /// Finalizes the properties, generating the random `aad_file_unique`.
    pub fn build(self) -> Result<Arc<FileEncryptionProperties>> {
        check_key_len(&self.footer_key)?;
        if self.footer_key_metadata.is_some() && self.footer_key_id.is_some() {
            return Err(config_err!(
                "both footer key metadata and footer key id are set"
            ));
        }
        if self.disable_aad_prefix_storage && self.aad_prefix.is_none() {
            return Err(config_err!(
                "AAD prefix storage disabled but no AAD prefix is set"
            ));
        }

        let mut aad_file_unique = vec![0u8; AAD_FILE_UNIQUE_LENGTH];
        OsRng
            .try_fill_bytes(&mut aad_file_unique)
            .map_err(|e| general_err!("no secure random source available: {}", e))?;

        let file_aad = match self.aad_prefix.as_deref() {
            None => aad_file_unique.clone(),
            Some(prefix) => [prefix, aad_file_unique.as_slice()].concat(),
        };

        let footer_key_metadata = self
            .footer_key_metadata
            .or_else(|| self.footer_key_id.map(|id| id.into_bytes()));

        Ok(Arc::new(FileEncryptionProperties {
            cipher: self.cipher,
            footer_key: self.footer_key,
            footer_key_metadata,
            encrypted_footer: self.encrypted_footer,
            store_aad_prefix: self.aad_prefix.is_some() && !self.disable_aad_prefix_storage,
            aad_prefix: self.aad_prefix,
            aad_file_unique,
            file_aad,
            column_properties: self.column_properties,
        }))
    }
}

/// Per-module encryption handle: a cached cipher instance combined with the
/// key bytes, the file AAD and a mutable current module AAD.
#[derive(Debug, Clone)]
pub struct Encryptor {
    aes_encryptor: Arc<AesEncryptor>,
    key: Zeroizing<Vec<u8>>,
    file_aad: Vec<u8>,
    aad: Vec<u8>,
}

impl Encryptor {
    fn new(aes_encryptor: Arc<AesEncryptor>, key: Vec<u8>, file_aad: Vec<u8>, aad: Vec<u8>) -> Self {
        Self {
            aes_encryptor,
            key: Zeroizing::new(key),
            file_aad,
            aad,
        }
    }

    /// The file AAD this encryptor derives module AADs from.
    pub fn file_aad(&self) -> &[u8] {
        &self.file_aad
    }

    /// Replaces the current module AAD.
    pub fn set_aad(&mut self, aad: Vec<u8>) {
        self.aad = aad;
    }

    /// The current module AAD.
    pub fn aad(&self) -> &[u8] {
        &self.aad
    }

    /// Size difference between plaintext and framed ciphertext for this
    /// module class.
    pub fn ciphertext_size_delta(&self) -> usize {
        self.aes_encryptor.ciphertext_size_delta()
    }

    /// Encrypts `plaintext` under the current module AAD.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.aes_encryptor.encrypt(plaintext, &self.key, &self.aad)
    }

    /// Encrypts a footer with a caller-supplied nonce for the signed
    /// plaintext-footer path.
    pub fn signed_footer_encrypt(
        &self,
        footer: &[u8],
        nonce: &[u8; NONCE_LEN],
    ) -> Result<Vec<u8>> {
        self.aes_encryptor
            .signed_footer_encrypt(footer, &self.key, &self.aad, nonce)
    }
}

fn cipher_slot(key_len: usize) -> Result<usize> {
    match key_len {
        16 => Ok(0),
        24 => Ok(1),
        32 => Ok(2),
        len => Err(ParquetError::KeyLengthInvalid(len)),
    }
}

/// Vends per-module encryptors for one file being written.
///
/// Cipher instances are created lazily, one per (module class, key length)
/// pair, and shared by all encryptors handed out for the file.
#[derive(Debug)]
pub struct FileEncryptor {
    properties: Arc<FileEncryptionProperties>,
    meta_encryptors: [OnceLock<Arc<AesEncryptor>>; 3],
    data_encryptors: [OnceLock<Arc<AesEncryptor>>; 3],
}

impl FileEncryptor {
    /// Creates a file encryptor from built properties.
    pub fn new(properties: Arc<FileEncryptionProperties>) -> Self {
        Self {
            properties,
            meta_encryptors: Default::default(),
            data_encryptors: Default::default(),
        }
    }

    /// The properties this encryptor was created from.
    pub fn properties(&self) -> &Arc<FileEncryptionProperties> {
        &self.properties
    }

    /// The file AAD all module AADs derive from.
    pub fn file_aad(&self) -> &[u8] {
        self.properties.file_aad()
    }

    fn get_aes_encryptor(&self, key_len: usize, metadata: bool) -> Result<Arc<AesEncryptor>> {
        let idx = cipher_slot(key_len)?;
        let slots = if metadata {
            &self.meta_encryptors
        } else {
            &self.data_encryptors
        };
        match slots[idx].get() {
            Some(encryptor) => Ok(Arc::clone(encryptor)),
            None => {
                let encryptor =
                    Arc::new(AesEncryptor::new(self.properties.cipher(), key_len, metadata)?);
                Ok(Arc::clone(slots[idx].get_or_init(|| encryptor)))
            }
        }
    }

    /// Returns the encryptor for the footer module, with the footer AAD
    /// already set.
    pub fn get_footer_encryptor(&self) -> Result<Encryptor> {
        let footer_key = self.properties.footer_key().to_vec();
        let aes_encryptor = self.get_aes_encryptor(footer_key.len(), true)?;
        let aad = create_footer_aad(self.file_aad())?;
        Ok(Encryptor::new(
            aes_encryptor,
            footer_key,
            self.file_aad().to_vec(),
            aad,
        ))
    }

    /// Returns the encryptor used to sign a plaintext footer; see
    /// [`Encryptor::signed_footer_encrypt`].
    pub fn get_footer_signing_encryptor(&self) -> Result<Encryptor> {
        self.get_footer_encryptor()
    }

    fn get_column_encryptor(
        &self,
        column_path: &ColumnPath,
        metadata: bool,
    ) -> Result<Option<Encryptor>> {
        let key = if self.properties.column_properties().is_empty() {
            // uniform encryption: everything under the footer key
            self.properties.footer_key().to_vec()
        } else {
            match self.properties.column_properties().get(column_path) {
                None => return Ok(None),
                Some(column) => match column.key() {
                    Some(key) => key.to_vec(),
                    None => self.properties.footer_key().to_vec(),
                },
            }
        };
        let aes_encryptor = self.get_aes_encryptor(key.len(), metadata)?;
        Ok(Some(Encryptor::new(
            aes_encryptor,
            key,
            self.file_aad().to_vec(),
            Vec::new(),
        )))
    }

    /// Returns the metadata-class encryptor for a column, or `None` when the
    /// column is written in plaintext. The module AAD starts empty and is set
    /// per module by the caller.
    pub fn get_column_meta_encryptor(
        &self,
        column_path: &ColumnPath,
    ) -> Result<Option<Encryptor>> {
        self.get_column_encryptor(column_path, true)
    }

    /// Returns the data-class encryptor for a column, or `None` when the
    /// column is written in plaintext. In [`Cipher::AES_GCM_CTR_V1`] mode this
    /// one uses CTR.
    pub fn get_column_data_encryptor(
        &self,
        column_path: &ColumnPath,
    ) -> Result<Option<Encryptor>> {
        self.get_column_encryptor(column_path, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::ciphers::{AesDecryptor, SIZE_LEN, TAG_LEN};

    fn footer_key() -> Vec<u8> {
        b"0123456789012345".to_vec()
    }

    #[test]
    fn test_build_generates_distinct_file_aads() {
        let a = FileEncryptionProperties::builder(footer_key())
            .build()
            .unwrap();
        let b = FileEncryptionProperties::builder(footer_key())
            .build()
            .unwrap();
        assert_eq!(a.aad_file_unique().len(), AAD_FILE_UNIQUE_LENGTH);
        assert_ne!(a.aad_file_unique(), b.aad_file_unique());
    }

    #[test]
    fn test_file_aad_is_prefix_plus_unique() {
        let properties = FileEncryptionProperties::builder(footer_key())
            .with_aad_prefix(b"tester".to_vec())
            .build()
            .unwrap();
        let expected = [b"tester".as_slice(), properties.aad_file_unique()].concat();
        assert_eq!(properties.file_aad(), expected);
        assert!(properties.store_aad_prefix_in_file());
    }

    #[test]
    fn test_disable_aad_prefix_storage_requires_prefix() {
        let result = FileEncryptionProperties::builder(footer_key())
            .with_disabled_aad_prefix_storage()
            .build();
        assert!(matches!(result, Err(ParquetError::Config(_))));

        let properties = FileEncryptionProperties::builder(footer_key())
            .with_aad_prefix(b"tester".to_vec())
            .with_disabled_aad_prefix_storage()
            .build()
            .unwrap();
        assert!(!properties.store_aad_prefix_in_file());
    }

    #[test]
    fn test_footer_key_length_validation() {
        for key_len in [15, 17, 23, 25, 31, 33] {
            let result = FileEncryptionProperties::builder(vec![0u8; key_len]).build();
            assert!(matches!(result, Err(ParquetError::KeyLengthInvalid(_))));
        }
    }

    #[test]
    fn test_footer_key_metadata_and_id_are_exclusive() {
        let result = FileEncryptionProperties::builder(footer_key())
            .with_footer_key_metadata(b"kf".to_vec())
            .with_footer_key_id("kf")
            .build();
        assert!(matches!(result, Err(ParquetError::Config(_))));
    }

    #[test]
    fn test_footer_key_id_becomes_metadata() {
        let properties = FileEncryptionProperties::builder(footer_key())
            .with_footer_key_id("kf")
            .build()
            .unwrap();
        assert_eq!(properties.footer_key_metadata(), Some(b"kf".as_slice()));
    }

    #[test]
    fn test_column_properties_set_only_once() {
        let column = ColumnEncryptionProperties::builder("x").build().unwrap();
        let result = FileEncryptionProperties::builder(footer_key())
            .with_column_properties(vec![column.clone()])
            .unwrap()
            .with_column_properties(vec![column]);
        assert!(matches!(result, Err(ParquetError::Config(_))));
    }

    #[test]
    fn test_column_without_key_uses_footer_key() {
        let column = ColumnEncryptionProperties::builder("x").build().unwrap();
        assert!(column.is_encrypted_with_footer_key());

        let column = ColumnEncryptionProperties::builder("x")
            .with_key(b"1234567890123450".to_vec())
            .build()
            .unwrap();
        assert!(!column.is_encrypted_with_footer_key());
    }

    #[test]
    fn test_column_key_metadata_requires_key() {
        let result = ColumnEncryptionProperties::builder("x")
            .with_key_id("kc1")
            .build();
        assert!(matches!(result, Err(ParquetError::Config(_))));
    }

    #[test]
    fn test_uniform_encryption_encrypts_every_column() {
        let properties = FileEncryptionProperties::builder(footer_key())
            .build()
            .unwrap();
        assert!(properties.is_column_encrypted(&ColumnPath::from("anything")));

        let encryptor = FileEncryptor::new(properties);
        let column_encryptor = encryptor
            .get_column_data_encryptor(&ColumnPath::from("anything"))
            .unwrap();
        assert!(column_encryptor.is_some());
    }

    #[test]
    fn test_non_listed_column_is_plaintext() {
        let column = ColumnEncryptionProperties::builder("x")
            .with_key(b"1234567890123450".to_vec())
            .build()
            .unwrap();
        let properties = FileEncryptionProperties::builder(footer_key())
            .with_column_properties(vec![column])
            .unwrap()
            .build()
            .unwrap();
        assert!(!properties.is_column_encrypted(&ColumnPath::from("y")));

        let encryptor = FileEncryptor::new(properties);
        assert!(encryptor
            .get_column_meta_encryptor(&ColumnPath::from("y"))
            .unwrap()
            .is_none());
        assert!(encryptor
            .get_column_meta_encryptor(&ColumnPath::from("x"))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_footer_encryptor_round_trip() {
        let properties = FileEncryptionProperties::builder(footer_key())
            .build()
            .unwrap();
        let file_encryptor = FileEncryptor::new(Arc::clone(&properties));
        let footer_encryptor = file_encryptor.get_footer_encryptor().unwrap();

        let encrypted = footer_encryptor.encrypt(b"footer contents").unwrap();
        let decryptor = AesDecryptor::new(Cipher::AES_GCM_V1, 16, true).unwrap();
        let decrypted = decryptor
            .decrypt(&encrypted, &footer_key(), footer_encryptor.aad())
            .unwrap();
        assert_eq!(decrypted, b"footer contents");
    }

    #[test]
    fn test_ctr_mode_data_encryptor_has_no_tag() {
        let properties = FileEncryptionProperties::builder(footer_key())
            .with_algorithm(Cipher::AES_GCM_CTR_V1)
            .build()
            .unwrap();
        let file_encryptor = FileEncryptor::new(properties);
        let data = file_encryptor
            .get_column_data_encryptor(&ColumnPath::from("x"))
            .unwrap()
            .unwrap();
        let meta = file_encryptor
            .get_column_meta_encryptor(&ColumnPath::from("x"))
            .unwrap()
            .unwrap();
        assert_eq!(
            meta.ciphertext_size_delta() - data.ciphertext_size_delta(),
            TAG_LEN
        );
        assert_eq!(data.ciphertext_size_delta(), SIZE_LEN + 12);
    }
}
