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

//! Configuration and utilities for reading encrypted files.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Formatter;
use std::sync::Arc;
use std::sync::OnceLock;

use zeroize::Zeroizing;

use crate::basic::Cipher;
use crate::encryption::ciphers::{AesDecryptor, AesEncryptor, NONCE_LEN, TAG_LEN};
use crate::encryption::modules::{
    create_footer_aad, create_module_aad, quick_update_page_aad, ModuleType,
};
use crate::errors::{ParquetError, Result};
use crate::file::metadata::ColumnCryptoMetaData;
use crate::schema::types::ColumnPath;

/// Trait for retrieving an encryption key using the key's metadata.
///
/// The callback is invoked synchronously on the decryption thread. It may
/// block, but it must not re-enter the file reader that invoked it.
pub trait KeyRetriever: Send + Sync {
    /// Retrieve a decryption key given the key metadata stored in the file.
    fn retrieve_key(&self, key_metadata: &[u8]) -> Result<Vec<u8>>;
}

/// Simple [`KeyRetriever`] mapping string identifiers to keys.
///
/// The identifier is stored in the file as its UTF-8 bytes, typically via
/// `with_footer_key_id` / `with_key_id` on the encryption property builders.
#[derive(Debug, Default)]
pub struct StringKeyIdRetriever {
    keys: HashMap<String, Vec<u8>>,
}

impl StringKeyIdRetriever {
    /// Creates an empty retriever.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a key under a string identifier.
    pub fn put_key(&mut self, key_id: impl Into<String>, key: Vec<u8>) {
        self.keys.insert(key_id.into(), key);
    }
}

impl KeyRetriever for StringKeyIdRetriever {
    fn retrieve_key(&self, key_metadata: &[u8]) -> Result<Vec<u8>> {
        let key_id = std::str::from_utf8(key_metadata)
            .map_err(|_| general_err!("key metadata is not a valid utf8 identifier"))?;
        match self.keys.get(key_id) {
            Some(key) => Ok(key.clone()),
            None => Err(general_err!("no key found for id '{}'", key_id)),
        }
    }
}

/// Policy hook invoked with the final AAD prefix of a file being read.
///
/// Lets callers verify the identity of individual files, or collect prefixes
/// across a data set and later check for missing files.
pub trait AadPrefixVerifier: Send + Sync {
    /// Verifies the AAD prefix; an error aborts opening the file.
    fn check(&self, aad_prefix: &[u8]) -> Result<()>;
}

/// Decryption key for a single column, overriding any key metadata stored in
/// the file for that column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDecryptionProperties {
    column_path: ColumnPath,
    key: Option<Vec<u8>>,
}

impl ColumnDecryptionProperties {
    /// Returns a builder for properties of the column at `path`.
    pub fn builder(path: impl Into<ColumnPath>) -> ColumnDecryptionPropertiesBuilder {
        ColumnDecryptionPropertiesBuilder {
            column_path: path.into(),
            key: None,
        }
    }

    /// Path of the column these properties apply to.
    pub fn column_path(&self) -> &ColumnPath {
        &self.column_path
    }

    /// The explicit decryption key, if set.
    pub fn key(&self) -> Option<&[u8]> {
        self.key.as_deref()
    }
}

/// Builder for [`ColumnDecryptionProperties`].
pub struct ColumnDecryptionPropertiesBuilder {
    column_path: ColumnPath,
    key: Option<Vec<u8>>,
}

impl ColumnDecryptionPropertiesBuilder {
    /// Sets the explicit column key. An empty key is treated as not set.
    pub fn with_key(mut self, key: Vec<u8>) -> Self {
        if !key.is_empty() {
            self.key = Some(key);
        }
        self
    }

    /// Finalizes and validates the properties.
    pub fn build(self) -> Result<ColumnDecryptionProperties> {
        if let Some(key) = self.key.as_deref() {
            match key.len() {
                16 | 24 | 32 => {}
                len => return Err(ParquetError::KeyLengthInvalid(len)),
            }
        }
        Ok(ColumnDecryptionProperties {
            column_path: self.column_path,
            key: self.key,
        })
    }
}

/// File-level decryption settings: keys, the key retriever, and AAD
/// expectations.
///
/// # Example
///
/// Read a file with explicit keys:
///
/// ```
/// # use parquet_encryption::encryption::decrypt::{
/// #     ColumnDecryptionProperties, FileDecryptionProperties,
/// # };
/// let properties = FileDecryptionProperties::builder()
///     .with_footer_key(b"0123456789012345".to_vec())
///     .with_column_properties(vec![
///         ColumnDecryptionProperties::builder("double_field")
///             .with_key(b"1234567890123450".to_vec())
///             .build()?,
///     ])?
///     .build()?;
/// # Ok::<(), parquet_encryption::errors::ParquetError>(())
/// ```
///
/// Or with a key retriever, when the reader does not know up front which
/// columns are encrypted or which keys were used:
///
/// ```
/// # use std::sync::Arc;
/// # use parquet_encryption::encryption::decrypt::{
/// #     FileDecryptionProperties, StringKeyIdRetriever,
/// # };
/// let mut retriever = StringKeyIdRetriever::new();
/// retriever.put_key("kf", b"0123456789012345".to_vec());
/// retriever.put_key("kc1", b"1234567890123450".to_vec());
///
/// let properties = FileDecryptionProperties::builder()
///     .with_key_retriever(Arc::new(retriever))
///     .build()?;
/// # Ok::<(), parquet_encryption::errors::ParquetError>(())
/// ```
#[derive(Clone)]
pub struct FileDecryptionProperties {
    footer_key: Option<Vec<u8>>,
    key_retriever: Option<Arc<dyn KeyRetriever>>,
    check_plaintext_footer_integrity: bool,
    aad_prefix: Option<Vec<u8>>,
    aad_prefix_verifier: Option<Arc<dyn AadPrefixVerifier>>,
    column_properties: BTreeMap<ColumnPath, ColumnDecryptionProperties>,
}

impl std::fmt::Debug for FileDecryptionProperties {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "FileDecryptionProperties {{ }}")
    }
}

impl FileDecryptionProperties {
    /// Returns a new builder.
    pub fn builder() -> DecryptionPropertiesBuilder {
        DecryptionPropertiesBuilder::new()
    }

    /// The explicit footer key, if set.
    pub fn footer_key(&self) -> Option<&[u8]> {
        self.footer_key.as_deref()
    }

    /// The configured key retriever, if any.
    pub fn key_retriever(&self) -> Option<&Arc<dyn KeyRetriever>> {
        self.key_retriever.as_ref()
    }

    /// Whether plaintext footers have their signing trailer verified.
    /// Enabled by default.
    pub fn check_plaintext_footer_integrity(&self) -> bool {
        self.check_plaintext_footer_integrity
    }

    /// The expected AAD prefix, if supplied.
    pub fn aad_prefix(&self) -> Option<&[u8]> {
        self.aad_prefix.as_deref()
    }

    /// The configured AAD prefix verifier, if any.
    pub fn aad_prefix_verifier(&self) -> Option<&Arc<dyn AadPrefixVerifier>> {
        self.aad_prefix_verifier.as_ref()
    }

    /// The explicit decryption key for a column, if one was configured.
    pub fn column_key(&self, column_path: &ColumnPath) -> Option<&[u8]> {
        self.column_properties
            .get(column_path)
            .and_then(|c| c.key())
    }

    /// Resolves the footer key: the explicit key when present, else the
    /// retriever invoked with the stored key metadata.
    pub(crate) fn resolve_footer_key(&self, key_metadata: Option<&[u8]>) -> Result<Vec<u8>> {
        if let Some(key) = self.footer_key.as_ref() {
            return Ok(key.clone());
        }
        if let Some(retriever) = self.key_retriever.as_ref() {
            return retriever
                .retrieve_key(key_metadata.unwrap_or_default())
                .map_err(|_| ParquetError::KeyUnavailable(None));
        }
        Err(ParquetError::KeyUnavailable(None))
    }

    /// Resolves a column key per the documented order: explicit column
    /// properties first, then the retriever with the column's stored key
    /// metadata.
    pub(crate) fn resolve_column_key(
        &self,
        column_path: &ColumnPath,
        key_metadata: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        if let Some(key) = self.column_key(column_path) {
            return Ok(key.to_vec());
        }
        if let (Some(key_metadata), Some(retriever)) = (key_metadata, self.key_retriever.as_ref())
        {
            return retriever
                .retrieve_key(key_metadata)
                .map_err(|_| ParquetError::KeyUnavailable(Some(column_path.string())));
        }
        Err(ParquetError::KeyUnavailable(Some(column_path.string())))
    }
}

/// Builder for [`FileDecryptionProperties`].
pub struct DecryptionPropertiesBuilder {
    footer_key: Option<Vec<u8>>,
    key_retriever: Option<Arc<dyn KeyRetriever>>,
    check_plaintext_footer_integrity: bool,
    aad_prefix: Option<Vec<u8>>,
    aad_prefix_verifier: Option<Arc<dyn AadPrefixVerifier>>,
    column_properties: BTreeMap<ColumnPath, ColumnDecryptionProperties>,
}

impl Default for DecryptionPropertiesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DecryptionPropertiesBuilder {
    /// Creates a builder with signature verification enabled.
    pub fn new() -> Self {
        Self {
            footer_key: None,
            key_retriever: None,
            check_plaintext_footer_integrity: true,
            aad_prefix: None,
            aad_prefix_verifier: None,
            column_properties: BTreeMap::new(),
        }
    }

    /// Sets an explicit footer key, overriding any footer key metadata stored
    /// in the file. An empty key is treated as not set.
    pub fn with_footer_key(mut self, footer_key: Vec<u8>) -> Self {
        if !footer_key.is_empty() {
            self.footer_key = Some(footer_key);
        }
        self
    }

    /// Sets a key retriever invoked with stored key metadata when no explicit
    /// key is available.
    pub fn with_key_retriever(mut self, key_retriever: Arc<dyn KeyRetriever>) -> Self {
        self.key_retriever = Some(key_retriever);
        self
    }

    /// Sets explicit per-column keys. May only be called once. Explicit keys
    /// are checked before the retriever is consulted.
    pub fn with_column_properties(
        mut self,
        columns: Vec<ColumnDecryptionProperties>,
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

    /// Supplies the expected AAD prefix. Required when the file was encrypted
    /// with a prefix that was not stored; compared against the stored prefix
    /// otherwise.
    pub fn with_aad_prefix(mut self, aad_prefix: Vec<u8>) -> Self {
        if !aad_prefix.is_empty() {
            self.aad_prefix = Some(aad_prefix);
        }
        self
    }

    /// Sets a verifier invoked with the final AAD prefix.
    pub fn with_aad_prefix_verifier(mut self, verifier: Arc<dyn AadPrefixVerifier>) -> Self {
        self.aad_prefix_verifier = Some(verifier);
        self
    }

    /// Disables verification of the signing trailer of plaintext footers.
    pub fn with_disabled_footer_signature_verification(mut self) -> Self {
        self.check_plaintext_footer_integrity = false;
        self
    }

    /// Finalizes and validates the properties.
    pub fn build(self) -> Result<Arc<FileDecryptionProperties>> {
        if let Some(key) = self.footer_key.as_deref() {
            match key.len() {
                16 | 24 | 32 => {}
                len => return Err(ParquetError::KeyLengthInvalid(len)),
            }
        }
        if self.footer_key.is_none() && self.key_retriever.is_none() {
            return Err(config_err!(
                "either a footer key or a key retriever is required"
            ));
        }
        Ok(Arc::new(FileDecryptionProperties {
            footer_key: self.footer_key,
            key_retriever: self.key_retriever,
            check_plaintext_footer_integrity: self.check_plaintext_footer_integrity,
            aad_prefix: self.aad_prefix,
            aad_prefix_verifier: self.aad_prefix_verifier,
            column_properties: self.column_properties,
        }))
    }
}

/// Per-module decryption handle: a cached cipher instance combined with the
/// key bytes, the file AAD and a mutable current module AAD.
#[derive(Debug, Clone)]
pub struct Decryptor {
    aes_decryptor: Arc<AesDecryptor>,
    key: Zeroizing<Vec<u8>>,
    file_aad: Vec<u8>,
    aad: Vec<u8>,
}

impl Decryptor {
    fn new(aes_decryptor: Arc<AesDecryptor>, key: Vec<u8>, file_aad: Vec<u8>, aad: Vec<u8>) -> Self {
        Self {
            aes_decryptor,
            key: Zeroizing::new(key),
            file_aad,
            aad,
        }
    }

    /// The file AAD this decryptor derives module AADs from.
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

    /// Size difference between framed ciphertext and plaintext for this
    /// module class.
    pub fn ciphertext_size_delta(&self) -> usize {
        self.aes_decryptor.ciphertext_size_delta()
    }

    /// Decrypts a framed buffer under the current module AAD.
    pub fn decrypt(&self, length_and_ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.aes_decryptor
            .decrypt(length_and_ciphertext, &self.key, &self.aad)
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

/// Vends per-module decryptors for one file being read.
///
/// Holds the file AAD (built exactly once from `aad_prefix ||
/// aad_file_unique`), the resolved footer key, and lazily created cipher
/// instances, one per (module class, key length) pair.
#[derive(Debug)]
pub struct FileDecryptor {
    properties: Arc<FileDecryptionProperties>,
    cipher: Cipher,
    footer_key: Zeroizing<Vec<u8>>,
    file_aad: Vec<u8>,
    meta_decryptors: [OnceLock<Arc<AesDecryptor>>; 3],
    data_decryptors: [OnceLock<Arc<AesDecryptor>>; 3],
}

impl FileDecryptor {
    /// Creates a file decryptor. Resolves the footer key eagerly; an
    /// unresolvable footer key fails the open.
    pub(crate) fn new(
        properties: &Arc<FileDecryptionProperties>,
        cipher: Cipher,
        footer_key_metadata: Option<&[u8]>,
        aad_file_unique: Vec<u8>,
        aad_prefix: Vec<u8>,
    ) -> Result<Self> {
        let file_aad = [aad_prefix.as_slice(), aad_file_unique.as_slice()].concat();
        let footer_key = properties.resolve_footer_key(footer_key_metadata)?;
        match footer_key.len() {
            16 | 24 | 32 => {}
            len => return Err(ParquetError::KeyLengthInvalid(len)),
        }
        Ok(Self {
            properties: Arc::clone(properties),
            cipher,
            footer_key: Zeroizing::new(footer_key),
            file_aad,
            meta_decryptors: Default::default(),
            data_decryptors: Default::default(),
        })
    }

    /// The file AAD all module AADs derive from.
    pub fn file_aad(&self) -> &[u8] {
        &self.file_aad
    }

    /// The properties this decryptor was created from.
    pub fn properties(&self) -> &Arc<FileDecryptionProperties> {
        &self.properties
    }

    fn get_aes_decryptor(&self, key_len: usize, metadata: bool) -> Result<Arc<AesDecryptor>> {
        let idx = cipher_slot(key_len)?;
        let slots = if metadata {
            &self.meta_decryptors
        } else {
            &self.data_decryptors
        };
        match slots[idx].get() {
            Some(decryptor) => Ok(Arc::clone(decryptor)),
            None => {
                let decryptor = Arc::new(AesDecryptor::new(self.cipher, key_len, metadata)?);
                Ok(Arc::clone(slots[idx].get_or_init(|| decryptor)))
            }
        }
    }

    /// Returns the decryptor for the footer module, with the footer AAD
    /// already set.
    pub fn get_footer_decryptor(&self) -> Result<Decryptor> {
        let aes_decryptor = self.get_aes_decryptor(self.footer_key.len(), true)?;
        let aad = create_footer_aad(&self.file_aad)?;
        Ok(Decryptor::new(
            aes_decryptor,
            self.footer_key.to_vec(),
            self.file_aad.clone(),
            aad,
        ))
    }

    /// Returns a metadata-class decryptor using the footer key, for columns
    /// that are encrypted with the footer key. The module AAD starts empty.
    pub fn get_footer_decryptor_for_column_meta(&self) -> Result<Decryptor> {
        let aes_decryptor = self.get_aes_decryptor(self.footer_key.len(), true)?;
        Ok(Decryptor::new(
            aes_decryptor,
            self.footer_key.to_vec(),
            self.file_aad.clone(),
            Vec::new(),
        ))
    }

    /// Returns a data-class decryptor using the footer key, for columns that
    /// are encrypted with the footer key.
    pub fn get_footer_decryptor_for_column_data(&self) -> Result<Decryptor> {
        let aes_decryptor = self.get_aes_decryptor(self.footer_key.len(), false)?;
        Ok(Decryptor::new(
            aes_decryptor,
            self.footer_key.to_vec(),
            self.file_aad.clone(),
            Vec::new(),
        ))
    }

    fn get_column_decryptor(
        &self,
        column_path: &ColumnPath,
        key_metadata: Option<&[u8]>,
        metadata: bool,
    ) -> Result<Decryptor> {
        let key = self
            .properties
            .resolve_column_key(column_path, key_metadata)?;
        match key.len() {
            16 | 24 | 32 => {}
            len => return Err(ParquetError::KeyLengthInvalid(len)),
        }
        let aes_decryptor = self.get_aes_decryptor(key.len(), metadata)?;
        Ok(Decryptor::new(
            aes_decryptor,
            key,
            self.file_aad.clone(),
            Vec::new(),
        ))
    }

    /// Returns the metadata-class decryptor for a column encrypted with its
    /// own key.
    pub fn get_column_meta_decryptor(
        &self,
        column_path: &ColumnPath,
        key_metadata: Option<&[u8]>,
    ) -> Result<Decryptor> {
        self.get_column_decryptor(column_path, key_metadata, true)
    }

    /// Returns the data-class decryptor for a column encrypted with its own
    /// key.
    pub fn get_column_data_decryptor(
        &self,
        column_path: &ColumnPath,
        key_metadata: Option<&[u8]>,
    ) -> Result<Decryptor> {
        self.get_column_decryptor(column_path, key_metadata, false)
    }

    /// Verifies the signing trailer of a plaintext footer.
    ///
    /// `plaintext_footer` is the stored footer: the serialized metadata
    /// followed by `nonce(12) || tag(16)`.
    pub fn verify_plaintext_footer_signature(&self, plaintext_footer: &[u8]) -> Result<()> {
        if plaintext_footer.len() < NONCE_LEN + TAG_LEN {
            return Err(ParquetError::FooterSignatureInvalid);
        }
        let metadata_len = plaintext_footer.len() - NONCE_LEN - TAG_LEN;
        let metadata = &plaintext_footer[..metadata_len];
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&plaintext_footer[metadata_len..metadata_len + NONCE_LEN]);
        let tag = &plaintext_footer[metadata_len + NONCE_LEN..];

        let aad = create_footer_aad(&self.file_aad)?;
        let signing_encryptor = AesEncryptor::new(self.cipher, self.footer_key.len(), true)?;
        let signed =
            signing_encryptor.signed_footer_encrypt(metadata, &self.footer_key, &aad, &nonce)?;

        let computed_tag = &signed[signed.len() - TAG_LEN..];
        if computed_tag != tag {
            return Err(ParquetError::FooterSignatureInvalid);
        }
        Ok(())
    }
}

/// Decryption context of one column chunk: the (metadata, data) decryptor
/// pair plus the current page AADs.
///
/// The page reader advances the page ordinal with [`Self::set_page_ordinal`],
/// which rewrites the ordinal bytes of the cached data page AADs in place.
#[derive(Debug, Clone)]
pub(crate) struct CryptoContext {
    row_group_ordinal: usize,
    column_ordinal: usize,
    data_decryptor: Decryptor,
    metadata_decryptor: Decryptor,
    page_aad: Vec<u8>,
    page_header_aad: Vec<u8>,
}

impl CryptoContext {
    /// Builds the context for a column chunk from its crypto metadata,
    /// resolving keys as needed.
    pub(crate) fn for_column(
        file_decryptor: &FileDecryptor,
        crypto_metadata: &ColumnCryptoMetaData,
        row_group_ordinal: usize,
        column_ordinal: usize,
    ) -> Result<Self> {
        let (data_decryptor, metadata_decryptor) = match crypto_metadata {
            ColumnCryptoMetaData::EncryptionWithFooterKey => (
                file_decryptor.get_footer_decryptor_for_column_data()?,
                file_decryptor.get_footer_decryptor_for_column_meta()?,
            ),
            ColumnCryptoMetaData::EncryptionWithColumnKey(column_key) => {
                let column_path = ColumnPath::new(column_key.path_in_schema.clone());
                let key_metadata = column_key.key_metadata.as_deref();
                (
                    file_decryptor.get_column_data_decryptor(&column_path, key_metadata)?,
                    file_decryptor.get_column_meta_decryptor(&column_path, key_metadata)?,
                )
            }
        };

        let file_aad = data_decryptor.file_aad().to_vec();
        let page_aad = create_module_aad(
            &file_aad,
            ModuleType::DataPage,
            row_group_ordinal,
            column_ordinal,
            Some(0),
        )?;
        let page_header_aad = create_module_aad(
            &file_aad,
            ModuleType::DataPageHeader,
            row_group_ordinal,
            column_ordinal,
            Some(0),
        )?;

        Ok(Self {
            row_group_ordinal,
            column_ordinal,
            data_decryptor,
            metadata_decryptor,
            page_aad,
            page_header_aad,
        })
    }

    /// Sets the ordinal of the data page about to be read, updating the
    /// cached page and page header AADs in place.
    pub(crate) fn set_page_ordinal(&mut self, page_ordinal: usize) -> Result<()> {
        quick_update_page_aad(&mut self.page_aad, page_ordinal)?;
        quick_update_page_aad(&mut self.page_header_aad, page_ordinal)?;
        Ok(())
    }

    pub(crate) fn page_aad(&self) -> &[u8] {
        &self.page_aad
    }

    pub(crate) fn page_header_aad(&self) -> &[u8] {
        &self.page_header_aad
    }

    /// AAD of the chunk's dictionary page; dictionary modules carry no page
    /// ordinal.
    pub(crate) fn dictionary_page_aad(&self) -> Result<Vec<u8>> {
        create_module_aad(
            self.data_decryptor.file_aad(),
            ModuleType::DictionaryPage,
            self.row_group_ordinal,
            self.column_ordinal,
            None,
        )
    }

    /// AAD of the chunk's dictionary page header.
    pub(crate) fn dictionary_page_header_aad(&self) -> Result<Vec<u8>> {
        create_module_aad(
            self.data_decryptor.file_aad(),
            ModuleType::DictionaryPageHeader,
            self.row_group_ordinal,
            self.column_ordinal,
            None,
        )
    }

    pub(crate) fn data_decryptor(&mut self) -> &mut Decryptor {
        &mut self.data_decryptor
    }

    pub(crate) fn metadata_decryptor(&mut self) -> &mut Decryptor {
        &mut self.metadata_decryptor
    }
}
