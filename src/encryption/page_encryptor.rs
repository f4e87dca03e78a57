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

//! Page-level encryption for the write path.

use crate::encryption::encrypt::Encryptor;
use crate::encryption::modules::{create_module_aad, ModuleType};
use crate::errors::{ParquetError, Result};

/// Encrypts the page headers and page bodies of one column chunk.
///
/// Page headers use the metadata-class encryptor, page bodies the data-class
/// one; the two differ in `AES_GCM_CTR_V1` mode. Data page ordinals start at
/// zero per column chunk and advance via [`Self::increment_page`]; the
/// dictionary page, when present, carries no page ordinal in its AAD.
#[derive(Debug)]
pub(crate) struct PageEncryptor {
    meta_encryptor: Encryptor,
    data_encryptor: Encryptor,
    row_group_ordinal: usize,
    column_ordinal: usize,
    page_ordinal: usize,
}

impl PageEncryptor {
    pub(crate) fn new(
        meta_encryptor: Encryptor,
        data_encryptor: Encryptor,
        row_group_ordinal: usize,
        column_ordinal: usize,
    ) -> Self {
        Self {
            meta_encryptor,
            data_encryptor,
            row_group_ordinal,
            column_ordinal,
            page_ordinal: 0,
        }
    }

    /// Advances to the next data page ordinal.
    pub(crate) fn increment_page(&mut self) {
        self.page_ordinal += 1;
    }

    fn module_aad(&self, module_type: ModuleType) -> Result<Vec<u8>> {
        let page_ordinal = match module_type {
            ModuleType::DataPage | ModuleType::DataPageHeader => Some(self.page_ordinal),
            _ => None,
        };
        create_module_aad(
            self.meta_encryptor.file_aad(),
            module_type,
            self.row_group_ordinal,
            self.column_ordinal,
            page_ordinal,
        )
    }

    /// Encrypts a serialized page header.
    pub(crate) fn encrypt_page_header(
        &mut self,
        header: &[u8],
        dictionary_page: bool,
    ) -> Result<Vec<u8>> {
        let module_type = if dictionary_page {
            ModuleType::DictionaryPageHeader
        } else {
            ModuleType::DataPageHeader
        };
        let aad = self.module_aad(module_type)?;
        self.meta_encryptor.set_aad(aad);
        self.meta_encryptor.encrypt(header)
    }

    /// Encrypts a page body.
    pub(crate) fn encrypt_page(&mut self, page: &[u8], dictionary_page: bool) -> Result<Vec<u8>> {
        let module_type = if dictionary_page {
            ModuleType::DictionaryPage
        } else {
            ModuleType::DataPage
        };
        let aad = self.module_aad(module_type)?;
        self.data_encryptor.set_aad(aad);
        self.data_encryptor.encrypt(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::decrypt::{CryptoContext, FileDecryptionProperties, FileDecryptor};
    use crate::encryption::encrypt::{FileEncryptionProperties, FileEncryptor};
    use crate::file::metadata::ColumnCryptoMetaData;
    use crate::schema::types::ColumnPath;

    #[test]
    fn test_page_encryptor_matches_crypto_context_aads() {
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
        let mut page_encryptor = PageEncryptor::new(meta, data, 0, 2);

        let header = page_encryptor.encrypt_page_header(b"header", false).unwrap();
        let body = page_encryptor.encrypt_page(b"body", false).unwrap();
        page_encryptor.increment_page();
        let header_1 = page_encryptor.encrypt_page_header(b"header", false).unwrap();

        let decryption_properties = FileDecryptionProperties::builder()
            .with_footer_key(footer_key)
            .build()
            .unwrap();
        let file_decryptor = FileDecryptor::new(
            &decryption_properties,
            Default::default(),
            None,
            aad_file_unique,
            vec![],
        )
        .unwrap();
        let mut context = CryptoContext::for_column(
            &file_decryptor,
            &ColumnCryptoMetaData::EncryptionWithFooterKey,
            0,
            2,
        )
        .unwrap();

        context.set_page_ordinal(0).unwrap();
        let header_aad = context.page_header_aad().to_vec();
        let page_aad = context.page_aad().to_vec();
        {
            let decryptor = context.metadata_decryptor();
            decryptor.set_aad(header_aad);
            assert_eq!(decryptor.decrypt(&header).unwrap(), b"header");
        }
        {
            let decryptor = context.data_decryptor();
            decryptor.set_aad(page_aad);
            assert_eq!(decryptor.decrypt(&body).unwrap(), b"body");
        }

        context.set_page_ordinal(1).unwrap();
        let header_aad = context.page_header_aad().to_vec();
        let decryptor = context.metadata_decryptor();
        decryptor.set_aad(header_aad);
        assert_eq!(decryptor.decrypt(&header_1).unwrap(), b"header");
    }
}
