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

//! Module AAD construction.
//!
//! Each independently encrypted unit of a file (a module) is authenticated
//! against a deterministic byte string: the file AAD, the module type tag, and
//! the ordinals identifying the module's position. The layout must be
//! byte-identical between write and read or GCM verification fails.

use crate::errors::{ParquetError, Result};

/// Module types of independently encrypted file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleType {
    /// File footer metadata
    Footer = 0,
    /// Column chunk metadata
    ColumnMetaData = 1,
    /// Data page body
    DataPage = 2,
    /// Dictionary page body
    DictionaryPage = 3,
    /// Data page header
    DataPageHeader = 4,
    /// Dictionary page header
    DictionaryPageHeader = 5,
    /// Column index structure
    ColumnIndex = 6,
    /// Offset index structure
    OffsetIndex = 7,
}

const ORDINAL_LIMIT: usize = i16::MAX as usize;

fn ordinal_bytes(ordinal: usize, what: &str) -> Result<[u8; 2]> {
    if ordinal > ORDINAL_LIMIT {
        return Err(general_err!(
            "{} ordinal {} exceeds the 16-bit limit",
            what,
            ordinal
        ));
    }
    Ok((ordinal as u16).to_le_bytes())
}

/// Builds the module AAD for the given module position.
///
/// Layout: `file_aad || module_type || row_group(le16) || column(le16) ||
/// page(le16)`. The footer module carries no ordinals; page ordinals appear
/// only for data pages and data page headers (there is at most one dictionary
/// page per column chunk, so dictionary modules need none).
pub fn create_module_aad(
    file_aad: &[u8],
    module_type: ModuleType,
    row_group_ordinal: usize,
    column_ordinal: usize,
    page_ordinal: Option<usize>,
) -> Result<Vec<u8>> {
    if module_type == ModuleType::Footer {
        let mut aad = Vec::with_capacity(file_aad.len() + 1);
        aad.extend_from_slice(file_aad);
        aad.push(module_type as u8);
        return Ok(aad);
    }

    let row_group_bytes = ordinal_bytes(row_group_ordinal, "row group")?;
    let column_bytes = ordinal_bytes(column_ordinal, "column")?;

    if module_type != ModuleType::DataPage && module_type != ModuleType::DataPageHeader {
        let mut aad = Vec::with_capacity(file_aad.len() + 5);
        aad.extend_from_slice(file_aad);
        aad.push(module_type as u8);
        aad.extend_from_slice(&row_group_bytes);
        aad.extend_from_slice(&column_bytes);
        return Ok(aad);
    }

    let page_ordinal =
        page_ordinal.ok_or_else(|| general_err!("page ordinal must be set for data pages"))?;
    let page_bytes = ordinal_bytes(page_ordinal, "page")?;

    let mut aad = Vec::with_capacity(file_aad.len() + 7);
    aad.extend_from_slice(file_aad);
    aad.push(module_type as u8);
    aad.extend_from_slice(&row_group_bytes);
    aad.extend_from_slice(&column_bytes);
    aad.extend_from_slice(&page_bytes);
    Ok(aad)
}

/// Builds the AAD for the footer module.
pub fn create_footer_aad(file_aad: &[u8]) -> Result<Vec<u8>> {
    create_module_aad(file_aad, ModuleType::Footer, 0, 0, None)
}

/// Replaces the page ordinal in a previously built data page (or data page
/// header) AAD, avoiding reconstruction when iterating pages within a column
/// chunk.
pub fn quick_update_page_aad(aad: &mut [u8], new_page_ordinal: usize) -> Result<()> {
    let page_bytes = ordinal_bytes(new_page_ordinal, "page")?;
    let len = aad.len();
    if len < 2 {
        return Err(general_err!("AAD buffer too short to hold a page ordinal"));
    }
    aad[len - 2..].copy_from_slice(&page_bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footer_aad_layout() {
        let aad = create_footer_aad(b"fileaad!").unwrap();
        assert_eq!(aad, b"fileaad!\x00");
    }

    #[test]
    fn test_data_page_aad_layout() {
        let aad =
            create_module_aad(b"fileaad!", ModuleType::DataPage, 1, 2, Some(3)).unwrap();
        let mut expected = b"fileaad!".to_vec();
        expected.push(2); // module type
        expected.extend_from_slice(&[1, 0]); // row group
        expected.extend_from_slice(&[2, 0]); // column
        expected.extend_from_slice(&[3, 0]); // page
        assert_eq!(aad, expected);
    }

    #[test]
    fn test_no_page_ordinal_for_non_page_modules() {
        for module_type in [
            ModuleType::ColumnMetaData,
            ModuleType::DictionaryPage,
            ModuleType::DictionaryPageHeader,
            ModuleType::ColumnIndex,
            ModuleType::OffsetIndex,
        ] {
            let aad = create_module_aad(b"f", module_type, 4, 5, Some(9)).unwrap();
            assert_eq!(aad.len(), 1 + 1 + 2 + 2);
            assert_eq!(aad[1], module_type as u8);
            assert_eq!(&aad[2..], &[4, 0, 5, 0]);
        }
    }

    #[test]
    fn test_page_ordinal_required_for_data_pages() {
        assert!(create_module_aad(b"f", ModuleType::DataPage, 0, 0, None).is_err());
        assert!(create_module_aad(b"f", ModuleType::DataPageHeader, 0, 0, None).is_err());
    }

    #[test]
    fn test_aad_is_pure_function_of_inputs() {
        let a = create_module_aad(b"abc", ModuleType::DataPageHeader, 7, 11, Some(13)).unwrap();
        let b = create_module_aad(b"abc", ModuleType::DataPageHeader, 7, 11, Some(13)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_quick_update_page_aad() {
        let mut aad =
            create_module_aad(b"fileaad!", ModuleType::DataPage, 1, 2, Some(0)).unwrap();
        let direct = create_module_aad(b"fileaad!", ModuleType::DataPage, 1, 2, Some(300)).unwrap();
        quick_update_page_aad(&mut aad, 300).unwrap();
        assert_eq!(aad, direct);
    }

    #[test]
    fn test_ordinal_overflow() {
        assert!(create_module_aad(b"f", ModuleType::DataPage, 40000, 0, Some(0)).is_err());
        assert!(create_module_aad(b"f", ModuleType::DataPage, 0, 0, Some(40000)).is_err());
        let mut aad = [0u8; 8];
        assert!(quick_update_page_aad(&mut aad, 40000).is_err());
    }
}
