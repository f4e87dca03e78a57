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

//! Writer properties.

use std::sync::Arc;

use crate::encryption::encrypt::FileEncryptionProperties;

/// Default maximum number of rows per data page.
pub const DEFAULT_DATA_PAGE_ROW_COUNT_LIMIT: usize = 20_000;

/// Configuration of the file writer.
#[derive(Clone, Debug, Default)]
pub struct WriterProperties {
    data_page_row_count_limit: Option<usize>,
    file_encryption_properties: Option<Arc<FileEncryptionProperties>>,
}

impl WriterProperties {
    /// Returns a builder.
    pub fn builder() -> WriterPropertiesBuilder {
        WriterPropertiesBuilder {
            properties: WriterProperties::default(),
        }
    }

    /// Maximum number of rows written per data page.
    pub fn data_page_row_count_limit(&self) -> usize {
        self.data_page_row_count_limit
            .unwrap_or(DEFAULT_DATA_PAGE_ROW_COUNT_LIMIT)
    }

    /// Encryption configuration, when the file is to be encrypted.
    pub fn file_encryption_properties(&self) -> Option<&Arc<FileEncryptionProperties>> {
        self.file_encryption_properties.as_ref()
    }
}

/// Builder for [`WriterProperties`].
pub struct WriterPropertiesBuilder {
    properties: WriterProperties,
}

impl WriterPropertiesBuilder {
    /// Limits the number of rows per data page. Columns with more rows are
    /// split into multiple pages.
    pub fn set_data_page_row_count_limit(mut self, limit: usize) -> Self {
        self.properties.data_page_row_count_limit = Some(limit.max(1));
        self
    }

    /// Encrypts the file with the given properties.
    pub fn with_file_encryption_properties(
        mut self,
        properties: Arc<FileEncryptionProperties>,
    ) -> Self {
        self.properties.file_encryption_properties = Some(properties);
        self
    }

    /// Finalizes the properties.
    pub fn build(self) -> WriterProperties {
        self.properties
    }
}
