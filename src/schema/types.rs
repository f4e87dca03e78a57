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

//! Column paths and schema descriptors.
//!
//! Schemas are flat: an ordered list of named leaf columns, each with a
//! physical type. Column paths are value types with structural equality and
//! ordering so they can serve directly as map keys for per-column properties.

use std::fmt;

use crate::basic::Type;
use crate::errors::{ParquetError, Result};

/// Path to a column within the schema.
///
/// Segments are compared lexicographically, segment by segment.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ColumnPath {
    parts: Vec<String>,
}

impl ColumnPath {
    /// Creates new column path from vector of field names.
    pub fn new(parts: Vec<String>) -> Self {
        ColumnPath { parts }
    }

    /// Returns string representation of this column path:
    /// segments joined by `.`.
    pub fn string(&self) -> String {
        self.parts.join(".")
    }

    /// Returns a slice of path segments.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }
}

impl fmt::Display for ColumnPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.string())
    }
}

impl From<Vec<String>> for ColumnPath {
    fn from(parts: Vec<String>) -> Self {
        ColumnPath { parts }
    }
}

impl From<&str> for ColumnPath {
    fn from(single_path: &str) -> Self {
        let parts = single_path.split('.').map(|s| s.to_string()).collect();
        ColumnPath { parts }
    }
}

impl From<String> for ColumnPath {
    fn from(single_path: String) -> Self {
        ColumnPath::from(single_path.as_str())
    }
}

/// Descriptor of a single leaf column: its path and physical type.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnDescriptor {
    path: ColumnPath,
    physical_type: Type,
}

impl ColumnDescriptor {
    /// Creates a descriptor for a leaf column.
    pub fn new(path: impl Into<ColumnPath>, physical_type: Type) -> Self {
        Self {
            path: path.into(),
            physical_type,
        }
    }

    /// Returns the column path of this descriptor.
    pub fn path(&self) -> &ColumnPath {
        &self.path
    }

    /// Returns the physical type of this column.
    pub fn physical_type(&self) -> Type {
        self.physical_type
    }
}

/// Descriptor of a flat schema: an ordered list of leaf columns.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaDescriptor {
    columns: Vec<ColumnDescriptor>,
}

impl SchemaDescriptor {
    /// Creates a schema descriptor from leaf column descriptors.
    ///
    /// Returns an error when two columns share a path.
    pub fn new(columns: Vec<ColumnDescriptor>) -> Result<Self> {
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.path() == column.path()) {
                return Err(general_err!(
                    "duplicate column path '{}' in schema",
                    column.path()
                ));
            }
        }
        Ok(Self { columns })
    }

    /// Returns the number of leaf columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Returns the descriptor of column `i`.
    pub fn column(&self, i: usize) -> &ColumnDescriptor {
        &self.columns[i]
    }

    /// Returns all column descriptors in schema order.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Returns the ordinal of the column with the given path, if any.
    pub fn index_of(&self, path: &ColumnPath) -> Option<usize> {
        self.columns.iter().position(|c| c.path() == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_path_from_str() {
        let path = ColumnPath::from("a.b.c");
        assert_eq!(path.parts(), &["a", "b", "c"]);
        assert_eq!(path.string(), "a.b.c");
    }

    #[test]
    fn test_column_path_ordering() {
        let a = ColumnPath::from("a.b");
        let b = ColumnPath::from("a.c");
        let c = ColumnPath::from("b");
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a, ColumnPath::new(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_schema_rejects_duplicate_paths() {
        let result = SchemaDescriptor::new(vec![
            ColumnDescriptor::new("x", Type::INT32),
            ColumnDescriptor::new("x", Type::DOUBLE),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_schema_index_of() {
        let schema = SchemaDescriptor::new(vec![
            ColumnDescriptor::new("bool_field", Type::BOOLEAN),
            ColumnDescriptor::new("int32_field", Type::INT32),
        ])
        .unwrap();
        assert_eq!(schema.index_of(&ColumnPath::from("int32_field")), Some(1));
        assert_eq!(schema.index_of(&ColumnPath::from("missing")), None);
    }
}
