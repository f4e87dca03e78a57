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

//! Interop test driver.
//!
//! `encryption-interop write <dir>` produces one file per encryption
//! configuration, named `tester<N>.parquet.encrypted`; `encryption-interop
//! read <dir>` reads whichever of them exist and verifies the values. The
//! configurations cover: uniform footer-key encryption, per-column keys, the
//! plaintext-footer mode, an AAD prefix (stored and not stored), and the
//! AES_GCM_CTR_V1 cipher.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use parquet_encryption::basic::{Cipher, Type};
use parquet_encryption::encodings::ColumnValues;
use parquet_encryption::encryption::decrypt::{
    DecryptionPropertiesBuilder, FileDecryptionProperties, StringKeyIdRetriever,
};
use parquet_encryption::encryption::encrypt::{
    ColumnEncryptionProperties, EncryptionPropertiesBuilder, FileEncryptionProperties,
};
use parquet_encryption::errors::Result;
use parquet_encryption::file::properties::WriterProperties;
use parquet_encryption::file::serialized_reader::SerializedFileReader;
use parquet_encryption::file::writer::SerializedFileWriter;
use parquet_encryption::schema::types::{ColumnDescriptor, SchemaDescriptor};

const FOOTER_KEY: &[u8] = b"0123456789012345";
const COLUMN_KEY_1: &[u8] = b"1234567890123450";
const COLUMN_KEY_2: &[u8] = b"1234567890123451";
const AAD_PREFIX: &[u8] = b"tester";

const NUM_ROWS: usize = 500;

#[derive(Clone, Copy, ValueEnum)]
enum Command {
    /// Write the interop files
    Write,
    /// Read the interop files back and verify them
    Read,
}

#[derive(Parser)]
#[command(name = "encryption-interop")]
#[command(about = "Writes and reads encrypted interop test files")]
struct Args {
    #[arg(value_enum)]
    command: Command,
    /// Directory holding the interop files
    directory: PathBuf,
}

fn schema() -> Result<SchemaDescriptor> {
    SchemaDescriptor::new(vec![
        ColumnDescriptor::new("bool_field", Type::BOOLEAN),
        ColumnDescriptor::new("int32_field", Type::INT32),
        ColumnDescriptor::new("float_field", Type::FLOAT),
        ColumnDescriptor::new("double_field", Type::DOUBLE),
    ])
}

fn test_values() -> Vec<ColumnValues> {
    vec![
        ColumnValues::Boolean((0..NUM_ROWS).map(|i| i % 2 == 0).collect()),
        ColumnValues::Int32((0..NUM_ROWS as i32).collect()),
        ColumnValues::Float((0..NUM_ROWS).map(|i| i as f32 * 1.1).collect()),
        ColumnValues::Double((0..NUM_ROWS).map(|i| i as f64 * 1.1111111).collect()),
    ]
}

fn column_keys() -> Result<Vec<ColumnEncryptionProperties>> {
    Ok(vec![
        ColumnEncryptionProperties::builder("double_field")
            .with_key(COLUMN_KEY_1.to_vec())
            .with_key_id("kc1")
            .build()?,
        ColumnEncryptionProperties::builder("float_field")
            .with_key(COLUMN_KEY_2.to_vec())
            .with_key_id("kc2")
            .build()?,
    ])
}

fn footer_builder() -> EncryptionPropertiesBuilder {
    FileEncryptionProperties::builder(FOOTER_KEY.to_vec()).with_footer_key_id("kf")
}

/// One file per encryption configuration, matching the C++ interop suite.
fn encryption_configurations() -> Result<Vec<(usize, Arc<FileEncryptionProperties>)>> {
    Ok(vec![
        // 1: uniform encryption with the footer key
        (1, footer_builder().build()?),
        // 2: two columns with their own keys, footer encrypted
        (
            2,
            footer_builder()
                .with_column_properties(column_keys()?)?
                .build()?,
        ),
        // 3: as 2, with a plaintext footer
        (
            3,
            footer_builder()
                .with_column_properties(column_keys()?)?
                .with_plaintext_footer()
                .build()?,
        ),
        // 4: as 2, with an AAD prefix stored in the file
        (
            4,
            footer_builder()
                .with_column_properties(column_keys()?)?
                .with_aad_prefix(AAD_PREFIX.to_vec())
                .build()?,
        ),
        // 5: as 4, but the prefix is not stored and must be re-supplied
        (
            5,
            footer_builder()
                .with_column_properties(column_keys()?)?
                .with_aad_prefix(AAD_PREFIX.to_vec())
                .with_disabled_aad_prefix_storage()
                .build()?,
        ),
        // 6: as 2, with the AES_GCM_CTR_V1 cipher
        (
            6,
            footer_builder()
                .with_column_properties(column_keys()?)?
                .with_algorithm(Cipher::AES_GCM_CTR_V1)
                .build()?,
        ),
    ])
}

fn file_path(directory: &Path, configuration: usize) -> PathBuf {
    directory.join(format!("tester{configuration}.parquet.encrypted"))
}

fn write_files(directory: &Path) -> Result<()> {
    for (configuration, encryption_properties) in encryption_configurations()? {
        let path = file_path(directory, configuration);
        let file = File::create(&path)?;
        let properties = WriterProperties::builder()
            .set_data_page_row_count_limit(200)
            .with_file_encryption_properties(encryption_properties)
            .build();

        let mut writer = SerializedFileWriter::new(file, schema()?, properties)?;
        let mut row_group = writer.next_row_group()?;
        for column in test_values() {
            row_group.append_column(&column)?;
        }
        row_group.close()?;
        writer.close()?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn decryption_properties(configuration: usize) -> Result<Arc<FileDecryptionProperties>> {
    let mut retriever = StringKeyIdRetriever::new();
    retriever.put_key("kf", FOOTER_KEY.to_vec());
    retriever.put_key("kc1", COLUMN_KEY_1.to_vec());
    retriever.put_key("kc2", COLUMN_KEY_2.to_vec());

    let mut builder = DecryptionPropertiesBuilder::new().with_key_retriever(Arc::new(retriever));
    // configuration 5 does not store its AAD prefix; 4 stores it and the
    // supplied copy must match
    if configuration == 4 || configuration == 5 {
        builder = builder.with_aad_prefix(AAD_PREFIX.to_vec());
    }
    builder.build()
}

fn read_files(directory: &Path) -> Result<usize> {
    let mut verified = 0;
    for configuration in 1..=6 {
        let path = file_path(directory, configuration);
        if !path.exists() {
            println!("skipping {} (not present)", path.display());
            continue;
        }
        let file = File::open(&path)?;
        let reader = SerializedFileReader::new_with_decryption_properties(
            file,
            decryption_properties(configuration)?,
        )?;

        let expected = test_values();
        for row_group_index in 0..reader.num_row_groups() {
            let row_group = reader.get_row_group(row_group_index)?;
            for (column_index, expected_column) in expected.iter().enumerate() {
                let values = row_group.read_column(column_index)?;
                if &values != expected_column {
                    return Err(parquet_encryption::errors::ParquetError::General(format!(
                        "values of column {} in {} do not match",
                        column_index,
                        path.display()
                    )));
                }
            }
        }
        println!("verified {}", path.display());
        verified += 1;
    }
    Ok(verified)
}

fn main() -> ExitCode {
    let args = Args::parse();
    let result = match args.command {
        Command::Write => write_files(&args.directory),
        Command::Read => read_files(&args.directory).map(|verified| {
            println!("{verified} file(s) verified");
        }),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
