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

//! End-to-end tests for reading and writing encrypted files.

use std::fs::File;
use std::sync::Arc;

use bytes::Bytes;

use parquet_encryption::basic::{Cipher, Type};
use parquet_encryption::encodings::ColumnValues;
use parquet_encryption::encryption::decrypt::{
    ColumnDecryptionProperties, FileDecryptionProperties, StringKeyIdRetriever,
};
use parquet_encryption::encryption::encrypt::{
    ColumnEncryptionProperties, FileEncryptionProperties,
};
use parquet_encryption::errors::ParquetError;
use parquet_encryption::file::properties::WriterProperties;
use parquet_encryption::file::serialized_reader::SerializedFileReader;
use parquet_encryption::file::writer::SerializedFileWriter;
use parquet_encryption::schema::types::{ColumnDescriptor, SchemaDescriptor};

const FOOTER_KEY: &[u8] = b"0123456789012345";
const COLUMN_KEY_1: &[u8] = b"1234567890123450";
const COLUMN_KEY_2: &[u8] = b"1234567890123451";

const NUM_ROWS: usize = 500;

fn schema() -> SchemaDescriptor {
    SchemaDescriptor::new(vec![
        ColumnDescriptor::new("bool_field", Type::BOOLEAN),
        ColumnDescriptor::new("int32_field", Type::INT32),
        ColumnDescriptor::new("float_field", Type::FLOAT),
        ColumnDescriptor::new("double_field", Type::DOUBLE),
    ])
    .unwrap()
}

fn test_values() -> Vec<ColumnValues> {
    vec![
        ColumnValues::Boolean((0..NUM_ROWS).map(|i| i % 2 == 0).collect()),
        ColumnValues::Int32((0..NUM_ROWS as i32).collect()),
        ColumnValues::Float((0..NUM_ROWS).map(|i| i as f32 * 1.1).collect()),
        ColumnValues::Double((0..NUM_ROWS).map(|i| i as f64 * 1.1111111).collect()),
    ]
}

fn column_keys() -> Vec<ColumnEncryptionProperties> {
    vec![
        ColumnEncryptionProperties::builder("double_field")
            .with_key(COLUMN_KEY_1.to_vec())
            .with_key_id("kc1")
            .build()
            .unwrap(),
        ColumnEncryptionProperties::builder("float_field")
            .with_key(COLUMN_KEY_2.to_vec())
            .with_key_id("kc2")
            .build()
            .unwrap(),
    ]
}

/// Writes the four-column, 500-row test file into memory with the given
/// encryption configuration.
fn write_test_file(encryption: Option<Arc<FileEncryptionProperties>>) -> Bytes {
    let mut properties = WriterProperties::builder().set_data_page_row_count_limit(200);
    if let Some(encryption) = encryption {
        properties = properties.with_file_encryption_properties(encryption);
    }
    let mut out = Vec::new();
    let mut writer = SerializedFileWriter::new(&mut out, schema(), properties.build()).unwrap();
    let mut row_group = writer.next_row_group().unwrap();
    for column in test_values() {
        row_group.append_column(&column).unwrap();
    }
    row_group.close().unwrap();
    writer.close().unwrap();
    Bytes::from(out)
}

fn key_retriever() -> Arc<StringKeyIdRetriever> {
    let mut retriever = StringKeyIdRetriever::new();
    retriever.put_key("kf", FOOTER_KEY.to_vec());
    retriever.put_key("kc1", COLUMN_KEY_1.to_vec());
    retriever.put_key("kc2", COLUMN_KEY_2.to_vec());
    Arc::new(retriever)
}

fn retriever_properties() -> Arc<FileDecryptionProperties> {
    FileDecryptionProperties::builder()
        .with_key_retriever(key_retriever())
        .build()
        .unwrap()
}

/// Reads every column of every row group and compares with the test data.
fn verify_file(data: Bytes, decryption: Arc<FileDecryptionProperties>) {
    let reader = SerializedFileReader::new_with_decryption_properties(data, decryption).unwrap();
    let expected = test_values();
    assert_eq!(reader.num_row_groups(), 1);
    let row_group = reader.get_row_group(0).unwrap();
    assert_eq!(row_group.num_rows(), NUM_ROWS as i64);
    for (i, expected_column) in expected.iter().enumerate() {
        let values = row_group.read_column(i).unwrap();
        assert_eq!(&values, expected_column);
    }
}

fn uniform_encryption() -> Arc<FileEncryptionProperties> {
    FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_footer_key_id("kf")
        .build()
        .unwrap()
}

fn non_uniform_encryption() -> Arc<FileEncryptionProperties> {
    FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_footer_key_id("kf")
        .with_column_properties(column_keys())
        .unwrap()
        .build()
        .unwrap()
}

#[test]
fn test_uniform_encryption() {
    let data = write_test_file(Some(uniform_encryption()));
    verify_file(data, retriever_properties());
}

#[test]
fn test_uniform_encryption_with_explicit_footer_key() {
    let data = write_test_file(Some(uniform_encryption()));
    let decryption = FileDecryptionProperties::builder()
        .with_footer_key(FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    verify_file(data, decryption);
}

#[test]
fn test_non_uniform_encryption() {
    let data = write_test_file(Some(non_uniform_encryption()));
    verify_file(data, retriever_properties());
}

#[test]
fn test_non_uniform_encryption_with_explicit_column_keys() {
    let data = write_test_file(Some(non_uniform_encryption()));
    let decryption = FileDecryptionProperties::builder()
        .with_footer_key(FOOTER_KEY.to_vec())
        .with_column_properties(vec![
            ColumnDecryptionProperties::builder("double_field")
                .with_key(COLUMN_KEY_1.to_vec())
                .build()
                .unwrap(),
            ColumnDecryptionProperties::builder("float_field")
                .with_key(COLUMN_KEY_2.to_vec())
                .build()
                .unwrap(),
        ])
        .unwrap()
        .build()
        .unwrap();
    verify_file(data, decryption);
}

#[test]
fn test_plaintext_footer() {
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_footer_key_id("kf")
        .with_column_properties(column_keys())
        .unwrap()
        .with_plaintext_footer()
        .build()
        .unwrap();
    let data = write_test_file(Some(encryption));

    // the file starts and ends with the plaintext magic
    assert_eq!(&data[..4], b"PAR1");
    assert_eq!(&data[data.len() - 4..], b"PAR1");

    verify_file(data, retriever_properties());
}

#[test]
fn test_plaintext_footer_signature_verification() {
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_footer_key_id("kf")
        .with_column_properties(column_keys())
        .unwrap()
        .with_plaintext_footer()
        .build()
        .unwrap();
    let data = write_test_file(Some(encryption));

    // corrupt one byte of the stored footer metadata; the signing trailer
    // must catch it
    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&data[data.len() - 8..data.len() - 4]);
    let footer_len = u32::from_le_bytes(len_bytes) as usize;
    let footer_start = data.len() - 8 - footer_len;

    let mut corrupted = data.to_vec();
    corrupted[footer_start] ^= 1;
    let result = SerializedFileReader::new_with_decryption_properties(
        Bytes::from(corrupted),
        retriever_properties(),
    );
    assert!(matches!(
        result,
        Err(ParquetError::FooterSignatureInvalid)
            | Err(ParquetError::MetadataParse(_))
            | Err(ParquetError::EOF(_))
    ));

    // corrupting the trailer itself is always a signature failure
    let mut corrupted = data.to_vec();
    let trailer_at = data.len() - 9;
    corrupted[trailer_at] ^= 1;
    let result = SerializedFileReader::new_with_decryption_properties(
        Bytes::from(corrupted),
        retriever_properties(),
    );
    assert!(matches!(result, Err(ParquetError::FooterSignatureInvalid)));
}

#[test]
fn test_plaintext_footer_verification_disabled() {
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_footer_key_id("kf")
        .with_column_properties(column_keys())
        .unwrap()
        .with_plaintext_footer()
        .build()
        .unwrap();
    let data = write_test_file(Some(encryption));

    let decryption = FileDecryptionProperties::builder()
        .with_key_retriever(key_retriever())
        .with_disabled_footer_signature_verification()
        .build()
        .unwrap();
    verify_file(data, decryption);
}

#[test]
fn test_aad_prefix_stored_in_file() {
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_footer_key_id("kf")
        .with_column_properties(column_keys())
        .unwrap()
        .with_aad_prefix(b"tester".to_vec())
        .build()
        .unwrap();
    let data = write_test_file(Some(encryption));

    // the stored prefix is picked up without the reader supplying it
    verify_file(data.clone(), retriever_properties());

    // a matching supplied prefix is accepted
    let decryption = FileDecryptionProperties::builder()
        .with_key_retriever(key_retriever())
        .with_aad_prefix(b"tester".to_vec())
        .build()
        .unwrap();
    verify_file(data.clone(), decryption);

    // a differing supplied prefix is rejected
    let decryption = FileDecryptionProperties::builder()
        .with_key_retriever(key_retriever())
        .with_aad_prefix(b"wrong prefix".to_vec())
        .build()
        .unwrap();
    let result = SerializedFileReader::new_with_decryption_properties(data, decryption);
    assert!(matches!(result, Err(ParquetError::AadPrefixMismatch)));
}

#[test]
fn test_aad_prefix_not_stored_in_file() {
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_footer_key_id("kf")
        .with_column_properties(column_keys())
        .unwrap()
        .with_aad_prefix(b"tester".to_vec())
        .with_disabled_aad_prefix_storage()
        .build()
        .unwrap();
    let data = write_test_file(Some(encryption));

    // reading without supplying the prefix must fail
    let result = SerializedFileReader::new_with_decryption_properties(
        data.clone(),
        retriever_properties(),
    );
    assert!(matches!(result, Err(ParquetError::AadPrefixMissing)));

    // supplying it makes the file readable
    let decryption = FileDecryptionProperties::builder()
        .with_key_retriever(key_retriever())
        .with_aad_prefix(b"tester".to_vec())
        .build()
        .unwrap();
    verify_file(data, decryption);
}

#[test]
fn test_gcm_ctr_mode() {
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_footer_key_id("kf")
        .with_column_properties(column_keys())
        .unwrap()
        .with_algorithm(Cipher::AES_GCM_CTR_V1)
        .build()
        .unwrap();
    let ctr_data = write_test_file(Some(encryption));
    verify_file(ctr_data.clone(), retriever_properties());

    // in CTR mode page bodies drop the 16-byte tag while page headers, as
    // metadata modules, keep it; with three pages per chunk the encrypted
    // columns come out 48 bytes smaller than under pure GCM
    let gcm_data = write_test_file(Some(non_uniform_encryption()));
    let chunk_size = |data: Bytes, column: usize| -> i64 {
        let reader =
            SerializedFileReader::new_with_decryption_properties(data, retriever_properties())
                .unwrap();
        let metadata = reader.metadata().file_metadata().row_groups[0].columns[column]
            .meta_data
            .clone()
            .unwrap();
        metadata.total_compressed_size
    };
    // double_field is encrypted with kc1 in both files
    assert_eq!(
        chunk_size(gcm_data, 3) - chunk_size(ctr_data, 3),
        3 * 16
    );
}

#[test]
fn test_missing_column_key() {
    let data = write_test_file(Some(non_uniform_encryption()));

    // the retriever knows the footer key and kc2, but not kc1
    let mut retriever = StringKeyIdRetriever::new();
    retriever.put_key("kf", FOOTER_KEY.to_vec());
    retriever.put_key("kc2", COLUMN_KEY_2.to_vec());
    let decryption = FileDecryptionProperties::builder()
        .with_key_retriever(Arc::new(retriever))
        .build()
        .unwrap();

    let reader =
        SerializedFileReader::new_with_decryption_properties(data, decryption).unwrap();
    let row_group = reader.get_row_group(0).unwrap();
    let expected = test_values();

    // bool, int32 and float are still readable
    assert_eq!(row_group.read_column(0).unwrap(), expected[0]);
    assert_eq!(row_group.read_column(1).unwrap(), expected[1]);
    assert_eq!(row_group.read_column(2).unwrap(), expected[2]);

    // double_field needs kc1
    let result = row_group.read_column(3);
    assert!(
        matches!(result, Err(ParquetError::KeyUnavailable(Some(ref path))) if path == "double_field"),
        "unexpected result: {result:?}"
    );
}

#[test]
fn test_no_decryption_properties() {
    let data = write_test_file(Some(uniform_encryption()));
    let result = SerializedFileReader::new(data);
    assert!(matches!(result, Err(ParquetError::NoDecryptionProperties)));

    let data = write_test_file(Some(
        FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
            .with_footer_key_id("kf")
            .with_column_properties(column_keys())
            .unwrap()
            .with_plaintext_footer()
            .build()
            .unwrap(),
    ));
    let result = SerializedFileReader::new(data);
    assert!(matches!(result, Err(ParquetError::NoDecryptionProperties)));
}

#[test]
fn test_unencrypted_round_trip() {
    let data = write_test_file(None);
    let reader = SerializedFileReader::new(data).unwrap();
    let row_group = reader.get_row_group(0).unwrap();
    for (i, expected) in test_values().iter().enumerate() {
        assert_eq!(&row_group.read_column(i).unwrap(), expected);
    }
}

#[test]
fn test_multiple_row_groups() {
    let properties = WriterProperties::builder()
        .set_data_page_row_count_limit(64)
        .with_file_encryption_properties(non_uniform_encryption())
        .build();
    let mut out = Vec::new();
    let mut writer = SerializedFileWriter::new(&mut out, schema(), properties).unwrap();
    for _ in 0..3 {
        let mut row_group = writer.next_row_group().unwrap();
        for column in test_values() {
            row_group.append_column(&column).unwrap();
        }
        row_group.close().unwrap();
    }
    writer.close().unwrap();

    let reader = SerializedFileReader::new_with_decryption_properties(
        Bytes::from(out),
        retriever_properties(),
    )
    .unwrap();
    assert_eq!(reader.num_row_groups(), 3);
    let expected = test_values();
    for row_group_index in 0..3 {
        let row_group = reader.get_row_group(row_group_index).unwrap();
        for (i, expected_column) in expected.iter().enumerate() {
            assert_eq!(&row_group.read_column(i).unwrap(), expected_column);
        }
    }
}

#[test]
fn test_tampered_page_fails_authentication() {
    let data = write_test_file(Some(uniform_encryption()));
    let reader = SerializedFileReader::new_with_decryption_properties(
        data.clone(),
        retriever_properties(),
    )
    .unwrap();
    let meta_data = reader.metadata().file_metadata().row_groups[0].columns[0]
        .meta_data
        .clone()
        .unwrap();

    // flip a bit inside the nonce of the first page header frame
    let mut corrupted = data.to_vec();
    let tamper_at = meta_data.data_page_offset as usize + 4 + 2;
    corrupted[tamper_at] ^= 1;

    let reader = SerializedFileReader::new_with_decryption_properties(
        Bytes::from(corrupted),
        retriever_properties(),
    )
    .unwrap();
    let result = reader.get_row_group(0).unwrap().read_column(0);
    assert!(matches!(result, Err(ParquetError::AeadFailure(_))));

    // losing the last byte of the last page (the end of its tag) also fails
    // authentication
    let chunk_start = meta_data.data_page_offset as usize;
    let chunk_end = chunk_start + meta_data.total_compressed_size as usize;
    let mut corrupted = data.to_vec();
    corrupted[chunk_end - 1] ^= 0xFF;
    let reader = SerializedFileReader::new_with_decryption_properties(
        Bytes::from(corrupted),
        retriever_properties(),
    )
    .unwrap();
    let result = reader.get_row_group(0).unwrap().read_column(0);
    assert!(matches!(result, Err(ParquetError::AeadFailure(_))));
}

#[test]
fn test_file_smaller_than_footer() {
    let result = SerializedFileReader::new(Bytes::from_static(b"PAR1"));
    assert!(matches!(result, Err(ParquetError::CorruptFooter(_))));
}

#[test]
fn test_metadata_length_exceeding_file() {
    let mut data = write_test_file(None).to_vec();
    let len = data.len();
    data[len - 8..len - 4].copy_from_slice(&(u32::MAX).to_le_bytes());
    let result = SerializedFileReader::new(Bytes::from(data));
    assert!(matches!(result, Err(ParquetError::CorruptFooter(_))));
}

#[test]
fn test_distinct_files_have_distinct_ciphertexts() {
    // two files written with identical configurations still differ, since
    // every build draws a fresh aad_file_unique and fresh nonces
    let a = write_test_file(Some(uniform_encryption()));
    let b = write_test_file(Some(uniform_encryption()));
    assert_eq!(a.len(), b.len());
    assert_ne!(a, b);
}

#[test]
fn test_write_to_disk_and_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tester1.parquet.encrypted");

    let properties = WriterProperties::builder()
        .set_data_page_row_count_limit(200)
        .with_file_encryption_properties(non_uniform_encryption())
        .build();
    let file = File::create(&path).unwrap();
    let mut writer = SerializedFileWriter::new(file, schema(), properties).unwrap();
    let mut row_group = writer.next_row_group().unwrap();
    for column in test_values() {
        row_group.append_column(&column).unwrap();
    }
    row_group.close().unwrap();
    writer.close().unwrap();

    let file = File::open(&path).unwrap();
    let reader =
        SerializedFileReader::new_with_decryption_properties(file, retriever_properties())
            .unwrap();
    let row_group = reader.get_row_group(0).unwrap();
    for (i, expected) in test_values().iter().enumerate() {
        assert_eq!(&row_group.read_column(i).unwrap(), expected);
    }
}

#[test]
fn test_aad_prefix_verifier_is_invoked() {
    use parquet_encryption::encryption::decrypt::AadPrefixVerifier;

    struct RejectingVerifier;
    impl AadPrefixVerifier for RejectingVerifier {
        fn check(&self, aad_prefix: &[u8]) -> parquet_encryption::errors::Result<()> {
            Err(ParquetError::General(format!(
                "prefix {:?} rejected by policy",
                aad_prefix
            )))
        }
    }

    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_footer_key_id("kf")
        .with_aad_prefix(b"tester".to_vec())
        .build()
        .unwrap();
    let data = write_test_file(Some(encryption));

    let decryption = FileDecryptionProperties::builder()
        .with_key_retriever(key_retriever())
        .with_aad_prefix_verifier(Arc::new(RejectingVerifier))
        .build()
        .unwrap();
    let result = SerializedFileReader::new_with_decryption_properties(data, decryption);
    assert!(result.is_err());
}
