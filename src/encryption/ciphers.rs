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

//! AES cipher primitives for module encryption.
//!
//! Each encrypted buffer is framed on disk as
//! `length(4, LE) || nonce(12) || ciphertext || tag(16)` for GCM and
//! `length(4, LE) || nonce(12) || ciphertext` for CTR, where the leading
//! length counts the bytes that follow it.
//!
//! A cipher instance serves a single key length and module class. Metadata
//! modules always use GCM; with [`Cipher::AES_GCM_CTR_V1`] page bodies use
//! CTR and rely on their GCM-protected page headers for authentication.
//! CTR initialization vectors are the 12-byte nonce followed by a 4-byte
//! big-endian block counter starting at 1.
//!
//! Key schedules are zeroized when a call's cipher instance drops, and key
//! bytes held by the [`Encryptor`](crate::encryption::encrypt::Encryptor) and
//! [`Decryptor`](crate::encryption::decrypt::Decryptor) handles are wiped on
//! drop.

use aes::{Aes128, Aes192, Aes256};
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::AeadInPlace;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, KeyInit};
use ctr::cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr32BE;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::basic::Cipher;
use crate::errors::{ParquetError, Result};

/// Nonce length of every framed buffer.
pub const NONCE_LEN: usize = 12;
/// GCM authentication tag length.
pub const TAG_LEN: usize = 16;
/// Length of the little-endian size prefix.
pub const SIZE_LEN: usize = 4;

type Aes192Gcm = AesGcm<Aes192, aes_gcm::aead::consts::U12>;

type Aes128Ctr = Ctr32BE<Aes128>;
type Aes192Ctr = Ctr32BE<Aes192>;
type Aes256Ctr = Ctr32BE<Aes256>;

const CTR_IV_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AesMode {
    Gcm,
    Ctr,
}

fn check_key_len(key_len: usize) -> Result<()> {
    match key_len {
        16 | 24 | 32 => Ok(()),
        _ => Err(ParquetError::KeyLengthInvalid(key_len)),
    }
}

fn resolve_mode(cipher: Cipher, metadata: bool) -> AesMode {
    if metadata || cipher == Cipher::AES_GCM_V1 {
        AesMode::Gcm
    } else {
        AesMode::Ctr
    }
}

/// Generates a fresh random nonce, failing closed when the OS random source
/// is unavailable.
fn generate_nonce() -> Result<[u8; NONCE_LEN]> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| general_err!("no secure random source available: {}", e))?;
    Ok(nonce)
}

fn check_plaintext_len(plaintext_len: usize, size_delta: usize) -> Result<()> {
    let framed = plaintext_len as u64 + size_delta as u64;
    if framed > u32::MAX as u64 {
        return Err(general_err!(
            "module of {} bytes is too large to encrypt",
            plaintext_len
        ));
    }
    Ok(())
}

fn gcm_encrypt<C: KeyInit + AeadInPlace>(
    plaintext: &[u8],
    key: &[u8],
    nonce: &[u8; NONCE_LEN],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher =
        C::new_from_slice(key).map_err(|_| aead_err!("could not create AES-GCM key"))?;

    let buffer_len = NONCE_LEN + plaintext.len() + TAG_LEN;
    let mut output = Vec::with_capacity(SIZE_LEN + buffer_len);
    output.extend_from_slice(&(buffer_len as u32).to_le_bytes());
    output.extend_from_slice(nonce);
    output.extend_from_slice(plaintext);

    let tag = cipher
        .encrypt_in_place_detached(
            GenericArray::from_slice(nonce),
            aad,
            &mut output[SIZE_LEN + NONCE_LEN..],
        )
        .map_err(|_| aead_err!("AES-GCM encryption failed"))?;
    output.extend_from_slice(tag.as_slice());
    Ok(output)
}

fn ctr_iv(nonce: &[u8; NONCE_LEN]) -> [u8; CTR_IV_LEN] {
    let mut iv = [0u8; CTR_IV_LEN];
    iv[..NONCE_LEN].copy_from_slice(nonce);
    iv[CTR_IV_LEN - 1] = 1;
    iv
}

fn ctr_encrypt<C: KeyIvInit + StreamCipher>(
    plaintext: &[u8],
    key: &[u8],
    nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>> {
    let iv = ctr_iv(nonce);
    let mut cipher = C::new_from_slices(key, &iv)
        .map_err(|_| aead_err!("could not create AES-CTR key"))?;

    let buffer_len = NONCE_LEN + plaintext.len();
    let mut output = Vec::with_capacity(SIZE_LEN + buffer_len);
    output.extend_from_slice(&(buffer_len as u32).to_le_bytes());
    output.extend_from_slice(nonce);
    output.extend_from_slice(plaintext);
    cipher.apply_keystream(&mut output[SIZE_LEN + NONCE_LEN..]);
    Ok(output)
}

/// AES encryptor for one key length and module class.
///
/// The key is passed per call and validated against the length the instance
/// was constructed for; underlying cipher state lives only for the duration
/// of a call.
#[derive(Debug, Clone)]
pub struct AesEncryptor {
    mode: AesMode,
    key_len: usize,
    ciphertext_size_delta: usize,
}

impl AesEncryptor {
    /// Creates an encryptor for the given file cipher and key length.
    ///
    /// `metadata` forces GCM even when the file cipher is
    /// [`Cipher::AES_GCM_CTR_V1`]; metadata modules are always authenticated.
    pub fn new(cipher: Cipher, key_len: usize, metadata: bool) -> Result<Self> {
        check_key_len(key_len)?;
        let mode = resolve_mode(cipher, metadata);
        let ciphertext_size_delta = match mode {
            AesMode::Gcm => SIZE_LEN + NONCE_LEN + TAG_LEN,
            AesMode::Ctr => SIZE_LEN + NONCE_LEN,
        };
        Ok(Self {
            mode,
            key_len,
            ciphertext_size_delta,
        })
    }

    /// Size difference between a plaintext buffer and its framed ciphertext.
    pub fn ciphertext_size_delta(&self) -> usize {
        self.ciphertext_size_delta
    }

    fn check_key(&self, key: &[u8]) -> Result<()> {
        if key.len() != self.key_len {
            return Err(ParquetError::KeyLengthMismatch {
                expected: self.key_len,
                actual: key.len(),
            });
        }
        Ok(())
    }

    /// Encrypts `plaintext` with a fresh random nonce, returning the framed
    /// ciphertext.
    pub fn encrypt(&self, plaintext: &[u8], key: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        self.check_key(key)?;
        check_plaintext_len(plaintext.len(), self.ciphertext_size_delta)?;
        let nonce = generate_nonce()?;
        match self.mode {
            AesMode::Gcm => match self.key_len {
                16 => gcm_encrypt::<Aes128Gcm>(plaintext, key, &nonce, aad),
                24 => gcm_encrypt::<Aes192Gcm>(plaintext, key, &nonce, aad),
                _ => gcm_encrypt::<Aes256Gcm>(plaintext, key, &nonce, aad),
            },
            AesMode::Ctr => match self.key_len {
                16 => ctr_encrypt::<Aes128Ctr>(plaintext, key, &nonce),
                24 => ctr_encrypt::<Aes192Ctr>(plaintext, key, &nonce),
                _ => ctr_encrypt::<Aes256Ctr>(plaintext, key, &nonce),
            },
        }
    }

    /// Encrypts a footer with a caller-supplied nonce.
    ///
    /// Used by the plaintext-footer mode, where the footer is stored in the
    /// clear followed by a `nonce || tag` trailer: with a deterministic nonce
    /// the reader can recompute the tag over the stored footer bytes and
    /// compare.
    pub fn signed_footer_encrypt(
        &self,
        footer: &[u8],
        key: &[u8],
        aad: &[u8],
        nonce: &[u8; NONCE_LEN],
    ) -> Result<Vec<u8>> {
        self.check_key(key)?;
        check_plaintext_len(footer.len(), self.ciphertext_size_delta)?;
        if self.mode != AesMode::Gcm {
            return Err(general_err!(
                "signed footer encryption requires a GCM (metadata) encryptor"
            ));
        }
        match self.key_len {
            16 => gcm_encrypt::<Aes128Gcm>(footer, key, nonce, aad),
            24 => gcm_encrypt::<Aes192Gcm>(footer, key, nonce, aad),
            _ => gcm_encrypt::<Aes256Gcm>(footer, key, nonce, aad),
        }
    }
}

fn parse_frame(length_and_ciphertext: &[u8], min_body: usize) -> Result<&[u8]> {
    if length_and_ciphertext.len() < SIZE_LEN + min_body {
        return Err(aead_err!(
            "encrypted buffer of {} bytes is too short",
            length_and_ciphertext.len()
        ));
    }
    let mut len_bytes = [0u8; SIZE_LEN];
    len_bytes.copy_from_slice(&length_and_ciphertext[..SIZE_LEN]);
    let written_len = u32::from_le_bytes(len_bytes) as usize;
    if written_len < min_body || written_len + SIZE_LEN != length_and_ciphertext.len() {
        return Err(aead_err!("wrong ciphertext length"));
    }
    Ok(&length_and_ciphertext[SIZE_LEN..])
}

fn gcm_decrypt<C: KeyInit + AeadInPlace>(
    body: &[u8],
    key: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher =
        C::new_from_slice(key).map_err(|_| aead_err!("could not create AES-GCM key"))?;

    let nonce = &body[..NONCE_LEN];
    let tag = &body[body.len() - TAG_LEN..];
    let mut plaintext = body[NONCE_LEN..body.len() - TAG_LEN].to_vec();

    cipher
        .decrypt_in_place_detached(
            GenericArray::from_slice(nonce),
            aad,
            &mut plaintext,
            GenericArray::from_slice(tag),
        )
        .map_err(|_| aead_err!("AES-GCM tag verification failed"))?;
    Ok(plaintext)
}

fn ctr_decrypt<C: KeyIvInit + StreamCipher>(body: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&body[..NONCE_LEN]);
    let iv = ctr_iv(&nonce);
    let mut cipher = C::new_from_slices(key, &iv)
        .map_err(|_| aead_err!("could not create AES-CTR key"))?;
    let mut plaintext = body[NONCE_LEN..].to_vec();
    cipher.apply_keystream(&mut plaintext);
    Ok(plaintext)
}

/// AES decryptor for one key length and module class; counterpart of
/// [`AesEncryptor`].
#[derive(Debug, Clone)]
pub struct AesDecryptor {
    mode: AesMode,
    key_len: usize,
    ciphertext_size_delta: usize,
}

impl AesDecryptor {
    /// Creates a decryptor for the given file cipher and key length; see
    /// [`AesEncryptor::new`] for the `metadata` flag.
    pub fn new(cipher: Cipher, key_len: usize, metadata: bool) -> Result<Self> {
        check_key_len(key_len)?;
        let mode = resolve_mode(cipher, metadata);
        let ciphertext_size_delta = match mode {
            AesMode::Gcm => SIZE_LEN + NONCE_LEN + TAG_LEN,
            AesMode::Ctr => SIZE_LEN + NONCE_LEN,
        };
        Ok(Self {
            mode,
            key_len,
            ciphertext_size_delta,
        })
    }

    /// Size difference between a framed ciphertext and its plaintext.
    pub fn ciphertext_size_delta(&self) -> usize {
        self.ciphertext_size_delta
    }

    fn check_key(&self, key: &[u8]) -> Result<()> {
        if key.len() != self.key_len {
            return Err(ParquetError::KeyLengthMismatch {
                expected: self.key_len,
                actual: key.len(),
            });
        }
        Ok(())
    }

    /// Decrypts a framed buffer, authenticating against `aad` in GCM mode.
    pub fn decrypt(
        &self,
        length_and_ciphertext: &[u8],
        key: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>> {
        self.check_key(key)?;
        match self.mode {
            AesMode::Gcm => {
                let body = parse_frame(length_and_ciphertext, NONCE_LEN + TAG_LEN)?;
                match self.key_len {
                    16 => gcm_decrypt::<Aes128Gcm>(body, key, aad),
                    24 => gcm_decrypt::<Aes192Gcm>(body, key, aad),
                    _ => gcm_decrypt::<Aes256Gcm>(body, key, aad),
                }
            }
            AesMode::Ctr => {
                let body = parse_frame(length_and_ciphertext, NONCE_LEN)?;
                match self.key_len {
                    16 => ctr_decrypt::<Aes128Ctr>(body, key),
                    24 => ctr_decrypt::<Aes192Ctr>(body, key),
                    _ => ctr_decrypt::<Aes256Ctr>(body, key),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [&[u8]; 3] = [
        b"0123456789012345",
        b"012345678901234501234567",
        b"01234567890123450123456789012345",
    ];

    #[test]
    fn test_round_trip_all_modes() {
        let plaintext = b"the quick brown fox jumps over the lazy dog";
        let aad = b"some module aad";
        for cipher in [Cipher::AES_GCM_V1, Cipher::AES_GCM_CTR_V1] {
            for metadata in [true, false] {
                for key in KEYS {
                    let encryptor = AesEncryptor::new(cipher, key.len(), metadata).unwrap();
                    let decryptor = AesDecryptor::new(cipher, key.len(), metadata).unwrap();
                    let encrypted = encryptor.encrypt(plaintext, key, aad).unwrap();
                    assert_eq!(
                        encrypted.len(),
                        plaintext.len() + encryptor.ciphertext_size_delta()
                    );
                    let decrypted = decryptor.decrypt(&encrypted, key, aad).unwrap();
                    assert_eq!(decrypted, plaintext);
                }
            }
        }
    }

    #[test]
    fn test_empty_plaintext_round_trip() {
        let key = KEYS[0];
        let encryptor = AesEncryptor::new(Cipher::AES_GCM_V1, key.len(), false).unwrap();
        let decryptor = AesDecryptor::new(Cipher::AES_GCM_V1, key.len(), false).unwrap();
        let encrypted = encryptor.encrypt(b"", key, b"aad").unwrap();
        assert_eq!(decryptor.decrypt(&encrypted, key, b"aad").unwrap(), b"");
    }

    #[test]
    fn test_metadata_forces_gcm_in_ctr_mode() {
        let key = KEYS[0];
        let meta = AesEncryptor::new(Cipher::AES_GCM_CTR_V1, key.len(), true).unwrap();
        let data = AesEncryptor::new(Cipher::AES_GCM_CTR_V1, key.len(), false).unwrap();
        assert_eq!(
            meta.ciphertext_size_delta(),
            SIZE_LEN + NONCE_LEN + TAG_LEN
        );
        assert_eq!(data.ciphertext_size_delta(), SIZE_LEN + NONCE_LEN);
    }

    #[test]
    fn test_invalid_key_lengths() {
        for key_len in [15, 17, 23, 25, 31, 33] {
            assert!(matches!(
                AesEncryptor::new(Cipher::AES_GCM_V1, key_len, false),
                Err(ParquetError::KeyLengthInvalid(_))
            ));
            assert!(matches!(
                AesDecryptor::new(Cipher::AES_GCM_V1, key_len, false),
                Err(ParquetError::KeyLengthInvalid(_))
            ));
        }
    }

    #[test]
    fn test_key_length_mismatch() {
        let encryptor = AesEncryptor::new(Cipher::AES_GCM_V1, 16, false).unwrap();
        let result = encryptor.encrypt(b"data", KEYS[2], b"aad");
        assert!(matches!(
            result,
            Err(ParquetError::KeyLengthMismatch {
                expected: 16,
                actual: 32
            })
        ));
    }

    #[test]
    fn test_nonces_are_unique() {
        let key = KEYS[0];
        let encryptor = AesEncryptor::new(Cipher::AES_GCM_V1, key.len(), false).unwrap();
        let a = encryptor.encrypt(b"same plaintext", key, b"aad").unwrap();
        let b = encryptor.encrypt(b"same plaintext", key, b"aad").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_bit_flip_fails_authentication() {
        let key = KEYS[0];
        let encryptor = AesEncryptor::new(Cipher::AES_GCM_V1, key.len(), false).unwrap();
        let decryptor = AesDecryptor::new(Cipher::AES_GCM_V1, key.len(), false).unwrap();
        let encrypted = encryptor.encrypt(b"payload bytes", key, b"aad").unwrap();

        // every byte after the length prefix is authenticated
        for i in SIZE_LEN..encrypted.len() {
            let mut tampered = encrypted.clone();
            tampered[i] ^= 1;
            assert!(matches!(
                decryptor.decrypt(&tampered, key, b"aad"),
                Err(ParquetError::AeadFailure(_))
            ));
        }
    }

    #[test]
    fn test_aad_mismatch_fails_authentication() {
        let key = KEYS[1];
        let encryptor = AesEncryptor::new(Cipher::AES_GCM_V1, key.len(), false).unwrap();
        let decryptor = AesDecryptor::new(Cipher::AES_GCM_V1, key.len(), false).unwrap();
        let encrypted = encryptor.encrypt(b"payload", key, b"right aad").unwrap();
        assert!(decryptor.decrypt(&encrypted, key, b"wrong aad").is_err());
    }

    #[test]
    fn test_truncated_ciphertext() {
        let key = KEYS[0];
        let encryptor = AesEncryptor::new(Cipher::AES_GCM_V1, key.len(), false).unwrap();
        let decryptor = AesDecryptor::new(Cipher::AES_GCM_V1, key.len(), false).unwrap();
        let encrypted = encryptor.encrypt(b"payload", key, b"aad").unwrap();
        let truncated = &encrypted[..encrypted.len() - 1];
        assert!(matches!(
            decryptor.decrypt(truncated, key, b"aad"),
            Err(ParquetError::AeadFailure(_))
        ));
    }

    #[test]
    fn test_signed_footer_encrypt_is_deterministic() {
        let key = KEYS[0];
        let nonce = [7u8; NONCE_LEN];
        let encryptor = AesEncryptor::new(Cipher::AES_GCM_V1, key.len(), true).unwrap();
        let a = encryptor
            .signed_footer_encrypt(b"footer bytes", key, b"aad", &nonce)
            .unwrap();
        let b = encryptor
            .signed_footer_encrypt(b"footer bytes", key, b"aad", &nonce)
            .unwrap();
        assert_eq!(a, b);

        let decryptor = AesDecryptor::new(Cipher::AES_GCM_V1, key.len(), true).unwrap();
        assert_eq!(decryptor.decrypt(&a, key, b"aad").unwrap(), b"footer bytes");
    }

    #[test]
    fn test_signed_footer_encrypt_requires_gcm() {
        let key = KEYS[0];
        let nonce = [0u8; NONCE_LEN];
        let encryptor = AesEncryptor::new(Cipher::AES_GCM_CTR_V1, key.len(), false).unwrap();
        assert!(encryptor
            .signed_footer_encrypt(b"footer", key, b"aad", &nonce)
            .is_err());
    }

    #[test]
    fn test_ctr_frames_carry_no_tag() {
        let key = KEYS[0];
        let encryptor = AesEncryptor::new(Cipher::AES_GCM_CTR_V1, key.len(), false).unwrap();
        let encrypted = encryptor.encrypt(b"12345", key, b"ignored").unwrap();
        assert_eq!(encrypted.len(), SIZE_LEN + NONCE_LEN + 5);
    }
}
