// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level AES-256-GCM seal/open operations.
//!
//! Every call to [`seal`] draws a fresh random 96-bit nonce from the system
//! CSPRNG. A nonce must never repeat under the same key.

use keyfold_core::KeyfoldError;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};

use crate::kdf::KEY_LEN;

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// Authentication tag length appended to every ciphertext.
pub const TAG_LEN: usize = 16;

fn cipher(key: &[u8; KEY_LEN]) -> Result<LessSafeKey, KeyfoldError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| KeyfoldError::Crypto("failed to create AES-256-GCM key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt `plaintext`, returning `(nonce, ciphertext_with_tag)`.
pub fn seal(
    key: &[u8; KEY_LEN],
    plaintext: &[u8],
) -> Result<([u8; NONCE_LEN], Vec<u8>), KeyfoldError> {
    let cipher = cipher(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| KeyfoldError::Crypto("failed to generate random nonce".to_string()))?;

    let mut in_out = plaintext.to_vec();
    cipher
        .seal_in_place_append_tag(
            Nonce::assume_unique_for_key(nonce_bytes),
            Aad::empty(),
            &mut in_out,
        )
        .map_err(|_| KeyfoldError::Crypto("AES-256-GCM encryption failed".to_string()))?;

    Ok((nonce_bytes, in_out))
}

/// Decrypt and authenticate `ciphertext` (which carries the trailing tag).
///
/// Any failure (wrong key, tampered bytes, truncated input) yields
/// [`KeyfoldError::Decryption`] and no plaintext.
pub fn open(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, KeyfoldError> {
    let cipher = cipher(key)?;

    let mut in_out = ciphertext.to_vec();
    let plaintext = cipher
        .open_in_place(Nonce::assume_unique_for_key(*nonce), Aad::empty(), &mut in_out)
        .map_err(|_| KeyfoldError::Decryption)?;

    Ok(plaintext.to_vec())
}
