// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PBKDF2-HMAC-SHA256 key derivation from the master password.
//!
//! The work factor is stored in each envelope, so it can be raised for new
//! vaults while older vaults keep unlocking with the count they were sealed
//! with. PBKDF2 is not memory-hard; it is kept for on-disk compatibility.

use std::num::NonZeroU32;

use keyfold_core::KeyfoldError;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Derived key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// A derived vault key. Zeroed when dropped.
pub type VaultKey = Zeroizing<[u8; KEY_LEN]>;

/// Output of [`derive`]: the key plus the parameters that produced it.
pub struct DerivedKey {
    pub key: VaultKey,
    pub salt: [u8; SALT_LEN],
    pub iterations: u32,
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .field("iterations", &self.iterations)
            .finish_non_exhaustive()
    }
}

/// Derive a 32-byte key with PBKDF2-HMAC-SHA256.
///
/// Blocking and intentionally slow; async callers go through [`derive`].
pub fn derive_key(password: &[u8], salt: &[u8], iterations: u32) -> Result<VaultKey, KeyfoldError> {
    let iterations = NonZeroU32::new(iterations)
        .ok_or_else(|| KeyfoldError::Crypto("PBKDF2 iteration count must be non-zero".to_string()))?;

    let mut output = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        salt,
        password,
        output.as_mut(),
    );
    Ok(output)
}

/// Generate a random salt for a new vault.
pub fn generate_salt() -> Result<[u8; SALT_LEN], KeyfoldError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| KeyfoldError::Crypto("failed to generate random salt".to_string()))?;
    Ok(salt)
}

/// Derive the vault key off the async runtime.
///
/// With `salt == None` a fresh salt is generated (vault creation). An existing
/// vault must always pass its stored salt: regenerating it would make every
/// prior ciphertext undecryptable.
pub async fn derive(
    password: &SecretString,
    salt: Option<[u8; SALT_LEN]>,
    iterations: u32,
) -> Result<DerivedKey, KeyfoldError> {
    let salt = match salt {
        Some(salt) => salt,
        None => generate_salt()?,
    };
    let secret = Zeroizing::new(password.expose_secret().as_bytes().to_vec());

    let key = tokio::task::spawn_blocking(move || derive_key(&secret, &salt, iterations))
        .await
        .map_err(|e| KeyfoldError::Internal(format!("key derivation task failed: {e}")))??;

    Ok(DerivedKey {
        key,
        salt,
        iterations,
    })
}
