// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The encrypted-at-rest envelope and the document codec.
//!
//! On disk the envelope is a JSON object:
//!
//! ```json
//! {"version":1,"salt":"<b64>","iv":"<b64>","ciphertext":"<b64>",
//!  "iterations":400000,"lastSaved":"2026-10-17T09:30:00Z"}
//! ```
//!
//! `ciphertext` includes the 16-byte GCM tag. Parsing is strict: every
//! binary field must decode to its exact length and the version must be one
//! this build understands. Unknown extra fields are ignored.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use keyfold_core::KeyfoldError;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::{self, NONCE_LEN, TAG_LEN};
use crate::kdf::{KEY_LEN, SALT_LEN};
use crate::model::PlainVault;

/// Schema version written by this build. Older versions keep decrypting with
/// their own stored salt and iteration count.
pub const ENVELOPE_VERSION: u32 = 1;

/// Upper bound on the stored work factor, so a hostile import cannot pin the
/// unlock screen for hours. Shared with config validation.
pub const MAX_ITERATIONS: u32 = keyfold_config::MAX_KDF_ITERATIONS;

/// Whether an envelope with this work factor would be accepted on load.
pub fn supported_iterations(iterations: u32) -> bool {
    (1..=MAX_ITERATIONS).contains(&iterations)
}

/// The only representation of the vault that ever reaches durable storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    pub version: u32,
    pub salt: [u8; SALT_LEN],
    pub iv: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
    pub iterations: u32,
    pub last_saved: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeWire {
    version: u32,
    salt: String,
    iv: String,
    ciphertext: String,
    iterations: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_saved: Option<DateTime<Utc>>,
}

fn format_err(message: impl Into<String>) -> KeyfoldError {
    KeyfoldError::ImportFormat(message.into())
}

fn decode_exact<const N: usize>(field: &str, value: &str) -> Result<[u8; N], KeyfoldError> {
    let bytes = BASE64
        .decode(value)
        .map_err(|_| format_err(format!("`{field}` is not valid base64")))?;
    bytes
        .try_into()
        .map_err(|_| format_err(format!("`{field}` must decode to {N} bytes")))
}

impl EncryptedEnvelope {
    /// Encrypt `vault` under `key`, stamping `last_saved` with the current time.
    pub fn seal(
        key: &[u8; KEY_LEN],
        salt: [u8; SALT_LEN],
        iterations: u32,
        vault: &PlainVault,
    ) -> Result<Self, KeyfoldError> {
        let (iv, ciphertext) = encrypt_document(key, vault)?;
        Ok(Self {
            version: ENVELOPE_VERSION,
            salt,
            iv,
            ciphertext,
            iterations,
            last_saved: Some(Utc::now()),
        })
    }

    /// Decrypt the document with a key derived from this envelope's salt and
    /// iteration count.
    pub fn open(&self, key: &[u8; KEY_LEN]) -> Result<PlainVault, KeyfoldError> {
        decrypt_document(key, &self.iv, &self.ciphertext)
    }

    /// Serialize to the stored/exported byte form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, KeyfoldError> {
        let wire = EnvelopeWire {
            version: self.version,
            salt: BASE64.encode(self.salt),
            iv: BASE64.encode(self.iv),
            ciphertext: BASE64.encode(&self.ciphertext),
            iterations: self.iterations,
            last_saved: self.last_saved,
        };
        serde_json::to_vec(&wire)
            .map_err(|e| KeyfoldError::Internal(format!("envelope serialization failed: {e}")))
    }

    /// Parse and validate stored or imported bytes.
    ///
    /// Every failure is an [`KeyfoldError::ImportFormat`]; callers loading
    /// from their own store treat it as "no vault".
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyfoldError> {
        let wire: EnvelopeWire = serde_json::from_slice(bytes)
            .map_err(|e| format_err(format!("not a vault envelope: {e}")))?;

        if wire.version == 0 || wire.version > ENVELOPE_VERSION {
            return Err(format_err(format!(
                "unsupported envelope version {}",
                wire.version
            )));
        }
        if !supported_iterations(wire.iterations) {
            return Err(format_err(format!(
                "iteration count {} is out of range",
                wire.iterations
            )));
        }

        let salt = decode_exact::<SALT_LEN>("salt", &wire.salt)?;
        let iv = decode_exact::<NONCE_LEN>("iv", &wire.iv)?;
        let ciphertext = BASE64
            .decode(&wire.ciphertext)
            .map_err(|_| format_err("`ciphertext` is not valid base64"))?;
        if ciphertext.len() < TAG_LEN {
            return Err(format_err("`ciphertext` is shorter than the authentication tag"));
        }

        Ok(Self {
            version: wire.version,
            salt,
            iv,
            ciphertext,
            iterations: wire.iterations,
            last_saved: wire.last_saved,
        })
    }
}

/// Encrypt the canonical JSON encoding of `vault` under a fresh nonce.
pub fn encrypt_document(
    key: &[u8; KEY_LEN],
    vault: &PlainVault,
) -> Result<([u8; NONCE_LEN], Vec<u8>), KeyfoldError> {
    let plaintext = Zeroizing::new(
        serde_json::to_vec(vault)
            .map_err(|e| KeyfoldError::Internal(format!("document serialization failed: {e}")))?,
    );
    crypto::seal(key, &plaintext)
}

/// Authenticate, decrypt, and parse a document.
///
/// A tag mismatch and an authentic-but-unparseable payload both surface as
/// [`KeyfoldError::Decryption`]; nothing partial is returned.
pub fn decrypt_document(
    key: &[u8; KEY_LEN],
    iv: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<PlainVault, KeyfoldError> {
    let plaintext = Zeroizing::new(crypto::open(key, iv, ciphertext)?);
    serde_json::from_slice(&plaintext).map_err(|_| KeyfoldError::Decryption)
}
