// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AES-256-GCM authenticated encryption of file content.
//!
//! On-disk blob layout: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};

use super::Key;
use crate::error::{VaultError, VaultResult};

/// GCM nonce length in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length in bytes (128 bits).
pub const TAG_LEN: usize = 16;

/// Encrypted file content as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiphertextBlob(Vec<u8>);

impl CiphertextBlob {
    /// Wrap bytes read from disk; anything shorter than nonce + tag is
    /// malformed.
    pub fn from_bytes(bytes: Vec<u8>) -> VaultResult<Self> {
        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(VaultError::Crypto(format!(
                "ciphertext blob too short: {} bytes",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    pub fn nonce(&self) -> &[u8] {
        &self.0[..NONCE_LEN]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Authenticated cipher. Every call draws a fresh nonce from the system RNG.
#[derive(Debug)]
pub struct Cipher {
    rng: SystemRandom,
}

impl Default for Cipher {
    fn default() -> Self {
        Self::new()
    }
}

impl Cipher {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }

    fn sealing_key(key: &Key) -> VaultResult<LessSafeKey> {
        let unbound = UnboundKey::new(&AES_256_GCM, key.as_bytes())
            .map_err(|_| VaultError::Crypto("invalid AES-256 key".to_string()))?;
        Ok(LessSafeKey::new(unbound))
    }

    /// Encrypt `plaintext` under `key` with a freshly generated nonce.
    pub fn encrypt(&self, plaintext: &[u8], key: &Key) -> VaultResult<CiphertextBlob> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| VaultError::Crypto("system RNG failed to produce a nonce".to_string()))?;

        let sealing = Self::sealing_key(key)?;
        let mut in_out = plaintext.to_vec();
        sealing
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| VaultError::Crypto("encryption failed".to_string()))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + in_out.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&in_out);
        Ok(CiphertextBlob(blob))
    }

    /// Decrypt a stored blob. Fails on malformed input or tag mismatch.
    pub fn decrypt(&self, blob: &[u8], key: &Key) -> VaultResult<Vec<u8>> {
        if blob.len() < NONCE_LEN + TAG_LEN {
            return Err(VaultError::Crypto(format!(
                "ciphertext blob too short: {} bytes",
                blob.len()
            )));
        }
        let (nonce_bytes, sealed) = blob.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| VaultError::Crypto("invalid nonce".to_string()))?;

        let opening = Self::sealing_key(key)?;
        let mut in_out = sealed.to_vec();
        let plaintext_len = opening
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| VaultError::Crypto("authentication tag mismatch".to_string()))?
            .len();
        in_out.truncate(plaintext_len);
        Ok(in_out)
    }
}
