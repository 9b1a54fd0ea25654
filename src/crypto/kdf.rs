// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! PBKDF2-HMAC-SHA256 key derivation.

use std::num::NonZeroU32;

use base64ct::{Base64, Encoding};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{VaultError, VaultResult};

/// Fixed PBKDF2 iteration count for file keys.
pub const PBKDF2_ITERATIONS: u32 = 65_536;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// Per-file salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Derived symmetric key. Wiped on drop, never serialized.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Key([u8; KEY_LEN]);

impl Key {
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Key(<redacted>)")
    }
}

/// Random per-file salt, stored base64-encoded in the ownership record.
#[derive(Clone, PartialEq, Eq)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        Base64::encode_string(&self.0)
    }

    /// Decode a stored salt; anything other than exactly [`SALT_LEN`] bytes
    /// is rejected.
    pub fn from_base64(encoded: &str) -> VaultResult<Self> {
        let bytes = Base64::decode_vec(encoded)
            .map_err(|e| VaultError::Crypto(format!("invalid salt encoding: {e}")))?;
        let bytes: [u8; SALT_LEN] = bytes.try_into().map_err(|v: Vec<u8>| {
            VaultError::Crypto(format!("invalid salt length: {} bytes", v.len()))
        })?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Debug for Salt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Salt({})", self.to_base64())
    }
}

/// Derives per-file keys from credential material.
#[derive(Debug)]
pub struct KeyDeriver {
    rng: SystemRandom,
    iterations: NonZeroU32,
}

impl Default for KeyDeriver {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyDeriver {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
            iterations: NonZeroU32::new(PBKDF2_ITERATIONS).unwrap_or(NonZeroU32::MIN),
        }
    }

    /// Derive a key under a freshly generated salt.
    pub fn derive_key(&self, secret: &[u8]) -> VaultResult<(Key, Salt)> {
        let mut salt = [0u8; SALT_LEN];
        self.rng
            .fill(&mut salt)
            .map_err(|_| VaultError::Crypto("system RNG failed to produce a salt".to_string()))?;
        let salt = Salt(salt);
        let key = self.derive_key_with_salt(secret, &salt);
        Ok((key, salt))
    }

    /// Re-derive the key for an existing file. Deterministic in its inputs.
    pub fn derive_key_with_salt(&self, secret: &[u8], salt: &Salt) -> Key {
        // derive straight into the key so no unwiped copy is left behind
        let mut key = Key([0u8; KEY_LEN]);
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            self.iterations,
            salt.as_bytes(),
            secret,
            &mut key.0,
        );
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rederivation_is_deterministic() {
        let kdf = KeyDeriver::new();
        let (key, salt) = kdf.derive_key(b"credential-hash").unwrap();
        let again = kdf.derive_key_with_salt(b"credential-hash", &salt);
        assert_eq!(key.as_bytes(), again.as_bytes());
    }

    #[test]
    fn fresh_salts_give_fresh_keys() {
        let kdf = KeyDeriver::new();
        let (k1, s1) = kdf.derive_key(b"secret").unwrap();
        let (k2, s2) = kdf.derive_key(b"secret").unwrap();
        assert_ne!(s1, s2);
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn different_secrets_give_different_keys() {
        let kdf = KeyDeriver::new();
        let (_, salt) = kdf.derive_key(b"alice").unwrap();
        let a = kdf.derive_key_with_salt(b"alice", &salt);
        let b = kdf.derive_key_with_salt(b"bob", &salt);
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn salt_base64_round_trip() {
        let kdf = KeyDeriver::new();
        let (_, salt) = kdf.derive_key(b"x").unwrap();
        let decoded = Salt::from_base64(&salt.to_base64()).unwrap();
        assert_eq!(decoded, salt);
    }

    #[test]
    fn malformed_salts_are_crypto_errors() {
        let err = Salt::from_base64("not base64!!").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Crypto);

        let short = Base64::encode_string(&[1u8; 4]);
        let err = Salt::from_base64(&short).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Crypto);
    }

    #[test]
    fn key_material_is_wiped() {
        fn wiped_on_drop<T: ZeroizeOnDrop>() {}
        wiped_on_drop::<Key>();

        let kdf = KeyDeriver::new();
        let (mut key, _) = kdf.derive_key(b"secret").unwrap();
        assert!(key.as_bytes().iter().any(|b| *b != 0));
        key.zeroize();
        assert!(key.as_bytes().iter().all(|b| *b == 0));
    }

    #[test]
    fn key_debug_is_redacted() {
        let kdf = KeyDeriver::new();
        let (key, _) = kdf.derive_key(b"secret").unwrap();
        assert_eq!(format!("{key:?}"), "Key(<redacted>)");
    }
}
