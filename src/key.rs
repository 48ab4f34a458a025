use crate::error::{Result, VpkError};
use argon2::Argon2;
use sha2::{Digest, Sha256};
use std::fmt;

/// Key material length in bytes
pub const KEY_LEN: usize = 32;

/// Opaque key handed to the payload pipeline
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    key: [u8; KEY_LEN],
}

impl KeyMaterial {
    /// Derive key material from a key phrase and an IV phrase using Argon2id.
    ///
    /// The salt is the first 16 bytes of SHA-256 over the IV phrase, so the
    /// same pair of phrases always yields the same key.
    pub fn derive(key_phrase: &str, iv_phrase: &str) -> Result<Self> {
        if key_phrase.is_empty() {
            return Err(VpkError::KeyDerivation("key phrase is empty".into()));
        }
        let digest = Sha256::digest(iv_phrase.as_bytes());
        let salt = &digest[..16];

        let mut key = [0u8; KEY_LEN];
        Argon2::default()
            .hash_password_into(key_phrase.as_bytes(), salt, &mut key)
            .map_err(|e| VpkError::KeyDerivation(e.to_string()))?;
        Ok(Self { key })
    }

    /// Wrap raw key bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            VpkError::KeyDerivation(format!(
                "key must be {} bytes, got {}",
                KEY_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self { key })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_is_deterministic() {
        let a = KeyMaterial::derive("passphrase", "iv-phrase").unwrap();
        let b = KeyMaterial::derive("passphrase", "iv-phrase").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), KEY_LEN);
    }

    #[test]
    fn test_derive_depends_on_both_parts() {
        let base = KeyMaterial::derive("passphrase", "iv-phrase").unwrap();
        let other_key = KeyMaterial::derive("passphrase2", "iv-phrase").unwrap();
        let other_iv = KeyMaterial::derive("passphrase", "iv-phrase2").unwrap();
        assert_ne!(base, other_key);
        assert_ne!(base, other_iv);
    }

    #[test]
    fn test_empty_key_phrase_rejected() {
        assert!(KeyMaterial::derive("", "iv").is_err());
    }

    #[test]
    fn test_from_bytes_length() {
        assert!(KeyMaterial::from_bytes(&[1u8; 32]).is_ok());
        assert!(KeyMaterial::from_bytes(&[1u8; 16]).is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let key = KeyMaterial::from_bytes(&[0xAB; 32]).unwrap();
        assert_eq!(format!("{:?}", key), "KeyMaterial { .. }");
    }
}
