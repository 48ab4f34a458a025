use crate::error::{Result, VpkError};
use crate::header::Encryption;
use crate::key::KeyMaterial;
use crate::pipeline::envelope::Envelope;
use aes_gcm::Aes256Gcm;
use chacha20poly1305::aead::generic_array::typenum::Unsigned;
use chacha20poly1305::aead::generic_array::GenericArray;
use chacha20poly1305::aead::{Aead, KeyInit, Nonce, OsRng};
use chacha20poly1305::ChaCha20Poly1305;
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::RngCore;
use sha2::{Digest, Sha256};

type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

/// IV length for the CTR mode
pub const CTR_IV_LEN: usize = 16;

/// Length of the CTR key-check value stored in the envelope tag
pub const KEY_CHECK_LEN: usize = 16;

const KEY_CHECK_DOMAIN: &[u8] = b"vpk-ctr-key-check";

/// Encrypt `plaintext` under `key` with the given mode
pub fn encrypt(key: &KeyMaterial, mode: Encryption, plaintext: &[u8]) -> Result<Envelope> {
    match mode {
        Encryption::Chacha20 => seal_aead::<ChaCha20Poly1305>(key.as_bytes(), plaintext),
        Encryption::Gcm => seal_aead::<Aes256Gcm>(key.as_bytes(), plaintext),
        Encryption::Ctr => seal_ctr(key.as_bytes(), plaintext),
    }
}

/// Decrypt an envelope. Any rejection is reported as `KeyMismatch`.
pub fn decrypt(key: &KeyMaterial, mode: Encryption, envelope: &Envelope) -> Result<Vec<u8>> {
    match mode {
        Encryption::Chacha20 => open_aead::<ChaCha20Poly1305>(key.as_bytes(), envelope),
        Encryption::Gcm => open_aead::<Aes256Gcm>(key.as_bytes(), envelope),
        Encryption::Ctr => open_ctr(key.as_bytes(), envelope),
    }
}

fn seal_aead<C>(key: &[u8], plaintext: &[u8]) -> Result<Envelope>
where
    C: KeyInit + Aead,
{
    let cipher = C::new_from_slice(key).map_err(|e| VpkError::Encryption(e.to_string()))?;
    let nonce = C::generate_nonce(&mut OsRng);
    let mut sealed = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| VpkError::Encryption(e.to_string()))?;

    // The AEAD output is ciphertext || tag
    let tag = sealed.split_off(sealed.len() - <C::TagSize as Unsigned>::USIZE);
    Ok(Envelope {
        nonce: nonce.to_vec(),
        ciphertext: sealed,
        tag,
    })
}

fn open_aead<C>(key: &[u8], envelope: &Envelope) -> Result<Vec<u8>>
where
    C: KeyInit + Aead,
{
    if envelope.nonce.len() != <C::NonceSize as Unsigned>::USIZE
        || envelope.tag.len() != <C::TagSize as Unsigned>::USIZE
    {
        return Err(VpkError::KeyMismatch);
    }
    let cipher = C::new_from_slice(key).map_err(|_| VpkError::KeyMismatch)?;
    let nonce: &Nonce<C> = GenericArray::from_slice(&envelope.nonce);

    let mut sealed = Vec::with_capacity(envelope.ciphertext.len() + envelope.tag.len());
    sealed.extend_from_slice(&envelope.ciphertext);
    sealed.extend_from_slice(&envelope.tag);

    cipher
        .decrypt(nonce, sealed.as_slice())
        .map_err(|_| VpkError::KeyMismatch)
}

fn seal_ctr(key: &[u8], plaintext: &[u8]) -> Result<Envelope> {
    let mut iv = [0u8; CTR_IV_LEN];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let mut cipher =
        Aes256Ctr::new_from_slices(key, &iv).map_err(|e| VpkError::Encryption(e.to_string()))?;
    let mut ciphertext = plaintext.to_vec();
    cipher.apply_keystream(&mut ciphertext);

    Ok(Envelope {
        nonce: iv.to_vec(),
        ciphertext,
        tag: key_check(key, &iv),
    })
}

fn open_ctr(key: &[u8], envelope: &Envelope) -> Result<Vec<u8>> {
    if envelope.nonce.len() != CTR_IV_LEN || envelope.tag != key_check(key, &envelope.nonce) {
        return Err(VpkError::KeyMismatch);
    }
    let mut cipher =
        Aes256Ctr::new_from_slices(key, &envelope.nonce).map_err(|_| VpkError::KeyMismatch)?;
    let mut plaintext = envelope.ciphertext.clone();
    cipher.apply_keystream(&mut plaintext);
    Ok(plaintext)
}

/// CTR has no tag, so a wrong key would otherwise decrypt to garbage.
/// This value identifies the key; it does not authenticate the ciphertext.
fn key_check(key: &[u8], iv: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(KEY_CHECK_DOMAIN);
    hasher.update(key);
    hasher.update(iv);
    hasher.finalize()[..KEY_CHECK_LEN].to_vec()
}
