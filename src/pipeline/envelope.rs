use crate::error::{Result, VpkError};

/// Marker at the start of every flattened envelope
pub const ENVELOPE_MAGIC: &[u8; 4] = b"VPKE";

/// Cipher output before it is flattened for compression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
    /// Authentication tag, or key-check value for unauthenticated modes
    pub tag: Vec<u8>,
}

impl Envelope {
    /// Flatten into `magic | nonce_len | nonce | tag_len | tag | ciphertext`
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let nonce_len = u8::try_from(self.nonce.len())
            .map_err(|_| VpkError::Encryption(format!("nonce too long: {}", self.nonce.len())))?;
        let tag_len = u8::try_from(self.tag.len())
            .map_err(|_| VpkError::Encryption(format!("tag too long: {}", self.tag.len())))?;

        let mut buf =
            Vec::with_capacity(ENVELOPE_MAGIC.len() + 2 + self.nonce.len() + self.tag.len() + self.ciphertext.len());
        buf.extend_from_slice(ENVELOPE_MAGIC);
        buf.push(nonce_len);
        buf.extend_from_slice(&self.nonce);
        buf.push(tag_len);
        buf.extend_from_slice(&self.tag);
        buf.extend_from_slice(&self.ciphertext);
        Ok(buf)
    }

    /// Parse a flattened envelope
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let rest = data
            .strip_prefix(ENVELOPE_MAGIC.as_slice())
            .ok_or_else(|| VpkError::Serialization("missing envelope marker".into()))?;

        let (nonce, rest) = split_prefixed(rest, "nonce")?;
        let (tag, ciphertext) = split_prefixed(rest, "tag")?;

        Ok(Self {
            nonce: nonce.to_vec(),
            ciphertext: ciphertext.to_vec(),
            tag: tag.to_vec(),
        })
    }
}

fn split_prefixed<'a>(data: &'a [u8], what: &str) -> Result<(&'a [u8], &'a [u8])> {
    let (&len, rest) = data
        .split_first()
        .ok_or_else(|| VpkError::Serialization(format!("envelope truncated before {}", what)))?;
    let len = len as usize;
    if rest.len() < len {
        return Err(VpkError::Serialization(format!("envelope {} truncated", what)));
    }
    Ok(rest.split_at(len))
}
