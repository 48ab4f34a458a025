//! Payload pipeline.
//!
//! ```text
//! save: Snapshot → bincode → Encrypt → Envelope bytes → Compress → payload
//! load: payload → Decompress → Envelope → Decrypt → bincode → Snapshot
//! ```
//!
//! Byte stages run in order on save and in reverse order on load. On the
//! load path every stage reports failures as one of the two mismatch
//! errors, so no codec or cipher error reaches the caller.

pub mod compress;
pub mod encrypt;
pub mod envelope;

pub use compress::*;
pub use encrypt::{decrypt, encrypt};
pub use envelope::Envelope;

use crate::error::{Result, VpkError};
use crate::header::{Compression, Encryption};
use crate::key::KeyMaterial;
use crate::snapshot::Snapshot;
use tracing::debug;

/// A reversible transform over the payload bytes
pub trait Stage {
    fn name(&self) -> &'static str;

    /// Save direction
    fn apply(&self, data: Vec<u8>) -> Result<Vec<u8>>;

    /// Load direction
    fn reverse(&self, data: Vec<u8>) -> Result<Vec<u8>>;

    /// True if `apply` yields a flattened envelope
    fn produces_envelope(&self) -> bool {
        false
    }
}

/// Encrypt then flatten the envelope
pub struct EncryptStage<'a> {
    key: &'a KeyMaterial,
    mode: Encryption,
}

impl<'a> EncryptStage<'a> {
    pub fn new(key: &'a KeyMaterial, mode: Encryption) -> Self {
        Self { key, mode }
    }
}

impl Stage for EncryptStage<'_> {
    fn name(&self) -> &'static str {
        "encrypt"
    }

    fn apply(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        encrypt(self.key, self.mode, &data)?.to_bytes()
    }

    fn produces_envelope(&self) -> bool {
        true
    }

    fn reverse(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        // Bytes that are not an envelope came out of the wrong decompressor
        let envelope = Envelope::from_bytes(&data).map_err(|e| {
            debug!(error = %e, "envelope rejected");
            VpkError::CompressionMismatch
        })?;
        decrypt(self.key, self.mode, &envelope)
    }
}

pub struct CompressStage {
    mode: Compression,
}

impl CompressStage {
    pub fn new(mode: Compression) -> Self {
        Self { mode }
    }
}

impl Stage for CompressStage {
    fn name(&self) -> &'static str {
        "compress"
    }

    fn apply(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        compress(&data, self.mode)
    }

    fn reverse(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        decompress(&data, self.mode).map_err(|e| {
            debug!(error = %e, codec = %self.mode, "decompression rejected payload");
            VpkError::CompressionMismatch
        })
    }
}

/// Output of the save path
#[derive(Debug, Clone)]
pub struct SealedPayload {
    /// Size of the flattened envelope, or of the payload when no stage
    /// produces one
    pub envelope_size: usize,
    /// Bytes written after the header
    pub payload: Vec<u8>,
}

pub struct Pipeline<'a> {
    stages: Vec<Box<dyn Stage + 'a>>,
}

impl<'a> Pipeline<'a> {
    /// The standard VPK pipeline: encrypt, then compress
    pub fn new(key: &'a KeyMaterial, encryption: Encryption, compression: Compression) -> Self {
        Self {
            stages: vec![
                Box::new(EncryptStage::new(key, encryption)),
                Box::new(CompressStage::new(compression)),
            ],
        }
    }

    /// Build a pipeline from explicit stages, applied in the given order
    pub fn from_stages(stages: Vec<Box<dyn Stage + 'a>>) -> Self {
        Self { stages }
    }

    /// Run every stage forward over raw bytes
    pub fn apply(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        self.apply_with_envelope_size(data).map(|(_, data)| data)
    }

    fn apply_with_envelope_size(&self, mut data: Vec<u8>) -> Result<(Option<usize>, Vec<u8>)> {
        let mut envelope_size = None;
        for stage in &self.stages {
            data = stage.apply(data)?;
            debug!(stage = stage.name(), bytes = data.len(), "applied stage");
            if stage.produces_envelope() {
                envelope_size = Some(data.len());
            }
        }
        Ok((envelope_size, data))
    }

    /// Run every stage backward over raw bytes
    pub fn reverse(&self, mut data: Vec<u8>) -> Result<Vec<u8>> {
        for stage in self.stages.iter().rev() {
            data = stage.reverse(data)?;
            debug!(stage = stage.name(), bytes = data.len(), "reversed stage");
        }
        Ok(data)
    }

    /// Save path: serialize the snapshot and push it through every stage
    pub fn seal(&self, snapshot: &Snapshot) -> Result<SealedPayload> {
        let serialized = snapshot.to_bytes()?;
        debug!(bytes = serialized.len(), "serialized snapshot");

        let (envelope_size, payload) = self.apply_with_envelope_size(serialized)?;
        Ok(SealedPayload {
            envelope_size: envelope_size.unwrap_or(payload.len()),
            payload,
        })
    }

    /// Load path: reverse every stage and deserialize the snapshot
    pub fn unseal(&self, payload: Vec<u8>) -> Result<Snapshot> {
        let serialized = self.reverse(payload)?;
        // Plaintext that is not a snapshot means the key or mode was wrong
        Snapshot::from_bytes(&serialized).map_err(|e| {
            debug!(error = %e, "snapshot deserialization failed");
            VpkError::KeyMismatch
        })
    }
}
