use crate::error::{Result, VpkError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current package layout version
pub const FORMAT_VERSION: u32 = 1;

/// Fixed description written into every header
pub const PACKAGE_DESCRIPTION: &str = "Encrypted data package";

/// Fixed copyright notice written into every header
pub const COPYRIGHT: &str = "VPK \u{24b8} Packager";

pub const NAME_WIDTH: usize = 16;
pub const DESCRIPTION_WIDTH: usize = 22;
pub const AUTHOR_WIDTH: usize = 16;
pub const COPYRIGHT_WIDTH: usize = 17;
pub const ENCRYPTION_WIDTH: usize = 8;
pub const COMPRESSION_WIDTH: usize = 8;

/// Header size in bytes, summed over the field table in declaration order
pub const HEADER_SIZE: usize = NAME_WIDTH
    + DESCRIPTION_WIDTH
    + 8 // payload_size
    + AUTHOR_WIDTH
    + COPYRIGHT_WIDTH
    + 8 // timestamp
    + ENCRYPTION_WIDTH
    + 4 // key_length
    + 4 // version
    + COMPRESSION_WIDTH;

/// Compression codec options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    None,
    Gzip,
    #[default]
    Zstd,
    Lz4,
    Brotli,
}

impl Compression {
    pub const ALL: [Compression; 5] = [
        Compression::None,
        Compression::Gzip,
        Compression::Zstd,
        Compression::Lz4,
        Compression::Brotli,
    ];

    /// Identifier stored in the package header
    pub fn as_id(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Zstd => "zstd",
            Compression::Lz4 => "lz4",
            Compression::Brotli => "brotli",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_id())
    }
}

impl std::str::FromStr for Compression {
    type Err = VpkError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "gzip" | "gz" => Ok(Self::Gzip),
            "zstd" => Ok(Self::Zstd),
            "lz4" => Ok(Self::Lz4),
            "brotli" | "br" => Ok(Self::Brotli),
            _ => Err(VpkError::UnsupportedMode(format!("compression: {}", s))),
        }
    }
}

/// Encryption mode options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Encryption {
    /// ChaCha20-Poly1305 (authenticated)
    #[default]
    Chacha20,
    /// AES-256-GCM (authenticated)
    Gcm,
    /// AES-256-CTR (unauthenticated, key-checked)
    Ctr,
}

impl Encryption {
    pub const ALL: [Encryption; 3] = [Encryption::Chacha20, Encryption::Gcm, Encryption::Ctr];

    /// Identifier stored in the package header
    pub fn as_id(&self) -> &'static str {
        match self {
            Encryption::Chacha20 => "CHACHA20",
            Encryption::Gcm => "GCM",
            Encryption::Ctr => "CTR",
        }
    }

    /// False for modes whose ciphertext carries no integrity tag
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Encryption::Ctr)
    }
}

impl fmt::Display for Encryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_id())
    }
}

impl std::str::FromStr for Encryption {
    type Err = VpkError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "chacha20" | "chacha20-poly1305" | "chacha" => Ok(Self::Chacha20),
            "gcm" | "aes-gcm" | "aes-256-gcm" => Ok(Self::Gcm),
            "ctr" | "aes-ctr" | "aes-256-ctr" => Ok(Self::Ctr),
            _ => Err(VpkError::UnsupportedMode(format!("encryption: {}", s))),
        }
    }
}

/// VPK package header - fixed-size plaintext record in front of the payload
///
/// Text fields are NUL-padded to their width. Free text (name, description,
/// author, copyright) is truncated on a character boundary when too long;
/// mode identifiers and integers that do not fit are rejected. A NUL byte
/// in any text field is rejected, since NUL marks the padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageHeader {
    /// Package name (destination file name without extension)
    pub name: String,
    pub description: String,
    /// On-disk size of the compressed payload that follows the header
    pub payload_size: u64,
    pub author: String,
    pub copyright: String,
    /// Creation time, seconds since the Unix epoch
    pub timestamp: u64,
    /// Encryption mode identifier
    pub encryption: String,
    /// Length of the key material in bytes (informational)
    pub key_length: u32,
    pub version: u32,
    /// Compression mode identifier
    pub compression: String,
}

impl PackageHeader {
    /// Build a version-1 header stamped with the current time
    pub fn new(
        name: &str,
        author: &str,
        payload_size: usize,
        key_length: usize,
        encryption: Encryption,
        compression: Compression,
    ) -> Result<Self> {
        let key_length = u32::try_from(key_length).map_err(|_| VpkError::FieldTooLarge {
            field: "key_length",
            len: key_length,
            max: u32::MAX as usize,
        })?;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Ok(Self {
            name: name.to_string(),
            description: PACKAGE_DESCRIPTION.to_string(),
            payload_size: payload_size as u64,
            author: author.to_string(),
            copyright: COPYRIGHT.to_string(),
            timestamp,
            encryption: encryption.as_id().to_string(),
            key_length,
            version: FORMAT_VERSION,
            compression: compression.as_id().to_string(),
        })
    }

    /// Encode the header into its fixed-size binary form
    pub fn to_bytes(&self) -> Result<[u8; HEADER_SIZE]> {
        let mut writer = HeaderWriter::new();
        writer.text("name", &self.name, NAME_WIDTH)?;
        writer.text("description", &self.description, DESCRIPTION_WIDTH)?;
        writer.u64(self.payload_size);
        writer.text("author", &self.author, AUTHOR_WIDTH)?;
        writer.text("copyright", &self.copyright, COPYRIGHT_WIDTH)?;
        writer.u64(self.timestamp);
        writer.ident("encryption", &self.encryption, ENCRYPTION_WIDTH)?;
        writer.u32(self.key_length);
        writer.u32(self.version);
        writer.ident("compression", &self.compression, COMPRESSION_WIDTH)?;
        debug_assert_eq!(writer.pos, HEADER_SIZE);
        Ok(writer.buf)
    }

    /// Decode a header from the first `HEADER_SIZE` bytes of `data`
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(VpkError::MalformedHeader(format!(
                "expected {} header bytes, found {}",
                HEADER_SIZE,
                data.len()
            )));
        }

        let mut reader = HeaderReader { data, pos: 0 };
        let header = Self {
            name: reader.text("name", NAME_WIDTH)?,
            description: reader.text("description", DESCRIPTION_WIDTH)?,
            payload_size: reader.u64(),
            author: reader.text("author", AUTHOR_WIDTH)?,
            copyright: reader.text("copyright", COPYRIGHT_WIDTH)?,
            timestamp: reader.u64(),
            encryption: reader.text("encryption", ENCRYPTION_WIDTH)?,
            key_length: reader.u32(),
            version: reader.u32(),
            compression: reader.text("compression", COMPRESSION_WIDTH)?,
        };

        if header.version != FORMAT_VERSION {
            return Err(VpkError::MalformedHeader(format!(
                "unsupported format version {}",
                header.version
            )));
        }
        Ok(header)
    }

    /// Parse the recorded encryption mode
    pub fn encryption_mode(&self) -> Result<Encryption> {
        self.encryption.parse()
    }

    /// Parse the recorded compression mode
    pub fn compression_mode(&self) -> Result<Compression> {
        self.compression.parse()
    }

    /// Creation time as a UTC datetime, if representable
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.timestamp).ok()?;
        DateTime::from_timestamp(secs, 0)
    }
}

/// Cut `value` to at most `width` bytes without splitting a character
pub fn truncate_utf8(value: &str, width: usize) -> &str {
    if value.len() <= width {
        return value;
    }
    let mut end = width;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

struct HeaderWriter {
    buf: [u8; HEADER_SIZE],
    pos: usize,
}

impl HeaderWriter {
    fn new() -> Self {
        Self {
            buf: [0u8; HEADER_SIZE],
            pos: 0,
        }
    }

    fn put(&mut self, bytes: &[u8], width: usize) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += width;
    }

    fn text(&mut self, field: &'static str, value: &str, width: usize) -> Result<()> {
        if value.contains('\0') {
            return Err(VpkError::NulInField(field));
        }
        self.put(truncate_utf8(value, width).as_bytes(), width);
        Ok(())
    }

    fn ident(&mut self, field: &'static str, value: &str, width: usize) -> Result<()> {
        if value.contains('\0') {
            return Err(VpkError::NulInField(field));
        }
        if value.len() > width {
            return Err(VpkError::FieldTooLarge {
                field,
                len: value.len(),
                max: width,
            });
        }
        self.put(value.as_bytes(), width);
        Ok(())
    }

    fn u32(&mut self, value: u32) {
        self.put(&value.to_le_bytes(), 4);
    }

    fn u64(&mut self, value: u64) {
        self.put(&value.to_le_bytes(), 8);
    }
}

struct HeaderReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> HeaderReader<'a> {
    fn take(&mut self, width: usize) -> &'a [u8] {
        let slice = &self.data[self.pos..self.pos + width];
        self.pos += width;
        slice
    }

    fn text(&mut self, field: &str, width: usize) -> Result<String> {
        let raw = self.take(width);
        let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        String::from_utf8(raw[..end].to_vec()).map_err(|_| {
            VpkError::MalformedHeader(format!("field '{}' is not valid UTF-8", field))
        })
    }

    fn u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.take(4));
        u32::from_le_bytes(bytes)
    }

    fn u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.take(8));
        u64::from_le_bytes(bytes)
    }
}
