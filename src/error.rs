use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VpkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid directory path: '{}'", .0.display())]
    InvalidDirectory(PathBuf),

    #[error("Directory not found: '{}'", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    #[error("Header field '{0}' contains a NUL byte")]
    NulInField(&'static str),

    #[error("Header field '{field}' is {len} bytes, maximum is {max}")]
    FieldTooLarge {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// The configured codec could not decode the payload
    #[error("The compression method does not match for this package")]
    CompressionMismatch,

    /// The key or encryption mode was rejected while decoding the payload
    #[error("The crypto key does not match for this package")]
    KeyMismatch,

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    #[error("Unsupported mode: {0}")]
    UnsupportedMode(String),

    #[error("Unsafe entry name in package: '{0}'")]
    UnsafeEntryName(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, VpkError>;
