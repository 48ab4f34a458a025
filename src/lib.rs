//! VPK - Encrypted Directory Packages
//!
//! A VPK package captures a directory tree in a single file: a fixed-size
//! plaintext header followed by an encrypted, compressed snapshot of every
//! file in the tree.
//!
//! ## Layout
//!
//! ```text
//! [header: 111 bytes][payload: header.payload_size bytes]
//! ```
//!
//! ## Payload Pipeline
//!
//! ```text
//! Directory → Snapshot → bincode → Encrypt → Envelope → Compress → Payload
//! ```
//!
//! - **Snapshot**: files grouped by the base name of their parent directory
//! - **Encrypt**: ChaCha20-Poly1305 (default), AES-256-GCM, or AES-256-CTR
//! - **Envelope**: nonce, tag and ciphertext flattened into bytes
//! - **Compress**: zstd (default), gzip, lz4, brotli, or none
//!
//! Loading runs the same steps backwards with the modes from the caller's
//! [`PackageConfig`]. A codec that cannot decode the payload yields
//! [`VpkError::CompressionMismatch`]; a key or cipher mode that cannot
//! decrypt it yields [`VpkError::KeyMismatch`].
//!
//! ## Example
//!
//! ```no_run
//! use vpk::{create_package, open_snapshot, KeyMaterial, PackageConfig};
//! use std::path::Path;
//!
//! let key = KeyMaterial::derive("key phrase", "iv phrase").unwrap();
//! let config = PackageConfig::default().with_author("alice");
//!
//! create_package(Path::new("assets"), Path::new("assets.vpk"), &key, &config).unwrap();
//! let snapshot = open_snapshot(Path::new("assets.vpk"), &key, &config).unwrap();
//! assert!(snapshot.file_count() > 0);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod header;
pub mod key;
pub mod package;
pub mod pipeline;
pub mod snapshot;

pub use config::PackageConfig;
pub use error::{Result, VpkError};
pub use header::{Compression, Encryption, PackageHeader, HEADER_SIZE};
pub use key::KeyMaterial;
pub use package::{
    create_package, open_package, open_snapshot, read_package_header, save_snapshot,
    CreateReport, OpenedPackage,
};
pub use snapshot::{scan, Snapshot};
