use crate::config::PackageConfig;
use crate::error::Result;
use crate::key::KeyMaterial;
use crate::package::open_package;
use crate::snapshot::Snapshot;
use std::path::Path;

/// Options for commands that decode a package
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    pub key: String,
    pub iv: String,
    pub config: PackageConfig,
}

impl OpenOptions {
    /// Derive the key and decode the package at `path`
    pub fn open(&self, path: &Path) -> Result<Snapshot> {
        let key = KeyMaterial::derive(&self.key, &self.iv)?;
        Ok(open_package(path, &key, &self.config)?.snapshot)
    }
}

/// Extract a package into `output_dir` as `<folder>/<file>`
/// Returns the number of files written
pub fn extract_from_vpk(input_path: &Path, output_dir: &Path, options: &OpenOptions) -> Result<usize> {
    let snapshot = options.open(input_path)?;
    std::fs::create_dir_all(output_dir)?;
    snapshot.extract_to(output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::create::{create_from_dir, CreateOptions};
    use crate::error::VpkError;
    use crate::header::Compression;
    use tempfile::tempdir;

    fn pack(dir: &Path, key: &str, config: PackageConfig) -> std::path::PathBuf {
        let input = dir.join("site");
        std::fs::create_dir_all(input.join("css")).unwrap();
        std::fs::write(input.join("index.html"), b"<html></html>").unwrap();
        std::fs::write(input.join("css/main.css"), b"body {}").unwrap();
        let output = dir.join("site.vpk");
        let options = CreateOptions {
            key: key.into(),
            iv: "iv".into(),
            config,
        };
        create_from_dir(&input, &output, &options).unwrap();
        output
    }

    #[test]
    fn test_extract_roundtrip() {
        let dir = tempdir().unwrap();
        let package = pack(dir.path(), "my_key", PackageConfig::default());
        let out = dir.path().join("out");

        let options = OpenOptions {
            key: "my_key".into(),
            iv: "iv".into(),
            config: PackageConfig::default(),
        };
        let written = extract_from_vpk(&package, &out, &options).unwrap();
        assert_eq!(written, 2);
        assert_eq!(std::fs::read(out.join("site/index.html")).unwrap(), b"<html></html>");
        assert_eq!(std::fs::read(out.join("css/main.css")).unwrap(), b"body {}");
    }

    #[test]
    fn test_extract_wrong_key() {
        let dir = tempdir().unwrap();
        let package = pack(dir.path(), "correct_key", PackageConfig::default());
        let out = dir.path().join("out");

        let options = OpenOptions {
            key: "wrong_key".into(),
            iv: "iv".into(),
            config: PackageConfig::default(),
        };
        let result = extract_from_vpk(&package, &out, &options);
        assert!(matches!(result, Err(VpkError::KeyMismatch)));
        assert!(!out.exists());
    }

    #[test]
    fn test_extract_wrong_compression() {
        let dir = tempdir().unwrap();
        let package = pack(
            dir.path(),
            "k",
            PackageConfig::default().with_compression(Compression::Brotli),
        );
        let options = OpenOptions {
            key: "k".into(),
            iv: "iv".into(),
            config: PackageConfig::default().with_compression(Compression::Zstd),
        };
        let result = extract_from_vpk(&package, &dir.path().join("out"), &options);
        assert!(matches!(result, Err(VpkError::CompressionMismatch)));
    }
}
