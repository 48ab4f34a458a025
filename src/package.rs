use crate::config::PackageConfig;
use crate::error::{Result, VpkError};
use crate::header::{PackageHeader, HEADER_SIZE};
use crate::key::KeyMaterial;
use crate::pipeline::Pipeline;
use crate::snapshot::{scan, Snapshot};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// File extension for packages
pub const PACKAGE_EXTENSION: &str = "vpk";

/// A package on disk: header followed by the compressed payload
#[derive(Debug, Clone)]
pub struct PackageFile {
    pub header: PackageHeader,
    pub payload: Vec<u8>,
}

/// Read a whole package file.
///
/// Exactly `header.payload_size` bytes after the header are taken as the
/// payload. Anything after that is ignored.
pub fn read_package_file(path: &Path) -> Result<PackageFile> {
    let data = std::fs::read(path)?;
    let header = PackageHeader::from_bytes(&data)?;

    let available = data.len() - HEADER_SIZE;
    let declared = usize::try_from(header.payload_size).unwrap_or(usize::MAX);
    if available < declared {
        return Err(VpkError::MalformedHeader(format!(
            "header declares {} payload bytes, file has {}",
            declared, available
        )));
    }
    if available > declared {
        warn!(
            path = %path.display(),
            extra = available - declared,
            "ignoring bytes after the declared payload"
        );
    }

    Ok(PackageFile {
        header,
        payload: data[HEADER_SIZE..HEADER_SIZE + declared].to_vec(),
    })
}

/// Write a package file (creates new file or overwrites)
pub fn write_package_file(path: &Path, package: &PackageFile) -> Result<()> {
    let header_bytes = package.header.to_bytes()?;

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&header_bytes)?;
    writer.write_all(&package.payload)?;
    writer.flush()?;
    Ok(())
}

/// Read just the header from a package file
pub fn read_package_header(path: &Path) -> Result<PackageHeader> {
    let file = File::open(path)?;
    let mut header_bytes = Vec::with_capacity(HEADER_SIZE);
    file.take(HEADER_SIZE as u64).read_to_end(&mut header_bytes)?;
    PackageHeader::from_bytes(&header_bytes)
}

/// Package name recorded in the header: the file name without extension
pub fn package_name(destination: &Path) -> String {
    destination
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `<dir>.vpk`, next to the directory
pub fn default_destination(root: &Path) -> PathBuf {
    let mut base = root.components().as_path().to_path_buf();
    if base.file_name().is_none() {
        if let Ok(canonical) = std::fs::canonicalize(root) {
            base = canonical;
        }
    }
    let mut os = base.into_os_string();
    os.push(".");
    os.push(PACKAGE_EXTENSION);
    PathBuf::from(os)
}

/// Summary of a `create_package` run
#[derive(Debug, Clone)]
pub struct CreateReport {
    /// Files visited during the scan, including overwritten collisions
    pub files: usize,
    /// Raw bytes held in the snapshot
    pub total_bytes: usize,
    /// Size of the encrypted envelope before compression
    pub envelope_size: usize,
    /// Size of the written package file
    pub package_size: u64,
    pub elapsed: Duration,
    pub header: PackageHeader,
}

/// Snapshot `root` and write it as a package to `destination`
pub fn create_package(
    root: &Path,
    destination: &Path,
    key: &KeyMaterial,
    config: &PackageConfig,
) -> Result<CreateReport> {
    if root.as_os_str().is_empty() || !root.is_dir() {
        return Err(VpkError::InvalidDirectory(root.to_path_buf()));
    }
    let started = Instant::now();

    let (snapshot, files) = scan(root)?;
    debug!(files, folders = snapshot.folder_count(), "scanned directory");
    let (header, envelope_size) = save(&snapshot, destination, key, config)?;

    let elapsed = started.elapsed();
    info!(
        package = %header.name,
        files,
        elapsed = %format!("{:.2}s", elapsed.as_secs_f64()),
        "finished"
    );

    Ok(CreateReport {
        files,
        total_bytes: snapshot.total_bytes(),
        envelope_size,
        package_size: HEADER_SIZE as u64 + header.payload_size,
        elapsed,
        header,
    })
}

/// Seal a snapshot and write it to `destination`
pub fn save_snapshot(
    snapshot: &Snapshot,
    destination: &Path,
    key: &KeyMaterial,
    config: &PackageConfig,
) -> Result<PackageHeader> {
    save(snapshot, destination, key, config).map(|(header, _)| header)
}

fn save(
    snapshot: &Snapshot,
    destination: &Path,
    key: &KeyMaterial,
    config: &PackageConfig,
) -> Result<(PackageHeader, usize)> {
    if !config.encryption.is_authenticated() {
        debug!(
            mode = %config.encryption,
            "payload is not authenticated, only the key is checked on open"
        );
    }
    let pipeline = Pipeline::new(key, config.encryption, config.compression);
    let sealed = pipeline.seal(snapshot)?;
    debug!(
        envelope = sealed.envelope_size,
        payload = sealed.payload.len(),
        "sealed payload"
    );

    let header = PackageHeader::new(
        &package_name(destination),
        &config.author,
        sealed.payload.len(),
        key.len(),
        config.encryption,
        config.compression,
    )?;
    let package = PackageFile {
        header,
        payload: sealed.payload,
    };
    write_package_file(destination, &package)?;
    Ok((package.header, sealed.envelope_size))
}

/// A decoded package
#[derive(Debug, Clone)]
pub struct OpenedPackage {
    pub header: PackageHeader,
    pub snapshot: Snapshot,
}

/// Read and decode a package using the configured modes.
///
/// The modes recorded in the header are only compared against the
/// configuration; a disagreement is logged, the configuration still wins.
pub fn open_package(
    source: &Path,
    key: &KeyMaterial,
    config: &PackageConfig,
) -> Result<OpenedPackage> {
    let package = read_package_file(source)?;
    for mismatch in mode_mismatches(&package.header, config) {
        warn!(path = %source.display(), "{}", mismatch);
    }

    let pipeline = Pipeline::new(key, config.encryption, config.compression);
    let snapshot = pipeline.unseal(package.payload)?;
    Ok(OpenedPackage {
        header: package.header,
        snapshot,
    })
}

/// Read and decode a package, returning only the snapshot
pub fn open_snapshot(source: &Path, key: &KeyMaterial, config: &PackageConfig) -> Result<Snapshot> {
    open_package(source, key, config).map(|opened| opened.snapshot)
}

/// Describe every mode the header records differently from `config`
pub fn mode_mismatches(header: &PackageHeader, config: &PackageConfig) -> Vec<String> {
    let mut mismatches = Vec::new();
    if header.encryption_mode().ok() != Some(config.encryption) {
        mismatches.push(format!(
            "package records encryption '{}', configured '{}'",
            header.encryption, config.encryption
        ));
    }
    if header.compression_mode().ok() != Some(config.compression) {
        mismatches.push(format!(
            "package records compression '{}', configured '{}'",
            header.compression, config.compression
        ));
    }
    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{Compression, Encryption};
    use tempfile::tempdir;

    fn key(byte: u8) -> KeyMaterial {
        KeyMaterial::from_bytes(&[byte; 32]).unwrap()
    }

    fn sample_header(payload_size: usize) -> PackageHeader {
        PackageHeader::new(
            "sample",
            "tester",
            payload_size,
            32,
            Encryption::Chacha20,
            Compression::Zstd,
        )
        .unwrap()
    }

    #[test]
    fn test_package_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.vpk");
        let package = PackageFile {
            header: sample_header(5),
            payload: b"12345".to_vec(),
        };
        write_package_file(&path, &package).unwrap();

        assert_eq!(std::fs::metadata(&path).unwrap().len() as usize, HEADER_SIZE + 5);
        let loaded = read_package_file(&path).unwrap();
        assert_eq!(loaded.header, package.header);
        assert_eq!(loaded.payload, package.payload);
        assert_eq!(read_package_header(&path).unwrap(), package.header);
    }

    #[test]
    fn test_truncated_payload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.vpk");
        let package = PackageFile {
            header: sample_header(100),
            payload: vec![0; 10],
        };
        write_package_file(&path, &package).unwrap();
        assert!(matches!(
            read_package_file(&path),
            Err(VpkError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("long.vpk");
        let package = PackageFile {
            header: sample_header(3),
            payload: b"abcdef".to_vec(),
        };
        write_package_file(&path, &package).unwrap();
        assert_eq!(read_package_file(&path).unwrap().payload, b"abc".to_vec());
    }

    #[test]
    fn test_short_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tiny.vpk");
        std::fs::write(&path, b"VPK").unwrap();
        assert!(matches!(
            read_package_file(&path),
            Err(VpkError::MalformedHeader(_))
        ));
        assert!(matches!(
            read_package_header(&path),
            Err(VpkError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io() {
        let dir = tempdir().unwrap();
        let result = read_package_file(&dir.path().join("absent.vpk"));
        assert!(matches!(result, Err(VpkError::Io(_))));
    }

    #[test]
    fn test_create_rejects_bad_roots() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out.vpk");
        let config = PackageConfig::default();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();

        for root in [PathBuf::new(), dir.path().join("missing"), file] {
            let result = create_package(&root, &dest, &key(1), &config);
            assert!(matches!(result, Err(VpkError::InvalidDirectory(_))));
        }
        assert!(!dest.exists());
    }

    #[test]
    fn test_create_and_open() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("game");
        std::fs::create_dir_all(root.join("maps")).unwrap();
        std::fs::write(root.join("maps/level1.map"), b"level one").unwrap();
        std::fs::write(root.join("readme.txt"), b"hello").unwrap();
        let dest = dir.path().join("game.vpk");
        let config = PackageConfig::default().with_author("tester");

        let report = create_package(&root, &dest, &key(1), &config).unwrap();
        assert_eq!(report.files, 2);
        assert_eq!(report.total_bytes, 14);
        assert_eq!(report.header.name, "game");
        assert_eq!(report.header.author, "tester");
        assert_eq!(report.header.key_length, 32);
        assert_eq!(report.package_size, std::fs::metadata(&dest).unwrap().len());

        let opened = open_package(&dest, &key(1), &config).unwrap();
        assert_eq!(opened.header, report.header);
        assert_eq!(opened.snapshot.get("maps", "level1.map"), Some(&b"level one"[..]));
        assert_eq!(opened.snapshot.get("game", "readme.txt"), Some(&b"hello"[..]));
    }

    #[test]
    fn test_save_snapshot_payload_size_matches_disk() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("assets.pkg.vpk");
        let mut snapshot = Snapshot::new();
        snapshot.insert("a", "b", vec![42; 4096]);
        let config = PackageConfig::default().with_compression(Compression::Brotli);

        let header = save_snapshot(&snapshot, &dest, &key(3), &config).unwrap();
        assert_eq!(header.name, "assets.pkg");
        let on_disk = std::fs::metadata(&dest).unwrap().len();
        assert_eq!(on_disk, HEADER_SIZE as u64 + header.payload_size);
        assert_eq!(open_snapshot(&dest, &key(3), &config).unwrap(), snapshot);
    }

    #[test]
    fn test_open_with_wrong_settings() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("p.vpk");
        let mut snapshot = Snapshot::new();
        snapshot.insert("f", "x", vec![1, 2, 3]);
        let config = PackageConfig::default();
        save_snapshot(&snapshot, &dest, &key(1), &config).unwrap();

        assert!(matches!(
            open_snapshot(&dest, &key(2), &config),
            Err(VpkError::KeyMismatch)
        ));
        let wrong_codec = config.clone().with_compression(Compression::Lz4);
        assert!(matches!(
            open_snapshot(&dest, &key(1), &wrong_codec),
            Err(VpkError::CompressionMismatch)
        ));
    }

    #[test]
    fn test_mode_mismatches() {
        let header = sample_header(0);
        let config = PackageConfig::default();
        assert!(mode_mismatches(&header, &config).is_empty());

        let other = config
            .with_encryption(Encryption::Gcm)
            .with_compression(Compression::Gzip);
        let found = mode_mismatches(&header, &other);
        assert_eq!(found.len(), 2);
        assert!(found[0].contains("CHACHA20"));
        assert!(found[1].contains("gzip"));
    }

    #[test]
    fn test_default_destination() {
        assert_eq!(
            default_destination(Path::new("data/assets")),
            PathBuf::from("data/assets.vpk")
        );
        assert_eq!(
            default_destination(Path::new("data/assets/")),
            PathBuf::from("data/assets.vpk")
        );
    }

    #[test]
    fn test_package_name() {
        assert_eq!(package_name(Path::new("/tmp/out/bundle.vpk")), "bundle");
        assert_eq!(package_name(Path::new("bundle")), "bundle");
    }
}
