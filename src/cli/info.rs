use crate::error::{Result, VpkError};
use crate::header::HEADER_SIZE;
use crate::package::read_package_header;
use std::path::Path;

/// Display the header of a package; no key required
pub fn show_info(path: &Path) -> Result<String> {
    let header = read_package_header(path)?;
    let file_size = std::fs::metadata(path)?.len();

    let created = header
        .created_at()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "invalid".to_string());

    let mut output = String::new();

    output.push_str("VPK Package Information\n");
    output.push_str("=======================\n\n");

    output.push_str(&format!("File: {}\n", path.display()));
    output.push_str(&format!("Name: {}\n", header.name));
    output.push_str(&format!("Description: {}\n", header.description));
    output.push_str(&format!("Author: {}\n", header.author));
    output.push_str(&format!("Copyright: {}\n", header.copyright));
    output.push_str(&format!("Created: {} ({})\n", created, header.timestamp));
    output.push_str(&format!("Version: {}\n", header.version));
    output.push('\n');

    output.push_str("Modes:\n");
    output.push_str(&format!("  Encryption: {}\n", header.encryption));
    output.push_str(&format!("  Key length: {} bytes\n", header.key_length));
    output.push_str(&format!("  Compression: {}\n", header.compression));
    output.push('\n');

    output.push_str("Storage:\n");
    output.push_str(&format!("  Header: {} bytes\n", HEADER_SIZE));
    output.push_str(&format!("  Payload: {}\n", format_size(header.payload_size)));
    output.push_str(&format!("  File size: {}\n", format_size(file_size)));

    Ok(output)
}

/// The header of a package as pretty-printed JSON
pub fn show_info_json(path: &Path) -> Result<String> {
    let header = read_package_header(path)?;
    serde_json::to_string_pretty(&header).map_err(|e| VpkError::Serialization(e.to_string()))
}

pub(crate) fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
