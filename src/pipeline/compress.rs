use crate::error::{Result, VpkError};
use crate::header::Compression;
use std::io::{Read, Write};

/// Compress data with the given codec
pub fn compress(data: &[u8], algorithm: Compression) -> Result<Vec<u8>> {
    match algorithm {
        Compression::None => Ok(data.to_vec()),
        Compression::Gzip => compress_gzip(data),
        Compression::Zstd => compress_zstd(data),
        Compression::Lz4 => compress_lz4(data),
        Compression::Brotli => compress_brotli(data),
    }
}

/// Decompress data with the given codec
pub fn decompress(data: &[u8], algorithm: Compression) -> Result<Vec<u8>> {
    match algorithm {
        Compression::None => Ok(data.to_vec()),
        Compression::Gzip => decompress_gzip(data),
        Compression::Zstd => decompress_zstd(data),
        Compression::Lz4 => decompress_lz4(data),
        Compression::Brotli => decompress_brotli(data),
    }
}

fn compress_gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| VpkError::Compression(format!("gzip: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| VpkError::Compression(format!("gzip: {}", e)))
}

fn decompress_gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    flate2::read::GzDecoder::new(data)
        .read_to_end(&mut output)
        .map_err(|e| VpkError::Compression(format!("gzip: {}", e)))?;
    Ok(output)
}

fn compress_zstd(data: &[u8]) -> Result<Vec<u8>> {
    zstd::encode_all(data, 3).map_err(|e| VpkError::Compression(format!("zstd: {}", e)))
}

fn decompress_zstd(data: &[u8]) -> Result<Vec<u8>> {
    zstd::decode_all(data).map_err(|e| VpkError::Compression(format!("zstd: {}", e)))
}

fn compress_lz4(data: &[u8]) -> Result<Vec<u8>> {
    Ok(lz4_flex::compress_prepend_size(data))
}

/// Upper bound on the LZ4 expansion ratio, used to reject absurd size prefixes
const LZ4_MAX_RATIO: usize = 255;

fn decompress_lz4(data: &[u8]) -> Result<Vec<u8>> {
    if let Some(prefix) = data.get(..4) {
        let mut size = [0u8; 4];
        size.copy_from_slice(prefix);
        let declared = u32::from_le_bytes(size) as usize;
        if declared > data.len().saturating_mul(LZ4_MAX_RATIO) + 16 {
            return Err(VpkError::Compression(format!(
                "lz4: declared size {} exceeds what {} bytes can expand to",
                declared,
                data.len()
            )));
        }
    }
    lz4_flex::decompress_size_prepended(data)
        .map_err(|e| VpkError::Compression(format!("lz4: {}", e)))
}

fn compress_brotli(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    {
        let mut writer = brotli::CompressorWriter::new(&mut output, 4096, 9, 22);
        writer
            .write_all(data)
            .map_err(|e| VpkError::Compression(format!("brotli: {}", e)))?;
    }
    Ok(output)
}

fn decompress_brotli(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut reader = brotli::Decompressor::new(data, 4096);
    reader
        .read_to_end(&mut output)
        .map_err(|e| VpkError::Compression(format!("brotli: {}", e)))?;
    Ok(output)
}
