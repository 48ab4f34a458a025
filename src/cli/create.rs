use crate::config::PackageConfig;
use crate::error::Result;
use crate::key::KeyMaterial;
use crate::package::{create_package, CreateReport};
use std::path::Path;

/// Options for the create command
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Key phrase
    pub key: String,
    /// IV phrase, salts the key derivation
    pub iv: String,
    pub config: PackageConfig,
}

/// Pack `input_dir` into the package at `output_path`
pub fn create_from_dir(
    input_dir: &Path,
    output_path: &Path,
    options: &CreateOptions,
) -> Result<CreateReport> {
    let key = KeyMaterial::derive(&options.key, &options.iv)?;
    create_package(input_dir, output_path, &key, &options.config)
}
