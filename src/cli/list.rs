use crate::cli::extract::OpenOptions;
use crate::cli::info::format_size;
use crate::error::Result;
use crate::snapshot::content_type;
use std::path::Path;

/// List every folder and file in a package with its content type and size
pub fn list_contents(path: &Path, options: &OpenOptions) -> Result<String> {
    let snapshot = options.open(path)?;

    let mut output = String::new();
    for (folder, files) in snapshot.folders() {
        output.push_str(&format!("{}/\n", folder));
        for (name, contents) in files {
            output.push_str(&format!(
                "  {:<40} {:<26} {:>10}\n",
                name,
                content_type(contents),
                format_size(contents.len() as u64)
            ));
        }
    }
    output.push_str(&format!(
        "\n{} folders, {} files, {}\n",
        snapshot.folder_count(),
        snapshot.file_count(),
        format_size(snapshot.total_bytes() as u64)
    ));

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::create::{create_from_dir, CreateOptions};
    use crate::error::VpkError;
    use tempfile::tempdir;

    #[test]
    fn test_list_contents() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("project");
        std::fs::create_dir_all(input.join("src")).unwrap();
        std::fs::write(input.join("src/main.rs"), b"fn main() {}").unwrap();
        std::fs::write(input.join("Cargo.toml"), vec![b'#'; 2048]).unwrap();
        let output = dir.path().join("project.vpk");

        let create = CreateOptions {
            key: "k".into(),
            iv: "v".into(),
            ..Default::default()
        };
        create_from_dir(&input, &output, &create).unwrap();

        let open = OpenOptions {
            key: "k".into(),
            iv: "v".into(),
            ..Default::default()
        };
        let listing = list_contents(&output, &open).unwrap();
        assert!(listing.contains("project/\n"));
        assert!(listing.contains("src/\n"));
        assert!(listing.contains("main.rs"));
        assert!(listing.contains("2.0 KB"));
        assert!(listing.contains("2 folders, 2 files"));

        let wrong = OpenOptions {
            key: "other".into(),
            iv: "v".into(),
            ..Default::default()
        };
        assert!(matches!(list_contents(&output, &wrong), Err(VpkError::KeyMismatch)));
    }

    #[test]
    fn test_list_reports_content_types() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("media");
        std::fs::create_dir_all(&input).unwrap();
        let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        png.extend_from_slice(&[0; 24]);
        std::fs::write(input.join("logo.png"), &png).unwrap();
        std::fs::write(input.join("notes.txt"), b"release notes").unwrap();
        let output = dir.path().join("media.vpk");

        let create = CreateOptions {
            key: "k".into(),
            iv: "v".into(),
            ..Default::default()
        };
        create_from_dir(&input, &output, &create).unwrap();

        let open = OpenOptions {
            key: "k".into(),
            iv: "v".into(),
            ..Default::default()
        };
        let listing = list_contents(&output, &open).unwrap();
        let line = |name: &str| {
            listing
                .lines()
                .find(|line| line.trim_start().starts_with(name))
                .unwrap()
                .to_string()
        };
        assert!(line("logo.png").contains("image/png"));
        assert!(line("notes.txt").contains("text/plain"));
    }
}
