use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .progress_chars("#>-"),
    );
    pb
}

/// Create an output directory if missing and return its path.
///
/// Existing directories and their contents are kept.
pub fn create_output_directory(path: &Path) -> Result<PathBuf> {
    if path.is_dir() {
        log::debug!("Directory {:?} already exists", path);
    }
    fs::create_dir_all(path).map_err(|e| {
        ConvertError::io(format!("failed to create directory {}", path.display()), e)
    })?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_output_directory_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("datasets").join("train");

        assert_eq!(create_output_directory(&dir).unwrap(), dir);
        fs::write(dir.join("kept.jpg"), b"x").unwrap();
        create_output_directory(&dir).unwrap();

        assert!(dir.join("kept.jpg").exists());
    }
}
