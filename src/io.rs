//! File-system collaborators of the pipeline: image probing, image copying,
//! and reading/writing JSON documents.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::coco::CocoFile;
use crate::error::{ConvertError, Result};
use crate::types::SourceRecord;

/// Reads the pixel dimensions of an image file
pub trait ImageProbe {
    /// `(width, height)` of the image, or a description of why it cannot be read
    fn dimensions(&self, path: &Path) -> std::result::Result<(u32, u32), String>;
}

/// Probe that decodes only the image header
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderProbe;

impl ImageProbe for HeaderProbe {
    fn dimensions(&self, path: &Path) -> std::result::Result<(u32, u32), String> {
        let size = imagesize::size(path).map_err(|e| e.to_string())?;
        pixel_dimensions(size.width, size.height)
    }
}

fn pixel_dimensions(width: usize, height: usize) -> std::result::Result<(u32, u32), String> {
    let width =
        u32::try_from(width).map_err(|_| format!("image width {} does not fit in u32", width))?;
    let height = u32::try_from(height)
        .map_err(|_| format!("image height {} does not fit in u32", height))?;
    Ok((width, height))
}

/// Places a source image into a split directory
pub trait FileCopier {
    fn copy(&self, src: &Path, dst: &Path) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FsCopier;

impl FileCopier for FsCopier {
    fn copy(&self, src: &Path, dst: &Path) -> Result<()> {
        let copy_failed = |source| ConvertError::CopyFailed {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
            source,
        };
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).map_err(copy_failed)?;
        }
        fs::copy(src, dst).map(|_| ()).map_err(copy_failed)
    }
}

/// Read a Labelbox export: a non-empty JSON array of records
pub fn read_source_export(path: &Path) -> Result<Vec<SourceRecord>> {
    let file = File::open(path).map_err(|e| ConvertError::MalformedSource {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    let records: Vec<SourceRecord> =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            ConvertError::MalformedSource {
                path: path.to_path_buf(),
                source: Box::new(e),
            }
        })?;

    if records.is_empty() {
        return Err(ConvertError::EmptySource {
            path: path.to_path_buf(),
        });
    }
    Ok(records)
}

/// Write a COCO document.
///
/// The document goes to a temporary sibling first and is renamed into place,
/// so `path` either holds a complete document or is left untouched.
pub fn write_coco_file(path: &Path, coco: &CocoFile) -> Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    let context = || format!("failed to write {}", path.display());

    let file = File::create(&tmp_path).map_err(|e| ConvertError::io(context(), e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, coco)
        .map_err(|e| ConvertError::io(context(), std::io::Error::from(e)))?;
    writer.flush().map_err(|e| ConvertError::io(context(), e))?;
    drop(writer);

    fs::rename(&tmp_path, path).map_err(|e| ConvertError::io(context(), e))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_source_export_rejects_empty_and_malformed() {
        let temp_dir = tempfile::tempdir().unwrap();

        let empty = temp_dir.path().join("empty.json");
        fs::write(&empty, "[]").unwrap();
        assert!(matches!(
            read_source_export(&empty),
            Err(ConvertError::EmptySource { .. })
        ));

        let object = temp_dir.path().join("object.json");
        fs::write(&object, r#"{"ID": "a"}"#).unwrap();
        assert!(matches!(
            read_source_export(&object),
            Err(ConvertError::MalformedSource { .. })
        ));

        let missing = temp_dir.path().join("missing.json");
        assert!(matches!(
            read_source_export(&missing),
            Err(ConvertError::MalformedSource { .. })
        ));
    }

    #[test]
    fn test_fs_copier_reports_missing_source() {
        let temp_dir = tempfile::tempdir().unwrap();
        let src = temp_dir.path().join("nope.jpg");
        let dst = temp_dir.path().join("out.jpg");

        match FsCopier.copy(&src, &dst) {
            Err(ConvertError::CopyFailed { src: s, dst: d, .. }) => {
                assert_eq!(s, src);
                assert_eq!(d, dst);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!dst.exists());
    }

    #[test]
    fn test_fs_copier_creates_nested_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let src = temp_dir.path().join("a.jpg");
        fs::write(&src, b"AAA").unwrap();
        let dst = temp_dir.path().join("train").join("batch1").join("a.jpg");

        FsCopier.copy(&src, &dst).unwrap();

        assert_eq!(fs::read(&dst).unwrap(), b"AAA");
    }

    #[test]
    fn test_pixel_dimensions_reject_overflow() {
        assert_eq!(pixel_dimensions(640, 480), Ok((640, 480)));
        let too_wide = u32::MAX as u64 + 1;
        if let Ok(too_wide) = usize::try_from(too_wide) {
            let err = pixel_dimensions(too_wide, 1).unwrap_err();
            assert!(err.contains("width"));
            assert!(pixel_dimensions(1, too_wide).unwrap_err().contains("height"));
        }
    }

    #[test]
    fn test_header_probe_rejects_non_images() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("not_an_image.jpg");
        fs::write(&path, b"plain text").unwrap();

        assert!(HeaderProbe.dimensions(&path).is_err());
        assert!(HeaderProbe
            .dimensions(&temp_dir.path().join("absent.png"))
            .is_err());
    }
}
