//! COCO dataset processing module
//!
//! Drives one conversion run: read the Labelbox export, build the shared
//! category list, route every labeled record to the validation or training
//! split, copy its image and record it, then write both COCO documents.

use log::info;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::coco::{Category, CocoWriter, Info};
use crate::config::PipelineConfig;
use crate::conversion::{build_categories, build_image_record, transform_object};
use crate::dataset::{route, Split};
use crate::error::{ConvertError, Result};
use crate::io::{
    read_source_export, write_coco_file, FileCopier, FsCopier, HeaderProbe, ImageProbe,
};
use crate::types::{ProcessingStats, SourceObject, SourceRecord};
use crate::utils::{create_output_directory, create_progress_bar};

/// Struct to hold the paths to the output directories for COCO dataset
#[derive(Debug)]
pub struct CocoOutputDirs {
    pub annotations_dir: PathBuf,
    pub train_images_dir: PathBuf,
    pub val_images_dir: PathBuf,
}

impl CocoOutputDirs {
    pub fn images_dir(&self, split: Split) -> &Path {
        match split {
            Split::Train => &self.train_images_dir,
            Split::Validation => &self.val_images_dir,
        }
    }
}

/// Set up the directory structure for COCO dataset output
pub fn setup_coco_output_directories(output_dir: &Path) -> Result<CocoOutputDirs> {
    Ok(CocoOutputDirs {
        train_images_dir: create_output_directory(&output_dir.join(Split::Train.dir_name()))?,
        val_images_dir: create_output_directory(&output_dir.join(Split::Validation.dir_name()))?,
        annotations_dir: create_output_directory(&output_dir.join("annotations"))?,
    })
}

/// Collaborators used while converting records
pub struct Collaborators<'a> {
    pub probe: &'a dyn ImageProbe,
    pub copier: &'a dyn FileCopier,
}

/// Main COCO dataset processing pipeline, backed by the file system
pub fn process_coco_dataset(config: &PipelineConfig) -> Result<ProcessingStats> {
    process_coco_dataset_with(
        config,
        Collaborators {
            probe: &HeaderProbe,
            copier: &FsCopier,
        },
    )
}

/// Run the pipeline with the given collaborators
pub fn process_coco_dataset_with(
    config: &PipelineConfig,
    collaborators: Collaborators,
) -> Result<ProcessingStats> {
    let records = read_source_export(&config.json_file)?;
    info!(
        "Read {} records from {}",
        records.len(),
        config.json_file.display()
    );
    let (project_name, created_by) = project_metadata(&records[0])?;

    let categories = shared_categories(&records);
    info!("Found {} categories.", categories.len());

    let output_dirs = setup_coco_output_directories(&config.output_dir)?;

    let info = Info::new(project_name, created_by, &config.url);
    let mut writers = SplitWriters {
        train: CocoWriter::new(info.clone(), Arc::clone(&categories)),
        val: CocoWriter::new(info, categories),
    };

    let stats = convert_records(&records, config, &output_dirs, &mut writers, collaborators)?;

    info!("Writing COCO JSON files...");
    let SplitWriters { train, val } = writers;
    write_coco_file(
        &output_dirs
            .annotations_dir
            .join(Split::Train.annotation_file_name()),
        &train.finalize(),
    )?;
    write_coco_file(
        &output_dirs
            .annotations_dir
            .join(Split::Validation.annotation_file_name()),
        &val.finalize(),
    )?;

    stats.print_summary();
    Ok(stats)
}

/// The two accumulators of a run
struct SplitWriters {
    train: CocoWriter,
    val: CocoWriter,
}

impl SplitWriters {
    fn get_mut(&mut self, split: Split) -> &mut CocoWriter {
        match split {
            Split::Train => &mut self.train,
            Split::Validation => &mut self.val,
        }
    }
}

// Project name and creator are only read from the first record
fn project_metadata(first: &SourceRecord) -> Result<(&str, &str)> {
    let project_name = first
        .project_name
        .as_deref()
        .ok_or(ConvertError::MissingProjectField {
            field: "Project Name",
        })?;
    let created_by = first
        .created_by
        .as_deref()
        .ok_or(ConvertError::MissingProjectField {
            field: "Created By",
        })?;
    Ok((project_name, created_by))
}

/// Category list shared by both splits, taken from the first record with objects
pub fn shared_categories(records: &[SourceRecord]) -> Arc<[Category]> {
    records
        .iter()
        .filter_map(|record| record.label.objects())
        .find(|objects| !objects.is_empty())
        .map(build_categories)
        .unwrap_or_default()
        .into()
}

fn convert_records(
    records: &[SourceRecord],
    config: &PipelineConfig,
    output_dirs: &CocoOutputDirs,
    writers: &mut SplitWriters,
    collaborators: Collaborators,
) -> Result<ProcessingStats> {
    let mut stats = ProcessingStats::new();
    let pb = create_progress_bar(records.len() as u64, "Convert");

    for record in records {
        stats.increment_total();
        pb.inc(1);

        let Some(objects) = record.label.objects() else {
            stats.increment_unlabeled(record);
            continue;
        };

        let split = route(stats.ingested_records, config.val_count);
        let writer = writers.get_mut(split);
        let params = IngestParams {
            record,
            objects,
            image_dir: &config.image_dir,
            images_dir: output_dirs.images_dir(split),
            collaborators: &collaborators,
        };

        match ingest_record(params, writer, &mut stats) {
            Ok(image_id) => {
                log::debug!(
                    "record {} -> {} image {}",
                    record.display_id(),
                    split,
                    image_id
                );
                stats.ingested_records += 1;
                match split {
                    Split::Train => stats.train_records += 1,
                    Split::Validation => stats.val_records += 1,
                }
            }
            Err(e) if e.is_fatal() => {
                pb.abandon();
                return Err(e);
            }
            Err(e) => stats.record_skip(&e, record),
        }
    }

    pb.finish_with_message("Conversion complete");
    Ok(stats)
}

/// Parameters for ingesting a single record into a split
struct IngestParams<'a> {
    record: &'a SourceRecord,
    objects: &'a [SourceObject],
    image_dir: &'a Path,
    images_dir: &'a Path,
    collaborators: &'a Collaborators<'a>,
}

/// Size the image, convert its objects, copy it, and only then commit it to
/// the writer. Returns the id of the committed image.
fn ingest_record(
    params: IngestParams,
    writer: &mut CocoWriter,
    stats: &mut ProcessingStats,
) -> Result<u32> {
    let IngestParams {
        record,
        objects,
        image_dir,
        images_dir,
        collaborators,
    } = params;

    let image_id = writer.next_image_id();
    let image = build_image_record(record, image_id, image_dir, collaborators.probe)?;

    let mut annotations = Vec::with_capacity(objects.len());
    let mut dropped = Vec::new();
    for object in objects {
        let annotation_id = writer.next_annotation_id() + annotations.len() as u32;
        match transform_object(record, object, image_id, annotation_id, writer.categories()) {
            Ok(annotation) => annotations.push(annotation),
            Err(e) => dropped.push(e),
        }
    }

    let src = image_dir.join(&image.file_name);
    let dst = copy_destination(&image.file_name, &src, images_dir)?;
    collaborators.copier.copy(&src, &dst)?;

    for e in &dropped {
        stats.record_skip(e, record);
    }
    let committed = writer.add_image(image);
    for annotation in annotations {
        writer.add_annotation(annotation);
    }
    Ok(committed)
}

// Images keep their exported relative path inside the split directory
fn copy_destination(reference: &str, src: &Path, images_dir: &Path) -> Result<PathBuf> {
    let relative = Path::new(reference);
    let stays_inside = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
    if !stays_inside || relative.file_name().is_none() {
        return Err(ConvertError::CopyFailed {
            src: src.to_path_buf(),
            dst: images_dir.join(relative),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("'{}' is not a file path inside the split directory", reference),
            ),
        });
    }
    Ok(images_dir.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_project_metadata_required() {
        let complete: SourceRecord = serde_json::from_value(json!({
            "ID": "a", "Project Name": "P", "Created By": "u"
        }))
        .unwrap();
        assert_eq!(project_metadata(&complete).unwrap(), ("P", "u"));

        let no_creator: SourceRecord =
            serde_json::from_value(json!({"ID": "a", "Project Name": "P"})).unwrap();
        assert!(matches!(
            project_metadata(&no_creator),
            Err(ConvertError::MissingProjectField { field: "Created By" })
        ));
    }

    #[test]
    fn test_shared_categories_skip_unlabeled_records() {
        let records: Vec<SourceRecord> = serde_json::from_value(json!([
            {"ID": "a", "Label": "Skip"},
            {"ID": "b", "Label": {"objects": []}},
            {"ID": "c", "Label": {"objects": [
                {"title": "Dog", "bbox": {"left": 0, "top": 0, "width": 1, "height": 1}},
                {"title": "Cat", "bbox": {"left": 0, "top": 0, "width": 1, "height": 1}}
            ]}},
            {"ID": "d", "Label": {"objects": [
                {"title": "Bird", "bbox": {"left": 0, "top": 0, "width": 1, "height": 1}}
            ]}}
        ]))
        .unwrap();

        let categories = shared_categories(&records);
        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Dog", "Cat"]);
        assert_eq!(categories[1].id, 2);
    }

    #[test]
    fn test_copy_destination_keeps_relative_path() {
        let dir = Path::new("out");
        assert_eq!(
            copy_destination("batch1/a.jpg", Path::new("src"), dir).unwrap(),
            Path::new("out/batch1/a.jpg")
        );
        assert_eq!(
            copy_destination("a.jpg", Path::new("src"), dir).unwrap(),
            Path::new("out/a.jpg")
        );
        for escaping in ["..", "../a.jpg", "batch1/../../a.jpg", "/etc/a.jpg"] {
            assert!(matches!(
                copy_destination(escaping, Path::new("src"), dir),
                Err(ConvertError::CopyFailed { .. })
            ));
        }
    }
}
