//! COCO format data structures and the per-split export accumulator
//!
//! The layout of these types is the historical output of the Labelbox
//! exporter: `licenses` is a single descriptor, and `bbox` holds the two
//! corners `[left, top, right, bottom]` instead of `[x, y, width, height]`.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default value of `info.url`
pub const DEFAULT_INFO_URL: &str = "labelbox.com";

/// COCO dataset information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub year: i32,
    pub version: Option<String>,
    pub description: String,
    pub contributor: String,
    pub url: String,
    pub date_created: String,
}

impl Info {
    /// Metadata for a project export created now
    pub fn new(project_name: &str, created_by: &str, url: &str) -> Self {
        let now = chrono::Utc::now();
        Self {
            year: now.year(),
            version: None,
            description: project_name.to_string(),
            contributor: created_by.to_string(),
            url: url.to_string(),
            date_created: now.to_rfc3339(),
        }
    }
}

/// COCO license information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub id: u32,
    pub name: Option<String>,
    pub url: Option<String>,
}

impl Default for License {
    fn default() -> Self {
        Self {
            id: 1,
            name: None,
            url: None,
        }
    }
}

/// COCO category information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
    pub supercategory: Option<String>,
}

/// COCO image information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: u32,
    pub file_name: String,
    pub license: Option<u32>,
    pub flickr_url: String,
    pub coco_url: String,
    pub date_captured: Option<String>,
    pub width: u32,
    pub height: u32,
}

/// COCO annotation information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: u32,
    pub image_id: u32,
    pub category_id: u32,
    pub segmentation: [f64; 8],
    pub area: f64,
    pub bbox: [f64; 4], // [left, top, right, bottom]
    pub iscrowd: u8,
}

/// Complete COCO dataset structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoFile {
    pub info: Info,
    pub images: Vec<Image>,
    pub annotations: Vec<Annotation>,
    pub licenses: License,
    pub categories: Vec<Category>,
}

/// Accumulator for one split of the export.
///
/// Images and annotations are append-only and get sequential ids starting at
/// 1, independently of any other writer. The category list is shared with
/// the writers of the other splits.
#[derive(Debug)]
pub struct CocoWriter {
    info: Info,
    categories: Arc<[Category]>,
    images: Vec<Image>,
    annotations: Vec<Annotation>,
}

impl CocoWriter {
    pub fn new(info: Info, categories: Arc<[Category]>) -> Self {
        Self {
            info,
            categories,
            images: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Id the next added image will receive
    pub fn next_image_id(&self) -> u32 {
        self.images.len() as u32 + 1
    }

    /// Id the next added annotation will receive
    pub fn next_annotation_id(&self) -> u32 {
        self.annotations.len() as u32 + 1
    }

    /// Append an image, assigning it the next image id
    pub fn add_image(&mut self, mut image: Image) -> u32 {
        let image_id = self.next_image_id();
        image.id = image_id;
        self.images.push(image);
        image_id
    }

    /// Append an annotation, assigning it the next annotation id.
    ///
    /// The referenced image must already be added to this writer.
    pub fn add_annotation(&mut self, mut annotation: Annotation) -> u32 {
        debug_assert!(
            annotation.image_id >= 1 && annotation.image_id < self.next_image_id(),
            "annotation references image {} not in this split",
            annotation.image_id
        );
        debug_assert!(
            self.categories.iter().any(|c| c.id == annotation.category_id),
            "annotation references unknown category {}",
            annotation.category_id
        );
        let annotation_id = self.next_annotation_id();
        annotation.id = annotation_id;
        self.annotations.push(annotation);
        annotation_id
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn categories(&self) -> &Arc<[Category]> {
        &self.categories
    }

    /// Build the complete COCO dataset structure
    pub fn finalize(self) -> CocoFile {
        CocoFile {
            info: self.info,
            images: self.images,
            annotations: self.annotations,
            licenses: License::default(),
            categories: self.categories.to_vec(),
        }
    }
}

/// Convert a rectangle to its four corners, clockwise from the top-left
pub fn rectangle_to_polygon(x1: f64, y1: f64, x2: f64, y2: f64) -> [f64; 8] {
    [x1, y1, x2, y1, x2, y2, x1, y2]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer() -> CocoWriter {
        let categories: Arc<[Category]> = vec![Category {
            id: 1,
            name: "Cat".to_string(),
            supercategory: None,
        }]
        .into();
        CocoWriter::new(Info::new("P", "u", DEFAULT_INFO_URL), categories)
    }

    fn image(file_name: &str) -> Image {
        Image {
            id: 0,
            file_name: file_name.to_string(),
            license: None,
            flickr_url: file_name.to_string(),
            coco_url: file_name.to_string(),
            date_captured: None,
            width: 10,
            height: 10,
        }
    }

    #[test]
    fn test_writer_assigns_sequential_ids() {
        let mut writer = writer();
        assert_eq!(writer.next_image_id(), 1);
        assert_eq!(writer.add_image(image("a.jpg")), 1);
        assert_eq!(writer.add_image(image("b.jpg")), 2);

        let annotation = Annotation {
            id: 99,
            image_id: 2,
            category_id: 1,
            segmentation: rectangle_to_polygon(0.0, 0.0, 1.0, 1.0),
            area: 1.0,
            bbox: [0.0, 0.0, 1.0, 1.0],
            iscrowd: 0,
        };
        assert_eq!(writer.add_annotation(annotation.clone()), 1);
        assert_eq!(writer.add_annotation(annotation), 2);

        let coco = writer.finalize();
        let ids: Vec<u32> = coco.images.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(coco.annotations[1].id, 2);
        assert_eq!(coco.licenses, License::default());
        assert_eq!(coco.info.description, "P");
        assert_eq!(coco.info.contributor, "u");
        assert_eq!(coco.info.version, None);
    }

    #[test]
    fn test_rectangle_to_polygon_is_clockwise() {
        assert_eq!(
            rectangle_to_polygon(1.0, 2.0, 4.0, 6.0),
            [1.0, 2.0, 4.0, 2.0, 4.0, 6.0, 1.0, 6.0]
        );
    }

    #[test]
    fn test_info_uses_current_utc_year() {
        let info = Info::new("P", "u", "example.com");
        assert_eq!(info.year, chrono::Utc::now().year());
        assert!(chrono::DateTime::parse_from_rfc3339(&info.date_created).is_ok());
        assert_eq!(info.url, "example.com");
    }
}
