use std::path::Path;

use crate::coco::{rectangle_to_polygon, Annotation, Category, Image};
use crate::error::{ConvertError, Result};
use crate::io::ImageProbe;
use crate::types::{SourceObject, SourceRecord};

/// Build the category list from the objects of the first labeled record.
///
/// Ids start at 1 in first-seen order. Names are kept verbatim; a title that
/// matches an earlier one case-insensitively does not open a new category,
/// and objects without a title are ignored.
pub fn build_categories(objects: &[SourceObject]) -> Vec<Category> {
    let mut categories: Vec<Category> = Vec::new();
    for object in objects {
        if !object.title.is_empty() && find_category(&categories, &object.title).is_none() {
            categories.push(Category {
                id: categories.len() as u32 + 1,
                name: object.title.clone(),
                supercategory: None,
            });
        }
    }
    categories
}

/// Case-insensitive lookup of a category by name
pub fn find_category<'a>(categories: &'a [Category], title: &str) -> Option<&'a Category> {
    let title = title.to_lowercase();
    categories.iter().find(|c| c.name.to_lowercase() == title)
}

/// Convert one labeled object into a COCO annotation.
///
/// `bbox` is emitted in corner form `[left, top, right, bottom]` and
/// `segmentation` as the box corners clockwise from the top-left.
pub fn transform_object(
    record: &SourceRecord,
    object: &SourceObject,
    image_id: u32,
    annotation_id: u32,
    categories: &[Category],
) -> Result<Annotation> {
    let category = find_category(categories, &object.title).ok_or_else(|| {
        ConvertError::CategoryNotFound {
            record: record.display_id().to_string(),
            title: object.title.clone(),
        }
    })?;

    let bbox = match object.bbox {
        Some(bbox) if bbox.is_valid() => bbox,
        _ => {
            return Err(ConvertError::UnsupportedGeometry {
                record: record.display_id().to_string(),
                title: object.title.clone(),
            })
        }
    };

    Ok(Annotation {
        id: annotation_id,
        image_id,
        category_id: category.id,
        segmentation: rectangle_to_polygon(bbox.left, bbox.top, bbox.right(), bbox.bottom()),
        area: bbox.width * bbox.height,
        bbox: [bbox.left, bbox.top, bbox.right(), bbox.bottom()],
        iscrowd: 0,
    })
}

/// Build the image entry of a record, probing the source image for its size
pub fn build_image_record(
    record: &SourceRecord,
    image_id: u32,
    image_dir: &Path,
    probe: &dyn ImageProbe,
) -> Result<Image> {
    let reference = record.image_reference()?;
    let image_path = image_dir.join(reference);
    let (width, height) =
        probe
            .dimensions(&image_path)
            .map_err(|message| ConvertError::ImageUnreadable {
                record: record.display_id().to_string(),
                path: image_path.clone(),
                message,
            })?;

    Ok(Image {
        id: image_id,
        file_name: reference.to_string(),
        license: None,
        flickr_url: reference.to_string(),
        coco_url: reference.to_string(),
        date_captured: None,
        width,
        height,
    })
}
