//! Labelbox to COCO format converter
//!
//! This library converts a Labelbox JSON export into COCO object-detection
//! datasets, splitting the labeled records into a validation and a training
//! set and copying each image next to its split's annotations.

pub mod coco;
pub mod coco_dataset;
pub mod config;
pub mod conversion;
pub mod dataset;
pub mod error;
pub mod io;
pub mod types;
pub mod utils;

// Re-export commonly used types and functions
pub use config::{Args, PipelineConfig};
pub use dataset::{route, Split};
pub use error::ConvertError;
pub use types::{BoundingBox, Label, ProcessingStats, SourceObject, SourceRecord};

// COCO-specific exports
pub use coco::{Annotation, Category, CocoFile, CocoWriter, Image, Info, License};
pub use coco_dataset::{
    process_coco_dataset, process_coco_dataset_with, setup_coco_output_directories, Collaborators,
};
pub use io::{FileCopier, FsCopier, HeaderProbe, ImageProbe};
