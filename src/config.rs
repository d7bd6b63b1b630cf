use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

use crate::coco::DEFAULT_INFO_URL;

/// Command-line arguments for converting a Labelbox export to COCO train/val datasets.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    /// Labelbox JSON export file
    #[arg(short = 'f', long = "json_file")]
    pub json_file: String,

    /// Directory holding the images referenced by the export
    #[arg(short = 'i', long = "image_dir")]
    pub image_dir: String,

    /// Number of successfully converted records exported to the validation split
    /// before switching to the training split
    #[arg(long = "val_count", default_value_t = 400, value_parser = validate_count)]
    pub val_count: usize,

    /// Root directory of the generated datasets
    #[arg(short = 'o', long = "output_dir", default_value = "datasets")]
    pub output_dir: String,

    /// Value written to `info.url` of both COCO files
    #[arg(long = "url", default_value = DEFAULT_INFO_URL)]
    pub url: String,
}

impl Args {
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            json_file: PathBuf::from(&self.json_file),
            image_dir: PathBuf::from(&self.image_dir),
            val_count: self.val_count,
            output_dir: PathBuf::from(&self.output_dir),
            url: self.url.clone(),
        }
    }
}

/// Settings of one conversion run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub json_file: PathBuf,
    pub image_dir: PathBuf,
    pub val_count: usize,
    pub output_dir: PathBuf,
    pub url: String,
}

// Validate that the split threshold is a whole, non-negative number
fn validate_count(s: &str) -> Result<usize, String> {
    usize::from_str(s.trim()).map_err(|_| "COUNT must be a non-negative integer".to_string())
}
