use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use labelbox2coco::{process_coco_dataset, Args};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = args.to_pipeline_config();

    if !config.image_dir.is_dir() {
        error!("The specified image_dir does not exist: {}", args.image_dir);
        return ExitCode::FAILURE;
    }

    info!("Starting Labelbox to COCO conversion process...");

    match process_coco_dataset(&config) {
        Ok(stats) => {
            info!(
                "COCO conversion process completed successfully: {} train, {} val images.",
                stats.train_records, stats.val_records
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to process dataset: {}", e);
            ExitCode::FAILURE
        }
    }
}
