//! # Dataset Generator
//!
//! Turns a folder of labeled images into numeric arrays for training image
//! classifiers, and draws quick figures of the result.
//!
//! ## Modules
//!
//! - `dataset`: Folder scanning, one-hot labels, class lists and train/test splits
//! - `storage`: `.npy` arrays and newline separated text files
//! - `visualize`: Image grids and training curves rendered to SVG
//! - `config`: TOML configuration for the CLI
//! - `utils`: Errors, logging and small helpers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use dataset_generator::dataset::{dataset_to_npy, ScanConfig, SplitConfig};
//!
//! // data/pets/{cats,dogs}/*.jpg -> pets_dataTrain.npy, pets_labelsTrain.npy, ...
//! let files = dataset_to_npy(
//!     Path::new("data/pets"),
//!     "pets",
//!     &ScanConfig::default(),
//!     &SplitConfig::default(),
//! )?;
//! ```

pub mod config;
pub mod dataset;
pub mod storage;
pub mod utils;
pub mod visualize;

// Re-export commonly used items for convenience
pub use config::GeneratorConfig;
pub use dataset::{
    dataset_to_npy, get_label, load_classes, load_images, save_classes, scan_dataset,
    split_dataset, ChannelOrder, ClassOrder, ClassSource, Dataset, DatasetSplit, Partition,
    SampleFiles, ScanConfig, SplitConfig, WriteMode,
};
pub use storage::{append_text, load_array, save_array, txt_to_npy};
pub use utils::error::{DatasetError, Result};
pub use visualize::{image_grid, plot_files, CurveOptions, DisplayMode, Figure, GridOptions};

/// Default edge length images are resized to
pub const DEFAULT_IMAGE_SIZE: u32 = 224;

/// Default share of a scan that goes to the training partition
pub const DEFAULT_TRAIN_PERCENTAGE: f64 = 80.0;

/// Seconds an auto-closing figure stays open
pub const AUTO_CLOSE_SECS: u64 = 10;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
