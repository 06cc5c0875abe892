//! Dataset scanner
//!
//! Walks a root folder of per-class sub-folders, decodes every image, builds
//! one-hot labels and keeps a random subset of the result.

use std::path::{Path, PathBuf};
use std::time::Instant;

use ndarray::Array2;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::classes::{list_classes, ClassOrder};
use super::images::{list_files, read_image, ChannelOrder};
use super::{make_rng, permutation, Dataset};
use crate::utils::error::{DatasetError, Result};
use crate::utils::{percentage_count, ProgressLogger};
use crate::DEFAULT_IMAGE_SIZE;

/// Configuration for scanning a dataset folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Resize every image to `resize_to x resize_to`
    pub resize: bool,
    /// Target edge length when resizing
    pub resize_to: u32,
    /// Share of the scanned images to keep, 0-100
    pub percentage: f64,
    /// Seed for the sampling permutation; entropy when unset
    pub seed: Option<u64>,
    pub class_order: ClassOrder,
    pub channel_order: ChannelOrder,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            resize: true,
            resize_to: DEFAULT_IMAGE_SIZE,
            percentage: 100.0,
            seed: None,
            class_order: ClassOrder::default(),
            channel_order: ChannelOrder::default(),
        }
    }
}

impl ScanConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.percentage) {
            return Err(DatasetError::InvalidInput(format!(
                "percentage must be between 0 and 100, got {}",
                self.percentage
            )));
        }
        if self.resize && self.resize_to == 0 {
            return Err(DatasetError::InvalidInput(
                "resize_to must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    fn target_size(&self) -> Option<u32> {
        self.resize.then_some(self.resize_to)
    }
}

/// Scan `root` into a dataset.
///
/// Any filesystem or decoding error aborts the whole scan: it is logged and
/// returned, never a partial dataset.
pub fn scan_dataset(root: &Path, config: &ScanConfig) -> Result<Dataset> {
    let mut rng = make_rng(config.seed);
    scan_with_rng(root, config, &mut rng).inspect_err(|e| e.log(root))
}

pub(crate) fn scan_with_rng(root: &Path, config: &ScanConfig, rng: &mut ChaCha8Rng) -> Result<Dataset> {
    config.validate()?;
    let start = Instant::now();

    let classes = list_classes(root, config.class_order)?;
    let mut files: Vec<(PathBuf, usize)> = Vec::new();
    for (label, class) in classes.iter().enumerate() {
        let class_files = list_files(&root.join(class))?;
        debug!("Class '{}' (label {}): {} files", class, label, class_files.len());
        files.extend(class_files.into_iter().map(|path| (path, label)));
    }

    let mut progress = ProgressLogger::new("Decoding images", files.len());
    let mut images = Vec::with_capacity(files.len());
    for (path, _) in &files {
        images.push(read_image(path, config.target_size(), config.channel_order)?);
        progress.increment();
    }

    let labels = Array2::from_shape_fn((files.len(), classes.len()), |(i, j)| {
        if files[i].1 == j {
            1.0
        } else {
            0.0
        }
    });
    let sources = files.into_iter().map(|(path, _)| path).collect();
    let full = Dataset::new(images, labels, classes, sources)?;

    let keep = percentage_count(full.len(), config.percentage);
    let mut indices = permutation(full.len(), rng);
    indices.truncate(keep);
    let dataset = full.select(&indices);

    info!(
        "dataset generated in {} seconds ({} of {} images, {} classes)",
        start.elapsed().as_secs_f64().round(),
        dataset.len(),
        full.len(),
        dataset.num_classes()
    );
    Ok(dataset)
}
