//! Train/test splitting and `.npy` serialization
//!
//! A dataset folder is scanned in full, permuted once more and cut into a
//! train prefix and a test suffix. Each partition is saved as an image array
//! and a label array next to a shared class array:
//!
//! | file | dtype | shape |
//! |---|---|---|
//! | `{name}_dataTrain.npy` | `uint8` | `[n_train, h, w, 3]` |
//! | `{name}_labelsTrain.npy` | `float64` | `[n_train, k]` |
//! | `{name}_dataTest.npy` | `uint8` | `[n_test, h, w, 3]` |
//! | `{name}_labelsTest.npy` | `float64` | `[n_test, k]` |
//! | `{name}_classes.npy` | `<U` | `[k]` |

use std::path::{Path, PathBuf};

use ndarray::{Array2, Array4};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::scanner::{scan_with_rng, ScanConfig};
use super::{make_rng, permutation, Dataset};
use crate::storage::{npy_path, read_array, read_string_npy, write_array, write_string_npy};
use crate::utils::error::{DatasetError, Result};
use crate::utils::percentage_count;
use crate::DEFAULT_TRAIN_PERCENTAGE;

/// Configuration for dataset splitting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Share of the scanned images that goes to training, 0-100
    pub train_percentage: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_percentage: DEFAULT_TRAIN_PERCENTAGE,
        }
    }
}

impl SplitConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.train_percentage) {
            return Err(DatasetError::InvalidInput(format!(
                "train percentage must be between 0 and 100, got {}",
                self.train_percentage
            )));
        }
        Ok(())
    }
}

/// Disjoint train and test partitions of one scan
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub train: Dataset,
    pub test: Dataset,
}

impl DatasetSplit {
    /// Total number of images over both partitions
    pub fn total(&self) -> usize {
        self.train.len() + self.test.len()
    }

    /// Class names shared by both partitions
    pub fn classes(&self) -> &[String] {
        &self.train.classes
    }
}

impl std::fmt::Display for DatasetSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total = self.total().max(1) as f64;
        writeln!(f, "Dataset Split Statistics:")?;
        writeln!(f, "  Total images: {}", self.total())?;
        writeln!(f, "  Number of classes: {}", self.classes().len())?;
        writeln!(
            f,
            "  Train set: {} ({:.1}%)",
            self.train.len(),
            100.0 * self.train.len() as f64 / total
        )?;
        writeln!(
            f,
            "  Test set: {} ({:.1}%)",
            self.test.len(),
            100.0 * self.test.len() as f64 / total
        )
    }
}

/// Which partition of a sample file set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Train,
    Test,
}

/// The five files one split is saved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleFiles {
    pub data_train: PathBuf,
    pub labels_train: PathBuf,
    pub data_test: PathBuf,
    pub labels_test: PathBuf,
    pub classes: PathBuf,
}

impl SampleFiles {
    /// File names derived from a base name, which may include directories
    pub fn for_name(name: &str) -> Self {
        let file = |suffix: &str| npy_path(format!("{}_{}", name, suffix));
        Self {
            data_train: file("dataTrain"),
            labels_train: file("labelsTrain"),
            data_test: file("dataTest"),
            labels_test: file("labelsTest"),
            classes: file("classes"),
        }
    }

    /// All five paths
    pub fn paths(&self) -> [&Path; 5] {
        [
            &self.data_train,
            &self.labels_train,
            &self.data_test,
            &self.labels_test,
            &self.classes,
        ]
    }

    /// Write both partitions and the class list
    pub fn write(&self, split: &DatasetSplit) -> Result<()> {
        write_array(&self.data_train, &split.train.stacked_images()?)?;
        write_array(&self.labels_train, &split.train.labels)?;
        write_array(&self.data_test, &split.test.stacked_images()?)?;
        write_array(&self.labels_test, &split.test.labels)?;
        write_string_npy(&self.classes, split.classes())?;
        Ok(())
    }

    /// Load the images, labels and classes of one partition
    pub fn load(&self, partition: Partition) -> Result<(Array4<u8>, Array2<f64>, Vec<String>)> {
        let (data, labels) = match partition {
            Partition::Train => (&self.data_train, &self.labels_train),
            Partition::Test => (&self.data_test, &self.labels_test),
        };
        Ok((
            read_array(data)?,
            read_array(labels)?,
            read_string_npy(&self.classes)?,
        ))
    }
}

/// Permute `dataset` and cut it into a train prefix and a test suffix
pub fn split_dataset(dataset: &Dataset, train_percentage: f64, rng: &mut ChaCha8Rng) -> Result<DatasetSplit> {
    SplitConfig { train_percentage }.validate()?;

    let indices = permutation(dataset.len(), rng);
    let n_train = percentage_count(dataset.len(), train_percentage);
    let (train, test) = indices.split_at(n_train);

    Ok(DatasetSplit {
        train: dataset.select(train),
        test: dataset.select(test),
    })
}

/// Scan `root`, split it and save the five `.npy` files for `name`.
///
/// The scan always keeps every image; `scan.percentage` is ignored. Failures
/// are logged and returned. Files written before a failure are left in place.
pub fn dataset_to_npy(root: &Path, name: &str, scan: &ScanConfig, split: &SplitConfig) -> Result<SampleFiles> {
    write_split(root, name, scan, split).inspect_err(|e| e.log(root))
}

fn write_split(root: &Path, name: &str, scan: &ScanConfig, split: &SplitConfig) -> Result<SampleFiles> {
    split.validate()?;

    let mut rng = make_rng(scan.seed);
    let full_scan = ScanConfig {
        percentage: 100.0,
        ..scan.clone()
    };
    let dataset = scan_with_rng(root, &full_scan, &mut rng)?;
    let parts = split_dataset(&dataset, split.train_percentage, &mut rng)?;

    let files = SampleFiles::for_name(name);
    files.write(&parts)?;
    info!(
        "saved {} train and {} test images as {}_*.npy",
        parts.train.len(),
        parts.test.len(),
        name
    );
    Ok(files)
}
