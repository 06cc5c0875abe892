//! Dataset module for labeled image folders
//!
//! This module provides functionality for:
//! - Scanning a folder of per-class sub-folders into images and one-hot labels
//! - Splitting a scan into train/test partitions saved as `.npy` arrays
//! - Class list persistence and label construction
//! - Loading images without labels
//!
//! ## Folder layout
//!
//! ```text
//! root/
//! ├── class-1/
//! │   ├── image-1.jpg
//! │   └── image-n.jpg
//! └── class-n/
//!     └── ...
//! ```

pub mod classes;
pub mod images;
pub mod scanner;
pub mod split;

use std::path::PathBuf;

use ndarray::{Array2, Array3, Array4, ArrayView3, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::utils::error::{DatasetError, Result};

pub use classes::{
    get_label, load_classes, one_hot, save_classes, write_classes, ClassOrder, ClassSource,
    WriteMode,
};
pub use images::{load_images, ChannelOrder};
pub use scanner::{scan_dataset, ScanConfig};
pub use split::{dataset_to_npy, split_dataset, DatasetSplit, Partition, SampleFiles, SplitConfig};

/// Images with their one-hot labels and the class list the labels index into
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Decoded images, `[height, width, 3]` each
    pub images: Vec<Array3<u8>>,
    /// One-hot labels, `[count, num_classes]`
    pub labels: Array2<f64>,
    /// Class names in label index order
    pub classes: Vec<String>,
    /// Source file of each image
    pub sources: Vec<PathBuf>,
}

impl Dataset {
    /// Build a dataset, checking that images, labels and classes line up
    pub fn new(
        images: Vec<Array3<u8>>,
        labels: Array2<f64>,
        classes: Vec<String>,
        sources: Vec<PathBuf>,
    ) -> Result<Self> {
        if images.len() != labels.nrows() || images.len() != sources.len() {
            return Err(DatasetError::InvalidInput(format!(
                "{} images, {} labels and {} sources",
                images.len(),
                labels.nrows(),
                sources.len()
            )));
        }
        if labels.ncols() != classes.len() {
            return Err(DatasetError::InvalidInput(format!(
                "labels have {} columns but there are {} classes",
                labels.ncols(),
                classes.len()
            )));
        }
        Ok(Self {
            images,
            labels,
            classes,
            sources,
        })
    }

    /// Number of images
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Check if the dataset is empty
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Number of classes
    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Class index of each image
    pub fn label_indices(&self) -> Vec<usize> {
        self.labels
            .rows()
            .into_iter()
            .map(|row| classes::argmax(row.iter()).unwrap_or(0))
            .collect()
    }

    /// Items at `indices`, in that order
    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            images: indices.iter().map(|&i| self.images[i].clone()).collect(),
            labels: self.labels.select(Axis(0), indices),
            classes: self.classes.clone(),
            sources: indices.iter().map(|&i| self.sources[i].clone()).collect(),
        }
    }

    /// All images as one `[count, height, width, 3]` array.
    ///
    /// Fails when images differ in size, which happens when resizing is off.
    pub fn stacked_images(&self) -> Result<Array4<u8>> {
        stack_images(&self.images)
    }
}

/// Stack equally sized images along a new leading axis
pub fn stack_images(images: &[Array3<u8>]) -> Result<Array4<u8>> {
    if images.is_empty() {
        return Ok(Array4::zeros((0, 0, 0, 3)));
    }
    let views: Vec<ArrayView3<u8>> = images.iter().map(|img| img.view()).collect();
    ndarray::stack(Axis(0), &views).map_err(|e| {
        DatasetError::InvalidInput(format!(
            "images have different shapes, enable resizing to stack them: {}",
            e
        ))
    })
}

/// Random generator, seeded when reproducibility is requested
pub fn make_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Random permutation of `0..n`
pub fn permutation(n: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn tiny_dataset() -> Dataset {
        let images = (0..3u8)
            .map(|v| Array3::from_elem((2, 2, 3), v))
            .collect();
        let labels = array![[1.0, 0.0], [0.0, 1.0], [0.0, 1.0]];
        let sources = (0..3).map(|i| PathBuf::from(format!("img{}.png", i))).collect();
        Dataset::new(images, labels, vec!["a".into(), "b".into()], sources).unwrap()
    }

    #[test]
    fn test_dataset_rejects_mismatched_lengths() {
        let result = Dataset::new(
            vec![Array3::zeros((1, 1, 3))],
            Array2::zeros((2, 1)),
            vec!["a".into()],
            vec![PathBuf::from("x.png")],
        );
        assert!(matches!(result, Err(DatasetError::InvalidInput(_))));
    }

    #[test]
    fn test_select_keeps_pairs_together() {
        let dataset = tiny_dataset();
        let picked = dataset.select(&[2, 0]);

        assert_eq!(picked.len(), 2);
        assert_eq!(picked.images[0][[0, 0, 0]], 2);
        assert_eq!(picked.label_indices(), vec![1, 0]);
        assert_eq!(picked.sources[1], PathBuf::from("img0.png"));
    }

    #[test]
    fn test_stacked_images_shape() {
        let stacked = tiny_dataset().stacked_images().unwrap();
        assert_eq!(stacked.dim(), (3, 2, 2, 3));
    }

    #[test]
    fn test_stack_rejects_mixed_sizes() {
        let images = vec![Array3::<u8>::zeros((2, 2, 3)), Array3::zeros((3, 2, 3))];
        assert!(stack_images(&images).is_err());
    }

    #[test]
    fn test_seeded_permutation_is_reproducible() {
        let a = permutation(50, &mut make_rng(Some(7)));
        let b = permutation(50, &mut make_rng(Some(7)));
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }
}
