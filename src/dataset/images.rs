//! Image decoding, resizing and conversion to arrays
//!
//! Images are kept as `Array3<u8>` in `[height, width, channel]` layout, the
//! same layout the `.npy` files store them in.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{ImageReader, RgbImage};
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::utils::error::{DatasetError, Result, ResultExt};

/// Channel layout of decoded pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    /// Whatever the codec produces (RGB for the `image` crate)
    #[default]
    Native,
    /// Blue first, matching arrays written by OpenCV based tooling
    Bgr,
}

/// Decode an image file into an RGB array, optionally resizing to `size x size`
pub fn read_image(path: &Path, resize: Option<u32>, order: ChannelOrder) -> Result<Array3<u8>> {
    let img = ImageReader::open(path)
        .at_path(path)?
        .with_guessed_format()
        .at_path(path)?
        .decode()
        .at_path(path)?;

    let img = match resize {
        Some(size) => img.resize_exact(size, size, FilterType::Triangle),
        None => img,
    };

    rgb_to_array(img.to_rgb8(), order)
}

/// Convert an RGB buffer into `[height, width, 3]`
pub fn rgb_to_array(rgb: RgbImage, order: ChannelOrder) -> Result<Array3<u8>> {
    let (width, height) = rgb.dimensions();
    let mut raw = rgb.into_raw();
    if order == ChannelOrder::Bgr {
        for pixel in raw.chunks_exact_mut(3) {
            pixel.swap(0, 2);
        }
    }
    Array3::from_shape_vec((height as usize, width as usize, 3), raw).map_err(|e| {
        DatasetError::InvalidInput(format!("cannot shape {}x{} RGB buffer: {}", width, height, e))
    })
}

/// Convert a `[height, width, 3]` array back into an RGB buffer for rendering
pub fn array_to_rgb(array: &Array3<u8>) -> Result<RgbImage> {
    let (height, width, channels) = array.dim();
    if channels != 3 {
        return Err(DatasetError::InvalidInput(format!(
            "expected 3 channels, got {}",
            channels
        )));
    }
    let raw: Vec<u8> = array.iter().copied().collect();
    RgbImage::from_raw(width as u32, height as u32, raw).ok_or_else(|| {
        DatasetError::InvalidInput(format!("cannot build {}x{} image", width, height))
    })
}

/// Regular, non-hidden files directly inside `dir`, in name order
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| walk_error(dir, e))?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn walk_error(dir: &Path, err: walkdir::Error) -> DatasetError {
    let path = err.path().unwrap_or(dir).to_path_buf();
    match err.into_io_error() {
        Some(source) => DatasetError::io(path, source),
        None => DatasetError::InvalidInput(format!("filesystem loop under {}", dir.display())),
    }
}

/// Load images without labels.
///
/// A file path yields one image; a directory yields one image per file in it.
/// Every image is resized to `size x size`.
pub fn load_images(path: &Path, size: u32, order: ChannelOrder) -> Result<Vec<Array3<u8>>> {
    let result = if path.is_file() {
        read_image(path, Some(size), order).map(|img| vec![img])
    } else {
        list_files(path).and_then(|files| {
            debug!("Loading {} images from {:?}", files.len(), path);
            files
                .iter()
                .map(|file| read_image(file, Some(size), order))
                .collect()
        })
    };
    result.inspect_err(|e| e.log(path))
}
