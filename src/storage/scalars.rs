//! Growing 1-D arrays of scalars, such as per-epoch loss values

use std::path::{Path, PathBuf};

use ndarray::{Array1, ArrayD};
use ndarray_npy::{read_npy, ReadNpyError, ReadableElement};
use tracing::info;

use super::text::read_scalars;
use super::{npy_path, read_error, write_array};
use crate::utils::error::{DatasetError, Result};

/// Load a scalar array, flattening whatever shape it was saved with.
///
/// `float64`, `float32`, `int64` and `int32` arrays are accepted and widened
/// to `f64`.
pub fn load_array(path: impl AsRef<Path>) -> Result<Array1<f64>> {
    let path = npy_path(path);
    if let Some(values) = read_widened::<f64>(&path, |v| v)? {
        return Ok(values);
    }
    if let Some(values) = read_widened::<f32>(&path, f64::from)? {
        return Ok(values);
    }
    if let Some(values) = read_widened::<i64>(&path, |v| v as f64)? {
        return Ok(values);
    }
    if let Some(values) = read_widened::<i32>(&path, f64::from)? {
        return Ok(values);
    }
    Err(DatasetError::npy(
        &path,
        "unsupported element type, expected float64, float32, int64 or int32",
    ))
}

/// `None` when the file holds another element type
fn read_widened<A>(path: &Path, widen: fn(A) -> f64) -> Result<Option<Array1<f64>>>
where
    A: ReadableElement + Copy,
{
    match read_npy::<_, ArrayD<A>>(path) {
        Ok(array) => Ok(Some(array.iter().copied().map(widen).collect())),
        Err(ReadNpyError::WrongDescriptor(_)) => Ok(None),
        Err(e) => Err(read_error(path, e)),
    }
}

/// Append `values` to the array stored at `path`, creating it if missing.
///
/// Returns the path written. Failures are logged and returned.
pub fn save_array(values: &[f64], path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = npy_path(path);
    append_values(values, &path).inspect_err(|e| e.log(&path))
}

fn append_values(values: &[f64], path: &Path) -> Result<PathBuf> {
    let mut combined: Vec<f64> = if path.is_file() {
        load_array(path)?.to_vec()
    } else {
        Vec::new()
    };
    combined.extend_from_slice(values);

    write_array(path, &Array1::from(combined))?;
    info!("file saved {}", path.display());
    Ok(path.to_path_buf())
}

/// Convert a text file of numbers into (or onto) a scalar array
pub fn txt_to_npy(txt_path: &Path, npy: impl AsRef<Path>) -> Result<PathBuf> {
    let values = read_scalars(txt_path, false).inspect_err(|e| e.log(txt_path))?;
    save_array(&values, npy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_append_to_new_then_existing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("loss.npy");

        save_array(&[1.0, 2.0], &path).unwrap();
        save_array(&[3.0], &path).unwrap();
        assert_eq!(load_array(&path).unwrap(), array![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_append_widens_integer_arrays() {
        let temp_dir = TempDir::new().unwrap();
        let int64 = temp_dir.path().join("epochs.npy");
        write_array(&int64, &array![1i64, 2]).unwrap();
        save_array(&[3.0], &int64).unwrap();
        assert_eq!(load_array(&int64).unwrap(), array![1.0, 2.0, 3.0]);

        let int32 = temp_dir.path().join("steps.npy");
        write_array(&int32, &array![[4i32], [5]]).unwrap();
        save_array(&[6.5], &int32).unwrap();
        assert_eq!(load_array(&int32).unwrap(), array![4.0, 5.0, 6.5]);
    }

    #[test]
    fn test_append_widens_float32_arrays() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("acc.npy");
        write_array(&path, &array![0.5f32, 0.25]).unwrap();

        save_array(&[0.75], &path).unwrap();
        assert_eq!(load_array(&path).unwrap(), array![0.5, 0.25, 0.75]);
    }

    #[test]
    fn test_unsupported_element_type() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bytes.npy");
        write_array(&path, &array![1u8, 2]).unwrap();

        assert!(matches!(load_array(&path), Err(DatasetError::Npy { .. })));
    }

    #[test]
    fn test_extension_is_added() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("accuracy");

        let written = save_array(&[0.5], &base).unwrap();
        assert_eq!(written, temp_dir.path().join("accuracy.npy"));
        save_array(&[0.75], &base).unwrap();
        assert_eq!(load_array(&base).unwrap(), array![0.5, 0.75]);
    }

    #[test]
    fn test_existing_2d_array_is_flattened() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("grid.npy");
        write_array(&path, &array![[1.0, 2.0], [3.0, 4.0]]).unwrap();

        save_array(&[5.0], &path).unwrap();
        assert_eq!(load_array(&path).unwrap(), array![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_txt_to_npy_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let txt = temp_dir.path().join("loss.txt");
        fs::write(&txt, "0.9\n0.5\n0\n0.1\n").unwrap();

        let npy = txt_to_npy(&txt, temp_dir.path().join("loss.npy")).unwrap();
        assert_eq!(load_array(&npy).unwrap(), array![0.9, 0.5, 0.0, 0.1]);
    }

    #[test]
    fn test_txt_to_npy_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = txt_to_npy(&temp_dir.path().join("missing.txt"), temp_dir.path().join("x"));
        assert!(result.is_err());
        assert!(!temp_dir.path().join("x.npy").exists());
    }
}
