//! Array and text persistence
//!
//! Numeric arrays go through `ndarray-npy`; class-name arrays use the small
//! unicode codec in [`strings`] so numpy can read them back with `np.load`.

pub mod scalars;
pub mod strings;
pub mod text;

use std::path::{Path, PathBuf};

use ndarray_npy::{read_npy, write_npy, ReadNpyError, ReadNpyExt, WriteNpyError, WriteNpyExt};

use crate::utils::error::{DatasetError, Result};

pub use scalars::{load_array, save_array, txt_to_npy};
pub use strings::{read_string_npy, write_string_npy};
pub use text::{append_text, read_scalars, split_lines};

const NPY_EXTENSION: &str = "npy";

/// `path` with a `.npy` extension appended when it has none
pub fn npy_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    match path.extension() {
        Some(ext) if ext == NPY_EXTENSION => path.to_path_buf(),
        _ => {
            let mut name = path.as_os_str().to_owned();
            name.push(".");
            name.push(NPY_EXTENSION);
            PathBuf::from(name)
        }
    }
}

/// Write any numeric array to a `.npy` file
pub fn write_array<T>(path: &Path, array: &T) -> Result<()>
where
    T: WriteNpyExt,
{
    write_npy(path, array).map_err(|e| match e {
        WriteNpyError::Io(source) => DatasetError::io(path, source),
        other => DatasetError::npy(path, other),
    })
}

/// Read any numeric array from a `.npy` file
pub fn read_array<T>(path: &Path) -> Result<T>
where
    T: ReadNpyExt,
{
    read_npy(path).map_err(|e| read_error(path, e))
}

pub(crate) fn read_error(path: &Path, err: ReadNpyError) -> DatasetError {
    match err {
        ReadNpyError::Io(source) => DatasetError::io(path, source),
        other => DatasetError::npy(path, other),
    }
}
