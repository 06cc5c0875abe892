//! Class lists and one-hot labels
//!
//! A class list is an ordered list of names; the position of a name is the
//! index its one-hot label sets. Class lists come from the sub-folders of a
//! dataset root, from a text file (one name per line), or from memory.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::storage::text::split_lines;
use crate::utils::error::{DatasetError, Result, ResultExt};

/// How class folders are ordered when listed from disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassOrder {
    /// Sorted by name, identical on every platform
    #[default]
    Sorted,
    /// Raw `read_dir` order, as the filesystem returns it
    Listing,
}

/// Whether a class file is truncated or extended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    #[default]
    Overwrite,
    Append,
}

/// Where `get_label` resolves its class list from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassSource {
    /// A class text file if the path is a file, otherwise a dataset folder
    Path(PathBuf),
    /// A class text file
    File(PathBuf),
    /// A dataset root whose sub-folders are the classes
    Directory(PathBuf),
    /// Names already in memory
    Names(Vec<String>),
}

impl ClassSource {
    /// Resolve to an ordered class list
    pub fn resolve(&self, order: ClassOrder) -> Result<Vec<String>> {
        match self {
            ClassSource::Path(path) if path.is_file() => load_classes(path),
            ClassSource::Path(path) | ClassSource::Directory(path) => list_classes(path, order),
            ClassSource::File(path) => load_classes(path),
            ClassSource::Names(names) => Ok(names.clone()),
        }
    }
}

impl From<Vec<String>> for ClassSource {
    fn from(names: Vec<String>) -> Self {
        ClassSource::Names(names)
    }
}

impl From<&[&str]> for ClassSource {
    fn from(names: &[&str]) -> Self {
        ClassSource::Names(names.iter().map(|s| s.to_string()).collect())
    }
}

impl From<&Array1<String>> for ClassSource {
    fn from(names: &Array1<String>) -> Self {
        ClassSource::Names(names.to_vec())
    }
}

impl From<&Path> for ClassSource {
    fn from(path: &Path) -> Self {
        ClassSource::Path(path.to_path_buf())
    }
}

/// Immediate sub-folders of a dataset root, one class per folder
pub fn list_classes(root: &Path, order: ClassOrder) -> Result<Vec<String>> {
    let mut classes = Vec::new();
    for entry in fs::read_dir(root).at_path(root)? {
        let entry = entry.at_path(root)?;
        if !entry.file_type().at_path(&entry.path())?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with('.') {
            classes.push(name);
        }
    }
    if order == ClassOrder::Sorted {
        classes.sort();
    }
    debug!("Found {} classes in {:?}", classes.len(), root);
    Ok(classes)
}

/// Write class names one per line
pub fn write_classes<S: AsRef<str>>(classes: &[S], save_to: &Path, mode: WriteMode) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(mode == WriteMode::Append)
        .truncate(mode == WriteMode::Overwrite)
        .open(save_to)
        .at_path(save_to)?;

    for class in classes {
        writeln!(file, "{}", class.as_ref()).at_path(save_to)?;
    }
    Ok(())
}

/// List the classes of a dataset folder and write them to a text file
pub fn save_classes(root: &Path, save_to: &Path, mode: WriteMode, order: ClassOrder) -> Result<Vec<String>> {
    let classes = list_classes(root, order)?;
    write_classes(&classes, save_to, mode)?;
    Ok(classes)
}

/// Read a class text file back into an ordered list
pub fn load_classes(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).at_path(path)?;
    Ok(split_lines(&content).into_iter().map(str::to_string).collect())
}

/// Position of `class` in `classes`
pub fn class_index<S: AsRef<str>>(class: &str, classes: &[S]) -> Result<usize> {
    classes
        .iter()
        .position(|c| c.as_ref() == class)
        .ok_or_else(|| DatasetError::ClassNotFound {
            class: class.to_string(),
            available: classes.iter().map(|c| c.as_ref().to_string()).collect(),
        })
}

/// One-hot vector of length `num_classes` with `index` set
pub fn one_hot(index: usize, num_classes: usize) -> Array1<f64> {
    let mut label = Array1::zeros(num_classes);
    if index < num_classes {
        label[index] = 1.0;
    }
    label
}

/// One-hot label for `class` as a single-row batch of shape `[1, num_classes]`
pub fn get_label(class: &str, source: impl Into<ClassSource>) -> Result<Array2<f64>> {
    get_label_ordered(class, &source.into(), ClassOrder::default())
}

/// Same as [`get_label`] with an explicit folder ordering
pub fn get_label_ordered(class: &str, source: &ClassSource, order: ClassOrder) -> Result<Array2<f64>> {
    let classes = source.resolve(order)?;
    let index = class_index(class, &classes)?;
    Ok(one_hot(index, classes.len()).insert_axis(Axis(0)))
}

/// Index of the largest entry, first one on ties
pub fn argmax<'a>(row: impl IntoIterator<Item = &'a f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &value) in row.into_iter().enumerate() {
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::TempDir;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_get_label_from_names() {
        let label = get_label("dogs", names(&["cats", "dogs", "birds"])).unwrap();
        assert_eq!(label, array![[0.0, 1.0, 0.0]]);
    }

    #[test]
    fn test_get_label_unknown_class() {
        let result = get_label("fish", names(&["cats", "dogs"]));
        match result {
            Err(DatasetError::ClassNotFound { class, available }) => {
                assert_eq!(class, "fish");
                assert_eq!(available, names(&["cats", "dogs"]));
            }
            other => panic!("expected lookup failure, got {:?}", other),
        }
    }

    #[test]
    fn test_classes_round_trip_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("classes.txt");
        fs::write(&path, "stale\n").unwrap();

        let classes = names(&["cats", "dogs", "birds"]);
        write_classes(&classes, &path, WriteMode::Overwrite).unwrap();
        assert_eq!(load_classes(&path).unwrap(), classes);
    }

    #[test]
    fn test_classes_append_concatenates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("classes.txt");

        write_classes(&["cats", "dogs"], &path, WriteMode::Overwrite).unwrap();
        write_classes(&["birds"], &path, WriteMode::Append).unwrap();
        assert_eq!(load_classes(&path).unwrap(), names(&["cats", "dogs", "birds"]));
    }

    #[test]
    fn test_save_classes_from_folder() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("data");
        for class in ["dogs", "cats"] {
            fs::create_dir_all(root.join(class)).unwrap();
        }
        fs::write(root.join("README.txt"), "not a class").unwrap();

        let out = temp_dir.path().join("classes.txt");
        let saved = save_classes(&root, &out, WriteMode::Overwrite, ClassOrder::Sorted).unwrap();
        assert_eq!(saved, names(&["cats", "dogs"]));
        assert_eq!(fs::read_to_string(&out).unwrap(), "cats\ndogs\n");
    }

    #[test]
    fn test_listing_order_follows_read_dir() {
        let temp_dir = TempDir::new().unwrap();
        for class in ["zebra", "ant", "moth", "bee"] {
            fs::create_dir_all(temp_dir.path().join(class)).unwrap();
        }
        let listed: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();

        let classes = list_classes(temp_dir.path(), ClassOrder::Listing).unwrap();
        assert_eq!(classes, listed);
        assert_eq!(
            list_classes(temp_dir.path(), ClassOrder::Sorted).unwrap(),
            names(&["ant", "bee", "moth", "zebra"])
        );
    }

    #[test]
    fn test_path_source_prefers_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("classes.txt");
        fs::write(&file, "b\na\n").unwrap();

        let label = get_label("a", file.as_path()).unwrap();
        assert_eq!(label, array![[0.0, 1.0]]);
    }

    #[test]
    fn test_path_source_falls_back_to_directory() {
        let temp_dir = TempDir::new().unwrap();
        for class in ["b", "a", "c"] {
            fs::create_dir_all(temp_dir.path().join(class)).unwrap();
        }

        let label = get_label("b", temp_dir.path()).unwrap();
        assert_eq!(label, array![[0.0, 1.0, 0.0]]);
    }

    #[test]
    fn test_array_source() {
        let classes = Array1::from(names(&["x", "y"]));
        let label = get_label("y", &classes).unwrap();
        assert_eq!(label.dim(), (1, 2));
        assert_eq!(label[[0, 1]], 1.0);
    }

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[0.5, 0.5]), Some(0));
        assert_eq!(argmax(&Vec::<f64>::new()), None);
    }
}
