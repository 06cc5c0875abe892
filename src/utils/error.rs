//! Error Handling Module
//!
//! Defines the error type shared by every dataset operation.
//! Uses thiserror for ergonomic error definitions.
//!
//! Failures come in two kinds: I/O-like failures (missing files, undecodable
//! images, unreadable `.npy` arrays) and lookup failures (a class name that is
//! not part of the resolved class list). The first kind is logged at the
//! boundary of each public operation in the legacy diagnostic format, see
//! [`DatasetError::diagnostic`]; lookup failures are only returned.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Main error type for dataset generation
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Filesystem error on a specific path
    #[error("IO error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Error decoding or encoding an image
    #[error("Failed to process image at '{}': {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Error reading or writing a `.npy` array
    #[error("Array file error on '{}': {message}", path.display())]
    Npy { path: PathBuf, message: String },

    /// Requested class is not part of the class list
    #[error("Class '{class}' not found in {available:?}")]
    ClassNotFound {
        class: String,
        available: Vec<String>,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience Result type for dataset operations
pub type Result<T> = std::result::Result<T, DatasetError>;

impl DatasetError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        DatasetError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Wrap an image codec error with the path it happened on
    pub fn image(path: impl AsRef<Path>, source: image::ImageError) -> Self {
        DatasetError::Image {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Wrap an array (de)serialization failure
    pub fn npy(path: impl AsRef<Path>, message: impl std::fmt::Display) -> Self {
        DatasetError::Npy {
            path: path.as_ref().to_path_buf(),
            message: message.to_string(),
        }
    }

    /// True for lookup failures, which propagate without being logged
    pub fn is_lookup(&self) -> bool {
        matches!(self, DatasetError::ClassNotFound { .. })
    }

    /// OS error code behind this error, if the platform supplied one
    pub fn code(&self) -> Option<i32> {
        match self {
            DatasetError::Io { source, .. } => source.raw_os_error(),
            DatasetError::Image {
                source: image::ImageError::IoError(e),
                ..
            } => e.raw_os_error(),
            _ => None,
        }
    }

    /// Human readable message without the path
    pub fn message(&self) -> String {
        match self {
            DatasetError::Io { source, .. } => os_message(source),
            DatasetError::Image {
                source: image::ImageError::IoError(e),
                ..
            } => os_message(e),
            DatasetError::Image { source, .. } => source.to_string(),
            DatasetError::Npy { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Path the failure is attributed to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            DatasetError::Io { path, .. }
            | DatasetError::Image { path, .. }
            | DatasetError::Npy { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Legacy console diagnostic: `I/O error(<code>): <message> \nlike : <path>`
    ///
    /// `fallback` is the path reported when the error itself carries none,
    /// usually the path argument of the failed operation.
    pub fn diagnostic(&self, fallback: &Path) -> String {
        let code = self
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "None".to_string());
        let path = self.path().unwrap_or(fallback);
        format!(
            "I/O error({}): {} \nlike : {}",
            code,
            self.message(),
            path.display()
        )
    }

    /// Emit the diagnostic through tracing. Lookup failures are skipped.
    pub fn log(&self, fallback: &Path) {
        if !self.is_lookup() {
            tracing::error!("{}", self.diagnostic(fallback));
        }
    }
}

/// `io::Error` renders as "No such file or directory (os error 2)"; the code
/// is reported separately so the suffix is dropped.
fn os_message(err: &io::Error) -> String {
    let text = err.to_string();
    match text.rfind(" (os error ") {
        Some(idx) if err.raw_os_error().is_some() => text[..idx].to_string(),
        _ => text,
    }
}

/// Extension trait for attaching a path to std errors
pub trait ResultExt<T> {
    /// Attach the path the error happened on
    fn at_path(self, path: &Path) -> Result<T>;
}

impl<T> ResultExt<T> for std::result::Result<T, io::Error> {
    fn at_path(self, path: &Path) -> Result<T> {
        self.map_err(|e| DatasetError::io(path, e))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, image::ImageError> {
    fn at_path(self, path: &Path) -> Result<T> {
        self.map_err(|e| DatasetError::image(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DatasetError::InvalidInput("percentage out of range".to_string());
        assert_eq!(format!("{}", err), "Invalid input: percentage out of range");
    }

    #[test]
    fn test_diagnostic_uses_real_error_fields() {
        let source = io::Error::from_raw_os_error(2);
        let err = DatasetError::io("/data/missing.txt", source);

        let line = err.diagnostic(Path::new("/ignored"));
        assert!(line.starts_with("I/O error(2): "));
        assert!(!line.contains("os error"));
        assert!(line.ends_with(" \nlike : /data/missing.txt"));
    }

    #[test]
    fn test_diagnostic_falls_back_to_operation_path() {
        let err = DatasetError::InvalidInput("bad".to_string());
        let line = err.diagnostic(Path::new("/data/root"));
        assert_eq!(line, "I/O error(None): Invalid input: bad \nlike : /data/root");
    }

    #[test]
    fn test_class_not_found_is_lookup() {
        let err = DatasetError::ClassNotFound {
            class: "fish".to_string(),
            available: vec!["cats".to_string(), "dogs".to_string()],
        };
        assert!(err.is_lookup());
        assert!(format!("{}", err).contains("fish"));
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_result_ext_attaches_path() {
        let result: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));

        let err = result.at_path(Path::new("/tmp/x.npy")).unwrap_err();
        assert_eq!(err.path(), Some(Path::new("/tmp/x.npy")));
    }
}
