//! Configuration file support
//!
//! Every section is optional; missing keys keep their defaults.
//!
//! ```toml
//! [scan]
//! resize_to = 128
//! percentage = 50.0
//! seed = 42
//! class_order = "sorted"
//!
//! [split]
//! train_percentage = 80.0
//!
//! [display]
//! auto_close = true
//!
//! [curves]
//! x_label = "# epochs"
//! drop_zero_values = false
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dataset::{ScanConfig, SplitConfig};
use crate::utils::error::{DatasetError, Result};
use crate::visualize::{CurveOptions, DisplayConfig};

/// All settings the CLI reads from a TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub scan: ScanConfig,
    pub split: SplitConfig,
    pub display: DisplayConfig,
    pub curves: CurveOptions,
}

impl GeneratorConfig {
    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DatasetError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| DatasetError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.scan.validate()?;
        self.split.validate()
    }
}
