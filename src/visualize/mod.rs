//! Figures for datasets and training curves
//!
//! - `image_grid`: sample images titled with true and predicted classes
//! - `curves`: one line per scalar text file
//!
//! Both return a [`Figure`], rendered to SVG and shown through the system
//! viewer with [`Figure::show`].

pub mod curves;
pub mod figure;
pub mod image_grid;

pub use curves::{line_chart, plot_files, CurveOptions, Series};
pub use figure::{DisplayConfig, DisplayMode, Figure};
pub use image_grid::{image_grid, GridOptions};
