//! SVG figure handle
//!
//! Plot functions return a [`Figure`] instead of drawing into shared state.
//! The caller decides whether to save it, show it, or both.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::utils::error::{DatasetError, Result, ResultExt};
use crate::AUTO_CLOSE_SECS;

pub(crate) const COLOR_GRID: &str = "#ecf0f1";
pub(crate) const COLOR_AXIS: &str = "#2c3e50";
pub(crate) const COLOR_TEXT: &str = "#2c3e50";
pub(crate) const FONT: &str = "Arial, sans-serif";

/// How a shown figure is dismissed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Wait until the user dismisses the figure
    Blocking,
    /// Show without blocking, hold for the given time, then close
    AutoClose(Duration),
}

/// Display settings loadable from the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub auto_close: bool,
    /// Hold time in seconds when auto-closing
    pub hold_secs: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            auto_close: false,
            hold_secs: AUTO_CLOSE_SECS,
        }
    }
}

impl DisplayConfig {
    /// Like [`mode`](Self::mode), auto-closing whenever `force_auto_close` is
    /// set. The configured hold time is kept.
    pub fn mode_with(&self, force_auto_close: bool) -> DisplayMode {
        Self {
            auto_close: self.auto_close || force_auto_close,
            ..self.clone()
        }
        .mode()
    }

    pub fn mode(&self) -> DisplayMode {
        if self.auto_close {
            DisplayMode::AutoClose(Duration::from_secs(self.hold_secs))
        } else {
            DisplayMode::Blocking
        }
    }
}

/// A rendered figure made of SVG elements
#[derive(Debug, Clone)]
pub struct Figure {
    width: f64,
    height: f64,
    elements: Vec<String>,
}

impl Figure {
    /// Empty white canvas
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            elements: vec![format!(
                r#"<rect width="{}" height="{}" fill="white"/>"#,
                width, height
            )],
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Append a raw SVG element
    pub fn push(&mut self, element: String) {
        self.elements.push(element);
    }

    /// Append a text element
    #[allow(clippy::too_many_arguments)]
    pub fn text(&mut self, x: f64, y: f64, content: &str, size: f64, color: &str, anchor: &str, bold: bool) {
        self.push(format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="{}" font-family="{}" font-size="{}"{} fill="{}">{}</text>"#,
            x,
            y,
            anchor,
            FONT,
            size,
            if bold { r#" font-weight="bold""# } else { "" },
            color,
            escape_xml(content)
        ));
    }

    /// Append a line segment
    pub fn line(&mut self, from: (f64, f64), to: (f64, f64), color: &str, width: f64) {
        self.push(format!(
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="{}"/>"#,
            from.0, from.1, to.0, to.1, color, width
        ));
    }

    /// Complete SVG document
    pub fn to_svg(&self) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}">"#,
            w = self.width,
            h = self.height
        );
        for element in &self.elements {
            svg.push_str(element);
        }
        svg.push_str("</svg>");
        svg
    }

    /// Write the SVG document to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_svg()).at_path(path)?;
        info!("figure saved {}", path.display());
        Ok(())
    }

    /// Open the figure in the system viewer.
    ///
    /// The figure lives in a temporary file for as long as it is shown:
    /// `Blocking` waits for Enter on stdin, `AutoClose` sleeps for the hold
    /// time. The file is removed when this returns.
    pub fn show(&self, mode: DisplayMode) -> Result<()> {
        let temp_dir = std::env::temp_dir();
        let mut file = tempfile::Builder::new()
            .prefix("figure-")
            .suffix(".svg")
            .tempfile()
            .at_path(&temp_dir)?;
        file.write_all(self.to_svg().as_bytes()).at_path(file.path())?;
        file.flush().at_path(file.path())?;

        debug!("showing figure from {}", file.path().display());
        open::that(file.path()).at_path(file.path())?;

        match mode {
            DisplayMode::AutoClose(hold) => thread::sleep(hold),
            DisplayMode::Blocking => {
                println!("Press Enter to close the figure...");
                let mut line = String::new();
                io::stdin()
                    .read_line(&mut line)
                    .map_err(|e| DatasetError::io("<stdin>", e))?;
            }
        }

        file.close().at_path(&temp_dir)
    }
}

pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_svg_document() {
        let mut figure = Figure::new(100.0, 50.0);
        figure.text(10.0, 20.0, "a < b & c", 12.0, "red", "start", true);
        let svg = figure.to_svg();

        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(r#"viewBox="0 0 100 50""#));
        assert!(svg.contains("a &lt; b &amp; c"));
        assert!(svg.contains(r#"font-weight="bold""#));
    }

    #[test]
    fn test_save() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("figure.svg");
        Figure::new(10.0, 10.0).save(&path).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("<svg"));
    }

    #[test]
    fn test_display_mode() {
        assert_eq!(DisplayConfig::default().mode(), DisplayMode::Blocking);
        assert_eq!(
            DisplayConfig::default().mode_with(true),
            DisplayMode::AutoClose(Duration::from_secs(10))
        );
    }

    #[test]
    fn test_forced_auto_close_keeps_hold_time() {
        let config = DisplayConfig {
            auto_close: false,
            hold_secs: 3,
        };
        assert_eq!(config.mode_with(false), DisplayMode::Blocking);
        assert_eq!(
            config.mode_with(true),
            DisplayMode::AutoClose(Duration::from_secs(3))
        );
    }
}
