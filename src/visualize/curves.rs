//! Training curves from scalar text files
//!
//! Each file holds one value per line (loss or accuracy per epoch). Every
//! file becomes one line series labelled with its file name, plotted against
//! the line index.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::figure::{escape_xml, Figure, COLOR_AXIS, COLOR_GRID, COLOR_TEXT, FONT};
use crate::storage::read_scalars;
use crate::utils::error::{DatasetError, Result};

const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 500.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 70.0;
const MARGIN_LEFT: f64 = 80.0;
const Y_TICKS: usize = 5;

/// Line colors, cycled when there are more series than colors
const SERIES_COLORS: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22",
    "#17becf",
];

/// Axis labels and parsing behaviour for [`plot_files`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveOptions {
    pub x_label: String,
    pub y_label: String,
    /// Skip values equal to zero, as older curve files expect
    pub drop_zero_values: bool,
}

impl Default for CurveOptions {
    fn default() -> Self {
        Self {
            x_label: "# epochs".to_string(),
            y_label: "Error and Accu".to_string(),
            drop_zero_values: false,
        }
    }
}

/// One named line
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

/// Plot every readable file as one series.
///
/// Paths that are not regular files are logged and skipped; a file that
/// exists but does not parse fails the whole plot.
pub fn plot_files<P: AsRef<Path>>(paths: &[P], options: &CurveOptions) -> Result<Figure> {
    let mut series = Vec::new();
    for path in paths {
        let path = path.as_ref();
        match fs::metadata(path) {
            Err(e) => {
                DatasetError::io(path, e).log(path);
                continue;
            }
            Ok(meta) if !meta.is_file() => {
                DatasetError::InvalidInput(format!("{} is not a file", path.display())).log(path);
                continue;
            }
            Ok(_) => {}
        }

        let values = read_scalars(path, options.drop_zero_values).inspect_err(|e| e.log(path))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!("{}: {} values", name, values.len());
        series.push(Series { name, values });
    }
    Ok(line_chart(&series, options))
}

/// Render series against their index with a legend at the centre left
pub fn line_chart(series: &[Series], options: &CurveOptions) -> Figure {
    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let (x_max, y_min, y_max) = find_ranges(series);

    let to_x = |i: usize| MARGIN_LEFT + (i as f64 / x_max) * plot_width;
    let to_y = |v: f64| MARGIN_TOP + plot_height - ((v - y_min) / (y_max - y_min)) * plot_height;

    let mut figure = Figure::new(CHART_WIDTH, CHART_HEIGHT);

    for i in 0..=Y_TICKS {
        let value = y_min + (i as f64 / Y_TICKS as f64) * (y_max - y_min);
        let y = to_y(value);
        figure.line((MARGIN_LEFT, y), (MARGIN_LEFT + plot_width, y), COLOR_GRID, 1.0);
        figure.text(MARGIN_LEFT - 10.0, y + 4.0, &format!("{:.2}", value), 12.0, COLOR_TEXT, "end", false);
    }

    let x_step = (x_max / 10.0).ceil().max(1.0) as usize;
    for i in (0..=x_max as usize).step_by(x_step) {
        figure.text(
            to_x(i),
            MARGIN_TOP + plot_height + 20.0,
            &i.to_string(),
            11.0,
            COLOR_TEXT,
            "middle",
            false,
        );
    }

    let bottom = MARGIN_TOP + plot_height;
    figure.line((MARGIN_LEFT, bottom), (MARGIN_LEFT + plot_width, bottom), COLOR_AXIS, 2.0);
    figure.line((MARGIN_LEFT, MARGIN_TOP), (MARGIN_LEFT, bottom), COLOR_AXIS, 2.0);

    figure.text(
        MARGIN_LEFT + plot_width / 2.0,
        CHART_HEIGHT - 20.0,
        &options.x_label,
        14.0,
        COLOR_TEXT,
        "middle",
        false,
    );
    figure.push(format!(
        r#"<text x="20" y="{y}" text-anchor="middle" font-family="{font}" font-size="14" fill="{color}" transform="rotate(-90 20 {y})">{label}</text>"#,
        y = CHART_HEIGHT / 2.0,
        font = FONT,
        color = COLOR_TEXT,
        label = escape_xml(&options.y_label)
    ));

    for (idx, s) in series.iter().enumerate() {
        if s.values.is_empty() {
            continue;
        }
        let color = series_color(idx);
        let path = s
            .values
            .iter()
            .enumerate()
            .map(|(i, &v)| format!("{} {:.1} {:.1}", if i == 0 { "M" } else { "L" }, to_x(i), to_y(v)))
            .collect::<Vec<_>>()
            .join(" ");
        figure.push(format!(
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
            path, color
        ));
    }

    // legend, vertically centred against the left axis
    let legend_height = series.len() as f64 * 22.0;
    let mut legend_y = MARGIN_TOP + (plot_height - legend_height) / 2.0;
    for (idx, s) in series.iter().enumerate() {
        let x = MARGIN_LEFT + 15.0;
        figure.line((x, legend_y + 7.0), (x + 20.0, legend_y + 7.0), series_color(idx), 2.0);
        figure.text(x + 28.0, legend_y + 11.0, &s.name, 12.0, COLOR_TEXT, "start", false);
        legend_y += 22.0;
    }

    figure
}

fn series_color(idx: usize) -> &'static str {
    SERIES_COLORS[idx % SERIES_COLORS.len()]
}

/// `(x_max, y_min, y_max)` with degenerate ranges widened so scaling never
/// divides by zero
fn find_ranges(series: &[Series]) -> (f64, f64, f64) {
    let longest = series.iter().map(|s| s.values.len()).max().unwrap_or(0);
    let x_max = longest.saturating_sub(1).max(1) as f64;

    let values = series.iter().flat_map(|s| s.values.iter().copied());
    let (mut y_min, mut y_max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !y_min.is_finite() || !y_max.is_finite() {
        return (x_max, 0.0, 1.0);
    }
    if y_max - y_min < f64::EPSILON {
        y_min -= 0.5;
        y_max += 0.5;
    }
    (x_max, y_min, y_max)
}
