//! Grid of sample images titled with their true and predicted classes

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::ImageFormat;
use ndarray::{Array2, Array3};
use tracing::warn;

use super::figure::Figure;
use crate::dataset::classes::argmax;
use crate::dataset::images::array_to_rgb;
use crate::utils::error::{DatasetError, Result};

const CELL_SIZE: f64 = 200.0;
const TITLE_HEIGHT: f64 = 22.0;
const CELL_PADDING: f64 = 8.0;
const TITLE_FONT_SIZE: f64 = 10.0;

/// Options for [`image_grid`]
#[derive(Debug, Clone, Copy, Default)]
pub struct GridOptions<'a> {
    /// Show only the first `count` images
    pub count: Option<usize>,
    /// Class probabilities per image, `[count, num_classes]`
    pub predictions: Option<&'a Array2<f64>>,
}

/// `(rows, cols)` of a near-square grid holding `n` cells
pub fn grid_shape(n: usize) -> (usize, usize) {
    let side = (n as f64).sqrt();
    (side.ceil() as usize, side.round() as usize)
}

/// Title text and color of one cell
#[derive(Debug, Clone, PartialEq)]
pub struct CellTitle {
    pub text: String,
    pub color: &'static str,
}

/// Title for image `i`: the true class, plus the predicted class and its
/// confidence when predictions are given.
///
/// The confidence is a percentage always printed with two decimals
/// (`87.50`, not `87.5`).
pub fn cell_title(
    i: usize,
    labels: &Array2<f64>,
    classes: &[String],
    predictions: Option<&Array2<f64>>,
) -> Result<CellTitle> {
    let class_at = |index: Option<usize>| -> Result<&String> {
        index.and_then(|idx| classes.get(idx)).ok_or_else(|| {
            DatasetError::InvalidInput(format!("image {} has no class among {:?}", i, classes))
        })
    };

    let true_class = class_at(argmax(labels.row(i).iter()))?;
    let mut text = format!("true: {}", true_class);

    let color = match predictions {
        None => "black",
        Some(predictions) => {
            let row = predictions.row(i);
            let predicted_index = argmax(row.iter());
            let predicted_class = class_at(predicted_index)?;
            let confidence = predicted_index.map(|idx| row[idx]).unwrap_or_default();
            text.push_str(&format!(
                " predicted: {:.2} {}",
                confidence * 100.0,
                predicted_class
            ));
            if predicted_class == true_class {
                "green"
            } else {
                "red"
            }
        }
    };

    Ok(CellTitle { text, color })
}

/// Lay out images in a near-square grid, each titled with its class
pub fn image_grid(
    images: &[Array3<u8>],
    labels: &Array2<f64>,
    classes: &[String],
    options: &GridOptions<'_>,
) -> Result<Figure> {
    if labels.nrows() != images.len() {
        return Err(DatasetError::InvalidInput(format!(
            "{} images but {} labels",
            images.len(),
            labels.nrows()
        )));
    }
    if let Some(predictions) = options.predictions {
        if predictions.nrows() < images.len().min(options.count.unwrap_or(usize::MAX)) {
            return Err(DatasetError::InvalidInput(format!(
                "{} prediction rows for {} images",
                predictions.nrows(),
                images.len()
            )));
        }
    }

    let n = match options.count {
        Some(count) if count > images.len() => {
            warn!("asked for {} images but only {} are available", count, images.len());
            images.len()
        }
        Some(count) => count,
        None => images.len(),
    };

    let (rows, cols) = grid_shape(n);
    let mut figure = Figure::new(
        cols.max(1) as f64 * CELL_SIZE,
        rows.max(1) as f64 * (CELL_SIZE + TITLE_HEIGHT),
    );

    for (i, image) in images.iter().take(n).enumerate() {
        let title = cell_title(i, labels, classes, options.predictions)?;
        let x = (i % cols) as f64 * CELL_SIZE;
        let y = (i / cols) as f64 * (CELL_SIZE + TITLE_HEIGHT);

        figure.text(
            x + CELL_SIZE / 2.0,
            y + TITLE_HEIGHT - 6.0,
            &title.text,
            TITLE_FONT_SIZE,
            title.color,
            "middle",
            true,
        );
        figure.push(format!(
            r#"<image x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" preserveAspectRatio="none" style="image-rendering:pixelated" href="data:image/png;base64,{}"/>"#,
            x + CELL_PADDING,
            y + TITLE_HEIGHT,
            CELL_SIZE - 2.0 * CELL_PADDING,
            CELL_SIZE - 2.0 * CELL_PADDING,
            encode_png(i, image)?
        ));
    }

    Ok(figure)
}

fn encode_png(i: usize, image: &Array3<u8>) -> Result<String> {
    let rgb = array_to_rgb(image)?;
    let mut png = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| DatasetError::InvalidInput(format!("cannot encode image {}: {}", i, e)))?;
    Ok(STANDARD.encode(png))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn classes() -> Vec<String> {
        vec!["cats".to_string(), "dogs".to_string()]
    }

    fn images(n: usize) -> Vec<Array3<u8>> {
        (0..n).map(|_| Array3::from_elem((4, 4, 3), 128)).collect()
    }

    #[test]
    fn test_grid_shape() {
        assert_eq!(grid_shape(1), (1, 1));
        assert_eq!(grid_shape(2), (2, 1));
        assert_eq!(grid_shape(3), (2, 2));
        assert_eq!(grid_shape(5), (3, 2));
        assert_eq!(grid_shape(9), (3, 3));
        assert_eq!(grid_shape(10), (4, 3));
        for n in 1..200 {
            let (rows, cols) = grid_shape(n);
            assert!(rows * cols >= n);
        }
    }

    #[test]
    fn test_title_without_predictions() {
        let labels = array![[0.0, 1.0]];
        let title = cell_title(0, &labels, &classes(), None).unwrap();
        assert_eq!(title.text, "true: dogs");
        assert_eq!(title.color, "black");
    }

    #[test]
    fn test_title_with_predictions() {
        let labels = array![[1.0, 0.0], [1.0, 0.0]];
        let predictions = array![[0.875, 0.125], [0.3, 0.7]];

        let right = cell_title(0, &labels, &classes(), Some(&predictions)).unwrap();
        assert_eq!(right.text, "true: cats predicted: 87.50 cats");
        assert_eq!(right.color, "green");

        let wrong = cell_title(1, &labels, &classes(), Some(&predictions)).unwrap();
        assert_eq!(wrong.text, "true: cats predicted: 70.00 dogs");
        assert_eq!(wrong.color, "red");
    }

    #[test]
    fn test_grid_renders_requested_count() {
        let labels = array![[1.0, 0.0], [0.0, 1.0], [0.0, 1.0]];
        let figure = image_grid(
            &images(3),
            &labels,
            &classes(),
            &GridOptions {
                count: Some(2),
                predictions: None,
            },
        )
        .unwrap();

        let svg = figure.to_svg();
        assert_eq!(svg.matches("<image ").count(), 2);
        assert!(svg.contains("true: cats"));
        // 2 cells -> 2 rows x 1 column
        assert_eq!(figure.width(), CELL_SIZE);
        assert_eq!(figure.height(), 2.0 * (CELL_SIZE + TITLE_HEIGHT));
    }

    #[test]
    fn test_grid_clamps_count() {
        let labels = array![[1.0, 0.0]];
        let figure = image_grid(
            &images(1),
            &labels,
            &classes(),
            &GridOptions {
                count: Some(5),
                predictions: None,
            },
        )
        .unwrap();
        assert_eq!(figure.to_svg().matches("<image ").count(), 1);
    }

    #[test]
    fn test_grid_rejects_mismatched_labels() {
        let labels = array![[1.0, 0.0]];
        let result = image_grid(&images(2), &labels, &classes(), &GridOptions::default());
        assert!(result.is_err());
    }
}
