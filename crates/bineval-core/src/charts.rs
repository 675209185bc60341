//! PNG chart rendering for evaluation results.
//!
//! Produces the ROC curve and the confusion matrix heatmap written next to
//! each evaluation run.

use std::path::Path;

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::error::{Error, Result};
use crate::metrics::{ConfusionMatrix, RocCurve};

/// Chart styling constants
const ROC_SIZE: (u32, u32) = (700, 700);
const MATRIX_SIZE: (u32, u32) = (640, 560);
const FONT: &str = "sans-serif";

/// Light and dark ends of the blue heatmap scale
const BLUE_LIGHT: (u8, u8, u8) = (247, 251, 255);
const BLUE_DARK: (u8, u8, u8) = (8, 48, 107);

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// Draw the ROC curve with its AUC and the chance diagonal.
pub fn draw_roc_curve(curve: &RocCurve, auc: f64, output_path: &Path) -> Result<()> {
    ensure_parent(output_path)?;
    render_roc(curve, auc, output_path)
        .map_err(|e| Error::Plot(format!("ROC curve {}: {e}", output_path.display())))
}

fn render_roc(curve: &RocCurve, auc: f64, output_path: &Path) -> DrawResult {
    let root = BitMapBackend::new(output_path, ROC_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Receiver Operating Characteristic (ROC) Curve",
            (FONT, 22).into_font(),
        )
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..1f64, 0f64..1f64)?;

    chart
        .configure_mesh()
        .x_desc("False Positive Rate")
        .y_desc("True Positive Rate")
        .light_line_style(RGBColor(235, 235, 235))
        .draw()?;

    chart
        .draw_series(LineSeries::new(curve.points(), BLUE.stroke_width(2)))?
        .label(format!("ROC Curve (AUC = {auc:.2})"))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

    chart
        .draw_series(DashedLineSeries::new(
            vec![(0.0, 0.0), (1.0, 1.0)],
            8,
            6,
            RED.stroke_width(1),
        ))?
        .label("Random Chance")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.9))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Draw the 2x2 confusion matrix as a blue heatmap with counts.
pub fn draw_confusion_matrix(
    matrix: &ConfusionMatrix,
    display_labels: &[String; 2],
    title: &str,
    output_path: &Path,
) -> Result<()> {
    ensure_parent(output_path)?;
    render_confusion_matrix(matrix, display_labels, title, output_path)
        .map_err(|e| Error::Plot(format!("confusion matrix {}: {e}", output_path.display())))
}

fn render_confusion_matrix(
    matrix: &ConfusionMatrix,
    display_labels: &[String; 2],
    title: &str,
    output_path: &Path,
) -> DrawResult {
    let root = BitMapBackend::new(output_path, MATRIX_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT, 18).into_font())
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(0f64..2f64, 0f64..2f64)?;

    // cell centers sit at 0.5 and 1.5; actual class 0 is drawn on top
    let class_at = |v: f64, top_first: bool| -> String {
        let index = if (v - 0.5).abs() < 1e-6 {
            0
        } else if (v - 1.5).abs() < 1e-6 {
            1
        } else {
            return String::new();
        };
        let index = if top_first { 1 - index } else { index };
        display_labels[index].clone()
    };
    let x_label = |v: &f64| class_at(*v, false);
    let y_label = |v: &f64| class_at(*v, true);

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(5)
        .y_labels(5)
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .x_desc("Predicted label")
        .y_desc("True label")
        .draw()?;

    let rows = matrix.rows();
    let max = rows.iter().flatten().copied().max().unwrap_or(0).max(1) as f64;

    // (column, row from the bottom, count)
    let cells: Vec<(f64, f64, usize)> = (0..2)
        .flat_map(|actual| (0..2).map(move |predicted| (actual, predicted)))
        .map(|(actual, predicted)| {
            (
                predicted as f64,
                (1 - actual) as f64,
                rows[actual][predicted],
            )
        })
        .collect();

    chart.draw_series(cells.iter().map(|&(x, y, count)| {
        Rectangle::new(
            [(x, y), (x + 1.0, y + 1.0)],
            heat_color(count as f64 / max).filled(),
        )
    }))?;

    chart.draw_series(cells.iter().map(|&(x, y, count)| {
        let color = if count as f64 / max > 0.5 { &WHITE } else { &BLACK };
        let style = (FONT, 32)
            .into_font()
            .color(color)
            .pos(Pos::new(HPos::Center, VPos::Center));
        Text::new(count.to_string(), (x + 0.5, y + 0.5), style)
    }))?;

    root.present()?;
    Ok(())
}

/// Linear interpolation across the blue scale, `t` in `[0, 1]`
fn heat_color(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(
        lerp(BLUE_LIGHT.0, BLUE_DARK.0),
        lerp(BLUE_LIGHT.1, BLUE_DARK.1),
        lerp(BLUE_LIGHT.2, BLUE_DARK.2),
    )
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
