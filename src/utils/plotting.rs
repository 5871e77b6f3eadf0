// src/utils/plotting.rs

use std::path::Path;

use plotters::prelude::*;

use crate::error::{PredictorError, Result};
use crate::models::LossPoint;

// Function to render a loss curve as an SVG line chart
pub fn plot_loss_curve(curve: &[LossPoint], filename: impl AsRef<Path>) -> Result<()> {
    if curve.is_empty() {
        return Ok(());
    }
    draw(curve, filename.as_ref())
        .map_err(|e| PredictorError::Io(std::io::Error::other(e.to_string())))
}

fn draw(curve: &[LossPoint], filename: &Path) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let root_area = SVGBackend::new(filename, (800, 600)).into_drawing_area();
    root_area.fill(&WHITE)?;

    let max_value = curve.iter().map(|p| p.loss).fold(f64::MIN, f64::max);
    let min_value = curve.iter().map(|p| p.loss).fold(f64::MAX, f64::min);

    let y_range = if (max_value - min_value).abs() < f64::EPSILON {
        // Flat curve, pad the range so the line is visible
        (min_value - 1.0)..(max_value + 1.0)
    } else {
        min_value..max_value
    };
    let last_epoch = curve.last().map(|p| p.epoch).unwrap_or(1);

    let mut chart = ChartBuilder::on(&root_area)
        .caption("Loss Over Epochs", ("sans-serif", 40))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(1..last_epoch.max(2), y_range)?;
    chart.configure_mesh().x_desc("epoch").y_desc("loss").draw()?;
    chart
        .draw_series(LineSeries::new(
            curve.iter().map(|p| (p.epoch, p.loss)),
            &RED,
        ))?
        .label("loss")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));
    chart.configure_series_labels().draw()?;
    root_area.present()?;
    Ok(())
}
