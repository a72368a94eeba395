use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use plotters::prelude::*;

use crate::color::{generate_palette, grid_color};
use crate::error::{PredictorError, Result};

// ---------------------------------------------------------------------------
// Actual-vs-predicted scatter (headless PNG)
// ---------------------------------------------------------------------------

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 600;
const MARGIN: u32 = 30;
const GRID_LINES: usize = 10;
const POINT_RADIUS: u32 = 4;

fn plot_error(e: impl std::fmt::Display) -> PredictorError {
    PredictorError::Plot(e.to_string())
}

/// `(min, max)` of `values`, assumed finite and non-empty.
fn bounds<'a>(values: impl Iterator<Item = &'a f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    })
}

/// Render actual (x) against predicted (y) with the identity line spanning
/// `[min(target), max(target)]`, returned as a PNG data URI.
///
/// Nothing textual is drawn, so no font backend is needed.
pub fn actual_vs_predicted(actual: &[f64], predicted: &[f64], target: &[f64]) -> Result<String> {
    if actual.is_empty() || actual.len() != predicted.len() || target.is_empty() {
        return Err(PredictorError::Plot(format!(
            "need matching non-empty series, got {} actual and {} predicted",
            actual.len(),
            predicted.len()
        )));
    }
    let all = || actual.iter().chain(predicted).chain(target);
    if all().any(|v| !v.is_finite()) {
        return Err(PredictorError::Plot("series contain non-finite values".into()));
    }

    let (line_lo, line_hi) = bounds(target.iter());
    let (lo, hi) = bounds(all());
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    let (lo, hi) = (lo - pad, hi + pad);

    let palette = generate_palette(3);
    let line_color = palette.first().copied().unwrap_or(RED);
    let point_color = palette.last().copied().unwrap_or(BLUE);
    let grid = grid_color();

    let mut pixels = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(MARGIN)
            .build_cartesian_2d(lo..hi, lo..hi)
            .map_err(plot_error)?;

        for i in 0..=GRID_LINES {
            let v = lo + (hi - lo) * i as f64 / GRID_LINES as f64;
            chart
                .draw_series([
                    PathElement::new(vec![(v, lo), (v, hi)], grid),
                    PathElement::new(vec![(lo, v), (hi, v)], grid),
                ])
                .map_err(plot_error)?;
        }

        chart
            .draw_series(LineSeries::new(
                [(line_lo, line_lo), (line_hi, line_hi)],
                line_color.stroke_width(2),
            ))
            .map_err(plot_error)?;

        chart
            .draw_series(
                actual
                    .iter()
                    .zip(predicted)
                    .map(|(&a, &p)| Circle::new((a, p), POINT_RADIUS, point_color.filled())),
            )
            .map_err(plot_error)?;

        root.present().map_err(plot_error)?;
    }

    let image = image::RgbImage::from_raw(WIDTH, HEIGHT, pixels)
        .ok_or_else(|| PredictorError::Plot("pixel buffer does not match the canvas".into()))?;
    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, image::ImageFormat::Png)
        .map_err(plot_error)?;

    Ok(format!(
        "data:image/png;base64,{}",
        STANDARD.encode(png.into_inner())
    ))
}
