use plotters::prelude::*;
use std::path::Path;

use super::{DrawResult, FONT, Palette, padded_range};
use crate::stats::{MONTH_ABBR, SeasonalAggregator};
use crate::types::{CanonicalSeries, Pollutant};
use crate::utils;

const GRID_POINTS: usize = 200;

/// Ridge height relative to the spacing between months.
const OVERLAP: f64 = 1.8;

/// Plasma-like gradient anchors, dark to bright.
const GRADIENT: [(u8, u8, u8); 5] = [
    (13, 8, 135),
    (126, 3, 168),
    (204, 71, 120),
    (248, 149, 64),
    (240, 249, 33),
];

fn gradient(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0) * (GRADIENT.len() - 1) as f64;
    let i = (t.floor() as usize).min(GRADIENT.len() - 2);
    let f = t - i as f64;
    let (a, b) = (GRADIENT[i], GRADIENT[i + 1]);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * f).round() as u8;
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Gaussian kernel density with Scott's bandwidth, evaluated on `grid`.
///
/// Returns `None` for fewer than two values.
fn kernel_density(values: &[f64], grid: &[f64]) -> Option<Vec<f64>> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = utils::mean(values)?;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let mut h = var.sqrt() * (n as f64).powf(-0.2);
    if !(h.is_finite() && h > 0.0) {
        // constant month: a narrow bump instead of a spike
        h = (mean.abs() * 0.05).max(0.5);
    }
    let norm = 1.0 / (n as f64 * h * (2.0 * std::f64::consts::PI).sqrt());
    Some(
        grid.iter()
            .map(|x| {
                values
                    .iter()
                    .map(|v| (-0.5 * ((x - v) / h).powi(2)).exp())
                    .sum::<f64>()
                    * norm
            })
            .collect(),
    )
}

pub(super) fn draw_ridge(
    path: &Path,
    size: (u32, u32),
    palette: &Palette,
    title: &str,
    series: &CanonicalSeries,
) -> DrawResult<()> {
    let months = SeasonalAggregator::values_by_month(series, Pollutant::Pm25);
    let (x_min, x_max) = padded_range(months.iter().flatten().copied(), 0.05);

    let grid: Vec<f64> = (0..GRID_POINTS)
        .map(|i| x_min + (x_max - x_min) * i as f64 / (GRID_POINTS - 1) as f64)
        .collect();
    let densities: Vec<Option<Vec<f64>>> =
        months.iter().map(|m| kernel_density(m, &grid)).collect();
    let peak = densities
        .iter()
        .flatten()
        .flat_map(|d| d.iter().copied())
        .fold(0.0_f64, f64::max);

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&palette.background)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT, 30).into_font().color(&palette.text))
        .margin(25)
        .set_label_area_size(LabelAreaPosition::Left, 20)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(x_min..x_max, -0.2..(11.0 + OVERLAP + 0.2))?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_label_formatter(&|_: &f64| String::new())
        .x_desc(format!("{} ({})", Pollutant::Pm25.label(), Pollutant::Pm25.unit()))
        .label_style((FONT, 14).into_font().color(&palette.text))
        .axis_desc_style((FONT, 16).into_font().color(&palette.text))
        .light_line_style(&palette.text.mix(0.04))
        .bold_line_style(&palette.text.mix(0.1))
        .draw()?;

    // January sits on top; later months are drawn over earlier ones
    for (month, density) in densities.iter().enumerate() {
        let baseline = (11 - month) as f64;
        let fill = gradient(month as f64 / 11.0);

        if let Some(density) = density
            && peak > 0.0
        {
            let ridge: Vec<(f64, f64)> = grid
                .iter()
                .zip(density)
                .map(|(&x, &d)| (x, baseline + d / peak * OVERLAP))
                .collect();
            let mut outline = ridge.clone();
            outline.push((x_max, baseline));
            outline.push((x_min, baseline));

            chart.draw_series(std::iter::once(Polygon::new(outline, fill.mix(0.85).filled())))?;
            chart.draw_series(std::iter::once(PathElement::new(
                ridge,
                palette.text.stroke_width(1),
            )))?;
        }
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x_min, baseline), (x_max, baseline)],
            palette.text.mix(0.5).stroke_width(1),
        )))?;
        chart.draw_series(std::iter::once(Text::new(
            MONTH_ABBR[month],
            (x_min, baseline + 0.25),
            (FONT, 15).into_font().color(&palette.text),
        )))?;
    }

    root.present()?;
    Ok(())
}

pub(super) fn draw_boxplot(
    path: &Path,
    size: (u32, u32),
    palette: &Palette,
    title: &str,
    series: &CanonicalSeries,
) -> DrawResult<()> {
    let months = SeasonalAggregator::values_by_month(series, Pollutant::Pm25);
    let boxes: Vec<_> = months.iter().map(|m| SeasonalAggregator::box_stats(m)).collect();
    let (y_min, y_max) = padded_range(months.iter().flatten().copied(), 0.05);

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&palette.background)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT, 26).into_font().color(&palette.text))
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(-0.5..11.5, y_min..y_max)?;

    let month_label = |v: &f64| {
        let i = v.round();
        if (v - i).abs() < 1e-6 && (0.0..12.0).contains(&i) {
            MONTH_ABBR[i as usize].to_string()
        } else {
            String::new()
        }
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(12)
        .x_label_formatter(&month_label)
        .y_desc(format!("{} ({})", Pollutant::Pm25.label(), Pollutant::Pm25.unit()))
        .label_style((FONT, 14).into_font().color(&palette.text))
        .axis_desc_style((FONT, 15).into_font().color(&palette.text))
        .light_line_style(&palette.text.mix(0.04))
        .bold_line_style(&palette.text.mix(0.12))
        .draw()?;

    let fill = palette.color(Pollutant::Pm25);
    let line = palette.text.stroke_width(1);
    let half = 0.3;

    for (month, stats) in boxes.iter().enumerate() {
        let Some(stats) = stats else { continue };
        let x = month as f64;

        chart.draw_series([
            PathElement::new(vec![(x, stats.lower_whisker), (x, stats.q1)], line),
            PathElement::new(vec![(x, stats.q3), (x, stats.upper_whisker)], line),
            PathElement::new(
                vec![(x - half / 2.0, stats.lower_whisker), (x + half / 2.0, stats.lower_whisker)],
                line,
            ),
            PathElement::new(
                vec![(x - half / 2.0, stats.upper_whisker), (x + half / 2.0, stats.upper_whisker)],
                line,
            ),
        ])?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - half, stats.q1), (x + half, stats.q3)],
            fill.mix(0.7).filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - half, stats.q1), (x + half, stats.q3)],
            line,
        )))?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x - half, stats.median), (x + half, stats.median)],
            palette.text.stroke_width(2),
        )))?;
        chart.draw_series(
            stats
                .outliers
                .iter()
                .map(|&v| Circle::new((x, v), 3, palette.text.mix(0.6).stroke_width(1))),
        )?;
    }

    root.present()?;
    Ok(())
}
