use chrono::{Duration, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

use super::{DrawResult, FONT, Palette, padded_range};
use crate::types::{CanonicalSeries, PeakObservation, Pollutant, PollutantPeaks};

/// Trailing mean over the last `window` rows.
///
/// A position is defined once at least `min_periods` of the rows in its
/// window carry a value; missing rows do not count toward the mean.
pub fn rolling_mean(values: &[Option<f64>], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    let min_periods = min_periods.max(1);
    let mut out = Vec::with_capacity(values.len());

    for i in 0..values.len() {
        let from = (i + 1).saturating_sub(window);
        let (sum, count) = values[from..=i]
            .iter()
            .flatten()
            .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
        out.push((count >= min_periods).then(|| sum / count as f64));
    }
    out
}

pub(super) fn draw(
    path: &Path,
    size: (u32, u32),
    palette: &Palette,
    title: &str,
    series: &CanonicalSeries,
    peaks: &[PollutantPeaks],
    rolling: (usize, usize),
) -> DrawResult<()> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&palette.background)?;
    let body = root.titled(title, (FONT, 30).into_font().color(&palette.text))?;

    let origin = series.date_range().map(|(start, _)| start);
    for (pollutant, panel) in Pollutant::ALL.into_iter().zip(body.split_evenly((2, 2))) {
        let top = peaks
            .iter()
            .find(|p| p.pollutant == pollutant)
            .map(|p| p.peaks.as_slice())
            .unwrap_or(&[]);
        draw_panel(&panel, palette, pollutant, series, origin, top, rolling)?;
    }

    root.present()?;
    Ok(())
}

fn draw_panel<DB>(
    area: &DrawingArea<DB, Shift>,
    palette: &Palette,
    pollutant: Pollutant,
    series: &CanonicalSeries,
    origin: Option<NaiveDate>,
    peaks: &[PeakObservation],
    (window, min_periods): (usize, usize),
) -> DrawResult<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let caption = format!("{} ({})", pollutant.long_name(), pollutant.unit());

    let mut rows: Vec<(NaiveDate, Option<f64>)> = series
        .records
        .iter()
        .map(|r| (r.date, r.value(pollutant)))
        .collect();
    rows.sort_by_key(|r| r.0);

    let origin = match origin {
        Some(origin) if rows.iter().any(|r| r.1.is_some()) => origin,
        _ => return draw_no_data(area, palette, &caption),
    };
    let offset = |d: NaiveDate| (d - origin).num_days() as f64;

    let x_max = rows.last().map(|r| offset(r.0)).unwrap_or(0.0).max(1.0);
    let (y_min, y_max) = padded_range(rows.iter().filter_map(|r| r.1), 0.08);

    let mut chart = ChartBuilder::on(area)
        .caption(&caption, (FONT, 22).into_font().color(&palette.text))
        .margin(15)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(0.0..x_max, y_min..y_max)?;

    // roughly one tick per quarter
    let quarters = ((x_max / 91.0).ceil() as usize).clamp(2, 12);
    let date_label = |v: &f64| {
        (origin + Duration::days(v.round() as i64))
            .format("%b %Y")
            .to_string()
    };
    chart
        .configure_mesh()
        .x_labels(quarters)
        .x_label_formatter(&date_label)
        .y_desc(pollutant.unit())
        .label_style((FONT, 13).into_font().color(&palette.text))
        .axis_desc_style((FONT, 14).into_font().color(&palette.text))
        .light_line_style(&palette.text.mix(0.04))
        .bold_line_style(&palette.text.mix(0.12))
        .draw()?;

    let color = palette.color(pollutant);
    for segment in rows.split(|r| r.1.is_none()).filter(|s| !s.is_empty()) {
        chart.draw_series(LineSeries::new(
            segment
                .iter()
                .filter_map(|&(d, v)| v.map(|v| (offset(d), v))),
            &color.mix(0.6),
        ))?;
    }

    let values: Vec<Option<f64>> = rows.iter().map(|r| r.1).collect();
    let smoothed: Vec<(f64, f64)> = rows
        .iter()
        .zip(rolling_mean(&values, window, min_periods))
        .filter_map(|(r, m)| m.map(|m| (offset(r.0), m)))
        .collect();
    let dark = palette.dark(pollutant);
    chart
        .draw_series(LineSeries::new(smoothed, dark.stroke_width(3)))?
        .label(format!("{}-day average", window))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], dark.stroke_width(3)));

    let label_style = (FONT, 13).into_font().color(&palette.text);
    chart
        .draw_series(peaks.iter().map(|peak| {
            EmptyElement::at((offset(peak.date), peak.value))
                + Circle::new((0, 0), 4, BLACK.filled())
                + Text::new(format!("{:.0}", peak.value), (-8, -20), label_style.clone())
        }))?
        .label(format!("Top {} peaks", peaks.len()))
        .legend(|(x, y)| Circle::new((x + 15, y), 4, BLACK.filled()));

    chart
        .configure_series_labels()
        .background_style(&palette.background.mix(0.8))
        .border_style(&palette.text.mix(0.3))
        .label_font((FONT, 13).into_font().color(&palette.text))
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    Ok(())
}

fn draw_no_data<DB>(
    area: &DrawingArea<DB, Shift>,
    palette: &Palette,
    caption: &str,
) -> DrawResult<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (w, h) = area.dim_in_pixel();
    area.draw(&Text::new(
        caption.to_string(),
        (w as i32 / 2 - 80, 20),
        (FONT, 22).into_font().color(&palette.text),
    ))?;
    area.draw(&Text::new(
        "No data".to_string(),
        (w as i32 / 2 - 30, h as i32 / 2),
        (FONT, 18).into_font().color(&palette.text.mix(0.6)),
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_rolling_mean_respects_min_periods() {
        let values = vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        let out = rolling_mean(&values, 3, 2);
        assert_eq!(out[0], None);
        assert!(approx(out[1], 1.5));
        assert!(approx(out[2], 2.0));
        assert!(approx(out[3], 3.0));
    }

    #[test]
    fn test_rolling_mean_skips_missing_rows() {
        let values = vec![Some(2.0), None, None, Some(4.0), None];
        let out = rolling_mean(&values, 3, 1);
        assert!(approx(out[0], 2.0));
        assert!(approx(out[1], 2.0));
        assert!(approx(out[2], 2.0));
        assert!(approx(out[3], 4.0));
        assert!(approx(out[4], 4.0));

        let strict = rolling_mean(&values, 3, 2);
        assert!(strict.iter().all(Option::is_none));
    }

    #[test]
    fn test_rolling_mean_empty() {
        assert!(rolling_mean(&[], 30, 10).is_empty());
    }
}
